//! Data-transfer types for the movie catalog API.
//!
//! Every field is optional on the wire and mirrors disagree on types, so
//! decoding never rejects an element: wrong-typed scalars are stringified
//! or dropped, malformed list entries fall back to defaults. Accessors apply
//! the documented defaults so the rest of the crate never sees a missing
//! value.

use crate::flex_id::FlexId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Suffix that marks an HLS manifest, the only kind of source we can play.
pub const MANIFEST_SUFFIX: &str = ".m3u8";

pub const DEFAULT_TITLE: &str = "Unknown";
pub const DEFAULT_YEAR: &str = "unknown";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Genre {
    #[serde(default, deserialize_with = "flex_string")]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct StreamSource {
    #[serde(default, deserialize_with = "flex_string")]
    pub url: Option<String>,
    // "1080p" on most mirrors, a bare 1080 on some
    #[serde(default, deserialize_with = "flex_string")]
    pub quality: Option<String>,
}

impl StreamSource {
    pub fn is_usable(&self) -> bool {
        self.url
            .as_deref()
            .map(|u| u.ends_with(MANIFEST_SUFFIX))
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct CatalogItem {
    #[serde(default)]
    pub id: FlexId,
    #[serde(default, deserialize_with = "flex_string")]
    pub title: Option<String>,
    #[serde(default)]
    pub year: FlexId,
    #[serde(default, alias = "imageUrl", deserialize_with = "flex_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub sources: Vec<StreamSource>,
}

impl CatalogItem {
    pub fn id_label(&self) -> String {
        self.id.to_string_value().unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => DEFAULT_TITLE,
        }
    }

    pub fn year_label(&self) -> String {
        self.year
            .to_string_value()
            .unwrap_or_else(|| DEFAULT_YEAR.to_string())
    }

    pub fn image(&self) -> &str {
        self.image.as_deref().unwrap_or("")
    }

    /// Grouping key: the first genre's title, or `fallback` when there are
    /// no genres or the first one has no title.
    pub fn category<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.genres
            .first()
            .and_then(|g| g.title.as_deref())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(fallback)
    }

    pub fn usable_sources(&self) -> impl Iterator<Item = &StreamSource> {
        self.sources.iter().filter(|s| s.is_usable())
    }

    pub fn has_usable_link(&self) -> bool {
        self.usable_sources().next().is_some()
    }
}

/// Text field that may arrive as a string, number, bool or junk.
/// Blank strings and non-scalars become `None`.
fn flex_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(FlexId::deserialize(deserializer)?.to_string_value())
}

/// List whose entries decode one by one; an entry that does not fit `T`
/// becomes `T::default()`. Anything but an array is an empty list.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(entries) => Ok(entries
            .into_iter()
            .map(|entry| serde_json::from_value(entry).unwrap_or_default())
            .collect()),
        _ => Ok(Vec::new()),
    }
}
