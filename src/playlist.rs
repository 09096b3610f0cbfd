//! Link extraction and extended-M3U rendering.
//!
//! Pure transformation: catalog items in, grouped playlist text out.
//! Categories are emitted alphabetically and only when they hold at least
//! one entry.

use crate::api::CatalogItem;
use crate::config::{HarvestConfig, LinkPolicy};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

pub const M3U_HEADER: &str = "#EXTM3U";
const EXTINF_PREFIX: &str = "#EXTINF:";
const VLC_USER_AGENT: &str = "#EXTVLCOPT:http-user-agent=";
const VLC_REFERRER: &str = "#EXTVLCOPT:http-referrer=";

static ATTR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([\w-]+)="([^"]*)""#).expect("static regex"));

/// Everything rendering needs besides the items themselves
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub user_agent: String,
    pub referrer: String,
    pub proxy_base: String,
    pub fallback_category: String,
    pub link_policy: LinkPolicy,
}

impl From<&HarvestConfig> for RenderOptions {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            referrer: config.referrer.clone(),
            proxy_base: config.proxy_base.clone(),
            fallback_category: config.fallback_category.clone(),
            link_policy: config.link_policy,
        }
    }
}

/// One playable source of one catalog item, fields already sanitized so
/// they survive the line-oriented format unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub id: String,
    pub logo: String,
    pub category: String,
    pub title: String,
    pub year: String,
    pub quality: Option<String>,
    /// Stream URL after the proxy rewrite
    pub url: String,
}

impl PlaylistEntry {
    pub fn extinf_line(&self) -> String {
        let quality = self
            .quality
            .as_ref()
            .map(|q| format!(" [{}]", q))
            .unwrap_or_default();
        format!(
            "{}-1 tvg-id=\"{}\" tvg-logo=\"{}\" group-title=\"{}\",{} ({}){}",
            EXTINF_PREFIX, self.id, self.logo, self.category, self.title, self.year, quality
        )
    }

    pub fn render(&self, opts: &RenderOptions) -> [String; 4] {
        [
            self.extinf_line(),
            format!("{}{}", VLC_USER_AGENT, opts.user_agent),
            format!("{}{}", VLC_REFERRER, opts.referrer),
            self.url.clone(),
        ]
    }
}

/// `<proxy_base>?url=<original>`; the original URL is passed through as is.
pub fn proxy_url(proxy_base: &str, url: &str) -> String {
    format!("{}?url={}", proxy_base, url)
}

/// Flat list of entries in item order, honouring the link policy
pub fn extract_entries(items: &[CatalogItem], opts: &RenderOptions) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();

    for item in items {
        let category = item.category(&opts.fallback_category);
        for source in item.usable_sources() {
            // is_usable guarantees the url is present
            let Some(url) = source.url.as_deref() else {
                continue;
            };
            entries.push(PlaylistEntry {
                id: attr_value(&item.id_label()),
                logo: attr_value(item.image()),
                category: attr_value(category),
                title: single_line(item.title()),
                year: strip(&single_line(&item.year_label()), &['(', ')']),
                quality: source
                    .quality
                    .as_deref()
                    .map(|q| strip(&single_line(q), &['[', ']']))
                    .filter(|q| !q.trim().is_empty()),
                url: single_line(&proxy_url(&opts.proxy_base, url)),
            });

            if opts.link_policy == LinkPolicy::FirstPerItem {
                break;
            }
        }
    }

    entries
}

/// Entries grouped by category, alphabetically ordered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    groups: BTreeMap<String, Vec<PlaylistEntry>>,
}

impl Playlist {
    pub fn build(items: &[CatalogItem], opts: &RenderOptions) -> Self {
        Self::from_entries(extract_entries(items, opts))
    }

    pub fn from_entries(entries: Vec<PlaylistEntry>) -> Self {
        let mut groups: BTreeMap<String, Vec<PlaylistEntry>> = BTreeMap::new();
        for entry in entries {
            groups.entry(entry.category.clone()).or_default().push(entry);
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// `(category, entry count)` in output order
    pub fn categories(&self) -> Vec<(&str, usize)> {
        self.groups
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.len()))
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PlaylistEntry> {
        self.groups.values().flatten()
    }

    pub fn render(&self, opts: &RenderOptions) -> String {
        let mut lines = vec![M3U_HEADER.to_string()];
        for entry in self.entries() {
            lines.extend(entry.render(opts));
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Build and render in one step
pub fn build(items: &[CatalogItem], opts: &RenderOptions) -> String {
    Playlist::build(items, opts).render(opts)
}

/// Read extended-M3U text back into entries. Directive lines between the
/// `#EXTINF` line and the URL are skipped.
pub fn parse_playlist(text: &str) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<PlaylistEntry> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if line.starts_with(EXTINF_PREFIX) {
            pending = parse_extinf(line);
        } else if line.starts_with('#') {
            continue;
        } else if let Some(mut entry) = pending.take() {
            entry.url = line.to_string();
            entries.push(entry);
        }
    }

    entries
}

fn parse_extinf(line: &str) -> Option<PlaylistEntry> {
    let content = line.strip_prefix(EXTINF_PREFIX)?;

    // Header ends at the first comma outside quotes
    let mut in_quotes = false;
    let split = content.char_indices().find_map(|(idx, c)| match c {
        '"' => {
            in_quotes = !in_quotes;
            None
        }
        ',' if !in_quotes => Some(idx),
        _ => None,
    })?;
    let (header, display) = (&content[..split], &content[split + 1..]);

    let attr = |name: &str| {
        ATTR_REGEX
            .captures_iter(header)
            .find(|caps| &caps[1] == name)
            .map(|caps| caps[2].to_string())
            .unwrap_or_default()
    };

    let (rest, quality) = match display.strip_suffix(']').and_then(|d| d.rsplit_once(" [")) {
        Some((rest, quality)) => (rest, Some(quality.to_string())),
        None => (display, None),
    };
    let (title, year) = rest
        .strip_suffix(')')
        .and_then(|r| r.rsplit_once(" ("))
        .map(|(t, y)| (t.to_string(), y.to_string()))
        .unwrap_or_else(|| (rest.to_string(), String::new()));

    Some(PlaylistEntry {
        id: attr("tvg-id"),
        logo: attr("tvg-logo"),
        category: attr("group-title"),
        title,
        year,
        quality,
        url: String::new(),
    })
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn attr_value(value: &str) -> String {
    single_line(value).replace('"', "'")
}

fn strip(value: &str, chars: &[char]) -> String {
    value.chars().filter(|c| !chars.contains(c)).collect()
}
