use serde::{Deserialize, Deserializer};
use std::fmt;

/// A loosely typed scalar as the catalog API sends it: ids and years show
/// up as numbers on some mirrors and strings on others, occasionally null.
/// Deserialization never fails; objects and arrays collapse to `Null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FlexId {
    Number(i64),
    String(String),
    #[default]
    Null,
}

impl FlexId {
    /// Text form used in rendered output. Numbers are stringified, blank
    /// strings count as missing.
    pub fn to_string_value(&self) -> Option<String> {
        match self {
            FlexId::Number(n) => Some(n.to_string()),
            FlexId::String(s) if s.trim().is_empty() => None,
            FlexId::String(s) => Some(s.clone()),
            FlexId::Null => None,
        }
    }
}

impl From<i64> for FlexId {
    fn from(n: i64) -> Self {
        FlexId::Number(n)
    }
}

impl<'de> Deserialize<'de> for FlexId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};

        struct FlexIdVisitor;

        impl<'de> Visitor<'de> for FlexIdVisitor {
            type Value = FlexId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("any JSON value")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexId::String(v.to_string()))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexId::Number(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match i64::try_from(v) {
                    Ok(n) => Ok(FlexId::Number(n)),
                    Err(_) => Ok(FlexId::String(v.to_string())),
                }
            }

            // Some mirrors send years as 2019.0
            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let integral = v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64;
                if integral {
                    Ok(FlexId::Number(v as i64))
                } else {
                    Ok(FlexId::String(v.to_string()))
                }
            }

            // Strings are kept verbatim: "007" must not turn into 7.
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexId::String(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexId::String(v))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexId::Null)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexId::Null)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(FlexId::Null)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(FlexId::Null)
            }
        }

        deserializer.deserialize_any(FlexIdVisitor)
    }
}
