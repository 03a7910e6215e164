use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{ComponentType, Section};

/// One normalized output unit produced by a component's parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRecord {
    pub sub_rank: usize,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub sub_type: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub cite: Option<String>,
    pub details: Option<Value>,
    pub error: Option<String>,
}

impl SubRecord {
    pub fn empty(kind: ComponentType) -> Self {
        SubRecord {
            sub_rank: 0,
            kind,
            sub_type: None,
            title: None,
            url: None,
            text: None,
            cite: None,
            details: None,
            error: None,
        }
    }

    /// Placeholder for a component that produced no usable data. Content
    /// fields stay empty; the raw text survives in `details.raw_text`.
    pub fn stub(kind: ComponentType, raw_text: String, error: Option<String>) -> Self {
        let mut details = Map::new();
        details.insert("raw_text".into(), Value::String(raw_text));
        SubRecord {
            details: Some(Value::Object(details)),
            error,
            ..SubRecord::empty(kind)
        }
    }
}

/// Loose shape a parser item is validated against before it becomes a
/// [`SubRecord`]. Keys outside the schema are collected in `extra`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSubRecord {
    #[serde(default)]
    pub sub_rank: Option<usize>,
    #[serde(default, rename = "type")]
    pub kind: Option<ComponentType>,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cite: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawSubRecord {
    /// Coerce into the canonical schema. Missing `sub_rank` and `type` take the
    /// item's list position and the component type.
    pub fn normalize(self, position: usize, component_type: ComponentType) -> SubRecord {
        let details = merge_details(self.details, self.extra);
        SubRecord {
            sub_rank: self.sub_rank.unwrap_or(position),
            kind: self.kind.unwrap_or(component_type),
            sub_type: self.sub_type,
            title: non_blank(self.title),
            url: non_blank(self.url),
            text: non_blank(self.text),
            cite: non_blank(self.cite),
            details,
            error: self.error,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn merge_details(details: Option<Value>, extra: Map<String, Value>) -> Option<Value> {
    let details = details.filter(|d| !d.is_null());
    if extra.is_empty() {
        return details;
    }
    let mut merged = match details {
        Some(Value::Object(map)) => map,
        Some(other) => {
            let mut map = Map::new();
            map.insert("value".into(), other);
            map
        }
        None => Map::new(),
    };
    for (key, value) in extra {
        merged.entry(key).or_insert(value);
    }
    Some(Value::Object(merged))
}

/// A sub-record stamped with its position on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpRecord {
    pub section: Section,
    pub cmpt_rank: usize,
    pub serp_rank: usize,
    #[serde(flatten)]
    pub record: SubRecord,
}
