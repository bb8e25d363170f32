//! Identity extraction.
//!
//! A [`MergeKey`] decides whether two records are "the same entry". Records
//! that cannot produce a key are never inserted from a source and never
//! collide with anything in a target.

use crate::format::xml::XmlNode;
use crate::profile::{FileProfile, KeyStrategy};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Identity of a record within one container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeKey {
    /// Canonical JSON text of the whole record.
    Value(String),
    /// Value of the id attribute.
    Attribute(String),
    /// Id attribute plus a second distinguishing attribute.
    Composite(String, String),
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeKey::Value(canonical) => write!(f, "{canonical}"),
            MergeKey::Attribute(value) => write!(f, "{value}"),
            MergeKey::Composite(value, extra) => write!(f, "{value}|{extra}"),
        }
    }
}

/// A structured entry that can be reconciled.
pub trait Record: Clone + PartialEq {
    /// Derive the merge key, or `None` when the record lacks what the
    /// strategy needs.
    fn merge_key(&self, strategy: &KeyStrategy) -> Option<MergeKey>;
}

/// Compute the merge key of `record` under `profile`.
pub fn key<R: Record>(record: &R, profile: &FileProfile) -> Option<MergeKey> {
    record.merge_key(&profile.key)
}

impl Record for Value {
    fn merge_key(&self, strategy: &KeyStrategy) -> Option<MergeKey> {
        match strategy {
            KeyStrategy::FullValue => Some(MergeKey::Value(canonical_json(self))),
            KeyStrategy::Attribute(field) => {
                let value = self.get(field)?.as_str()?;
                Some(MergeKey::Attribute(value.to_string()))
            }
            KeyStrategy::AttributePair(field, extra) => {
                let value = self.get(field)?.as_str()?;
                let extra = self.get(extra)?.as_str()?;
                Some(MergeKey::Composite(value.to_string(), extra.to_string()))
            }
        }
    }
}

impl Record for XmlNode {
    fn merge_key(&self, strategy: &KeyStrategy) -> Option<MergeKey> {
        let element = self.as_element()?;
        match strategy {
            KeyStrategy::FullValue => Some(MergeKey::Value(element.canonical())),
            KeyStrategy::Attribute(name) => {
                let value = element.attribute(name)?;
                Some(MergeKey::Attribute(value.to_string()))
            }
            KeyStrategy::AttributePair(name, extra) => {
                let value = element.attribute(name)?;
                let extra = element.attribute(extra)?;
                Some(MergeKey::Composite(value.to_string(), extra.to_string()))
            }
        }
    }
}

/// Compact JSON text with object keys sorted at every level.
///
/// Integral floats render like integers so `1.0` and `1` compare equal.
pub fn canonical_json(value: &Value) -> String {
    normalize(value).to_string()
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), normalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            // Exactly representable integers only.
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(f as i64),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}
