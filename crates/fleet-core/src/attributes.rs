//! Typed device attribute sets
//!
//! Dynamic group expressions are evaluated against an [`AttributeSet`]: a flat,
//! ordered map from dotted attribute path to its textual value. Nested
//! documents such as reported system info are flattened into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat mapping from attribute path to value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, String>);

impl AttributeSet {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single attribute
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.0.insert(path.into(), value.into());
    }

    /// Look up an attribute by path
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Whether the attribute is present
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attributes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate attributes in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flatten a JSON document into this set.
    ///
    /// Object keys and array indices become dotted path segments under
    /// `prefix`. Strings are stored verbatim, numbers and booleans in their JSON
    /// text form, and `null` leaves are skipped.
    pub fn extend_from_document(&mut self, prefix: &str, document: &Value) {
        match document {
            Value::Null => {}
            Value::String(s) => self.insert_leaf(prefix, s.clone()),
            Value::Bool(b) => self.insert_leaf(prefix, b.to_string()),
            Value::Number(n) => self.insert_leaf(prefix, n.to_string()),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.extend_from_document(&join_path(prefix, &index.to_string()), item);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    self.extend_from_document(&join_path(prefix, key), item);
                }
            }
        }
    }

    fn insert_leaf(&mut self, path: &str, value: String) {
        // a scalar document at the root has no path to live under
        if !path.is_empty() {
            self.0.insert(path.to_string(), value);
        }
    }
}

impl FromIterator<(String, String)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_document() {
        let doc = json!({
            "product": "raspberrypi",
            "hardware": { "id": "rpi4", "cores": 4, "virtual": false },
            "disks": [{ "size": "32G" }, null],
            "notes": null,
        });

        let mut attrs = AttributeSet::new();
        attrs.extend_from_document("", &doc);

        assert_eq!(attrs.get("product"), Some("raspberrypi"));
        assert_eq!(attrs.get("hardware.id"), Some("rpi4"));
        assert_eq!(attrs.get("hardware.cores"), Some("4"));
        assert_eq!(attrs.get("hardware.virtual"), Some("false"));
        assert_eq!(attrs.get("disks.0.size"), Some("32G"));
        assert!(!attrs.contains("disks.1"));
        assert!(!attrs.contains("notes"));
        assert_eq!(attrs.len(), 5);
    }

    #[test]
    fn test_flatten_with_prefix() {
        let mut attrs = AttributeSet::new();
        attrs.extend_from_document("system", &json!({ "os": "linux" }));
        assert_eq!(attrs.get("system.os"), Some("linux"));
    }

    #[test]
    fn test_scalar_root_is_ignored() {
        let mut attrs = AttributeSet::new();
        attrs.extend_from_document("", &json!("bare"));
        assert!(attrs.is_empty());
    }
}
