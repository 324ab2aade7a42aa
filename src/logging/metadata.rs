//! Structured metadata attached to log records and API payloads
//!
//! Values are restricted to strings, numbers, booleans and nested maps so
//! that every metadata bag has a well-defined JSON form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(Metadata),
}

/// String-keyed metadata map with deterministic (sorted) key order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetaValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetaValue)> {
        self.0.iter()
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromIterator<(String, MetaValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, MetaValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        MetaValue::Int(i64::from(value))
    }
}

impl From<u16> for MetaValue {
    fn from(value: u16) -> Self {
        MetaValue::Int(i64::from(value))
    }
}

impl From<u32> for MetaValue {
    fn from(value: u32) -> Self {
        MetaValue::Int(i64::from(value))
    }
}

impl From<u64> for MetaValue {
    fn from(value: u64) -> Self {
        MetaValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for MetaValue {
    fn from(value: usize) -> Self {
        MetaValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<&String> for MetaValue {
    fn from(value: &String) -> Self {
        MetaValue::String(value.clone())
    }
}

impl From<Metadata> for MetaValue {
    fn from(value: Metadata) -> Self {
        MetaValue::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_to_plain_json_object() {
        let meta = Metadata::new()
            .with("status", 404u16)
            .with("path", "/api/admin/faq/list")
            .with("ok", false)
            .with("ratio", 0.5)
            .with("nested", Metadata::new().with("k", "v"));

        let json = meta.to_string();
        assert_eq!(
            json,
            r#"{"nested":{"k":"v"},"ok":false,"path":"/api/admin/faq/list","ratio":0.5,"status":404}"#
        );
    }

    #[test]
    fn test_deserializes_closed_value_set() {
        let meta: Metadata =
            serde_json::from_str(r#"{"source":"manual","version":2,"score":0.75,"flags":{"draft":true}}"#)
                .unwrap();

        assert_eq!(meta.get("source"), Some(&MetaValue::String("manual".into())));
        assert_eq!(meta.get("version"), Some(&MetaValue::Int(2)));
        assert_eq!(meta.get("score"), Some(&MetaValue::Float(0.75)));
        assert!(matches!(meta.get("flags"), Some(MetaValue::Map(_))));
    }

    #[test]
    fn test_rejects_arrays() {
        let result: Result<Metadata, _> = serde_json::from_str(r#"{"tags":["a","b"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_large_unsigned_saturates() {
        assert_eq!(MetaValue::from(u64::MAX), MetaValue::Int(i64::MAX));
    }
}
