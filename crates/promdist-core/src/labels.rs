//! Canonical label keys.
//!
//! A label set is stored as compact JSON with keys sorted by label name:
//! `{"endpoint":"/api","method":"GET"}`. The encoder is the only producer of
//! keys, and `serde_json` never emits optional whitespace, so one label set
//! maps to exactly one key. The empty set encodes to `{}`.
//!
//! Decoding is strict: anything that would not re-encode to the same bytes
//! (extra whitespace, unsorted keys, non-string values) is rejected.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{PromDistError, Result};

/// Key used for a metric without labels.
pub const EMPTY_LABEL_KEY: &str = "{}";

/// Encode `names[i] = values[i]` pairs into a canonical key.
pub fn encode_label_key<N, V>(names: &[N], values: &[V]) -> Result<String>
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    if names.len() != values.len() {
        return Err(PromDistError::InvalidLabels(format!(
            "expected {} label values, got {}",
            names.len(),
            values.len()
        )));
    }
    let mut map = BTreeMap::new();
    for (n, v) in names.iter().zip(values) {
        if map.insert(n.as_ref(), v.as_ref()).is_some() {
            return Err(PromDistError::InvalidLabels(format!(
                "duplicate label name: {}",
                n.as_ref()
            )));
        }
    }
    serialize(&map)
}

/// Decode a canonical key back into its label pairs.
pub fn decode_label_key(key: &str) -> Result<BTreeMap<String, String>> {
    let map: BTreeMap<String, String> =
        serde_json::from_str(key).map_err(|e| PromDistError::Decode(format!("{key:?}: {e}")))?;
    // serde accepts whitespace and unsorted input; the store must not contain either.
    if serialize(&map)? != key {
        return Err(PromDistError::Decode(format!("{key:?}: not in canonical form")));
    }
    Ok(map)
}

fn serialize<K: serde::Serialize + Ord, V: serde::Serialize>(map: &BTreeMap<K, V>) -> Result<String> {
    serde_json::to_string(map).map_err(|e| PromDistError::InvalidLabels(format!("encode failed: {e}")))
}

/// Per-family codec bound to the declared label names.
#[derive(Debug, Clone)]
pub struct LabelKeyCodec {
    names: Arc<[String]>,
}

impl LabelKeyCodec {
    pub fn new(names: &[String]) -> Self {
        Self { names: names.into() }
    }

    /// Declared label names, in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Encode values given positionally, in declaration order.
    pub fn encode<V: AsRef<str>>(&self, values: &[V]) -> Result<String> {
        encode_label_key(&self.names, values)
    }

    /// Encode `(name, value)` pairs given in any order.
    ///
    /// Every declared name must be present exactly once; unknown names are rejected.
    pub fn encode_pairs(&self, pairs: &[(&str, &str)]) -> Result<String> {
        let mut map = BTreeMap::new();
        for (n, v) in pairs {
            if !self.names.iter().any(|d| d == n) {
                return Err(PromDistError::InvalidLabels(format!("unknown label name: {n}")));
            }
            if map.insert(*n, *v).is_some() {
                return Err(PromDistError::InvalidLabels(format!("duplicate label name: {n}")));
            }
        }
        if map.len() != self.names.len() {
            let missing: Vec<&str> = self
                .names
                .iter()
                .map(String::as_str)
                .filter(|n| !map.contains_key(n))
                .collect();
            return Err(PromDistError::InvalidLabels(format!(
                "missing label values for: {}",
                missing.join(",")
            )));
        }
        serialize(&map)
    }

    /// Decode a stored key and check it carries exactly the declared names.
    pub fn decode(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let map = decode_label_key(key)?;
        if map.len() != self.names.len() || self.names.iter().any(|n| !map.contains_key(n)) {
            return Err(PromDistError::Decode(format!(
                "{key:?}: label names do not match [{}]",
                self.names.join(",")
            )));
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn codec(names: &[&str]) -> LabelKeyCodec {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        LabelKeyCodec::new(&names)
    }

    #[test]
    fn sorted_compact_json() {
        let c = codec(&["method", "status", "endpoint"]);
        let key = c.encode(&["GET", "200", "/api"]).unwrap();
        assert_eq!(key, r#"{"endpoint":"/api","method":"GET","status":"200"}"#);
        assert!(!key.contains(' '));
    }

    #[test]
    fn construction_order_does_not_matter() {
        let a = codec(&["x", "y"]).encode(&["1", "2"]).unwrap();
        let b = codec(&["y", "x"]).encode(&["2", "1"]).unwrap();
        let c = codec(&["x", "y"]).encode_pairs(&[("y", "2"), ("x", "1")]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn empty_set_is_sentinel() {
        let c = codec(&[]);
        let key = c.encode::<&str>(&[]).unwrap();
        assert_eq!(key, EMPTY_LABEL_KEY);
        assert!(c.decode(&key).unwrap().is_empty());
    }

    #[test]
    fn values_with_spaces_and_quotes_survive() {
        let c = codec(&["cross"]);
        let key = c.encode(&["a \"b\" \\ c"]).unwrap();
        let back = c.decode(&key).unwrap();
        assert_eq!(back["cross"], "a \"b\" \\ c");
    }

    #[test]
    fn arity_and_names_are_checked() {
        let c = codec(&["a", "b"]);
        assert!(c.encode(&["1"]).is_err());
        assert!(c.encode_pairs(&[("a", "1")]).is_err());
        assert!(c.encode_pairs(&[("a", "1"), ("b", "2"), ("c", "3")]).is_err());
        assert!(c.encode_pairs(&[("a", "1"), ("a", "2")]).is_err());
    }

    #[test]
    fn non_canonical_keys_are_rejected() {
        let c = codec(&["method"]);
        assert!(c.decode(r#"{"method": "GET"}"#).is_err());
        assert!(decode_label_key(r#"{"b":"1","a":"2"}"#).is_err());
        assert!(decode_label_key(r#"{"a":1}"#).is_err());
        assert!(decode_label_key("not json").is_err());
        assert!(c.decode(r#"{"other":"GET"}"#).is_err());
    }
}
