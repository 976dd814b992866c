#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::codec;
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// Ordered string map with case-insensitive keys.
///
/// Re-inserting a key keeps its original position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct KeyValueList(Vec<(String, String)>);

impl KeyValueList {
    fn position(&self, key: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|index| self.0[index].1.as_str())
    }

    fn insert(&mut self, key: String, value: String) {
        match self.position(&key) {
            Some(index) => self.0[index].1 = value,
            None => self.0.push((key, value)),
        }
    }
}

/// Parameters decoded once from a wire message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet(KeyValueList);

impl ParameterSet {
    #[must_use]
    pub fn decode(message: &str) -> Self {
        codec::decode_key_value(message).into_iter().collect()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    /// Returns the value of `key` when present and non-empty.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// # Errors
    /// Returns `MissingParameter` when `key` is absent or empty.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get_non_empty(key)
            .ok_or_else(|| BridgeError::MissingParameter(key.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0 .0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut list = KeyValueList::default();
        for (key, value) in iter {
            list.insert(key, value);
        }
        Self(list)
    }
}

/// Result entries written by a handler during its own invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet(KeyValueList);

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0 .0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn encode(&self) -> String {
        codec::encode_key_value(self.iter())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn given_duplicate_keys_when_decoding_then_last_occurrence_wins() {
        let params = ParameterSet::decode("action,get,Action,list,index,2");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("ACTION"), Some("list"));
        assert_eq!(params.iter().next(), Some(("action", "list")));
    }

    #[test]
    fn given_dangling_token_when_decoding_then_it_is_discarded() {
        let params = ParameterSet::decode("action,list,index");

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("index"), None);
    }

    #[test]
    fn given_empty_value_when_requiring_then_missing_parameter() {
        let params = ParameterSet::decode("data,,time,2030-01-01");

        assert_eq!(params.get("data"), Some(""));
        assert!(matches!(
            params.require("data"),
            Err(BridgeError::MissingParameter(key)) if key == "data"
        ));
        assert_eq!(params.require("time").ok(), Some("2030-01-01"));
    }

    #[test]
    fn result_set_keeps_insertion_order_and_encodes_as_pairs() {
        let mut result = ResultSet::new();
        result.insert("data", "a,b");
        result.insert("extra", "x");
        result.insert("DATA", "c d");

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("data"), Some("c d"));
        assert_eq!(result.encode(), "data,\"c d\",extra,x");
    }
}
