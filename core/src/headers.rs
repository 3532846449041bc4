//! Case-insensitive header map with multi-value support.
//!
//! # Design
//! Names are lower-cased on the way in, so lookups never need to care about
//! case. A name seen once maps to `HeaderValue::Single`; the second
//! occurrence turns it into `HeaderValue::Multi` and every later occurrence
//! appends. Insertion order of names is kept for display and logging.

use indexmap::IndexMap;
use serde::Serialize;

/// Value stored under one header name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// First value received for this name.
    pub fn first(&self) -> &str {
        match self {
            HeaderValue::Single(v) => v,
            HeaderValue::Multi(vs) => vs.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// All values in arrival order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(v) => vec![v.as_str()],
            HeaderValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HeaderValue::Single(_) => 1,
            HeaderValue::Multi(vs) => vs.len(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, HeaderValue::Multi(_))
    }

    fn push(&mut self, value: String) {
        match self {
            HeaderValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = HeaderValue::Multi(vec![first, value]);
            }
            HeaderValue::Multi(vs) => vs.push(value),
        }
    }
}

/// Header map keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers {
    entries: IndexMap<String, HeaderValue>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, keeping any values already stored under `name`.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.get_mut(&name.to_ascii_lowercase()) {
            Some(existing) => existing.push(value),
            None => {
                self.entries
                    .insert(name.to_ascii_lowercase(), HeaderValue::Single(value));
            }
        }
    }

    /// Replace whatever is stored under `name`.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .insert(name.to_ascii_lowercase(), HeaderValue::Single(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    /// First value stored under `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).map(HeaderValue::first)
    }

    /// All values for `name` joined with `", "`, the way they would appear
    /// folded onto a single header line.
    pub fn line(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| v.values().join(", "))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every `(name, value)` pair, with multi-valued headers expanded into
    /// one pair per value.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, v)| v.values().into_iter().map(move |value| (k.as_str(), value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "text/plain");
        assert_eq!(headers.first("content-type"), Some("text/plain"));
        assert_eq!(headers.first("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.iter().next().unwrap().0, "content-type");
    }

    #[test]
    fn repeated_name_becomes_list() {
        let mut headers = Headers::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("set-cookie", "b=2");
        headers.append("SET-COOKIE", "c=3");
        assert_eq!(headers.len(), 1);
        let value = headers.get("set-cookie").unwrap();
        assert!(value.is_multi());
        assert_eq!(value.values(), ["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn line_joins_values() {
        let mut headers = Headers::new();
        headers.append("Accept", "text/html");
        headers.append("Accept", "application/json");
        assert_eq!(
            headers.line("accept").as_deref(),
            Some("text/html, application/json")
        );
        assert!(headers.line("missing").is_none());
    }

    #[test]
    fn insert_replaces() {
        let mut headers = Headers::new();
        headers.append("X-A", "1");
        headers.append("X-A", "2");
        headers.insert("x-a", "3");
        assert_eq!(headers.get("x-a"), Some(&HeaderValue::Single("3".to_string())));
    }

    #[test]
    fn pairs_expand_multi_values() {
        let mut headers = Headers::new();
        headers.append("A", "1");
        headers.append("B", "2");
        headers.append("A", "3");
        assert_eq!(headers.pairs(), [("a", "1"), ("a", "3"), ("b", "2")]);
    }

    #[test]
    fn serializes_single_and_multi() {
        let mut headers = Headers::new();
        headers.append("A", "1");
        headers.append("B", "2");
        headers.append("B", "3");
        let json = serde_json::to_value(&headers).unwrap();
        assert_eq!(json, serde_json::json!({"a": "1", "b": ["2", "3"]}));
    }
}
