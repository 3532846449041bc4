//! `application/x-www-form-urlencoded` serialization with bracket notation.
//!
//! Nested mappings become `key[sub]=v`. List items become `key[0]=v` when
//! indexed, or `key[]=v` when not. Key segments and values are
//! percent-encoded (space as `+`); the brackets themselves stay literal.
//!
//! Scalars follow the usual query-string conventions: `true`/`false` are
//! sent as `1`/`0`, `null` and empty containers emit nothing.
//!
//! `decode_query` reverses the bracket notation into nested data; every
//! leaf comes back as a string.

use serde_json::{Map, Value};
use url::form_urlencoded::{self, byte_serialize};

use crate::params::ParameterSet;

/// How list items are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    /// `key[0]=a&key[1]=b`
    Indexed,
    /// `key[]=a&key[]=b`, for servers that reject numeric bracket keys.
    ///
    /// Items that are mappings keep their index so `key[0][x]` and
    /// `key[1][x]` stay distinguishable.
    Bare,
}

/// Serialize `params` into a query string.
pub fn encode_query(params: &ParameterSet, style: ListStyle) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        collect(&mut pairs, escape(key), value, style);
    }
    pairs.join("&")
}

fn collect(out: &mut Vec<String>, prefix: String, value: &Value, style: ListStyle) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push(format!("{prefix}={}", if *b { "1" } else { "0" })),
        Value::Number(n) => out.push(format!("{prefix}={n}")),
        Value::String(s) => out.push(format!("{prefix}={}", escape(s))),
        Value::Object(map) => {
            for (key, nested) in map {
                collect(out, format!("{prefix}[{}]", escape(key)), nested, style);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let bare = style == ListStyle::Bare && !matches!(item, Value::Object(_));
                let key = if bare {
                    format!("{prefix}[]")
                } else {
                    format!("{prefix}[{index}]")
                };
                collect(out, key, item, style);
            }
        }
    }
}

fn escape(raw: &str) -> String {
    byte_serialize(raw.as_bytes()).collect()
}

/// Parse a URL-encoded string with bracket keys into an object.
///
/// `a[]` and `a[0]` build lists, `a[b]` builds mappings, a repeated plain
/// key keeps the last value.
pub fn decode_query(input: &str) -> Value {
    let mut root = Map::new();
    for (key, value) in form_urlencoded::parse(input.as_bytes()) {
        let (base, path) = split_key(&key);
        let slot = root.entry(base).or_insert(Value::Null);
        insert(slot, &path, value.into_owned());
    }
    Value::Object(root)
}

/// `user[address][city]` -> (`user`, [`address`, `city`]). Keys with
/// unbalanced brackets are taken literally.
fn split_key(key: &str) -> (String, Vec<String>) {
    let Some(open) = key.find('[') else {
        return (key.to_string(), Vec::new());
    };
    if open == 0 {
        return (key.to_string(), Vec::new());
    }
    let mut path = Vec::new();
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return (key.to_string(), Vec::new());
        };
        let Some(close) = inner.find(']') else {
            return (key.to_string(), Vec::new());
        };
        path.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }
    (key[..open].to_string(), path)
}

enum Slot {
    Keep,
    ListToObject,
    Fresh,
}

fn insert(slot: &mut Value, path: &[String], value: String) {
    let Some((segment, rest)) = path.split_first() else {
        *slot = Value::String(value);
        return;
    };
    // `Some(None)` is `[]`, `Some(Some(n))` is `[n]`, `None` is a named key.
    let index: Option<Option<usize>> = if segment.is_empty() {
        Some(None)
    } else {
        segment.parse::<usize>().ok().map(Some)
    };

    let action = match &*slot {
        Value::Array(_) if index.is_none() => Slot::ListToObject,
        Value::Array(_) | Value::Object(_) => Slot::Keep,
        _ => Slot::Fresh,
    };
    match action {
        Slot::Keep => {}
        Slot::Fresh if index.is_some() => *slot = Value::Array(Vec::new()),
        Slot::Fresh => *slot = Value::Object(Map::new()),
        Slot::ListToObject => {
            if let Value::Array(items) = slot.take() {
                *slot = Value::Object(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(i, v)| (i.to_string(), v))
                        .collect(),
                );
            }
        }
    }

    match slot {
        Value::Array(items) => {
            let position = match index {
                Some(Some(i)) if i < items.len() => i,
                _ => {
                    items.push(Value::Null);
                    items.len() - 1
                }
            };
            insert(&mut items[position], rest, value);
        }
        Value::Object(map) => {
            let key = if segment.is_empty() {
                map.len().to_string()
            } else {
                segment.clone()
            };
            insert(map.entry(key).or_insert(Value::Null), rest, value);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(value: Value) -> ParameterSet {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn flat_pairs_keep_order() {
        let params = set(json!({"b": "2", "a": 1}));
        assert_eq!(encode_query(&params, ListStyle::Indexed), "b=2&a=1");
    }

    #[test]
    fn values_are_percent_encoded() {
        let params = set(json!({"q": "rust & c++", "path": "/a/b?c=d"}));
        assert_eq!(
            encode_query(&params, ListStyle::Indexed),
            "q=rust+%26+c%2B%2B&path=%2Fa%2Fb%3Fc%3Dd"
        );
    }

    #[test]
    fn lists_indexed_and_bare() {
        let params = set(json!({"tags": ["a", "b"]}));
        assert_eq!(encode_query(&params, ListStyle::Indexed), "tags[0]=a&tags[1]=b");
        assert_eq!(encode_query(&params, ListStyle::Bare), "tags[]=a&tags[]=b");
    }

    #[test]
    fn nested_mappings_use_bracket_keys() {
        let params = set(json!({"user": {"name": "Bob", "address": {"city": "Rio"}}}));
        assert_eq!(
            encode_query(&params, ListStyle::Bare),
            "user[name]=Bob&user[address][city]=Rio"
        );
    }

    #[test]
    fn list_of_mappings_keeps_indices_when_bare() {
        let params = set(json!({"items": [{"id": 1}, {"id": 2}]}));
        assert_eq!(
            encode_query(&params, ListStyle::Bare),
            "items[0][id]=1&items[1][id]=2"
        );
    }

    #[test]
    fn nested_lists_lose_indices_when_bare() {
        let params = set(json!({"m": [["x", "y"]]}));
        assert_eq!(encode_query(&params, ListStyle::Bare), "m[][]=x&m[][]=y");
        assert_eq!(encode_query(&params, ListStyle::Indexed), "m[0][0]=x&m[0][1]=y");
    }

    #[test]
    fn booleans_nulls_and_empties() {
        let params = set(json!({"on": true, "off": false, "none": null, "empty": [], "obj": {}}));
        assert_eq!(encode_query(&params, ListStyle::Indexed), "on=1&off=0");
    }

    #[test]
    fn keys_are_escaped() {
        let params = set(json!({"first name": "Ana", "a&b": "c"}));
        assert_eq!(encode_query(&params, ListStyle::Indexed), "first+name=Ana&a%26b=c");
    }

    #[test]
    fn decode_rebuilds_nesting() {
        let decoded = decode_query("user[name]=Bob&user[age]=5&tags[0]=a&tags[1]=b&q=a+b%26c");
        assert_eq!(
            decoded,
            json!({"user": {"name": "Bob", "age": "5"}, "tags": ["a", "b"], "q": "a b&c"})
        );
    }

    #[test]
    fn decode_bare_lists_and_lists_of_mappings() {
        assert_eq!(decode_query("t[]=a&t[]=b"), json!({"t": ["a", "b"]}));
        assert_eq!(
            decode_query("items[0][id]=1&items[0][n]=x&items[1][id]=2"),
            json!({"items": [{"id": "1", "n": "x"}, {"id": "2"}]})
        );
    }

    #[test]
    fn decode_edge_keys() {
        assert_eq!(decode_query("a=1&a=2"), json!({"a": "2"}));
        assert_eq!(decode_query("a[b=1"), json!({"a[b": "1"}));
        assert_eq!(decode_query("a[0]=x&a[k]=y"), json!({"a": {"0": "x", "k": "y"}}));
        assert_eq!(decode_query(""), json!({}));
    }

    #[test]
    fn form_round_trip_up_to_strings() {
        let params = set(json!({"user": {"name": "Bob", "age": 5}, "tags": ["a", "b c"]}));
        let encoded = encode_query(&params, ListStyle::Indexed);
        assert_eq!(
            decode_query(&encoded),
            json!({"user": {"name": "Bob", "age": "5"}, "tags": ["a", "b c"]})
        );
    }

    #[test]
    fn empty_set_is_empty_string() {
        assert_eq!(encode_query(&ParameterSet::new(), ListStyle::Bare), "");
    }
}
