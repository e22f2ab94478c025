use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A decoded query-string value. Keys seen once stay scalar; a repeated key
/// becomes a list holding every value in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    pub fn first(&self) -> &str {
        match self {
            ParamValue::Single(v) => v,
            ParamValue::Many(values) => values.first().map(String::as_str).unwrap_or_default(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            ParamValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = ParamValue::Many(vec![first, value]);
            }
            ParamValue::Many(values) => values.push(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(ParamValue::first)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

/// Splits `raw` into decoded `(key, value)` pairs, preserving order.
pub fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Decodes an `application/x-www-form-urlencoded` string into a key → value(s) map.
pub fn decode_query(raw: &str) -> QueryParams {
    let mut params: BTreeMap<String, ParamValue> = BTreeMap::new();
    for (key, value) in parse_pairs(raw) {
        match params.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                params.insert(key, ParamValue::Single(value));
            }
        }
    }
    QueryParams(params)
}
