//! Filter values and the canonical filters map.
//!
//! A [`FilterValue`] is deliberately shallow: scalars are strings, nested
//! values are flat `string -> string` maps. That keeps every value
//! expressible both in a flat query string and in the JSON payload written to
//! durable storage.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

pub type FilterKey = String;

/// Flat map of string -> scalar, used for nested filter values.
pub type NestedValue = BTreeMap<String, String>;

/// Canonical key -> value state. Ordering carries no meaning.
pub type FiltersMap = BTreeMap<FilterKey, FilterValue>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// No value. Serialized as JSON `null`.
    #[default]
    Unset,
    Text(String),
    List(Vec<String>),
    Nested(NestedValue),
    NestedList(Vec<NestedValue>),
}

impl FilterValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, FilterValue::Unset)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FilterValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// True when the value carries nothing worth writing to the query string.
    pub fn is_query_empty(&self) -> bool {
        match self {
            FilterValue::Unset => true,
            FilterValue::Text(text) => text.is_empty(),
            FilterValue::List(items) => items.is_empty(),
            FilterValue::Nested(map) => map.is_empty(),
            FilterValue::NestedList(maps) => maps.is_empty(),
        }
    }

    /// One-level equality.
    ///
    /// Scalars compare by value, sequences and nested maps compare their
    /// elements pairwise. Two empty sequences are equal whatever their
    /// element type.
    pub fn shallow_eq(
        &self,
        other: &FilterValue,
    ) -> bool {
        use FilterValue::*;

        match (self, other) {
            (Unset, Unset) => true,
            (Text(a), Text(b)) => a == b,
            (List(a), List(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y),
            (Nested(a), Nested(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (NestedList(a), NestedList(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            (List(a), NestedList(b)) | (NestedList(b), List(a)) => a.is_empty() && b.is_empty(),
            _ => false,
        }
    }
}

/// Shallow equality over possibly missing entries of a [`FiltersMap`].
pub fn shallow_eq_entry(
    prev: Option<&FilterValue>,
    next: Option<&FilterValue>,
) -> bool {
    match (prev, next) {
        (None, None) => true,
        (Some(a), Some(b)) => a.shallow_eq(b),
        _ => false,
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::List(value)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(value: Vec<&str>) -> Self {
        FilterValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<NestedValue> for FilterValue {
    fn from(value: NestedValue) -> Self {
        FilterValue::Nested(value)
    }
}

impl From<Vec<NestedValue>> for FilterValue {
    fn from(value: Vec<NestedValue>) -> Self {
        FilterValue::NestedList(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}
