//! Flat query encoding.
//!
//! | value                     | query form               |
//! |---------------------------|--------------------------|
//! | `Text("dog")`             | `category=dog`           |
//! | `List(["a", "b"])`        | `tags[]=a,b`             |
//! | `Nested({min: 1})`        | `price.min=1`            |
//! | `NestedList([{id: 7}])`   | `items.0.id=7`           |
//!
//! Every key segment and value is percent-encoded, so literal `,` `[` and
//! `]` never clash with the structure characters. `.` is only escaped inside
//! key segments, where it separates paths. Empty values are omitted on
//! encode.

use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

use super::EncodeOptions;
use super::QueryCodec;
use crate::FilterKey;
use crate::FilterValue;
use crate::FiltersMap;
use crate::NestedValue;

const VALUE_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'~')
    .remove(b'.');

const KEY_COMPONENT: &AsciiSet = &VALUE_COMPONENT.add(b'.');

const LIST_SUFFIX: &str = "[]";
const PATH_SEPARATOR: char = '.';
const LIST_SEPARATOR: &str = ",";

/// Indices above this are not expanded into a nested list.
const MAX_NESTED_INDEX: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatQueryCodec;

impl QueryCodec for FlatQueryCodec {
    fn decode(
        &self,
        raw: &str,
    ) -> FiltersMap {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut params = FiltersMap::new();

        for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));

            if let Some(list_key) = raw_key.strip_suffix(LIST_SUFFIX) {
                let items = if raw_value.is_empty() {
                    Vec::new()
                } else {
                    raw_value.split(LIST_SEPARATOR).map(decode_component).collect()
                };
                insert_list(&mut params, decode_component(list_key), items);
                continue;
            }

            let segments: Vec<String> = raw_key.split(PATH_SEPARATOR).map(decode_component).collect();
            let value = decode_component(raw_value);

            match segments.as_slice() {
                [key] => insert_scalar(&mut params, key.clone(), value),
                [key, field] => insert_nested(&mut params, key.clone(), field.clone(), value),
                [key, index, field] => match index.parse::<usize>() {
                    Ok(index) if index <= MAX_NESTED_INDEX => {
                        insert_nested_item(&mut params, key.clone(), index, field.clone(), value)
                    }
                    _ => insert_scalar(&mut params, decode_component(raw_key), value),
                },
                _ => insert_scalar(&mut params, decode_component(raw_key), value),
            }
        }

        params
    }

    fn split_params(
        &self,
        raw: &str,
    ) -> Vec<(FilterKey, String)> {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        raw.split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let raw_key = pair.split_once('=').map_or(pair, |(key, _)| key);
                (root_key(raw_key), pair.to_string())
            })
            .collect()
    }

    fn encode(
        &self,
        params: &FiltersMap,
        options: EncodeOptions,
    ) -> String {
        let mut pairs: Vec<String> = Vec::new();

        for (key, value) in params {
            let key = encode_key(key);
            match value {
                FilterValue::Unset => {}
                FilterValue::Text(text) => {
                    if !text.is_empty() {
                        pairs.push(format!("{key}={}", encode_value(text)));
                    }
                }
                FilterValue::List(items) => {
                    if !items.is_empty() {
                        let joined: Vec<String> = items.iter().map(|i| encode_value(i)).collect();
                        pairs.push(format!(
                            "{key}{LIST_SUFFIX}={}",
                            joined.join(LIST_SEPARATOR)
                        ));
                    }
                }
                FilterValue::Nested(map) => push_nested(&mut pairs, &key, map),
                FilterValue::NestedList(maps) => {
                    for (index, map) in maps.iter().enumerate() {
                        push_nested(&mut pairs, &format!("{key}{PATH_SEPARATOR}{index}"), map);
                    }
                }
            }
        }

        let query = pairs.join("&");
        if options.add_prefix && !query.is_empty() {
            format!("?{query}")
        } else {
            query
        }
    }
}

fn push_nested(
    pairs: &mut Vec<String>,
    prefix: &str,
    map: &NestedValue,
) {
    for (field, value) in map.iter().filter(|(_, value)| !value.is_empty()) {
        pairs.push(format!(
            "{prefix}{PATH_SEPARATOR}{}={}",
            encode_key(field),
            encode_value(value)
        ));
    }
}

fn encode_key(raw: &str) -> String {
    utf8_percent_encode(raw, KEY_COMPONENT).to_string()
}

fn encode_value(raw: &str) -> String {
    utf8_percent_encode(raw, VALUE_COMPONENT).to_string()
}

/// Key a raw parameter name decodes under, following the same path rules
/// as `decode`.
fn root_key(raw_key: &str) -> FilterKey {
    if let Some(list_key) = raw_key.strip_suffix(LIST_SUFFIX) {
        return decode_component(list_key);
    }

    let segments: Vec<&str> = raw_key.split(PATH_SEPARATOR).collect();
    match segments.as_slice() {
        [key] | [key, _] => decode_component(key),
        [key, index, _] if index.parse::<usize>().is_ok_and(|i| i <= MAX_NESTED_INDEX) => {
            decode_component(key)
        }
        _ => decode_component(raw_key),
    }
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// A repeated scalar key collects its values into a list.
fn insert_scalar(
    params: &mut FiltersMap,
    key: String,
    value: String,
) {
    let merged = match params.remove(&key) {
        Some(FilterValue::Text(first)) => FilterValue::List(vec![first, value]),
        Some(FilterValue::List(mut items)) => {
            items.push(value);
            FilterValue::List(items)
        }
        _ => FilterValue::Text(value),
    };
    params.insert(key, merged);
}

fn insert_list(
    params: &mut FiltersMap,
    key: String,
    items: Vec<String>,
) {
    let merged = match params.remove(&key) {
        Some(FilterValue::List(mut existing)) => {
            existing.extend(items);
            existing
        }
        _ => items,
    };
    params.insert(key, FilterValue::List(merged));
}

fn insert_nested(
    params: &mut FiltersMap,
    key: String,
    field: String,
    value: String,
) {
    let mut map = match params.remove(&key) {
        Some(FilterValue::Nested(map)) => map,
        _ => NestedValue::new(),
    };
    map.insert(field, value);
    params.insert(key, FilterValue::Nested(map));
}

fn insert_nested_item(
    params: &mut FiltersMap,
    key: String,
    index: usize,
    field: String,
    value: String,
) {
    let mut items = match params.remove(&key) {
        Some(FilterValue::NestedList(items)) => items,
        _ => Vec::new(),
    };
    if items.len() <= index {
        items.resize_with(index + 1, NestedValue::new);
    }
    items[index].insert(field, value);
    params.insert(key, FilterValue::NestedList(items));
}
