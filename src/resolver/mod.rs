//! Merge-on-load: computes the initial filters once, per key, from the
//! query string, durable storage and the configured defaults.


use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::policy::policy_for;
use crate::Backends;
use crate::DurableStorage;
use crate::FilterValue;
use crate::FiltersConfig;
use crate::FiltersMap;
use crate::FiltersOptions;

/// Resolves every key of `defaults`, in precedence order:
/// 1. the query value, if the key may be read from the query
/// 2. the storage value, if the key may be read from storage
/// 3. the default
///
/// Keys that only exist in `query` or `storage` never enter the result.
pub fn resolve(
    defaults: &FiltersMap,
    options: &FiltersOptions,
    query: &FiltersMap,
    storage: &FiltersMap,
) -> FiltersMap {
    defaults
        .iter()
        .map(|(key, default)| {
            let policy = policy_for(options, key);
            let value = if let Some(value) = query.get(key).filter(|_| policy.read_from_query) {
                value
            } else if let Some(value) = storage.get(key).filter(|_| policy.read_from_storage) {
                value
            } else {
                default
            };
            (key.clone(), value.clone())
        })
        .collect()
}

/// Reads the filters payload stored under `name`, keeping only the keys of
/// `defaults`.
///
/// Missing, unreadable or malformed payloads all read as an empty map. A
/// known key whose value has the wrong shape is dropped on its own; foreign
/// keys are never looked at.
pub fn read_storage_filters(
    storage: &dyn DurableStorage,
    name: &str,
    defaults: &FiltersMap,
) -> FiltersMap {
    let raw = match storage.get(name) {
        Ok(Some(raw)) => raw,
        Ok(None) => return FiltersMap::new(),
        Err(e) => {
            error!("Error: getItem {name:?}: {e}");
            return FiltersMap::new();
        }
    };

    let mut payload: BTreeMap<String, Value> = match serde_json::from_str(&raw) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Error: malformed filters payload under {name:?}: {e}");
            return FiltersMap::new();
        }
    };

    defaults
        .keys()
        .filter_map(|key| payload.remove(key).map(|value| (key, value)))
        .filter_map(|(key, value)| match serde_json::from_value::<FilterValue>(value) {
            Ok(value) => Some((key.clone(), value)),
            Err(e) => {
                warn!("stored value of {key:?} under {name:?} is skipped: {e}");
                None
            }
        })
        .collect()
}

/// Reads both backends and resolves the initial filters for `config`.
pub fn load_initial_filters(
    config: &FiltersConfig,
    backends: &Backends,
) -> FiltersMap {
    let query = backends.codec.decode(&backends.location.query());
    let stored = read_storage_filters(
        backends.storage.as_ref(),
        &config.storage_name,
        &config.initial_filters,
    );

    debug!(
        "resolving {} filters (query params: {}, stored: {})",
        config.initial_filters.len(),
        query.len(),
        stored.len()
    );

    resolve(
        &config.initial_filters,
        &config.filters_options,
        &query,
        &stored,
    )
}
