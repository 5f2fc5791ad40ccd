use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::FilterKey;

/// Per-key switches deciding which backend may seed or receive a filter.
///
/// Read flags are consulted once, when the initial filters are resolved.
/// Write flags are consulted on every debounced persistence pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPolicy {
    #[serde(default = "default_true", alias = "getInitialValueFromQuery")]
    pub read_from_query: bool,

    #[serde(default = "default_true", alias = "getInitialValueFromLocalStorage")]
    pub read_from_storage: bool,

    #[serde(default = "default_true", alias = "setValueToQuery")]
    pub write_to_query: bool,

    #[serde(default = "default_true", alias = "setValueToLocalStorage")]
    pub write_to_storage: bool,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            read_from_query: true,
            read_from_storage: true,
            write_to_query: true,
            write_to_storage: true,
        }
    }
}

impl FilterPolicy {
    pub fn read_from_query(
        mut self,
        enabled: bool,
    ) -> Self {
        self.read_from_query = enabled;
        self
    }

    pub fn read_from_storage(
        mut self,
        enabled: bool,
    ) -> Self {
        self.read_from_storage = enabled;
        self
    }

    pub fn write_to_query(
        mut self,
        enabled: bool,
    ) -> Self {
        self.write_to_query = enabled;
        self
    }

    pub fn write_to_storage(
        mut self,
        enabled: bool,
    ) -> Self {
        self.write_to_storage = enabled;
        self
    }
}

/// Policies keyed by filter. Keys without an entry get [`FilterPolicy::default`].
pub type FiltersOptions = HashMap<FilterKey, FilterPolicy>;

pub(crate) fn policy_for(
    options: &FiltersOptions,
    key: &str,
) -> FilterPolicy {
    options.get(key).copied().unwrap_or_default()
}

fn default_true() -> bool {
    true
}
