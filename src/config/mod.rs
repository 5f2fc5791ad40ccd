//! Construction-time configuration of a filters store.
//!
//! Loaded from multiple sources with priority:
//! 1. Default values (hardcoded)
//! 2. Optional TOML file
//! 3. Environment variables (highest priority), e.g.
//!    `FILTERS__PERSIST_DEBOUNCE_MS=50`

#[cfg(test)]
mod config_test;

use std::time::Duration;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::DEFAULT_PERSIST_DEBOUNCE_MS;
use crate::constants::DEFAULT_STORAGE_NAME;
use crate::policy::policy_for;
use crate::Error;
use crate::FilterKey;
use crate::FilterPolicy;
use crate::FilterValue;
use crate::FiltersMap;
use crate::FiltersOptions;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Default value of every filter. Fixes the key space of the store and
    /// is what `reset_filter`/`reset_filters` restore.
    #[serde(default)]
    pub initial_filters: FiltersMap,

    /// Per-key read/write policies, all-true when absent
    #[serde(default)]
    pub filters_options: FiltersOptions,

    /// Keep query parameters the store does not own when writing the query
    #[serde(default = "default_keep_other_query_params")]
    pub keep_other_query_params: bool,

    /// Entry name used in durable storage
    #[serde(default = "default_storage_name")]
    pub storage_name: String,

    /// Quiet interval before persisting (unit: milliseconds)
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            initial_filters: FiltersMap::new(),
            filters_options: FiltersOptions::new(),
            keep_other_query_params: default_keep_other_query_params(),
            storage_name: default_storage_name(),
            persist_debounce_ms: default_persist_debounce_ms(),
        }
    }
}

impl FiltersConfig {
    pub fn new(initial_filters: FiltersMap) -> Self {
        Self {
            initial_filters,
            ..Default::default()
        }
    }

    /// Load configuration from an optional TOML file, then apply
    /// `FILTERS__*` environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "storage_name must not be empty".to_string(),
            ));
        }

        if let Some(key) = self
            .filters_options
            .keys()
            .find(|key| !self.initial_filters.contains_key(key.as_str()))
        {
            return Err(Error::InvalidConfig(format!(
                "filters_options references \"{key}\" which is not an initial filter"
            )));
        }

        Ok(())
    }

    pub fn with_filter(
        mut self,
        key: impl Into<FilterKey>,
        default: impl Into<FilterValue>,
    ) -> Self {
        self.initial_filters.insert(key.into(), default.into());
        self
    }

    pub fn with_policy(
        mut self,
        key: impl Into<FilterKey>,
        policy: FilterPolicy,
    ) -> Self {
        self.filters_options.insert(key.into(), policy);
        self
    }

    pub fn with_keep_other_query_params(
        mut self,
        keep: bool,
    ) -> Self {
        self.keep_other_query_params = keep;
        self
    }

    pub fn with_storage_name(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.storage_name = name.into();
        self
    }

    pub fn with_persist_debounce_ms(
        mut self,
        ms: u64,
    ) -> Self {
        self.persist_debounce_ms = ms;
        self
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn policy(
        &self,
        key: &str,
    ) -> FilterPolicy {
        policy_for(&self.filters_options, key)
    }
}

fn default_keep_other_query_params() -> bool {
    true
}
fn default_storage_name() -> String {
    DEFAULT_STORAGE_NAME.to_string()
}
fn default_persist_debounce_ms() -> u64 {
    DEFAULT_PERSIST_DEBOUNCE_MS
}
