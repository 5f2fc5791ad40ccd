//! Shared helpers for unit tests.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::Backends;
use crate::DurableStorage;
use crate::FilterValue;
use crate::FiltersConfig;
use crate::FiltersMap;
use crate::FlatQueryCodec;
use crate::Location;
use crate::MemoryLocation;
use crate::MemoryStorage;
use crate::QueryCodec;

pub fn text_filters(pairs: &[(&str, &str)]) -> FiltersMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FilterValue::from(*v)))
        .collect()
}

/// `{search: "", category: "bear"}`
pub fn scenario_defaults() -> FiltersMap {
    text_filters(&[("search", ""), ("category", "bear")])
}

/// In-memory collaborators that stay inspectable after being handed to a store.
pub struct TestBackends {
    pub location: Arc<MemoryLocation>,
    pub storage: Arc<MemoryStorage>,
}

impl TestBackends {
    pub fn new(query: &str) -> Self {
        Self {
            location: Arc::new(MemoryLocation::new(query)),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    pub fn with_stored(
        self,
        name: &str,
        payload: &str,
    ) -> Self {
        self.storage.set(name, payload).unwrap();
        self
    }

    pub fn backends(&self) -> Backends {
        Backends::new(
            Arc::new(FlatQueryCodec),
            self.location.clone(),
            self.storage.clone(),
        )
    }

    pub fn stored(
        &self,
        name: &str,
    ) -> Option<FiltersMap> {
        self.storage
            .get(name)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    pub fn query_params(&self) -> FiltersMap {
        FlatQueryCodec.decode(&self.location.query())
    }
}

/// Scenario defaults persisted under `storage_name`.
pub fn scenario_config(storage_name: &str) -> FiltersConfig {
    FiltersConfig::new(scenario_defaults()).with_storage_name(storage_name)
}

/// Listener-side counter for notifications.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
