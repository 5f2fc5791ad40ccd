use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use filters_sync::Backends;
use filters_sync::DurableStorage;
use filters_sync::FilterValue;
use filters_sync::FiltersConfig;
use filters_sync::FiltersMap;
use filters_sync::FlatQueryCodec;
use filters_sync::MemoryLocation;
use filters_sync::MemoryStorage;

pub const WAIT_FOR_PERSIST_MS: u64 = 350;

pub fn text_filters(pairs: &[(&str, &str)]) -> FiltersMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FilterValue::from(*v)))
        .collect()
}

/// `{search: "", category: "bear"}` under `storage_name`
pub fn scenario_config(storage_name: &str) -> FiltersConfig {
    FiltersConfig::new(text_filters(&[("search", ""), ("category", "bear")])).with_storage_name(storage_name)
}

pub struct Harness {
    pub location: Arc<MemoryLocation>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    pub fn new(query: &str) -> Self {
        Self {
            location: Arc::new(MemoryLocation::new(query)),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    pub fn store_payload(
        &self,
        name: &str,
        payload: &str,
    ) {
        self.storage.set(name, payload).unwrap();
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
}

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
