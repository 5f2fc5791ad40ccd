use std::sync::Arc;
use std::time::Duration;

use filters_sync::Backends;
use filters_sync::FileStorage;
use filters_sync::FiltersProvider;
use filters_sync::FlatQueryCodec;
use filters_sync::MemoryLocation;
use filters_sync::SledStorage;
use tokio::time::sleep;

use crate::common::scenario_config;
use crate::common::text_filters;
use crate::common::WAIT_FOR_PERSIST_MS;

fn backends_with(storage: Arc<dyn filters_sync::DurableStorage>) -> Backends {
    Backends::new(
        Arc::new(FlatQueryCodec),
        Arc::new(MemoryLocation::default()),
        storage,
    )
}

#[tokio::test(start_paused = true)]
async fn file_storage_restores_filters_across_providers() {
    let dir = tempfile::tempdir().unwrap();

    {
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        let provider = FiltersProvider::new(scenario_config("file_restore"), backends_with(storage)).unwrap();
        provider.store().set_filter("category", "wolf");
        sleep(Duration::from_millis(WAIT_FOR_PERSIST_MS)).await;
    }

    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let provider = FiltersProvider::new(scenario_config("file_restore"), backends_with(storage)).unwrap();

    assert_eq!(
        provider.store().state().filters,
        text_filters(&[("search", ""), ("category", "wolf")])
    );
}

#[tokio::test]
async fn sled_storage_restores_flushed_filters() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SledStorage::open(dir.path()).unwrap());

    {
        let provider =
            FiltersProvider::new(scenario_config("sled_restore"), backends_with(storage.clone())).unwrap();
        provider.store().set_filter("search", "fox");
        // Dropping the provider flushes the pending pass
    }

    let provider = FiltersProvider::new(scenario_config("sled_restore"), backends_with(storage)).unwrap();
    assert_eq!(
        provider.store().get("search"),
        Some(filters_sync::FilterValue::from("fox"))
    );
}

#[tokio::test]
async fn cleared_storage_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());

    {
        let provider =
            FiltersProvider::new(scenario_config("file_cleared"), backends_with(storage.clone())).unwrap();
        provider.store().set_filter("search", "fox");
        provider.store().flush();
        provider.store().clear_persisted();
    }

    let provider = FiltersProvider::new(scenario_config("file_cleared"), backends_with(storage)).unwrap();
    assert_eq!(
        provider.store().state().filters,
        text_filters(&[("search", ""), ("category", "bear")])
    );
}
