use std::time::Duration;

use filters_sync::Error;
use filters_sync::FilterPolicy;
use filters_sync::FilterValue;
use filters_sync::FiltersProvider;
use filters_sync::FiltersScope;
use filters_sync::Location;
use tokio::time::sleep;

use crate::common::scenario_config;
use crate::common::text_filters;
use crate::common::Counter;
use crate::common::Harness;
use crate::common::WAIT_FOR_PERSIST_MS;

/// Query beats storage, storage beats defaults.
#[tokio::test]
async fn initial_load_merges_query_storage_and_defaults() {
    let harness = Harness::new("?category=dog");
    harness.store_payload("scenario_a", r#"{"search":"x"}"#);

    let provider = FiltersProvider::new(scenario_config("scenario_a"), harness.backends()).unwrap();

    assert_eq!(
        provider.store().state().filters,
        text_filters(&[("search", "x"), ("category", "dog")])
    );
}

#[tokio::test]
async fn unknown_keys_in_a_batch_are_skipped() {
    let harness = Harness::new("?category=dog");
    harness.store_payload("scenario_b", r#"{"search":"x"}"#);
    let provider = FiltersProvider::new(scenario_config("scenario_b"), harness.backends()).unwrap();
    let view = provider.scope().use_filters(|| {}).unwrap();

    view.set_filters([("search", "cat"), ("bogus", "y")]);

    assert_eq!(
        provider.store().state().filters,
        text_filters(&[("search", "cat"), ("category", "dog")])
    );
}

#[tokio::test(start_paused = true)]
async fn query_write_disabled_key_reaches_storage_only() {
    let harness = Harness::new("");
    let config = scenario_config("scenario_c")
        .with_policy("search", FilterPolicy::default().write_to_query(false));
    let provider = FiltersProvider::new(config, harness.backends()).unwrap();
    let scope = provider.scope();
    let search = scope.use_filter("search", || {}).unwrap();
    let category = scope.use_filter("category", || {}).unwrap();

    search.set("q");
    category.set("cat");
    sleep(Duration::from_millis(WAIT_FOR_PERSIST_MS)).await;

    assert_eq!(
        harness.stored("scenario_c"),
        Some(text_filters(&[("search", "q"), ("category", "cat")]))
    );
    assert_eq!(harness.location.query(), "?category=cat");
}

#[tokio::test(start_paused = true)]
async fn only_subscribed_keys_reach_the_query() {
    let harness = Harness::new("");
    harness.store_payload("scenario_d", r#"{"search":"x"}"#);
    let provider = FiltersProvider::new(scenario_config("scenario_d"), harness.backends()).unwrap();
    let scope = provider.scope();
    let category = scope.use_filter("category", || {}).unwrap();

    category.set("cat");
    sleep(Duration::from_millis(WAIT_FOR_PERSIST_MS)).await;

    assert_eq!(harness.location.query(), "?category=cat");
    assert_eq!(
        harness.stored("scenario_d"),
        Some(text_filters(&[("search", "x"), ("category", "cat")]))
    );
}

#[tokio::test(start_paused = true)]
async fn rapid_mutations_end_in_one_write_with_the_last_state() {
    let harness = Harness::new("?page=3");
    let provider = FiltersProvider::new(scenario_config("scenario_burst"), harness.backends()).unwrap();
    let search = provider.scope().use_filter("search", || {}).unwrap();

    for value in ["r", "re", "red"] {
        search.set(value);
        sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(harness.stored("scenario_burst"), None);

    sleep(Duration::from_millis(WAIT_FOR_PERSIST_MS)).await;

    assert_eq!(harness.location.query(), "?page=3&search=red");
    assert_eq!(harness.location.history_len(), 1);
    assert_eq!(
        filters_sync::metrics::PERSIST_PASSES
            .with_label_values(&["scenario_burst"])
            .get(),
        1
    );
}

#[tokio::test]
async fn view_rerenders_only_for_what_it_read() {
    let harness = Harness::new("");
    let provider = FiltersProvider::new(scenario_config("scenario_view"), harness.backends()).unwrap();
    let renders = Counter::default();
    let counter = renders.clone();
    let view = provider.scope().use_filters(move || counter.hit()).unwrap();

    assert_eq!(view.get("search"), Some(FilterValue::from("")));
    provider.store().set_filter("category", "cat");
    assert_eq!(renders.count(), 0);

    provider.store().set_filter("search", "panda");
    assert_eq!(renders.count(), 1);
}

#[tokio::test]
async fn consumer_without_provider_fails_fast() {
    let scope = FiltersScope::detached();

    assert!(matches!(scope.use_filters(|| {}), Err(Error::MissingProvider)));
}
