//! Prometheus counters for the persistence path.
//!
//! Every counter is labelled with the storage name so that several stores
//! in one process stay distinguishable.


use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;

pub(crate) const STORAGE_NAME_LABEL: &str = "storage_name";

lazy_static! {
    pub static ref PERSIST_PASSES: IntCounterVec = IntCounterVec::new(
        Opts::new("filters_persist_passes", "Debounced persistence passes run"),
        &[STORAGE_NAME_LABEL]
    )
    .expect("metric can not be created");

    pub static ref STORAGE_WRITES: IntCounterVec = IntCounterVec::new(
        Opts::new("filters_storage_writes", "Filters payloads written to durable storage"),
        &[STORAGE_NAME_LABEL]
    )
    .expect("metric can not be created");

    pub static ref STORAGE_WRITE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "filters_storage_write_failures",
            "Durable storage writes that failed and were skipped"
        ),
        &[STORAGE_NAME_LABEL]
    )
    .expect("metric can not be created");

    pub static ref QUERY_WRITES: IntCounterVec = IntCounterVec::new(
        Opts::new("filters_query_writes", "Query strings replaced in place"),
        &[STORAGE_NAME_LABEL]
    )
    .expect("metric can not be created");

    pub static ref UNKNOWN_KEY_MUTATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "filters_unknown_key_mutations",
            "Mutations skipped because the key is not an initial filter"
        ),
        &[STORAGE_NAME_LABEL]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();

    static ref DEFAULT_REGISTRATION: bool = match register_custom_metrics(&REGISTRY) {
        Ok(()) => true,
        Err(e) => {
            error!("filters metrics could not be registered: {}", e);
            false
        }
    };
}

/// Registers the counters into [`REGISTRY`] once per process.
pub(crate) fn ensure_registered() {
    lazy_static::initialize(&DEFAULT_REGISTRATION);
}

pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(PERSIST_PASSES.clone()))?;
    registry.register(Box::new(STORAGE_WRITES.clone()))?;
    registry.register(Box::new(STORAGE_WRITE_FAILURES.clone()))?;
    registry.register(Box::new(QUERY_WRITES.clone()))?;
    registry.register(Box::new(UNKNOWN_KEY_MUTATIONS.clone()))?;
    Ok(())
}

/// Renders the registry in the Prometheus text exposition format.
pub fn encode_metrics(registry: &Registry) -> String {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode filters metrics: {}", e);
        return String::default();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("filters metrics could not be from_utf8'd: {}", e);
        String::default()
    })
}
