//! Debounced write-back of filters to durable storage and the query string.
//!
//! A single timer task is armed per store. Every `schedule` call aborts the
//! pending task and arms a new one carrying the latest state, so a burst of
//! mutations inside the quiet interval ends in exactly one persistence pass.


use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;
use tracing::error;
use tracing::trace;

use crate::metrics::PERSIST_PASSES;
use crate::metrics::QUERY_WRITES;
use crate::metrics::STORAGE_WRITES;
use crate::metrics::STORAGE_WRITE_FAILURES;
use crate::policy::policy_for;
use crate::Backends;
use crate::EncodeOptions;
use crate::FilterKey;
use crate::FiltersConfig;
use crate::FiltersMap;
use crate::FiltersOptions;
use crate::StorageError;
use crate::StoreState;

pub struct WriteBackScheduler {
    handle: Handle,
    delay: Duration,
    writer: Arc<PersistWriter>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl WriteBackScheduler {
    pub(crate) fn new(
        handle: Handle,
        config: &FiltersConfig,
        backends: Backends,
    ) -> Self {
        Self {
            handle,
            delay: config.persist_debounce(),
            writer: Arc::new(PersistWriter::new(config, backends)),
            pending: Mutex::new(None),
        }
    }

    /// Arms (or re-arms) the timer to persist `state` once the quiet
    /// interval elapses.
    pub fn schedule(
        &self,
        state: Arc<StoreState>,
    ) {
        let writer = self.writer.clone();
        let delay = self.delay;

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            trace!("re-arming write-back timer");
            previous.abort();
        }

        *pending = Some(self.handle.spawn(async move {
            sleep(delay).await;
            writer.persist(&state);
        }));
    }

    /// Cancels the pending pass, if any, and persists `state` right away.
    pub fn flush(
        &self,
        state: &StoreState,
    ) {
        self.cancel();
        self.writer.persist(state);
    }

    /// Drops the pending pass without persisting. Returns whether one was armed.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(previous) => {
                previous.abort();
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Removes the persisted payload from durable storage.
    pub(crate) fn clear_storage(&self) {
        self.writer.clear_storage();
    }
}

/// Runs one persistence pass. Passes never overlap.
pub(crate) struct PersistWriter {
    keys: BTreeSet<FilterKey>,
    options: FiltersOptions,
    keep_other_query_params: bool,
    storage_name: String,
    backends: Backends,
    in_flight: Mutex<()>,
}

impl PersistWriter {
    pub(crate) fn new(
        config: &FiltersConfig,
        backends: Backends,
    ) -> Self {
        Self {
            keys: config.initial_filters.keys().cloned().collect(),
            options: config.filters_options.clone(),
            keep_other_query_params: config.keep_other_query_params,
            storage_name: config.storage_name.clone(),
            backends,
            in_flight: Mutex::new(()),
        }
    }

    pub(crate) fn persist(
        &self,
        state: &StoreState,
    ) {
        let _guard = self.in_flight.lock();
        let label = [self.storage_name.as_str()];
        PERSIST_PASSES.with_label_values(&label).inc();
        debug!("persisting filters under {:?}", self.storage_name);

        // Independent steps: a storage failure must not block the query write.
        self.write_storage(state);
        self.write_query(state);
    }

    /// Keys whose policy allows writing to storage.
    pub(crate) fn storage_payload(
        &self,
        state: &StoreState,
    ) -> FiltersMap {
        self.keys
            .iter()
            .filter(|key| policy_for(&self.options, key).write_to_storage)
            .filter_map(|key| state.filters.get(key).map(|value| (key.clone(), value.clone())))
            .collect()
    }

    /// Keys whose policy allows writing to the query and that a consumer
    /// subscribed, minus empty values.
    pub(crate) fn query_payload(
        &self,
        state: &StoreState,
    ) -> FiltersMap {
        self.keys
            .iter()
            .filter(|key| policy_for(&self.options, key).write_to_query)
            .filter(|key| state.subscribed_keys.contains(*key))
            .filter_map(|key| state.filters.get(key).map(|value| (key, value)))
            .filter(|(_, value)| !value.is_query_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn write_storage(
        &self,
        state: &StoreState,
    ) {
        let payload = self.storage_payload(state);
        if payload.is_empty() {
            return;
        }

        let label = [self.storage_name.as_str()];
        let result = serde_json::to_string(&payload)
            .map_err(StorageError::from)
            .and_then(|raw| self.backends.storage.set(&self.storage_name, &raw));

        match result {
            Ok(()) => STORAGE_WRITES.with_label_values(&label).inc(),
            Err(e) => {
                error!("Error: setItem {:?}: {}", self.storage_name, e);
                STORAGE_WRITE_FAILURES.with_label_values(&label).inc();
            }
        }
    }

    fn write_query(
        &self,
        state: &StoreState,
    ) {
        let codec = &self.backends.codec;

        // Foreign parameters are carried over verbatim; filter-owned ones
        // are replaced by the payload.
        let mut pairs: Vec<String> = if self.keep_other_query_params {
            codec
                .split_params(&self.backends.location.query())
                .into_iter()
                .filter(|(key, _)| !self.keys.contains(key))
                .map(|(_, pair)| pair)
                .collect()
        } else {
            Vec::new()
        };

        let payload = codec.encode(&self.query_payload(state), EncodeOptions::default());
        if !payload.is_empty() {
            pairs.push(payload);
        }

        let raw = if pairs.is_empty() {
            String::new()
        } else {
            format!("?{}", pairs.join("&"))
        };
        trace!("replacing query with {raw:?}");
        self.backends.location.replace_query(&raw);
        QUERY_WRITES
            .with_label_values(&[self.storage_name.as_str()])
            .inc();
    }

    fn clear_storage(&self) {
        if let Err(e) = self.backends.storage.remove(&self.storage_name) {
            error!("Error: removeItem {:?}: {}", self.storage_name, e);
        }
    }
}
