/// Storage entry name used when none is configured
pub const DEFAULT_STORAGE_NAME: &str = "__DEFAULT_LS_FILTERS_KEY__";

/// Quiet interval before a burst of mutations is persisted (unit: milliseconds)
pub const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 300;

/// Environment variable prefix for configuration overrides
pub(crate) const CONFIG_ENV_PREFIX: &str = "FILTERS";

/// Extension of files written by the file storage adapter
pub(crate) const FILE_STORAGE_EXTENSION: &str = "json";
