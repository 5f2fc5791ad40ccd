//! Query-string codec seam.
//!
//! The store never parses or formats query strings itself; it hands a
//! [`FiltersMap`] to a [`QueryCodec`] and back.

mod flat;

pub use flat::*;


#[cfg(test)]
use mockall::automock;

use crate::FilterKey;
use crate::FiltersMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Prefix a non-empty result with `?`
    pub add_prefix: bool,
}

#[cfg_attr(test, automock)]
pub trait QueryCodec: Send + Sync + 'static {
    /// Parses a raw query string, with or without the leading `?`.
    fn decode(
        &self,
        raw: &str,
    ) -> FiltersMap;

    /// Splits a raw query into its parameters, untouched, each paired with
    /// the top-level key it decodes under.
    fn split_params(
        &self,
        raw: &str,
    ) -> Vec<(FilterKey, String)>;

    /// Formats parameters, leaving out values that are empty.
    fn encode(
        &self,
        params: &FiltersMap,
        options: EncodeOptions,
    ) -> String;
}
