//! Filter-state sync engine.
//!
//! One canonical map of filters per [`FilterStore`], seeded from defaults,
//! durable storage and the query string, and written back to both after a
//! debounce interval.

mod backends;
mod codec;
mod config;
mod constants;
mod errors;
mod location;
pub mod metrics;
mod policy;
mod provider;
mod resolver;
mod scheduler;
mod storage;
mod store;
mod value;
mod view;

pub use backends::*;
pub use codec::*;
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use location::*;
pub use policy::*;
pub use provider::*;
pub use resolver::*;
pub use scheduler::*;
pub use storage::*;
pub use store::*;
pub use value::*;
pub use view::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
