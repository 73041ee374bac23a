//! Cache Module
//!
//! Provides the concurrent typed key-value engine with per-key TTL expiry.

mod search;
mod stats;
mod store;
mod value;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use search::sentinel_linear_search;
pub use stats::{LookupCounters, MemoryStats, StatsSnapshot};
pub use store::Cache;
pub(crate) use value::Entries;
pub use value::{Dict, List, Value, ValueKind};
