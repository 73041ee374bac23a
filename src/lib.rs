//! kvcache - A concurrent in-memory typed key-value cache server
//!
//! Stores strings, integers, lists and dictionaries under string keys, with
//! per-key TTL expiry, behind a JSON HTTP API and a matching client.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, Dict, List, StatsSnapshot, Value, ValueKind};
pub use client::{CacheClient, ClientError};
pub use config::{BasicCredentials, Config};
pub use error::CacheError;
