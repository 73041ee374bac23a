//! Background Tasks Module
//!
//! Contains tasks that run detached from request handling.
//!
//! # Tasks
//! - TTL Expiry: one deferred deletion per `set_ttl` call

mod expiry;

pub use expiry::ExpiryTracker;
