//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    DictKeyQuery, DictRequest, ElementQuery, IndexQuery, IntRequest, ListRequest, StringRequest,
    TtlRequest, ValueRequest,
};
pub use responses::{
    Empty, Envelope, ErrorResponse, ExistsBody, GetBody, HealthResponse, IndexBody, KeysBody,
    LenBody, OldValueBody, StatsBody, ValueBody, CODE_OK,
};
