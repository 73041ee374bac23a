//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /v1/len`, `/v1/keys`, `/v1/stats` - Whole-cache views
//! - `GET /v1/get/:key`, `/v1/key/:key` - Read a value / test presence
//! - `GET|PUT|DELETE /v1/list/element/:key` - Read, append, remove list elements
//! - `GET|DELETE /v1/dict/element/:key` - Read, remove dictionary entries
//! - `POST|PUT /v1/{string,int,list,dict}/:key` - Create / update typed values
//! - `PUT /v1/int/increment/:key` - Atomic increment
//! - `PUT /v1/ttl/:key` - Schedule expiry
//! - `DELETE /v1/remove/:key` - Delete a key
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
