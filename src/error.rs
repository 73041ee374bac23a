//! Error types for the cache engine
//!
//! Every fallible engine operation returns one of the kinds below, each with a
//! fixed numeric code that the HTTP layer puts on the wire.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::cache::ValueKind;
use crate::models::ErrorResponse;

// == Error Codes ==
pub const CODE_KEY_NOT_FOUND: u16 = 404;
pub const CODE_DICT_KEY_NOT_FOUND: u16 = 404;
pub const CODE_WRONG_TYPE: u16 = 999;
pub const CODE_INDEX_OUT_OF_BOUNDS: u16 = 998;
pub const CODE_INVALID_TTL: u16 = 997;
pub const CODE_BAD_REQUEST: u16 = 400;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its HTTP surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not present in the cache
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Key present, but the dictionary has no such entry
    #[error("Key not found in dictionary: {0}")]
    DictKeyNotFound(String),

    /// Stored value has a different shape than the operation requires
    #[error("Wrong type for key '{key}': expected {expected}, found {found}")]
    WrongType {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// List index outside `0..len`
    #[error("Index out of bounds: {index} (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    /// Negative TTL
    #[error("Invalid ttl value: {0}")]
    InvalidTtl(i64),

    /// Malformed request at the boundary layer
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl CacheError {
    /// Returns the stable numeric code reported to remote callers.
    pub fn code(&self) -> u16 {
        match self {
            CacheError::KeyNotFound(_) => CODE_KEY_NOT_FOUND,
            CacheError::DictKeyNotFound(_) => CODE_DICT_KEY_NOT_FOUND,
            CacheError::WrongType { .. } => CODE_WRONG_TYPE,
            CacheError::IndexOutOfBounds { .. } => CODE_INDEX_OUT_OF_BOUNDS,
            CacheError::InvalidTtl(_) => CODE_INVALID_TTL,
            CacheError::BadRequest(_) => CODE_BAD_REQUEST,
        }
    }

    /// HTTP status used when the error leaves through the API.
    pub fn status(&self) -> StatusCode {
        match self {
            CacheError::KeyNotFound(_) | CacheError::DictKeyNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.code(), self.to_string()));
        (self.status(), body).into_response()
    }
}

// == Extractor Rejections ==
// Malformed input is reported in the same envelope as engine errors.
impl From<JsonRejection> for CacheError {
    fn from(rejection: JsonRejection) -> Self {
        CacheError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for CacheError {
    fn from(rejection: QueryRejection) -> Self {
        CacheError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for CacheError {
    fn from(rejection: PathRejection) -> Self {
        CacheError::BadRequest(rejection.body_text())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
