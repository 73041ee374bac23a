//! Response DTOs for the cache server API
//!
//! Every body shares one envelope: `error_code` is 0 on success and the
//! numeric error code otherwise, followed by operation-specific fields.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cache::{StatsSnapshot, Value};

/// `error_code` of every successful response.
pub const CODE_OK: u16 = 0;

/// Success envelope wrapping an operation-specific body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub error_code: u16,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            error_code: CODE_OK,
            body,
        }
    }
}

/// Body of routes that return nothing besides success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Empty {}

/// `GET /v1/len`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenBody {
    pub length: usize,
}

/// `GET /v1/keys`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysBody {
    pub keys: HashSet<String>,
}

/// `GET /v1/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsBody {
    pub stats: StatsSnapshot,
}

/// `GET /v1/get/:key`: the value plus its `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBody {
    #[serde(flatten)]
    pub value: Value,
}

/// Element reads and `increment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueBody<T> {
    pub value: T,
}

/// `GET /v1/key/:key`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistsBody {
    pub exists: bool,
}

/// Update routes: the value that was replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OldValueBody<T> {
    pub old_value: T,
}

/// `DELETE /v1/list/element/:key`: former index, -1 when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexBody {
    pub index: i64,
}

impl IndexBody {
    pub fn from_position(position: Option<usize>) -> Self {
        Self {
            index: position.map_or(-1, |i| i as i64),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error envelope for all error conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error_code: u16, error_message: impl Into<String>) -> Self {
        Self {
            error_code,
            error_message: Some(error_message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_flattens_body() {
        let json = serde_json::to_value(Envelope::ok(LenBody { length: 3 })).unwrap();
        assert_eq!(json, json!({"error_code": 0, "length": 3}));
    }

    #[test]
    fn test_empty_envelope() {
        let json = serde_json::to_value(Envelope::ok(Empty {})).unwrap();
        assert_eq!(json, json!({"error_code": 0}));
    }

    #[test]
    fn test_get_body_carries_type() {
        let body = GetBody {
            value: Value::List(vec!["one".into()]),
        };
        let json = serde_json::to_value(Envelope::ok(body)).unwrap();
        assert_eq!(
            json,
            json!({"error_code": 0, "type": "list", "value": ["one"]})
        );
    }

    #[test]
    fn test_get_envelope_decodes_as_value() {
        // The tagged value ignores the surrounding envelope fields.
        let json = json!({"error_code": 0, "type": "int", "value": 7});
        let value: Value = serde_json::from_value(json).unwrap();
        assert_eq!(value, Value::Int(7));
    }

    #[test]
    fn test_index_body_absent() {
        assert_eq!(IndexBody::from_position(None).index, -1);
        assert_eq!(IndexBody::from_position(Some(4)).index, 4);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new(997, "Invalid ttl value: -1");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            json!({"error_code": 997, "error_message": "Invalid ttl value: -1"})
        );
    }
}
