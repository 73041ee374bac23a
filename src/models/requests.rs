//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::{Deserialize, Serialize};

use crate::cache::{Dict, List};

/// Request body carrying a value for create/update routes
/// (`POST|PUT /v1/{string,int,list,dict}/:key`, `PUT /v1/list/element/:key`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueRequest<T> {
    pub value: T,
}

impl<T> ValueRequest<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

pub type StringRequest = ValueRequest<String>;
pub type IntRequest = ValueRequest<i64>;
pub type ListRequest = ValueRequest<List>;
pub type DictRequest = ValueRequest<Dict>;

/// Request body for `PUT /v1/ttl/:key`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlRequest {
    /// Time to live in milliseconds
    pub ttl: i64,
}

/// Query string for `GET /v1/list/element/:key`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexQuery {
    pub index: i64,
}

/// Query string for the dictionary element routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictKeyQuery {
    pub dict_key: String,
}

/// Query string for `DELETE /v1/list/element/:key`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementQuery {
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_request_deserialize() {
        let req: StringRequest = serde_json::from_str(r#"{"value": "hello"}"#).unwrap();
        assert_eq!(req.value, "hello");
    }

    #[test]
    fn test_dict_request_deserialize() {
        let req: DictRequest =
            serde_json::from_str(r#"{"value": {"k1": "v1", "k2": "v2"}}"#).unwrap();
        assert_eq!(req.value.len(), 2);
        assert_eq!(req.value["k2"], "v2");
    }

    #[test]
    fn test_int_request_rejects_string() {
        let result: Result<IntRequest, _> = serde_json::from_str(r#"{"value": "12"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_ttl_request_accepts_negative() {
        let req: TtlRequest = serde_json::from_str(r#"{"ttl": -1}"#).unwrap();
        assert_eq!(req.ttl, -1);
    }
}
