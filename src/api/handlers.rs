//! API Handlers
//!
//! HTTP request handlers, one per cache operation. Each handler extracts its
//! inputs, calls the engine once and wraps the result in the JSON envelope.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::cache::Cache;
use crate::error::Result;
use crate::models::{
    DictKeyQuery, DictRequest, ElementQuery, Empty, Envelope, ExistsBody, GetBody,
    HealthResponse, IndexBody, IndexQuery, IntRequest, KeysBody, LenBody, ListRequest,
    OldValueBody, StatsBody, StringRequest, TtlRequest, ValueBody,
};
use crate::{Dict, List};

/// Application state shared across all handlers.
///
/// The cache is internally synchronized; cloning the state clones a handle
/// to the same store.
#[derive(Clone, Default)]
pub struct AppState {
    pub cache: Cache,
}

impl AppState {
    /// Creates a new AppState serving the given cache.
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }
}

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type QueryParams<T> = std::result::Result<Query<T>, QueryRejection>;
type Reply<T> = Result<Json<Envelope<T>>>;

fn ok<T>(body: T) -> Reply<T> {
    Ok(Json(Envelope::ok(body)))
}

// == Core ==

/// Handler for GET /v1/len
pub async fn len_handler(State(state): State<AppState>) -> Json<Envelope<LenBody>> {
    Json(Envelope::ok(LenBody {
        length: state.cache.len(),
    }))
}

/// Handler for GET /v1/keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<Envelope<KeysBody>> {
    Json(Envelope::ok(KeysBody {
        keys: state.cache.keys(),
    }))
}

/// Handler for GET /v1/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<Envelope<StatsBody>> {
    Json(Envelope::ok(StatsBody {
        stats: state.cache.stats(),
    }))
}

// == Accessors ==

/// Handler for GET /v1/get/:key
pub async fn get_handler(State(state): State<AppState>, Path(key): Path<String>) -> Reply<GetBody> {
    let value = state.cache.get(&key)?;
    ok(GetBody { value })
}

/// Handler for GET /v1/list/element/:key?index=N
pub async fn get_list_element_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: QueryParams<IndexQuery>,
) -> Reply<ValueBody<String>> {
    let Query(query) = query?;
    let value = state.cache.get_list_element(&key, query.index)?;
    ok(ValueBody { value })
}

/// Handler for GET /v1/dict/element/:key?dict_key=K
pub async fn get_dict_element_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: QueryParams<DictKeyQuery>,
) -> Reply<ValueBody<String>> {
    let Query(query) = query?;
    let value = state.cache.get_dict_element(&key, &query.dict_key)?;
    ok(ValueBody { value })
}

/// Handler for GET /v1/key/:key
pub async fn has_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Reply<ExistsBody> {
    let exists = state.cache.has_key(&key)?;
    ok(ExistsBody { exists })
}

// == Mutators: create ==

/// Handler for POST /v1/string/:key
pub async fn set_string_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<StringRequest>,
) -> Reply<Empty> {
    let Json(req) = payload?;
    state.cache.set_string(key, req.value);
    ok(Empty {})
}

/// Handler for POST /v1/int/:key
pub async fn set_int_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<IntRequest>,
) -> Reply<Empty> {
    let Json(req) = payload?;
    state.cache.set_int(key, req.value);
    ok(Empty {})
}

/// Handler for POST /v1/list/:key
pub async fn set_list_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<ListRequest>,
) -> Reply<Empty> {
    let Json(req) = payload?;
    state.cache.set_list(key, req.value);
    ok(Empty {})
}

/// Handler for POST /v1/dict/:key
pub async fn set_dict_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<DictRequest>,
) -> Reply<Empty> {
    let Json(req) = payload?;
    state.cache.set_dict(key, req.value);
    ok(Empty {})
}

// == Mutators: update ==

/// Handler for PUT /v1/string/:key
pub async fn update_string_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<StringRequest>,
) -> Reply<OldValueBody<String>> {
    let Json(req) = payload?;
    let old_value = state.cache.update_string(&key, req.value)?;
    ok(OldValueBody { old_value })
}

/// Handler for PUT /v1/int/:key
pub async fn update_int_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<IntRequest>,
) -> Reply<OldValueBody<i64>> {
    let Json(req) = payload?;
    let old_value = state.cache.update_int(&key, req.value)?;
    ok(OldValueBody { old_value })
}

/// Handler for PUT /v1/list/:key
pub async fn update_list_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<ListRequest>,
) -> Reply<OldValueBody<List>> {
    let Json(req) = payload?;
    let old_value = state.cache.update_list(&key, req.value)?;
    ok(OldValueBody { old_value })
}

/// Handler for PUT /v1/dict/:key
pub async fn update_dict_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<DictRequest>,
) -> Reply<OldValueBody<Dict>> {
    let Json(req) = payload?;
    let old_value = state.cache.update_dict(&key, req.value)?;
    ok(OldValueBody { old_value })
}

/// Handler for PUT /v1/list/element/:key
pub async fn append_to_list_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<StringRequest>,
) -> Reply<Empty> {
    let Json(req) = payload?;
    state.cache.append_to_list(&key, req.value)?;
    ok(Empty {})
}

/// Handler for PUT /v1/int/increment/:key
pub async fn increment_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Reply<ValueBody<i64>> {
    let value = state.cache.increment(&key)?;
    ok(ValueBody { value })
}

/// Handler for PUT /v1/ttl/:key
pub async fn set_ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: JsonBody<TtlRequest>,
) -> Reply<Empty> {
    let Json(req) = payload?;
    state.cache.set_ttl(&key, req.ttl)?;
    ok(Empty {})
}

// == Mutators: delete ==

/// Handler for DELETE /v1/remove/:key
pub async fn remove_handler(State(state): State<AppState>, Path(key): Path<String>) -> Reply<Empty> {
    state.cache.remove(&key);
    ok(Empty {})
}

/// Handler for DELETE /v1/list/element/:key?value=V
pub async fn remove_from_list_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: QueryParams<ElementQuery>,
) -> Reply<IndexBody> {
    let Query(query) = query?;
    let position = state.cache.remove_from_list(&key, &query.value)?;
    ok(IndexBody::from_position(position))
}

/// Handler for DELETE /v1/dict/element/:key?dict_key=K
pub async fn remove_from_dict_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: QueryParams<DictKeyQuery>,
) -> Reply<Empty> {
    let Query(query) = query?;
    state.cache.remove_from_dict(&key, &query.dict_key)?;
    ok(Empty {})
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::models::ValueRequest;
    use crate::Value;
    use tokio_test::{assert_err, assert_ok};

    fn body<T>(json: T) -> JsonBody<T> {
        Ok(Json(json))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = AppState::default();

        let result = set_string_handler(
            State(state.clone()),
            Path("greeting".to_string()),
            body(ValueRequest::new("hello".to_string())),
        )
        .await;
        assert_ok!(result);

        let response = get_handler(State(state), Path("greeting".to_string()))
            .await
            .unwrap();
        assert_eq!(response.error_code, 0);
        assert_eq!(response.body.value, Value::String("hello".into()));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = AppState::default();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert_err!(result);
    }

    #[tokio::test]
    async fn test_update_returns_old_value() {
        let state = AppState::default();
        state.cache.set_int("n", 1);

        let response = update_int_handler(
            State(state.clone()),
            Path("n".to_string()),
            body(ValueRequest::new(2)),
        )
        .await
        .unwrap();
        assert_eq!(response.body.old_value, 1);
        assert_eq!(state.cache.get("n").unwrap(), Value::Int(2));
    }

    #[tokio::test]
    async fn test_increment_handler() {
        let state = AppState::default();
        state.cache.set_int("n", 9);

        let response = increment_handler(State(state), Path("n".to_string()))
            .await
            .unwrap();
        assert_eq!(response.body.value, 10);
    }

    #[tokio::test]
    async fn test_remove_from_list_handler_reports_minus_one() {
        let state = AppState::default();
        state.cache.set_list("l", vec!["one".into(), "two".into()]);

        let response = remove_from_list_handler(
            State(state),
            Path("l".to_string()),
            Ok(Query(ElementQuery {
                value: "nine".into(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(response.body.index, -1);
    }

    #[tokio::test]
    async fn test_set_ttl_handler_rejects_negative() {
        let state = AppState::default();

        let result = set_ttl_handler(
            State(state),
            Path("k".to_string()),
            body(TtlRequest { ttl: -10 }),
        )
        .await;
        assert_eq!(result.unwrap_err(), CacheError::InvalidTtl(-10));
    }

    #[tokio::test]
    async fn test_len_and_keys_handlers() {
        let state = AppState::default();
        state.cache.set_string("a", "1");
        state.cache.set_string("b", "2");

        let len = len_handler(State(state.clone())).await;
        assert_eq!(len.body.length, 2);

        let keys = keys_handler(State(state)).await;
        assert!(keys.body.keys.contains("a"));
        assert!(keys.body.keys.contains("b"));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
