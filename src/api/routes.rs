//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
    validate_request::ValidateRequestHeaderLayer,
};

use super::handlers::*;
use crate::config::BasicCredentials;

/// Creates the main router with all endpoints configured.
///
/// Cache operations live under `/v1`. When `auth` is given, every `/v1`
/// route requires HTTP Basic authentication; `/health` stays open.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState, auth: Option<&BasicCredentials>) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut api = Router::new()
        // core
        .route("/len", get(len_handler))
        .route("/keys", get(keys_handler))
        .route("/stats", get(stats_handler))
        // accessors
        .route("/get/:key", get(get_handler))
        .route("/key/:key", get(has_key_handler))
        .route(
            "/list/element/:key",
            get(get_list_element_handler)
                .put(append_to_list_handler)
                .delete(remove_from_list_handler),
        )
        .route(
            "/dict/element/:key",
            get(get_dict_element_handler).delete(remove_from_dict_handler),
        )
        // create / update
        .route(
            "/string/:key",
            post(set_string_handler).put(update_string_handler),
        )
        .route("/int/:key", post(set_int_handler).put(update_int_handler))
        .route("/list/:key", post(set_list_handler).put(update_list_handler))
        .route("/dict/:key", post(set_dict_handler).put(update_dict_handler))
        .route("/int/increment/:key", put(increment_handler))
        .route("/ttl/:key", put(set_ttl_handler))
        // delete
        .route("/remove/:key", delete(remove_handler));

    if let Some(credentials) = auth {
        api = api.layer(ValidateRequestHeaderLayer::basic(
            &credentials.username,
            &credentials.password,
        ));
    }

    Router::new()
        .nest("/v1", api)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
