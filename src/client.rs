//! Remote client for the cache server's HTTP API
//!
//! Mirrors the engine's operations one method per route and decodes the
//! shared JSON envelope back into typed results.
//!
//! ```rust,no_run
//! use kvcache::CacheClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), kvcache::ClientError> {
//!     let client = CacheClient::new("http://localhost:1323");
//!
//!     client.set_int("visits", 0).await?;
//!     let visits = client.increment("visits").await?;
//!     assert_eq!(visits, 1);
//!
//!     client.set_ttl("visits", 60_000).await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;

use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::cache::{Dict, List, StatsSnapshot, Value};
use crate::config::BasicCredentials;
use crate::error::{CODE_BAD_REQUEST, CODE_KEY_NOT_FOUND};
use crate::models::{
    ErrorResponse, ExistsBody, IndexBody, KeysBody, LenBody, OldValueBody, StatsBody, TtlRequest,
    ValueBody, ValueRequest, CODE_OK,
};

/// Version segment in front of every cache route.
const API_VERSION: &str = "v1";

// == Client Error ==
/// Errors returned by [`CacheClient`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-zero `error_code`
    #[error("Cache error {code}: {message}")]
    Cache { code: u16, message: String },

    /// HTTP transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected envelope
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The base URL cannot carry route segments
    #[error("Invalid base URL '{0}'")]
    InvalidUrl(String),
}

impl ClientError {
    /// Returns the server-side error code, if the server reported one.
    pub fn code(&self) -> Option<u16> {
        match self {
            ClientError::Cache { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` for missing keys and missing dictionary entries.
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(CODE_KEY_NOT_FOUND)
    }
}

// == Cache Client ==
/// HTTP client for a running cache server.
#[derive(Debug, Clone)]
pub struct CacheClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<BasicCredentials>,
}

impl CacheClient {
    /// Creates a client for the server at `base_url`, e.g. `http://localhost:1323`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    /// Sends HTTP Basic credentials with every request.
    pub fn with_credentials(mut self, credentials: BasicCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Builds the URL of a route. Each segment is percent-encoded, so keys
    /// containing `/`, `?`, `#` or spaces stay a single path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let invalid = || ClientError::InvalidUrl(self.base_url.clone());

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.url(segments)?;
        debug!(%method, %url, "Cache request");

        let builder = self.http.request(method, url);
        Ok(match &self.credentials {
            Some(c) => builder.basic_auth(&c.username, Some(&c.password)),
            None => builder,
        })
    }

    /// Sends `builder` and decodes the envelope into `T`.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            // Non-envelope failures, e.g. a 401 from the auth layer
            Err(_) if !status.is_success() => {
                return Err(ClientError::Cache {
                    code: status.as_u16(),
                    message: String::from_utf8_lossy(&bytes).into_owned(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let code = body
            .get("error_code")
            .and_then(|c| c.as_u64())
            .unwrap_or(u64::from(CODE_BAD_REQUEST));
        if code != u64::from(CODE_OK) {
            let error: ErrorResponse = serde_json::from_value(body)?;
            return Err(ClientError::Cache {
                code: error.error_code,
                message: error.error_message.unwrap_or_default(),
            });
        }

        Ok(serde_json::from_value(body)?)
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, segments)?.json(body)).await
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        self.send::<serde_json::Value>(builder).await.map(|_| ())
    }

    // == Core ==

    pub async fn len(&self) -> Result<usize, ClientError> {
        let body: LenBody = self.send(self.request(Method::GET, &["len"])?).await?;
        Ok(body.length)
    }

    pub async fn keys(&self) -> Result<HashSet<String>, ClientError> {
        let body: KeysBody = self.send(self.request(Method::GET, &["keys"])?).await?;
        Ok(body.keys)
    }

    pub async fn stats(&self) -> Result<StatsSnapshot, ClientError> {
        let body: StatsBody = self.send(self.request(Method::GET, &["stats"])?).await?;
        Ok(body.stats)
    }

    // == Accessors ==

    /// Fetches the value under `key` together with its shape.
    pub async fn get(&self, key: &str) -> Result<Value, ClientError> {
        self.send(self.request(Method::GET, &["get", key])?).await
    }

    pub async fn get_list_element(&self, key: &str, index: i64) -> Result<String, ClientError> {
        let builder = self
            .request(Method::GET, &["list", "element", key])?
            .query(&[("index", index)]);
        let body: ValueBody<String> = self.send(builder).await?;
        Ok(body.value)
    }

    pub async fn get_dict_element(&self, key: &str, dict_key: &str) -> Result<String, ClientError> {
        let builder = self
            .request(Method::GET, &["dict", "element", key])?
            .query(&[("dict_key", dict_key)]);
        let body: ValueBody<String> = self.send(builder).await?;
        Ok(body.value)
    }

    /// `Ok(true)` when present; a missing key is a not-found error.
    pub async fn has_key(&self, key: &str) -> Result<bool, ClientError> {
        let body: ExistsBody = self
            .send(self.request(Method::GET, &["key", key])?)
            .await?;
        Ok(body.exists)
    }

    // == Mutators: create ==

    pub async fn set_string(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.send_empty(
            self.request(Method::POST, &["string", key])?
                .json(&ValueRequest::new(value)),
        )
        .await
    }

    pub async fn set_int(&self, key: &str, value: i64) -> Result<(), ClientError> {
        self.send_empty(
            self.request(Method::POST, &["int", key])?
                .json(&ValueRequest::new(value)),
        )
        .await
    }

    pub async fn set_list(&self, key: &str, value: &List) -> Result<(), ClientError> {
        self.send_empty(
            self.request(Method::POST, &["list", key])?
                .json(&ValueRequest::new(value)),
        )
        .await
    }

    pub async fn set_dict(&self, key: &str, value: &Dict) -> Result<(), ClientError> {
        self.send_empty(
            self.request(Method::POST, &["dict", key])?
                .json(&ValueRequest::new(value)),
        )
        .await
    }

    // == Mutators: update ==

    pub async fn update_string(&self, key: &str, value: &str) -> Result<String, ClientError> {
        let body: OldValueBody<String> = self
            .send_json(Method::PUT, &["string", key], &ValueRequest::new(value))
            .await?;
        Ok(body.old_value)
    }

    pub async fn update_int(&self, key: &str, value: i64) -> Result<i64, ClientError> {
        let body: OldValueBody<i64> = self
            .send_json(Method::PUT, &["int", key], &ValueRequest::new(value))
            .await?;
        Ok(body.old_value)
    }

    pub async fn update_list(&self, key: &str, value: &List) -> Result<List, ClientError> {
        let body: OldValueBody<List> = self
            .send_json(Method::PUT, &["list", key], &ValueRequest::new(value))
            .await?;
        Ok(body.old_value)
    }

    pub async fn update_dict(&self, key: &str, value: &Dict) -> Result<Dict, ClientError> {
        let body: OldValueBody<Dict> = self
            .send_json(Method::PUT, &["dict", key], &ValueRequest::new(value))
            .await?;
        Ok(body.old_value)
    }

    pub async fn append_to_list(&self, key: &str, element: &str) -> Result<(), ClientError> {
        self.send_empty(
            self.request(Method::PUT, &["list", "element", key])?
                .json(&ValueRequest::new(element)),
        )
        .await
    }

    /// Atomically adds 1 and returns the new value.
    pub async fn increment(&self, key: &str) -> Result<i64, ClientError> {
        let body: ValueBody<i64> = self
            .send(self.request(Method::PUT, &["int", "increment", key])?)
            .await?;
        Ok(body.value)
    }

    /// Schedules removal of `key` after `ttl_ms` milliseconds.
    pub async fn set_ttl(&self, key: &str, ttl_ms: i64) -> Result<(), ClientError> {
        self.send_empty(
            self.request(Method::PUT, &["ttl", key])?
                .json(&TtlRequest { ttl: ttl_ms }),
        )
        .await
    }

    // == Mutators: delete ==

    pub async fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &["remove", key])?).await
    }

    /// Removes the first occurrence of `element`; `None` when absent.
    pub async fn remove_from_list(
        &self,
        key: &str,
        element: &str,
    ) -> Result<Option<usize>, ClientError> {
        let builder = self
            .request(Method::DELETE, &["list", "element", key])?
            .query(&[("value", element)]);
        let body: IndexBody = self.send(builder).await?;
        Ok(usize::try_from(body.index).ok())
    }

    pub async fn remove_from_dict(&self, key: &str, dict_key: &str) -> Result<(), ClientError> {
        self.send_empty(
            self.request(Method::DELETE, &["dict", "element", key])?
                .query(&[("dict_key", dict_key)]),
        )
        .await
    }
}
