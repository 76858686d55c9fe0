//! # Asynchronous HTTP Client
//!
//! A compact async facade over the nskv-server HTTP API (spec §6).
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `KVClient` hides request building and response
//!    decoding details behind a small method per operation.
//! 2. **Fail Fast**: Non-2xx responses surface immediately as `ClientError`.
//! 3. **Reuse the connection pool**: one `reqwest::Client` per `KVClient`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type for the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the client.
#[derive(Debug)]
pub enum ClientError {
    /// Transport-level failure (connection refused, timeout, ...).
    Transport(reqwest::Error),
    /// The requested key is absent or expired (HTTP 404).
    NotFound,
    /// The server rejected the request as invalid (HTTP 400).
    Validation(String),
    /// The server reported an internal failure (HTTP 5xx).
    Server(String),
    /// A response body did not match the expected shape.
    UnexpectedResponse(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "transport error: {err}"),
            ClientError::NotFound => write!(f, "not found"),
            ClientError::Validation(msg) => write!(f, "validation error: {msg}"),
            ClientError::Server(msg) => write!(f, "server error: {msg}"),
            ClientError::UnexpectedResponse(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[allow(dead_code)]
    kind: String,
}

#[derive(Debug, Serialize)]
struct SetRequest<'a> {
    key: &'a str,
    value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    value: String,
}

#[derive(Debug, Deserialize)]
pub struct NamespaceSizeResponse {
    pub total_keys: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListNamespacesResponse {
    pub namespaces: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClearNamespaceResponse {
    pub keys_deleted: usize,
}

#[derive(Debug, Deserialize)]
pub struct NamespaceStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_keys: usize,
}

#[derive(Debug, Deserialize)]
pub struct StatsResponse {
    pub total_keys: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub log_size: u64,
    pub last_compaction: Option<f64>,
    pub uptime_seconds: f64,
    pub namespaces: HashMap<String, NamespaceStats>,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct PerformanceResponse {
    pub operations_per_second: f64,
    pub avg_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub error_rate: f64,
    pub total_operations: u64,
}

/// Async HTTP client for a namespaced key-value store (spec §6).
///
/// Each call opens a request on a shared, pooled `reqwest::Client`. The
/// default namespace is the empty string, matching the store core.
pub struct KVClient {
    http: reqwest::Client,
    base_url: String,
}

impl KVClient {
    /// Creates a client pointed at `base_url`, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        KVClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn error_from_response(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        if status == reqwest::StatusCode::NOT_FOUND {
            ClientError::NotFound
        } else if status == reqwest::StatusCode::BAD_REQUEST {
            ClientError::Validation(message)
        } else {
            ClientError::Server(message)
        }
    }

    /// `SET`: stores `value` under `(namespace, key)`, with an optional
    /// positive-integer TTL in seconds.
    pub async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
        ttl: Option<i64>,
    ) -> ClientResult<()> {
        let ns = urlencoding::encode(namespace);
        let response = self
            .http
            .post(self.url(&format!("/set?ns={ns}")))
            .json(&SetRequest { key, value, ttl })
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `GET`: returns the live value for `(namespace, key)`, or
    /// `ClientError::NotFound` if absent or expired.
    pub async fn get(&self, namespace: &str, key: &str) -> ClientResult<String> {
        let key = urlencoding::encode(key);
        let ns = urlencoding::encode(namespace);
        let response = self
            .http
            .get(self.url(&format!("/get/{key}?ns={ns}")))
            .send()
            .await?;
        if response.status().is_success() {
            let body: GetResponse = response.json().await?;
            Ok(body.value)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `DELETE`: removes `(namespace, key)`. Returns
    /// `ClientError::NotFound` if the key was already absent.
    pub async fn delete(&self, namespace: &str, key: &str) -> ClientResult<()> {
        let key = urlencoding::encode(key);
        let ns = urlencoding::encode(namespace);
        let response = self
            .http
            .delete(self.url(&format!("/delete/{key}?ns={ns}")))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `LIST-NAMESPACES`.
    pub async fn list_namespaces(&self) -> ClientResult<Vec<String>> {
        let response = self.http.get(self.url("/namespaces")).send().await?;
        if response.status().is_success() {
            let body: ListNamespacesResponse = response.json().await?;
            Ok(body.namespaces)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `NAMESPACE-SIZE`.
    pub async fn namespace_size(&self, namespace: &str) -> ClientResult<usize> {
        let namespace = urlencoding::encode(namespace);
        let response = self
            .http
            .get(self.url(&format!("/namespaces/{namespace}/keys")))
            .send()
            .await?;
        if response.status().is_success() {
            let body: NamespaceSizeResponse = response.json().await?;
            Ok(body.total_keys)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `CLEAR-NAMESPACE`. Returns the number of keys removed.
    pub async fn clear_namespace(&self, namespace: &str) -> ClientResult<usize> {
        let namespace = urlencoding::encode(namespace);
        let response = self
            .http
            .delete(self.url(&format!("/namespaces/{namespace}")))
            .send()
            .await?;
        if response.status().is_success() {
            let body: ClearNamespaceResponse = response.json().await?;
            Ok(body.keys_deleted)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `STATS`.
    pub async fn stats(&self) -> ClientResult<StatsResponse> {
        let response = self.http.get(self.url("/stats")).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `HEALTH`.
    pub async fn health(&self) -> ClientResult<HealthResponse> {
        let response = self.http.get(self.url("/health")).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `COMPACT`: triggers an immediate WAL compaction.
    pub async fn compact(&self) -> ClientResult<()> {
        let response = self.http.post(self.url("/compact")).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// `PERFORMANCE`.
    pub async fn performance(&self) -> ClientResult<PerformanceResponse> {
        let response = self.http.get(self.url("/performance")).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }
}
