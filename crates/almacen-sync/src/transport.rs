//! # HTTP Transport
//!
//! The request capability the synchronizers talk to, plus the `reqwest`
//! implementation.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Request ──► send() ──┬── abort signal fired ──► Err(Cancelled)       │
//! │                        │                                                │
//! │                        └── attempt ──► Response { status, body }        │
//! │                              │                                          │
//! │                 GET + retryable failure (network, timeout, 5xx)?        │
//! │                              │ yes                                      │
//! │                              ▼                                          │
//! │                      exponential backoff, bounded by                    │
//! │                      api.retry_max_elapsed_secs                         │
//! │                                                                         │
//! │   check_status(Response):                                               │
//! │     2xx ──► Ok(body)                                                    │
//! │     404 ──► Err(NotFound)                                               │
//! │     else ── body has a message? ── yes ──► Err(Rejected)                │
//! │                                  └ no ──► Err(Transport)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation uses an explicit abort token per request; the per-request
//! timeout comes from configuration.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{SyncError, SyncResult};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

// =============================================================================
// Request / Response
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }
}

/// Raw backend answer. The body is `Null` when empty and a JSON string when
/// the backend did not send JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Maps a response onto the error taxonomy.
pub fn check_status(response: Response, path: &str) -> SyncResult<Value> {
    if response.is_success() {
        return Ok(response.body);
    }

    if response.status == 404 {
        return Err(SyncError::NotFound { path: path.to_string() });
    }

    match server_message(&response.body) {
        Some(message) => Err(SyncError::Rejected {
            status: response.status,
            message,
        }),
        None => Err(SyncError::Transport(format!("HTTP {}", response.status))),
    }
}

/// The message of a structured error body, if any.
fn server_message(body: &Value) -> Option<String> {
    ["message", "mensaje", "error", "detail"]
        .iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Abort Signal
// =============================================================================

/// Creates a linked abort handle and signal.
pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx })
}

/// Fires the abort for one request.
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by the transport while a request is in flight.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = abort_pair();
        signal
    }

    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the abort fires. Pending forever if the handle was
    /// dropped without firing.
    pub async fn aborted(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Sends one request to the backend.
///
/// Implementations return `Err(Cancelled)` when `abort` fires first and map
/// network failures to `Transport`/`Timeout`. Status codes are left to
/// [`check_status`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: Request, abort: AbortSignal) -> SyncResult<Response>;
}

// =============================================================================
// Reqwest Transport
// =============================================================================

/// `reqwest`-backed transport.
///
/// ## Usage
/// ```rust,ignore
/// let transport = ReqwestTransport::new(&config.api)?;
/// let response = transport.send(Request::get("products"), AbortSignal::never()).await?;
/// let body = check_status(response, "products")?;
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    retry_max_elapsed: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> SyncResult<Self> {
        let base_url = config.endpoint()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
            retry_max_elapsed: config.retry_max_elapsed(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send_once(&self, request: &Request) -> SyncResult<Response> {
        let url = self.base_url.join(&request.path)?;
        let request_id = Uuid::new_v4().to_string();

        debug!(method = %request.method, %url, request_id = %request_id, "Sending request");

        let mut builder = self
            .client
            .request(request.method.as_reqwest(), url)
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.map_error(e))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if !(200..300).contains(&status) {
            warn!(method = %request.method, path = %request.path, status, request_id = %request_id, "Request failed");
        }

        Ok(Response::new(status, body))
    }

    /// GETs are retried on network failures and 5xx answers.
    async fn send_with_retry(&self, request: &Request, max_elapsed: Duration) -> SyncResult<Response> {
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(250),
            max_elapsed_time: Some(max_elapsed),
            ..Default::default()
        };

        let this = self;
        backoff::future::retry(policy, move || async move {
            match this.send_once(request).await {
                Ok(response) if response.status >= 500 => {
                    let status = response.status;
                    let error = check_status(response, &request.path)
                        .err()
                        .unwrap_or_else(|| SyncError::Transport(format!("HTTP {}", status)));
                    debug!(path = %request.path, status, "Retrying request");
                    Err(backoff::Error::transient(error))
                }
                Ok(response) => Ok(response),
                Err(e) if e.is_retryable() => {
                    debug!(path = %request.path, error = %e, "Retrying request");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    fn map_error(&self, error: reqwest::Error) -> SyncError {
        if error.is_timeout() {
            SyncError::Timeout(self.timeout.as_secs())
        } else if error.is_decode() {
            SyncError::Decode(error.to_string())
        } else {
            SyncError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: Request, mut abort: AbortSignal) -> SyncResult<Response> {
        if abort.is_aborted() {
            return Err(SyncError::Cancelled);
        }

        let attempt = async {
            match (request.method, self.retry_max_elapsed) {
                (Method::Get, Some(max_elapsed)) => self.send_with_retry(&request, max_elapsed).await,
                _ => self.send_once(&request).await,
            }
        };

        tokio::select! {
            result = attempt => result,
            _ = abort.aborted() => {
                debug!(method = %request.method, path = %request.path, "Request aborted");
                Err(SyncError::Cancelled)
            }
        }
    }
}
