//! HTTP gateway to the catalog API.
//!
//! One shared [`reqwest::Client`] issues every request with a merged
//! timeout-or-cancellation signal, decodes bodies fail-soft, and raises a
//! uniform error on non-success statuses. The gateway performs no retries;
//! retry policy belongs to callers, guided by the classifier's
//! `is_retryable` flag.

use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::Config;
use crate::models::{SearchFilters, SearchParams, ValidationError};
use crate::normalize::{normalize, NormalizedResponse};
use crate::query::filters;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);

/// Errors raised by the HTTP gateway.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Connection-level failure before an HTTP status was available.
    #[error("Network error: {0}")]
    Network(String),

    /// The merged timeout fired before the request settled.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's cancellation token fired. Never surfaced to users: a
    /// superseded request resolves silently.
    #[error("Request aborted")]
    Aborted,

    /// Non-success HTTP status, with any recovered body text.
    #[error("HTTP {status}: {status_text}. {details}")]
    Http {
        status: u16,
        status_text: String,
        details: String,
    },

    /// Encoding or decoding failure outside a response body (body decode
    /// failures degrade to an empty payload instead).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Parameter validation failed before any network attempt.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The configured base URL or endpoint could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl ClientError {
    /// HTTP status code, when this error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a silent cancellation rather than a reportable error.
    pub fn is_aborted(&self) -> bool {
        matches!(self, ClientError::Aborted)
    }
}

/// Options for a single gateway request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters; entries whose trimmed value is empty are skipped.
    pub params: Vec<(String, String)>,

    /// HTTP method; GET when left at the default.
    pub method: Method,

    /// JSON body. Sets a JSON content type unless one is already provided.
    pub body: Option<Value>,

    /// Caller-side cancellation, merged with the timeout.
    pub cancel: Option<CancellationToken>,

    /// Extra headers.
    pub headers: Vec<(String, String)>,

    /// Per-request timeout override.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP gateway for the catalog API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client for the given API origin with the default timeout.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ClientError::Url(format!("{base_url}: {err}")))?;
        let http = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    /// Create a client from resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::with_timeout(
            &config.api.base_url,
            Duration::from_millis(config.api.timeout_ms),
        )
    }

    /// Execute a prepared request under a merged cancellation signal.
    ///
    /// An internal token is cancelled by whichever of {caller token, timeout
    /// timer} fires first; an already-cancelled caller token aborts before
    /// the request is issued. Timer and forwarder are cleared unconditionally
    /// once the request settles. Exactly one network attempt per call.
    async fn fetch_with_timeout(
        &self,
        request: reqwest::Request,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response, ClientError> {
        let internal = CancellationToken::new();

        let forwarder = match cancel {
            Some(external) if external.is_cancelled() => {
                internal.cancel();
                None
            }
            Some(external) => {
                let external = external.clone();
                let internal = internal.clone();
                Some(tokio::spawn(async move {
                    external.cancelled().await;
                    internal.cancel();
                }))
            }
            None => None,
        };

        let timer = {
            let internal = internal.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                internal.cancel();
            })
        };

        let result = tokio::select! {
            _ = internal.cancelled() => {
                if cancel.is_some_and(|token| token.is_cancelled()) {
                    Err(ClientError::Aborted)
                } else {
                    Err(ClientError::Timeout(timeout))
                }
            }
            outcome = self.http.execute(request) => outcome.map_err(|err| {
                if err.is_timeout() {
                    ClientError::Timeout(timeout)
                } else {
                    ClientError::Network(err.to_string())
                }
            }),
        };

        timer.abort();
        if let Some(task) = forwarder {
            task.abort();
        }
        result
    }

    /// Generic API request returning the decoded payload as-is.
    ///
    /// Appends only parameters whose trimmed value is non-empty; serializes a
    /// JSON body when present.
    pub async fn request_raw(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<Value>, ClientError> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|err| ClientError::Url(format!("{endpoint}: {err}")))?;

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &options.params {
                if !value.trim().is_empty() {
                    query.append_pair(key, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        tracing::debug!(method = %options.method, url = %url, "API request");
        if !options.params.is_empty() {
            tracing::trace!(params = ?options.params, "query parameters");
        }

        let mut builder = self.http.request(options.method.clone(), url);
        for (key, value) in &options.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = &options.body {
            let has_content_type = options
                .headers
                .iter()
                .any(|(key, _)| key.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                builder = builder.header(reqwest::header::CONTENT_TYPE, "application/json");
            }
            let encoded = serde_json::to_vec(body)
                .map_err(|err| ClientError::Parse(format!("request body: {err}")))?;
            builder = builder.body(encoded);
        }

        let request = builder
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;

        let timeout = options.timeout.unwrap_or(self.timeout);
        let response = self
            .fetch_with_timeout(request, timeout, options.cancel.as_ref())
            .await?;

        handle_response(response).await
    }

    /// Generic API request returning the normalized payload.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<NormalizedResponse, ClientError> {
        let payload = self.request_raw(endpoint, options).await?;
        Ok(normalize(payload))
    }

    /// Fetch a paginated artifact list.
    pub async fn list_artifacts(
        &self,
        page: u32,
        per_page: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<NormalizedResponse, ClientError> {
        let options = RequestOptions::new()
            .param("page", page.to_string())
            .param("per_page", per_page.to_string());
        self.request("/api/artifacts", with_cancel(options, cancel))
            .await
    }

    /// Fetch a single artifact by id.
    pub async fn get_artifact_by_id(
        &self,
        artifact_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<NormalizedResponse, ClientError> {
        let endpoint = format!(
            "/api/artifacts/{}",
            urlencoding::encode(artifact_id.trim())
        );
        self.request(&endpoint, with_cancel(RequestOptions::new(), cancel))
            .await
    }

    /// Search artifacts with a validated parameter set.
    pub async fn search_artifacts(
        &self,
        params: &SearchParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<NormalizedResponse, ClientError> {
        let options = RequestOptions::new().params(params.pairs());
        self.request("/api/artifacts/search", with_cancel(options, cancel))
            .await
    }

    /// Search artifacts by name.
    pub async fn search_by_name(
        &self,
        name: &str,
        page: u32,
        per_page: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<NormalizedResponse, ClientError> {
        self.search_filters(filters::name(name), page, per_page, cancel)
            .await
    }

    /// Quick text search.
    pub async fn quick_search(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<NormalizedResponse, ClientError> {
        self.search_filters(filters::q(query), page, per_page, cancel)
            .await
    }

    async fn search_filters(
        &self,
        filters: SearchFilters,
        page: u32,
        per_page: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<NormalizedResponse, ClientError> {
        let params = SearchParams {
            page,
            per_page,
            filters,
        };
        self.search_artifacts(&params, cancel).await
    }
}

fn with_cancel(options: RequestOptions, cancel: Option<&CancellationToken>) -> RequestOptions {
    match cancel {
        Some(token) => options.cancel(token.clone()),
        None => options,
    }
}

/// Convert a response into a decoded payload.
///
/// Fail loud on HTTP-level errors (status, status text and any recoverable
/// body text); fail soft on body problems: 204, empty and undecodable bodies
/// all degrade to `None`.
async fn handle_response(response: Response) -> Result<Option<Value>, ClientError> {
    let status = response.status();
    tracing::debug!(status = status.as_u16(), "API response");

    if !status.is_success() {
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        // Best effort: a failing body read must not mask the HTTP error.
        let body = response.text().await.unwrap_or_default();
        let details = if body.is_empty() {
            "No details".to_string()
        } else {
            body
        };
        tracing::error!(
            status = status.as_u16(),
            %status_text,
            %details,
            "API error"
        );
        return Err(ClientError::Http {
            status: status.as_u16(),
            status_text,
            details,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(&body) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::warn!(%err, "response body is not valid JSON; returning no payload");
            Ok(None)
        }
    }
}
