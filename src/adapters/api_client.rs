use crate::config::ApiConfig;
use crate::domain::auth::{RefreshRequest, RefreshResponse};
use crate::error::{ApiError, Result};
use crate::storage::CredentialStore;
use crate::ui::navigation::{Navigator, Route};
use bytes::Bytes;
use futures::StreamExt;
use opentelemetry::{KeyValue, global, metrics::Counter};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

pub const REFRESH_PATH: &str = "/accounts/token/refresh/";

#[derive(Clone, Debug)]
struct Metrics {
    requests_total: Counter<u64>,
    refresh_total: Counter<u64>,
    session_expired_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("invento-client");
        Self {
            requests_total: meter
                .u64_counter("api_requests_total")
                .with_description("Total number of API requests dispatched, retries included")
                .build(),
            refresh_total: meter
                .u64_counter("auth_refresh_total")
                .with_description("Total number of access token refresh attempts")
                .build(),
            session_expired_total: meter
                .u64_counter("auth_session_expired_total")
                .with_description("Total number of sessions ended by an unrecoverable 401")
                .build(),
        }
    }
}

/// One logical API operation. Transient; rebuilt into an HTTP request on every dispatch.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    pub attach_auth: bool,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, query: Vec::new(), attach_auth: true }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query<K: Into<String>>(mut self, pairs: impl IntoIterator<Item = (K, String)>) -> Self {
        self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Sends the request without an `Authorization` header and outside the refresh protocol.
    #[must_use]
    pub const fn unauthenticated(mut self) -> Self {
        self.attach_auth = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    /// A successful response that is not JSON, e.g. a file body or an empty 204.
    Raw { status: StatusCode, content_type: Option<String>, bytes: Bytes },
}

impl ApiResponse {
    /// The decoded JSON value; non-JSON responses yield `Value::Null`.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Raw { .. } => Value::Null,
        }
    }
}

enum Refresh {
    Renewed(String),
    Rejected,
    /// The credentials were cleared or replaced while the exchange was in flight.
    Superseded,
}

/// Sibling file a download streams into before it is renamed over `dest`.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Authenticated client for the Invento REST API.
///
/// A 401 on an authenticated request triggers one access-token refresh followed by exactly
/// one retry. When no refresh is possible the session is torn down: credentials are cleared,
/// the navigator is sent to the login entry point and `ApiError::SessionExpired` is returned.
///
/// Refreshes are single-flight. A request that waited on the refresh lock and finds a
/// different access token stored than the one it sent retries with that token instead of
/// refreshing again.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    refresh_lock: tokio::sync::Mutex<()>,
    metrics: Metrics,
}

impl ApiClient {
    /// Builds a client for `config.api_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig, credentials: Arc<CredentialStore>, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            http,
            credentials,
            navigator,
            refresh_lock: tokio::sync::Mutex::new(()),
            metrics: Metrics::new(),
        })
    }

    #[must_use]
    pub const fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Performs one logical operation and decodes its response.
    ///
    /// # Errors
    /// `Transport` for network failures, `Status` for non-2xx responses, `Decode` for
    /// malformed JSON and `SessionExpired` when the credentials could not be renewed.
    #[tracing::instrument(
        skip(self, request),
        fields(method = %request.method, path = %request.path, status = tracing::field::Empty),
        err(level = "debug")
    )]
    pub async fn execute(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let response = self.dispatch(&request).await?;
        tracing::Span::current().record("status", response.status().as_u16());
        Self::decode(response).await
    }

    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn get(&self, path: &str) -> Result<Value> {
        Ok(self.execute(RequestDescriptor::new(Method::GET, path)).await?.into_json())
    }

    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        self.with_body(Method::POST, path, body).await
    }

    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        self.with_body(Method::PUT, path, body).await
    }

    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn patch<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        self.with_body(Method::PATCH, path, body).await
    }

    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn delete(&self, path: &str) -> Result<Value> {
        Ok(self.execute(RequestDescriptor::new(Method::DELETE, path)).await?.into_json())
    }

    async fn with_body<B: Serialize + Sync>(&self, method: Method, path: &str, body: &B) -> Result<Value> {
        let request = RequestDescriptor::new(method, path).with_body(serde_json::to_value(body)?);
        Ok(self.execute(request).await?.into_json())
    }

    /// Executes `request` and deserializes the JSON response into `T`.
    ///
    /// # Errors
    /// See [`ApiClient::execute`]; a body that does not match `T` is a `Decode` error.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        let value = self.execute(request).await?.into_json();
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    /// See [`ApiClient::send_json`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(RequestDescriptor::new(Method::GET, path)).await
    }

    /// Streams a file from `path` to `dest`, with the same refresh-and-retry policy as
    /// [`ApiClient::execute`]. Returns the number of bytes written.
    ///
    /// # Errors
    /// A non-2xx final response is a `Status` error; file system failures are `Io` errors.
    #[tracing::instrument(skip(self, query, dest), fields(dest = %dest.display()), err(level = "debug"))]
    pub async fn download(&self, path: &str, query: Vec<(String, String)>, dest: &Path) -> Result<u64> {
        let request = RequestDescriptor::new(Method::GET, path).with_query(query);
        let response = self.dispatch(&request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: format!("Download failed: {}", status.as_u16()),
                body: None,
            });
        }

        let partial = partial_path(dest);
        let result = match Self::write_body(response, &partial).await {
            Ok(written) => tokio::fs::rename(&partial, dest).await.map(|()| written).map_err(ApiError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(written) => {
                tracing::info!(bytes = written, "Download complete");
                Ok(written)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&partial).await {
                    tracing::debug!(error = %rm, path = %partial.display(), "No partial download to remove");
                }
                Err(e)
            }
        }
    }

    async fn write_body(response: reqwest::Response, path: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Sends the request, recovering from at most one 401.
    async fn dispatch(&self, request: &RequestDescriptor) -> Result<reqwest::Response> {
        let mut token = if request.attach_auth { self.credentials.access_token() } else { None };
        let mut retried = false;

        loop {
            let response = self.send(request, token.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED || !request.attach_auth || retried {
                return Ok(response);
            }

            tracing::debug!("Access token rejected");
            token = Some(self.renew_access_token(token.as_deref()).await?);
            retried = true;
        }
    }

    async fn send(&self, request: &RequestDescriptor, token: Option<&str>) -> Result<reqwest::Response> {
        let url = self.url(&request.path, &request.query)?;
        let mut builder = self.http.request(request.method.clone(), url).header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        self.metrics.requests_total.add(1, &[KeyValue::new("method", request.method.to_string())]);
        let response = builder.send().await.inspect_err(|e| {
            tracing::warn!(error = %e, path = %request.path, "API request failed");
        })?;
        Ok(response)
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Obtains a usable access token after `rejected` was refused, or ends the session.
    async fn renew_access_token(&self, rejected: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.credentials.access_token() {
            if rejected != Some(current.as_str()) {
                tracing::debug!("Access token already renewed by a concurrent request");
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.credentials.refresh_token() else {
            return Err(self.expire_session("no refresh token"));
        };

        match self.refresh(&refresh_token).await {
            Refresh::Renewed(access) => Ok(access),
            Refresh::Rejected => Err(self.expire_session("refresh rejected")),
            Refresh::Superseded => {
                tracing::debug!("Credentials changed while refreshing, discarding new token");
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Exchanges the refresh token for a new access token. Never sends an `Authorization` header.
    #[tracing::instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Refresh {
        self.metrics.refresh_total.add(1, &[]);
        let Ok(url) = self.url(REFRESH_PATH, &[]) else {
            return Refresh::Rejected;
        };
        let result = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(&RefreshRequest { refresh: refresh_token })
            .send()
            .await;

        let response = match result {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(status = r.status().as_u16(), "Token refresh rejected");
                return Refresh::Rejected;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh error");
                return Refresh::Rejected;
            }
        };

        let body = match response.json::<RefreshResponse>().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh returned an unreadable body");
                return Refresh::Rejected;
            }
        };

        match self.credentials.replace_access(&body.access, refresh_token) {
            Ok(true) => {
                tracing::info!("Access token refreshed");
                Refresh::Renewed(body.access)
            }
            Ok(false) => Refresh::Superseded,
            Err(e) => {
                tracing::error!(error = %e, "Failed to store refreshed access token");
                Refresh::Rejected
            }
        }
    }

    fn expire_session(&self, reason: &'static str) -> ApiError {
        tracing::warn!(reason, "Session expired");
        self.metrics.session_expired_total.add(1, &[]);
        if let Err(e) = self.credentials.clear() {
            tracing::error!(error = %e, "Failed to clear credentials");
        }
        self.navigator.redirect(Route::Login);
        ApiError::SessionExpired
    }

    async fn decode(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let content_type =
            response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_owned);
        let is_json = content_type.as_deref().is_some_and(|c| c.contains("application/json"));
        let bytes = response.bytes().await?;

        if is_json {
            if status.is_success() {
                return Ok(ApiResponse::Json(serde_json::from_slice(&bytes)?));
            }
            let body = serde_json::from_slice::<Value>(&bytes).ok();
            return Err(ApiError::from_status(status, body));
        }

        if !status.is_success() {
            return Err(ApiError::from_status(status, None));
        }
        Ok(ApiResponse::Raw { status, content_type, bytes })
    }
}
