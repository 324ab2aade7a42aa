//! Backend REST API client
//!
//! One network call per invocation, normalized into a decoded JSON value or
//! a [`ClientError`]. No retries.

use super::{Body, ClientError, ClientResult, Credentials, ErrorPayload, HttpError, RequestOptions};
use crate::config::ApiConfig;
use crate::logging::{self, Logger, Metadata};
use crate::session::{MemorySessionStore, SessionStore};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default request timeout; embedding jobs behind FAQ import are slow
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Correlation header threaded into errors and log records
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Where a guarded client sends the user after a 401
pub const LOGIN_PATH: &str = "/login";

/// Client-side navigation, used by the session guard
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// HTTP client for the RAG backend.
///
/// Cloning is cheap; clones share the connection pool, session store and
/// logger.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    session: Arc<dyn SessionStore>,
    guard: Option<Arc<dyn Navigator>>,
    logger: Logger,
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    session: Option<Arc<dyn SessionStore>>,
    guard: Option<Arc<dyn Navigator>>,
    logger: Option<Logger>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            session: None,
            guard: None,
            logger: None,
        }
    }
}

impl ApiClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Static key sent as a bearer token when no session token applies
    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session_store(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Intercept every 401: clear the session and navigate to
    /// [`LOGIN_PATH`] before returning the error.
    ///
    /// Only suitable for a client that owns the single active session.
    pub fn session_guard(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.guard = Some(navigator);
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> ClientResult<ApiClient> {
        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("rag-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::InvalidRequest)?;

        Ok(ApiClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key,
            session: self
                .session
                .unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
            guard: self.guard,
            logger: self.logger.unwrap_or_else(|| logging::root().child("http")),
        })
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Client configured from the `[api]` config section. The session guard
    /// is installed only when the config enables it and a navigator is given.
    pub fn from_config(
        config: &ApiConfig,
        session: Arc<dyn SessionStore>,
        navigator: Option<Arc<dyn Navigator>>,
    ) -> ClientResult<Self> {
        let mut builder = Self::builder()
            .base_url(&config.base_url)
            .api_key(config.api_key.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .session_store(session);

        if let Some(navigator) = navigator.filter(|_| config.session_guard) {
            builder = builder.session_guard(navigator);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    /// Perform one call. `Ok(None)` means the server answered 204.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<Option<T>> {
        let method = options.method.clone();
        let url = self.url(path, &options.query)?;
        let headers = self.headers(&options)?;

        let mut builder = self.http.request(method.clone(), url).headers(headers);
        builder = match options.body {
            Body::Empty => builder,
            Body::Json(value) => builder.body(serde_json::to_vec(&value).map_err(ClientError::Encode)?),
            Body::Multipart(body) => match body.into_form() {
                Ok(form) => builder.multipart(form),
                Err(err) => {
                    self.logger.error(
                        "Request could not be built",
                        Some(
                            Metadata::new()
                                .with("method", method.as_str())
                                .with("path", path)
                                .with("error", err.to_string()),
                        ),
                    );
                    return Err(err);
                }
            },
        };

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_builder() => {
                self.logger.error(
                    "Request could not be built",
                    Some(failure_metadata(method.as_str(), path, &err)),
                );
                return Err(ClientError::InvalidRequest(err));
            }
            Err(err) => {
                self.logger.error(
                    "Request failed before reaching the server",
                    Some(failure_metadata(method.as_str(), path, &err)),
                );
                return Err(ClientError::Transport(err));
            }
        };

        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if !status.is_success() {
            // An unreadable body is treated like an empty one
            let body = response.bytes().await.unwrap_or_default();
            let error = HttpError::new(status.as_u16(), ErrorPayload::parse(&body), request_id);

            self.logger.error(
                "Request rejected",
                Some(
                    call_metadata(method.as_str(), path, status, error.request_id(), started)
                        .with("message", error.message()),
                ),
            );

            if error.is_unauthorized() {
                self.expire_session();
            }
            return Err(error.into());
        }

        if status == StatusCode::NO_CONTENT {
            self.logger.debug(
                "Request completed without content",
                Some(call_metadata(method.as_str(), path, status, request_id.as_deref(), started)),
            );
            return Ok(None);
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                self.logger.error(
                    "Response body could not be read",
                    Some(
                        failure_metadata(method.as_str(), path, &err)
                            .with("status", status.as_u16()),
                    ),
                );
                return Err(ClientError::Transport(err));
            }
        };
        self.logger.debug(
            "Request completed",
            Some(call_metadata(method.as_str(), path, status, request_id.as_deref(), started)),
        );

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(ClientError::Decode)
    }

    /// Like [`request`](Self::request) but a 204 is an error
    pub async fn send<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ClientResult<T> {
        self.request(path, options)
            .await?
            .ok_or(ClientError::EmptyResponse)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(path, RequestOptions::get()).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, RequestOptions::post().json(body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, RequestOptions::put().json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(path, RequestOptions::delete()).await
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> ClientResult<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        let mut pairs = query.iter().filter(|(_, value)| !value.is_empty()).peekable();
        if pairs.peek().is_some() {
            let mut serializer = url.query_pairs_mut();
            for (key, value) in pairs {
                serializer.append_pair(key, value);
            }
        }

        Ok(url)
    }

    fn headers(&self, options: &RequestOptions) -> ClientResult<HeaderMap> {
        let multipart = matches!(options.body, Body::Multipart(_));

        let mut headers = HeaderMap::new();
        if !multipart {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        for (name, value) in &options.headers {
            let invalid = |reason: String| ClientError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(header_name, header_value);
        }

        // The multipart encoder sets its own boundary-carrying content type
        if multipart {
            headers.remove(CONTENT_TYPE);
        }

        if !headers.contains_key(AUTHORIZATION) {
            if let Some(token) = self.bearer_token(options.credentials)? {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                    ClientError::InvalidHeader {
                        name: AUTHORIZATION.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }

        Ok(headers)
    }

    /// Session token (when credentials allow it), else the API key
    fn bearer_token(&self, credentials: Credentials) -> ClientResult<Option<String>> {
        if credentials == Credentials::Include {
            if let Some(token) = self.session.token()? {
                return Ok(Some(token));
            }
        }
        Ok(self.api_key.clone())
    }

    fn expire_session(&self) {
        let Some(navigator) = &self.guard else {
            return;
        };

        if let Err(e) = self.session.clear() {
            self.logger.warn(
                "Failed to clear session after 401",
                Some(Metadata::new().with("error", e.to_string())),
            );
        }
        self.logger.warn(
            "Session expired, redirecting to login",
            Some(Metadata::new().with("location", LOGIN_PATH)),
        );
        navigator.navigate(LOGIN_PATH);
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("guarded", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

fn failure_metadata(method: &str, path: &str, err: &reqwest::Error) -> Metadata {
    Metadata::new()
        .with("method", method)
        .with("path", path)
        .with("error", err.to_string())
}

fn call_metadata(
    method: &str,
    path: &str,
    status: StatusCode,
    request_id: Option<&str>,
    started: Instant,
) -> Metadata {
    let mut metadata = Metadata::new()
        .with("method", method)
        .with("path", path)
        .with("status", status.as_u16())
        .with(
            "duration_ms",
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
    if let Some(request_id) = request_id {
        metadata.insert("request_id", request_id);
    }
    metadata
}
