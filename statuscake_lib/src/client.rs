//! Authenticated HTTP gateway for the StatusCake REST API.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use tracing::{debug, instrument, warn, Span};
use url::Url;

use crate::error::{Error, HttpError, Result};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport, DEFAULT_TIMEOUT_SECS};
use crate::uptime::Tests;
use crate::values::Values;

/// Fixed origin plus `/API` prefix; every resource path is appended to this.
pub const API_BASE: &str = "https://www.statuscake.com/API";

const USERNAME_HEADER: &str = "Username";
const API_KEY_HEADER: &str = "API";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Account identifier and API key, sent as headers on every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    api_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Client settings; the base URL is overridable so tests can point at a mock origin.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("statuscake-rs/{}", crate::VERSION),
        }
    }
}

/// What a sub-resource client may call. Implemented by the core client.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// `GET base_url + path`, no body.
    async fn get(&self, path: &str) -> Result<ApiResponse>;

    /// `PUT base_url + path` with `form` as a urlencoded body.
    async fn put(&self, path: &str, form: &Values) -> Result<ApiResponse>;

    /// `DELETE base_url + path` with `query` in the query string.
    async fn delete(&self, path: &str, query: &Values) -> Result<ApiResponse>;
}

/// StatusCake API client.
pub struct Client<T: Transport = HttpTransport> {
    core: Arc<Core<T>>,
    tests: OnceLock<Tests>,
}

impl Client<HttpTransport> {
    /// Create a client against the default endpoint with the default timeout
    /// and user agent. Does no I/O.
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = ClientConfig::default();
        let transport = HttpTransport::with_config(config.timeout, &config.user_agent)
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default HTTP client");
                HttpTransport::new()
            });
        Self::from_parts(
            transport,
            Credentials::new(username, api_key),
            config.base_url,
            config.user_agent,
        )
    }

    /// Create a client with a custom base URL, timeout and user agent.
    pub fn with_config(
        username: impl Into<String>,
        api_key: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let transport = HttpTransport::with_config(config.timeout, &config.user_agent)?;
        Ok(Self::from_parts(
            transport,
            Credentials::new(username, api_key),
            config.base_url,
            config.user_agent,
        ))
    }
}

impl<T: Transport + 'static> Client<T> {
    /// Create a client over any [`Transport`].
    pub fn with_transport(
        transport: T,
        credentials: Credentials,
        base_url: impl Into<String>,
    ) -> Self {
        Self::from_parts(
            transport,
            credentials,
            base_url.into(),
            ClientConfig::default().user_agent,
        )
    }

    fn from_parts(
        transport: T,
        credentials: Credentials,
        base_url: String,
        user_agent: String,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                transport,
                credentials,
                base_url,
                user_agent,
            }),
            tests: OnceLock::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.core.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.core.credentials
    }

    pub fn transport(&self) -> &T {
        &self.core.transport
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.core.get(path).await
    }

    pub async fn put(&self, path: &str, form: &Values) -> Result<ApiResponse> {
        self.core.put(path, form).await
    }

    pub async fn delete(&self, path: &str, query: &Values) -> Result<ApiResponse> {
        self.core.delete(path, query).await
    }

    /// The `Tests` resource. Built on first access, then the same instance every time.
    pub fn tests(&self) -> &Tests {
        self.tests.get_or_init(|| {
            let api: Arc<dyn ApiClient> = self.core.clone();
            Tests::new(api)
        })
    }
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.core.base_url)
            .field("credentials", &self.core.credentials)
            .finish_non_exhaustive()
    }
}

/// Shared state behind a [`Client`] and every sub-resource it hands out.
struct Core<T> {
    transport: T,
    credentials: Credentials,
    base_url: String,
    user_agent: String,
}

impl<T: Transport> Core<T> {
    fn build_request(
        &self,
        method: Method,
        path: &str,
        query: Option<&Values>,
        body: Option<String>,
    ) -> Result<ApiRequest> {
        let mut raw = format!("{}{}", self.base_url, path);
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            raw.push('?');
            raw.push_str(&q.encode());
        }
        let url = Url::parse(&raw)
            .map_err(|e| Error::InvalidRequest(format!("invalid URL {:?}: {}", raw, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("User-Agent", &self.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        }
        // Credentials go in last so nothing above can shadow them.
        headers.insert(
            HeaderName::from_static("username"),
            header_value(USERNAME_HEADER, &self.credentials.username)?,
        );
        headers.insert(
            HeaderName::from_static("api"),
            header_value(API_KEY_HEADER, &self.credentials.api_key)?,
        );

        Ok(ApiRequest {
            method,
            url,
            headers,
            body,
        })
    }

    #[instrument(
        name = "statuscake_request",
        skip(self, request),
        fields(
            http.method = %request.method,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
        )
    )]
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        Span::current().record("http.url", request.url.as_str());

        let res = self.transport.execute(request).await.map_err(|e| {
            warn!(error = %e, "transport failure");
            e
        })?;

        let status_code = res.status().as_u16();
        Span::current().record("http.status_code", status_code);

        if !res.is_success() {
            warn!(status = %res.status_line(), "request rejected");
            let body = Some(res.text()).filter(|b| !b.is_empty());
            return Err(Error::Http(HttpError {
                status: res.status_line(),
                status_code,
                body,
            }));
        }

        debug!(bytes = res.bytes().len(), "request succeeded");
        Ok(res)
    }
}

#[async_trait]
impl<T: Transport> ApiClient for Core<T> {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let request = self.build_request(Method::GET, path, None, None)?;
        self.send(request).await
    }

    async fn put(&self, path: &str, form: &Values) -> Result<ApiResponse> {
        let request = self.build_request(Method::PUT, path, None, Some(form.encode()))?;
        self.send(request).await
    }

    async fn delete(&self, path: &str, query: &Values) -> Result<ApiResponse> {
        let request = self.build_request(Method::DELETE, path, Some(query), None)?;
        self.send(request).await
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidRequest(format!("invalid value for {} header", name)))
}
