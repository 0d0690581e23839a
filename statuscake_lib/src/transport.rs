//! Transport seam: anything that can execute an [`ApiRequest`] and hand back an [`ApiResponse`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, TransportError};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A fully built request, ready to be sent.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// A response as returned by the transport, before any decoding.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status line as `<code> <reason>`, e.g. `200 OK`.
    pub fn status_line(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {}", self.status.as_u16(), reason),
            None => self.status.as_u16().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status.as_u16())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Executes requests. Implemented by [`HttpTransport`] and by test doubles.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport. Connection pooling is reqwest's.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// reqwest's default client, with no request timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transport with a request timeout and user agent.
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            timeout: Some(timeout),
        })
    }

    /// Per-request timeout, if one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let res = builder.send().await?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await?;
        Ok(ApiResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(method: Method, url: &str) -> ApiRequest {
        ApiRequest {
            method,
            url: Url::parse(url).unwrap(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[test]
    fn status_line_uses_canonical_reason() {
        let res = ApiResponse::new(StatusCode::NOT_FOUND, HeaderMap::new(), "");
        assert_eq!(res.status_line(), "404 Not Found");
        assert!(!res.is_success());
        let res = ApiResponse::new(StatusCode::from_u16(599).unwrap(), HeaderMap::new(), "");
        assert_eq!(res.status_line(), "599");
    }

    #[test]
    fn json_decodes_body() {
        let res = ApiResponse::new(StatusCode::OK, HeaderMap::new(), r#"{"Success":true}"#);
        let v: serde_json::Value = res.json().unwrap();
        assert_eq!(v["Success"], true);
        let bad = ApiResponse::new(StatusCode::OK, HeaderMap::new(), "not json");
        assert!(matches!(bad.json::<serde_json::Value>(), Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn http_transport_sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/API/Tests/Update"))
            .and(header("Username", "alice"))
            .and(header("Content-Type", "application/x-www-form-urlencoded"))
            .and(body_string("TestID=42&Paused=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Success":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request(Method::PUT, &format!("{}/API/Tests/Update", server.uri()));
        req.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        req.headers.insert("Username", HeaderValue::from_static("alice"));
        req.body = Some("TestID=42&Paused=1".to_string());

        let res = HttpTransport::new().execute(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text(), r#"{"Success":true}"#);
    }

    #[tokio::test]
    async fn http_transport_returns_error_statuses_unclassified() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/API/Tests/Details"))
            .and(query_param("TestID", "7"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let req = request(
            Method::DELETE,
            &format!("{}/API/Tests/Details?TestID=7", server.uri()),
        );
        let res = HttpTransport::new().execute(req).await.unwrap();
        assert_eq!(res.status().as_u16(), 500);
        assert_eq!(res.text(), "boom");
    }

    #[test]
    fn with_config_records_timeout() {
        let transport = HttpTransport::with_config(Duration::from_secs(5), "test").unwrap();
        assert_eq!(transport.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(HttpTransport::new().timeout(), None);
    }
}
