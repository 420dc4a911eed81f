//! The `fetch` capability.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::sync::read;

pub type Headers = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
    /// Opaque payloads (blobs, form data, binary responses).
    Bytes(Vec<u8>),
}

impl Body {
    /// Textual form, or `None` when the payload is not valid UTF-8.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Json(value) => Some(value.to_string()),
            Self::Bytes(bytes) => String::from_utf8(bytes.clone()).ok(),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Json(value) => value.to_string().into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// A request-like fetch input.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub url: String,
    pub method: String,
    pub headers: Headers,
    pub body: Option<Body>,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Per-call overrides; every field set here wins over the request input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: Option<Headers>,
    pub body: Option<Body>,
}

impl RequestInit {
    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchInput {
    Url(String),
    Request(Request),
}

impl FetchInput {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Request(request) => &request.url,
        }
    }

    /// Merge `init` over the input into the request that is actually sent.
    pub fn resolve(self, init: Option<RequestInit>) -> Request {
        let mut request = match self {
            Self::Url(url) => Request::new(url),
            Self::Request(request) => request,
        };
        if let Some(init) = init {
            if let Some(method) = init.method {
                request.method = method;
            }
            if let Some(headers) = init.headers {
                request.headers = headers;
            }
            if init.body.is_some() {
                request.body = init.body;
            }
        }
        request.method = request.method.to_uppercase();
        request
    }
}

impl From<&str> for FetchInput {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for FetchInput {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<&Url> for FetchInput {
    fn from(url: &Url) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<Request> for FetchInput {
    fn from(request: Request) -> Self {
        Self::Request(request)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> Option<String> {
        self.body.to_text()
    }
}

/// A rejected fetch (network failure, abort, CORS).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait FetchApi: Send + Sync {
    async fn fetch(&self, input: FetchInput, init: Option<RequestInit>) -> Result<Response, FetchError>;
}

/// Real network fetch; relative URLs resolve against the window location.
pub struct ReqwestFetch {
    client: reqwest::Client,
    location: Arc<RwLock<Url>>,
}

impl ReqwestFetch {
    pub fn new(location: Arc<RwLock<Url>>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client, location }
    }
}

#[async_trait]
impl FetchApi for ReqwestFetch {
    async fn fetch(&self, input: FetchInput, init: Option<RequestInit>) -> Result<Response, FetchError> {
        let request = input.resolve(init);
        let url = read(&self.location)
            .join(&request.url)
            .map_err(|e| FetchError::new(format!("Failed to parse URL from {}: {}", request.url, e)))?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| FetchError::new(format!("'{}' is not a valid HTTP method", request.method)))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body.into_bytes());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::new(format!("Failed to fetch: {}", e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::new(format!("Failed to read body: {}", e)))?;

        Ok(Response {
            status,
            headers,
            body: Body::Bytes(bytes.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_wins_over_request() {
        let input = FetchInput::from(
            Request::new("/api/items")
                .method("post")
                .header("X-Trace", "1")
                .body("original"),
        );
        let resolved = input.resolve(Some(RequestInit::default().method("put").body(json!({"a": 1}))));

        assert_eq!(resolved.method, "PUT");
        assert_eq!(resolved.headers, vec![("X-Trace".to_string(), "1".to_string())]);
        assert_eq!(resolved.body, Some(Body::Json(json!({"a": 1}))));
    }

    #[test]
    fn test_body_text() {
        assert_eq!(Body::from("hi").to_text().as_deref(), Some("hi"));
        assert_eq!(Body::from(json!({"a": 1})).to_text().as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(Body::Bytes(vec![0xff, 0xfe]).to_text(), None);
    }

    #[tokio::test]
    async fn test_reqwest_fetch_against_local_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/items")
            .match_header("content-type", "application/json")
            .with_status(201)
            .with_header("x-request-id", "abc")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let location = Arc::new(RwLock::new(
            Url::parse(&format!("{}/app", server.url())).unwrap(),
        ));
        let fetch = ReqwestFetch::new(location);
        let response = fetch
            .fetch(
                "/api/items".into(),
                Some(
                    RequestInit::default()
                        .method("POST")
                        .header("content-type", "application/json")
                        .body(json!({"name": "a"})),
                ),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 201);
        assert_eq!(response.header("X-Request-Id"), Some("abc"));
        assert_eq!(response.text().as_deref(), Some(r#"{"ok":true}"#));
    }

    #[tokio::test]
    async fn test_reqwest_fetch_rejects_on_connection_failure() {
        let location = Arc::new(RwLock::new(Url::parse("http://127.0.0.1:1/").unwrap()));
        let fetch = ReqwestFetch::new(location);
        let error = fetch.fetch("/nothing".into(), None).await.unwrap_err();
        assert!(error.message.starts_with("Failed to fetch"));
    }
}
