//! Collection endpoint transport
//!
//! Recorders and the session coordinator talk to the collection endpoint only
//! through [`Transport`]. Non-2xx statuses come back as responses; deciding
//! what a status means is the caller's job.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://scryspell.com";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, TransportError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub data: Value,
}

impl TransportResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Verb helpers over any [`Transport`]. Bodies are serialized before the
/// returned future is created, so the payload type does not have to be `Send`.
pub trait TransportExt: Transport {
    fn get<'a>(&'a self, path: &str) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.send(Ok(TransportRequest::new(HttpMethod::Get, path)))
    }

    fn post<'a, T: Serialize + ?Sized>(
        &'a self,
        path: &str,
        body: &T,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.send(TransportRequest::new(HttpMethod::Post, path).with_json(body))
    }

    fn put<'a, T: Serialize + ?Sized>(
        &'a self,
        path: &str,
        body: &T,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.send(TransportRequest::new(HttpMethod::Put, path).with_json(body))
    }

    fn patch<'a, T: Serialize + ?Sized>(
        &'a self,
        path: &str,
        body: &T,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.send(TransportRequest::new(HttpMethod::Patch, path).with_json(body))
    }

    #[doc(hidden)]
    fn send<'a>(
        &'a self,
        request: Result<TransportRequest, TransportError>,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        Box::pin(async move { self.request(request?).await })
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

/// reqwest-backed transport against a fixed base URL.
///
/// The client keeps no cookie store, so ambient credentials are never sent.
pub struct HttpTransport {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("Scry-Recorder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.endpoint(&request.path)?;
        debug!("{} {}", request.method.as_str(), url);

        let builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Patch => self.client.patch(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let data = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(TransportResponse { status, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_relative_to_base_path() {
        let transport = HttpTransport::new("https://collect.example.com/api").unwrap();
        assert_eq!(
            transport
                .endpoint("/public/captured-sessions")
                .unwrap()
                .as_str(),
            "https://collect.example.com/api/public/captured-sessions"
        );
    }

    #[test]
    fn test_with_json_serializes_body() {
        let request = TransportRequest::new(HttpMethod::Post, "/x")
            .with_json(&serde_json::json!({"publicToken": "tok"}))
            .unwrap();
        assert_eq!(request.body, Some(serde_json::json!({"publicToken": "tok"})));
    }

    #[test]
    fn test_response_success_range() {
        assert!(TransportResponse::new(201, Value::Null).is_success());
        assert!(!TransportResponse::new(404, Value::Null).is_success());
        assert!(!TransportResponse::new(0, Value::Null).is_success());
    }
}
