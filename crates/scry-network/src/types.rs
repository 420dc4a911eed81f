use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Fetch,
    Xhr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    pub request_id: String,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub method: String,
    /// Sanitized absolute URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetworkRequest {
    pub fn pending(request_id: String, request_type: RequestType, method: String, url: String, timestamp: i64) -> Self {
        Self {
            request_id,
            request_type,
            method,
            url,
            request_headers: None,
            request_body: None,
            response_status: None,
            response_headers: None,
            response_body: None,
            timestamp,
            duration: None,
            error: None,
        }
    }
}

/// Instrumentation attached to an `XmlHttpRequest` when it is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct XhrMetadata {
    pub request_id: String,
    pub timestamp: i64,
    pub method: String,
    pub url: String,
}
