//! Collection endpoint paths, relative to the transport's base URL.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CAPTURED_SESSIONS_PATH: &str = "/public/captured-sessions";

/// Opaque identifier assigned by the collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

fn session_path(id: &SessionId, suffix: &str) -> String {
    format!("{}/{}/{}", CAPTURED_SESSIONS_PATH, id, suffix)
}

pub fn create_session() -> String {
    CAPTURED_SESSIONS_PATH.to_string()
}

pub fn metadata(id: &SessionId) -> String {
    session_path(id, "captured-session/metadata")
}

pub fn identify(id: &SessionId) -> String {
    session_path(id, "identify")
}

pub fn ping(id: &SessionId) -> String {
    session_path(id, "ping")
}

pub fn ui_events(id: &SessionId) -> String {
    session_path(id, "ui-events")
}

pub fn console_errors(id: &SessionId) -> String {
    session_path(id, "console-errors")
}

pub fn network_requests(id: &SessionId) -> String {
    session_path(id, "network-requests")
}

pub fn recording(id: &SessionId) -> String {
    session_path(id, "recording")
}
