//! The history push-state capability.

use serde_json::Value;
use std::sync::{Arc, RwLock};
use url::Url;

use crate::sync::write;

pub trait HistoryApi: Send + Sync {
    fn push_state(&self, state: Value, url: Option<&str>);
}

/// Updates the shared location; URLs resolve against the current one.
#[derive(Debug)]
pub struct NativeHistory {
    location: Arc<RwLock<Url>>,
}

impl NativeHistory {
    pub fn new(location: Arc<RwLock<Url>>) -> Self {
        Self { location }
    }
}

impl HistoryApi for NativeHistory {
    fn push_state(&self, _state: Value, url: Option<&str>) {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return;
        };
        let mut location = write(&self.location);
        match location.join(url) {
            Ok(next) if next.origin() == location.origin() => *location = next,
            Ok(next) => tracing::warn!("Refusing cross-origin pushState to {}", next),
            Err(e) => tracing::warn!("Ignoring pushState with invalid URL {}: {}", url, e),
        }
    }
}
