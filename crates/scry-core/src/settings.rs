//! Recorder configuration
//!
//! Every settings struct is `#[serde(default)]`, so a partial JSON document
//! supplied by the host is merged field-by-field over the documented defaults,
//! nested sections included.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_PING_INTERVAL_MS: u64 = 20_000;
pub const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024;
pub const DEFAULT_MAX_RESPONSE_BODY_SIZE: usize = 50 * 1024;
pub const DEFAULT_MAX_RETAINED_REPLAY_EVENTS: usize = 10_000;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {details}")]
    InvalidConfiguration { details: String },
}

/// How much user-entered text is redacted before capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskingLevel {
    None,
    #[default]
    All,
    InputAndTextarea,
    InputPasswordOrEmailAndTextarea,
    /// Any value this build does not know. Treated like `All`.
    #[serde(other)]
    Unrecognized,
}

impl MaskingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::InputAndTextarea => "input-and-textarea",
            Self::InputPasswordOrEmailAndTextarea => "input-password-or-email-and-textarea",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl FromStr for MaskingLevel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "none" => Self::None,
            "all" => Self::All,
            "input-and-textarea" => Self::InputAndTextarea,
            "input-password-or-email-and-textarea" => Self::InputPasswordOrEmailAndTextarea,
            _ => Self::Unrecognized,
        })
    }
}

impl fmt::Display for MaskingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// `"maskingLevel": null` means unset, which falls back to the default.
fn nullable_masking_level<'de, D>(deserializer: D) -> Result<MaskingLevel, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<MaskingLevel>::deserialize(deserializer)?.unwrap_or_default())
}

/// Host-supplied transform applied to body text before it is size-limited.
#[derive(Clone)]
pub struct BodyMask(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl BodyMask {
    pub fn new(mask: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(mask))
    }

    pub fn apply(&self, body: &str) -> String {
        (self.0)(body)
    }
}

impl fmt::Debug for BodyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BodyMask(..)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleRecordingSettings {
    pub enabled: bool,
}

impl Default for ConsoleRecordingSettings {
    fn default() -> Self {
        // Deployments that predate the flag always recorded console output.
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkRecordingSettings {
    pub enabled: bool,
    pub max_request_body_size: usize,
    pub max_response_body_size: usize,
    pub exclude_domains: Vec<String>,
    pub capture_headers: bool,
    pub capture_request_bodies: bool,
    pub capture_response_bodies: bool,
    pub exclude_headers: Vec<String>,
    #[serde(skip)]
    pub request_body_masking_function: Option<BodyMask>,
    #[serde(skip)]
    pub response_body_masking_function: Option<BodyMask>,
}

impl Default for NetworkRecordingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_request_body_size: DEFAULT_MAX_REQUEST_BODY_SIZE,
            max_response_body_size: DEFAULT_MAX_RESPONSE_BODY_SIZE,
            exclude_domains: Vec::new(),
            capture_headers: true,
            capture_request_bodies: true,
            capture_response_bodies: true,
            exclude_headers: Vec::new(),
            request_body_masking_function: None,
            response_body_masking_function: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayRecordingSettings {
    pub enabled: bool,
    /// Upper bound on replay events held in memory while deliveries fail.
    pub max_retained_events: usize,
}

impl Default for ReplayRecordingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retained_events: DEFAULT_MAX_RETAINED_REPLAY_EVENTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderSettings {
    #[serde(deserialize_with = "nullable_masking_level")]
    pub masking_level: MaskingLevel,
    pub console_recording: ConsoleRecordingSettings,
    pub network_recording: NetworkRecordingSettings,
    pub replay_recording: ReplayRecordingSettings,
    pub flush_interval_ms: u64,
    pub ping_interval_ms: u64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            masking_level: MaskingLevel::All,
            console_recording: ConsoleRecordingSettings::default(),
            network_recording: NetworkRecordingSettings::default(),
            replay_recording: ReplayRecordingSettings::default(),
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            ping_interval_ms: DEFAULT_PING_INTERVAL_MS,
        }
    }
}

impl RecorderSettings {
    /// Parse a (possibly partial) JSON settings document.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.flush_interval_ms == 0 {
            return Err(SettingsError::InvalidConfiguration {
                details: "flushIntervalMs must be greater than zero".to_string(),
            });
        }
        if self.ping_interval_ms == 0 {
            return Err(SettingsError::InvalidConfiguration {
                details: "pingIntervalMs must be greater than zero".to_string(),
            });
        }
        if self.replay_recording.max_retained_events == 0 {
            return Err(SettingsError::InvalidConfiguration {
                details: "replayRecording.maxRetainedEvents must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Replace out-of-range values with their defaults instead of failing.
    pub fn normalized(mut self) -> Self {
        if self.flush_interval_ms == 0 {
            warn!(
                "flushIntervalMs of 0 is not allowed, using {}",
                DEFAULT_FLUSH_INTERVAL_MS
            );
            self.flush_interval_ms = DEFAULT_FLUSH_INTERVAL_MS;
        }
        if self.ping_interval_ms == 0 {
            warn!(
                "pingIntervalMs of 0 is not allowed, using {}",
                DEFAULT_PING_INTERVAL_MS
            );
            self.ping_interval_ms = DEFAULT_PING_INTERVAL_MS;
        }
        if self.replay_recording.max_retained_events == 0 {
            warn!(
                "replayRecording.maxRetainedEvents of 0 is not allowed, using {}",
                DEFAULT_MAX_RETAINED_REPLAY_EVENTS
            );
            self.replay_recording.max_retained_events = DEFAULT_MAX_RETAINED_REPLAY_EVENTS;
        }
        self
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking_level_from_str() {
        assert_eq!("none".parse::<MaskingLevel>().unwrap(), MaskingLevel::None);
        assert_eq!(
            "input-and-textarea".parse::<MaskingLevel>().unwrap(),
            MaskingLevel::InputAndTextarea
        );
        assert_eq!(
            "everything".parse::<MaskingLevel>().unwrap(),
            MaskingLevel::Unrecognized
        );
    }

    #[test]
    fn test_body_mask_applies_closure() {
        let mask = BodyMask::new(|body| body.replace("secret", "******"));
        assert_eq!(mask.apply("my secret"), "my ******");
    }

    #[test]
    fn test_normalized_replaces_zero_intervals() {
        let settings = RecorderSettings {
            flush_interval_ms: 0,
            ping_interval_ms: 0,
            ..Default::default()
        }
        .normalized();

        assert_eq!(settings.flush_interval(), Duration::from_millis(2_000));
        assert_eq!(settings.ping_interval(), Duration::from_millis(20_000));
    }
}
