use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    ConsoleError,
    ConsoleWarn,
    UncaughtError,
    UnhandledRejection,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsoleError => "console_error",
            Self::ConsoleWarn => "console_warn",
            Self::UncaughtError => "uncaught_error",
            Self::UnhandledRejection => "unhandled_rejection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleError {
    pub error_type: ErrorType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub timestamp: i64,
    /// `file:line:col` of an uncaught error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
