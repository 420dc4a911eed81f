use serde::{Deserialize, Serialize};
use woothee::parser::{Parser, WootheeResult};

/// Browser, OS and device class parsed from a user agent string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BrowserInfo {
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    /// `mobile`, `tablet` or `smarttv`; `None` for desktops and anything
    /// unclassified.
    pub device_type: Option<String>,
}

impl BrowserInfo {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.trim().is_empty() {
            return Self::default();
        }

        match Parser::new().parse(user_agent) {
            Some(result) => Self::from_woothee_result(&result),
            None => Self::default(),
        }
    }

    fn from_woothee_result(result: &WootheeResult) -> Self {
        Self {
            browser_name: Self::known(result.name),
            browser_version: Self::known(result.version),
            os_name: Self::known(result.os),
            os_version: Self::known(&result.os_version),
            device_type: Self::device_type(result.category),
        }
    }

    fn known(value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() || value == "UNKNOWN" {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn device_type(category: &str) -> Option<String> {
        match category {
            "smartphone" | "mobilephone" => Some("mobile".to_string()),
            "tablet" => Some("tablet".to_string()),
            "appliance" => Some("smarttv".to_string()),
            _ => None,
        }
    }
}
