//! Environment metadata attached to a captured session.

use scry_core::Window;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::user_agent::BrowserInfo;

const DEFAULT_DEVICE_TYPE: &str = "desktop";

const UTM_SOURCE_KEYS: &[&str] = &["utm_source", "source", "ref"];
const UTM_MEDIUM_KEYS: &[&str] = &["utm_medium", "medium"];
const UTM_CAMPAIGN_KEYS: &[&str] = &["utm_campaign", "campaign"];
const UTM_CONTENT_KEYS: &[&str] = &["utm_content", "content"];
const UTM_TERM_KEYS: &[&str] = &["utm_term", "term"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedUserMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referring_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referring_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
}

impl CapturedUserMetadata {
    pub fn collect(window: &Window) -> Self {
        let browser = BrowserInfo::from_user_agent(&window.navigator().user_agent);
        let location = window.location();
        let referrer = window.referrer();
        let referring_url = (!referrer.is_empty()).then(|| referrer.to_string());
        let referring_domain = referring_url
            .as_deref()
            .and_then(|url| Url::parse(url).ok())
            .and_then(|url| url.host_str().map(str::to_string));
        let viewport = window.viewport();

        Self {
            browser_name: browser.browser_name,
            browser_version: browser.browser_version,
            os_name: browser.os_name,
            os_version: browser.os_version,
            device_type: Some(
                browser
                    .device_type
                    .unwrap_or_else(|| DEFAULT_DEVICE_TYPE.to_string()),
            ),
            browser_language: Some(window.navigator().language.clone()),
            browser_time_zone: Some(window.timezone().to_string()),
            referring_url,
            referring_domain,
            viewport_width: Some(viewport.width),
            viewport_height: Some(viewport.height),
            host: location.host_str().map(str::to_string),
            utm_source: first_param(&location, UTM_SOURCE_KEYS),
            utm_medium: first_param(&location, UTM_MEDIUM_KEYS),
            utm_campaign: first_param(&location, UTM_CAMPAIGN_KEYS),
            utm_content: first_param(&location, UTM_CONTENT_KEYS),
            utm_term: first_param(&location, UTM_TERM_KEYS),
        }
    }
}

/// First non-empty value among `keys`, trying keys in order and taking the
/// first occurrence of each.
fn first_param(url: &Url, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    })
}
