//! Query-string redaction.
//!
//! Only campaign-attribution parameters survive; every other parameter keeps
//! its key but its value is replaced by [`REDACTED`].

use tracing::error;
use url::Url;

pub const REDACTED: &str = "$redacted";

pub const ALLOWED_QUERY_PARAMS: &[&str] = &[
    "utm_source",
    "source",
    "ref",
    "utm_medium",
    "medium",
    "utm_campaign",
    "campaign",
    "utm_content",
    "content",
    "utm_term",
    "term",
];

pub fn is_allowed_query_param(key: &str) -> bool {
    ALLOWED_QUERY_PARAMS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(key))
}

/// Redacted `(key, value)` pairs in query order.
///
/// A redacted key appears once, at its first position, whatever number of
/// times it occurred.
pub fn sanitize_query_pairs(url: &Url) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in url.query_pairs() {
        if is_allowed_query_param(&key) {
            pairs.push((key.into_owned(), value.into_owned()));
        } else if !pairs.iter().any(|(k, v)| *k == key && v == REDACTED) {
            pairs.push((key.into_owned(), REDACTED.to_string()));
        }
    }
    pairs
}

/// Redact disallowed query values in `url`.
///
/// Relative URLs resolve against `base` when given. Input that cannot be
/// parsed is returned unchanged. A query with nothing to redact keeps its
/// original encoding.
pub fn sanitize_url(url: &str, base: Option<&Url>) -> String {
    let parsed = match base {
        Some(base) => base.join(url),
        None => Url::parse(url),
    };
    let mut parsed = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Failed to sanitize URL params: {}", e);
            return url.to_string();
        }
    };

    if parsed.query().is_none() {
        return parsed.to_string();
    }

    let pairs = sanitize_query_pairs(&parsed);
    if pairs.is_empty() {
        parsed.set_query(None);
    } else if pairs.iter().any(|(_, value)| value == REDACTED) {
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }
    parsed.to_string()
}
