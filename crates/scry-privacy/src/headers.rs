use std::collections::BTreeMap;

/// Headers that are never recorded.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "x-api-key",
    "x-auth-token",
    "x-csrf-token",
    "x-session-token",
    "set-cookie",
];

pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Drop sensitive and `excluded` headers (case-insensitive). Later
/// duplicates overwrite earlier ones.
pub fn filter_headers<'a, I>(headers: I, excluded: &[String]) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    headers
        .into_iter()
        .filter(|(name, _)| {
            !is_sensitive_header(name) && !excluded.iter().any(|e| e.eq_ignore_ascii_case(name))
        })
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_sensitive_and_excluded() {
        let headers = [
            ("Authorization", "Bearer x"),
            ("Content-Type", "application/json"),
            ("X-Tenant", "acme"),
            ("set-cookie", "a=b"),
            ("Accept", "*/*"),
        ];
        let filtered = filter_headers(headers, &["x-tenant".to_string()]);

        assert_eq!(
            filtered.into_iter().collect::<Vec<_>>(),
            vec![
                ("Accept".to_string(), "*/*".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]
        );
    }
}
