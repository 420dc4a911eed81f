use scry_core::non_empty_trimmed;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub public_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedUserIdentity {
    pub user_id: String,
}

impl CapturedUserIdentity {
    /// Trimmed identity, or `None` when nothing but whitespace was given.
    pub fn parse(user_id: &str) -> Option<Self> {
        non_empty_trimmed(user_id).map(|user_id| Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_trimmed() {
        assert_eq!(
            CapturedUserIdentity::parse("  user_123 ").map(|i| i.user_id),
            Some("user_123".to_string())
        );
        assert_eq!(CapturedUserIdentity::parse(" \t"), None);
        assert_eq!(CapturedUserIdentity::parse(""), None);
    }

    #[test]
    fn test_wire_names() {
        let body = serde_json::to_value(CreateSessionRequest {
            public_token: "pk_1".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"publicToken": "pk_1"}));
    }
}
