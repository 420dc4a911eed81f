use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Click,
    #[serde(rename = "keydown")]
    KeyDown,
    Change,
    PageView,
    Submit,
    Input,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::Change => "change",
            Self::PageView => "page_view",
            Self::Submit => "submit",
            Self::Input => "input",
        }
    }
}

/// One element of an event's DOM context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub event_type: InteractionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    pub timestamp: i64,
    pub host: String,
    pub path: String,
    /// Always serialized; `null` when masked or empty.
    pub text: Option<String>,
    /// Target first, then up to five ancestors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_context: Option<Vec<DomNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<Vec<(String, String)>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let event = InteractionEvent {
            event_type: InteractionType::KeyDown,
            tag_name: Some("input".to_string()),
            timestamp: 10,
            host: "shop.test".to_string(),
            path: "/cart".to_string(),
            text: None,
            dom_context: Some(vec![DomNode {
                tag: "input".to_string(),
                attrs: BTreeMap::from([("id".to_string(), "q".to_string())]),
            }]),
            query_params: None,
            key: Some("Enter".to_string()),
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "eventType": "keydown",
                "tagName": "input",
                "timestamp": 10,
                "host": "shop.test",
                "path": "/cart",
                "text": null,
                "domContext": [{"tag": "input", "attrs": {"id": "q"}}],
                "key": "Enter"
            })
        );
    }

    #[test]
    fn test_page_view_query_params_are_pairs() {
        let event = InteractionEvent {
            event_type: InteractionType::PageView,
            tag_name: None,
            timestamp: 1,
            host: "a.test".to_string(),
            path: "/".to_string(),
            text: Some("/".to_string()),
            dom_context: None,
            query_params: Some(vec![("ref".to_string(), "x".to_string())]),
            key: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["eventType"], "page_view");
        assert_eq!(value["queryParams"], json!([["ref", "x"]]));
    }
}
