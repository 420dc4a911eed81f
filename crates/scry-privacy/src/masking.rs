//! Text masking by element role.

use scry_core::MaskingLevel;

/// The kinds of element whose captured text is subject to masking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementRole {
    /// `<input>`; `input_type` is the lowercased `type` attribute.
    Input { input_type: String },
    TextArea,
    Select,
    Button,
    Anchor,
    Image,
    Other,
}

impl ElementRole {
    pub fn from_tag(tag: &str, input_type: Option<&str>) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "input" => Self::Input {
                input_type: input_type.unwrap_or("text").to_ascii_lowercase(),
            },
            "textarea" => Self::TextArea,
            "select" => Self::Select,
            "button" => Self::Button,
            "a" => Self::Anchor,
            "img" => Self::Image,
            _ => Self::Other,
        }
    }

    pub fn is_text_entry(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::TextArea)
    }

    /// Password and email inputs.
    pub fn is_sensitive_input(&self) -> bool {
        match self {
            Self::Input { input_type } => matches!(input_type.as_str(), "password" | "email" | "e-mail"),
            _ => false,
        }
    }
}

/// Apply `level` to text extracted from an element with `role`.
///
/// Returns `None` when the text is masked or empty.
pub fn resolve_text(level: MaskingLevel, role: &ElementRole, raw: Option<String>) -> Option<String> {
    let masked = match level {
        MaskingLevel::None => false,
        MaskingLevel::All | MaskingLevel::Unrecognized => true,
        MaskingLevel::InputAndTextarea => role.is_text_entry(),
        MaskingLevel::InputPasswordOrEmailAndTextarea => {
            *role == ElementRole::TextArea || role.is_sensitive_input()
        }
    };
    if masked {
        return None;
    }
    raw.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_tag() {
        assert_eq!(
            ElementRole::from_tag("INPUT", Some("Password")),
            ElementRole::Input { input_type: "password".to_string() }
        );
        assert_eq!(
            ElementRole::from_tag("input", None),
            ElementRole::Input { input_type: "text".to_string() }
        );
        assert_eq!(ElementRole::from_tag("a", None), ElementRole::Anchor);
        assert_eq!(ElementRole::from_tag("div", None), ElementRole::Other);
    }

    #[test]
    fn test_empty_text_is_none() {
        assert_eq!(resolve_text(MaskingLevel::None, &ElementRole::Button, Some(String::new())), None);
        assert_eq!(resolve_text(MaskingLevel::None, &ElementRole::Button, None), None);
    }
}
