use scry_core::url::Url;
use scry_core::MaskingLevel;
use scry_privacy::{resolve_text, sanitize_url, ElementRole};

fn input(input_type: &str) -> ElementRole {
    ElementRole::Input {
        input_type: input_type.to_string(),
    }
}

fn text() -> Option<String> {
    Some("Visible".to_string())
}

#[test]
fn test_masking_matrix() {
    let roles = [
        input("text"),
        input("password"),
        input("email"),
        input("e-mail"),
        ElementRole::TextArea,
        ElementRole::Select,
        ElementRole::Button,
        ElementRole::Anchor,
        ElementRole::Image,
    ];

    for role in &roles {
        // none keeps everything, all and unknown levels mask everything
        assert_eq!(resolve_text(MaskingLevel::None, role, text()), text(), "{:?}", role);
        assert_eq!(resolve_text(MaskingLevel::All, role, text()), None, "{:?}", role);
        assert_eq!(resolve_text(MaskingLevel::Unrecognized, role, text()), None, "{:?}", role);

        let input_and_textarea = resolve_text(MaskingLevel::InputAndTextarea, role, text());
        if matches!(role, ElementRole::Input { .. } | ElementRole::TextArea) {
            assert_eq!(input_and_textarea, None, "{:?}", role);
        } else {
            assert_eq!(input_and_textarea, text(), "{:?}", role);
        }
    }

    let level = MaskingLevel::InputPasswordOrEmailAndTextarea;
    assert_eq!(resolve_text(level, &input("password"), text()), None);
    assert_eq!(resolve_text(level, &input("email"), text()), None);
    assert_eq!(resolve_text(level, &input("e-mail"), text()), None);
    assert_eq!(resolve_text(level, &ElementRole::TextArea, text()), None);
    assert_eq!(resolve_text(level, &input("text"), text()), text());
    assert_eq!(resolve_text(level, &input("search"), text()), text());
    assert_eq!(resolve_text(level, &ElementRole::Select, text()), text());
    assert_eq!(resolve_text(level, &ElementRole::Button, text()), text());
}

#[test]
fn test_sanitize_keeps_attribution_and_redacts_the_rest() {
    let sanitized = sanitize_url(
        "https://api.example.com/x?api_key=abc&utm_source=news&Campaign=spring",
        None,
    );

    assert!(sanitized.contains("utm_source=news"));
    assert!(sanitized.contains("Campaign=spring"));
    assert!(sanitized.contains("api_key=%24redacted"));
    assert!(!sanitized.contains("abc"));
}

#[test]
fn test_sanitize_without_query_is_unchanged() {
    assert_eq!(
        sanitize_url("https://example.com/path", None),
        "https://example.com/path"
    );
}

#[test]
fn test_sanitize_resolves_relative_against_base() {
    let base = Url::parse("https://app.example.com/dashboard/").unwrap();
    assert_eq!(
        sanitize_url("/api/items?ref=home&session=1", Some(&base)),
        "https://app.example.com/api/items?ref=home&session=%24redacted"
    );
}

#[test]
fn test_sanitize_returns_malformed_input_unchanged() {
    assert_eq!(sanitize_url("http://[::1", None), "http://[::1");
    assert_eq!(sanitize_url("not a url", None), "not a url");
}
