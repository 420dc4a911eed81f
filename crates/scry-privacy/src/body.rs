use scry_core::BodyMask;

/// Recorded in place of a request body that has no text form.
pub const UNSERIALIZABLE_BODY: &str = "[Unable to serialize body]";

/// Recorded in place of a response body that could not be read as text.
pub const UNREADABLE_RESPONSE_BODY: &str = "[Unable to read response body]";

/// Mask then truncate body text to `max_chars` characters.
///
/// Empty content passes through untouched.
pub fn limit_body(content: Option<&str>, max_chars: usize, mask: Option<&BodyMask>) -> Option<String> {
    let content = content?;
    if content.is_empty() {
        return Some(String::new());
    }

    let processed = match mask {
        Some(mask) => mask.apply(content),
        None => content.to_string(),
    };

    let total = processed.chars().count();
    if total > max_chars {
        let head: String = processed.chars().take(max_chars).collect();
        Some(format!("{}... [truncated from {} chars]", head, total))
    } else {
        Some(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_with_marker() {
        assert_eq!(
            limit_body(Some("abcdefghij"), 4, None).as_deref(),
            Some("abcd... [truncated from 10 chars]")
        );
        assert_eq!(limit_body(Some("abc"), 4, None).as_deref(), Some("abc"));
        assert_eq!(limit_body(None, 4, None), None);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(limit_body(Some("ééé"), 3, None).as_deref(), Some("ééé"));
        assert_eq!(
            limit_body(Some("éééé"), 2, None).as_deref(),
            Some("éé... [truncated from 4 chars]")
        );
    }

    #[test]
    fn test_masks_before_truncating() {
        let mask = BodyMask::new(|body| body.replace("password=hunter2", "password=***"));
        assert_eq!(
            limit_body(Some("user=a&password=hunter2"), 100, Some(&mask)).as_deref(),
            Some("user=a&password=***")
        );
        assert_eq!(
            limit_body(Some("password=hunter2"), 5, Some(&mask)).as_deref(),
            Some("passw... [truncated from 12 chars]")
        );
    }
}
