//! Utility functions

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Locally unique request id: `req_<millis>_<7 base36 chars>`.
pub fn generate_request_id(now_millis: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..7)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("req_{}_{}", now_millis, suffix)
}

/// `Some(trimmed)` unless the string is empty after trimming.
pub fn non_empty_trimmed(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
