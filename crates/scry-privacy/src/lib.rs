//! Privacy policy
//!
//! Pure transforms applied to everything a recorder captures before it is
//! buffered: text masking by element role, query-string redaction, header
//! filtering and body size limits.

pub mod body;
pub mod headers;
pub mod masking;
pub mod query;

pub use body::{limit_body, UNREADABLE_RESPONSE_BODY, UNSERIALIZABLE_BODY};
pub use headers::{filter_headers, is_sensitive_header, SENSITIVE_HEADERS};
pub use masking::{resolve_text, ElementRole};
pub use query::{is_allowed_query_param, sanitize_query_pairs, sanitize_url, ALLOWED_QUERY_PARAMS, REDACTED};
