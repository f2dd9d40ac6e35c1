//! Request DTOs for the caching proxy API

use serde::Deserialize;

/// Longest key accepted in a request path.
pub const MAX_KEY_LEN: usize = 256;

/// Request body for `PUT /resource/:key`.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    /// New content written to the origin
    pub value: String,
}

/// Checks a resource key taken from a request path.
///
/// Returns an error message if the key is unusable, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.trim().is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LEN {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LEN
        ));
    }
    if key.contains("..") {
        return Some("Key cannot contain '..'".to_string());
    }
    None
}
