//! Response DTOs for the caching proxy API

use serde::Serialize;

/// Response body for `GET /resource/:key`.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceResponse {
    pub key: String,
    pub value: String,
}

impl ResourceResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for `PUT /resource/:key`.
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    pub message: String,
    pub key: String,
}

impl WriteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Resource '{}' written, cached copy invalidated", key),
            key,
        }
    }
}

/// Response body for `DELETE /cache/:key`.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub key: String,
    /// Whether a cached copy was present
    pub invalidated: bool,
}

impl InvalidateResponse {
    pub fn new(key: impl Into<String>, invalidated: bool) -> Self {
        Self {
            key: key.into(),
            invalidated,
        }
    }
}

/// Response body for `DELETE /cache` and `DELETE /stats`.
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Whether the background sweeper is active
    pub sweeper_running: bool,
}

impl HealthResponse {
    pub fn healthy(sweeper_running: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            sweeper_running,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_response_serialize() {
        let json = serde_json::to_value(ResourceResponse::new("a.txt", "body")).unwrap();
        assert_eq!(json["key"], "a.txt");
        assert_eq!(json["value"], "body");
    }

    #[test]
    fn test_write_response_mentions_key() {
        let resp = WriteResponse::new("a.txt");
        assert_eq!(resp.key, "a.txt");
        assert!(resp.message.contains("a.txt"));
    }

    #[test]
    fn test_invalidate_response_serialize() {
        let json = serde_json::to_value(InvalidateResponse::new("a.txt", false)).unwrap();
        assert_eq!(json["invalidated"], false);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy(true)).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(json.contains("\"sweeper_running\":true"));
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("Something went wrong")).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}
