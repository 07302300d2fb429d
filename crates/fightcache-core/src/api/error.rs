use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to decode response: {0}")]
    Decoding(String),

    #[error("Server unavailable - liveness probe failed")]
    ServerUnavailable,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::InvalidResponse(format!("Status {}: {}", status, Self::truncate_body(body)))
    }

    /// True for errors raised before any payload was received.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::ServerUnavailable)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_is_invalid_response() {
        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        match err {
            ApiError::InvalidResponse(msg) => {
                assert!(msg.contains("502"));
                assert!(msg.contains("upstream down"));
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("520 total bytes"));
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        // 'é' is two bytes, so byte 500 lands mid-character
        let long = format!("a{}", "é".repeat(300));
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
    }

    #[test]
    fn test_is_network() {
        assert!(ApiError::ServerUnavailable.is_network());
        assert!(!ApiError::Decoding("bad".into()).is_network());
        assert!(!ApiError::Unexpected("x".into()).is_network());
    }
}
