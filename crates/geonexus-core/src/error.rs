use reqwest::StatusCode;
use thiserror::Error;

/// Why a query to the backend produced no usable body
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Request failed: {0}")]
    Transport(reqwest::Error),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Server error: {0}")]
    Status(StatusCode),

    #[error("Invalid response body: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_transport_error_reported_once() {
        let inner = reqwest::Client::new().get("not a url").build().unwrap_err();
        let inner_text = inner.to_string();
        let error = QueryError::Transport(inner);

        assert!(error.source().is_none());
        assert_eq!(error.to_string().matches(inner_text.as_str()).count(), 1);
    }

    #[test]
    fn test_status_message() {
        let error = QueryError::Status(StatusCode::BAD_GATEWAY);
        assert_eq!(error.to_string(), "Server error: 502 Bad Gateway");
    }
}
