use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request timeout: upstream did not respond within {0}s")]
    Timeout(u64),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = UpstreamError::Status {
            status: 404,
            body: "Video unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream returned 404: Video unavailable");
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            UpstreamError::Timeout(10).to_string(),
            "Request timeout: upstream did not respond within 10s"
        );
    }
}
