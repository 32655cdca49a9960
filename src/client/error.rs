use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Cannot connect to server at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    /// Analysis has not produced a result yet (HTTP 404 on the status
    /// endpoint). Callers keep polling.
    #[error("Analysis not ready")]
    NotReady,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Could not read file: {0}")]
    File(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

impl ClientError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, base_url: &str, timeout_secs: u64) -> Self {
        if err.is_connect() {
            Self::Connection(base_url.to_string())
        } else if err.is_timeout() {
            Self::Http(format!("Request timed out after {timeout_secs}s"))
        } else if err.is_decode() {
            Self::ResponseParsing(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_ready_is_transient() {
        assert!(ClientError::NotReady.is_not_ready());
        assert!(!ClientError::Unauthorized.is_not_ready());
        assert!(!ClientError::Status { status: 500, body: String::new() }.is_not_ready());
    }

    #[test]
    fn status_error_message() {
        let err = ClientError::Status {
            status: 503,
            body: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "Server returned 503: maintenance");
    }
}
