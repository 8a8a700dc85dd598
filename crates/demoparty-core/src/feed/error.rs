use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Feed unavailable - direct fetch and all relays failed")]
    Exhausted,

    #[error("Invalid feed document: {0}")]
    InvalidDocument(String),

    #[error("Invalid feed configuration: {0}")]
    Config(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FeedError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        FeedError::Status {
            status: status.as_u16(),
            body: Self::truncate_body(body),
        }
    }

    /// Recoverable errors are answered with fallback data; the rest surface
    /// to the user.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FeedError::Config(_))
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Network(err.to_string())
    }
}

impl From<quick_xml::Error> for FeedError {
    fn from(err: quick_xml::Error) -> Self {
        FeedError::InvalidDocument(err.to_string())
    }
}

/// Why a single feed item was skipped.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ItemError {
    #[error("item has no title")]
    MissingTitle,
}
