use thiserror::Error;

/// Failure surfaced by a transaction feed. The scoring core never produces these.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Feed request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Feed rate limit exceeded")]
    RateLimited,

    #[error("Explorer API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Feed source unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode feed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest does not expose the configured duration
            FeedError::Timeout { secs: 0 }
        } else if e.is_decode() {
            FeedError::Decode(e.to_string())
        } else if e.status().map(|s| s.as_u16()) == Some(429) {
            FeedError::RateLimited
        } else {
            FeedError::Network(e.to_string())
        }
    }
}
