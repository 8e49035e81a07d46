//! Error types for fetching, reading and writing listing data.

use thiserror::Error;

/// Errors that can occur outside the (infallible) timetable core.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Request did not complete within the configured timeout
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("{url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// The index page had no faculty links for the term
    #[error("No faculty pages found for term {term}")]
    NoFacultyPages { term: String },

    #[error("URL error: {message}")]
    Url { message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Returns true if this error is potentially transient and retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Network { .. } | ScrapeError::Timeout { .. } => true,
            ScrapeError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ScrapeError::Timeout {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if let Some(status) = err.status() {
            return ScrapeError::HttpStatus {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            };
        }
        ScrapeError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(err: url::ParseError) -> Self {
        ScrapeError::Url {
            message: err.to_string(),
        }
    }
}
