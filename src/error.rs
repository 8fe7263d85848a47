//! Error types for price_tracker

use std::fmt;

/// Unified error type for tracker operations
#[derive(Debug)]
pub enum TrackerError {
    /// HTTP request failed (network error, timeout, etc.)
    Network(reqwest::Error),
    /// HTTP error status code
    HttpStatus(reqwest::StatusCode),
    /// Database operation failed
    Database(rusqlite::Error),
    /// Item limit reached; no new items until one is deleted
    Capacity(usize),
    /// Not a usable product page URL
    InvalidUrl(String),
    /// Upstream served a robot check instead of the product page
    Blocked,
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Network(e) => write!(f, "Network error: {}", e),
            TrackerError::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            TrackerError::Database(e) => write!(f, "Database error: {}", e),
            TrackerError::Capacity(max) => write!(f, "Max {} items reached.", max),
            TrackerError::InvalidUrl(url) => write!(f, "Not a supported product URL: {}", url),
            TrackerError::Blocked => write!(f, "Upstream returned a robot check page"),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::Network(e) => Some(e),
            TrackerError::HttpStatus(_) => None,
            TrackerError::Database(e) => Some(e),
            TrackerError::Capacity(_) => None,
            TrackerError::InvalidUrl(_) => None,
            TrackerError::Blocked => None,
        }
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::Network(err)
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        TrackerError::Database(err)
    }
}

/// Result alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_the_limit() {
        assert_eq!(TrackerError::Capacity(12).to_string(), "Max 12 items reached.");
        assert_eq!(TrackerError::Capacity(3).to_string(), "Max 3 items reached.");
    }

    #[test]
    fn database_error_keeps_source() {
        let err = TrackerError::from(rusqlite::Error::InvalidQuery);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("Database error:"));
    }
}
