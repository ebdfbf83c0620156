//! Page client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("{url} unreachable after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last_error: Option<Box<FetchError>>,
    },
}

impl FetchError {
    /// Whether waiting and trying again could change the outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Connect { .. })
    }
}
