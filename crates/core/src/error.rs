//! Error types for sideboard-core

use thiserror::Error;

use crate::settings::ValidationErrors;

/// Core error type
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("No data directory found")]
    NoDataDir,

    #[error("Search service returned HTTP {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Player {0} not found")]
    PlayerNotFound(u32),

    #[error("Invalid settings: {0}")]
    Validation(ValidationErrors),

    #[error("Not initialized")]
    NotInitialized,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<ValidationErrors> for CoreError {
    fn from(err: ValidationErrors) -> Self {
        CoreError::Validation(err)
    }
}

impl From<ureq::Error> for CoreError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(429, _) => CoreError::RateLimited,
            ureq::Error::Status(status, _) => CoreError::Http { status },
            ureq::Error::Transport(t) => CoreError::Network(t.to_string()),
        }
    }
}

impl CoreError {
    /// Single user-facing line for the search screen
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Network(_) => "Could not reach the card service. Check your connection.".to_string(),
            CoreError::Http { status } => format!("Card search failed (HTTP {}).", status),
            CoreError::RateLimited => "Too many searches, try again in a moment.".to_string(),
            CoreError::InvalidResponse { .. } | CoreError::Serialization(_) => {
                "Card service sent an unexpected response.".to_string()
            }
            other => format!("Card search failed: {}", other),
        }
    }
}
