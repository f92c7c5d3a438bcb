//! services/client/src/error.rs
//!
//! Defines the primary error type for the PRD Generator client.

use crate::config::ConfigError;
use prd_client_core::ports::PortError;

/// Shown when no response arrived at all.
pub const NETWORK_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";

/// The primary error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing or invalid form input, caught before any request is made.
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the credentials (401).
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Any other non-2xx response.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never received a response.
    #[error("Network error: {0}")]
    Network(String),

    /// Document content that claims a format it does not satisfy.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a standard Input/Output error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ClientError {
    /// Text suitable for an inline message in the UI.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => NETWORK_MESSAGE.to_string(),
            ClientError::Auth(_) => "Your session has expired. Please log in again.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

impl From<PortError> for ClientError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Api { status: 401, message } => ClientError::Auth(message),
            PortError::Api { status, message } => ClientError::Api { status, message },
            PortError::Network(cause) => ClientError::Network(cause),
            PortError::Storage(cause) => ClientError::Storage(cause),
            PortError::Unexpected(cause) => ClientError::Internal(cause),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_responses_become_auth_errors() {
        let err: ClientError = PortError::Api {
            status: 401,
            message: "Not authenticated".into(),
        }
        .into();
        assert!(err.is_auth());

        let err: ClientError = PortError::Api {
            status: 404,
            message: "PRD not found".into(),
        }
        .into();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));
        assert_eq!(err.user_message(), "PRD not found");
    }

    #[test]
    fn network_errors_prompt_a_retry() {
        let err: ClientError = PortError::Network("connection refused".into()).into();
        assert_eq!(err.user_message(), NETWORK_MESSAGE);
    }
}
