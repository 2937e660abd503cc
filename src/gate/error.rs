//! Gate error types

use crate::auth::TokenError;
use crate::directory::DirectoryError;
use thiserror::Error;

/// Errors surfaced by the gate
///
/// Every way a gated call can be refused collapses into `MissingToken` or
/// `InvalidToken`, so a client never learns whether its token was forged,
/// expired, or simply not good for the object it asked about.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Undefined application model")]
    Configuration,

    #[error("Application not found")]
    NotFound,

    #[error("No {param} in request url")]
    MissingToken { param: String },

    #[error("Invalid {param}")]
    InvalidToken { param: String },

    #[error("application has no identifier")]
    IncompleteApplication,

    #[error("directory lookup failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("token encoding failed: {0}")]
    Token(#[from] TokenError),
}

impl GateError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::Configuration | GateError::NotFound => 400,
            GateError::MissingToken { .. } | GateError::InvalidToken { .. } => 401,
            GateError::IncompleteApplication | GateError::Directory(_) | GateError::Token(_) => {
                500
            }
        }
    }

    /// Message safe to hand to the client
    pub fn client_message(&self) -> String {
        match self {
            GateError::IncompleteApplication | GateError::Directory(_) | GateError::Token(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            GateError::Configuration.to_string(),
            "Undefined application model"
        );
        assert_eq!(GateError::NotFound.to_string(), "Application not found");
        assert_eq!(
            GateError::MissingToken {
                param: "apptoken".to_string()
            }
            .to_string(),
            "No apptoken in request url"
        );
        assert_eq!(
            GateError::InvalidToken {
                param: "apptoken".to_string()
            }
            .to_string(),
            "Invalid apptoken"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(GateError::Configuration.status_code(), 400);
        assert_eq!(GateError::NotFound.status_code(), 400);
        assert_eq!(
            GateError::InvalidToken {
                param: "t".to_string()
            }
            .status_code(),
            401
        );
        assert_eq!(GateError::IncompleteApplication.status_code(), 500);
    }

    #[test]
    fn test_internal_errors_are_not_exposed() {
        let err = GateError::Directory(DirectoryError::Backend("connection refused".to_string()));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("connection refused"));
    }
}
