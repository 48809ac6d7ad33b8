//! Error types for the helpdesk.

use crate::ticket::TicketStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelpdeskError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HelpdeskError {
    /// HTTP status the web layer maps this error to.
    ///
    /// Provider errors are listed for completeness but never reach the
    /// web layer: the assistant absorbs them into a fallback answer.
    pub fn http_status(&self) -> u16 {
        match self {
            HelpdeskError::Validation(_) => 400,
            HelpdeskError::NotFound(_) => 404,
            HelpdeskError::InvalidTransition { .. } => 409,
            HelpdeskError::Unauthorized => 401,
            HelpdeskError::Provider(_) => 502,
            HelpdeskError::Configuration(_) => 500,
            HelpdeskError::Io(_) => 500,
            HelpdeskError::Json(_) => 500,
            HelpdeskError::Internal(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, HelpdeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(HelpdeskError::Validation("empty".into()).http_status(), 400);
        assert_eq!(HelpdeskError::NotFound("ticket 9".into()).http_status(), 404);
        assert_eq!(
            HelpdeskError::InvalidTransition {
                from: TicketStatus::New,
                to: TicketStatus::Closed,
            }
            .http_status(),
            409
        );
        assert_eq!(HelpdeskError::Unauthorized.http_status(), 401);
        assert_eq!(HelpdeskError::Internal("boom".into()).http_status(), 500);
    }

    #[test]
    fn test_transition_error_names_both_states() {
        let err = HelpdeskError::InvalidTransition {
            from: TicketStatus::New,
            to: TicketStatus::Closed,
        };
        let msg = err.to_string();
        assert!(msg.contains("New"));
        assert!(msg.contains("Closed"));
    }
}
