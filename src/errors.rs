//! Typed error hierarchy for TaskFlow.
//!
//! Two enums cover the two layers:
//! - `RemoteError`: failures reported by (or while talking to) the hosted backend
//! - `TaskflowError`: failures of the board, comment, project, and session logic

use thiserror::Error;
use uuid::Uuid;

use taskflow_common::InvalidTaskRow;

/// Errors from the remote data service. Authorization failures enforced by
/// row-level security arrive here as `Status` like any other rejection.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Remote returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response from remote: {0}")]
    Decode(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Remote service unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            RemoteError::Unauthenticated | RemoteError::Status { status: 401 | 403, .. }
        )
    }
}

/// Errors from the client-side core.
#[derive(Debug, Error)]
pub enum TaskflowError {
    #[error("Project {id} not found")]
    ProjectNotFound { id: Uuid },

    #[error("Task {id} not found")]
    TaskNotFound { id: Uuid },

    #[error("No task matching '{reference}' on this board")]
    NoTaskMatch { reference: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    InvalidRow(#[from] InvalidTaskRow),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = TaskflowError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_carries_code_and_message() {
        let err = RemoteError::Status {
            status: 409,
            message: "duplicate key value".to_string(),
        };
        match &err {
            RemoteError::Status { status, message } => {
                assert_eq!(*status, 409);
                assert_eq!(message, "duplicate key value");
            }
            _ => panic!("Expected Status"),
        }
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(RemoteError::Unauthenticated.is_unauthorized());
        assert!(
            RemoteError::Status {
                status: 401,
                message: "JWT expired".into()
            }
            .is_unauthorized()
        );
        assert!(
            !RemoteError::Status {
                status: 500,
                message: "boom".into()
            }
            .is_unauthorized()
        );
    }

    #[test]
    fn test_taskflow_error_converts_from_remote_error() {
        let err: TaskflowError = RemoteError::Unauthenticated.into();
        assert!(matches!(
            err,
            TaskflowError::Remote(RemoteError::Unauthenticated)
        ));
    }

    #[test]
    fn test_project_not_found_carries_id() {
        let id = Uuid::new_v4();
        let err = TaskflowError::ProjectNotFound { id };
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&RemoteError::Unauthenticated);
        assert_std_error(&TaskflowError::Validation("x".into()));
    }
}
