use shared::{domain::SubmissionState, error::ErrorCode};
use thiserror::Error;

use crate::{transport::TransportError, types::WorkflowOperation};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("You are signed out. Sign in and try again.")]
    Unauthenticated,
    #[error("Cannot {} a submission that is {state}: {detail}", .operation.verb())]
    InvalidTransition {
        operation: WorkflowOperation,
        state: SubmissionState,
        detail: String,
    },
    #[error("Grade {grade} must be between 0 and {max_points}.")]
    OutOfRange { grade: i64, max_points: i64 },
    #[error("The {identity} is already attached.")]
    DuplicateAttachment { identity: String },
    #[error("The request timed out. Try again.")]
    NetworkTimeout,
    #[error("Network unavailable. Check your connection and try again.")]
    NetworkUnavailable,
    #[error("The server rejected the change: {message}")]
    RemoteRejected { message: String },
    #[error("Something went wrong: {message}")]
    Unknown { message: String },
}

impl WorkflowError {
    pub fn invalid_transition(
        operation: WorkflowOperation,
        state: SubmissionState,
        detail: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            operation,
            state,
            detail: detail.into(),
        }
    }

    /// Raised before any repository call; never retried.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WorkflowError::Unauthenticated
                | WorkflowError::InvalidTransition { .. }
                | WorkflowError::OutOfRange { .. }
                | WorkflowError::DuplicateAttachment { .. }
        )
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Maps a repository failure onto the taxonomy by walking its error chain.
    pub fn from_remote(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(workflow) = cause.downcast_ref::<WorkflowError>() {
                return workflow.clone();
            }
            if let Some(transport) = cause.downcast_ref::<TransportError>() {
                return Self::from_transport(transport);
            }
            if let Some(http) = cause.downcast_ref::<reqwest::Error>() {
                if http.is_timeout() {
                    return WorkflowError::NetworkTimeout;
                }
                if http.is_connect() || http.is_request() {
                    return WorkflowError::NetworkUnavailable;
                }
                if let Some(status) = http.status() {
                    return Self::from_api(status.as_u16(), ErrorCode::Unknown, &http.to_string());
                }
            }
        }

        classify_message(&err.to_string())
    }

    fn from_transport(err: &TransportError) -> Self {
        match err {
            TransportError::MissingAccessToken => WorkflowError::Unauthenticated,
            TransportError::Status { status, error } => match error {
                Some(api) => Self::from_api(*status, api.status, &api.message),
                None => Self::from_api(*status, ErrorCode::Unknown, &format!("HTTP {status}")),
            },
            TransportError::Protocol(source) => WorkflowError::Unknown {
                message: source.to_string(),
            },
        }
    }

    fn from_api(status: u16, code: ErrorCode, message: &str) -> Self {
        match (status, code) {
            (401, _) | (_, ErrorCode::Unauthenticated) => WorkflowError::Unauthenticated,
            (408 | 504, _) | (_, ErrorCode::DeadlineExceeded) => WorkflowError::NetworkTimeout,
            (502 | 503, _) | (_, ErrorCode::Unavailable) => WorkflowError::NetworkUnavailable,
            (400..=499, _) => WorkflowError::RemoteRejected {
                message: message.to_string(),
            },
            _ => WorkflowError::Unknown {
                message: message.to_string(),
            },
        }
    }
}

fn classify_message(message: &str) -> WorkflowError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") {
        WorkflowError::NetworkTimeout
    } else if lower.contains("connection refused")
        || lower.contains("failed to connect")
        || lower.contains("dns")
        || lower.contains("network unreachable")
    {
        WorkflowError::NetworkUnavailable
    } else {
        WorkflowError::Unknown {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
