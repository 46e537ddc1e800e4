//! Events fed to the screen reducer and error modeling for what the user sees.

use client_core::{WorkflowError, WorkflowOperation};
use shared::domain::{Assignment, Submission, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    AssignmentLoaded(Assignment),
    RefreshRequested,
    SubmissionsLoaded(Vec<Submission>),
    SubmissionsFailed(WorkflowError),
    SubmissionSelected(UserId),
    PendingGradeChanged(Option<i64>),
    OperationStarted(WorkflowOperation),
    SubmissionChanged(Submission),
    OperationFailed {
        operation: WorkflowOperation,
        error: WorkflowError,
    },
    /// The unit was cancelled or superseded; nothing to show.
    OperationAbandoned(WorkflowOperation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Rejected,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    InitialLoad,
    Refresh,
    Action(WorkflowOperation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_workflow(context: UiErrorContext, error: &WorkflowError) -> Self {
        let category = match error {
            WorkflowError::Unauthenticated => UiErrorCategory::Auth,
            WorkflowError::NetworkTimeout | WorkflowError::NetworkUnavailable => {
                UiErrorCategory::Transport
            }
            WorkflowError::InvalidTransition { .. }
            | WorkflowError::OutOfRange { .. }
            | WorkflowError::DuplicateAttachment { .. } => UiErrorCategory::Validation,
            WorkflowError::RemoteRejected { .. } => UiErrorCategory::Rejected,
            WorkflowError::Unknown { .. } => UiErrorCategory::Unknown,
        };

        let message = match context {
            UiErrorContext::Refresh => format!("Couldn't refresh: {}", error.user_message()),
            UiErrorContext::InitialLoad | UiErrorContext::Action(_) => error.user_message(),
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
