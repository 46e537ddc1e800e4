use std::fmt;

use shared::domain::{AssignmentId, UserId};

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowOperation {
    ListSubmissions,
    GetSubmission,
    TurnIn,
    Reclaim,
    Return,
    ModifyAttachments,
    UpdateSubmission,
}

impl WorkflowOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowOperation::ListSubmissions => "list_submissions",
            WorkflowOperation::GetSubmission => "get_submission",
            WorkflowOperation::TurnIn => "turn_in",
            WorkflowOperation::Reclaim => "reclaim",
            WorkflowOperation::Return => "return",
            WorkflowOperation::ModifyAttachments => "modify_attachments",
            WorkflowOperation::UpdateSubmission => "update_submission",
        }
    }

    /// Phrase used in user-facing messages.
    pub fn verb(self) -> &'static str {
        match self {
            WorkflowOperation::ListSubmissions => "list submissions for",
            WorkflowOperation::GetSubmission => "load",
            WorkflowOperation::TurnIn => "turn in",
            WorkflowOperation::Reclaim => "unsubmit",
            WorkflowOperation::Return => "return",
            WorkflowOperation::ModifyAttachments => "change attachments on",
            WorkflowOperation::UpdateSubmission => "save grades on",
        }
    }
}

impl fmt::Display for WorkflowOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supersession scope: a newer operation under the same key cancels the older.
/// List operations carry no user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub assignment_id: AssignmentId,
    pub user_id: Option<UserId>,
}

impl OperationKey {
    pub fn for_assignment(assignment_id: AssignmentId) -> Self {
        Self {
            assignment_id,
            user_id: None,
        }
    }

    pub fn for_submission(assignment_id: AssignmentId, user_id: UserId) -> Self {
        Self {
            assignment_id,
            user_id: Some(user_id),
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user_id {
            Some(user_id) => write!(f, "{}/{}", self.assignment_id, user_id),
            None => write!(f, "{}/*", self.assignment_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationUpdate<T> {
    InProgress,
    Completed(T),
    Failed(WorkflowError),
}

impl<T> OperationUpdate<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationUpdate::InProgress)
    }

    pub fn into_result(self) -> Option<Result<T, WorkflowError>> {
        match self {
            OperationUpdate::InProgress => None,
            OperationUpdate::Completed(value) => Some(Ok(value)),
            OperationUpdate::Failed(err) => Some(Err(err)),
        }
    }
}
