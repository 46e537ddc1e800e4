//! Screen state for one assignment's submission list and the pure reducer over it.

use chrono::{DateTime, Utc};
use client_core::{
    policy::{can_return, return_dialog_variant, trailing_status},
    ReturnDialog, TrailingStatus, WorkflowOperation,
};
use shared::domain::{Assignment, Submission, SubmissionState, UserId};

use super::events::{UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenState {
    pub assignment: Option<Assignment>,
    pub submissions: Vec<Submission>,
    /// At least one list load has succeeded.
    pub loaded: bool,
    pub loading: bool,
    /// Replaces the list when nothing was ever loaded.
    pub error: Option<UiError>,
    /// Transient; the list stays on screen.
    pub notice: Option<UiError>,
    pub selected: Option<UserId>,
    pub pending_grade: Option<i64>,
    pub busy: Option<WorkflowOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRow {
    pub user_id: UserId,
    pub state: SubmissionState,
    pub status: TrailingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDetail {
    pub submission: Submission,
    pub status: TrailingStatus,
    pub dialog: ReturnDialog,
    pub can_return: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnBlocked {
    NothingSelected,
    Busy,
    NotTurnedIn,
    GradeUnchanged,
}

impl ReturnBlocked {
    pub fn message(&self) -> &'static str {
        match self {
            ReturnBlocked::NothingSelected => "No submission is selected.",
            ReturnBlocked::Busy => "Another change to this submission is still in progress.",
            ReturnBlocked::NotTurnedIn => "Only turned-in work can be returned.",
            ReturnBlocked::GradeUnchanged => {
                "This grade was already returned. Change the grade to return again."
            }
        }
    }
}

pub fn reduce(state: &ScreenState, event: UiEvent) -> ScreenState {
    let mut next = state.clone();
    match event {
        UiEvent::AssignmentLoaded(assignment) => {
            next.assignment = Some(assignment);
        }
        UiEvent::RefreshRequested => {
            next.loading = true;
            next.notice = None;
        }
        UiEvent::SubmissionsLoaded(submissions) => {
            next.submissions = submissions;
            next.loaded = true;
            next.loading = false;
            next.error = None;
        }
        UiEvent::SubmissionsFailed(error) => {
            next.loading = false;
            if next.loaded {
                next.notice = Some(UiError::from_workflow(UiErrorContext::Refresh, &error));
            } else {
                next.error = Some(UiError::from_workflow(UiErrorContext::InitialLoad, &error));
            }
        }
        UiEvent::SubmissionSelected(user_id) => {
            next.pending_grade = next
                .submissions
                .iter()
                .find(|submission| submission.user_id == user_id)
                .and_then(|submission| submission.draft_grade.or(submission.assigned_grade));
            next.selected = Some(user_id);
        }
        UiEvent::PendingGradeChanged(grade) => {
            next.pending_grade = grade;
        }
        UiEvent::OperationStarted(operation) => {
            next.busy = Some(operation);
            next.notice = None;
        }
        UiEvent::SubmissionChanged(submission) => {
            match next
                .submissions
                .iter_mut()
                .find(|existing| existing.id == submission.id)
            {
                Some(existing) => *existing = submission,
                None => next.submissions.push(submission),
            }
            next.busy = None;
        }
        UiEvent::OperationFailed { operation, error } => {
            next.busy = None;
            next.notice = Some(UiError::from_workflow(
                UiErrorContext::Action(operation),
                &error,
            ));
        }
        UiEvent::OperationAbandoned(operation) => {
            if next.busy == Some(operation) {
                next.busy = None;
            }
        }
    }
    next
}

/// Derived per render; nothing here is stored in the state.
pub fn rows(state: &ScreenState, now: DateTime<Utc>) -> Vec<SubmissionRow> {
    let Some(assignment) = &state.assignment else {
        return Vec::new();
    };
    state
        .submissions
        .iter()
        .map(|submission| SubmissionRow {
            user_id: submission.user_id.clone(),
            state: submission.state,
            status: trailing_status(assignment, submission, now),
        })
        .collect()
}

pub fn selected_detail(state: &ScreenState, now: DateTime<Utc>) -> Option<SubmissionDetail> {
    let assignment = state.assignment.as_ref()?;
    let user_id = state.selected.as_ref()?;
    let submission = state
        .submissions
        .iter()
        .find(|submission| &submission.user_id == user_id)?;

    Some(SubmissionDetail {
        submission: submission.clone(),
        status: trailing_status(assignment, submission, now),
        dialog: return_dialog_variant(assignment, submission, state.pending_grade),
        can_return: state.busy.is_none()
            && can_return(assignment, submission, state.pending_grade),
    })
}

/// The selected detail when its return affordance is enabled.
pub fn return_request(
    state: &ScreenState,
    now: DateTime<Utc>,
) -> Result<SubmissionDetail, ReturnBlocked> {
    let detail = selected_detail(state, now).ok_or(ReturnBlocked::NothingSelected)?;
    if detail.can_return {
        return Ok(detail);
    }
    Err(if state.busy.is_some() {
        ReturnBlocked::Busy
    } else if detail.submission.state != SubmissionState::TurnedIn {
        ReturnBlocked::NotTurnedIn
    } else {
        ReturnBlocked::GradeUnchanged
    })
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
