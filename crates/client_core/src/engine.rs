//! Submission state machine.
//!
//! Each transition validates its preconditions against the values passed in and
//! returns a [`Transition`]: the remote steps to run plus the local effect to
//! apply once they succeed. Nothing is cached between calls.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use shared::domain::{
    Assignment, Material, MaterialIdentity, Submission, SubmissionState, SubmissionUpdate, UserId,
};

use crate::{
    error::WorkflowError,
    policy::{grade_ceiling, is_grade_in_range, is_late},
    types::WorkflowOperation,
};

/// One repository call a transition needs, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStep {
    TurnIn,
    Reclaim,
    UpdateSubmission(SubmissionUpdate),
    Return,
    ModifyAttachments(Vec<Material>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    TurnedIn { late: bool, at: DateTime<Utc> },
    Reclaimed,
    Returned { assigned_grade: Option<i64> },
    AttachmentsReplaced { attachments: Vec<Material> },
    GradeCommitted { assigned_grade: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    operation: WorkflowOperation,
    original: Submission,
    steps: Vec<RemoteStep>,
    effect: Effect,
}

impl Transition {
    pub fn operation(&self) -> WorkflowOperation {
        self.operation
    }

    pub fn original(&self) -> &Submission {
        &self.original
    }

    pub fn steps(&self) -> &[RemoteStep] {
        &self.steps
    }

    /// Post-transition submission assuming every step succeeded and the
    /// repository returned nothing newer.
    pub fn expected(&self) -> Submission {
        self.merge(None)
    }

    /// Folds the latest record the repository returned (if any) under the
    /// fields this transition owns. The local draft grade always survives
    /// unless the transition committed it.
    pub fn merge(&self, latest: Option<Submission>) -> Submission {
        let from_remote = latest.is_some();
        let mut merged = latest.unwrap_or_else(|| self.original.clone());
        merged.draft_grade = self.original.draft_grade;

        match &self.effect {
            Effect::TurnedIn { late, at } => {
                merged.state = SubmissionState::TurnedIn;
                merged.late = Some(*late);
                merged.update_time = *at;
            }
            Effect::Reclaimed => {
                merged.state = SubmissionState::Created;
                merged.assigned_grade = self.original.assigned_grade;
                merged.late = self.original.late;
            }
            Effect::Returned { assigned_grade } => {
                merged.state = SubmissionState::Returned;
                if assigned_grade.is_some() {
                    merged.assigned_grade = *assigned_grade;
                }
                merged.draft_grade = None;
            }
            Effect::AttachmentsReplaced { attachments } => {
                if !from_remote {
                    merged.attachments = attachments.clone();
                }
            }
            Effect::GradeCommitted { assigned_grade } => {
                merged.assigned_grade = Some(*assigned_grade);
                merged.draft_grade = None;
            }
        }

        merged
    }
}

pub fn turn_in(
    submission: &Submission,
    assignment: &Assignment,
    now: DateTime<Utc>,
) -> Result<Transition, WorkflowError> {
    require_state(
        submission,
        WorkflowOperation::TurnIn,
        &[SubmissionState::Created],
        "it has already been turned in",
    )?;

    Ok(Transition {
        operation: WorkflowOperation::TurnIn,
        original: submission.clone(),
        steps: vec![RemoteStep::TurnIn],
        effect: Effect::TurnedIn {
            late: is_late(assignment, now),
            at: now,
        },
    })
}

pub fn reclaim(submission: &Submission, caller: &UserId) -> Result<Transition, WorkflowError> {
    require_state(
        submission,
        WorkflowOperation::Reclaim,
        &[SubmissionState::TurnedIn, SubmissionState::Returned],
        "nothing has been turned in",
    )?;
    if &submission.user_id != caller {
        return Err(WorkflowError::invalid_transition(
            WorkflowOperation::Reclaim,
            submission.state,
            "only the student who owns it can unsubmit",
        ));
    }

    Ok(Transition {
        operation: WorkflowOperation::Reclaim,
        original: submission.clone(),
        steps: vec![RemoteStep::Reclaim],
        effect: Effect::Reclaimed,
    })
}

/// Returns turned-in work, writing `new_grade` first when the assignment is
/// gradable. A grade passed for an ungraded assignment is ignored.
pub fn return_submission(
    submission: &Submission,
    assignment: &Assignment,
    new_grade: Option<i64>,
) -> Result<Transition, WorkflowError> {
    require_state(
        submission,
        WorkflowOperation::Return,
        &[SubmissionState::TurnedIn],
        "only turned-in work can be returned",
    )?;

    let assigned_grade = match grade_ceiling(assignment) {
        Some(max_points) => match new_grade {
            Some(grade) => Some(check_grade(max_points, grade)?),
            None => None,
        },
        None => None,
    };

    let mut steps = Vec::with_capacity(2);
    if let Some(grade) = assigned_grade {
        steps.push(RemoteStep::UpdateSubmission(SubmissionUpdate {
            assigned_grade: Some(grade),
            draft_grade: None,
        }));
    }
    steps.push(RemoteStep::Return);

    Ok(Transition {
        operation: WorkflowOperation::Return,
        original: submission.clone(),
        steps,
        effect: Effect::Returned { assigned_grade },
    })
}

/// Removes `remove` then appends `add`. An added material whose identity is
/// already present (or repeated within `add`) fails the whole change.
pub fn modify_attachments(
    submission: &Submission,
    add: Vec<Material>,
    remove: &[MaterialIdentity],
) -> Result<Transition, WorkflowError> {
    require_state(
        submission,
        WorkflowOperation::ModifyAttachments,
        &[SubmissionState::Created],
        "attachments are locked once work is turned in",
    )?;

    let mut attachments: Vec<Material> = submission
        .attachments
        .iter()
        .filter(|material| !remove.contains(&material.identity()))
        .cloned()
        .collect();
    let mut seen: HashSet<MaterialIdentity> =
        attachments.iter().map(Material::identity).collect();

    for material in add {
        let identity = material.identity();
        if !seen.insert(identity.clone()) {
            return Err(WorkflowError::DuplicateAttachment {
                identity: identity.to_string(),
            });
        }
        attachments.push(material);
    }

    Ok(Transition {
        operation: WorkflowOperation::ModifyAttachments,
        original: submission.clone(),
        steps: vec![RemoteStep::ModifyAttachments(attachments.clone())],
        effect: Effect::AttachmentsReplaced { attachments },
    })
}

/// Stages a draft grade locally. Ungraded assignments ignore the change.
pub fn patch_grade(
    submission: &Submission,
    assignment: &Assignment,
    draft_grade: Option<i64>,
) -> Submission {
    let mut patched = submission.clone();
    if grade_ceiling(assignment).is_some() {
        patched.draft_grade = draft_grade;
    }
    patched
}

/// Saves the staged draft as the assigned grade without returning the work.
pub fn commit_draft(
    submission: &Submission,
    assignment: &Assignment,
) -> Result<Transition, WorkflowError> {
    let Some(max_points) = grade_ceiling(assignment) else {
        return Err(WorkflowError::invalid_transition(
            WorkflowOperation::UpdateSubmission,
            submission.state,
            "the assignment is not graded",
        ));
    };
    let Some(draft_grade) = submission.draft_grade else {
        return Err(WorkflowError::invalid_transition(
            WorkflowOperation::UpdateSubmission,
            submission.state,
            "there is no draft grade to save",
        ));
    };
    let grade = check_grade(max_points, draft_grade)?;

    Ok(Transition {
        operation: WorkflowOperation::UpdateSubmission,
        original: submission.clone(),
        steps: vec![RemoteStep::UpdateSubmission(SubmissionUpdate {
            assigned_grade: Some(grade),
            draft_grade: None,
        })],
        effect: Effect::GradeCommitted {
            assigned_grade: grade,
        },
    })
}

fn require_state(
    submission: &Submission,
    operation: WorkflowOperation,
    allowed: &[SubmissionState],
    detail: &str,
) -> Result<(), WorkflowError> {
    if allowed.contains(&submission.state) {
        Ok(())
    } else {
        Err(WorkflowError::invalid_transition(
            operation,
            submission.state,
            detail,
        ))
    }
}

fn check_grade(max_points: i64, grade: i64) -> Result<i64, WorkflowError> {
    if is_grade_in_range(max_points, grade) {
        Ok(grade)
    } else {
        Err(WorkflowError::OutOfRange { grade, max_points })
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
