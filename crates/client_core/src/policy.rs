//! Grading policy: lateness, gradability, status text and return-dialog choice.
//!
//! Everything here is a pure function of the values passed in. Callers supply
//! `now` explicitly wherever the answer depends on the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::domain::{Assignment, Submission, SubmissionState};

pub fn is_gradable(assignment: &Assignment) -> bool {
    assignment.max_points.is_some_and(|points| points > 0)
}

/// Upper bound for grades when the assignment is gradable.
pub fn grade_ceiling(assignment: &Assignment) -> Option<i64> {
    assignment.max_points.filter(|points| *points > 0)
}

pub fn is_late(assignment: &Assignment, turn_in_time: DateTime<Utc>) -> bool {
    assignment
        .due_time
        .is_some_and(|due_time| turn_in_time > due_time)
}

pub fn is_grade_in_range(max_points: i64, grade: i64) -> bool {
    (0..=max_points).contains(&grade)
}

/// Classification behind the status text shown next to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrailingStatus {
    Draft {
        draft_grade: i64,
        max_points: i64,
        /// Set only when a different grade was committed earlier.
        previous_grade: Option<i64>,
    },
    Graded {
        grade: i64,
        max_points: i64,
        late: bool,
    },
    TurnedIn {
        late: bool,
    },
    ReturnedUngraded,
    Missing,
    Assigned,
}

impl TrailingStatus {
    pub fn label(&self) -> String {
        match self {
            TrailingStatus::Draft {
                draft_grade,
                max_points,
                ..
            } => format!("Draft {draft_grade}/{max_points}"),
            TrailingStatus::Graded {
                grade,
                max_points,
                late,
            } => with_late_marker(format!("{grade}/{max_points}"), *late),
            TrailingStatus::TurnedIn { late } => with_late_marker("Turned in".to_string(), *late),
            TrailingStatus::ReturnedUngraded => "Returned".to_string(),
            TrailingStatus::Missing => "Missing".to_string(),
            TrailingStatus::Assigned => "Assigned".to_string(),
        }
    }

    pub fn sub_label(&self) -> Option<String> {
        match self {
            TrailingStatus::Draft {
                max_points,
                previous_grade: Some(previous),
                ..
            } => Some(format!("previously {previous}/{max_points}")),
            _ => None,
        }
    }
}

fn with_late_marker(text: String, late: bool) -> String {
    if late {
        format!("{text} (Late)")
    } else {
        text
    }
}

pub fn trailing_status(
    assignment: &Assignment,
    submission: &Submission,
    now: DateTime<Utc>,
) -> TrailingStatus {
    if let Some(max_points) = grade_ceiling(assignment) {
        if let Some(draft_grade) = submission.draft_grade {
            return TrailingStatus::Draft {
                draft_grade,
                max_points,
                previous_grade: submission
                    .assigned_grade
                    .filter(|assigned| *assigned != draft_grade),
            };
        }
        if let Some(grade) = submission.assigned_grade {
            return TrailingStatus::Graded {
                grade,
                max_points,
                late: submission.is_late(),
            };
        }
    }

    match submission.state {
        SubmissionState::TurnedIn => TrailingStatus::TurnedIn {
            late: submission.is_late(),
        },
        SubmissionState::Returned => TrailingStatus::ReturnedUngraded,
        SubmissionState::Created => match assignment.due_time {
            Some(due_time) if due_time < now => TrailingStatus::Missing,
            _ => TrailingStatus::Assigned,
        },
    }
}

/// Confirmation message variant shown before returning work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnDialog {
    ReturnUnsubmitted,
    ReturnWithoutGrade,
    ReturnUpdateGrade,
    ReturnStandard,
}

impl ReturnDialog {
    pub fn message(&self) -> &'static str {
        match self {
            ReturnDialog::ReturnUnsubmitted => {
                "This student hasn't turned anything in. Return anyway?"
            }
            ReturnDialog::ReturnWithoutGrade => "Return this work without a grade?",
            ReturnDialog::ReturnUpdateGrade => {
                "The student will be notified that their grade was updated."
            }
            ReturnDialog::ReturnStandard => "Return this work and share the grade?",
        }
    }
}

pub fn return_dialog_variant(
    assignment: &Assignment,
    submission: &Submission,
    new_grade: Option<i64>,
) -> ReturnDialog {
    if submission.state == SubmissionState::Created {
        return ReturnDialog::ReturnUnsubmitted;
    }
    let Some(new_grade) = new_grade.filter(|_| is_gradable(assignment)) else {
        return ReturnDialog::ReturnWithoutGrade;
    };
    match submission.assigned_grade {
        Some(assigned) if assigned != new_grade => ReturnDialog::ReturnUpdateGrade,
        _ => ReturnDialog::ReturnStandard,
    }
}

/// Whether the return affordance is enabled for the given pending grade.
pub fn can_return(assignment: &Assignment, submission: &Submission, new_grade: Option<i64>) -> bool {
    if submission.state != SubmissionState::TurnedIn {
        return false;
    }
    if !is_gradable(assignment) {
        return true;
    }
    match submission.assigned_grade {
        None => true,
        Some(assigned) => new_grade != Some(assigned),
    }
}

#[cfg(test)]
#[path = "tests/policy_tests.rs"]
mod tests;
