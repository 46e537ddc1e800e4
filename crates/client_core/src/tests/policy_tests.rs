use super::*;
use crate::test_support::{assignment, at, submission};

#[test]
fn gradable_requires_positive_max_points() {
    assert!(is_gradable(&assignment(Some(100), None)));
    assert!(!is_gradable(&assignment(Some(0), None)));
    assert!(!is_gradable(&assignment(None, None)));
}

#[test]
fn late_only_after_due_time() {
    let due = at(5, 12);
    let with_due = assignment(Some(100), Some(due));

    assert!(is_late(&with_due, at(5, 13)));
    assert!(!is_late(&with_due, due));
    assert!(!is_late(&with_due, at(5, 11)));
    assert!(!is_late(&assignment(Some(100), None), at(30, 0)));
}

#[test]
fn draft_grade_wins_and_mentions_previous_grade() {
    let mut graded = submission(SubmissionState::Returned);
    graded.draft_grade = Some(90);
    graded.assigned_grade = Some(80);

    let status = trailing_status(&assignment(Some(100), None), &graded, at(2, 0));

    assert_eq!(
        status,
        TrailingStatus::Draft {
            draft_grade: 90,
            max_points: 100,
            previous_grade: Some(80),
        }
    );
    assert_eq!(status.label(), "Draft 90/100");
    assert_eq!(status.sub_label().as_deref(), Some("previously 80/100"));
}

#[test]
fn draft_equal_to_assigned_grade_has_no_previous_line() {
    let mut graded = submission(SubmissionState::TurnedIn);
    graded.draft_grade = Some(80);
    graded.assigned_grade = Some(80);

    let status = trailing_status(&assignment(Some(100), None), &graded, at(2, 0));

    assert_eq!(status.sub_label(), None);
}

#[test]
fn assigned_grade_shows_late_marker() {
    let mut graded = submission(SubmissionState::Returned);
    graded.assigned_grade = Some(70);
    graded.late = Some(true);

    let status = trailing_status(&assignment(Some(100), None), &graded, at(2, 0));

    assert_eq!(
        status,
        TrailingStatus::Graded {
            grade: 70,
            max_points: 100,
            late: true,
        }
    );
    assert_eq!(status.label(), "70/100 (Late)");
}

#[test]
fn grades_are_ignored_for_ungraded_assignments() {
    let mut turned_in = submission(SubmissionState::TurnedIn);
    turned_in.draft_grade = Some(5);
    turned_in.assigned_grade = Some(5);

    let status = trailing_status(&assignment(None, None), &turned_in, at(2, 0));

    assert_eq!(status, TrailingStatus::TurnedIn { late: false });
    assert_eq!(status.label(), "Turned in");
}

#[test]
fn returned_ungraded_work() {
    let status = trailing_status(
        &assignment(None, None),
        &submission(SubmissionState::Returned),
        at(2, 0),
    );

    assert_eq!(status, TrailingStatus::ReturnedUngraded);
}

#[test]
fn missing_when_due_time_passed_without_turn_in() {
    let past_due = assignment(Some(100), Some(at(1, 12)));
    let created = submission(SubmissionState::Created);

    assert_eq!(
        trailing_status(&past_due, &created, at(2, 0)),
        TrailingStatus::Missing
    );
    assert_eq!(
        trailing_status(&past_due, &created, at(1, 11)),
        TrailingStatus::Assigned
    );
    assert_eq!(
        trailing_status(&assignment(Some(100), None), &created, at(2, 0)),
        TrailingStatus::Assigned
    );
}

#[test]
fn trailing_status_is_deterministic() {
    let fixture = assignment(Some(100), Some(at(1, 12)));
    let mut late = submission(SubmissionState::TurnedIn);
    late.late = Some(true);

    let first = trailing_status(&fixture, &late, at(3, 0));
    for _ in 0..10 {
        assert_eq!(trailing_status(&fixture, &late, at(3, 0)), first);
    }
    assert_eq!(first, TrailingStatus::TurnedIn { late: true });
}

#[test]
fn unsubmitted_work_always_gets_unsubmitted_dialog() {
    let mut created = submission(SubmissionState::Created);
    created.assigned_grade = Some(70);

    for grade in [None, Some(70), Some(85)] {
        assert_eq!(
            return_dialog_variant(&assignment(Some(100), None), &created, grade),
            ReturnDialog::ReturnUnsubmitted
        );
    }
}

#[test]
fn ungraded_or_missing_grade_returns_without_grade() {
    let turned_in = submission(SubmissionState::TurnedIn);

    assert_eq!(
        return_dialog_variant(&assignment(None, None), &turned_in, Some(10)),
        ReturnDialog::ReturnWithoutGrade
    );
    assert_eq!(
        return_dialog_variant(&assignment(Some(100), None), &turned_in, None),
        ReturnDialog::ReturnWithoutGrade
    );
}

#[test]
fn changed_grade_gets_update_dialog() {
    let mut graded = submission(SubmissionState::TurnedIn);
    graded.assigned_grade = Some(70);

    assert_eq!(
        return_dialog_variant(&assignment(Some(100), None), &graded, Some(85)),
        ReturnDialog::ReturnUpdateGrade
    );
}

#[test]
fn first_grade_gets_standard_dialog() {
    let turned_in = submission(SubmissionState::TurnedIn);

    assert_eq!(
        return_dialog_variant(&assignment(Some(100), None), &turned_in, Some(85)),
        ReturnDialog::ReturnStandard
    );
}

#[test]
fn return_enabled_only_for_turned_in_work() {
    let graded_assignment = assignment(Some(100), None);
    let ungraded_assignment = assignment(None, None);
    let turned_in = submission(SubmissionState::TurnedIn);

    assert!(can_return(&ungraded_assignment, &turned_in, None));
    assert!(can_return(&graded_assignment, &turned_in, None));
    assert!(can_return(&graded_assignment, &turned_in, Some(85)));
    assert!(!can_return(
        &graded_assignment,
        &submission(SubmissionState::Created),
        Some(85)
    ));
    assert!(!can_return(
        &ungraded_assignment,
        &submission(SubmissionState::Returned),
        None
    ));
}

#[test]
fn return_disabled_when_grade_is_unchanged() {
    let mut graded = submission(SubmissionState::TurnedIn);
    graded.assigned_grade = Some(70);
    let graded_assignment = assignment(Some(100), None);

    assert!(!can_return(&graded_assignment, &graded, Some(70)));
    assert!(can_return(&graded_assignment, &graded, Some(71)));
    assert!(can_return(&graded_assignment, &graded, None));
}
