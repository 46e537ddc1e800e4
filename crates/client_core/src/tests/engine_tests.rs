use super::*;
use crate::test_support::{assignment, at, drive_file, link, submission};

#[test]
fn turn_in_only_from_created() {
    let graded = assignment(Some(100), Some(at(5, 12)));

    for state in [SubmissionState::TurnedIn, SubmissionState::Returned] {
        let err = turn_in(&submission(state), &graded, at(4, 0)).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition {
                operation: WorkflowOperation::TurnIn,
                ..
            }
        ));
    }

    let transition = turn_in(&submission(SubmissionState::Created), &graded, at(4, 0))
        .expect("created work can be turned in");
    assert_eq!(transition.steps(), &[RemoteStep::TurnIn]);
    let turned_in = transition.expected();
    assert_eq!(turned_in.state, SubmissionState::TurnedIn);
    assert_eq!(turned_in.late, Some(false));
}

#[test]
fn turn_in_after_due_time_is_late() {
    let graded = assignment(Some(100), Some(at(5, 12)));

    let turned_in = turn_in(&submission(SubmissionState::Created), &graded, at(5, 13))
        .expect("turn in")
        .expected();

    assert_eq!(turned_in.late, Some(true));
    assert_eq!(turned_in.update_time, at(5, 13));
}

#[test]
fn turn_in_without_due_time_is_never_late() {
    let turned_in = turn_in(
        &submission(SubmissionState::Created),
        &assignment(Some(100), None),
        at(28, 23),
    )
    .expect("turn in")
    .expected();

    assert_eq!(turned_in.late, Some(false));
}

#[test]
fn late_flag_survives_reclaim_and_return_cycles() {
    let graded = assignment(Some(100), Some(at(5, 12)));
    let owner = UserId::new("student-1");

    let turned_in = turn_in(&submission(SubmissionState::Created), &graded, at(6, 0))
        .expect("turn in")
        .expected();
    let reclaimed = reclaim(&turned_in, &owner).expect("reclaim").expected();
    assert_eq!(reclaimed.state, SubmissionState::Created);
    assert_eq!(reclaimed.late, Some(true));

    let on_time_again = turn_in(&reclaimed, &assignment(Some(100), None), at(6, 1))
        .expect("re-turn in")
        .expected();
    assert_eq!(on_time_again.late, Some(false));
}

#[test]
fn reclaim_keeps_assigned_grade() {
    let mut returned = submission(SubmissionState::Returned);
    returned.assigned_grade = Some(88);
    returned.late = Some(true);

    let reclaimed = reclaim(&returned, &UserId::new("student-1"))
        .expect("owner can reclaim")
        .expected();

    assert_eq!(reclaimed.state, SubmissionState::Created);
    assert_eq!(reclaimed.assigned_grade, Some(88));
    assert_eq!(reclaimed.late, Some(true));
}

#[test]
fn reclaim_rejected_for_created_work_or_other_users() {
    let owner = UserId::new("student-1");

    assert!(matches!(
        reclaim(&submission(SubmissionState::Created), &owner),
        Err(WorkflowError::InvalidTransition {
            operation: WorkflowOperation::Reclaim,
            state: SubmissionState::Created,
            ..
        })
    ));
    assert!(matches!(
        reclaim(
            &submission(SubmissionState::TurnedIn),
            &UserId::new("teacher-1")
        ),
        Err(WorkflowError::InvalidTransition {
            operation: WorkflowOperation::Reclaim,
            state: SubmissionState::TurnedIn,
            ..
        })
    ));
}

#[test]
fn return_requires_turned_in_work() {
    for state in [SubmissionState::Created, SubmissionState::Returned] {
        let err = return_submission(&submission(state), &assignment(Some(100), None), Some(50))
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition {
                operation: WorkflowOperation::Return,
                ..
            }
        ));
    }
}

#[test]
fn return_rejects_out_of_range_grades() {
    let turned_in = submission(SubmissionState::TurnedIn);
    let graded = assignment(Some(100), None);

    assert_eq!(
        return_submission(&turned_in, &graded, Some(101)).unwrap_err(),
        WorkflowError::OutOfRange {
            grade: 101,
            max_points: 100,
        }
    );
    assert_eq!(
        return_submission(&turned_in, &graded, Some(-1)).unwrap_err(),
        WorkflowError::OutOfRange {
            grade: -1,
            max_points: 100,
        }
    );
    assert_eq!(turned_in.state, SubmissionState::TurnedIn);
    assert_eq!(turned_in.assigned_grade, None);
}

#[test]
fn graded_return_writes_grade_before_returning() {
    let mut turned_in = submission(SubmissionState::TurnedIn);
    turned_in.draft_grade = Some(100);

    let transition =
        return_submission(&turned_in, &assignment(Some(100), None), Some(100)).expect("return");

    assert_eq!(
        transition.steps(),
        &[
            RemoteStep::UpdateSubmission(SubmissionUpdate {
                assigned_grade: Some(100),
                draft_grade: None,
            }),
            RemoteStep::Return,
        ]
    );
    let returned = transition.expected();
    assert_eq!(returned.state, SubmissionState::Returned);
    assert_eq!(returned.assigned_grade, Some(100));
    assert_eq!(returned.draft_grade, None);
}

#[test]
fn ungraded_return_skips_grade_update() {
    let transition = return_submission(
        &submission(SubmissionState::TurnedIn),
        &assignment(None, None),
        Some(500),
    )
    .expect("grade ignored for ungraded work");

    assert_eq!(transition.steps(), &[RemoteStep::Return]);
    assert_eq!(transition.expected().assigned_grade, None);
}

#[test]
fn merge_prefers_repository_record_but_overlays_transition_fields() {
    let turned_in = submission(SubmissionState::TurnedIn);
    let transition =
        return_submission(&turned_in, &assignment(Some(100), None), Some(90)).expect("return");

    let mut from_server = turned_in.clone();
    from_server.update_time = at(9, 9);
    from_server.attachments = vec![link("https://example.com/a")];

    let merged = transition.merge(Some(from_server));
    assert_eq!(merged.state, SubmissionState::Returned);
    assert_eq!(merged.assigned_grade, Some(90));
    assert_eq!(merged.update_time, at(9, 9));
    assert_eq!(merged.attachments.len(), 1);
}

#[test]
fn attachments_editable_only_before_turn_in() {
    let err = modify_attachments(
        &submission(SubmissionState::TurnedIn),
        vec![drive_file("a")],
        &[],
    )
    .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            operation: WorkflowOperation::ModifyAttachments,
            ..
        }
    ));
}

#[test]
fn attachments_remove_then_add() {
    let mut draft = submission(SubmissionState::Created);
    draft.attachments = vec![drive_file("a"), link("https://example.com/b")];

    let transition = modify_attachments(
        &draft,
        vec![drive_file("c")],
        &[MaterialIdentity::DriveFile("a".into())],
    )
    .expect("modify");

    let expected = vec![link("https://example.com/b"), drive_file("c")];
    assert_eq!(
        transition.steps(),
        &[RemoteStep::ModifyAttachments(expected.clone())]
    );
    assert_eq!(transition.expected().attachments, expected);
}

#[test]
fn duplicate_attachments_are_rejected() {
    let mut draft = submission(SubmissionState::Created);
    draft.attachments = vec![drive_file("a")];

    assert_eq!(
        modify_attachments(&draft, vec![drive_file("a")], &[]).unwrap_err(),
        WorkflowError::DuplicateAttachment {
            identity: "drive file a".into(),
        }
    );
    assert!(matches!(
        modify_attachments(
            &draft,
            vec![link("https://x.test"), link("https://x.test")],
            &[]
        ),
        Err(WorkflowError::DuplicateAttachment { .. })
    ));
    assert!(
        modify_attachments(
            &draft,
            vec![drive_file("a")],
            &[MaterialIdentity::DriveFile("a".into())]
        )
        .is_ok(),
        "re-adding a removed attachment is not a duplicate"
    );
}

#[test]
fn patch_grade_is_local_and_keeps_state() {
    let turned_in = submission(SubmissionState::TurnedIn);

    let patched = patch_grade(&turned_in, &assignment(Some(100), None), Some(95));
    assert_eq!(patched.draft_grade, Some(95));
    assert_eq!(patched.state, SubmissionState::TurnedIn);

    let ignored = patch_grade(&turned_in, &assignment(None, None), Some(95));
    assert_eq!(ignored, turned_in);
}

#[test]
fn commit_draft_requires_gradable_assignment_and_draft() {
    let mut staged = submission(SubmissionState::TurnedIn);

    assert!(matches!(
        commit_draft(&staged, &assignment(Some(100), None)),
        Err(WorkflowError::InvalidTransition { .. })
    ));

    staged.draft_grade = Some(40);
    assert!(matches!(
        commit_draft(&staged, &assignment(None, None)),
        Err(WorkflowError::InvalidTransition { .. })
    ));
    assert_eq!(
        commit_draft(&staged, &assignment(Some(30), None)).unwrap_err(),
        WorkflowError::OutOfRange {
            grade: 40,
            max_points: 30,
        }
    );

    let committed = commit_draft(&staged, &assignment(Some(100), None))
        .expect("commit")
        .expected();
    assert_eq!(committed.assigned_grade, Some(40));
    assert_eq!(committed.draft_grade, None);
    assert_eq!(committed.state, SubmissionState::TurnedIn);
}
