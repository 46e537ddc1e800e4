use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use shared::domain::{
    Assignment, AssignmentId, CourseId, Material, Submission, SubmissionId, SubmissionRef,
    SubmissionState, SubmissionUpdate, UserId, WorkType,
};
use tokio::sync::Notify;

use crate::{error::WorkflowError, repository::SubmissionRepository};

pub(crate) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

pub(crate) fn assignment(max_points: Option<i64>, due_time: Option<DateTime<Utc>>) -> Assignment {
    Assignment {
        id: AssignmentId::new("work-1"),
        course_id: CourseId::new("course-1"),
        title: "Lab report".into(),
        max_points,
        due_time,
        work_type: WorkType::Assignment,
    }
}

pub(crate) fn submission(state: SubmissionState) -> Submission {
    Submission {
        id: SubmissionId::new("sub-1"),
        assignment_id: AssignmentId::new("work-1"),
        course_id: CourseId::new("course-1"),
        user_id: UserId::new("student-1"),
        state,
        assigned_grade: None,
        draft_grade: None,
        late: None,
        attachments: Vec::new(),
        creation_time: at(1, 9),
        update_time: at(1, 9),
    }
}

pub(crate) fn student_submission(user: &str, state: SubmissionState) -> Submission {
    let mut submission = submission(state);
    submission.id = SubmissionId::new(format!("sub-{user}"));
    submission.user_id = UserId::new(user);
    submission
}

pub(crate) fn drive_file(id: &str) -> Material {
    Material::DriveFile {
        id: id.into(),
        title: format!("{id}.pdf"),
        alternate_link: None,
    }
}

pub(crate) fn link(url: &str) -> Material {
    Material::Link {
        url: url.into(),
        title: None,
    }
}

/// In-memory repository that records every call and can hold calls open.
pub(crate) struct FakeRepository {
    calls: Mutex<Vec<String>>,
    user: Mutex<Option<UserId>>,
    stored: Mutex<Option<Submission>>,
    list_responses: Mutex<VecDeque<Vec<Submission>>>,
    gates: Mutex<HashMap<&'static str, VecDeque<Arc<Notify>>>>,
    failures: Mutex<HashMap<&'static str, WorkflowError>>,
}

impl FakeRepository {
    pub(crate) fn signed_in(user: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            user: Mutex::new(Some(UserId::new(user))),
            stored: Mutex::new(None),
            list_responses: Mutex::new(VecDeque::new()),
            gates: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
        })
    }

    pub(crate) fn signed_out() -> Arc<Self> {
        let repository = Self::signed_in("nobody");
        *repository.user.lock().unwrap() = None;
        repository
    }

    pub(crate) fn store(&self, submission: Submission) {
        *self.stored.lock().unwrap() = Some(submission);
    }

    pub(crate) fn queue_list(&self, submissions: Vec<Submission>) {
        self.list_responses.lock().unwrap().push_back(submissions);
    }

    /// The next call to `method` waits until the returned notify is signalled.
    pub(crate) fn hold_next(&self, method: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(gate.clone());
        gate
    }

    pub(crate) fn fail(&self, method: &'static str, err: WorkflowError) {
        self.failures.lock().unwrap().insert(method, err);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn remote_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call != "current_user_id")
            .collect()
    }

    async fn enter(&self, method: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(method.to_string());
        let gate = self
            .gates
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failures.lock().unwrap().get(method) {
            Some(err) => Err(anyhow::Error::new(err.clone())),
            None => Ok(()),
        }
    }

    fn stored_or_err(&self) -> Result<Submission> {
        self.stored
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("no stored submission"))
    }
}

#[async_trait]
impl SubmissionRepository for FakeRepository {
    async fn get_submissions(
        &self,
        _course_id: &CourseId,
        _assignment_id: &AssignmentId,
    ) -> Result<Vec<Submission>> {
        self.enter("get_submissions").await?;
        Ok(self
            .list_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn get_submission(
        &self,
        _course_id: &CourseId,
        _assignment_id: &AssignmentId,
        _user_id: &UserId,
    ) -> Result<Submission> {
        self.enter("get_submission").await?;
        self.stored_or_err()
    }

    async fn modify_attachments(
        &self,
        _submission: &SubmissionRef,
        attachments: &[Material],
    ) -> Result<Submission> {
        self.enter("modify_attachments").await?;
        let mut stored = self.stored_or_err()?;
        stored.attachments = attachments.to_vec();
        self.store(stored.clone());
        Ok(stored)
    }

    async fn update_submission(
        &self,
        _submission: &SubmissionRef,
        updates: &SubmissionUpdate,
    ) -> Result<Submission> {
        self.enter("update_submission").await?;
        let mut stored = self.stored_or_err()?;
        if updates.assigned_grade.is_some() {
            stored.assigned_grade = updates.assigned_grade;
        }
        if updates.draft_grade.is_some() {
            stored.draft_grade = updates.draft_grade;
        }
        self.store(stored.clone());
        Ok(stored)
    }

    async fn reclaim_submission(&self, _submission: &SubmissionRef) -> Result<()> {
        self.enter("reclaim_submission").await
    }

    async fn return_submission(&self, _submission: &SubmissionRef) -> Result<()> {
        self.enter("return_submission").await
    }

    async fn turn_in_submission(&self, _submission: &SubmissionRef) -> Result<()> {
        self.enter("turn_in_submission").await
    }

    async fn current_user_id(&self) -> Result<Option<UserId>> {
        self.enter("current_user_id").await?;
        Ok(self.user.lock().unwrap().clone())
    }
}
