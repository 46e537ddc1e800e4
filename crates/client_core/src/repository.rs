use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::domain::{
    AssignmentId, CourseId, Material, Submission, SubmissionRef, SubmissionUpdate, UserId,
};

/// Remote source of truth for submissions. Implementations own transport
/// concerns, including timeouts; failures surface as `anyhow` errors and are
/// classified by [`crate::error::WorkflowError::from_remote`].
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn get_submissions(
        &self,
        course_id: &CourseId,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<Submission>>;

    async fn get_submission(
        &self,
        course_id: &CourseId,
        assignment_id: &AssignmentId,
        user_id: &UserId,
    ) -> Result<Submission>;

    async fn modify_attachments(
        &self,
        submission: &SubmissionRef,
        attachments: &[Material],
    ) -> Result<Submission>;

    async fn update_submission(
        &self,
        submission: &SubmissionRef,
        updates: &SubmissionUpdate,
    ) -> Result<Submission>;

    async fn reclaim_submission(&self, submission: &SubmissionRef) -> Result<()>;

    async fn return_submission(&self, submission: &SubmissionRef) -> Result<()>;

    async fn turn_in_submission(&self, submission: &SubmissionRef) -> Result<()>;

    /// `None` when nobody is signed in.
    async fn current_user_id(&self) -> Result<Option<UserId>>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
