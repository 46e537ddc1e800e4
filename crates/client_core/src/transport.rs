//! reqwest-backed repository for the coursework REST API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{
        Assignment, AssignmentId, CourseId, Material, Submission, SubmissionRef, SubmissionUpdate,
        UserId,
    },
    error::{ApiError, ApiErrorEnvelope},
    protocol::{
        AttachmentDto, CourseWorkDto, GradePatchRequest, ListStudentSubmissionsResponse,
        ModifyAttachmentsRequest, ProtocolError, StudentSubmissionDto, UserProfileResponse,
    },
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{config::ClientSettings, repository::SubmissionRepository};

/// Guard against a server that keeps handing out page tokens.
const MAX_PAGES: usize = 200;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no access token configured")]
    MissingAccessToken,
    #[error("HTTP {status}{}", .error.as_ref().map(|e| format!(": {}", e.message)).unwrap_or_default())]
    Status {
        status: u16,
        error: Option<ApiError>,
    },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub struct HttpSubmissionRepository {
    http: Client,
    base_url: Url,
    access_token: Option<String>,
    page_size: u32,
}

impl HttpSubmissionRepository {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(settings.connect_timeout())
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: settings.base_url()?,
            access_token: settings.access_token.clone(),
            page_size: settings.page_size,
        })
    }

    pub async fn fetch_assignment(
        &self,
        course_id: &CourseId,
        assignment_id: &AssignmentId,
    ) -> Result<Assignment> {
        let path = format!("v1/courses/{course_id}/courseWork/{assignment_id}");
        let dto: CourseWorkDto = self.send_json(self.request(Method::GET, &path)?).await?;
        Ok(Assignment::try_from(dto).map_err(TransportError::from)?)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid request path '{path}'"))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(TransportError::MissingAccessToken)?;
        Ok(self
            .http
            .request(method, self.url(path)?)
            .bearer_auth(token))
    }

    fn submissions_path(course_id: &CourseId, assignment_id: &AssignmentId) -> String {
        format!("v1/courses/{course_id}/courseWork/{assignment_id}/studentSubmissions")
    }

    fn submission_path(submission: &SubmissionRef) -> String {
        format!(
            "{}/{}",
            Self::submissions_path(&submission.course_id, &submission.assignment_id),
            submission.submission_id
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);
        warn!(status = status.as_u16(), "coursework api request failed");
        Err(TransportError::Status {
            status: status.as_u16(),
            error,
        }
        .into())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn post_action(&self, submission: &SubmissionRef, action: &str) -> Result<()> {
        let path = format!("{}:{action}", Self::submission_path(submission));
        debug!(submission_id = %submission.submission_id, action, "posting submission action");
        self.send(self.request(Method::POST, &path)?.json(&EmptyBody {}))
            .await?;
        Ok(())
    }

    async fn list_page(
        &self,
        course_id: &CourseId,
        assignment_id: &AssignmentId,
        user_id: Option<&UserId>,
        page_token: Option<&str>,
    ) -> Result<ListStudentSubmissionsResponse> {
        let mut request = self
            .request(
                Method::GET,
                &Self::submissions_path(course_id, assignment_id),
            )?
            .query(&[("pageSize", self.page_size.to_string())]);
        if let Some(user_id) = user_id {
            request = request.query(&[("userId", user_id.as_str())]);
        }
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        self.send_json(request).await
    }
}

#[derive(Serialize)]
struct EmptyBody {}

fn into_submission(dto: StudentSubmissionDto) -> Result<Submission> {
    Ok(Submission::try_from(dto).map_err(TransportError::from)?)
}

#[async_trait]
impl SubmissionRepository for HttpSubmissionRepository {
    async fn get_submissions(
        &self,
        course_id: &CourseId,
        assignment_id: &AssignmentId,
    ) -> Result<Vec<Submission>> {
        let mut submissions = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self
                .list_page(course_id, assignment_id, None, page_token.as_deref())
                .await?;
            for dto in page.student_submissions {
                submissions.push(into_submission(dto)?);
            }
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(submissions),
            }
        }

        warn!(%course_id, %assignment_id, "stopped paging after {MAX_PAGES} pages");
        Ok(submissions)
    }

    async fn get_submission(
        &self,
        course_id: &CourseId,
        assignment_id: &AssignmentId,
        user_id: &UserId,
    ) -> Result<Submission> {
        let page = self
            .list_page(course_id, assignment_id, Some(user_id), None)
            .await?;
        let dto = page
            .student_submissions
            .into_iter()
            .find(|dto| dto.user_id == user_id.as_str())
            .ok_or(TransportError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                error: None,
            })?;
        into_submission(dto)
    }

    async fn modify_attachments(
        &self,
        submission: &SubmissionRef,
        attachments: &[Material],
    ) -> Result<Submission> {
        let path = format!("{}:modifyAttachments", Self::submission_path(submission));
        let body = ModifyAttachmentsRequest {
            attachments: attachments.iter().map(AttachmentDto::from).collect(),
        };
        let dto: StudentSubmissionDto = self
            .send_json(self.request(Method::POST, &path)?.json(&body))
            .await?;
        into_submission(dto)
    }

    async fn update_submission(
        &self,
        submission: &SubmissionRef,
        updates: &SubmissionUpdate,
    ) -> Result<Submission> {
        let body = GradePatchRequest::from(updates);
        let dto: StudentSubmissionDto = self
            .send_json(
                self.request(Method::PATCH, &Self::submission_path(submission))?
                    .query(&[("updateMask", updates.update_mask())])
                    .json(&body),
            )
            .await?;
        into_submission(dto)
    }

    async fn reclaim_submission(&self, submission: &SubmissionRef) -> Result<()> {
        self.post_action(submission, "reclaim").await
    }

    async fn return_submission(&self, submission: &SubmissionRef) -> Result<()> {
        self.post_action(submission, "return").await
    }

    async fn turn_in_submission(&self, submission: &SubmissionRef) -> Result<()> {
        self.post_action(submission, "turnIn").await
    }

    async fn current_user_id(&self) -> Result<Option<UserId>> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        match self
            .send_json::<UserProfileResponse>(self.request(Method::GET, "v1/userProfiles/me")?)
            .await
        {
            Ok(profile) => Ok(Some(UserId(profile.id))),
            Err(err) => match err.downcast_ref::<TransportError>() {
                Some(TransportError::Status { status: 401, .. }) => Ok(None),
                _ => Err(err),
            },
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
