//! Wire shapes of the coursework REST API and their mapping into domain records.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    Assignment, AssignmentId, CourseId, Material, Submission, SubmissionId, SubmissionState,
    SubmissionUpdate, UserId, WorkType,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("submission {id} is missing field `{field}`")]
    MissingField { id: String, field: &'static str },
    #[error("course work {id} has an invalid due date")]
    InvalidDueDate { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStateDto {
    New,
    Created,
    TurnedIn,
    Returned,
    ReclaimedByStudent,
    /// Also absorbs states this client does not know.
    #[serde(other)]
    SubmissionStateUnspecified,
}

impl From<SubmissionStateDto> for SubmissionState {
    fn from(value: SubmissionStateDto) -> Self {
        match value {
            SubmissionStateDto::TurnedIn => SubmissionState::TurnedIn,
            SubmissionStateDto::Returned => SubmissionState::Returned,
            // Reclaimed work is editable again; no separate state is tracked.
            SubmissionStateDto::SubmissionStateUnspecified
            | SubmissionStateDto::New
            | SubmissionStateDto::Created
            | SubmissionStateDto::ReclaimedByStudent => SubmissionState::Created,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileDto {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeVideoDto {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDto {
    pub form_url: String,
    #[serde(default)]
    pub title: String,
}

/// One attachment slot; exactly one field is set on well-formed payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_file: Option<DriveFileDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub you_tube_video: Option<YouTubeVideoDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<FormDto>,
}

impl AttachmentDto {
    pub fn into_material(self) -> Option<Material> {
        if let Some(file) = self.drive_file {
            return Some(Material::DriveFile {
                id: file.id,
                title: file.title,
                alternate_link: file.alternate_link,
            });
        }
        if let Some(link) = self.link {
            return Some(Material::Link {
                url: link.url,
                title: link.title,
            });
        }
        if let Some(video) = self.you_tube_video {
            return Some(Material::YouTubeVideo {
                id: video.id,
                title: video.title,
            });
        }
        self.form.map(|form| Material::Form {
            form_url: form.form_url,
            title: form.title,
        })
    }
}

impl From<&Material> for AttachmentDto {
    fn from(value: &Material) -> Self {
        match value {
            Material::DriveFile {
                id,
                title,
                alternate_link,
            } => Self {
                drive_file: Some(DriveFileDto {
                    id: id.clone(),
                    title: title.clone(),
                    alternate_link: alternate_link.clone(),
                }),
                ..Self::default()
            },
            Material::Link { url, title } => Self {
                link: Some(LinkDto {
                    url: url.clone(),
                    title: title.clone(),
                }),
                ..Self::default()
            },
            Material::YouTubeVideo { id, title } => Self {
                you_tube_video: Some(YouTubeVideoDto {
                    id: id.clone(),
                    title: title.clone(),
                }),
                ..Self::default()
            },
            Material::Form { form_url, title } => Self {
                form: Some(FormDto {
                    form_url: form_url.clone(),
                    title: title.clone(),
                }),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmissionDto {
    #[serde(default)]
    pub attachments: Vec<AttachmentDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubmissionDto {
    pub id: String,
    pub course_id: String,
    pub course_work_id: String,
    pub user_id: String,
    pub state: SubmissionStateDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_grade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_grade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_submission: Option<AssignmentSubmissionDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl TryFrom<StudentSubmissionDto> for Submission {
    type Error = ProtocolError;

    fn try_from(value: StudentSubmissionDto) -> Result<Self, Self::Error> {
        let creation_time = value.creation_time.ok_or_else(|| ProtocolError::MissingField {
            id: value.id.clone(),
            field: "creationTime",
        })?;
        let update_time = value.update_time.unwrap_or(creation_time);
        let attachments = value
            .assignment_submission
            .map(|body| {
                body.attachments
                    .into_iter()
                    .filter_map(AttachmentDto::into_material)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Submission {
            id: SubmissionId(value.id),
            assignment_id: AssignmentId(value.course_work_id),
            course_id: CourseId(value.course_id),
            user_id: UserId(value.user_id),
            state: value.state.into(),
            assigned_grade: value.assigned_grade.map(points_from_wire),
            draft_grade: value.draft_grade.map(points_from_wire),
            late: value.late,
            attachments,
            creation_time,
            update_time,
        })
    }
}

fn points_from_wire(points: f64) -> i64 {
    points.round() as i64
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStudentSubmissionsResponse {
    #[serde(default)]
    pub student_submissions: Vec<StudentSubmissionDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyAttachmentsRequest {
    /// Full attachment list after the change.
    pub attachments: Vec<AttachmentDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradePatchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_grade: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_grade: Option<f64>,
}

impl From<&SubmissionUpdate> for GradePatchRequest {
    fn from(value: &SubmissionUpdate) -> Self {
        Self {
            assigned_grade: value.assigned_grade.map(|grade| grade as f64),
            draft_grade: value.draft_grade.map(|grade| grade as f64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateDto {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeOfDayDto {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWorkDto {
    pub id: String,
    pub course_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<TimeOfDayDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkType>,
}

impl TryFrom<CourseWorkDto> for Assignment {
    type Error = ProtocolError;

    fn try_from(value: CourseWorkDto) -> Result<Self, Self::Error> {
        let due_time = match value.due_date {
            Some(date) => {
                let time = value.due_time.unwrap_or_default();
                let naive = NaiveDate::from_ymd_opt(date.year, date.month, date.day)
                    .zip(NaiveTime::from_hms_opt(time.hours, time.minutes, time.seconds))
                    .map(|(day, clock)| day.and_time(clock))
                    .ok_or_else(|| ProtocolError::InvalidDueDate {
                        id: value.id.clone(),
                    })?;
                Some(Utc.from_utc_datetime(&naive))
            }
            None => None,
        };

        Ok(Assignment {
            id: AssignmentId(value.id),
            course_id: CourseId(value.course_id),
            title: value.title,
            max_points: value
                .max_points
                .map(points_from_wire)
                .filter(|points| *points > 0),
            due_time,
            work_type: value.work_type.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
