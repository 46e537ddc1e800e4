use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(CourseId);
id_newtype!(AssignmentId);
id_newtype!(SubmissionId);
id_newtype!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    /// Editable by the student. Reclaimed submissions land here as well.
    Created,
    TurnedIn,
    Returned,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubmissionState::Created => "created",
            SubmissionState::TurnedIn => "turned in",
            SubmissionState::Returned => "returned",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkType {
    Assignment,
    ShortAnswerQuestion,
    MultipleChoiceQuestion,
    /// Also absorbs work types this client does not know.
    #[default]
    #[serde(alias = "COURSE_WORK_TYPE_UNSPECIFIED", other)]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub course_id: CourseId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub work_type: WorkType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    DriveFile {
        id: String,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alternate_link: Option<String>,
    },
    Link {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    YouTubeVideo {
        id: String,
        title: String,
    },
    Form {
        form_url: String,
        title: String,
    },
}

/// Identity used to detect duplicate attachments on one submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MaterialIdentity {
    DriveFile(String),
    Link(String),
    YouTubeVideo(String),
    Form(String),
}

impl fmt::Display for MaterialIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialIdentity::DriveFile(id) => write!(f, "drive file {id}"),
            MaterialIdentity::Link(url) => write!(f, "link {url}"),
            MaterialIdentity::YouTubeVideo(id) => write!(f, "video {id}"),
            MaterialIdentity::Form(url) => write!(f, "form {url}"),
        }
    }
}

impl Material {
    pub fn identity(&self) -> MaterialIdentity {
        match self {
            Material::DriveFile { id, .. } => MaterialIdentity::DriveFile(id.clone()),
            Material::Link { url, .. } => MaterialIdentity::Link(url.clone()),
            Material::YouTubeVideo { id, .. } => MaterialIdentity::YouTubeVideo(id.clone()),
            Material::Form { form_url, .. } => MaterialIdentity::Form(form_url.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub assignment_id: AssignmentId,
    pub course_id: CourseId,
    pub user_id: UserId,
    pub state: SubmissionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_grade: Option<i64>,
    /// Staged locally; only a return or update commits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_grade: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late: Option<bool>,
    #[serde(default)]
    pub attachments: Vec<Material>,
    pub creation_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Submission {
    pub fn submission_ref(&self) -> SubmissionRef {
        SubmissionRef {
            course_id: self.course_id.clone(),
            assignment_id: self.assignment_id.clone(),
            submission_id: self.id.clone(),
        }
    }

    pub fn is_late(&self) -> bool {
        self.late.unwrap_or(false)
    }
}

/// Addresses one submission on the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionRef {
    pub course_id: CourseId,
    pub assignment_id: AssignmentId,
    pub submission_id: SubmissionId,
}

/// Fields written by an `updateSubmission` call. `None` leaves the field out of
/// the update mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionUpdate {
    pub assigned_grade: Option<i64>,
    pub draft_grade: Option<i64>,
}

impl SubmissionUpdate {
    pub fn update_mask(&self) -> String {
        let mut fields = Vec::new();
        if self.assigned_grade.is_some() {
            fields.push("assignedGrade");
        }
        if self.draft_grade.is_some() {
            fields.push("draftGrade");
        }
        fields.join(",")
    }
}
