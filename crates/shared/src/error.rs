use serde::{Deserialize, Serialize};

/// Canonical status strings the coursework API puts in its error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    FailedPrecondition,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    Aborted,
    AlreadyExists,
    ResourceExhausted,
    Unavailable,
    DeadlineExceeded,
    Internal,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default = "unknown_status")]
    pub status: ErrorCode,
}

fn unknown_status() -> ErrorCode {
    ErrorCode::Unknown
}

impl ApiError {
    pub fn new(code: u16, status: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status,
        }
    }
}

/// `{"error": {...}}` wrapper returned on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiError,
}
