//! Mapping from service errors to JSON error responses.

use std::fmt;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use aet_core::model::ParseIdError;
use services::{
    AiError, AiUsageError, ClassServiceError, LessonServiceError, ProgressServiceError,
    StudentServiceError,
};
use storage::StorageError;

/// An error response: `{"error": code, "message": text}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl fmt::Display) -> Self {
        Self {
            status,
            code,
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: impl fmt::Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn not_found(message: impl fmt::Display) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn upstream(message: impl fmt::Display) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "upstream_error", message)
    }

    fn internal(message: impl fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, code = self.code, "{}", self.message);
        } else {
            warn!(status = %self.status, code = self.code, "{}", self.message);
        }
        let body = Json(json!({ "error": self.code, "message": self.message }));
        (self.status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::not_found(err),
            StorageError::Conflict => Self::new(StatusCode::CONFLICT, "conflict", err),
            other => Self::internal(other),
        }
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Disabled => Self::new(StatusCode::SERVICE_UNAVAILABLE, "ai_disabled", err),
            AiError::Usage(AiUsageError::Storage(inner)) => inner.into(),
            AiError::Usage(usage) => Self::new(StatusCode::TOO_MANY_REQUESTS, "rate_limited", usage),
            other => Self::upstream(other),
        }
    }
}

impl From<ClassServiceError> for ApiError {
    fn from(err: ClassServiceError) -> Self {
        match err {
            ClassServiceError::NotFound(_) => Self::not_found(err),
            ClassServiceError::Class(_) => Self::bad_request(err),
            ClassServiceError::Storage(inner) => inner.into(),
            other => Self::internal(other),
        }
    }
}

impl From<StudentServiceError> for ApiError {
    fn from(err: StudentServiceError) -> Self {
        match err {
            StudentServiceError::NotFound(_) | StudentServiceError::ClassNotFound(_) => {
                Self::not_found(err)
            }
            StudentServiceError::Student(_) => Self::bad_request(err),
            StudentServiceError::Storage(inner) => inner.into(),
            other => Self::internal(other),
        }
    }
}

impl From<ProgressServiceError> for ApiError {
    fn from(err: ProgressServiceError) -> Self {
        match err {
            ProgressServiceError::StudentNotFound(_)
            | ProgressServiceError::ClassNotFound(_)
            | ProgressServiceError::Framework(_) => Self::not_found(err),
            ProgressServiceError::Ai(inner) => inner.into(),
            ProgressServiceError::Storage(inner) => inner.into(),
            other => Self::internal(other),
        }
    }
}

impl From<LessonServiceError> for ApiError {
    fn from(err: LessonServiceError) -> Self {
        match err {
            LessonServiceError::ClassNotFound(_) | LessonServiceError::NotFound(_) => {
                Self::not_found(err)
            }
            LessonServiceError::Lesson(_) => Self::bad_request(err),
            LessonServiceError::Schedule(_) => Self::upstream(err),
            LessonServiceError::Ai(inner) => inner.into(),
            LessonServiceError::Storage(inner) => inner.into(),
            other => Self::internal(other),
        }
    }
}

impl From<ParseIdError> for ApiError {
    fn from(err: ParseIdError) -> Self {
        Self::bad_request(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aet_core::model::ClassId;

    #[test]
    fn maps_service_errors_to_statuses() {
        let cases: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                ClassServiceError::NotFound(ClassId::new(1)).into(),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (AiError::Disabled.into(), StatusCode::SERVICE_UNAVAILABLE, "ai_disabled"),
            (
                AiError::Usage(AiUsageError::CooldownActive { remaining_secs: 3 }).into(),
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
            ),
            (AiError::EmptyResponse.into(), StatusCode::BAD_GATEWAY, "upstream_error"),
            (
                StorageError::Connection("db gone".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }
}
