//! Shared error types for the services crate.

use thiserror::Error;

use aet_core::framework::FrameworkError;
use aet_core::model::{ClassError, ClassId, LessonError, LessonId, StudentError, StudentId};
use aet_core::prompt::ScheduleParseError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the language model client and assistant.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI assistance is not configured")]
    Disabled,
    #[error("AI service returned an empty response")]
    EmptyResponse,
    #[error("AI request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Usage(#[from] AiUsageError),
}

/// Errors emitted by `AiUsageService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiUsageError {
    #[error("daily AI request cap of {cap} reached")]
    DailyCapReached { cap: u32 },
    #[error("AI cooldown active, retry in {remaining_secs}s")]
    CooldownActive { remaining_secs: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by pictogram lookups.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PictogramError {
    #[error("pictogram base URL is invalid: {0}")]
    InvalidBaseUrl(String),
    #[error("pictogram lookup failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ClassService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClassServiceError {
    #[error("class {0} not found")]
    NotFound(ClassId),
    #[error(transparent)]
    Class(#[from] ClassError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudentServiceError {
    #[error("student {0} not found")]
    NotFound(StudentId),
    #[error("class {0} not found")]
    ClassNotFound(ClassId),
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService` and `PlanService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("student {0} not found")]
    StudentNotFound(StudentId),
    #[error("class {0} not found")]
    ClassNotFound(ClassId),
    #[error(transparent)]
    Framework(#[from] FrameworkError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error("class {0} not found")]
    ClassNotFound(ClassId),
    #[error("lesson {0} not found")]
    NotFound(LessonId),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error("could not read a visual schedule from the AI reply: {0}")]
    Schedule(#[from] ScheduleParseError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error(transparent)]
    Pictogram(#[from] PictogramError),
}
