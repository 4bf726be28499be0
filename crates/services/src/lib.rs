#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod class_service;
pub mod error;
pub mod lesson_service;
pub mod plan_service;
pub mod progress_service;
pub mod student_service;

pub use aet_core::Clock;

pub use ai::{AiAssistant, AiConfig, AiLimits, AiUsageReport, PictogramConfig};
pub use app_services::{AppServices, ServicesConfig};
pub use class_service::ClassService;
pub use error::{
    AiError, AiUsageError, AppServicesError, ClassServiceError, LessonServiceError,
    PictogramError, ProgressServiceError, StudentServiceError,
};
pub use lesson_service::{DEFAULT_HISTORY_LIMIT, LessonService};
pub use plan_service::PlanService;
pub use progress_service::ProgressService;
pub use student_service::StudentService;
