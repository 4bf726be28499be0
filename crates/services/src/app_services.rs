use std::sync::Arc;

use storage::Storage;
use storage::sqlite::normalize_database_url;

use crate::Clock;
use crate::ai::{
    AiAssistant, AiConfig, AiLimits, AiUsageService, ArasaacClient, ChatCompletionsClient,
    PictogramConfig, PictogramSource, TextGenerator,
};
use crate::class_service::ClassService;
use crate::error::AppServicesError;
use crate::lesson_service::LessonService;
use crate::plan_service::PlanService;
use crate::progress_service::ProgressService;
use crate::student_service::StudentService;

/// Everything needed to reach the outside world.
#[derive(Clone, Debug, Default)]
pub struct ServicesConfig {
    pub ai: AiConfig,
    pub limits: AiLimits,
    pub pictograms: PictogramConfig,
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    classes: Arc<ClassService>,
    students: Arc<StudentService>,
    progress: Arc<ProgressService>,
    plans: Arc<PlanService>,
    lessons: Arc<LessonService>,
    assistant: Arc<AiAssistant>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or an HTTP
    /// client cannot be built.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: ServicesConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&normalize_database_url(db_url)).await?;
        Self::new(storage, clock, config)
    }

    /// Build services with the HTTP-backed AI and pictogram clients.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if an HTTP client cannot be built.
    pub fn new(
        storage: Storage,
        clock: Clock,
        config: ServicesConfig,
    ) -> Result<Self, AppServicesError> {
        let generator = Arc::new(ChatCompletionsClient::new(config.ai)?);
        let pictograms = Arc::new(ArasaacClient::new(config.pictograms)?);
        Ok(Self::with_clients(
            storage,
            clock,
            config.limits,
            generator,
            pictograms,
        ))
    }

    /// Build services around caller-provided clients.
    #[must_use]
    pub fn with_clients(
        storage: Storage,
        clock: Clock,
        limits: AiLimits,
        generator: Arc<dyn TextGenerator>,
        pictograms: Arc<dyn PictogramSource>,
    ) -> Self {
        let usage = Arc::new(AiUsageService::new(
            clock,
            Arc::clone(&storage.ai_usage),
            limits,
        ));
        let assistant = AiAssistant::new(generator, usage);

        let progress = ProgressService::new(
            clock,
            Arc::clone(&storage.classes),
            Arc::clone(&storage.students),
            Arc::clone(&storage.progress),
        );
        let plans = PlanService::new(clock, progress.clone(), assistant.clone());
        let lessons = LessonService::new(clock, &storage, assistant.clone(), pictograms);
        let classes = ClassService::new(
            clock,
            Arc::clone(&storage.classes),
            Arc::clone(&storage.students),
        );
        let students = StudentService::new(
            clock,
            Arc::clone(&storage.classes),
            Arc::clone(&storage.students),
        );

        Self {
            classes: Arc::new(classes),
            students: Arc::new(students),
            progress: Arc::new(progress),
            plans: Arc::new(plans),
            lessons: Arc::new(lessons),
            assistant: Arc::new(assistant),
        }
    }

    #[must_use]
    pub fn classes(&self) -> Arc<ClassService> {
        Arc::clone(&self.classes)
    }

    #[must_use]
    pub fn students(&self) -> Arc<StudentService> {
        Arc::clone(&self.students)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn plans(&self) -> Arc<PlanService> {
        Arc::clone(&self.plans)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn assistant(&self) -> Arc<AiAssistant> {
        Arc::clone(&self.assistant)
    }
}
