use std::collections::HashMap;
use std::sync::Arc;

use aet_core::links::rewrite_links;
use aet_core::model::{
    Class, ClassId, Lesson, LessonDraft, LessonId, Pictogram, ProgressRecord, StudentId,
    VisualSchedule,
};
use aet_core::prompt::{
    LessonRequest, lesson_plan_prompt, parse_schedule_reply, visual_schedule_prompt,
};
use aet_core::summary::class_focus;
use storage::repository::{
    ClassRepository, LessonRepository, ProgressRepository, StorageError, StudentRepository,
};
use tracing::{info, warn};

use crate::Clock;
use crate::ai::{AiAssistant, AiRequestKind, PictogramSource};
use crate::error::LessonServiceError;

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
/// Shared priorities sent with a lesson request.
const FOCUS_LIMIT: usize = 6;
/// Candidate subcategories taken per area and student.
const FOCUS_PER_AREA: usize = 1;

/// Whole-class lesson planning and visual schedules.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    classes: Arc<dyn ClassRepository>,
    students: Arc<dyn StudentRepository>,
    progress: Arc<dyn ProgressRepository>,
    lessons: Arc<dyn LessonRepository>,
    assistant: AiAssistant,
    pictograms: Arc<dyn PictogramSource>,
}

impl LessonService {
    #[must_use]
    pub fn new(
        clock: Clock,
        storage: &storage::Storage,
        assistant: AiAssistant,
        pictograms: Arc<dyn PictogramSource>,
    ) -> Self {
        Self {
            clock,
            classes: Arc::clone(&storage.classes),
            students: Arc::clone(&storage.students),
            progress: Arc::clone(&storage.progress),
            lessons: Arc::clone(&storage.lessons),
            assistant,
            pictograms,
        }
    }

    /// Ask the model for a lesson plan tailored to the class. The draft is
    /// returned for review and is not saved.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::ClassNotFound`, a validation error for a
    /// blank topic, or `LessonServiceError::Ai`.
    pub async fn generate_draft(
        &self,
        class_id: ClassId,
        request: LessonRequest,
    ) -> Result<LessonDraft, LessonServiceError> {
        let request = request.validate()?;
        let class = self.class(class_id).await?;
        let students = self.students.list_students(Some(class_id)).await?;

        let mut grouped: HashMap<StudentId, Vec<ProgressRecord>> = HashMap::new();
        for record in self.progress.list_progress_for_class(class_id).await? {
            grouped.entry(record.student_id()).or_default().push(record);
        }
        let focus = class_focus(
            students
                .iter()
                .map(|s| grouped.get(&s.id()).map_or(&[][..], Vec::as_slice)),
            FOCUS_PER_AREA,
            FOCUS_LIMIT,
        );

        let prompt = lesson_plan_prompt(&class, &students, &request, &focus);
        let reply = self
            .assistant
            .complete(AiRequestKind::LessonPlan, &prompt)
            .await?;

        Ok(LessonDraft {
            topic: request.topic,
            objective: request.objective,
            content: rewrite_links(&reply),
        })
    }

    /// # Errors
    ///
    /// Returns `LessonServiceError::ClassNotFound` or a validation error.
    pub async fn save(
        &self,
        class_id: ClassId,
        draft: LessonDraft,
    ) -> Result<Lesson, LessonServiceError> {
        let validated = draft.validate(class_id, self.clock.now())?;
        self.class(class_id).await?;
        Ok(self.lessons.insert_lesson(&validated).await?)
    }

    /// Saved lessons for a class, newest first.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::ClassNotFound` if the class is missing.
    pub async fn history(
        &self,
        class_id: ClassId,
        limit: u32,
    ) -> Result<Vec<Lesson>, LessonServiceError> {
        self.class(class_id).await?;
        Ok(self.lessons.list_lessons(class_id, limit).await?)
    }

    /// # Errors
    ///
    /// Returns `LessonServiceError::NotFound` if the lesson is missing.
    pub async fn get(&self, id: LessonId) -> Result<Lesson, LessonServiceError> {
        self.lessons
            .get_lesson(id)
            .await?
            .ok_or(LessonServiceError::NotFound(id))
    }

    /// # Errors
    ///
    /// Returns `LessonServiceError::NotFound` if the lesson is missing.
    pub async fn delete(&self, id: LessonId) -> Result<(), LessonServiceError> {
        self.lessons.delete_lesson(id).await.map_err(|err| match err {
            StorageError::NotFound => LessonServiceError::NotFound(id),
            other => other.into(),
        })
    }

    /// Build and store a visual schedule for a saved lesson, replacing any
    /// previous one.
    ///
    /// Steps whose keyword has no pictogram keep no picture. A failing lookup
    /// is treated the same way.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::NotFound`, `Ai`, or `Schedule` when the
    /// reply holds no usable steps.
    pub async fn generate_visual_schedule(
        &self,
        id: LessonId,
    ) -> Result<Lesson, LessonServiceError> {
        let mut lesson = self.get(id).await?;
        let reply = self
            .assistant
            .complete(AiRequestKind::VisualSchedule, &visual_schedule_prompt(&lesson))
            .await?;
        let proposed = parse_schedule_reply(&reply)?;

        let mut steps = Vec::with_capacity(proposed.len());
        for step in proposed {
            let pictogram = self.lookup(&step.keyword).await;
            steps.push((step, pictogram));
        }
        let schedule = VisualSchedule::build(steps)?;

        self.lessons.set_visual_schedule(id, &schedule).await?;
        info!(
            lesson = %id,
            steps = schedule.len(),
            pictograms = schedule.pictogram_count(),
            "visual schedule stored"
        );
        lesson.set_visual_schedule(schedule);
        Ok(lesson)
    }

    async fn lookup(&self, keyword: &str) -> Option<Pictogram> {
        match self.pictograms.search(keyword).await {
            Ok(found) => found,
            Err(err) => {
                warn!(keyword, error = %err, "pictogram lookup failed, continuing without one");
                None
            }
        }
    }

    async fn class(&self, id: ClassId) -> Result<Class, LessonServiceError> {
        self.classes
            .get_class(id)
            .await?
            .ok_or(LessonServiceError::ClassNotFound(id))
    }
}
