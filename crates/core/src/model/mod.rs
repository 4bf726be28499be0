mod class;
mod ids;
mod lesson;
mod progress;
mod student;

pub use ids::{ClassId, LessonId, ParseIdError, StudentId};

pub use class::{AgeRange, Class, ClassDraft, ClassError, MAX_CLASS_AGE, ValidatedClass};
pub use lesson::{
    Lesson, LessonDraft, LessonError, MAX_SCHEDULE_STEPS, Pictogram, ProposedStep, ScheduleStep,
    ValidatedLesson, VisualSchedule,
};
pub use progress::ProgressRecord;
pub use student::{Student, StudentDraft, StudentError, StudentProfile, ValidatedStudent};

/// Trim optional free text; blank becomes `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}
