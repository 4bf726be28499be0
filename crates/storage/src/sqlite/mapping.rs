use aet_core::framework::SubcategoryId;
use aet_core::model::{
    Class, ClassId, Lesson, LessonDraft, LessonId, ProgressRecord, Student, StudentId,
    StudentProfile, VisualSchedule,
};
use aet_core::progression::ProgressionLevel;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Map driver errors, turning foreign key violations into `Conflict`.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn class_id_from_i64(v: i64) -> Result<ClassId, StorageError> {
    Ok(ClassId::new(i64_to_u64("class_id", v)?))
}

pub(crate) fn student_id_from_i64(v: i64) -> Result<StudentId, StorageError> {
    Ok(StudentId::new(i64_to_u64("student_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

fn age_from_i64(field: &'static str, v: Option<i64>) -> Result<Option<u8>, StorageError> {
    v.map(|age| {
        u8::try_from(age).map_err(|_| StorageError::Serialization(format!("invalid {field}: {age}")))
    })
    .transpose()
}

pub(crate) const CLASS_COLUMNS: &str = "id, name, description, age_min, age_max, created_at";

pub(crate) fn map_class_row(row: &SqliteRow) -> Result<Class, StorageError> {
    Class::from_persisted(
        class_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get("name").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        age_from_i64("age_min", row.try_get("age_min").map_err(ser)?)?,
        age_from_i64("age_max", row.try_get("age_max").map_err(ser)?)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) const STUDENT_COLUMNS: &str = "id, class_id, name, date_of_birth, diagnoses, strengths, \
     challenges, interests, sensory_needs, communication_style, support_strategies, \
     calming_strategies, triggers, teacher_notes, created_at, updated_at";

pub(crate) fn map_student_row(row: &SqliteRow) -> Result<Student, StorageError> {
    let profile = StudentProfile {
        diagnoses: row.try_get("diagnoses").map_err(ser)?,
        strengths: row.try_get("strengths").map_err(ser)?,
        challenges: row.try_get("challenges").map_err(ser)?,
        interests: row.try_get("interests").map_err(ser)?,
        sensory_needs: row.try_get("sensory_needs").map_err(ser)?,
        communication_style: row.try_get("communication_style").map_err(ser)?,
        support_strategies: row.try_get("support_strategies").map_err(ser)?,
        calming_strategies: row.try_get("calming_strategies").map_err(ser)?,
        triggers: row.try_get("triggers").map_err(ser)?,
        teacher_notes: row.try_get("teacher_notes").map_err(ser)?,
    };

    Student::from_persisted(
        student_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<Option<i64>, _>("class_id")
            .map_err(ser)?
            .map(class_id_from_i64)
            .transpose()?,
        row.try_get("name").map_err(ser)?,
        row.try_get("date_of_birth").map_err(ser)?,
        profile,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) const PROGRESS_COLUMNS: &str =
    "student_id, subcategory_id, level, completed, plan, updated_at";

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let subcategory: String = row.try_get("subcategory_id").map_err(ser)?;
    let level: i64 = row.try_get("level").map_err(ser)?;
    Ok(ProgressRecord::from_persisted(
        student_id_from_i64(row.try_get("student_id").map_err(ser)?)?,
        SubcategoryId::parse(&subcategory).map_err(ser)?,
        ProgressionLevel::from_i64(level).map_err(ser)?,
        row.try_get::<i64, _>("completed").map_err(ser)? != 0,
        row.try_get("plan").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) const LESSON_COLUMNS: &str =
    "id, class_id, topic, objective, content, visual_schedule, created_at";

pub(crate) fn schedule_to_json(schedule: &VisualSchedule) -> Result<String, StorageError> {
    serde_json::to_string(schedule).map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let schedule = row
        .try_get::<Option<String>, _>("visual_schedule")
        .map_err(ser)?
        .map(|json| serde_json::from_str::<VisualSchedule>(&json).map_err(ser))
        .transpose()?;
    let draft = LessonDraft {
        topic: row.try_get("topic").map_err(ser)?,
        objective: row.try_get("objective").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
    };

    Lesson::from_persisted(
        lesson_id_from_i64(row.try_get("id").map_err(ser)?)?,
        class_id_from_i64(row.try_get("class_id").map_err(ser)?)?,
        draft,
        schedule,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
