use aet_core::model::{ClassId, Lesson, LessonId, ValidatedLesson, VisualSchedule};

use super::SqliteRepository;
use super::mapping::{
    LESSON_COLUMNS, db_err, id_to_i64, lesson_id_from_i64, map_lesson_row, schedule_to_json,
};
use crate::repository::{LessonRepository, StorageError};

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<Lesson, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO lessons (class_id, topic, objective, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_to_i64("class_id", lesson.class_id.value())?)
        .bind(&lesson.topic)
        .bind(&lesson.objective)
        .bind(&lesson.content)
        .bind(lesson.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = lesson_id_from_i64(res.last_insert_rowid())?;
        Ok(lesson.clone().assign_id(id))
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = ?1"))
            .bind(id_to_i64("lesson_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn list_lessons(&self, class_id: ClassId, limit: u32) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE class_id = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        ))
        .bind(id_to_i64("class_id", class_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_lesson_row).collect()
    }

    async fn set_visual_schedule(
        &self,
        id: LessonId,
        schedule: &VisualSchedule,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE lessons SET visual_schedule = ?1 WHERE id = ?2")
            .bind(schedule_to_json(schedule)?)
            .bind(id_to_i64("lesson_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM lessons WHERE id = ?1")
            .bind(id_to_i64("lesson_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
