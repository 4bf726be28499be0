use aet_core::framework::SubcategoryId;
use aet_core::model::{ClassId, ProgressRecord, StudentId};

use super::SqliteRepository;
use super::mapping::{PROGRESS_COLUMNS, db_err, id_to_i64, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        student_id: StudentId,
        subcategory_id: &SubcategoryId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE student_id = ?1 AND subcategory_id = ?2"
        ))
        .bind(id_to_i64("student_id", student_id.value())?)
        .bind(subcategory_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self, student_id: StudentId) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE student_id = ?1 ORDER BY subcategory_id"
        ))
        .bind(id_to_i64("student_id", student_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn list_progress_for_class(
        &self,
        class_id: ClassId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT p.student_id, p.subcategory_id, p.level, p.completed, p.plan, p.updated_at
            FROM progress p
            JOIN students s ON s.id = p.student_id
            WHERE s.class_id = ?1
            ORDER BY p.student_id, p.subcategory_id
            ",
        )
        .bind(id_to_i64("class_id", class_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress (student_id, subcategory_id, level, completed, plan, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(student_id, subcategory_id) DO UPDATE SET
                level = excluded.level,
                completed = excluded.completed,
                plan = excluded.plan,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id_to_i64("student_id", record.student_id().value())?)
        .bind(record.subcategory_id().as_str())
        .bind(i64::from(record.level().as_u8()))
        .bind(i64::from(record.completed()))
        .bind(record.plan())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_progress(
        &self,
        student_id: StudentId,
        subcategory_id: &SubcategoryId,
    ) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM progress WHERE student_id = ?1 AND subcategory_id = ?2")
            .bind(id_to_i64("student_id", student_id.value())?)
            .bind(subcategory_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
