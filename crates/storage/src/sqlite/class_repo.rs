use aet_core::model::{Class, ClassId, ValidatedClass};

use super::SqliteRepository;
use super::mapping::{CLASS_COLUMNS, class_id_from_i64, db_err, id_to_i64, map_class_row};
use crate::repository::{ClassRepository, StorageError};

#[async_trait::async_trait]
impl ClassRepository for SqliteRepository {
    async fn insert_class(&self, class: &ValidatedClass) -> Result<Class, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO classes (name, description, age_min, age_max, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(&class.name)
        .bind(&class.description)
        .bind(class.age_range.map(|r| i64::from(r.min())))
        .bind(class.age_range.map(|r| i64::from(r.max())))
        .bind(class.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = class_id_from_i64(res.last_insert_rowid())?;
        Ok(class.clone().assign_id(id))
    }

    async fn update_class(&self, class: &Class) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE classes
            SET name = ?1, description = ?2, age_min = ?3, age_max = ?4
            WHERE id = ?5
            ",
        )
        .bind(class.name())
        .bind(class.description())
        .bind(class.age_range().map(|r| i64::from(r.min())))
        .bind(class.age_range().map(|r| i64::from(r.max())))
        .bind(id_to_i64("class_id", class.id().value())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError> {
        let row = sqlx::query(&format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = ?1"))
            .bind(id_to_i64("class_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_class_row).transpose()
    }

    async fn list_classes(&self) -> Result<Vec<Class>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes ORDER BY name COLLATE NOCASE ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_class_row).collect()
    }

    async fn delete_class(&self, id: ClassId) -> Result<(), StorageError> {
        // Students are unassigned and lessons dropped by the foreign keys.
        let res = sqlx::query("DELETE FROM classes WHERE id = ?1")
            .bind(id_to_i64("class_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
