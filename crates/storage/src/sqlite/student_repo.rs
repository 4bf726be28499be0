use aet_core::model::{ClassId, Student, StudentId, StudentProfile, ValidatedStudent};
use chrono::{DateTime, NaiveDate, Utc};

use super::SqliteRepository;
use super::mapping::{STUDENT_COLUMNS, db_err, id_to_i64, map_student_row, student_id_from_i64};
use crate::repository::{StorageError, StudentRepository};

/// Column values shared by insert and update.
struct StudentParams<'a> {
    class_id: Option<i64>,
    name: &'a str,
    date_of_birth: Option<NaiveDate>,
    profile: &'a StudentProfile,
    updated_at: DateTime<Utc>,
}

impl<'a> StudentParams<'a> {
    fn new(
        class_id: Option<ClassId>,
        name: &'a str,
        date_of_birth: Option<NaiveDate>,
        profile: &'a StudentProfile,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            class_id: class_id
                .map(|id| id_to_i64("class_id", id.value()))
                .transpose()?,
            name,
            date_of_birth,
            profile,
            updated_at,
        })
    }
}

#[async_trait::async_trait]
impl StudentRepository for SqliteRepository {
    async fn insert_student(&self, student: &ValidatedStudent) -> Result<Student, StorageError> {
        let p = StudentParams::new(
            student.class_id,
            &student.name,
            student.date_of_birth,
            &student.profile,
            student.created_at,
        )?;

        let res = sqlx::query(
            r"
            INSERT INTO students (
                class_id, name, date_of_birth, diagnoses, strengths, challenges, interests,
                sensory_needs, communication_style, support_strategies, calming_strategies,
                triggers, teacher_notes, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            ",
        )
        .bind(p.class_id)
        .bind(p.name)
        .bind(p.date_of_birth)
        .bind(p.profile.diagnoses.as_deref())
        .bind(p.profile.strengths.as_deref())
        .bind(p.profile.challenges.as_deref())
        .bind(p.profile.interests.as_deref())
        .bind(p.profile.sensory_needs.as_deref())
        .bind(p.profile.communication_style.as_deref())
        .bind(p.profile.support_strategies.as_deref())
        .bind(p.profile.calming_strategies.as_deref())
        .bind(p.profile.triggers.as_deref())
        .bind(p.profile.teacher_notes.as_deref())
        .bind(p.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = student_id_from_i64(res.last_insert_rowid())?;
        Ok(student.clone().assign_id(id))
    }

    async fn update_student(&self, student: &Student) -> Result<(), StorageError> {
        let p = StudentParams::new(
            student.class_id(),
            student.name(),
            student.date_of_birth(),
            student.profile(),
            student.updated_at(),
        )?;

        let res = sqlx::query(
            r"
            UPDATE students SET
                class_id = ?1, name = ?2, date_of_birth = ?3, diagnoses = ?4, strengths = ?5,
                challenges = ?6, interests = ?7, sensory_needs = ?8, communication_style = ?9,
                support_strategies = ?10, calming_strategies = ?11, triggers = ?12,
                teacher_notes = ?13, updated_at = ?14
            WHERE id = ?15
            ",
        )
        .bind(p.class_id)
        .bind(p.name)
        .bind(p.date_of_birth)
        .bind(p.profile.diagnoses.as_deref())
        .bind(p.profile.strengths.as_deref())
        .bind(p.profile.challenges.as_deref())
        .bind(p.profile.interests.as_deref())
        .bind(p.profile.sensory_needs.as_deref())
        .bind(p.profile.communication_style.as_deref())
        .bind(p.profile.support_strategies.as_deref())
        .bind(p.profile.calming_strategies.as_deref())
        .bind(p.profile.triggers.as_deref())
        .bind(p.profile.teacher_notes.as_deref())
        .bind(p.updated_at)
        .bind(id_to_i64("student_id", student.id().value())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        let row = sqlx::query(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"))
            .bind(id_to_i64("student_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_student_row).transpose()
    }

    async fn list_students(&self, class_id: Option<ClassId>) -> Result<Vec<Student>, StorageError> {
        let rows = match class_id {
            Some(class_id) => {
                sqlx::query(&format!(
                    "SELECT {STUDENT_COLUMNS} FROM students WHERE class_id = ?1 \
                     ORDER BY name COLLATE NOCASE ASC, id ASC"
                ))
                .bind(id_to_i64("class_id", class_id.value())?)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {STUDENT_COLUMNS} FROM students ORDER BY name COLLATE NOCASE ASC, id ASC"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        rows.iter().map(map_student_row).collect()
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM students WHERE id = ?1")
            .bind(id_to_i64("student_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
