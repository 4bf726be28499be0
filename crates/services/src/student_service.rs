use std::sync::Arc;

use aet_core::model::{ClassId, Student, StudentDraft, StudentId};
use storage::repository::{ClassRepository, StorageError, StudentRepository};

use crate::Clock;
use crate::error::StudentServiceError;

#[derive(Clone)]
pub struct StudentService {
    clock: Clock,
    classes: Arc<dyn ClassRepository>,
    students: Arc<dyn StudentRepository>,
}

impl StudentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        classes: Arc<dyn ClassRepository>,
        students: Arc<dyn StudentRepository>,
    ) -> Self {
        Self {
            clock,
            classes,
            students,
        }
    }

    /// # Errors
    ///
    /// Returns `StudentServiceError::ClassNotFound` if the draft names a class
    /// that does not exist, or a validation or storage error.
    pub async fn create(&self, draft: StudentDraft) -> Result<Student, StudentServiceError> {
        self.ensure_class(draft.class_id).await?;
        let validated = draft.validate(self.clock.now())?;
        Ok(self.students.insert_student(&validated).await?)
    }

    /// Replace a student's details. Moving a student between classes keeps
    /// their progress.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::NotFound` if the student is missing,
    /// `ClassNotFound` for an unknown class, or a validation or storage error.
    pub async fn update(
        &self,
        id: StudentId,
        draft: StudentDraft,
    ) -> Result<Student, StudentServiceError> {
        let existing = self.get(id).await?;
        self.ensure_class(draft.class_id).await?;
        let updated = existing.apply_edit(draft, self.clock.now())?;
        self.students.update_student(&updated).await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `StudentServiceError::NotFound` if the student is missing.
    pub async fn get(&self, id: StudentId) -> Result<Student, StudentServiceError> {
        self.students
            .get_student(id)
            .await?
            .ok_or(StudentServiceError::NotFound(id))
    }

    /// All students, or only those in `class_id`.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::ClassNotFound` for an unknown class filter.
    pub async fn list(
        &self,
        class_id: Option<ClassId>,
    ) -> Result<Vec<Student>, StudentServiceError> {
        self.ensure_class(class_id).await?;
        Ok(self.students.list_students(class_id).await?)
    }

    /// Delete a student together with their progress records.
    ///
    /// # Errors
    ///
    /// Returns `StudentServiceError::NotFound` if the student is missing.
    pub async fn delete(&self, id: StudentId) -> Result<(), StudentServiceError> {
        self.students.delete_student(id).await.map_err(|err| match err {
            StorageError::NotFound => StudentServiceError::NotFound(id),
            other => other.into(),
        })
    }

    async fn ensure_class(&self, class_id: Option<ClassId>) -> Result<(), StudentServiceError> {
        let Some(class_id) = class_id else {
            return Ok(());
        };
        match self.classes.get_class(class_id).await? {
            Some(_) => Ok(()),
            None => Err(StudentServiceError::ClassNotFound(class_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aet_core::model::{ClassDraft, StudentError, StudentProfile};
    use aet_core::time::fixed_now;
    use chrono::{Duration, NaiveDate};
    use storage::Storage;

    fn service(storage: &Storage, clock: Clock) -> StudentService {
        StudentService::new(
            clock,
            Arc::clone(&storage.classes),
            Arc::clone(&storage.students),
        )
    }

    async fn class(storage: &Storage, name: &str) -> ClassId {
        storage
            .classes
            .insert_class(
                &ClassDraft {
                    name: name.into(),
                    ..ClassDraft::default()
                }
                .validate(fixed_now())
                .unwrap(),
            )
            .await
            .unwrap()
            .id()
    }

    #[tokio::test]
    async fn creates_and_moves_students_between_classes() {
        let storage = Storage::in_memory();
        let students = service(&storage, Clock::fixed(fixed_now()));
        let oak = class(&storage, "Oak").await;
        let ash = class(&storage, "Ash").await;

        let ava = students
            .create(StudentDraft {
                class_id: Some(oak),
                name: " Ava Lee ".into(),
                date_of_birth: NaiveDate::from_ymd_opt(2016, 3, 4),
                profile: StudentProfile {
                    interests: Some("dinosaurs".into()),
                    ..StudentProfile::default()
                },
            })
            .await
            .unwrap();
        assert_eq!(ava.name(), "Ava Lee");

        let later = service(&storage, Clock::fixed(fixed_now() + Duration::hours(2)));
        let moved = later
            .update(
                ava.id(),
                StudentDraft {
                    class_id: Some(ash),
                    name: "Ava Lee".into(),
                    ..StudentDraft::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.class_id(), Some(ash));
        assert_eq!(moved.updated_at(), fixed_now() + Duration::hours(2));
        assert_eq!(moved.created_at(), ava.created_at());

        assert!(students.list(Some(oak)).await.unwrap().is_empty());
        assert_eq!(students.list(Some(ash)).await.unwrap().len(), 1);
        assert_eq!(students.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_classes_and_bad_input() {
        let storage = Storage::in_memory();
        let students = service(&storage, Clock::fixed(fixed_now()));
        let missing = ClassId::new(42);

        assert!(matches!(
            students
                .create(StudentDraft {
                    class_id: Some(missing),
                    name: "Ben".into(),
                    ..StudentDraft::default()
                })
                .await,
            Err(StudentServiceError::ClassNotFound(id)) if id == missing
        ));
        assert!(matches!(
            students.list(Some(missing)).await,
            Err(StudentServiceError::ClassNotFound(_))
        ));
        assert!(matches!(
            students
                .create(StudentDraft {
                    name: "Cal".into(),
                    date_of_birth: NaiveDate::from_ymd_opt(2099, 1, 1),
                    ..StudentDraft::default()
                })
                .await,
            Err(StudentServiceError::Student(StudentError::BirthDateInFuture(_)))
        ));
        assert!(matches!(
            students.delete(StudentId::new(7)).await,
            Err(StudentServiceError::NotFound(_))
        ));
    }
}
