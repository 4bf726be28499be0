use std::sync::Arc;

use aet_core::model::{Class, ClassDraft, ClassId, Student};
use storage::repository::{ClassRepository, StorageError, StudentRepository};

use crate::Clock;
use crate::error::ClassServiceError;

/// Class roster management.
#[derive(Clone)]
pub struct ClassService {
    clock: Clock,
    classes: Arc<dyn ClassRepository>,
    students: Arc<dyn StudentRepository>,
}

impl ClassService {
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
    /// Returns `ClassServiceError::Class` if the draft is invalid, or a storage error.
    pub async fn create(&self, draft: ClassDraft) -> Result<Class, ClassServiceError> {
        let validated = draft.validate(self.clock.now())?;
        Ok(self.classes.insert_class(&validated).await?)
    }

    /// # Errors
    ///
    /// Returns `ClassServiceError::NotFound` if the class is missing, or a
    /// validation or storage error.
    pub async fn update(&self, id: ClassId, draft: ClassDraft) -> Result<Class, ClassServiceError> {
        let existing = self.get(id).await?;
        let updated = existing.apply_edit(draft)?;
        self.classes.update_class(&updated).await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `ClassServiceError::NotFound` if the class is missing.
    pub async fn get(&self, id: ClassId) -> Result<Class, ClassServiceError> {
        self.classes
            .get_class(id)
            .await?
            .ok_or(ClassServiceError::NotFound(id))
    }

    /// # Errors
    ///
    /// Returns `ClassServiceError::Storage` on repository failures.
    pub async fn list(&self) -> Result<Vec<Class>, ClassServiceError> {
        Ok(self.classes.list_classes().await?)
    }

    /// Delete a class. Its students stay on file without a class and its
    /// lessons are removed.
    ///
    /// # Errors
    ///
    /// Returns `ClassServiceError::NotFound` if the class is missing.
    pub async fn delete(&self, id: ClassId) -> Result<(), ClassServiceError> {
        self.classes.delete_class(id).await.map_err(|err| match err {
            StorageError::NotFound => ClassServiceError::NotFound(id),
            other => other.into(),
        })
    }

    /// # Errors
    ///
    /// Returns `ClassServiceError::NotFound` if the class is missing.
    pub async fn students(&self, id: ClassId) -> Result<Vec<Student>, ClassServiceError> {
        self.get(id).await?;
        Ok(self.students.list_students(Some(id)).await?)
    }
}
