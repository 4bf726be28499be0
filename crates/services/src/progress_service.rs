use std::collections::HashMap;
use std::sync::Arc;

use aet_core::model::{ClassId, ProgressRecord, Student, StudentId};
use aet_core::summary::{ClassSummary, ProgressTree, StudentSummary};
use aet_core::{ProgressionLevel, SubcategoryId};
use storage::repository::{ClassRepository, ProgressRepository, StudentRepository};

use crate::Clock;
use crate::error::ProgressServiceError;

/// Per-student progression tracking against the framework.
///
/// Records are created on first interaction. Clearing the plan of a record
/// that holds nothing else removes it again.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    classes: Arc<dyn ClassRepository>,
    students: Arc<dyn StudentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        classes: Arc<dyn ClassRepository>,
        students: Arc<dyn StudentRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            classes,
            students,
            progress,
        }
    }

    /// The full framework tree annotated with the student's progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::StudentNotFound` if the student is missing.
    pub async fn tree(&self, student_id: StudentId) -> Result<ProgressTree, ProgressServiceError> {
        self.student(student_id).await?;
        let records = self.progress.list_progress(student_id).await?;
        Ok(ProgressTree::build(&records))
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::StudentNotFound` if the student is missing.
    pub async fn summary(
        &self,
        student_id: StudentId,
    ) -> Result<StudentSummary, ProgressServiceError> {
        self.student(student_id).await?;
        let records = self.progress.list_progress(student_id).await?;
        Ok(StudentSummary::build(&records))
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::ClassNotFound` if the class is missing.
    pub async fn class_summary(
        &self,
        class_id: ClassId,
    ) -> Result<ClassSummary, ProgressServiceError> {
        let (students, records) = self.class_records(class_id).await?;
        Ok(ClassSummary::build(
            students
                .iter()
                .map(|student| (student, records_for(&records, student.id()))),
        ))
    }

    /// Students of a class with their records grouped per student.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::ClassNotFound` if the class is missing.
    pub async fn class_records(
        &self,
        class_id: ClassId,
    ) -> Result<(Vec<Student>, HashMap<StudentId, Vec<ProgressRecord>>), ProgressServiceError>
    {
        if self.classes.get_class(class_id).await?.is_none() {
            return Err(ProgressServiceError::ClassNotFound(class_id));
        }
        let students = self.students.list_students(Some(class_id)).await?;
        let mut grouped: HashMap<StudentId, Vec<ProgressRecord>> = HashMap::new();
        for record in self.progress.list_progress_for_class(class_id).await? {
            grouped.entry(record.student_id()).or_default().push(record);
        }
        Ok((students, grouped))
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown students or subcategories.
    pub async fn set_level(
        &self,
        student_id: StudentId,
        subcategory: &str,
        level: ProgressionLevel,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let mut record = self.load(student_id, subcategory).await?;
        record.set_level(level, self.clock.now());
        self.store(&record).await?;
        Ok(record)
    }

    /// Flip the completed flag. Completion does not change the level.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown students or subcategories.
    pub async fn toggle_completed(
        &self,
        student_id: StudentId,
        subcategory: &str,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let mut record = self.load(student_id, subcategory).await?;
        record.toggle_completed(self.clock.now());
        self.store(&record).await?;
        Ok(record)
    }

    /// Save plan text written by the teacher. Blank text clears the plan.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown students or subcategories.
    pub async fn save_plan(
        &self,
        student_id: StudentId,
        subcategory: &str,
        plan: &str,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let mut record = self.load(student_id, subcategory).await?;
        record.set_plan(plan, self.clock.now());
        if record.plan().is_some() {
            self.store(&record).await?;
        } else {
            self.drop_if_default(&record).await?;
        }
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown students or subcategories.
    pub async fn clear_plan(
        &self,
        student_id: StudentId,
        subcategory: &str,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let mut record = self.load(student_id, subcategory).await?;
        record.clear_plan(self.clock.now());
        self.drop_if_default(&record).await?;
        Ok(record)
    }

    pub(crate) async fn student(&self, id: StudentId) -> Result<Student, ProgressServiceError> {
        self.students
            .get_student(id)
            .await?
            .ok_or(ProgressServiceError::StudentNotFound(id))
    }

    /// Existing record for the pair, or a fresh unsaved one.
    pub(crate) async fn load(
        &self,
        student_id: StudentId,
        subcategory: &str,
    ) -> Result<ProgressRecord, ProgressServiceError> {
        let subcategory = SubcategoryId::parse(subcategory)?;
        self.student(student_id).await?;
        let existing = self.progress.get_progress(student_id, &subcategory).await?;
        Ok(existing
            .unwrap_or_else(|| ProgressRecord::new(student_id, subcategory, self.clock.now())))
    }

    pub(crate) async fn store(&self, record: &ProgressRecord) -> Result<(), ProgressServiceError> {
        Ok(self.progress.upsert_progress(record).await?)
    }

    /// After a plan is cleared, a record with nothing left in it is removed.
    async fn drop_if_default(&self, record: &ProgressRecord) -> Result<(), ProgressServiceError> {
        if record.is_default() {
            self.progress
                .delete_progress(record.student_id(), record.subcategory_id())
                .await?;
        } else {
            self.progress.upsert_progress(record).await?;
        }
        Ok(())
    }
}

pub(crate) fn records_for(
    grouped: &HashMap<StudentId, Vec<ProgressRecord>>,
    student_id: StudentId,
) -> &[ProgressRecord] {
    grouped.get(&student_id).map_or(&[], Vec::as_slice)
}
