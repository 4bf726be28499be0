use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use aet_core::framework::SubcategoryId;
use aet_core::model::{
    Class, ClassId, Lesson, LessonId, ProgressRecord, Student, StudentId, ValidatedClass,
    ValidatedLesson, ValidatedStudent, VisualSchedule,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CLASSES ───────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Persist a new class and assign its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the class cannot be stored.
    async fn insert_class(&self, class: &ValidatedClass) -> Result<Class, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the class does not exist.
    async fn update_class(&self, class: &Class) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError>;

    /// All classes ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_classes(&self) -> Result<Vec<Class>, StorageError>;

    /// Delete a class. Its students are unassigned and its lessons removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the class does not exist.
    async fn delete_class(&self, id: ClassId) -> Result<(), StorageError>;
}

//
// ─── STUDENTS ──────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the referenced class does not exist.
    async fn insert_student(&self, student: &ValidatedStudent) -> Result<Student, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist, or
    /// `StorageError::Conflict` if the referenced class does not.
    async fn update_student(&self, student: &Student) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError>;

    /// Students ordered by name, optionally restricted to one class.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_students(&self, class_id: Option<ClassId>) -> Result<Vec<Student>, StorageError>;

    /// Delete a student together with their progress records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist.
    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError>;
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(
        &self,
        student_id: StudentId,
        subcategory_id: &SubcategoryId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress(&self, student_id: StudentId) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Records of every student currently in `class_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress_for_class(
        &self,
        class_id: ClassId,
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Insert or replace the record for (student, subcategory).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the student does not exist.
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Remove a record. Deleting a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_progress(
        &self,
        student_id: StudentId,
        subcategory_id: &SubcategoryId,
    ) -> Result<(), StorageError>;
}

//
// ─── LESSONS ───────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the class does not exist.
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<Lesson, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_lessons(&self, class_id: ClassId, limit: u32) -> Result<Vec<Lesson>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn set_visual_schedule(
        &self,
        id: LessonId,
        schedule: &VisualSchedule,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lesson does not exist.
    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError>;
}

//
// ─── AI USAGE ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiUsageStatus {
    Started,
    Succeeded,
    Failed,
}

impl AiUsageStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAiUsageRecord {
    /// What the request was for, e.g. `goal_plan`.
    pub kind: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AiUsageCompletion {
    pub status: AiUsageStatus,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl AiUsageCompletion {
    #[must_use]
    pub fn failed() -> Self {
        Self {
            status: AiUsageStatus::Failed,
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
        }
    }
}

#[async_trait]
pub trait AiUsageRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn insert_started(&self, record: NewAiUsageRecord) -> Result<i64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no row has this id.
    async fn update_completion(
        &self,
        id: i64,
        completion: AiUsageCompletion,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_since(&self, since: DateTime<Utc>) -> Result<u32, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn last_request_at(&self) -> Result<Option<DateTime<Utc>>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tables {
    next_id: u64,
    classes: HashMap<ClassId, Class>,
    students: HashMap<StudentId, Student>,
    progress: HashMap<(StudentId, SubcategoryId), ProgressRecord>,
    lessons: HashMap<LessonId, Lesson>,
    /// Request start times, indexed by `id - 1`.
    ai_usage: Vec<DateTime<Utc>>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// All tables share one lock so that cascading deletes stay consistent.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn sorted_by_name<T>(mut items: Vec<T>, name: impl Fn(&T) -> (String, u64)) -> Vec<T> {
    items.sort_by_key(|item| name(item));
    items
}

#[async_trait]
impl ClassRepository for InMemoryRepository {
    async fn insert_class(&self, class: &ValidatedClass) -> Result<Class, StorageError> {
        let mut tables = self.lock()?;
        let id = ClassId::new(tables.next_id());
        let class = class.clone().assign_id(id);
        tables.classes.insert(id, class.clone());
        Ok(class)
    }

    async fn update_class(&self, class: &Class) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        let slot = tables
            .classes
            .get_mut(&class.id())
            .ok_or(StorageError::NotFound)?;
        *slot = class.clone();
        Ok(())
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError> {
        Ok(self.lock()?.classes.get(&id).cloned())
    }

    async fn list_classes(&self) -> Result<Vec<Class>, StorageError> {
        let classes = self.lock()?.classes.values().cloned().collect();
        Ok(sorted_by_name(classes, |c: &Class| {
            (c.name().to_lowercase(), c.id().value())
        }))
    }

    async fn delete_class(&self, id: ClassId) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        if tables.classes.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        for student in tables.students.values_mut() {
            if student.class_id() == Some(id) {
                student.unassign();
            }
        }
        tables.lessons.retain(|_, lesson| lesson.class_id() != id);
        Ok(())
    }
}

#[async_trait]
impl StudentRepository for InMemoryRepository {
    async fn insert_student(&self, student: &ValidatedStudent) -> Result<Student, StorageError> {
        let mut tables = self.lock()?;
        if let Some(class_id) = student.class_id {
            if !tables.classes.contains_key(&class_id) {
                return Err(StorageError::Conflict);
            }
        }
        let id = StudentId::new(tables.next_id());
        let student = student.clone().assign_id(id);
        tables.students.insert(id, student.clone());
        Ok(student)
    }

    async fn update_student(&self, student: &Student) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        if let Some(class_id) = student.class_id() {
            if !tables.classes.contains_key(&class_id) {
                return Err(StorageError::Conflict);
            }
        }
        let slot = tables
            .students
            .get_mut(&student.id())
            .ok_or(StorageError::NotFound)?;
        *slot = student.clone();
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        Ok(self.lock()?.students.get(&id).cloned())
    }

    async fn list_students(&self, class_id: Option<ClassId>) -> Result<Vec<Student>, StorageError> {
        let students = self
            .lock()?
            .students
            .values()
            .filter(|s| class_id.is_none() || s.class_id() == class_id)
            .cloned()
            .collect();
        Ok(sorted_by_name(students, |s: &Student| {
            (s.name().to_lowercase(), s.id().value())
        }))
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        if tables.students.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        tables.progress.retain(|(student_id, _), _| *student_id != id);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        student_id: StudentId,
        subcategory_id: &SubcategoryId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        Ok(self
            .lock()?
            .progress
            .get(&(student_id, subcategory_id.clone()))
            .cloned())
    }

    async fn list_progress(&self, student_id: StudentId) -> Result<Vec<ProgressRecord>, StorageError> {
        let mut records: Vec<ProgressRecord> = self
            .lock()?
            .progress
            .values()
            .filter(|r| r.student_id() == student_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.subcategory_id().cmp(b.subcategory_id()));
        Ok(records)
    }

    async fn list_progress_for_class(
        &self,
        class_id: ClassId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let tables = self.lock()?;
        let mut records: Vec<ProgressRecord> = tables
            .progress
            .values()
            .filter(|r| {
                tables
                    .students
                    .get(&r.student_id())
                    .is_some_and(|s| s.class_id() == Some(class_id))
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            (a.student_id(), a.subcategory_id()).cmp(&(b.student_id(), b.subcategory_id()))
        });
        Ok(records)
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        if !tables.students.contains_key(&record.student_id()) {
            return Err(StorageError::Conflict);
        }
        tables.progress.insert(
            (record.student_id(), record.subcategory_id().clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn delete_progress(
        &self,
        student_id: StudentId,
        subcategory_id: &SubcategoryId,
    ) -> Result<(), StorageError> {
        self.lock()?
            .progress
            .remove(&(student_id, subcategory_id.clone()));
        Ok(())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn insert_lesson(&self, lesson: &ValidatedLesson) -> Result<Lesson, StorageError> {
        let mut tables = self.lock()?;
        if !tables.classes.contains_key(&lesson.class_id) {
            return Err(StorageError::Conflict);
        }
        let id = LessonId::new(tables.next_id());
        let lesson = lesson.clone().assign_id(id);
        tables.lessons.insert(id, lesson.clone());
        Ok(lesson)
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        Ok(self.lock()?.lessons.get(&id).cloned())
    }

    async fn list_lessons(&self, class_id: ClassId, limit: u32) -> Result<Vec<Lesson>, StorageError> {
        let mut lessons: Vec<Lesson> = self
            .lock()?
            .lessons
            .values()
            .filter(|l| l.class_id() == class_id)
            .cloned()
            .collect();
        lessons.sort_by(|a, b| (b.created_at(), b.id()).cmp(&(a.created_at(), a.id())));
        lessons.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(lessons)
    }

    async fn set_visual_schedule(
        &self,
        id: LessonId,
        schedule: &VisualSchedule,
    ) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        let lesson = tables.lessons.get_mut(&id).ok_or(StorageError::NotFound)?;
        lesson.set_visual_schedule(schedule.clone());
        Ok(())
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        self.lock()?
            .lessons
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AiUsageRepository for InMemoryRepository {
    async fn insert_started(&self, record: NewAiUsageRecord) -> Result<i64, StorageError> {
        let mut tables = self.lock()?;
        tables.ai_usage.push(record.created_at);
        i64::try_from(tables.ai_usage.len()).map_err(|_| StorageError::Conflict)
    }

    async fn update_completion(
        &self,
        id: i64,
        _completion: AiUsageCompletion,
    ) -> Result<(), StorageError> {
        let tables = self.lock()?;
        let index = usize::try_from(id - 1).map_err(|_| StorageError::NotFound)?;
        tables
            .ai_usage
            .get(index)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u32, StorageError> {
        let count = self
            .lock()?
            .ai_usage
            .iter()
            .filter(|created_at| **created_at >= since)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn last_request_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(self.lock()?.ai_usage.iter().max().copied())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub classes: Arc<dyn ClassRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub ai_usage: Arc<dyn AiUsageRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            classes: Arc::new(repo.clone()),
            students: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            ai_usage: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use aet_core::model::{ClassDraft, LessonDraft, StudentDraft};
    use aet_core::progression::ProgressionLevel;
    use aet_core::time::fixed_now;

    use super::*;

    fn class_draft(name: &str) -> ValidatedClass {
        ClassDraft {
            name: name.into(),
            ..ClassDraft::default()
        }
        .validate(fixed_now())
        .unwrap()
    }

    fn student_draft(name: &str, class_id: Option<ClassId>) -> ValidatedStudent {
        StudentDraft {
            class_id,
            name: name.into(),
            ..StudentDraft::default()
        }
        .validate(fixed_now())
        .unwrap()
    }

    #[tokio::test]
    async fn lists_classes_by_name() {
        let repo = InMemoryRepository::new();
        repo.insert_class(&class_draft("willow")).await.unwrap();
        repo.insert_class(&class_draft("Ash")).await.unwrap();
        let names: Vec<String> = repo
            .list_classes()
            .await
            .unwrap()
            .iter()
            .map(|c| c.name().to_owned())
            .collect();
        assert_eq!(names, ["Ash", "willow"]);
    }

    #[tokio::test]
    async fn deleting_class_unassigns_students_and_drops_lessons() {
        let repo = InMemoryRepository::new();
        let class = repo.insert_class(&class_draft("Oak")).await.unwrap();
        let student = repo
            .insert_student(&student_draft("Ava", Some(class.id())))
            .await
            .unwrap();
        let lesson = LessonDraft {
            topic: "Weather".into(),
            objective: None,
            content: "Look outside.".into(),
        }
        .validate(class.id(), fixed_now())
        .unwrap();
        let lesson = repo.insert_lesson(&lesson).await.unwrap();

        repo.delete_class(class.id()).await.unwrap();

        let unassigned = repo.get_student(student.id()).await.unwrap().unwrap();
        assert_eq!(unassigned.class_id(), None);
        assert_eq!(unassigned.updated_at(), student.updated_at());
        assert!(repo.get_lesson(lesson.id()).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_class(class.id()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn deleting_student_drops_progress() {
        let repo = InMemoryRepository::new();
        let student = repo.insert_student(&student_draft("Ava", None)).await.unwrap();
        let sub = SubcategoryId::parse("sensory.1.1").unwrap();
        let mut record = ProgressRecord::new(student.id(), sub.clone(), fixed_now());
        record.set_level(ProgressionLevel::Developing, fixed_now());
        repo.upsert_progress(&record).await.unwrap();
        assert_eq!(repo.list_progress(student.id()).await.unwrap().len(), 1);

        repo.delete_student(student.id()).await.unwrap();
        assert!(repo.get_progress(student.id(), &sub).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_dangling_references() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.insert_student(&student_draft("Ava", Some(ClassId::new(99))))
                .await,
            Err(StorageError::Conflict)
        ));
        let record = ProgressRecord::new(
            StudentId::new(42),
            SubcategoryId::parse("sensory.1.1").unwrap(),
            fixed_now(),
        );
        assert!(matches!(
            repo.upsert_progress(&record).await,
            Err(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn ai_usage_counts_and_tracks_last_request() {
        let repo = InMemoryRepository::new();
        assert!(repo.last_request_at().await.unwrap().is_none());
        let id = repo
            .insert_started(NewAiUsageRecord {
                kind: "goal_plan".into(),
                model: "test".into(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        repo.update_completion(id, AiUsageCompletion::failed())
            .await
            .unwrap();
        assert_eq!(repo.count_since(fixed_now()).await.unwrap(), 1);
        assert_eq!(repo.last_request_at().await.unwrap(), Some(fixed_now()));
        assert!(matches!(
            repo.update_completion(99, AiUsageCompletion::failed()).await,
            Err(StorageError::NotFound)
        ));
    }
}
