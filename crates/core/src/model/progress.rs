use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::framework::SubcategoryId;
use crate::model::ids::StudentId;
use crate::model::normalize_optional;
use crate::progression::ProgressionLevel;

/// A student's standing on one framework subcategory.
///
/// Records are created lazily the first time a teacher touches a
/// subcategory; a missing record reads the same as [`ProgressRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    student_id: StudentId,
    subcategory_id: SubcategoryId,
    level: ProgressionLevel,
    completed: bool,
    plan: Option<String>,
    updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(student_id: StudentId, subcategory_id: SubcategoryId, now: DateTime<Utc>) -> Self {
        Self {
            student_id,
            subcategory_id,
            level: ProgressionLevel::default(),
            completed: false,
            plan: None,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn from_persisted(
        student_id: StudentId,
        subcategory_id: SubcategoryId,
        level: ProgressionLevel,
        completed: bool,
        plan: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            student_id,
            subcategory_id,
            level,
            completed,
            plan: normalize_optional(plan),
            updated_at,
        }
    }

    pub fn set_level(&mut self, level: ProgressionLevel, now: DateTime<Utc>) {
        self.level = level;
        self.updated_at = now;
    }

    /// Flip the completed flag and return the new value.
    pub fn toggle_completed(&mut self, now: DateTime<Utc>) -> bool {
        self.completed = !self.completed;
        self.updated_at = now;
        self.completed
    }

    /// Store plan text. Blank text clears the plan.
    pub fn set_plan(&mut self, plan: impl Into<String>, now: DateTime<Utc>) {
        self.plan = normalize_optional(Some(plan.into()));
        self.updated_at = now;
    }

    pub fn clear_plan(&mut self, now: DateTime<Utc>) {
        self.plan = None;
        self.updated_at = now;
    }

    /// True when the record says nothing a fresh record would not.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.level == ProgressionLevel::default() && !self.completed && self.plan.is_none()
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn subcategory_id(&self) -> &SubcategoryId {
        &self.subcategory_id
    }

    #[must_use]
    pub fn level(&self) -> ProgressionLevel {
        self.level
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
