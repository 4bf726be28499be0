use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::ClassId;
use crate::model::normalize_optional;

/// Oldest age a class range may name.
pub const MAX_CLASS_AGE: u8 = 25;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassError {
    #[error("class name cannot be empty")]
    EmptyName,

    #[error("age range minimum ({min}) is greater than maximum ({max})")]
    InvertedAgeRange { min: u8, max: u8 },

    #[error("age range must be within 0-25")]
    AgeOutOfRange,

    #[error("age range needs both a minimum and a maximum")]
    IncompleteAgeRange,
}

//
// ─── AGE RANGE ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeRange {
    min: u8,
    max: u8,
}

impl AgeRange {
    /// # Errors
    ///
    /// Returns `ClassError` if `min > max` or either bound exceeds `MAX_CLASS_AGE`.
    pub fn new(min: u8, max: u8) -> Result<Self, ClassError> {
        if min > MAX_CLASS_AGE || max > MAX_CLASS_AGE {
            return Err(ClassError::AgeOutOfRange);
        }
        if min > max {
            return Err(ClassError::InvertedAgeRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Build from optional bounds; both or neither must be set.
    ///
    /// # Errors
    ///
    /// Returns `ClassError::IncompleteAgeRange` when only one bound is given.
    pub fn from_bounds(min: Option<u8>, max: Option<u8>) -> Result<Option<Self>, ClassError> {
        match (min, max) {
            (None, None) => Ok(None),
            (Some(min), Some(max)) => Self::new(min, max).map(Some),
            _ => Err(ClassError::IncompleteAgeRange),
        }
    }

    #[must_use]
    pub fn min(&self) -> u8 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> u8 {
        self.max
    }
}

impl std::fmt::Display for AgeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

//
// ─── CLASS ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated class input, as submitted by an edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDraft {
    pub name: String,
    pub description: Option<String>,
    pub age_min: Option<u8>,
    pub age_max: Option<u8>,
}

impl ClassDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `ClassError` if the name is blank or the age range is invalid.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedClass, ClassError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClassError::EmptyName);
        }
        let age_range = AgeRange::from_bounds(self.age_min, self.age_max)?;

        Ok(ValidatedClass {
            name: name.to_owned(),
            description: normalize_optional(self.description),
            age_range,
            created_at: now,
        })
    }
}

/// A validated class that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedClass {
    pub name: String,
    pub description: Option<String>,
    pub age_range: Option<AgeRange>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedClass {
    #[must_use]
    pub fn assign_id(self, id: ClassId) -> Class {
        Class {
            id,
            name: self.name,
            description: self.description,
            age_range: self.age_range,
            created_at: self.created_at,
        }
    }
}

/// A teaching group. Owns a set of students and a lesson history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Class {
    id: ClassId,
    name: String,
    description: Option<String>,
    age_range: Option<AgeRange>,
    created_at: DateTime<Utc>,
}

impl Class {
    /// Rehydrate a class from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ClassError` if persisted values no longer validate.
    pub fn from_persisted(
        id: ClassId,
        name: String,
        description: Option<String>,
        age_min: Option<u8>,
        age_max: Option<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ClassError> {
        let draft = ClassDraft {
            name,
            description,
            age_min,
            age_max,
        };
        Ok(draft.validate(created_at)?.assign_id(id))
    }

    /// Apply an edit, keeping id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `ClassError` if the draft does not validate.
    pub fn apply_edit(&self, draft: ClassDraft) -> Result<Self, ClassError> {
        Ok(draft.validate(self.created_at)?.assign_id(self.id))
    }

    #[must_use]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn age_range(&self) -> Option<AgeRange> {
        self.age_range
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
