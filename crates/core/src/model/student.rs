use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ClassId, StudentId};
use crate::model::normalize_optional;
use crate::time::whole_years_between;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudentError {
    #[error("student name cannot be empty")]
    EmptyName,

    #[error("date of birth {0} is in the future")]
    BirthDateInFuture(NaiveDate),
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Free-text profile a teacher keeps about a student.
///
/// Every field is optional; blank input is normalized to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    pub diagnoses: Option<String>,
    pub strengths: Option<String>,
    pub challenges: Option<String>,
    pub interests: Option<String>,
    pub sensory_needs: Option<String>,
    pub communication_style: Option<String>,
    pub support_strategies: Option<String>,
    pub calming_strategies: Option<String>,
    pub triggers: Option<String>,
    pub teacher_notes: Option<String>,
}

impl StudentProfile {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            diagnoses: normalize_optional(self.diagnoses),
            strengths: normalize_optional(self.strengths),
            challenges: normalize_optional(self.challenges),
            interests: normalize_optional(self.interests),
            sensory_needs: normalize_optional(self.sensory_needs),
            communication_style: normalize_optional(self.communication_style),
            support_strategies: normalize_optional(self.support_strategies),
            calming_strategies: normalize_optional(self.calming_strategies),
            triggers: normalize_optional(self.triggers),
            teacher_notes: normalize_optional(self.teacher_notes),
        }
    }

    /// Labelled, non-empty fields in display order.
    #[must_use]
    pub fn labelled_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Diagnoses", &self.diagnoses),
            ("Strengths", &self.strengths),
            ("Challenges", &self.challenges),
            ("Interests", &self.interests),
            ("Sensory needs", &self.sensory_needs),
            ("Communication style", &self.communication_style),
            ("Support strategies", &self.support_strategies),
            ("Calming strategies", &self.calming_strategies),
            ("Triggers", &self.triggers),
            ("Teacher notes", &self.teacher_notes),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
        .collect()
    }
}

//
// ─── STUDENT ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDraft {
    pub class_id: Option<ClassId>,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub profile: StudentProfile,
}

impl StudentDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `StudentError` if the name is blank or the birth date lies after `now`.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedStudent, StudentError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StudentError::EmptyName);
        }
        if let Some(dob) = self.date_of_birth {
            if dob > now.date_naive() {
                return Err(StudentError::BirthDateInFuture(dob));
            }
        }

        Ok(ValidatedStudent {
            class_id: self.class_id,
            name: name.to_owned(),
            date_of_birth: self.date_of_birth,
            profile: self.profile.normalized(),
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStudent {
    pub class_id: Option<ClassId>,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub profile: StudentProfile,
    pub created_at: DateTime<Utc>,
}

impl ValidatedStudent {
    #[must_use]
    pub fn assign_id(self, id: StudentId) -> Student {
        Student {
            id,
            class_id: self.class_id,
            name: self.name,
            date_of_birth: self.date_of_birth,
            profile: self.profile,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    id: StudentId,
    class_id: Option<ClassId>,
    name: String,
    date_of_birth: Option<NaiveDate>,
    profile: StudentProfile,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Student {
    /// Rehydrate a student from persisted storage.
    ///
    /// Birth dates are not re-checked against the clock here.
    ///
    /// # Errors
    ///
    /// Returns `StudentError::EmptyName` if the stored name is blank.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: StudentId,
        class_id: Option<ClassId>,
        name: String,
        date_of_birth: Option<NaiveDate>,
        profile: StudentProfile,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, StudentError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StudentError::EmptyName);
        }
        Ok(Self {
            id,
            class_id,
            name: name.to_owned(),
            date_of_birth,
            profile: profile.normalized(),
            created_at,
            updated_at,
        })
    }

    /// Apply an edit form, keeping id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `StudentError` if the draft does not validate.
    pub fn apply_edit(&self, draft: StudentDraft, now: DateTime<Utc>) -> Result<Self, StudentError> {
        let validated = draft.validate(now)?;
        Ok(Self {
            id: self.id,
            class_id: validated.class_id,
            name: validated.name,
            date_of_birth: validated.date_of_birth,
            profile: validated.profile,
            created_at: self.created_at,
            updated_at: now,
        })
    }

    /// Detach from a deleted class. `updated_at` is left as it was, matching
    /// the `ON DELETE SET NULL` behaviour of the database.
    pub fn unassign(&mut self) {
        self.class_id = None;
    }

    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn class_id(&self) -> Option<ClassId> {
        self.class_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First word of the name; prompts never carry full names.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    #[must_use]
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        self.date_of_birth
            .and_then(|dob| whole_years_between(dob, date))
    }

    #[must_use]
    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::time::fixed_now;

    fn draft(name: &str) -> StudentDraft {
        StudentDraft {
            name: name.into(),
            ..StudentDraft::default()
        }
    }

    #[test]
    fn rejects_blank_name() {
        assert_eq!(
            draft("  ").validate(fixed_now()).unwrap_err(),
            StudentError::EmptyName
        );
    }

    #[test]
    fn rejects_future_birth_date() {
        let tomorrow = (fixed_now() + Duration::days(1)).date_naive();
        let mut d = draft("Sam");
        d.date_of_birth = Some(tomorrow);
        assert_eq!(
            d.validate(fixed_now()).unwrap_err(),
            StudentError::BirthDateInFuture(tomorrow)
        );
    }

    #[test]
    fn normalizes_profile_fields() {
        let mut d = draft("  Sam Jones ");
        d.profile.interests = Some("  trains ".into());
        d.profile.triggers = Some("   ".into());
        let student = d
            .validate(fixed_now())
            .unwrap()
            .assign_id(StudentId::new(1));

        assert_eq!(student.name(), "Sam Jones");
        assert_eq!(student.first_name(), "Sam");
        assert_eq!(student.profile().interests.as_deref(), Some("trains"));
        assert_eq!(student.profile().triggers, None);
        assert_eq!(
            student.profile().labelled_fields(),
            vec![("Interests", "trains")]
        );
    }

    #[test]
    fn age_on_uses_birth_date() {
        let mut d = draft("Sam");
        d.date_of_birth = NaiveDate::from_ymd_opt(2015, 12, 1);
        let student = d
            .validate(fixed_now())
            .unwrap()
            .assign_id(StudentId::new(1));
        assert_eq!(student.age_on(fixed_now().date_naive()), Some(7));
    }

    #[test]
    fn apply_edit_bumps_updated_at() {
        let student = draft("Sam")
            .validate(fixed_now())
            .unwrap()
            .assign_id(StudentId::new(4));
        let later = fixed_now() + Duration::hours(2);
        let mut edit = draft("Samuel");
        edit.class_id = Some(ClassId::new(2));
        let edited = student.apply_edit(edit, later).unwrap();

        assert_eq!(edited.id(), StudentId::new(4));
        assert_eq!(edited.class_id(), Some(ClassId::new(2)));
        assert_eq!(edited.created_at(), fixed_now());
        assert_eq!(edited.updated_at(), later);
    }
}
