use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ClassId, LessonId};
use crate::model::normalize_optional;

/// Upper bound on steps in one visual schedule.
pub const MAX_SCHEDULE_STEPS: usize = 12;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson topic cannot be empty")]
    EmptyTopic,

    #[error("lesson content cannot be empty")]
    EmptyContent,

    #[error("visual schedule has no steps")]
    EmptySchedule,

    #[error("visual schedule has {0} steps (max 12)")]
    TooManySteps(usize),

    #[error("schedule step {0} has an empty label")]
    EmptyStepLabel(usize),

    #[error("schedule step positions must run 1..n without gaps")]
    NonContiguousSteps,
}

//
// ─── VISUAL SCHEDULE ───────────────────────────────────────────────────────────
//

/// Symbol returned by the pictogram service for a step keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pictogram {
    pub id: u64,
    pub image_url: String,
}

/// A step as proposed by the language model, before pictogram lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedStep {
    pub label: String,
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStep {
    /// 1-based.
    pub position: u8,
    pub label: String,
    pub keyword: String,
    pub pictogram: Option<Pictogram>,
}

/// Ordered picture-supported steps attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<ScheduleStep>", try_from = "Vec<ScheduleStep>")]
pub struct VisualSchedule {
    steps: Vec<ScheduleStep>,
}

impl VisualSchedule {
    /// Number proposed steps in order, pairing each with its pictogram match.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if there are no steps, too many, or a blank label.
    pub fn build(
        steps: impl IntoIterator<Item = (ProposedStep, Option<Pictogram>)>,
    ) -> Result<Self, LessonError> {
        let steps: Vec<ScheduleStep> = steps
            .into_iter()
            .enumerate()
            .map(|(i, (proposed, pictogram))| ScheduleStep {
                position: u8::try_from(i + 1).unwrap_or(u8::MAX),
                label: proposed.label.trim().to_owned(),
                keyword: proposed.keyword.trim().to_owned(),
                pictogram,
            })
            .collect();
        Self::try_from(steps)
    }

    #[must_use]
    pub fn steps(&self) -> &[ScheduleStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn pictogram_count(&self) -> usize {
        self.steps.iter().filter(|s| s.pictogram.is_some()).count()
    }
}

impl TryFrom<Vec<ScheduleStep>> for VisualSchedule {
    type Error = LessonError;

    fn try_from(steps: Vec<ScheduleStep>) -> Result<Self, Self::Error> {
        if steps.is_empty() {
            return Err(LessonError::EmptySchedule);
        }
        if steps.len() > MAX_SCHEDULE_STEPS {
            return Err(LessonError::TooManySteps(steps.len()));
        }
        for (i, step) in steps.iter().enumerate() {
            if usize::from(step.position) != i + 1 {
                return Err(LessonError::NonContiguousSteps);
            }
            if step.label.trim().is_empty() {
                return Err(LessonError::EmptyStepLabel(i + 1));
            }
        }
        Ok(Self { steps })
    }
}

impl From<VisualSchedule> for Vec<ScheduleStep> {
    fn from(schedule: VisualSchedule) -> Self {
        schedule.steps
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDraft {
    pub topic: String,
    #[serde(default)]
    pub objective: Option<String>,
    pub content: String,
}

impl LessonDraft {
    /// # Errors
    ///
    /// Returns `LessonError` if the topic or content is blank.
    pub fn validate(self, class_id: ClassId, now: DateTime<Utc>) -> Result<ValidatedLesson, LessonError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(LessonError::EmptyTopic);
        }
        let content = self.content.trim();
        if content.is_empty() {
            return Err(LessonError::EmptyContent);
        }
        Ok(ValidatedLesson {
            class_id,
            topic: topic.to_owned(),
            objective: normalize_optional(self.objective),
            content: content.to_owned(),
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLesson {
    pub class_id: ClassId,
    pub topic: String,
    pub objective: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ValidatedLesson {
    #[must_use]
    pub fn assign_id(self, id: LessonId) -> Lesson {
        Lesson {
            id,
            class_id: self.class_id,
            topic: self.topic,
            objective: self.objective,
            content: self.content,
            visual_schedule: None,
            created_at: self.created_at,
        }
    }
}

/// A saved lesson plan in a class's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    id: LessonId,
    class_id: ClassId,
    topic: String,
    objective: Option<String>,
    content: String,
    visual_schedule: Option<VisualSchedule>,
    created_at: DateTime<Utc>,
}

impl Lesson {
    /// # Errors
    ///
    /// Returns `LessonError` if persisted text no longer validates.
    pub fn from_persisted(
        id: LessonId,
        class_id: ClassId,
        draft: LessonDraft,
        visual_schedule: Option<VisualSchedule>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LessonError> {
        let mut lesson = draft.validate(class_id, created_at)?.assign_id(id);
        lesson.visual_schedule = visual_schedule;
        Ok(lesson)
    }

    pub fn set_visual_schedule(&mut self, schedule: VisualSchedule) {
        self.visual_schedule = Some(schedule);
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn objective(&self) -> Option<&str> {
        self.objective.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn visual_schedule(&self) -> Option<&VisualSchedule> {
        self.visual_schedule.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn proposed(label: &str) -> ProposedStep {
        ProposedStep {
            label: label.into(),
            keyword: label.to_lowercase(),
        }
    }

    #[test]
    fn draft_requires_topic_and_content() {
        let draft = LessonDraft {
            topic: " ".into(),
            objective: None,
            content: "x".into(),
        };
        assert_eq!(
            draft.validate(ClassId::new(1), fixed_now()).unwrap_err(),
            LessonError::EmptyTopic
        );

        let draft = LessonDraft {
            topic: "Weather".into(),
            objective: Some("  ".into()),
            content: "\n".into(),
        };
        assert_eq!(
            draft.validate(ClassId::new(1), fixed_now()).unwrap_err(),
            LessonError::EmptyContent
        );
    }

    #[test]
    fn blank_objective_becomes_none() {
        let lesson = LessonDraft {
            topic: "Weather".into(),
            objective: Some("   ".into()),
            content: "Look outside.".into(),
        }
        .validate(ClassId::new(2), fixed_now())
        .unwrap()
        .assign_id(LessonId::new(9));
        assert_eq!(lesson.objective(), None);
        assert!(lesson.visual_schedule().is_none());
    }

    #[test]
    fn schedule_positions_are_one_based() {
        let schedule = VisualSchedule::build(vec![
            (proposed("Hello"), None),
            (
                proposed("Story"),
                Some(Pictogram {
                    id: 7,
                    image_url: "https://example.test/7.png".into(),
                }),
            ),
        ])
        .unwrap();
        let positions: Vec<u8> = schedule.steps().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(schedule.pictogram_count(), 1);
    }

    #[test]
    fn schedule_rejects_empty_and_oversized() {
        assert_eq!(
            VisualSchedule::build(Vec::new()).unwrap_err(),
            LessonError::EmptySchedule
        );
        let many = (0..13).map(|i| (proposed(&format!("Step {i}")), None));
        assert_eq!(
            VisualSchedule::build(many).unwrap_err(),
            LessonError::TooManySteps(13)
        );
    }

    #[test]
    fn schedule_deserialize_checks_positions() {
        let json = r#"[{"position":2,"label":"A","keyword":"a","pictogram":null}]"#;
        assert!(serde_json::from_str::<VisualSchedule>(json).is_err());

        let json = r#"[{"position":1,"label":"A","keyword":"a","pictogram":null}]"#;
        let schedule: VisualSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(serde_json::to_string(&schedule).unwrap(), json);
    }
}
