//! Prompt text sent to the language model, and parsing of its structured
//! replies.
//!
//! Prompts carry a student's first name only. Empty profile fields are left
//! out entirely.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::framework::SubcategoryPath;
use crate::model::{Class, Lesson, LessonError, MAX_SCHEDULE_STEPS, ProgressRecord, ProposedStep, Student};
use crate::summary::ClassFocus;

pub const SYSTEM_PROMPT: &str = "\
You are an experienced special educational needs teacher supporting autistic pupils. \
You write practical, strengths-based guidance that a class teacher or teaching assistant \
can use the same day. Use clear headings and short bullet points in Markdown. \
Keep language respectful and neurodiversity-affirming.

When you suggest an outside resource, do not write a URL. Write a resource token of the form \
{{Platform|search terms}} where Platform is one of YouTube, Google, Images, Pinterest, \
Twinkl or Wikipedia, for example {{YouTube|turn taking song for children}}. \
Use at most one token per bullet point.";

//
// ─── GOAL PLAN ─────────────────────────────────────────────────────────────────
//

fn push_field(out: &mut String, label: &str, value: &str) {
    out.push_str("- ");
    out.push_str(label);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

fn student_profile_block(out: &mut String, student: &Student, today: NaiveDate) {
    out.push_str("## Student\n");
    push_field(out, "First name", student.first_name());
    if let Some(age) = student.age_on(today) {
        push_field(out, "Age", &age.to_string());
    }
    for (label, value) in student.profile().labelled_fields() {
        push_field(out, label, value);
    }
}

/// Prompt asking for an individual goal plan for one subcategory.
///
/// When `record` already carries a plan, the prompt asks for a revision of it.
#[must_use]
pub fn goal_plan_prompt(
    student: &Student,
    path: SubcategoryPath,
    record: Option<&ProgressRecord>,
    today: NaiveDate,
) -> String {
    let current = record.map(ProgressRecord::level).unwrap_or_default();
    let target = current.next();

    let mut out = String::new();
    student_profile_block(&mut out, student, today);

    out.push_str("\n## Framework target\n");
    push_field(&mut out, "Area", path.area.name);
    push_field(&mut out, "Category", path.category.name);
    push_field(
        &mut out,
        "Subcategory",
        &format!("{} {}", path.subcategory.code, path.subcategory.name),
    );
    push_field(
        &mut out,
        "Current level",
        &format!("{} ({})", current.label(), current.description()),
    );
    if target == current {
        push_field(&mut out, "Target", "maintain and extend the generalised skill");
    } else {
        push_field(
            &mut out,
            "Target level",
            &format!("{} ({})", target.label(), target.description()),
        );
    }

    if let Some(existing) = record.and_then(ProgressRecord::plan) {
        out.push_str("\n## Existing plan\n");
        out.push_str(existing);
        out.push_str("\n\nRevise and improve the existing plan rather than starting over.\n");
    }

    out.push_str(&format!(
        "\n## Task\nWrite a goal plan that helps {} move towards the target. Include: \
         a SMART goal, 3-5 teaching strategies that draw on the student's interests and \
         strengths, adjustments for sensory and communication needs, how progress will be \
         observed, and 2-3 suggested resources as resource tokens.\n",
        student.first_name()
    ));
    out
}

//
// ─── LESSON PLAN ───────────────────────────────────────────────────────────────
//

/// Teacher input for a generated lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRequest {
    pub topic: String,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u16>,
}

impl LessonRequest {
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTopic` if the topic is blank.
    pub fn validate(self) -> Result<Self, LessonError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(LessonError::EmptyTopic);
        }
        Ok(Self {
            topic: topic.to_owned(),
            objective: self
                .objective
                .map(|o| o.trim().to_owned())
                .filter(|o| !o.is_empty()),
            duration_minutes: self.duration_minutes.filter(|&d| d > 0),
        })
    }
}

fn needs_line(student: &Student) -> Option<String> {
    let profile = student.profile();
    let parts: Vec<String> = [
        ("interests", &profile.interests),
        ("sensory needs", &profile.sensory_needs),
        ("communication", &profile.communication_style),
        ("support", &profile.support_strategies),
        ("triggers", &profile.triggers),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_deref().map(|v| format!("{label}: {v}")))
    .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

/// Prompt asking for a whole-class lesson plan.
///
/// Students appear as "Student 1", "Student 2" and so on; no names are sent.
#[must_use]
pub fn lesson_plan_prompt(
    class: &Class,
    students: &[Student],
    request: &LessonRequest,
    focus: &[ClassFocus],
) -> String {
    let mut out = String::from("## Class\n");
    push_field(&mut out, "Name", class.name());
    if let Some(description) = class.description() {
        push_field(&mut out, "Description", description);
    }
    if let Some(range) = class.age_range() {
        push_field(&mut out, "Ages", &range.to_string());
    }
    push_field(&mut out, "Number of students", &students.len().to_string());

    let needs: Vec<String> = students
        .iter()
        .enumerate()
        .filter_map(|(i, s)| needs_line(s).map(|line| format!("- Student {}: {line}\n", i + 1)))
        .collect();
    if !needs.is_empty() {
        out.push_str("\n## Individual needs\n");
        for line in needs {
            out.push_str(&line);
        }
    }

    if !focus.is_empty() {
        out.push_str("\n## Shared development priorities\n");
        for item in focus {
            out.push_str(&format!(
                "- {} ({}, {} of {} students)\n",
                item.path.subcategory.name,
                item.path.area.name,
                item.students,
                students.len()
            ));
        }
    }

    out.push_str("\n## Lesson\n");
    push_field(&mut out, "Topic", &request.topic);
    if let Some(objective) = &request.objective {
        push_field(&mut out, "Objective", objective);
    }
    if let Some(minutes) = request.duration_minutes {
        push_field(&mut out, "Duration", &format!("{minutes} minutes"));
    }

    out.push_str(
        "\n## Task\nWrite a lesson plan with: a learning objective, resources, a \
         structured sequence (welcome, teaching input, activity, plenary) with timings, \
         differentiation for the individual needs above, sensory and regulation breaks, \
         and how the shared priorities are practised. Suggest resources as resource tokens.\n",
    );
    out
}

//
// ─── VISUAL SCHEDULE ───────────────────────────────────────────────────────────
//

/// Prompt asking for the lesson broken into picture-supported steps.
#[must_use]
pub fn visual_schedule_prompt(lesson: &Lesson) -> String {
    let mut out = String::from("## Lesson\n");
    push_field(&mut out, "Topic", lesson.topic());
    if let Some(objective) = lesson.objective() {
        push_field(&mut out, "Objective", objective);
    }
    out.push('\n');
    out.push_str(lesson.content());
    out.push_str(&format!(
        "\n\n## Task\nBreak this lesson into a visual schedule of at most {MAX_SCHEDULE_STEPS} \
         steps for autistic pupils. Reply with only a JSON array, no prose. Each element is an \
         object {{\"label\": short step text of at most 5 words, \"keyword\": one simple \
         English noun or verb to search a pictogram library}}.\n"
    ));
    out
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScheduleParseError {
    #[error("reply contains no JSON array")]
    NoJsonArray,

    #[error("reply JSON is invalid: {0}")]
    InvalidJson(String),

    #[error("reply contains no usable schedule steps")]
    NoSteps,
}

fn step_from_value(value: &Value) -> Option<ProposedStep> {
    let (label, keyword) = match value {
        Value::String(s) => (s.as_str(), None),
        Value::Object(map) => (
            map.get("label").and_then(Value::as_str)?,
            map.get("keyword").and_then(Value::as_str),
        ),
        _ => return None,
    };
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    let keyword = keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(label);
    Some(ProposedStep {
        label: label.to_owned(),
        keyword: keyword.to_owned(),
    })
}

/// Parse a model reply into schedule steps.
///
/// Tolerates code fences and prose around the array: each `[` is tried in
/// turn and the first JSON array holding a usable step wins. Blank labels are
/// dropped, a missing keyword falls back to the label, and at most
/// [`MAX_SCHEDULE_STEPS`] steps are kept.
///
/// # Errors
///
/// Returns `ScheduleParseError` if no array is found, none is valid JSON, or
/// no usable step remains.
pub fn parse_schedule_reply(text: &str) -> Result<Vec<ProposedStep>, ScheduleParseError> {
    let mut error = ScheduleParseError::NoJsonArray;

    for (start, _) in text.match_indices('[') {
        let mut stream =
            serde_json::Deserializer::from_str(&text[start..]).into_iter::<Vec<Value>>();
        match stream.next() {
            Some(Ok(items)) => {
                let steps: Vec<ProposedStep> = items
                    .iter()
                    .filter_map(step_from_value)
                    .take(MAX_SCHEDULE_STEPS)
                    .collect();
                if !steps.is_empty() {
                    return Ok(steps);
                }
                error = ScheduleParseError::NoSteps;
            }
            Some(Err(e)) => {
                if error == ScheduleParseError::NoJsonArray {
                    error = ScheduleParseError::InvalidJson(e.to_string());
                }
            }
            None => {}
        }
    }

    Err(error)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{SubcategoryId, subcategory_path};
    use crate::model::{ClassDraft, ClassId, LessonDraft, LessonId, StudentDraft, StudentId};
    use crate::progression::ProgressionLevel;
    use crate::summary::class_focus;
    use crate::time::fixed_now;

    fn student() -> Student {
        let mut draft = StudentDraft {
            name: "Maya Thompson".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2016, 3, 4),
            ..StudentDraft::default()
        };
        draft.profile.interests = Some("dinosaurs".into());
        draft.profile.sensory_needs = Some("ear defenders in assembly".into());
        draft
            .validate(fixed_now())
            .unwrap()
            .assign_id(StudentId::new(1))
    }

    #[test]
    fn goal_prompt_uses_first_name_and_skips_empty_fields() {
        let path = subcategory_path("communication.2.3").unwrap();
        let prompt = goal_plan_prompt(&student(), path, None, fixed_now().date_naive());

        assert!(prompt.contains("- First name: Maya"));
        assert!(!prompt.contains("Thompson"));
        assert!(prompt.contains("- Age: 7"));
        assert!(prompt.contains("- Interests: dinosaurs"));
        assert!(!prompt.contains("Diagnoses"));
        assert!(!prompt.contains("None"));
        assert!(prompt.contains("2.3 Understanding questions"));
        assert!(prompt.contains("Current level: Not Yet Developed"));
        assert!(prompt.contains("Target level: Developing"));
        assert!(!prompt.contains("Existing plan"));
    }

    #[test]
    fn goal_prompt_includes_existing_plan_when_regenerating() {
        let id = SubcategoryId::parse("communication.2.3").unwrap();
        let mut record = ProgressRecord::new(StudentId::new(1), id.clone(), fixed_now());
        record.set_level(ProgressionLevel::Generalised, fixed_now());
        record.set_plan("Use visual question cards.", fixed_now());

        let prompt = goal_plan_prompt(
            &student(),
            id.path().unwrap(),
            Some(&record),
            fixed_now().date_naive(),
        );
        assert!(prompt.contains("## Existing plan\nUse visual question cards."));
        assert!(prompt.contains("maintain and extend"));
    }

    #[test]
    fn lesson_prompt_is_anonymised() {
        let class = ClassDraft {
            name: "Oak".into(),
            description: Some("KS2 resource base".into()),
            age_min: Some(7),
            age_max: Some(9),
        }
        .validate(fixed_now())
        .unwrap()
        .assign_id(ClassId::new(1));
        let students = vec![student()];
        let records = Vec::new();
        let focus = class_focus([records.as_slice()], 1, 2);
        let request = LessonRequest {
            topic: "Weather".into(),
            objective: None,
            duration_minutes: Some(30),
        }
        .validate()
        .unwrap();

        let prompt = lesson_plan_prompt(&class, &students, &request, &focus);
        assert!(prompt.contains("- Ages: 7-9"));
        assert!(prompt.contains("- Student 1: interests: dinosaurs"));
        assert!(!prompt.contains("Maya"));
        assert!(prompt.contains("- Duration: 30 minutes"));
        assert!(prompt.contains("- Requesting wants and needs (Communication and Interaction, 1 of 1 students)"));
        assert!(!prompt.contains("Objective:"));
    }

    #[test]
    fn lesson_request_requires_topic() {
        let err = LessonRequest::default().validate().unwrap_err();
        assert_eq!(err, LessonError::EmptyTopic);
    }

    #[test]
    fn schedule_prompt_mentions_step_cap() {
        let lesson = LessonDraft {
            topic: "Weather".into(),
            objective: None,
            content: "Look outside and talk about the sky.".into(),
        }
        .validate(ClassId::new(1), fixed_now())
        .unwrap()
        .assign_id(LessonId::new(1));
        let prompt = visual_schedule_prompt(&lesson);
        assert!(prompt.contains("at most 12 steps"));
        assert!(prompt.contains("\"keyword\""));
    }

    #[test]
    fn parses_fenced_reply() {
        let reply = "Here you go:\n```json\n[{\"label\": \" Hello \", \"keyword\": \"greet\"}, \
                     {\"label\": \"\"}, {\"label\": \"Story time\"}]\n```";
        let steps = parse_schedule_reply(reply).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].label, "Hello");
        assert_eq!(steps[0].keyword, "greet");
        assert_eq!(steps[1].keyword, "Story time");
    }

    #[test]
    fn caps_steps_and_rejects_empty() {
        let many: Vec<String> = (0..20).map(|i| format!("\"step {i}\"")).collect();
        let reply = format!("[{}]", many.join(","));
        assert_eq!(parse_schedule_reply(&reply).unwrap().len(), 12);

        assert_eq!(
            parse_schedule_reply("no array here"),
            Err(ScheduleParseError::NoJsonArray)
        );
        assert_eq!(
            parse_schedule_reply("[{\"label\": \"  \"}]"),
            Err(ScheduleParseError::NoSteps)
        );
        assert!(matches!(
            parse_schedule_reply("[not json]"),
            Err(ScheduleParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn skips_bracketed_prose_before_the_array() {
        let reply = "Steps [draft]:\n[{\"label\": \"Hello\", \"keyword\": \"hello\"}, \
                     {\"label\": \"Work\"}]\nLet me know [if needed].";
        let steps = parse_schedule_reply(reply).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].keyword, "hello");
        assert_eq!(steps[1].label, "Work");

        let reply = "Options [1, 2]\n[\"Circle time\"]";
        assert_eq!(parse_schedule_reply(reply).unwrap()[0].label, "Circle time");
    }
}
