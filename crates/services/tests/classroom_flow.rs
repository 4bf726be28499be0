use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use aet_core::Clock;
use aet_core::model::{ClassDraft, LessonDraft, LessonId, Pictogram, StudentDraft, StudentProfile};
use aet_core::prompt::LessonRequest;
use aet_core::time::fixed_now;
use aet_core::ProgressionLevel;
use async_trait::async_trait;
use services::ai::{Generation, PictogramSource, TextGenerator, TokenUsage};
use services::{
    AiError, AiLimits, AiUsageError, AppServices, LessonServiceError, PictogramError,
    ProgressServiceError,
};
use storage::Storage;

#[derive(Default)]
struct ScriptedGenerator {
    disabled: bool,
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Some((*r).to_string())).collect()),
            ..Self::default()
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model(&self) -> &str {
        "scripted"
    }

    fn enabled(&self) -> bool {
        !self.disabled
    }

    async fn generate(&self, _system: &str, prompt: &str) -> Result<Generation, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front().flatten() {
            Some(text) => Ok(Generation {
                text,
                usage: Some(TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                }),
            }),
            None => Err(AiError::EmptyResponse),
        }
    }
}

struct StubPictograms;

#[async_trait]
impl PictogramSource for StubPictograms {
    async fn search(&self, keyword: &str) -> Result<Option<Pictogram>, PictogramError> {
        match keyword {
            "hello" => Ok(Some(Pictogram {
                id: 6009,
                image_url: "https://static.arasaac.org/pictograms/6009/6009_300.png".into(),
            })),
            "broken" => Err(PictogramError::InvalidBaseUrl("stub".into())),
            _ => Ok(None),
        }
    }
}

fn services(generator: Arc<ScriptedGenerator>, limits: AiLimits) -> AppServices {
    AppServices::with_clients(
        Storage::in_memory(),
        Clock::fixed(fixed_now()),
        limits,
        generator,
        Arc::new(StubPictograms),
    )
}

fn open_limits() -> AiLimits {
    AiLimits {
        daily_cap: 10,
        cooldown_secs: 0,
    }
}

async fn seed_class(app: &AppServices) -> (aet_core::model::ClassId, aet_core::model::StudentId) {
    let class = app
        .classes()
        .create(ClassDraft {
            name: "Oak".into(),
            age_min: Some(7),
            age_max: Some(9),
            ..ClassDraft::default()
        })
        .await
        .unwrap();
    let student = app
        .students()
        .create(StudentDraft {
            class_id: Some(class.id()),
            name: "Ava Lee".into(),
            profile: StudentProfile {
                interests: Some("trains".into()),
                ..StudentProfile::default()
            },
            ..StudentDraft::default()
        })
        .await
        .unwrap();
    (class.id(), student.id())
}

#[tokio::test]
async fn goal_plan_is_generated_linked_and_stored() {
    let generator = ScriptedGenerator::replying(&["Try {{YouTube|asking for help song}}."]);
    let app = services(Arc::clone(&generator), open_limits());
    let (_, ava) = seed_class(&app).await;

    app.progress()
        .set_level(ava, "communication.1.1", ProgressionLevel::Developing)
        .await
        .unwrap();
    let record = app.plans().generate(ava, "communication.1.1").await.unwrap();

    assert_eq!(
        record.plan(),
        Some(
            "Try [asking for help song (YouTube)](https://www.youtube.com/results?search_query=asking+for+help+song)."
        )
    );
    assert_eq!(record.level(), ProgressionLevel::Developing);

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("- First name: Ava"));
    assert!(prompt.contains("Target level: Established"));

    let report = app.assistant().usage_report().await.unwrap();
    assert_eq!(report.requests_today, 1);
    assert_eq!(report.remaining, 9);
    assert_eq!(report.model, "scripted");
}

#[tokio::test]
async fn failed_generation_stores_nothing_but_counts_the_attempt() {
    let generator = Arc::new(ScriptedGenerator::default());
    let app = services(generator, open_limits());
    let (_, ava) = seed_class(&app).await;

    let err = app
        .plans()
        .generate(ava, "social.1.1")
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressServiceError::Ai(AiError::EmptyResponse)));

    let tree = app.progress().tree(ava).await.unwrap();
    assert!(
        tree.areas
            .iter()
            .flat_map(|a| &a.categories)
            .flat_map(|c| &c.subcategories)
            .all(|s| s.plan.is_none())
    );
    assert_eq!(app.assistant().usage_report().await.unwrap().requests_today, 1);
}

#[tokio::test]
async fn disabled_generator_is_reported_and_not_logged() {
    let generator = Arc::new(ScriptedGenerator {
        disabled: true,
        ..ScriptedGenerator::default()
    });
    let app = services(Arc::clone(&generator), open_limits());
    let (class_id, _) = seed_class(&app).await;

    let err = app
        .lessons()
        .generate_draft(
            class_id,
            LessonRequest {
                topic: "Weather".into(),
                ..LessonRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LessonServiceError::Ai(AiError::Disabled)));

    let report = app.assistant().usage_report().await.unwrap();
    assert!(!report.enabled);
    assert_eq!(report.requests_today, 0);
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn daily_cap_blocks_further_requests() {
    let generator = ScriptedGenerator::replying(&["Plan A", "Plan B"]);
    let app = services(
        generator,
        AiLimits {
            daily_cap: 1,
            cooldown_secs: 0,
        },
    );
    let (_, ava) = seed_class(&app).await;

    app.plans().generate(ava, "sensory.1.1").await.unwrap();
    let err = app.plans().generate(ava, "sensory.1.2").await.unwrap_err();
    assert!(matches!(
        err,
        ProgressServiceError::Ai(AiError::Usage(AiUsageError::DailyCapReached { cap: 1 }))
    ));
}

#[tokio::test]
async fn lesson_draft_is_anonymised_and_not_saved() {
    let generator = ScriptedGenerator::replying(&["Sing {{Twinkl|weather song}}."]);
    let app = services(Arc::clone(&generator), open_limits());
    let (class_id, _) = seed_class(&app).await;

    let draft = app
        .lessons()
        .generate_draft(
            class_id,
            LessonRequest {
                topic: "  Weather ".into(),
                objective: Some("Name three kinds of weather".into()),
                duration_minutes: Some(30),
            },
        )
        .await
        .unwrap();
    assert_eq!(draft.topic, "Weather");
    assert!(draft.content.contains("(Twinkl)](https://www.twinkl.co.uk/search?q=weather+song)"));
    assert!(app.lessons().history(class_id, 10).await.unwrap().is_empty());

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("- Student 1: interests: trains"));
    assert!(!prompt.contains("Ava"));
    assert!(prompt.contains("## Shared development priorities"));
}

#[tokio::test]
async fn visual_schedule_resolves_pictograms_and_tolerates_lookup_failures() {
    let generator = ScriptedGenerator::replying(&[
        "```json\n[{\"label\": \"Say hello\", \"keyword\": \"hello\"}, \
         {\"label\": \"Mystery step\", \"keyword\": \"broken\"}, \"Tidy up\"]\n```",
    ]);
    let app = services(generator, open_limits());
    let (class_id, _) = seed_class(&app).await;

    let lesson = app
        .lessons()
        .save(
            class_id,
            LessonDraft {
                topic: "Weather".into(),
                objective: None,
                content: "Look outside and talk about the sky.".into(),
            },
        )
        .await
        .unwrap();

    let lesson = app
        .lessons()
        .generate_visual_schedule(lesson.id())
        .await
        .unwrap();
    let schedule = lesson.visual_schedule().unwrap();
    assert_eq!(schedule.len(), 3);
    assert_eq!(schedule.pictogram_count(), 1);
    assert_eq!(schedule.steps()[0].pictogram.as_ref().unwrap().id, 6009);
    assert_eq!(schedule.steps()[1].pictogram, None);
    assert_eq!(schedule.steps()[2].keyword, "Tidy up");

    let stored = app.lessons().get(lesson.id()).await.unwrap();
    assert_eq!(stored.visual_schedule(), Some(schedule));
}

#[tokio::test]
async fn visual_schedule_rejects_replies_without_steps() {
    let generator = ScriptedGenerator::replying(&["Sorry, I cannot help with that."]);
    let app = services(generator, open_limits());
    let (class_id, _) = seed_class(&app).await;
    let lesson = app
        .lessons()
        .save(
            class_id,
            LessonDraft {
                topic: "Art".into(),
                objective: None,
                content: "Paint.".into(),
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        app.lessons().generate_visual_schedule(lesson.id()).await,
        Err(LessonServiceError::Schedule(_))
    ));
    assert!(matches!(
        app.lessons().generate_visual_schedule(LessonId::new(999)).await,
        Err(LessonServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn lesson_history_is_newest_first_and_deletable() {
    let app = services(Arc::new(ScriptedGenerator::default()), open_limits());
    let (class_id, _) = seed_class(&app).await;

    for topic in ["One", "Two"] {
        app.lessons()
            .save(
                class_id,
                LessonDraft {
                    topic: topic.into(),
                    objective: None,
                    content: "Plan".into(),
                },
            )
            .await
            .unwrap();
    }
    let history = app.lessons().history(class_id, 10).await.unwrap();
    assert_eq!(history.len(), 2);

    app.lessons().delete(history[0].id()).await.unwrap();
    assert_eq!(app.lessons().history(class_id, 10).await.unwrap().len(), 1);
    assert!(matches!(
        app.lessons().delete(history[0].id()).await,
        Err(LessonServiceError::NotFound(_))
    ));
}
