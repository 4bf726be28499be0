use std::sync::Arc;

use aet_core::Clock;
use aet_core::model::Pictogram;
use aet_core::time::fixed_now;
use api::{ApiState, router};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use services::ai::{Generation, PictogramSource, TextGenerator};
use services::{AiError, AiLimits, AppServices, PictogramError};
use storage::Storage;
use tower::ServiceExt;

struct EchoGenerator {
    enabled: bool,
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    fn model(&self) -> &str {
        "echo"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn generate(&self, _system: &str, prompt: &str) -> Result<Generation, AiError> {
        let text = if prompt.contains("visual schedule") {
            r#"[{"label": "Hello", "keyword": "hello"}, {"label": "Paint", "keyword": "paint"}]"#
                .to_string()
        } else {
            "Use {{Images|feelings faces}} daily.".to_string()
        };
        Ok(Generation { text, usage: None })
    }
}

struct NoPictograms;

#[async_trait]
impl PictogramSource for NoPictograms {
    async fn search(&self, _keyword: &str) -> Result<Option<Pictogram>, PictogramError> {
        Ok(None)
    }
}

fn app(ai_enabled: bool) -> Router {
    let services = AppServices::with_clients(
        Storage::in_memory(),
        Clock::fixed(fixed_now()),
        AiLimits {
            daily_cap: 5,
            cooldown_secs: 0,
        },
        Arc::new(EchoGenerator {
            enabled: ai_enabled,
        }),
        Arc::new(NoPictograms),
    );
    router(ApiState::new(services))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_class(app: &Router) -> u64 {
    let (status, class) = send(
        app,
        Method::POST,
        "/api/classes",
        Some(json!({ "name": "Oak", "age_min": 7, "age_max": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    class["id"].as_u64().unwrap()
}

async fn create_student(app: &Router, class_id: u64) -> u64 {
    let (status, student) = send(
        app,
        Method::POST,
        "/api/students",
        Some(json!({
            "name": "Ava Lee",
            "class_id": class_id,
            "profile": { "interests": "trains" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    student["id"].as_u64().unwrap()
}

#[tokio::test]
async fn health_and_framework_are_static() {
    let app = app(false);

    let (status, health) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");

    let (_, levels) = send(&app, Method::GET, "/api/framework/levels", None).await;
    assert_eq!(levels.as_array().unwrap().len(), 4);
    assert_eq!(levels[0]["label"], "Not Yet Developed");

    let (status, sub) = send(
        &app,
        Method::GET,
        "/api/framework/subcategories/communication.1.1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sub["area_id"], "communication");

    let (status, err) = send(&app, Method::GET, "/api/framework/subcategories/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");
}

#[tokio::test]
async fn class_and_student_crud() {
    let app = app(false);
    let class_id = create_class(&app).await;
    let student_id = create_student(&app, class_id).await;

    let (status, roster) =
        send(&app, Method::GET, &format!("/api/classes/{class_id}/students"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster[0]["name"], "Ava Lee");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/students/{student_id}"),
        Some(json!({ "name": "Ava" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["class_id"], Value::Null);

    let (status, filtered) = send(
        &app,
        Method::GET,
        &format!("/api/students?class_id={class_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(filtered.as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/classes/{class_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/classes/{class_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_and_malformed_input_are_bad_requests() {
    let app = app(false);

    let (status, err) = send(&app, Method::POST, "/api/classes", Some(json!({ "name": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "bad_request");

    let (status, _) = send(&app, Method::GET, "/api/classes/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/api/students", Some(json!({ "nam": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/students",
        Some(json!({ "name": "Ben", "class_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn progress_routes_update_records_and_summaries() {
    let app = app(false);
    let class_id = create_class(&app).await;
    let student_id = create_student(&app, class_id).await;
    let base = format!("/api/students/{student_id}/progress/communication.1.1");

    let (status, record) =
        send(&app, Method::PUT, &format!("{base}/level"), Some(json!({ "level": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["level"], 3);

    let (status, _) =
        send(&app, Method::PUT, &format!("{base}/level"), Some(json!({ "level": 7 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, record) = send(&app, Method::POST, &format!("{base}/complete"), None).await;
    assert_eq!(record["completed"], true);

    let (_, record) = send(
        &app,
        Method::PUT,
        &format!("{base}/plan"),
        Some(json!({ "plan": "Model requests with a choice board." })),
    )
    .await;
    assert_eq!(record["plan"], "Model requests with a choice board.");

    let (_, record) = send(&app, Method::DELETE, &format!("{base}/plan"), None).await;
    assert_eq!(record["plan"], Value::Null);

    let (_, summary) = send(
        &app,
        Method::GET,
        &format!("/api/students/{student_id}/summary"),
        None,
    )
    .await;
    assert_eq!(summary["overall"]["completed"], 1);

    let (status, class_summary) =
        send(&app, Method::GET, &format!("/api/classes/{class_id}/summary"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(class_summary["students"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/students/{student_id}/progress/unknown.1.1/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ai_routes_report_disabled_service() {
    let app = app(false);
    let class_id = create_class(&app).await;
    let student_id = create_student(&app, class_id).await;

    let (status, err) = send(
        &app,
        Method::POST,
        &format!("/api/students/{student_id}/progress/social.1.1/plan/generate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["error"], "ai_disabled");

    let (_, usage) = send(&app, Method::GET, "/api/ai/usage", None).await;
    assert_eq!(usage["enabled"], false);
    assert_eq!(usage["requests_today"], 0);
}

#[tokio::test]
async fn ai_routes_generate_plans_lessons_and_schedules() {
    let app = app(true);
    let class_id = create_class(&app).await;
    let student_id = create_student(&app, class_id).await;

    let (status, record) = send(
        &app,
        Method::POST,
        &format!("/api/students/{student_id}/progress/social.1.1/plan/generate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        record["plan"]
            .as_str()
            .unwrap()
            .contains("[feelings faces (Images)](https://www.google.com/search?tbm=isch&q=feelings+faces)")
    );

    let (status, draft) = send(
        &app,
        Method::POST,
        &format!("/api/classes/{class_id}/lessons/generate"),
        Some(json!({ "topic": "Feelings" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["topic"], "Feelings");

    let (status, lesson) = send(
        &app,
        Method::POST,
        &format!("/api/classes/{class_id}/lessons"),
        Some(draft),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let lesson_id = lesson["id"].as_u64().unwrap();

    let (status, lesson) = send(
        &app,
        Method::POST,
        &format!("/api/lessons/{lesson_id}/visual-schedule"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let steps = lesson["visual_schedule"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1]["position"], 2);
    assert_eq!(steps[1]["pictogram"], Value::Null);

    let (_, history) = send(
        &app,
        Method::GET,
        &format!("/api/classes/{class_id}/lessons?limit=5"),
        None,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (_, usage) = send(&app, Method::GET, "/api/ai/usage", None).await;
    assert_eq!(usage["requests_today"], 3);
    assert_eq!(usage["remaining"], 2);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/lessons/{lesson_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/api/lessons/{lesson_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
