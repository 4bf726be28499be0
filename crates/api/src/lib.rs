//! JSON HTTP API over the app services.
//!
//! All routes live under `/api/`. Errors are returned as
//! `{"error": code, "message": text}` with a status derived from the
//! underlying service error.

#![forbid(unsafe_code)]

pub mod error;
mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use services::AppServices;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    services: Arc<AppServices>,
}

impl ApiState {
    #[must_use]
    pub fn new(services: AppServices) -> Self {
        Self {
            services: Arc::new(services),
        }
    }

    #[must_use]
    pub fn services(&self) -> &AppServices {
        &self.services
    }
}

/// Build the application router.
pub fn router(state: ApiState) -> Router {
    use routes::{ai, classes, framework, lessons, progress, students};

    Router::new()
        .route("/api/health",                                    get(framework::health))
        .route("/api/framework",                                 get(framework::tree))
        .route("/api/framework/levels",                          get(framework::levels))
        .route("/api/framework/subcategories/{id}",              get(framework::subcategory))
        .route("/api/classes",                                   get(classes::list).post(classes::create))
        .route("/api/classes/{id}",                              get(classes::get).put(classes::update).delete(classes::delete))
        .route("/api/classes/{id}/students",                     get(classes::students))
        .route("/api/classes/{id}/summary",                      get(progress::class_summary))
        .route("/api/classes/{id}/lessons",                      get(lessons::history).post(lessons::save))
        .route("/api/classes/{id}/lessons/generate",             post(lessons::generate))
        .route("/api/lessons/{id}",                              get(lessons::get).delete(lessons::delete))
        .route("/api/lessons/{id}/visual-schedule",              post(lessons::visual_schedule))
        .route("/api/students",                                  get(students::list).post(students::create))
        .route("/api/students/{id}",                             get(students::get).put(students::update).delete(students::delete))
        .route("/api/students/{id}/progress",                    get(progress::tree))
        .route("/api/students/{id}/summary",                     get(progress::summary))
        .route("/api/students/{id}/progress/{sub}/level",        put(progress::set_level))
        .route("/api/students/{id}/progress/{sub}/complete",     post(progress::toggle_completed))
        .route("/api/students/{id}/progress/{sub}/plan",         put(progress::save_plan).delete(progress::clear_plan))
        .route("/api/students/{id}/progress/{sub}/plan/generate", post(progress::generate_plan))
        .route("/api/ai/usage",                                  get(ai::usage))
        .with_state(state)
}
