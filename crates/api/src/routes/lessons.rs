use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use aet_core::model::{ClassId, Lesson, LessonDraft, LessonId};
use aet_core::prompt::LessonRequest;
use services::DEFAULT_HISTORY_LIMIT;

use super::parse_id;
use crate::{ApiError, ApiState};

/// Upper bound for `?limit=`.
const MAX_HISTORY_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    limit: Option<u32>,
}

/// GET /api/classes/{id}/lessons?limit=
pub(crate) async fn history(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    let id: ClassId = parse_id(&id)?;
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(state.services().lessons().history(id, limit).await?))
}

/// POST /api/classes/{id}/lessons
pub(crate) async fn save(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<LessonDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Lesson>), ApiError> {
    let id: ClassId = parse_id(&id)?;
    let Json(draft) = payload?;
    let lesson = state.services().lessons().save(id, draft).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// POST /api/classes/{id}/lessons/generate
pub(crate) async fn generate(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<LessonRequest>, JsonRejection>,
) -> Result<Json<LessonDraft>, ApiError> {
    let id: ClassId = parse_id(&id)?;
    let Json(request) = payload?;
    Ok(Json(state.services().lessons().generate_draft(id, request).await?))
}

/// GET /api/lessons/{id}
pub(crate) async fn get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Lesson>, ApiError> {
    let id: LessonId = parse_id(&id)?;
    Ok(Json(state.services().lessons().get(id).await?))
}

/// DELETE /api/lessons/{id}
pub(crate) async fn delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: LessonId = parse_id(&id)?;
    state.services().lessons().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/lessons/{id}/visual-schedule
pub(crate) async fn visual_schedule(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Lesson>, ApiError> {
    let id: LessonId = parse_id(&id)?;
    Ok(Json(
        state
            .services()
            .lessons()
            .generate_visual_schedule(id)
            .await?,
    ))
}
