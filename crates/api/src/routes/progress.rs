use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::Deserialize;

use aet_core::ProgressionLevel;
use aet_core::model::{ClassId, ProgressRecord, StudentId};
use aet_core::summary::{ClassSummary, ProgressTree, StudentSummary};

use super::parse_id;
use crate::{ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub(crate) struct LevelRequest {
    level: ProgressionLevel,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlanRequest {
    plan: String,
}

/// GET /api/students/{id}/progress
pub(crate) async fn tree(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ProgressTree>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    Ok(Json(state.services().progress().tree(id).await?))
}

/// GET /api/students/{id}/summary
pub(crate) async fn summary(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<StudentSummary>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    Ok(Json(state.services().progress().summary(id).await?))
}

/// GET /api/classes/{id}/summary
pub(crate) async fn class_summary(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ClassSummary>, ApiError> {
    let id: ClassId = parse_id(&id)?;
    Ok(Json(state.services().progress().class_summary(id).await?))
}

/// PUT /api/students/{id}/progress/{sub}/level
pub(crate) async fn set_level(
    State(state): State<ApiState>,
    Path((id, sub)): Path<(String, String)>,
    payload: Result<Json<LevelRequest>, JsonRejection>,
) -> Result<Json<ProgressRecord>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    let Json(req) = payload?;
    let record = state
        .services()
        .progress()
        .set_level(id, &sub, req.level)
        .await?;
    Ok(Json(record))
}

/// POST /api/students/{id}/progress/{sub}/complete
pub(crate) async fn toggle_completed(
    State(state): State<ApiState>,
    Path((id, sub)): Path<(String, String)>,
) -> Result<Json<ProgressRecord>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    Ok(Json(state.services().progress().toggle_completed(id, &sub).await?))
}

/// PUT /api/students/{id}/progress/{sub}/plan
pub(crate) async fn save_plan(
    State(state): State<ApiState>,
    Path((id, sub)): Path<(String, String)>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<ProgressRecord>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    let Json(req) = payload?;
    let record = state
        .services()
        .progress()
        .save_plan(id, &sub, &req.plan)
        .await?;
    Ok(Json(record))
}

/// DELETE /api/students/{id}/progress/{sub}/plan
pub(crate) async fn clear_plan(
    State(state): State<ApiState>,
    Path((id, sub)): Path<(String, String)>,
) -> Result<Json<ProgressRecord>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    Ok(Json(state.services().progress().clear_plan(id, &sub).await?))
}

/// POST /api/students/{id}/progress/{sub}/plan/generate
pub(crate) async fn generate_plan(
    State(state): State<ApiState>,
    Path((id, sub)): Path<(String, String)>,
) -> Result<Json<ProgressRecord>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    Ok(Json(state.services().plans().generate(id, &sub).await?))
}
