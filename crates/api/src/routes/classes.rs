use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use aet_core::model::{Class, ClassDraft, ClassId, Student};

use super::parse_id;
use crate::{ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub(crate) struct ClassRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    age_min: Option<u8>,
    #[serde(default)]
    age_max: Option<u8>,
}

impl From<ClassRequest> for ClassDraft {
    fn from(req: ClassRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            age_min: req.age_min,
            age_max: req.age_max,
        }
    }
}

/// GET /api/classes
pub(crate) async fn list(State(state): State<ApiState>) -> Result<Json<Vec<Class>>, ApiError> {
    Ok(Json(state.services().classes().list().await?))
}

/// POST /api/classes
pub(crate) async fn create(
    State(state): State<ApiState>,
    payload: Result<Json<ClassRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Class>), ApiError> {
    let Json(req) = payload?;
    let class = state.services().classes().create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// GET /api/classes/{id}
pub(crate) async fn get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Class>, ApiError> {
    let id: ClassId = parse_id(&id)?;
    Ok(Json(state.services().classes().get(id).await?))
}

/// PUT /api/classes/{id}
pub(crate) async fn update(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<ClassRequest>, JsonRejection>,
) -> Result<Json<Class>, ApiError> {
    let id: ClassId = parse_id(&id)?;
    let Json(req) = payload?;
    Ok(Json(state.services().classes().update(id, req.into()).await?))
}

/// DELETE /api/classes/{id}
pub(crate) async fn delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: ClassId = parse_id(&id)?;
    state.services().classes().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/classes/{id}/students
pub(crate) async fn students(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let id: ClassId = parse_id(&id)?;
    Ok(Json(state.services().classes().students(id).await?))
}
