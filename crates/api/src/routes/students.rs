use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;

use aet_core::model::{ClassId, Student, StudentDraft, StudentId, StudentProfile};

use super::parse_id;
use crate::{ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub(crate) struct StudentRequest {
    name: String,
    #[serde(default)]
    class_id: Option<ClassId>,
    #[serde(default)]
    date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    profile: StudentProfile,
}

impl From<StudentRequest> for StudentDraft {
    fn from(req: StudentRequest) -> Self {
        Self {
            class_id: req.class_id,
            name: req.name,
            date_of_birth: req.date_of_birth,
            profile: req.profile,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    class_id: Option<ClassId>,
}

/// GET /api/students?class_id=
pub(crate) async fn list(
    State(state): State<ApiState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.services().students().list(query.class_id).await?))
}

/// POST /api/students
pub(crate) async fn create(
    State(state): State<ApiState>,
    payload: Result<Json<StudentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let Json(req) = payload?;
    let student = state.services().students().create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /api/students/{id}
pub(crate) async fn get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Student>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    Ok(Json(state.services().students().get(id).await?))
}

/// PUT /api/students/{id}
pub(crate) async fn update(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<StudentRequest>, JsonRejection>,
) -> Result<Json<Student>, ApiError> {
    let id: StudentId = parse_id(&id)?;
    let Json(req) = payload?;
    Ok(Json(state.services().students().update(id, req.into()).await?))
}

/// DELETE /api/students/{id}
pub(crate) async fn delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: StudentId = parse_id(&id)?;
    state.services().students().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
