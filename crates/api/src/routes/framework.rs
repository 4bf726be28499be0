use axum::Json;
use axum::extract::Path;
use serde::Serialize;
use serde_json::{Value, json};

use aet_core::framework::{self, FRAMEWORK_VERSION};
use aet_core::{ProgressionLevel, SubcategoryPath};

use crate::ApiError;

/// GET /api/health
pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "framework_version": FRAMEWORK_VERSION }))
}

/// GET /api/framework
pub(crate) async fn tree() -> Json<Value> {
    Json(json!({
        "version": FRAMEWORK_VERSION,
        "subcategory_count": framework::subcategory_count(),
        "areas": framework::areas(),
    }))
}

#[derive(Serialize)]
pub(crate) struct LevelView {
    value: u8,
    key: &'static str,
    label: &'static str,
    description: &'static str,
}

/// GET /api/framework/levels
pub(crate) async fn levels() -> Json<Vec<LevelView>> {
    Json(
        ProgressionLevel::all()
            .into_iter()
            .map(|level| LevelView {
                value: level.as_u8(),
                key: level.as_str(),
                label: level.label(),
                description: level.description(),
            })
            .collect(),
    )
}

/// GET /api/framework/subcategories/{id}
pub(crate) async fn subcategory(Path(id): Path<String>) -> Result<Json<SubcategoryPath>, ApiError> {
    framework::subcategory_path(id.trim())
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("unknown framework subcategory: {id}")))
}
