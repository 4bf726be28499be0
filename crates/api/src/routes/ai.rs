use axum::Json;
use axum::extract::State;
use services::AiUsageReport;

use crate::{ApiError, ApiState};

/// GET /api/ai/usage
pub(crate) async fn usage(State(state): State<ApiState>) -> Result<Json<AiUsageReport>, ApiError> {
    Ok(Json(state.services().assistant().usage_report().await?))
}
