use axum::{extract::State, Json};

use super::{AppJson, AppState, ErrorResponse};
use crate::models::{RaceContext, RacePlan};

/// `POST /api/race-plan`
pub async fn generate_race_plan(
    State(state): State<AppState>,
    AppJson(context): AppJson<RaceContext>,
) -> Result<Json<RacePlan>, ErrorResponse> {
    let plan = state
        .generator
        .generate(&context)
        .await
        .map_err(|e| state.reject(e))?;

    tracing::info!(chars = plan.full_text.len(), "race plan generated");
    Ok(Json(plan))
}
