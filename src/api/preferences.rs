use axum::{extract::State, Json};
use uuid::Uuid;

use super::{ApiError, AppJson, AppPath, AppState, ErrorResponse};
use crate::models::{UpdatePreferencesInput, UserPreferences};

pub async fn get_preferences(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<UserPreferences>, ErrorResponse> {
    state
        .db
        .get_preferences(user_id)
        .map_err(ApiError::from)
        .and_then(|prefs| prefs.ok_or(ApiError::NotFound("preferences")))
        .map(Json)
        .map_err(|e| state.reject(e))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdatePreferencesInput>,
) -> Result<Json<UserPreferences>, ErrorResponse> {
    save_preferences(&state, user_id, input)
        .map(Json)
        .map_err(|e| state.reject(e))
}

fn save_preferences(
    state: &AppState,
    user_id: Uuid,
    input: UpdatePreferencesInput,
) -> Result<UserPreferences, ApiError> {
    if state.db.get_user(user_id)?.is_none() {
        return Err(ApiError::NotFound("user"));
    }
    if matches!(input.ftp, Some(Some(0))) {
        return Err(ApiError::BadRequest("ftp must be greater than zero".into()));
    }

    Ok(state.db.upsert_preferences(user_id, input)?)
}
