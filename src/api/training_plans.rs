use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use super::{ApiError, AppJson, AppPath, AppState, ErrorResponse};
use crate::models::{CreateTrainingPlanInput, TrainingPlan};

pub async fn list_training_plans(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<Vec<TrainingPlan>>, ErrorResponse> {
    state
        .db
        .list_training_plans(user_id)
        .map(Json)
        .map_err(|e| state.reject(e))
}

pub async fn create_training_plan(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(input): AppJson<CreateTrainingPlanInput>,
) -> Result<(StatusCode, Json<TrainingPlan>), ErrorResponse> {
    insert_training_plan(&state, user_id, input)
        .map(|plan| (StatusCode::CREATED, Json(plan)))
        .map_err(|e| state.reject(e))
}

fn insert_training_plan(
    state: &AppState,
    user_id: Uuid,
    input: CreateTrainingPlanInput,
) -> Result<TrainingPlan, ApiError> {
    if input.event_name.trim().is_empty() {
        return Err(ApiError::BadRequest("event_name must not be empty".into()));
    }
    if state.db.get_user(user_id)?.is_none() {
        return Err(ApiError::NotFound("user"));
    }

    Ok(state.db.create_training_plan(user_id, input)?)
}

pub async fn get_training_plan(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TrainingPlan>, ErrorResponse> {
    state
        .db
        .get_training_plan(id)
        .map_err(ApiError::from)
        .and_then(|plan| plan.ok_or(ApiError::NotFound("training plan")))
        .map(Json)
        .map_err(|e| state.reject(e))
}

pub async fn delete_training_plan(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ErrorResponse> {
    match state.db.delete_training_plan(id) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(state.reject(ApiError::NotFound("training plan"))),
        Err(e) => Err(state.reject(e)),
    }
}
