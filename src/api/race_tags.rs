use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use super::{is_constraint_violation, ApiError, AppJson, AppPath, AppState, ErrorResponse};
use crate::models::{CreateRaceTagInput, RaceTag, UpdateRaceTypeInput};

pub async fn list_race_tags(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<Vec<RaceTag>>, ErrorResponse> {
    state
        .db
        .list_race_tags(user_id)
        .map(Json)
        .map_err(|e| state.reject(e))
}

pub async fn create_race_tag(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(input): AppJson<CreateRaceTagInput>,
) -> Result<(StatusCode, Json<RaceTag>), ErrorResponse> {
    insert_race_tag(&state, user_id, input)
        .map(|tag| (StatusCode::CREATED, Json(tag)))
        .map_err(|e| state.reject(e))
}

fn insert_race_tag(
    state: &AppState,
    user_id: Uuid,
    input: CreateRaceTagInput,
) -> Result<RaceTag, ApiError> {
    if state.db.get_user(user_id)?.is_none() {
        return Err(ApiError::NotFound("user"));
    }
    if !state.db.activity_exists(user_id, &input.activity_id)? {
        return Err(ApiError::NotFound("activity"));
    }

    match state.db.create_race_tag(user_id, input) {
        Ok(tag) => Ok(tag),
        Err(e) if is_constraint_violation(&e) => {
            Err(ApiError::Conflict("activity is already tagged as a race".into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update_race_type(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateRaceTypeInput>,
) -> Result<Json<RaceTag>, ErrorResponse> {
    classify_race_tag(&state, id, input)
        .map(Json)
        .map_err(|e| state.reject(e))
}

fn classify_race_tag(
    state: &AppState,
    id: Uuid,
    input: UpdateRaceTypeInput,
) -> Result<RaceTag, ApiError> {
    if !state.db.update_race_type(id, input.race_type)? {
        return Err(ApiError::NotFound("race tag"));
    }
    state
        .db
        .get_race_tag(id)?
        .ok_or(ApiError::NotFound("race tag"))
}

pub async fn delete_race_tag(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ErrorResponse> {
    match state.db.delete_race_tag(id) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(state.reject(ApiError::NotFound("race tag"))),
        Err(e) => Err(state.reject(e)),
    }
}
