//! HTTP API.

mod error;
mod extract;
mod preferences;
mod race_plan;
mod race_tags;
mod training_plans;

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::coach::RacePlanGenerator;
use crate::db::Database;

pub use error::{is_constraint_violation, ApiError, ErrorResponse};
pub use extract::{AppJson, AppPath};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub generator: RacePlanGenerator,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(db: Database, generator: RacePlanGenerator) -> Self {
        Self {
            db,
            generator,
            expose_error_details: false,
        }
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    /// Renders `err`, attaching details to server errors when enabled.
    pub fn reject(&self, err: impl Into<ApiError>) -> ErrorResponse {
        err.into().into_error_response(self.expose_error_details)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/race-plan", post(race_plan::generate_race_plan))
        .route(
            "/api/users/{user_id}/preferences",
            get(preferences::get_preferences).put(preferences::update_preferences),
        )
        .route(
            "/api/users/{user_id}/training-plans",
            get(training_plans::list_training_plans).post(training_plans::create_training_plan),
        )
        .route(
            "/api/training-plans/{id}",
            get(training_plans::get_training_plan).delete(training_plans::delete_training_plan),
        )
        .route(
            "/api/users/{user_id}/race-tags",
            get(race_tags::list_race_tags).post(race_tags::create_race_tag),
        )
        .route("/api/race-tags/{id}/race-type", put(race_tags::update_race_type))
        .route("/api/race-tags/{id}", delete(race_tags::delete_race_tag))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
