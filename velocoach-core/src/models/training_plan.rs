use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored training plan built towards a target event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub event_type: Option<String>,
    pub target_rider_type: Option<String>,
    /// Week-by-week plan body, kept opaque.
    pub plan: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTrainingPlanInput {
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub event_type: Option<String>,
    pub target_rider_type: Option<String>,
    pub plan: serde_json::Value,
}
