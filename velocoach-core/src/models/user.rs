use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A connected athlete. Rows are owned by the Strava sign-in flow; this crate
/// only reads them and upserts them for the account collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub strava_athlete_id: Option<i64>,
    pub display_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUserInput {
    pub id: Uuid,
    pub strava_athlete_id: Option<i64>,
    pub display_name: String,
    pub email: Option<String>,
}
