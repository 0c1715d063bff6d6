//! Request-scoped inputs to race-plan generation. Nothing here is persisted.

use serde::{Deserialize, Serialize};

/// Everything known about an upcoming race. Only `route_analysis` is required;
/// it stays optional here so a missing route surfaces as a validation error
/// instead of a body-parsing rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceContext {
    pub route_analysis: Option<RouteAnalysis>,
    pub rider_profile: Option<RiderProfile>,
    pub current_form: Option<CurrentForm>,
    pub training_plan: Option<TrainingPlanProgress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnalysis {
    /// Kilometres.
    pub distance: f64,
    /// Metres.
    #[serde(default)]
    pub elevation_gain: f64,
    /// Metres.
    #[serde(default)]
    pub elevation_loss: f64,
    #[serde(default)]
    pub difficulty_score: Option<f64>,
    /// Minutes.
    #[serde(default)]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub climbs: Vec<Climb>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Climb {
    #[serde(default)]
    pub name: Option<String>,
    /// Strava-style category label such as "HC", "1" or "4".
    #[serde(default)]
    pub category: Option<String>,
    /// Percent.
    pub average_gradient: f64,
    #[serde(default)]
    pub max_gradient: Option<f64>,
    /// Metres.
    pub elevation_gain: f64,
    /// Kilometres.
    #[serde(default)]
    pub length: Option<f64>,
    /// Kilometres from the start line.
    pub start_distance: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderProfile {
    #[serde(alias = "type")]
    pub rider_type: Option<String>,
    /// Watts.
    pub ftp: Option<f64>,
    /// Kilograms.
    pub weight: Option<f64>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

impl RiderProfile {
    pub fn watts_per_kg(&self) -> Option<f64> {
        match (self.ftp, self.weight) {
            (Some(ftp), Some(weight)) if weight > 0.0 => Some(ftp / weight),
            _ => None,
        }
    }
}

/// Training-load snapshot: fitness (CTL), fatigue (ATL) and form (TSB).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentForm {
    pub readiness_score: Option<f64>,
    pub fitness: Option<f64>,
    pub fatigue: Option<f64>,
    pub form: Option<f64>,
    #[serde(alias = "message")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPlanProgress {
    pub completion_percentage: Option<f64>,
    pub target_rider_type: Option<String>,
    pub alignment_score: Option<f64>,
}
