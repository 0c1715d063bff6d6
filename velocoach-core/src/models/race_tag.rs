use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marks a synced activity as a race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceTag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: String,
    pub race_type: Option<RaceType>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RaceType {
    RoadRace,
    Criterium,
    TimeTrial,
    HillClimb,
    GranFondo,
    Gravel,
    Stage,
}

impl RaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoadRace => "road_race",
            Self::Criterium => "criterium",
            Self::TimeTrial => "time_trial",
            Self::HillClimb => "hill_climb",
            Self::GranFondo => "gran_fondo",
            Self::Gravel => "gravel",
            Self::Stage => "stage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "road_race" => Some(Self::RoadRace),
            "criterium" => Some(Self::Criterium),
            "time_trial" => Some(Self::TimeTrial),
            "hill_climb" => Some(Self::HillClimb),
            "gran_fondo" => Some(Self::GranFondo),
            "gravel" => Some(Self::Gravel),
            "stage" => Some(Self::Stage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRaceTagInput {
    pub activity_id: String,
    pub race_type: Option<RaceType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRaceTypeInput {
    pub race_type: Option<RaceType>,
}
