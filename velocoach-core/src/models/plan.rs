use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The nine sections every race plan is expected to contain, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanSection {
    OverallStrategy,
    PreRace,
    StartStrategy,
    SegmentPlan,
    ClimbStrategy,
    Nutrition,
    PacingZones,
    Contingency,
    FinalPush,
}

impl PlanSection {
    pub const ALL: [PlanSection; 9] = [
        Self::OverallStrategy,
        Self::PreRace,
        Self::StartStrategy,
        Self::SegmentPlan,
        Self::ClimbStrategy,
        Self::Nutrition,
        Self::PacingZones,
        Self::Contingency,
        Self::FinalPush,
    ];

    /// JSON key used in requests to the oracle and in responses to clients.
    pub fn key(&self) -> &'static str {
        match self {
            Self::OverallStrategy => "overallStrategy",
            Self::PreRace => "preRace",
            Self::StartStrategy => "startStrategy",
            Self::SegmentPlan => "segmentPlan",
            Self::ClimbStrategy => "climbStrategy",
            Self::Nutrition => "nutrition",
            Self::PacingZones => "pacingZones",
            Self::Contingency => "contingency",
            Self::FinalPush => "finalPush",
        }
    }

    /// Human-readable header the oracle is asked to echo.
    pub fn header(&self) -> &'static str {
        match self {
            Self::OverallStrategy => "Overall Strategy",
            Self::PreRace => "Pre-Race Preparation",
            Self::StartStrategy => "Start Strategy",
            Self::SegmentPlan => "Segment-by-Segment Plan",
            Self::ClimbStrategy => "Climb Strategy",
            Self::Nutrition => "Nutrition & Hydration",
            Self::PacingZones => "Pacing Zones",
            Self::Contingency => "Contingency Plans",
            Self::FinalPush => "Final Push",
        }
    }
}

/// A generated race plan.
///
/// Serializes flat: one field per section key (plus anything else the oracle
/// returned as JSON) next to `fullText`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RacePlan {
    #[serde(flatten)]
    pub sections: Map<String, Value>,
    #[serde(rename = "fullText")]
    pub full_text: String,
}

impl RacePlan {
    /// Section text, if the stored value is a string.
    pub fn section(&self, section: PlanSection) -> Option<&str> {
        self.sections.get(section.key()).and_then(Value::as_str)
    }
}
