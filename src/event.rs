//! The hazard-assessment document produced by the upstream vision
//! collaborator.
//!
//! Video analysis happens elsewhere; this crate only consumes the resulting
//! JSON document, so the types here pin down the wire contract and nothing
//! more.

use serde::{Deserialize, Serialize};

/// Overall severity of the assessed scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStatus {
    Safe,
    Low,
    Medium,
    High,
    Extreme,
}

impl SafetyStatus {
    /// Anything above `Safe` warrants agent triage.
    pub fn is_actionable(self) -> bool {
        self > SafetyStatus::Safe
    }
}

/// Closed set of incident categories the vision model chooses from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentType {
    #[serde(rename = "Medical Emergency")]
    MedicalEmergency,
    #[serde(rename = "Fire/Explosion Hazard")]
    FireHazard,
    #[serde(rename = "PPE Violation")]
    PpeViolation,
    #[serde(rename = "Fall Hazard")]
    FallHazard,
    #[serde(rename = "Struck-by Hazard")]
    StruckBy,
    #[serde(rename = "Electrical Hazard")]
    ElectricalHazard,
    #[serde(rename = "Environmental Hazard")]
    EnvironmentalHazard,
    #[serde(rename = "Unsafe Worker Behavior")]
    UnsafeBehavior,
    #[serde(rename = "Other Safety Concern")]
    OtherSafetyConcern,
}

/// The model's primary prediction for the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Likelihood in [0, 1] that the incident results in injury or damage.
    pub probability: f64,
    pub incident_type: IncidentType,
}

/// One assessed video, as delivered by the vision collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyEvent {
    pub video_id: String,
    pub safety_status: SafetyStatus,
    pub scene_description: String,
    pub predictions: Prediction,
    pub safety_response: String,
}

impl SafetyEvent {
    /// Parses the collaborator's JSON document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
