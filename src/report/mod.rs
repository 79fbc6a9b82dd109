//! Wellness report generation — structured multi-part reports from a
//! conversation transcript, plus distress scoring.

pub mod generator;
pub mod scoring;

pub use generator::{ReportGenerator, fallback_report};
pub use scoring::{DistressBand, DistressScore, SCORING_GUIDELINES, parse_distress_score};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One section of a wellness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section author: TherapistAgent, DataAnalystAgent, RoutinePlannerAgent.
    pub name: String,
    pub content: String,
}

/// A generated wellness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellnessReport {
    pub id: Uuid,
    /// Student's name.
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<ReportSection>,
    pub distress_score: Option<scoring::DistressScore>,
    /// Set when generation failed and the static fallback was served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WellnessReport {
    pub fn new(name: &str, sections: Vec<ReportSection>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            generated_at: Utc::now(),
            sections,
            distress_score: None,
            error: None,
        }
    }
}
