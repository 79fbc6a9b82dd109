//! Distress scoring guidelines and score parsing.
//!
//! Polarity: **lower scores = better mental health**. 1-3 healthy,
//! 4-6 moderate concerns, 7-10 severe distress.

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Scoring instructions handed to the model when evaluating a conversation.
pub const SCORING_GUIDELINES: &str = "\
You are evaluating a student's mental health based on their conversation.
Provide a score from 1-10 where:
1-3: Positive mental state, minimal concerns (healthy, coping well)
4-6: Moderate concerns, regular monitoring recommended (stress, anxiety)
7-10: Severe distress, immediate intervention needed (crisis, hopelessness)

Consider factors like:
- Emotional tone (positive vs negative language)
- Stress indicators (sleep issues, overwhelm, burnout)
- Academic pressure (exam anxiety, performance fears)
- Social relationships (isolation, conflict, support)
- Self-care patterns (eating, sleeping, coping strategies)
- Crisis indicators (self-harm thoughts, hopelessness, giving up)

IMPORTANT: Lower scores = Better mental health. Higher scores = More distress.
Respond with the numeric score first, then a one-line justification.";

/// Severity band for a distress score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistressBand {
    /// 1-3: positive mental state, minimal concerns.
    Healthy,
    /// 4-6: moderate concerns, regular monitoring recommended.
    Moderate,
    /// 7-10: severe distress, immediate intervention needed.
    Severe,
}

/// A parsed distress score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistressScore {
    pub value: u8,
    pub band: DistressBand,
}

impl DistressScore {
    pub fn new(value: u8) -> Self {
        let band = match value {
            0..=3 => DistressBand::Healthy,
            4..=6 => DistressBand::Moderate,
            _ => DistressBand::Severe,
        };
        Self { value, band }
    }
}

/// Extract a 1-10 distress score from model output.
///
/// Takes the first standalone number in range; model output like
/// "Score: 7 — significant exam anxiety" parses to 7.
pub fn parse_distress_score(text: &str) -> Result<DistressScore, ReportError> {
    let re = regex::Regex::new(r"\b(10|[1-9])\b").map_err(|e| ReportError::ScoreParse(e.to_string()))?;
    let captures = re
        .captures(text)
        .ok_or_else(|| ReportError::ScoreParse(text.chars().take(120).collect()))?;
    let value: u8 = captures[1]
        .parse()
        .map_err(|_| ReportError::ScoreParse(text.chars().take(120).collect()))?;
    Ok(DistressScore::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leading_score() {
        let score = parse_distress_score("7 - high exam anxiety and poor sleep").unwrap();
        assert_eq!(score.value, 7);
        assert_eq!(score.band, DistressBand::Severe);
    }

    #[test]
    fn parses_labeled_score() {
        let score = parse_distress_score("Score: 2. Coping well overall.").unwrap();
        assert_eq!(score.value, 2);
        assert_eq!(score.band, DistressBand::Healthy);
    }

    #[test]
    fn parses_ten() {
        let score = parse_distress_score("10 - crisis indicators present").unwrap();
        assert_eq!(score.value, 10);
        assert_eq!(score.band, DistressBand::Severe);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(DistressScore::new(3).band, DistressBand::Healthy);
        assert_eq!(DistressScore::new(4).band, DistressBand::Moderate);
        assert_eq!(DistressScore::new(6).band, DistressBand::Moderate);
        assert_eq!(DistressScore::new(7).band, DistressBand::Severe);
    }

    #[test]
    fn rejects_output_without_score() {
        assert!(parse_distress_score("the student seems fine").is_err());
    }
}
