use std::fmt;

use serde::Serialize;

/// Severity bucket for a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    /// Bands for the face similarity score: above 0.8 is high, above 0.6 medium.
    pub fn for_face_similarity(score: f64) -> Self {
        Self::bucket(score, 0.8, 0.6)
    }

    /// Bands for the combined ranking score: above 0.7 is high, above 0.5 medium.
    pub fn for_final_score(score: f64) -> Self {
        Self::bucket(score, 0.7, 0.5)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "High",
            ConfidenceBand::Medium => "Medium",
            ConfidenceBand::Low => "Low",
        }
    }

    // NaN compares false against both thresholds and lands in Low.
    fn bucket(score: f64, high: f64, medium: f64) -> Self {
        if score > high {
            ConfidenceBand::High
        } else if score > medium {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A score in `[0, 1]` as a percentage with one decimal, e.g. `0.8234` -> `82.3%`.
pub fn format_percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}
