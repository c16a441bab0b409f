use serde::{Deserialize, Serialize};

/// Per-section weights used to combine section sub-scores into a total.
///
/// Weights always sum to 1.0 when consumed: any triple that doesn't is
/// renormalized, never rejected. The learner retunes these over time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        // Skills dominate: the strongest observed predictor of fit.
        Self {
            skills: 0.7,
            experience: 0.2,
            education: 0.1,
        }
    }
}

impl ScoringWeights {
    /// Returns a copy scaled so the three weights sum to 1.0.
    /// A degenerate (zero or negative) total falls back to the default.
    pub fn normalized(&self) -> Self {
        let total = self.skills + self.experience + self.education;
        if total <= f64::EPSILON {
            return Self::default();
        }
        Self {
            skills: self.skills / total,
            experience: self.experience / total,
            education: self.education / total,
        }
    }

    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.education
    }
}
