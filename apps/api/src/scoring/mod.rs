//! Candidate–job fit scoring: section extraction, semantic similarity,
//! weighted aggregation, calibration, and classification.

pub mod scorer;
pub mod sections;
pub mod similarity;
pub mod weights;

pub use scorer::{MatchScore, Scorer};
pub use weights::ScoringWeights;
