//! Outcome-driven adaptation: analyzes tracked application outcomes and
//! retunes scoring weights and the accept threshold.

pub mod analyzer;
pub mod handlers;
pub mod tuner;

pub use analyzer::{AdaptiveLearner, ComponentAnalysis, ComponentStat, OutcomeWindow};
pub use tuner::TuningOutcome;
