//! Cycle orchestration: fetch, score, filter, apply, and track as one
//! supervised pass, plus the background auto mode that repeats it.

pub mod engine;
pub mod handlers;

pub use engine::{CycleReport, EngineSettings, EngineStatus, Supervisor, SupervisorOptions};
