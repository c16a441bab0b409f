//! Application lifecycle tracking: the status state machine, follow-up
//! scheduling, and aggregate statistics.

pub mod handlers;
pub mod status;
pub mod tracker;

pub use status::ApplicationStatus;
pub use tracker::{ApplicationStatistics, FollowUpReminder, OutcomeTracker};
