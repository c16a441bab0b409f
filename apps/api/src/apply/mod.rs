//! Application delivery: channel contract, per-channel success statistics,
//! method selection, and the retry/fallback orchestrator.

pub mod channel;
pub mod message;
pub mod orchestrator;
pub mod selector;
pub mod stats;

pub use channel::{ChannelResult, DeliveryChannel};
pub use orchestrator::{ApplyOrchestrator, ApplyReport};
pub use selector::MethodSelector;
pub use stats::MethodStats;
