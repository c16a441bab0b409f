//! Rolling per-channel delivery statistics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One attempts/successes counter pair. Monotonically increasing; reset
/// only by explicit operator action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounter {
    pub attempts: u64,
    pub successes: u64,
}

/// Per-channel counters driving selector ordering and learner priors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodStats {
    counters: HashMap<String, ChannelCounter>,
}

impl MethodStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds from persisted counters, e.g. on process restart.
    pub fn from_counters(counters: HashMap<String, ChannelCounter>) -> Self {
        Self { counters }
    }

    pub fn record_attempt(&mut self, channel: &str) {
        self.counters.entry(channel.to_string()).or_default().attempts += 1;
    }

    pub fn record_success(&mut self, channel: &str) {
        self.counters.entry(channel.to_string()).or_default().successes += 1;
    }

    /// Observed success rate. Untested channels default to an optimistic
    /// 1.0 so they get a fair first try.
    pub fn success_rate(&self, channel: &str) -> f64 {
        match self.counters.get(channel) {
            Some(c) if c.attempts > 0 => c.successes as f64 / c.attempts as f64,
            _ => 1.0,
        }
    }

    pub fn counter(&self, channel: &str) -> ChannelCounter {
        self.counters.get(channel).copied().unwrap_or_default()
    }

    pub fn snapshot(&self) -> &HashMap<String, ChannelCounter> {
        &self.counters
    }

    /// Operator reset. The only way counters go backwards.
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}
