//! The per-job fallback chain: selector-ordered channels, each retried with
//! jittered exponential backoff, stopping at the first explicit success.
//!
//! This is a single forward pass through the channel list, not a state
//! machine — a job is either submitted by exactly one channel or fails
//! with the full list of channels tried.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::apply::channel::DeliveryChannel;
use crate::apply::message::build_message;
use crate::apply::selector::MethodSelector;
use crate::apply::stats::MethodStats;
use crate::models::application::ApplicationAttempt;
use crate::models::job::JobPosting;
use crate::models::profile::CandidateProfile;

/// Terminal outcome of one apply pass.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub success: bool,
    /// Channel that carried the submission, when successful.
    pub channel: Option<String>,
    pub channels_tried: Vec<String>,
    pub last_error: Option<String>,
    /// One entry per delivery try, across all channels. Diagnostic.
    pub attempts: Vec<ApplicationAttempt>,
}

pub struct ApplyOrchestrator {
    channels: Vec<Arc<dyn DeliveryChannel>>,
    selector: MethodSelector,
    max_retries: u32,
    retry_base: Duration,
}

impl ApplyOrchestrator {
    pub fn new(
        channels: Vec<Arc<dyn DeliveryChannel>>,
        selector: MethodSelector,
        max_retries: u32,
        retry_base: Duration,
    ) -> Self {
        Self {
            channels,
            selector,
            max_retries: max_retries.max(1),
            retry_base,
        }
    }

    /// Runs the fallback chain for one job.
    ///
    /// Stats bookkeeping: every channel whose tries ran gets `attempts+1`;
    /// only the succeeding channel also gets `successes+1`.
    pub async fn apply(
        &self,
        profile: &CandidateProfile,
        job: &JobPosting,
        stats: &mut MethodStats,
    ) -> ApplyReport {
        let plan = self.selector.order(job, &self.channels, stats);
        if plan.is_empty() {
            return ApplyReport {
                candidate_id: profile.id,
                job_id: job.id,
                success: false,
                channel: None,
                channels_tried: Vec::new(),
                last_error: Some("no applicable delivery channel for this job".to_string()),
                attempts: Vec::new(),
            };
        }

        let message = build_message(profile, job);
        let mut attempts = Vec::new();
        let mut channels_tried = Vec::new();
        let mut last_error: Option<String> = None;

        for channel in plan {
            channels_tried.push(channel.name().to_string());

            for try_idx in 0..self.max_retries {
                let result = channel.send(profile, job, &message).await;
                attempts.push(ApplicationAttempt {
                    id: Uuid::new_v4(),
                    candidate_id: profile.id,
                    job_id: job.id,
                    channel: channel.name().to_string(),
                    try_number: (try_idx + 1) as i32,
                    success: result.success,
                    error: result.error.clone(),
                    attempted_at: Utc::now(),
                });

                if result.success {
                    stats.record_attempt(channel.name());
                    stats.record_success(channel.name());
                    info!(
                        job_id = %job.id,
                        channel = channel.name(),
                        tries = try_idx + 1,
                        "application submitted"
                    );
                    return ApplyReport {
                        candidate_id: profile.id,
                        job_id: job.id,
                        success: true,
                        channel: Some(channel.name().to_string()),
                        channels_tried,
                        last_error: None,
                        attempts,
                    };
                }

                last_error = result
                    .error
                    .or_else(|| Some("delivery failed without detail".to_string()));
                warn!(
                    job_id = %job.id,
                    channel = channel.name(),
                    try_number = try_idx + 1,
                    error = last_error.as_deref().unwrap_or(""),
                    "delivery try failed"
                );

                if try_idx + 1 < self.max_retries {
                    tokio::time::sleep(self.backoff(try_idx)).await;
                }
            }

            // This channel is exhausted; it still counts one attempt.
            stats.record_attempt(channel.name());
        }

        ApplyReport {
            candidate_id: profile.id,
            job_id: job.id,
            success: false,
            channel: None,
            channels_tried,
            last_error,
            attempts,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        if self.retry_base.is_zero() {
            return Duration::ZERO;
        }
        let base = self.retry_base * 2u32.saturating_pow(attempt);
        let jitter_ms = rand::thread_rng().gen_range(0..2000);
        base + Duration::from_millis(jitter_ms)
    }
}
