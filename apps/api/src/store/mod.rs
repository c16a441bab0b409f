//! Persistence contract. The engine's correctness does not depend on any
//! particular storage engine: `PgStore` is the production implementation,
//! `MemoryStore` backs tests and database-less runs. Read-after-write
//! consistency within a single process is assumed by callers.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::apply::stats::MethodStats;
use crate::errors::AppError;
use crate::models::application::{ApplicationAttempt, ApplicationRecord, StatusChangeRow};
use crate::models::job::JobPosting;
use crate::models::learning::{AdjustmentRow, LearningSnapshot};
use crate::models::profile::CandidateProfile;
use crate::scoring::scorer::MatchScore;

pub use memory::MemoryStore;
pub use pg::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // ── profiles ────────────────────────────────────────────────────────
    async fn get_profile(&self, id: Uuid) -> Result<Option<CandidateProfile>, AppError>;

    // ── postings ────────────────────────────────────────────────────────
    async fn upsert_posting(&self, job: &JobPosting) -> Result<(), AppError>;
    async fn get_posting(&self, id: Uuid) -> Result<Option<JobPosting>, AppError>;

    // ── match scores (insert-only; rescores add rows) ───────────────────
    async fn insert_score(&self, score: &MatchScore) -> Result<(), AppError>;
    async fn latest_score(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<MatchScore>, AppError>;

    // ── application records ─────────────────────────────────────────────
    async fn insert_application(&self, rec: &ApplicationRecord) -> Result<(), AppError>;
    async fn update_application(&self, rec: &ApplicationRecord) -> Result<(), AppError>;
    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError>;
    async fn application_for_job(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, AppError>;
    async fn applications_for_candidate(
        &self,
        candidate_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ApplicationRecord>, AppError>;
    async fn due_follow_ups(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ApplicationRecord>, AppError>;
    async fn insert_status_change(&self, row: &StatusChangeRow) -> Result<(), AppError>;
    /// Append-only status history for one application, oldest first.
    async fn status_changes(&self, application_id: Uuid)
        -> Result<Vec<StatusChangeRow>, AppError>;
    async fn insert_attempts(&self, attempts: &[ApplicationAttempt]) -> Result<(), AppError>;

    /// Applications submitted since the given instant, across candidates.
    /// Backs the daily cap.
    async fn applications_since(&self, since: DateTime<Utc>) -> Result<u32, AppError>;

    // ── method stats ────────────────────────────────────────────────────
    async fn save_method_stats(&self, stats: &MethodStats) -> Result<(), AppError>;
    async fn load_method_stats(&self) -> Result<MethodStats, AppError>;

    // ── learning ────────────────────────────────────────────────────────
    async fn replace_snapshot(&self, snapshot: &LearningSnapshot) -> Result<(), AppError>;
    async fn latest_snapshot(
        &self,
        candidate_id: Uuid,
    ) -> Result<Option<LearningSnapshot>, AppError>;
    async fn insert_adjustment(&self, adjustment: &AdjustmentRow) -> Result<(), AppError>;
}
