//! In-memory store: `RwLock`-guarded maps with the same read-after-write
//! behavior the engine assumes of the production store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::apply::stats::MethodStats;
use crate::errors::AppError;
use crate::models::application::{ApplicationAttempt, ApplicationRecord, StatusChangeRow};
use crate::models::job::JobPosting;
use crate::models::learning::{AdjustmentRow, LearningSnapshot};
use crate::models::profile::CandidateProfile;
use crate::scoring::scorer::MatchScore;
use crate::store::Store;
use crate::tracker::status::ApplicationStatus;

#[derive(Default)]
struct Inner {
    profiles: HashMap<Uuid, CandidateProfile>,
    postings: HashMap<Uuid, JobPosting>,
    scores: Vec<MatchScore>,
    applications: HashMap<Uuid, ApplicationRecord>,
    status_changes: Vec<StatusChangeRow>,
    attempts: Vec<ApplicationAttempt>,
    method_stats: MethodStats,
    snapshots: HashMap<Uuid, LearningSnapshot>,
    adjustments: Vec<AdjustmentRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a profile. Profiles arrive from the external resume source in
    /// production; tests and database-less runs put them here directly.
    pub async fn add_profile(&self, profile: CandidateProfile) {
        self.inner
            .write()
            .await
            .profiles
            .insert(profile.id, profile);
    }

    pub async fn attempts_for_job(&self, job_id: Uuid) -> Vec<ApplicationAttempt> {
        self.inner
            .read()
            .await
            .attempts
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect()
    }

    pub async fn adjustments_for(&self, candidate_id: Uuid) -> Vec<AdjustmentRow> {
        self.inner
            .read()
            .await
            .adjustments
            .iter()
            .filter(|a| a.candidate_id == candidate_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<CandidateProfile>, AppError> {
        Ok(self.inner.read().await.profiles.get(&id).cloned())
    }

    async fn upsert_posting(&self, job: &JobPosting) -> Result<(), AppError> {
        self.inner.write().await.postings.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_posting(&self, id: Uuid) -> Result<Option<JobPosting>, AppError> {
        Ok(self.inner.read().await.postings.get(&id).cloned())
    }

    async fn insert_score(&self, score: &MatchScore) -> Result<(), AppError> {
        self.inner.write().await.scores.push(score.clone());
        Ok(())
    }

    async fn latest_score(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<MatchScore>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .scores
            .iter()
            .filter(|s| s.candidate_id == candidate_id && s.job_id == job_id)
            .max_by_key(|s| s.scored_at)
            .cloned())
    }

    async fn insert_application(&self, rec: &ApplicationRecord) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .applications
            .insert(rec.id, rec.clone());
        Ok(())
    }

    async fn update_application(&self, rec: &ApplicationRecord) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if !inner.applications.contains_key(&rec.id) {
            return Err(AppError::NotFound(format!("application {}", rec.id)));
        }
        inner.applications.insert(rec.id, rec.clone());
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError> {
        Ok(self.inner.read().await.applications.get(&id).cloned())
    }

    async fn application_for_job(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .applications
            .values()
            .find(|a| a.candidate_id == candidate_id && a.job_id == job_id)
            .cloned())
    }

    async fn applications_for_candidate(
        &self,
        candidate_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ApplicationRecord>, AppError> {
        let mut records: Vec<_> = self
            .inner
            .read()
            .await
            .applications
            .values()
            .filter(|a| a.candidate_id == candidate_id)
            .filter(|a| since.map_or(true, |s| a.submitted_at >= s))
            .cloned()
            .collect();
        records.sort_by_key(|a| a.submitted_at);
        Ok(records)
    }

    async fn due_follow_ups(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ApplicationRecord>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .applications
            .values()
            .filter(|a| {
                ApplicationStatus::parse(&a.status).map_or(true, |s| !s.is_terminal())
                    && a.follow_up_at.map_or(false, |due| due <= now)
            })
            .cloned()
            .collect())
    }

    async fn insert_status_change(&self, row: &StatusChangeRow) -> Result<(), AppError> {
        self.inner.write().await.status_changes.push(row.clone());
        Ok(())
    }

    async fn status_changes(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<StatusChangeRow>, AppError> {
        let mut changes: Vec<_> = self
            .inner
            .read()
            .await
            .status_changes
            .iter()
            .filter(|c| c.application_id == application_id)
            .cloned()
            .collect();
        changes.sort_by_key(|c| c.changed_at);
        Ok(changes)
    }

    async fn insert_attempts(&self, attempts: &[ApplicationAttempt]) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .attempts
            .extend(attempts.iter().cloned());
        Ok(())
    }

    async fn applications_since(&self, since: DateTime<Utc>) -> Result<u32, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .applications
            .values()
            .filter(|a| a.submitted_at >= since)
            .count() as u32)
    }

    async fn save_method_stats(&self, stats: &MethodStats) -> Result<(), AppError> {
        self.inner.write().await.method_stats = stats.clone();
        Ok(())
    }

    async fn load_method_stats(&self) -> Result<MethodStats, AppError> {
        Ok(self.inner.read().await.method_stats.clone())
    }

    async fn replace_snapshot(&self, snapshot: &LearningSnapshot) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .snapshots
            .insert(snapshot.candidate_id, snapshot.clone());
        Ok(())
    }

    async fn latest_snapshot(
        &self,
        candidate_id: Uuid,
    ) -> Result<Option<LearningSnapshot>, AppError> {
        Ok(self.inner.read().await.snapshots.get(&candidate_id).cloned())
    }

    async fn insert_adjustment(&self, adjustment: &AdjustmentRow) -> Result<(), AppError> {
        self.inner.write().await.adjustments.push(adjustment.clone());
        Ok(())
    }
}
