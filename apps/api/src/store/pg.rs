//! Postgres-backed store. Thin over sqlx: every method is one query, and
//! history tables (scores, status changes, attempts) are insert-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::apply::stats::{ChannelCounter, MethodStats};
use crate::errors::AppError;
use crate::models::application::{ApplicationAttempt, ApplicationRecord, StatusChangeRow};
use crate::models::job::JobPosting;
use crate::models::learning::{AdjustmentRow, LearningSnapshot};
use crate::models::profile::CandidateProfile;
use crate::scoring::scorer::MatchScore;
use crate::store::Store;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<CandidateProfile>, AppError> {
        let profile = sqlx::query_as::<_, CandidateProfile>(
            "SELECT * FROM candidate_profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn upsert_posting(&self, job: &JobPosting) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO job_postings
                (id, title, organization, location, description, source,
                 apply_locator, salary_min, salary_max, fetched_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                organization = EXCLUDED.organization,
                location = EXCLUDED.location,
                description = EXCLUDED.description,
                source = EXCLUDED.source,
                apply_locator = EXCLUDED.apply_locator,
                salary_min = EXCLUDED.salary_min,
                salary_max = EXCLUDED.salary_max,
                fetched_at = EXCLUDED.fetched_at
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.organization)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.source)
        .bind(&job.apply_locator)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(job.fetched_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_posting(&self, id: Uuid) -> Result<Option<JobPosting>, AppError> {
        let posting =
            sqlx::query_as::<_, JobPosting>("SELECT * FROM job_postings WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(posting)
    }

    async fn insert_score(&self, score: &MatchScore) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO match_scores
                (id, candidate_id, job_id, skills_score, experience_score,
                 education_score, total, classification, rationale,
                 w_skills, w_experience, w_education, backend, scored_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(score.id)
        .bind(score.candidate_id)
        .bind(score.job_id)
        .bind(score.skills_score)
        .bind(score.experience_score)
        .bind(score.education_score)
        .bind(score.total)
        .bind(&score.classification)
        .bind(&score.rationale)
        .bind(score.w_skills)
        .bind(score.w_experience)
        .bind(score.w_education)
        .bind(&score.backend)
        .bind(score.scored_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_score(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<MatchScore>, AppError> {
        let score = sqlx::query_as::<_, MatchScore>(
            r#"
            SELECT * FROM match_scores
            WHERE candidate_id = $1 AND job_id = $2
            ORDER BY scored_at DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score)
    }

    async fn insert_application(&self, rec: &ApplicationRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO applications
                (id, candidate_id, job_id, status, channel, submitted_at,
                 last_updated, follow_up_at, follow_up_tier, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(rec.id)
        .bind(rec.candidate_id)
        .bind(rec.job_id)
        .bind(&rec.status)
        .bind(&rec.channel)
        .bind(rec.submitted_at)
        .bind(rec.last_updated)
        .bind(rec.follow_up_at)
        .bind(rec.follow_up_tier)
        .bind(&rec.notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_application(&self, rec: &ApplicationRecord) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE applications SET
                status = $2,
                channel = $3,
                last_updated = $4,
                follow_up_at = $5,
                follow_up_tier = $6,
                notes = $7
            WHERE id = $1
            "#,
        )
        .bind(rec.id)
        .bind(&rec.status)
        .bind(&rec.channel)
        .bind(rec.last_updated)
        .bind(rec.follow_up_at)
        .bind(rec.follow_up_tier)
        .bind(&rec.notes)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("application {}", rec.id)));
        }
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError> {
        let rec =
            sqlx::query_as::<_, ApplicationRecord>("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(rec)
    }

    async fn application_for_job(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, AppError> {
        let rec = sqlx::query_as::<_, ApplicationRecord>(
            "SELECT * FROM applications WHERE candidate_id = $1 AND job_id = $2 LIMIT 1",
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec)
    }

    async fn applications_for_candidate(
        &self,
        candidate_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ApplicationRecord>, AppError> {
        let records = sqlx::query_as::<_, ApplicationRecord>(
            r#"
            SELECT * FROM applications
            WHERE candidate_id = $1
              AND ($2::timestamptz IS NULL OR submitted_at >= $2)
            ORDER BY submitted_at
            "#,
        )
        .bind(candidate_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn due_follow_ups(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ApplicationRecord>, AppError> {
        // Terminal statuses never carry a follow_up_at, but filter anyway in
        // case of rows written before that invariant held.
        let records = sqlx::query_as::<_, ApplicationRecord>(
            r#"
            SELECT * FROM applications
            WHERE follow_up_at IS NOT NULL
              AND follow_up_at <= $1
              AND status NOT IN ('rejected', 'withdrawn', 'offer_accepted', 'offer_declined')
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn insert_status_change(&self, row: &StatusChangeRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO status_changes
                (id, application_id, from_status, to_status, standard, changed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(row.id)
        .bind(row.application_id)
        .bind(&row.from_status)
        .bind(&row.to_status)
        .bind(row.standard)
        .bind(row.changed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn status_changes(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<StatusChangeRow>, AppError> {
        let changes = sqlx::query_as::<_, StatusChangeRow>(
            r#"
            SELECT id, application_id, from_status, to_status, standard, changed_at
            FROM status_changes
            WHERE application_id = $1
            ORDER BY changed_at ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(changes)
    }

    async fn insert_attempts(&self, attempts: &[ApplicationAttempt]) -> Result<(), AppError> {
        for attempt in attempts {
            sqlx::query(
                r#"
                INSERT INTO application_attempts
                    (id, candidate_id, job_id, channel, try_number, success, error, attempted_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(attempt.id)
            .bind(attempt.candidate_id)
            .bind(attempt.job_id)
            .bind(&attempt.channel)
            .bind(attempt.try_number)
            .bind(attempt.success)
            .bind(&attempt.error)
            .bind(attempt.attempted_at)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn applications_since(&self, since: DateTime<Utc>) -> Result<u32, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE submitted_at >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u32)
    }

    async fn save_method_stats(&self, stats: &MethodStats) -> Result<(), AppError> {
        // Full replace, so an operator reset clears persisted counters too.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM method_stats")
            .execute(&mut *tx)
            .await?;
        for (channel, counter) in stats.snapshot() {
            sqlx::query(
                "INSERT INTO method_stats (channel, attempts, successes) VALUES ($1, $2, $3)",
            )
            .bind(channel)
            .bind(counter.attempts as i64)
            .bind(counter.successes as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_method_stats(&self) -> Result<MethodStats, AppError> {
        let rows: Vec<(String, i64, i64)> =
            sqlx::query_as("SELECT channel, attempts, successes FROM method_stats")
                .fetch_all(&self.pool)
                .await?;
        let counters: HashMap<String, ChannelCounter> = rows
            .into_iter()
            .map(|(channel, attempts, successes)| {
                (
                    channel,
                    ChannelCounter {
                        attempts: attempts.max(0) as u64,
                        successes: successes.max(0) as u64,
                    },
                )
            })
            .collect();
        Ok(MethodStats::from_counters(counters))
    }

    async fn replace_snapshot(&self, snapshot: &LearningSnapshot) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO learning_snapshots
                (id, candidate_id, window_days, total_applications, interviews,
                 offers, rejections, response_rate, component_rates, insights,
                 w_skills, w_experience, w_education, accept_threshold, analyzed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (candidate_id) DO UPDATE SET
                id = EXCLUDED.id,
                window_days = EXCLUDED.window_days,
                total_applications = EXCLUDED.total_applications,
                interviews = EXCLUDED.interviews,
                offers = EXCLUDED.offers,
                rejections = EXCLUDED.rejections,
                response_rate = EXCLUDED.response_rate,
                component_rates = EXCLUDED.component_rates,
                insights = EXCLUDED.insights,
                w_skills = EXCLUDED.w_skills,
                w_experience = EXCLUDED.w_experience,
                w_education = EXCLUDED.w_education,
                accept_threshold = EXCLUDED.accept_threshold,
                analyzed_at = EXCLUDED.analyzed_at
            "#,
        )
        .bind(snapshot.id)
        .bind(snapshot.candidate_id)
        .bind(snapshot.window_days)
        .bind(snapshot.total_applications)
        .bind(snapshot.interviews)
        .bind(snapshot.offers)
        .bind(snapshot.rejections)
        .bind(snapshot.response_rate)
        .bind(&snapshot.component_rates)
        .bind(&snapshot.insights)
        .bind(snapshot.w_skills)
        .bind(snapshot.w_experience)
        .bind(snapshot.w_education)
        .bind(snapshot.accept_threshold)
        .bind(snapshot.analyzed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_snapshot(
        &self,
        candidate_id: Uuid,
    ) -> Result<Option<LearningSnapshot>, AppError> {
        let snapshot = sqlx::query_as::<_, LearningSnapshot>(
            "SELECT * FROM learning_snapshots WHERE candidate_id = $1",
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot)
    }

    async fn insert_adjustment(&self, adjustment: &AdjustmentRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tuning_adjustments
                (id, candidate_id, kind, target, old_value, new_value, rationale, applied_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(adjustment.id)
        .bind(adjustment.candidate_id)
        .bind(&adjustment.kind)
        .bind(&adjustment.target)
        .bind(&adjustment.old_value)
        .bind(&adjustment.new_value)
        .bind(&adjustment.rationale)
        .bind(adjustment.applied_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
