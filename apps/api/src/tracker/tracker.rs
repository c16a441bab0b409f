//! Outcome tracking over application records: record creation, status
//! transitions (append-only history), tiered follow-up scheduling, and
//! rolling-window statistics.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, StatusChangeRow};
use crate::store::Store;
use crate::tracker::status::ApplicationStatus;

/// Follow-up tiers, in days after submission.
#[derive(Debug, Clone, Copy)]
pub struct FollowUpSchedule {
    pub first_days: i64,
    pub second_days: i64,
    pub final_days: i64,
}

impl Default for FollowUpSchedule {
    fn default() -> Self {
        Self {
            first_days: 7,
            second_days: 14,
            final_days: 21,
        }
    }
}

/// Rolling-window aggregate over one candidate's applications.
/// Rates are fractions in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStatistics {
    pub total: usize,
    pub status_counts: HashMap<String, usize>,
    /// Non-`applied` records / total.
    pub response_rate: f64,
    pub interview_rate: f64,
    pub success_rate: f64,
    /// Mean days from submission to first recorded status change.
    pub avg_response_days: f64,
    pub applications_this_week: usize,
}

/// One overdue application surfaced by the follow-up scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpReminder {
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub days_since_application: i64,
    pub follow_up_tier: i16,
    pub suggested_action: String,
}

pub struct OutcomeTracker {
    store: Arc<dyn Store>,
    schedule: FollowUpSchedule,
}

impl OutcomeTracker {
    pub fn new(store: Arc<dyn Store>, schedule: FollowUpSchedule) -> Self {
        Self { store, schedule }
    }

    /// Opens a record for a submitted application: status `applied`, first
    /// follow-up scheduled out.
    pub async fn open(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        channel: &str,
        notes: String,
    ) -> Result<ApplicationRecord, AppError> {
        let now = Utc::now();
        let record = ApplicationRecord {
            id: Uuid::new_v4(),
            candidate_id,
            job_id,
            status: ApplicationStatus::Applied.as_str().to_string(),
            channel: channel.to_string(),
            submitted_at: now,
            last_updated: now,
            follow_up_at: Some(now + Duration::days(self.schedule.first_days)),
            follow_up_tier: 0,
            notes,
        };
        self.store.insert_application(&record).await?;
        info!(application_id = %record.id, job_id = %job_id, "application record opened");
        Ok(record)
    }

    /// Applies a status transition. Standard transitions come from the
    /// state table; anything else is permitted as a manual correction but
    /// flagged in the change history and the log.
    pub async fn transition(
        &self,
        application_id: Uuid,
        new_status: &str,
        notes: Option<String>,
    ) -> Result<ApplicationRecord, AppError> {
        let mut record = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("application {application_id}")))?;

        let to = ApplicationStatus::parse(new_status)
            .ok_or_else(|| AppError::Validation(format!("unknown status '{new_status}'")))?;
        let from = ApplicationStatus::parse(&record.status)
            .ok_or_else(|| AppError::Validation(format!("corrupt status '{}'", record.status)))?;

        let standard = from.can_transition(to);
        if !standard {
            warn!(
                application_id = %application_id,
                from = from.as_str(),
                to = to.as_str(),
                "non-standard status transition applied as manual correction"
            );
        }

        let now = Utc::now();
        record.status = to.as_str().to_string();
        record.last_updated = now;
        if let Some(extra) = notes {
            if !record.notes.is_empty() {
                record.notes.push('\n');
            }
            record.notes.push_str(&extra);
        }
        if to.is_terminal() {
            record.follow_up_at = None;
        }

        self.store.update_application(&record).await?;
        self.store
            .insert_status_change(&StatusChangeRow {
                id: Uuid::new_v4(),
                application_id,
                from_status: from.as_str().to_string(),
                to_status: to.as_str().to_string(),
                standard,
                changed_at: now,
            })
            .await?;
        Ok(record)
    }

    /// Advances every overdue, non-terminal record to its next follow-up
    /// tier. Past the final tier, scheduling stops and the record ages
    /// until a status change. Returns the number of records advanced.
    pub async fn scan_follow_ups(&self, now: DateTime<Utc>) -> Result<u32, AppError> {
        let due = self.store.due_follow_ups(now).await?;
        let mut advanced = 0;
        for mut record in due {
            match record.follow_up_tier {
                0 => {
                    record.follow_up_tier = 1;
                    record.follow_up_at =
                        Some(record.submitted_at + Duration::days(self.schedule.second_days));
                }
                1 => {
                    record.follow_up_tier = 2;
                    record.follow_up_at =
                        Some(record.submitted_at + Duration::days(self.schedule.final_days));
                }
                _ => {
                    record.follow_up_tier = 3;
                    record.follow_up_at = None;
                }
            }
            record.last_updated = now;
            self.store.update_application(&record).await?;
            advanced += 1;
        }
        Ok(advanced)
    }

    /// Overdue records as actionable reminders.
    pub async fn reminders(
        &self,
        candidate_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<FollowUpReminder>, AppError> {
        let due = self.store.due_follow_ups(now).await?;
        let mut reminders: Vec<FollowUpReminder> = due
            .into_iter()
            .filter(|r| r.candidate_id == candidate_id)
            .map(|r| {
                let days = (now - r.submitted_at).num_days();
                FollowUpReminder {
                    application_id: r.id,
                    job_id: r.job_id,
                    suggested_action: suggested_action(&r.status, days),
                    status: r.status,
                    days_since_application: days,
                    follow_up_tier: r.follow_up_tier,
                }
            })
            .collect();
        reminders.sort_by(|a, b| b.days_since_application.cmp(&a.days_since_application));
        Ok(reminders)
    }

    /// Rolling-window statistics for one candidate.
    pub async fn statistics(
        &self,
        candidate_id: Uuid,
        window_days: i64,
    ) -> Result<ApplicationStatistics, AppError> {
        let now = Utc::now();
        let since = now - Duration::days(window_days);
        let records = self
            .store
            .applications_for_candidate(candidate_id, Some(since))
            .await?;

        let total = records.len();
        let mut status_counts: HashMap<String, usize> = HashMap::new();
        let mut responses = 0usize;
        let mut interviews = 0usize;
        let mut successes = 0usize;
        let mut response_days = Vec::new();
        let week_ago = now - Duration::days(7);
        let mut this_week = 0usize;

        for r in &records {
            *status_counts.entry(r.status.clone()).or_insert(0) += 1;
            if r.submitted_at > week_ago {
                this_week += 1;
            }
            let status = ApplicationStatus::parse(&r.status);
            let responded = status.map_or(true, |s| s != ApplicationStatus::Applied);
            if responded {
                responses += 1;
                // First response = earliest entry in the status history.
                // `last_updated` also moves on follow-up scans, so it is
                // useless as a response timestamp.
                let changes = self.store.status_changes(r.id).await?;
                if let Some(first) = changes.iter().map(|c| c.changed_at).min() {
                    response_days.push((first - r.submitted_at).num_days() as f64);
                }
            }
            if status.map_or(false, |s| s.is_interview_or_later()) {
                interviews += 1;
            }
            if status.map_or(false, |s| s.is_success()) {
                successes += 1;
            }
        }

        let rate = |n: usize| if total > 0 { n as f64 / total as f64 } else { 0.0 };
        Ok(ApplicationStatistics {
            total,
            status_counts,
            response_rate: rate(responses),
            interview_rate: rate(interviews),
            success_rate: rate(successes),
            avg_response_days: if response_days.is_empty() {
                0.0
            } else {
                response_days.iter().sum::<f64>() / response_days.len() as f64
            },
            applications_this_week: this_week,
        })
    }
}

fn suggested_action(status: &str, days_since: i64) -> String {
    match ApplicationStatus::parse(status) {
        Some(ApplicationStatus::Applied) => {
            if days_since <= 7 {
                "Send a polite follow-up expressing continued interest".to_string()
            } else if days_since <= 14 {
                "Send a second follow-up with additional material".to_string()
            } else {
                "Send a final follow-up or consider the application closed".to_string()
            }
        }
        Some(s) if s.is_interview_or_later() => {
            "Send a thank-you note and ask about the decision timeline".to_string()
        }
        _ => "Monitor for updates".to_string(),
    }
}
