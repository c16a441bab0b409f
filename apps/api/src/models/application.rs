use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The durable unit tracked through the application lifecycle.
///
/// `status` holds the latest state; every transition is also appended as a
/// `StatusChangeRow`, so history is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    /// Delivery channel that carried the successful submission, if any.
    pub channel: String,
    pub submitted_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// When the next follow-up is due. `None` once follow-ups are exhausted
    /// or the record reaches a terminal state.
    pub follow_up_at: Option<DateTime<Utc>>,
    /// 0 = first tier pending, 1 = second, 2 = final, 3 = exhausted.
    pub follow_up_tier: i16,
    pub notes: String,
}

/// One delivery try for one (job, channel) pair. Diagnostic only — state
/// transitions never read these.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationAttempt {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub channel: String,
    pub try_number: i32,
    pub success: bool,
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

/// Append-only record of a single status transition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusChangeRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub from_status: String,
    pub to_status: String,
    /// False when the transition is outside the standard table (manual
    /// correction); kept but flagged.
    pub standard: bool,
    pub changed_at: DateTime<Utc>,
}
