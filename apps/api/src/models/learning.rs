use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Per-candidate aggregate of recent outcomes plus the tuning state that
/// resulted from the last analysis. Superseded, not appended: each analysis
/// run replaces the previous snapshot for the candidate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningSnapshot {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub window_days: i32,
    pub total_applications: i64,
    pub interviews: i64,
    pub offers: i64,
    pub rejections: i64,
    /// Non-`applied` records / total, in [0,1].
    pub response_rate: f64,
    /// Per-section success rates conditioned on the section scoring high,
    /// e.g. `{"skills": {"high_total": 6, "success_rate": 0.5}}`.
    pub component_rates: Value,
    pub insights: Vec<String>,
    pub w_skills: f64,
    pub w_experience: f64,
    pub w_education: f64,
    pub accept_threshold: f64,
    pub analyzed_at: DateTime<Utc>,
}

/// One applied tuning change, kept for audit and rollback.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdjustmentRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    /// "weight" or "threshold".
    pub kind: String,
    /// Which knob moved: a section name, or "accept_threshold".
    pub target: String,
    pub old_value: f64,
    pub new_value: f64,
    pub rationale: String,
    pub applied_at: DateTime<Utc>,
}
