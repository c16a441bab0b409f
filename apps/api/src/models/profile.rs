use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One role held by the candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub organization: String,
    pub description: String,
}

/// One degree held by the candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub field: String,
    pub institution: String,
}

/// The candidate side of every match. Owned by the user, read-only to the
/// engine, and stable for the duration of a single scoring pass.
///
/// Fields absent at the source are empty values, never missing keys, so
/// downstream logic never branches on presence.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    /// Free-text skill set, e.g. "Python, Django, AWS".
    pub skills: String,
    #[sqlx(json)]
    pub experience: Vec<ExperienceEntry>,
    #[sqlx(json)]
    pub education: Vec<EducationEntry>,
    pub preferred_location: String,
    pub min_salary: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl CandidateProfile {
    /// Minimal profile with empty sections, used where only identity matters.
    pub fn empty(id: Uuid) -> Self {
        Self {
            id,
            full_name: String::new(),
            email: String::new(),
            skills: String::new(),
            experience: Vec::new(),
            education: Vec::new(),
            preferred_location: String::new(),
            min_salary: None,
            created_at: Utc::now(),
        }
    }
}
