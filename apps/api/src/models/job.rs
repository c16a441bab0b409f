use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A job posting produced by the external source connector.
/// Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub organization: String,
    pub location: String,
    /// Unstructured description; the scorer derives sections from it.
    pub description: String,
    /// Which connector produced this posting.
    pub source: String,
    /// Channel-facing apply locator: a `mailto:` address or a URL.
    pub apply_locator: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub fetched_at: DateTime<Utc>,
}

impl JobPosting {
    /// True when the apply locator is mail-shaped (`mailto:`).
    pub fn has_mail_locator(&self) -> bool {
        self.apply_locator.starts_with("mailto:")
    }

    /// True when any apply locator exists at all.
    pub fn has_locator(&self) -> bool {
        !self.apply_locator.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(locator: &str) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            organization: "Acme".to_string(),
            location: "Remote".to_string(),
            description: String::new(),
            source: "connector".to_string(),
            apply_locator: locator.to_string(),
            salary_min: None,
            salary_max: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_mail_locator_detection() {
        assert!(posting("mailto:jobs@acme.test").has_mail_locator());
        assert!(!posting("https://acme.test/apply").has_mail_locator());
    }

    #[test]
    fn test_blank_locator_is_absent() {
        assert!(!posting("   ").has_locator());
        assert!(posting("https://acme.test/apply").has_locator());
    }
}
