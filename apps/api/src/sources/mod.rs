//! Job source contract. The scraping/connector service is an external
//! collaborator; the engine only consumes its `fetch` contract and
//! de-duplicates what comes back.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::job::JobPosting;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    pub keywords: String,
    pub location: String,
    pub max_results: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            keywords: "software engineer".to_string(),
            location: "Remote".to_string(),
            max_results: 30,
        }
    }
}

/// External connector contract: may return fewer postings than requested
/// and must not fail for empty results.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch(&self, params: &SearchParams) -> Result<Vec<JobPosting>, AppError>;
}

/// HTTP client for a connector service exposing `GET /jobs`.
pub struct HttpJobSource {
    client: Client,
    base_url: String,
}

impl HttpJobSource {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }
}

#[async_trait]
impl JobSource for HttpJobSource {
    async fn fetch(&self, params: &SearchParams) -> Result<Vec<JobPosting>, AppError> {
        let url = format!("{}/jobs", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("keywords", params.keywords.as_str()),
                ("location", params.location.as_str()),
                ("max_results", &params.max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Source(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::Source(format!(
                "connector returned {}",
                resp.status()
            )));
        }
        resp.json::<Vec<JobPosting>>()
            .await
            .map_err(|e| AppError::Source(format!("connector payload: {e}")))
    }
}

/// Drops duplicate postings: same (organization, title), case-insensitive,
/// or same apply locator. First occurrence wins.
pub fn dedup_postings(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
    let mut seen_locators: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(postings.len());

    for job in postings {
        let pair = (
            job.organization.trim().to_lowercase(),
            job.title.trim().to_lowercase(),
        );
        let locator = job.apply_locator.trim().to_lowercase();

        if seen_pairs.contains(&pair) {
            continue;
        }
        if !locator.is_empty() && seen_locators.contains(&locator) {
            continue;
        }
        seen_pairs.insert(pair);
        if !locator.is_empty() {
            seen_locators.insert(locator);
        }
        out.push(job);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn posting(org: &str, title: &str, locator: &str) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: title.to_string(),
            organization: org.to_string(),
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
    fn test_dedup_same_org_and_title() {
        let jobs = vec![
            posting("Acme", "Backend Engineer", "https://a.test/1"),
            posting("acme", "backend engineer", "https://a.test/2"),
        ];
        assert_eq!(dedup_postings(jobs).len(), 1);
    }

    #[test]
    fn test_dedup_same_locator_different_title() {
        let jobs = vec![
            posting("Acme", "Backend Engineer", "https://a.test/apply"),
            posting("Acme", "Platform Engineer", "https://a.test/apply"),
        ];
        assert_eq!(dedup_postings(jobs).len(), 1);
    }

    #[test]
    fn test_dedup_keeps_distinct_postings() {
        let jobs = vec![
            posting("Acme", "Backend Engineer", "https://a.test/1"),
            posting("Globex", "Backend Engineer", "https://g.test/1"),
            posting("Acme", "Frontend Engineer", "mailto:jobs@a.test"),
        ];
        assert_eq!(dedup_postings(jobs).len(), 3);
    }

    #[test]
    fn test_dedup_blank_locators_do_not_collide() {
        let jobs = vec![
            posting("Acme", "Backend Engineer", ""),
            posting("Globex", "Data Engineer", ""),
        ];
        assert_eq!(dedup_postings(jobs).len(), 2);
    }
}
