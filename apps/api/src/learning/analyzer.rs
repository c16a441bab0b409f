//! Outcome analysis: trailing-window counts, per-section conversion rates,
//! and plain-language insights, snapshotted per candidate.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::learning::LearningSnapshot;
use crate::scoring::weights::ScoringWeights;
use crate::store::Store;
use crate::tracker::status::ApplicationStatus;

/// Trailing analysis window.
pub const WINDOW_DAYS: i64 = 30;
/// A section sub-score above this (0–100) counts as "high".
pub const HIGH_SCORE_CUTOFF: f64 = 70.0;
/// Minimum high-score samples before a section's conversion is trusted.
pub const MIN_SAMPLES: i64 = 5;

/// Outcome counts over the window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeWindow {
    pub total: i64,
    pub interviews: i64,
    pub offers: i64,
    pub rejections: i64,
    pub response_rate: f64,
    pub interview_rate: f64,
}

/// High-score sample counts and conversion for one scoring section.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ComponentStat {
    pub high_total: i64,
    pub high_success: i64,
}

impl ComponentStat {
    pub fn success_rate(&self) -> f64 {
        if self.high_total > 0 {
            self.high_success as f64 / self.high_total as f64
        } else {
            0.0
        }
    }
}

/// Per-section conversion analysis: success rate conditioned on the
/// section having scored high at application time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ComponentAnalysis {
    pub skills: ComponentStat,
    pub experience: ComponentStat,
    pub education: ComponentStat,
}

pub struct AdaptiveLearner {
    store: Arc<dyn Store>,
}

impl AdaptiveLearner {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Gathers the trailing window and component analysis for a candidate.
    pub(crate) async fn gather(
        &self,
        candidate_id: Uuid,
    ) -> Result<(OutcomeWindow, ComponentAnalysis), AppError> {
        let since = Utc::now() - Duration::days(WINDOW_DAYS);
        let records = self
            .store
            .applications_for_candidate(candidate_id, Some(since))
            .await?;

        let mut window = OutcomeWindow {
            total: records.len() as i64,
            ..Default::default()
        };
        let mut components = ComponentAnalysis::default();

        for record in &records {
            let status = ApplicationStatus::parse(&record.status);
            let positive = status.map_or(false, |s| s.is_interview_or_later());
            if positive {
                window.interviews += 1;
            }
            if status.map_or(false, |s| s.is_success()) {
                window.offers += 1;
            }
            if status == Some(ApplicationStatus::Rejected) {
                window.rejections += 1;
            }

            // Conversion conditioned on each section scoring high, where a
            // score was recorded for this application.
            if let Some(score) = self
                .store
                .latest_score(candidate_id, record.job_id)
                .await?
            {
                let mut tally = |stat: &mut ComponentStat, section_score: f64| {
                    if section_score > HIGH_SCORE_CUTOFF {
                        stat.high_total += 1;
                        if positive {
                            stat.high_success += 1;
                        }
                    }
                };
                tally(&mut components.skills, score.skills_score);
                tally(&mut components.experience, score.experience_score);
                tally(&mut components.education, score.education_score);
            }
        }

        if window.total > 0 {
            let responses = records
                .iter()
                .filter(|r| {
                    ApplicationStatus::parse(&r.status)
                        .map_or(true, |s| s != ApplicationStatus::Applied)
                })
                .count() as f64;
            window.response_rate = responses / window.total as f64;
            window.interview_rate = window.interviews as f64 / window.total as f64;
        }

        Ok((window, components))
    }

    /// Runs a full analysis and replaces the candidate's snapshot.
    pub async fn analyze(
        &self,
        candidate_id: Uuid,
        weights: ScoringWeights,
        accept_threshold: f64,
    ) -> Result<LearningSnapshot, AppError> {
        let (window, components) = self.gather(candidate_id).await?;
        let insights = build_insights(&window, &components);

        let snapshot = LearningSnapshot {
            id: Uuid::new_v4(),
            candidate_id,
            window_days: WINDOW_DAYS as i32,
            total_applications: window.total,
            interviews: window.interviews,
            offers: window.offers,
            rejections: window.rejections,
            response_rate: window.response_rate,
            component_rates: json!({
                "skills": components.skills,
                "experience": components.experience,
                "education": components.education,
            }),
            insights,
            w_skills: weights.skills,
            w_experience: weights.experience,
            w_education: weights.education,
            accept_threshold,
            analyzed_at: Utc::now(),
        };
        self.store.replace_snapshot(&snapshot).await?;
        Ok(snapshot)
    }
}

pub(crate) fn build_insights(
    window: &OutcomeWindow,
    components: &ComponentAnalysis,
) -> Vec<String> {
    let mut insights = Vec::new();

    if window.total > 0 {
        if window.response_rate < 0.1 {
            insights.push(
                "Response rate is low. Consider improving application materials or \
                 targeting more suitable roles."
                    .to_string(),
            );
        } else if window.interview_rate > 0.3 {
            insights
                .push("Strong interview rate — the current targeting is working.".to_string());
        }
    }

    let mut component_insight = |name: &str, stat: &ComponentStat| {
        if stat.high_total >= MIN_SAMPLES && stat.success_rate() < 0.2 {
            insights.push(format!(
                "Applications with high {name} scores are converting poorly; that \
                 section's weighting may be overvalued."
            ));
        }
    };
    component_insight("skills", &components.skills);
    component_insight("experience", &components.experience);
    component_insight("education", &components.education);

    insights
}
