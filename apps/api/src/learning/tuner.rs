//! Weight and threshold retuning from the outcome analysis. Every change
//! is bounded, suppressed below a minimum delta, and recorded for audit.

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::learning::analyzer::{
    build_insights, AdaptiveLearner, ComponentStat, MIN_SAMPLES, WINDOW_DAYS,
};
use crate::models::learning::{AdjustmentRow, LearningSnapshot};
use crate::scoring::weights::ScoringWeights;

/// Multiplier applied to a section weight whose high scores convert well.
const WEIGHT_UP: f64 = 1.1;
/// Multiplier applied to a section weight whose high scores convert poorly.
const WEIGHT_DOWN: f64 = 0.9;
/// Band an individual weight adjustment may move within. Weights already
/// outside the band are left where they are rather than yanked into it.
const WEIGHT_MIN: f64 = 0.1;
const WEIGHT_MAX: f64 = 0.4;
/// Conversion rate above which a section is rewarded.
const CONVERT_GOOD: f64 = 0.6;
/// Conversion rate below which a section is penalized.
const CONVERT_POOR: f64 = 0.3;
/// Changes smaller than this are suppressed as noise.
const MIN_DELTA: f64 = 0.02;

const THRESHOLD_MIN: f64 = 0.5;
const THRESHOLD_MAX: f64 = 0.9;
/// Window totals that mark the threshold as too strict / too loose.
const FEW_APPLICATIONS: i64 = 5;
const MANY_APPLICATIONS: i64 = 20;

/// The settings produced by one retuning pass.
#[derive(Debug, Clone)]
pub struct TuningOutcome {
    pub weights: ScoringWeights,
    pub accept_threshold: f64,
    pub adjustments: Vec<AdjustmentRow>,
    pub snapshot: LearningSnapshot,
}

impl AdaptiveLearner {
    /// Analyzes the trailing window and retunes weights and threshold.
    /// Adjustments are persisted and the candidate's snapshot is replaced
    /// with the post-tuning state.
    pub async fn retune(
        &self,
        candidate_id: Uuid,
        current: ScoringWeights,
        accept_threshold: f64,
    ) -> Result<TuningOutcome, AppError> {
        let (window, components) = self.gather(candidate_id).await?;
        let now = Utc::now();
        let mut adjustments = Vec::new();

        let mut weights = current;
        let mut changed = false;
        let sections = [
            ("skills", current.skills, components.skills),
            ("experience", current.experience, components.experience),
            ("education", current.education, components.education),
        ];
        for (name, old, stat) in sections {
            let Some((proposed, direction)) = propose_weight(old, &stat) else {
                continue;
            };
            if (proposed - old).abs() < MIN_DELTA {
                continue;
            }
            adjustments.push(AdjustmentRow {
                id: Uuid::new_v4(),
                candidate_id,
                kind: "weight".to_string(),
                target: name.to_string(),
                old_value: old,
                new_value: proposed,
                rationale: format!(
                    "{name} weight {direction}: high-{name} applications converted at \
                     {:.0}% over {} samples",
                    stat.success_rate() * 100.0,
                    stat.high_total
                ),
                applied_at: now,
            });
            info!(target_weight = name, old, new = proposed, "weight adjusted");
            match name {
                "skills" => weights.skills = proposed,
                "experience" => weights.experience = proposed,
                _ => weights.education = proposed,
            }
            changed = true;
        }
        if changed {
            weights = weights.normalized();
        }

        let mut threshold = accept_threshold;
        let (proposed, reason) = if window.total < FEW_APPLICATIONS {
            (
                threshold - 0.05,
                "few applications in window; loosening to widen the funnel",
            )
        } else if window.total > MANY_APPLICATIONS {
            (
                threshold + 0.05,
                "high application volume; tightening to spend effort on better fits",
            )
        } else if window.response_rate < 0.1 {
            (
                threshold + 0.10,
                "response rate under 10%; tightening toward stronger matches",
            )
        } else if window.response_rate > 0.4 {
            (
                threshold - 0.05,
                "strong response rate; loosening to capture more opportunities",
            )
        } else {
            (threshold, "")
        };
        let proposed = proposed.clamp(THRESHOLD_MIN, THRESHOLD_MAX);
        if (proposed - threshold).abs() >= MIN_DELTA {
            let adjustment = AdjustmentRow {
                id: Uuid::new_v4(),
                candidate_id,
                kind: "threshold".to_string(),
                target: "accept_threshold".to_string(),
                old_value: threshold,
                new_value: proposed,
                rationale: reason.to_string(),
                applied_at: now,
            };
            info!(old = threshold, new = proposed, "accept threshold adjusted");
            threshold = proposed;
            adjustments.push(adjustment);
        }

        for adjustment in &adjustments {
            self.store().insert_adjustment(adjustment).await?;
        }

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
            insights: build_insights(&window, &components),
            w_skills: weights.skills,
            w_experience: weights.experience,
            w_education: weights.education,
            accept_threshold: threshold,
            analyzed_at: now,
        };
        self.store().replace_snapshot(&snapshot).await?;

        Ok(TuningOutcome {
            weights,
            accept_threshold: threshold,
            adjustments,
            snapshot,
        })
    }
}

/// Proposes a new value for one section weight, or `None` when the sample
/// is too small or the conversion rate is unremarkable. Increases cap at
/// [`WEIGHT_MAX`] and decreases floor at [`WEIGHT_MIN`]; a weight already
/// past a bound is held rather than dragged across it.
fn propose_weight(current: f64, stat: &ComponentStat) -> Option<(f64, &'static str)> {
    if stat.high_total < MIN_SAMPLES {
        return None;
    }
    let rate = stat.success_rate();
    if rate > CONVERT_GOOD {
        Some(((current * WEIGHT_UP).min(WEIGHT_MAX).max(current), "raised"))
    } else if rate < CONVERT_POOR {
        Some(((current * WEIGHT_DOWN).max(WEIGHT_MIN).min(current), "lowered"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationRecord;
    use crate::scoring::scorer::MatchScore;
    use crate::store::{MemoryStore, Store};
    use chrono::Utc;
    use std::sync::Arc;

    fn application(candidate: Uuid, status: &str) -> ApplicationRecord {
        let now = Utc::now();
        ApplicationRecord {
            id: Uuid::new_v4(),
            candidate_id: candidate,
            job_id: Uuid::new_v4(),
            status: status.to_string(),
            channel: "email".to_string(),
            submitted_at: now,
            last_updated: now,
            follow_up_at: None,
            follow_up_tier: 0,
            notes: String::new(),
        }
    }

    fn score_for(
        candidate: Uuid,
        job: Uuid,
        skills: f64,
        experience: f64,
        education: f64,
    ) -> MatchScore {
        MatchScore {
            id: Uuid::new_v4(),
            candidate_id: candidate,
            job_id: job,
            skills_score: skills,
            experience_score: experience,
            education_score: education,
            total: 50.0,
            classification: "Fair Fit".to_string(),
            rationale: String::new(),
            w_skills: 0.7,
            w_experience: 0.2,
            w_education: 0.1,
            backend: "lexical".to_string(),
            scored_at: Utc::now(),
        }
    }

    async fn seed(
        store: &Arc<MemoryStore>,
        candidate: Uuid,
        count: usize,
        status: &str,
        skills_score: f64,
    ) {
        for _ in 0..count {
            let rec = application(candidate, status);
            store
                .insert_score(&score_for(candidate, rec.job_id, skills_score, 20.0, 20.0))
                .await
                .unwrap();
            store.insert_application(&rec).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_low_response_rate_raises_threshold() {
        let store = Arc::new(MemoryStore::new());
        let candidate = Uuid::new_v4();
        // 12 applications, none answered: response rate 0%, well under 10%.
        seed(&store, candidate, 12, "applied", 20.0).await;

        let learner = AdaptiveLearner::new(store.clone());
        let outcome = learner
            .retune(candidate, ScoringWeights::default(), 0.7)
            .await
            .unwrap();

        assert!((outcome.accept_threshold - 0.8).abs() < 1e-9);
        let thresholds: Vec<_> = outcome
            .adjustments
            .iter()
            .filter(|a| a.kind == "threshold")
            .collect();
        assert_eq!(thresholds.len(), 1);
        assert!((thresholds[0].old_value - 0.7).abs() < 1e-9);
        assert!(thresholds[0].rationale.contains("response rate"));
        assert!(outcome
            .snapshot
            .insights
            .iter()
            .any(|i| i.contains("Response rate is low")));
        // Adjustment persisted for audit.
        assert_eq!(store.adjustments_for(candidate).await.len(), 1);
    }

    #[tokio::test]
    async fn test_few_applications_lowers_threshold() {
        let store = Arc::new(MemoryStore::new());
        let candidate = Uuid::new_v4();
        seed(&store, candidate, 3, "applied", 20.0).await;

        let learner = AdaptiveLearner::new(store);
        let outcome = learner
            .retune(candidate, ScoringWeights::default(), 0.7)
            .await
            .unwrap();
        assert!((outcome.accept_threshold - 0.65).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_threshold_clamped_to_band() {
        let store = Arc::new(MemoryStore::new());
        let candidate = Uuid::new_v4();
        seed(&store, candidate, 2, "applied", 20.0).await;

        let learner = AdaptiveLearner::new(store);
        // Already at the floor; the few-applications cut cannot go below it.
        let outcome = learner
            .retune(candidate, ScoringWeights::default(), 0.5)
            .await
            .unwrap();
        assert!((outcome.accept_threshold - 0.5).abs() < 1e-9);
        assert!(outcome.adjustments.is_empty());
    }

    #[tokio::test]
    async fn test_poor_converting_section_weight_lowered() {
        let store = Arc::new(MemoryStore::new());
        let candidate = Uuid::new_v4();
        // Six high-skills applications, all unanswered: conversion 0%.
        // Six more keep the window in the stable-threshold band.
        seed(&store, candidate, 6, "applied", 85.0).await;
        seed(&store, candidate, 6, "interview", 20.0).await;

        let learner = AdaptiveLearner::new(store.clone());
        let outcome = learner
            .retune(candidate, ScoringWeights::default(), 0.7)
            .await
            .unwrap();

        let weight_changes: Vec<_> = outcome
            .adjustments
            .iter()
            .filter(|a| a.kind == "weight")
            .collect();
        assert_eq!(weight_changes.len(), 1);
        assert_eq!(weight_changes[0].target, "skills");
        assert!(weight_changes[0].new_value < weight_changes[0].old_value);
        assert!(weight_changes[0].new_value >= WEIGHT_MIN);
        // Post-tuning weights still sum to 1.
        assert!((outcome.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_small_sample_never_moves_weights() {
        let store = Arc::new(MemoryStore::new());
        let candidate = Uuid::new_v4();
        // Four high-skills samples: one short of the minimum.
        seed(&store, candidate, 4, "applied", 85.0).await;
        seed(&store, candidate, 8, "interview", 20.0).await;

        let learner = AdaptiveLearner::new(store);
        let outcome = learner
            .retune(candidate, ScoringWeights::default(), 0.7)
            .await
            .unwrap();
        assert!(outcome.adjustments.iter().all(|a| a.kind != "weight"));
        let defaults = ScoringWeights::default();
        assert!((outcome.weights.skills - defaults.skills).abs() < 1e-9);
    }

    #[test]
    fn test_propose_weight_bounds() {
        let good = ComponentStat {
            high_total: 10,
            high_success: 8,
        };
        let poor = ComponentStat {
            high_total: 10,
            high_success: 1,
        };
        // Raising caps at the band ceiling and never reduces.
        let (raised, _) = propose_weight(0.38, &good).unwrap();
        assert!((raised - WEIGHT_MAX).abs() < 1e-9);
        let (held, _) = propose_weight(0.7, &good).unwrap();
        assert!((held - 0.7).abs() < 1e-9);
        // Lowering floors at the band floor and never increases.
        let (lowered, _) = propose_weight(0.105, &poor).unwrap();
        assert!((lowered - WEIGHT_MIN).abs() < 1e-9);
        assert!(propose_weight(0.3, &ComponentStat::default()).is_none());
    }
}
