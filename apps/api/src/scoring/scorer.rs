//! The scorer: section similarities → weighted raw score → calibration →
//! classification, with a human-readable rationale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;
use uuid::Uuid;

use crate::models::job::JobPosting;
use crate::models::profile::CandidateProfile;
use crate::scoring::sections::{candidate_sections, job_sections};
use crate::scoring::similarity::{keyword_overlap_bonus, SectionSimilarity};
use crate::scoring::weights::ScoringWeights;

/// Score classification bands. Labels are fixed; only the accept/reject
/// cutoff used for filtering is adaptive.
pub const EXCELLENT_FIT: f64 = 80.0;
pub const GOOD_FIT: f64 = 65.0;
pub const FAIR_FIT: f64 = 40.0;

/// One scoring result for one (candidate, job) pair. Never mutated in
/// place: a rescore under new weights produces a new row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchScore {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub skills_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    /// Calibrated combination of the three section scores under the weights
    /// active at scoring time. Always in [0,100].
    pub total: f64,
    pub classification: String,
    pub rationale: String,
    pub w_skills: f64,
    pub w_experience: f64,
    pub w_education: f64,
    /// Similarity backend that produced the section scores.
    pub backend: String,
    pub scored_at: DateTime<Utc>,
}

/// Classifies a calibrated total. Pure; partitions [0,100] into exactly
/// four labeled ranges.
pub fn classify(total: f64) -> &'static str {
    if total >= EXCELLENT_FIT {
        "Excellent Fit"
    } else if total >= GOOD_FIT {
        "Good Fit"
    } else if total >= FAIR_FIT {
        "Fair Fit"
    } else {
        "Poor Fit"
    }
}

/// Non-linear boost toward 100. Generic similarity models under-score
/// genuinely strong matches, so high raw scores take more of the remaining
/// headroom than low ones.
pub fn calibrate(raw: f64) -> f64 {
    // A zero raw score stays zero; the boost only stretches real signal.
    if raw <= 0.0 {
        return 0.0;
    }
    let boosted = if raw >= 70.0 {
        raw + (100.0 - raw) * 0.35
    } else if raw >= 55.0 {
        raw + (100.0 - raw) * 0.25
    } else {
        raw + (100.0 - raw) * 0.08
    };
    boosted.clamp(0.0, 100.0)
}

/// Computes fit scores for (candidate, job) pairs.
///
/// Cheap to clone: the similarity backend sits behind an `Arc`.
#[derive(Clone)]
pub struct Scorer {
    similarity: Arc<dyn SectionSimilarity>,
}

impl Scorer {
    pub fn new(similarity: Arc<dyn SectionSimilarity>) -> Self {
        Self { similarity }
    }

    /// Scores one pair. Never fails: the contract is a `MatchScore` in all
    /// cases, with classification "Error" reserved for internal faults
    /// (see `error_score`).
    pub async fn score(
        &self,
        profile: &CandidateProfile,
        job: &JobPosting,
        weights: ScoringWeights,
    ) -> MatchScore {
        let weights = weights.normalized();
        let cand = candidate_sections(profile);
        let jd = job_sections(&job.description);

        let base_skills = self.similarity.similarity(&cand.skills, &jd.skills).await;
        // Exact-term bonus applies to the skills pair only, and never when
        // the base pair is empty on either side.
        let skills = if cand.skills.trim().is_empty() || jd.skills.trim().is_empty() {
            0.0
        } else {
            (base_skills + keyword_overlap_bonus(&cand.skills, &jd.skills)).min(1.0)
        };
        let experience = self
            .similarity
            .similarity(&cand.experience, &jd.experience)
            .await;
        let education = self
            .similarity
            .similarity(&cand.education, &jd.education)
            .await;

        let skills_score = skills * 100.0;
        let experience_score = experience * 100.0;
        let education_score = education * 100.0;

        let raw = weights.skills * skills_score
            + weights.experience * experience_score
            + weights.education * education_score;
        let total = calibrate(raw);
        let classification = classify(total);

        debug!(
            job_id = %job.id,
            raw,
            total,
            classification,
            "scored posting"
        );

        MatchScore {
            id: Uuid::new_v4(),
            candidate_id: profile.id,
            job_id: job.id,
            skills_score,
            experience_score,
            education_score,
            total,
            classification: classification.to_string(),
            rationale: build_rationale(skills_score, experience_score, education_score, classification),
            w_skills: weights.skills,
            w_experience: weights.experience,
            w_education: weights.education,
            backend: self.similarity.backend().to_string(),
            scored_at: Utc::now(),
        }
    }

    /// Scores a batch concurrently (postings are independent), drops
    /// everything under `accept_threshold` (0–1 scale), and returns the
    /// survivors sorted by total descending.
    pub async fn score_batch(
        &self,
        profile: &CandidateProfile,
        jobs: Vec<JobPosting>,
        weights: ScoringWeights,
        accept_threshold: f64,
    ) -> Vec<(JobPosting, MatchScore)> {
        let cutoff = accept_threshold * 100.0;
        let mut set = JoinSet::new();
        for job in jobs {
            let scorer = self.clone();
            let profile = profile.clone();
            set.spawn(async move {
                let score = scorer.score(&profile, &job, weights).await;
                (job, score)
            });
        }

        let mut scored = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((job, score)) => {
                    if score.total >= cutoff {
                        scored.push((job, score));
                    }
                }
                // A panicked scoring task loses that posting only; the
                // batch always completes.
                Err(e) => tracing::error!("scoring task failed: {e}"),
            }
        }
        scored.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));
        scored
    }

    /// Zero score carrying the triggering error in the rationale. Used when
    /// scoring cannot run at all for a pair.
    pub fn error_score(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        weights: ScoringWeights,
        error: &str,
    ) -> MatchScore {
        let weights = weights.normalized();
        MatchScore {
            id: Uuid::new_v4(),
            candidate_id,
            job_id,
            skills_score: 0.0,
            experience_score: 0.0,
            education_score: 0.0,
            total: 0.0,
            classification: "Error".to_string(),
            rationale: format!("Error during scoring: {error}"),
            w_skills: weights.skills,
            w_experience: weights.experience,
            w_education: weights.education,
            backend: self.similarity.backend().to_string(),
            scored_at: Utc::now(),
        }
    }
}

fn build_rationale(skills: f64, experience: f64, education: f64, classification: &str) -> String {
    let band = |section: &str, score: f64| {
        if score >= 80.0 {
            format!("Strong {section} alignment ({score:.1}%)")
        } else if score >= 60.0 {
            format!("Good {section} match ({score:.1}%)")
        } else if score >= 30.0 {
            format!("Moderate {section} alignment ({score:.1}%)")
        } else {
            format!("Limited {section} match ({score:.1}%)")
        }
    };
    format!(
        "Overall classification: {classification}. {}. {}. {}.",
        band("skills", skills),
        band("experience", experience),
        band("education", education)
    )
}
