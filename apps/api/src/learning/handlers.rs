use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::learning::{AdjustmentRow, LearningSnapshot};
use crate::scoring::weights::ScoringWeights;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CandidateIdBody {
    pub candidate_id: Uuid,
}

#[derive(Deserialize)]
pub struct CandidateIdQuery {
    pub candidate_id: Uuid,
}

/// POST /api/v1/learning/analyze
/// Recomputes the outcome snapshot without touching engine settings.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<CandidateIdBody>,
) -> Result<Json<LearningSnapshot>, AppError> {
    let snapshot = state.supervisor.analyze(req.candidate_id).await?;
    Ok(Json(snapshot))
}

#[derive(Serialize)]
pub struct RetuneResponse {
    pub weights: ScoringWeights,
    pub accept_threshold: f64,
    pub adjustments: Vec<AdjustmentRow>,
    pub snapshot: LearningSnapshot,
}

/// POST /api/v1/learning/retune
/// Runs the learner and adopts the retuned weights and threshold.
pub async fn handle_retune(
    State(state): State<AppState>,
    Json(req): Json<CandidateIdBody>,
) -> Result<Json<RetuneResponse>, AppError> {
    let outcome = state.supervisor.run_learning(req.candidate_id).await?;
    Ok(Json(RetuneResponse {
        weights: outcome.weights,
        accept_threshold: outcome.accept_threshold,
        adjustments: outcome.adjustments,
        snapshot: outcome.snapshot,
    }))
}

/// GET /api/v1/insights?candidate_id=..
/// Latest snapshot, computed on demand when none exists yet.
pub async fn handle_insights(
    State(state): State<AppState>,
    Query(params): Query<CandidateIdQuery>,
) -> Result<Json<LearningSnapshot>, AppError> {
    let snapshot = match state.store.latest_snapshot(params.candidate_id).await? {
        Some(snapshot) => snapshot,
        None => state.supervisor.analyze(params.candidate_id).await?,
    };
    Ok(Json(snapshot))
}
