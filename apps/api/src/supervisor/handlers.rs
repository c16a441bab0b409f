use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::apply::ApplyReport;
use crate::errors::AppError;
use crate::scoring::scorer::MatchScore;
use crate::state::AppState;
use crate::supervisor::engine::{CycleReport, EngineStatus};

#[derive(Deserialize)]
pub struct CandidateIdBody {
    pub candidate_id: Uuid,
}

/// POST /api/v1/cycle
/// Runs one full cycle. 409 when a cycle is already in flight.
pub async fn handle_run_cycle(
    State(state): State<AppState>,
    Json(req): Json<CandidateIdBody>,
) -> Result<Json<CycleReport>, AppError> {
    let report = state.supervisor.run_cycle(req.candidate_id).await?;
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct AutoModeResponse {
    pub auto_mode: bool,
    pub changed: bool,
}

/// POST /api/v1/cycle/auto/start
pub async fn handle_auto_start(
    State(state): State<AppState>,
    Json(req): Json<CandidateIdBody>,
) -> Result<Json<AutoModeResponse>, AppError> {
    let interval = Duration::from_secs(state.config.cycle_interval_hours * 3600);
    let changed = state.supervisor.start_auto(req.candidate_id, interval);
    Ok(Json(AutoModeResponse {
        auto_mode: true,
        changed,
    }))
}

/// POST /api/v1/cycle/auto/stop
pub async fn handle_auto_stop(
    State(state): State<AppState>,
) -> Result<Json<AutoModeResponse>, AppError> {
    let changed = state.supervisor.stop_auto();
    Ok(Json(AutoModeResponse {
        auto_mode: false,
        changed,
    }))
}

/// GET /api/v1/cycle/status
pub async fn handle_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.supervisor.status().await)
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
}

/// POST /api/v1/apply
/// Manual single-job apply, outside the cycle flow. 409 when an
/// application for the pair already exists.
pub async fn handle_manual_apply(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ApplyReport>, AppError> {
    let report = state
        .supervisor
        .apply_single(req.candidate_id, req.job_id)
        .await?;
    Ok(Json(report))
}

/// POST /api/v1/methods/reset
/// Operator reset of the per-channel delivery counters.
pub async fn handle_reset_methods(
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.supervisor.reset_method_stats().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/score
/// Scores one (candidate, job) pair under the engine's current weights and
/// records the result.
pub async fn handle_score_job(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<MatchScore>, AppError> {
    let profile = state
        .store
        .get_profile(req.candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("candidate {}", req.candidate_id)))?;
    let job = state
        .store
        .get_posting(req.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job posting {}", req.job_id)))?;

    let settings = state.supervisor.settings().await;
    let score = state.scorer.score(&profile, &job, settings.weights).await;
    state.store.insert_score(&score).await?;
    Ok(Json(score))
}

/// GET /api/v1/scores/latest?candidate_id=..&job_id=..
pub async fn handle_latest_score(
    State(state): State<AppState>,
    Query(req): Query<ScoreRequest>,
) -> Result<Json<MatchScore>, AppError> {
    let score = state
        .store
        .latest_score(req.candidate_id, req.job_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "no score for candidate {} and job {}",
                req.candidate_id, req.job_id
            ))
        })?;
    Ok(Json(score))
}
