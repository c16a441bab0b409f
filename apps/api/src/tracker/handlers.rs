use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::ApplicationRecord;
use crate::state::AppState;
use crate::tracker::tracker::{ApplicationStatistics, FollowUpReminder};

#[derive(Deserialize)]
pub struct CandidateIdQuery {
    pub candidate_id: Uuid,
}

/// GET /api/v1/applications?candidate_id=..
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(params): Query<CandidateIdQuery>,
) -> Result<Json<Vec<ApplicationRecord>>, AppError> {
    let records = state
        .store
        .applications_for_candidate(params.candidate_id, None)
        .await?;
    Ok(Json(records))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    pub notes: Option<String>,
}

/// PATCH /api/v1/applications/:id/status
/// Unknown statuses are rejected; non-standard transitions are applied as
/// manual corrections and flagged in the history.
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<ApplicationRecord>, AppError> {
    let record = state.tracker.transition(id, &req.status, req.notes).await?;
    Ok(Json(record))
}

/// GET /api/v1/applications/reminders?candidate_id=..
pub async fn handle_reminders(
    State(state): State<AppState>,
    Query(params): Query<CandidateIdQuery>,
) -> Result<Json<Vec<FollowUpReminder>>, AppError> {
    let reminders = state
        .tracker
        .reminders(params.candidate_id, Utc::now())
        .await?;
    Ok(Json(reminders))
}

#[derive(Deserialize)]
pub struct StatisticsQuery {
    pub candidate_id: Uuid,
    pub window_days: Option<i64>,
}

/// GET /api/v1/applications/statistics?candidate_id=..&window_days=30
pub async fn handle_statistics(
    State(state): State<AppState>,
    Query(params): Query<StatisticsQuery>,
) -> Result<Json<ApplicationStatistics>, AppError> {
    let window = params.window_days.unwrap_or(30).max(1);
    let stats = state
        .tracker
        .statistics(params.candidate_id, window)
        .await?;
    Ok(Json(stats))
}
