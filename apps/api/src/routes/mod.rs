pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::learning::handlers as learning;
use crate::state::AppState;
use crate::supervisor::handlers as engine;
use crate::tracker::handlers as applications;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Cycle orchestration
        .route("/api/v1/cycle", post(engine::handle_run_cycle))
        .route("/api/v1/cycle/status", get(engine::handle_status))
        .route("/api/v1/cycle/auto/start", post(engine::handle_auto_start))
        .route("/api/v1/cycle/auto/stop", post(engine::handle_auto_stop))
        // Scoring and manual apply
        .route("/api/v1/score", post(engine::handle_score_job))
        .route("/api/v1/scores/latest", get(engine::handle_latest_score))
        .route("/api/v1/apply", post(engine::handle_manual_apply))
        .route("/api/v1/methods/reset", post(engine::handle_reset_methods))
        // Application tracking
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_update_status),
        )
        .route(
            "/api/v1/applications/reminders",
            get(applications::handle_reminders),
        )
        .route(
            "/api/v1/applications/statistics",
            get(applications::handle_statistics),
        )
        // Learning
        .route("/api/v1/learning/analyze", post(learning::handle_analyze))
        .route("/api/v1/learning/retune", post(learning::handle_retune))
        .route("/api/v1/insights", get(learning::handle_insights))
        .with_state(state)
}
