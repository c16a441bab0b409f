use std::sync::Arc;

use crate::config::Config;
use crate::scoring::Scorer;
use crate::store::Store;
use crate::supervisor::Supervisor;
use crate::tracker::OutcomeTracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub supervisor: Arc<Supervisor>,
    pub tracker: Arc<OutcomeTracker>,
    /// Pluggable similarity backend behind it. Default: lexical. Swap via
    /// EMBEDDING_API_URL env.
    pub scorer: Scorer,
    pub config: Config,
}
