mod apply;
mod config;
mod db;
mod errors;
mod learning;
mod models;
mod routes;
mod scoring;
mod sources;
mod state;
mod store;
mod supervisor;
mod tracker;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::apply::channel::{DeliveryChannel, EmailChannel, HttpFormChannel};
use crate::apply::orchestrator::ApplyOrchestrator;
use crate::apply::selector::MethodSelector;
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::scoring::similarity::{EmbeddingSimilarity, LexicalSimilarity, SectionSimilarity};
use crate::scoring::weights::ScoringWeights;
use crate::scoring::Scorer;
use crate::sources::HttpJobSource;
use crate::state::AppState;
use crate::store::{PgStore, Store};
use crate::supervisor::{Supervisor, SupervisorOptions};
use crate::tracker::tracker::FollowUpSchedule;
use crate::tracker::OutcomeTracker;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Matchwright API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    // Similarity backend: embeddings when configured, lexical otherwise
    let similarity: Arc<dyn SectionSimilarity> = match &config.embedding_api_url {
        Some(url) => Arc::new(EmbeddingSimilarity::new(
            url.clone(),
            config.embedding_api_key.clone(),
        )),
        None => Arc::new(LexicalSimilarity),
    };
    info!("Similarity backend: {}", similarity.backend());
    let scorer = Scorer::new(similarity);

    // Delivery channels in fixed construction order; the selector reorders
    // per job from observed success rates
    let channels: Vec<Arc<dyn DeliveryChannel>> = vec![
        Arc::new(EmailChannel::new(config.email_relay_url.clone())),
        Arc::new(HttpFormChannel::new()),
    ];
    let orchestrator = ApplyOrchestrator::new(
        channels,
        MethodSelector::default(),
        config.max_retries,
        Duration::from_secs(config.retry_base_secs),
    );

    let supervisor = Arc::new(Supervisor::new(
        store.clone(),
        Arc::new(HttpJobSource::new(config.job_source_url.clone())),
        scorer.clone(),
        orchestrator,
        SupervisorOptions {
            weights: ScoringWeights::default(),
            accept_threshold: config.accept_threshold,
            max_applications_per_day: config.max_applications_per_day,
            job_delay_min: Duration::from_secs(config.job_delay_min_secs),
            job_delay_max: Duration::from_secs(config.job_delay_max_secs),
        },
    ));
    let tracker = Arc::new(OutcomeTracker::new(
        store.clone(),
        FollowUpSchedule::default(),
    ));

    let state = AppState {
        store,
        supervisor,
        tracker,
        scorer,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
