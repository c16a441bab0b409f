use anyhow::{Context, Result};
use std::str::FromStr;

/// Application configuration loaded from environment variables.
/// Required variables fail startup; engine tunables fall back to defaults,
/// and out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub rust_log: String,

    /// External job source connector endpoint (`fetch` contract).
    pub job_source_url: String,
    /// Optional embeddings endpoint. Absent → lexical similarity fallback.
    pub embedding_api_url: Option<String>,
    pub embedding_api_key: Option<String>,
    /// Optional outbound email relay used by the email delivery channel.
    pub email_relay_url: Option<String>,

    /// Hard cap on applications per day, enforced before each apply attempt.
    pub max_applications_per_day: u32,
    /// Initial accept threshold on the 0–1 scale. Retuned by the learner.
    pub accept_threshold: f64,
    /// Auto-mode cycle interval.
    pub cycle_interval_hours: u64,
    /// Per-channel retry count in the apply fallback chain.
    pub max_retries: u32,
    /// Backoff base, in seconds, for `base * 2^attempt`.
    pub retry_base_secs: u64,
    /// Randomized pacing delay between jobs, in seconds.
    pub job_delay_min_secs: u64,
    pub job_delay_max_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let accept_threshold: f64 = env_or("ACCEPT_THRESHOLD", 0.7)?;
        let job_delay_min_secs: u64 = env_or("JOB_DELAY_MIN_SECS", 30)?;
        let job_delay_max_secs: u64 = env_or("JOB_DELAY_MAX_SECS", 60)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            job_source_url: require_env("JOB_SOURCE_URL")?,
            embedding_api_url: std::env::var("EMBEDDING_API_URL").ok(),
            embedding_api_key: std::env::var("EMBEDDING_API_KEY").ok(),
            email_relay_url: std::env::var("EMAIL_RELAY_URL").ok(),
            max_applications_per_day: env_or("MAX_APPLICATIONS_PER_DAY", 10)?,
            accept_threshold: accept_threshold.clamp(0.5, 0.9),
            cycle_interval_hours: env_or("CYCLE_INTERVAL_HOURS", 12)?,
            max_retries: env_or("MAX_RETRIES", 3)?,
            retry_base_secs: env_or("RETRY_BASE_SECS", 5)?,
            job_delay_min_secs,
            job_delay_max_secs: job_delay_max_secs.max(job_delay_min_secs),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value")),
        Err(_) => Ok(default),
    }
}
