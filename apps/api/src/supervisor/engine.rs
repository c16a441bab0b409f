//! The supervisor: runs the fetch → dedup → score → apply → track pass,
//! guards against overlapping runs, enforces the daily cap, paces
//! submissions, and drives the periodic auto mode.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, Notify, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::apply::orchestrator::ApplyOrchestrator;
use crate::apply::stats::MethodStats;
use crate::errors::AppError;
use crate::learning::tuner::TuningOutcome;
use crate::learning::AdaptiveLearner;
use crate::models::job::JobPosting;
use crate::models::profile::CandidateProfile;
use crate::scoring::weights::ScoringWeights;
use crate::scoring::Scorer;
use crate::sources::{dedup_postings, JobSource, SearchParams};
use crate::store::Store;
use crate::tracker::tracker::FollowUpSchedule;
use crate::tracker::OutcomeTracker;

/// Mutable engine tuning state, shared between scoring and the learner.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub weights: ScoringWeights,
    pub accept_threshold: f64,
}

/// Startup knobs the supervisor keeps for the life of the process.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub weights: ScoringWeights,
    pub accept_threshold: f64,
    pub max_applications_per_day: u32,
    /// Randomized pause between consecutive submissions in one cycle.
    pub job_delay_min: Duration,
    pub job_delay_max: Duration,
}

/// What one cycle did, in counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub candidate_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs_fetched: usize,
    pub jobs_after_dedup: usize,
    pub qualified: usize,
    pub submitted: usize,
    pub skipped_already_applied: usize,
    pub skipped_daily_cap: usize,
    pub failed: usize,
    pub follow_ups_advanced: u32,
    pub errors: Vec<String>,
}

/// Point-in-time view for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub auto_mode: bool,
    pub weights: ScoringWeights,
    pub accept_threshold: f64,
    pub max_applications_per_day: u32,
    pub last_cycle: Option<CycleReport>,
}

pub struct Supervisor {
    store: Arc<dyn Store>,
    source: Arc<dyn JobSource>,
    scorer: Scorer,
    orchestrator: ApplyOrchestrator,
    tracker: OutcomeTracker,
    learner: AdaptiveLearner,
    settings: RwLock<EngineSettings>,
    /// Process-wide delivery counters. Cycle submissions and manual applies
    /// both mutate under this lock; the store copy is a persisted shadow,
    /// not the source of truth.
    stats: Mutex<MethodStats>,
    stats_loaded: AtomicBool,
    running: AtomicBool,
    auto_mode: AtomicBool,
    stop: Notify,
    last_cycle: RwLock<Option<CycleReport>>,
    max_per_day: u32,
    job_delay_min: Duration,
    job_delay_max: Duration,
}

impl Supervisor {
    pub fn new(
        store: Arc<dyn Store>,
        source: Arc<dyn JobSource>,
        scorer: Scorer,
        orchestrator: ApplyOrchestrator,
        options: SupervisorOptions,
    ) -> Self {
        Self {
            tracker: OutcomeTracker::new(store.clone(), FollowUpSchedule::default()),
            learner: AdaptiveLearner::new(store.clone()),
            store,
            source,
            scorer,
            orchestrator,
            settings: RwLock::new(EngineSettings {
                weights: options.weights,
                accept_threshold: options.accept_threshold,
            }),
            stats: Mutex::new(MethodStats::new()),
            stats_loaded: AtomicBool::new(false),
            running: AtomicBool::new(false),
            auto_mode: AtomicBool::new(false),
            stop: Notify::new(),
            last_cycle: RwLock::new(None),
            max_per_day: options.max_applications_per_day,
            job_delay_min: options.job_delay_min,
            job_delay_max: options.job_delay_max,
        }
    }

    pub async fn settings(&self) -> EngineSettings {
        self.settings.read().await.clone()
    }

    /// Locks the live counters, loading the persisted snapshot on first
    /// use. Callers mutate and persist before the guard drops, so two
    /// passes can never clobber each other's counts.
    async fn method_stats(&self) -> Result<MutexGuard<'_, MethodStats>, AppError> {
        let mut guard = self.stats.lock().await;
        if !self.stats_loaded.load(Ordering::SeqCst) {
            *guard = self.store.load_method_stats().await?;
            self.stats_loaded.store(true, Ordering::SeqCst);
        }
        Ok(guard)
    }

    pub async fn status(&self) -> EngineStatus {
        let settings = self.settings.read().await.clone();
        EngineStatus {
            running: self.running.load(Ordering::SeqCst),
            auto_mode: self.auto_mode.load(Ordering::SeqCst),
            weights: settings.weights,
            accept_threshold: settings.accept_threshold,
            max_applications_per_day: self.max_per_day,
            last_cycle: self.last_cycle.read().await.clone(),
        }
    }

    /// Runs one full cycle for a candidate. At most one cycle runs at a
    /// time; a second request while one is in flight is rejected, not
    /// queued.
    pub async fn run_cycle(&self, candidate_id: Uuid) -> Result<CycleReport, AppError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::Conflict(
                "an orchestration cycle is already in progress".to_string(),
            ));
        }
        let result = self.cycle(candidate_id).await;
        self.running.store(false, Ordering::SeqCst);
        if let Ok(report) = &result {
            *self.last_cycle.write().await = Some(report.clone());
        }
        result
    }

    async fn cycle(&self, candidate_id: Uuid) -> Result<CycleReport, AppError> {
        let started_at = Utc::now();
        let profile = self
            .store
            .get_profile(candidate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("candidate {candidate_id}")))?;
        let settings = self.settings().await;

        let follow_ups_advanced = self.tracker.scan_follow_ups(Utc::now()).await?;

        // A dead connector ends the cycle early with a zero-posting summary
        // rather than an error: there is nothing to retry within the cycle.
        let params = search_params_for(&profile);
        let fetched = match self.source.fetch(&params).await {
            Ok(postings) => postings,
            Err(e) => {
                error!("job source failed, ending cycle with no postings: {e}");
                return Ok(CycleReport {
                    candidate_id,
                    started_at,
                    finished_at: Utc::now(),
                    jobs_fetched: 0,
                    jobs_after_dedup: 0,
                    qualified: 0,
                    submitted: 0,
                    skipped_already_applied: 0,
                    skipped_daily_cap: 0,
                    failed: 0,
                    follow_ups_advanced,
                    errors: vec![format!("job source failed: {e}")],
                });
            }
        };
        let jobs_fetched = fetched.len();
        let jobs = dedup_postings(fetched);
        let jobs_after_dedup = jobs.len();
        for job in &jobs {
            self.store.upsert_posting(job).await?;
        }
        info!(
            candidate_id = %candidate_id,
            fetched = jobs_fetched,
            after_dedup = jobs_after_dedup,
            "postings fetched"
        );

        let qualified = self
            .scorer
            .score_batch(&profile, jobs, settings.weights, settings.accept_threshold)
            .await;

        let mut report = CycleReport {
            candidate_id,
            started_at,
            finished_at: started_at,
            jobs_fetched,
            jobs_after_dedup,
            qualified: qualified.len(),
            submitted: 0,
            skipped_already_applied: 0,
            skipped_daily_cap: 0,
            failed: 0,
            follow_ups_advanced,
            errors: Vec::new(),
        };

        let mut paced = false;
        for (job, score) in qualified {
            // Persistence failures on the apply path are logged, never
            // allowed to destroy the cycle outcome.
            if let Err(e) = self.store.insert_score(&score).await {
                error!(job_id = %job.id, "failed to persist match score: {e}");
            }

            if self
                .store
                .application_for_job(candidate_id, job.id)
                .await?
                .is_some()
            {
                report.skipped_already_applied += 1;
                continue;
            }

            let day_ago = Utc::now() - ChronoDuration::hours(24);
            if self.store.applications_since(day_ago).await? >= self.max_per_day {
                warn!(cap = self.max_per_day, "daily application cap reached");
                report.skipped_daily_cap += 1;
                continue;
            }

            if paced {
                tokio::time::sleep(self.pacing_delay()).await;
            }
            paced = true;

            let apply = {
                let mut stats = self.method_stats().await?;
                let apply = self.orchestrator.apply(&profile, &job, &mut stats).await;
                if let Err(e) = self.store.save_method_stats(&stats).await {
                    error!("failed to persist method stats: {e}");
                }
                apply
            };
            if let Err(e) = self.store.insert_attempts(&apply.attempts).await {
                error!(job_id = %job.id, "failed to persist delivery attempts: {e}");
            }

            if apply.success {
                let channel = apply.channel.as_deref().unwrap_or("unknown");
                let notes = format!(
                    "Matched at {:.1} ({}) for {} at {}",
                    score.total, score.classification, job.title, job.organization
                );
                if let Err(e) = self
                    .tracker
                    .open(candidate_id, job.id, channel, notes)
                    .await
                {
                    error!(job_id = %job.id, "failed to open application record: {e}");
                }
                report.submitted += 1;
            } else {
                report.failed += 1;
                report.errors.push(format!(
                    "{} at {}: {}",
                    job.title,
                    job.organization,
                    apply
                        .last_error
                        .unwrap_or_else(|| "delivery failed".to_string())
                ));
            }
        }

        report.finished_at = Utc::now();
        info!(
            submitted = report.submitted,
            failed = report.failed,
            skipped = report.skipped_already_applied,
            capped = report.skipped_daily_cap,
            "cycle complete"
        );
        Ok(report)
    }

    /// Applies to a single known posting, outside the cycle flow. Rejected
    /// when an application for the pair already exists.
    pub async fn apply_single(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<crate::apply::ApplyReport, AppError> {
        let profile = self
            .store
            .get_profile(candidate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("candidate {candidate_id}")))?;
        let job = self
            .store
            .get_posting(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job posting {job_id}")))?;
        if self
            .store
            .application_for_job(candidate_id, job_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "an application for job {job_id} already exists"
            )));
        }

        // The daily cap binds manual applies just like cycle submissions.
        let day_ago = Utc::now() - ChronoDuration::hours(24);
        if self.store.applications_since(day_ago).await? >= self.max_per_day {
            return Err(AppError::Conflict(format!(
                "daily cap of {} applications reached",
                self.max_per_day
            )));
        }

        let report = {
            let mut stats = self.method_stats().await?;
            let report = self.orchestrator.apply(&profile, &job, &mut stats).await;
            if let Err(e) = self.store.save_method_stats(&stats).await {
                error!("failed to persist method stats: {e}");
            }
            report
        };
        if let Err(e) = self.store.insert_attempts(&report.attempts).await {
            error!(job_id = %job_id, "failed to persist delivery attempts: {e}");
        }
        if report.success {
            let channel = report.channel.as_deref().unwrap_or("unknown");
            let notes = format!("Manual apply for {} at {}", job.title, job.organization);
            if let Err(e) = self.tracker.open(candidate_id, job_id, channel, notes).await {
                error!(job_id = %job_id, "failed to open application record: {e}");
            }
        }
        Ok(report)
    }

    /// Operator reset of the per-channel delivery counters.
    pub async fn reset_method_stats(&self) -> Result<(), AppError> {
        let mut stats = self.method_stats().await?;
        stats.reset();
        self.store.save_method_stats(&stats).await?;
        info!("method stats reset");
        Ok(())
    }

    /// Analyzes outcomes without changing any settings.
    pub async fn analyze(
        &self,
        candidate_id: Uuid,
    ) -> Result<crate::models::learning::LearningSnapshot, AppError> {
        let settings = self.settings().await;
        self.learner
            .analyze(candidate_id, settings.weights, settings.accept_threshold)
            .await
    }

    /// Runs the learner and adopts whatever it retuned.
    pub async fn run_learning(&self, candidate_id: Uuid) -> Result<TuningOutcome, AppError> {
        let current = self.settings().await;
        let outcome = self
            .learner
            .retune(candidate_id, current.weights, current.accept_threshold)
            .await?;
        let mut settings = self.settings.write().await;
        settings.weights = outcome.weights;
        settings.accept_threshold = outcome.accept_threshold;
        Ok(outcome)
    }

    /// Starts the periodic background loop: cycle, then learning, every
    /// `interval`. Returns false when auto mode was already on.
    pub fn start_auto(self: &Arc<Self>, candidate_id: Uuid, interval: Duration) -> bool {
        if self.auto_mode.swap(true, Ordering::SeqCst) {
            return false;
        }
        let supervisor = self.clone();
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "auto mode started");
            loop {
                match supervisor.run_cycle(candidate_id).await {
                    Ok(report) => info!(submitted = report.submitted, "auto cycle finished"),
                    Err(e) => error!("auto cycle failed: {e}"),
                }
                if let Err(e) = supervisor.run_learning(candidate_id).await {
                    error!("auto learning pass failed: {e}");
                }
                tokio::select! {
                    _ = supervisor.stop.notified() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                if !supervisor.auto_mode.load(Ordering::SeqCst) {
                    break;
                }
            }
            info!("auto mode stopped");
        });
        true
    }

    /// Stops the background loop. Returns false when it was not running.
    pub fn stop_auto(&self) -> bool {
        let was_on = self.auto_mode.swap(false, Ordering::SeqCst);
        if was_on {
            self.stop.notify_waiters();
        }
        was_on
    }

    fn pacing_delay(&self) -> Duration {
        if self.job_delay_max.is_zero() {
            return Duration::ZERO;
        }
        let min = self.job_delay_min.as_millis() as u64;
        let max = self.job_delay_max.as_millis() as u64;
        let ms = rand::thread_rng().gen_range(min..=max.max(min));
        Duration::from_millis(ms)
    }
}

/// Derives connector search parameters from the candidate's profile.
fn search_params_for(profile: &CandidateProfile) -> SearchParams {
    let keywords: Vec<&str> = profile
        .skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(3)
        .collect();
    let mut params = SearchParams::default();
    if !keywords.is_empty() {
        params.keywords = keywords.join(" ");
    }
    if !profile.preferred_location.trim().is_empty() {
        params.location = profile.preferred_location.clone();
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::channel::{ChannelResult, DeliveryChannel};
    use crate::apply::selector::MethodSelector;
    use crate::scoring::similarity::SectionSimilarity;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct StaticSource {
        jobs: Vec<JobPosting>,
    }

    #[async_trait]
    impl JobSource for StaticSource {
        async fn fetch(&self, _params: &SearchParams) -> Result<Vec<JobPosting>, AppError> {
            Ok(self.jobs.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl JobSource for FailingSource {
        async fn fetch(&self, _params: &SearchParams) -> Result<Vec<JobPosting>, AppError> {
            Err(AppError::Source("connector unreachable".to_string()))
        }
    }

    struct FixedSimilarity(f64);

    #[async_trait]
    impl SectionSimilarity for FixedSimilarity {
        async fn similarity(&self, a: &str, b: &str) -> f64 {
            if a.trim().is_empty() || b.trim().is_empty() {
                0.0
            } else {
                self.0
            }
        }

        fn backend(&self) -> &'static str {
            "fixed"
        }
    }

    struct AlwaysChannel {
        succeed: bool,
    }

    #[async_trait]
    impl DeliveryChannel for AlwaysChannel {
        fn name(&self) -> &'static str {
            "http-form"
        }

        fn applicable(&self, job: &JobPosting) -> bool {
            job.has_locator()
        }

        async fn send(
            &self,
            _profile: &CandidateProfile,
            _job: &JobPosting,
            _message: &str,
        ) -> ChannelResult {
            if self.succeed {
                ChannelResult::ok()
            } else {
                ChannelResult::fail("scripted failure")
            }
        }
    }

    struct SlowChannel {
        delay: Duration,
    }

    #[async_trait]
    impl DeliveryChannel for SlowChannel {
        fn name(&self) -> &'static str {
            "http-form"
        }

        fn applicable(&self, job: &JobPosting) -> bool {
            job.has_locator()
        }

        async fn send(
            &self,
            _profile: &CandidateProfile,
            _job: &JobPosting,
            _message: &str,
        ) -> ChannelResult {
            tokio::time::sleep(self.delay).await;
            ChannelResult::ok()
        }
    }

    fn posting(title: &str, org: &str) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: title.to_string(),
            organization: org.to_string(),
            location: "Remote".to_string(),
            description: "Python, Django required. 3+ years of experience. \
                          Bachelor's degree preferred."
                .to_string(),
            source: "connector".to_string(),
            apply_locator: format!("https://{org}.test/apply").to_lowercase(),
            salary_min: None,
            salary_max: None,
            fetched_at: Utc::now(),
        }
    }

    async fn seeded_store() -> (Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let mut profile = CandidateProfile::empty(Uuid::new_v4());
        profile.skills = "Python, Django, AWS".to_string();
        profile.preferred_location = "Remote".to_string();
        let id = profile.id;
        store.add_profile(profile).await;
        (store, id)
    }

    fn supervisor(
        store: Arc<MemoryStore>,
        jobs: Vec<JobPosting>,
        deliver: bool,
        max_per_day: u32,
        delay: Duration,
    ) -> Arc<Supervisor> {
        let orchestrator = ApplyOrchestrator::new(
            vec![Arc::new(AlwaysChannel { succeed: deliver })],
            MethodSelector::default(),
            2,
            Duration::ZERO,
        );
        Arc::new(Supervisor::new(
            store,
            Arc::new(StaticSource { jobs }),
            Scorer::new(Arc::new(FixedSimilarity(0.65))),
            orchestrator,
            SupervisorOptions {
                weights: ScoringWeights::default(),
                accept_threshold: 0.5,
                max_applications_per_day: max_per_day,
                job_delay_min: delay,
                job_delay_max: delay,
            },
        ))
    }

    #[tokio::test]
    async fn test_cycle_submits_qualified_jobs_and_tracks_them() {
        let (store, candidate) = seeded_store().await;
        let jobs = vec![posting("Backend Engineer", "Acme"), posting("Platform Engineer", "Globex")];
        let sup = supervisor(store.clone(), jobs, true, 10, Duration::ZERO);

        let report = sup.run_cycle(candidate).await.unwrap();
        assert_eq!(report.jobs_fetched, 2);
        assert_eq!(report.qualified, 2);
        assert_eq!(report.submitted, 2);
        assert_eq!(report.failed, 0);

        let apps = store
            .applications_for_candidate(candidate, None)
            .await
            .unwrap();
        assert_eq!(apps.len(), 2);
        assert!(apps.iter().all(|a| a.status == "applied"));
        // Channel stats were persisted.
        let stats = store.load_method_stats().await.unwrap();
        assert_eq!(stats.counter("http-form").successes, 2);
    }

    #[tokio::test]
    async fn test_cycle_skips_already_applied_jobs() {
        let (store, candidate) = seeded_store().await;
        let job = posting("Backend Engineer", "Acme");
        let sup = supervisor(store.clone(), vec![job], true, 10, Duration::ZERO);

        let first = sup.run_cycle(candidate).await.unwrap();
        assert_eq!(first.submitted, 1);

        let second = sup.run_cycle(candidate).await.unwrap();
        assert_eq!(second.submitted, 0);
        assert_eq!(second.skipped_already_applied, 1);
        let apps = store
            .applications_for_candidate(candidate, None)
            .await
            .unwrap();
        assert_eq!(apps.len(), 1);
    }

    #[tokio::test]
    async fn test_daily_cap_enforced_before_each_submission() {
        let (store, candidate) = seeded_store().await;
        let jobs = vec![
            posting("Backend Engineer", "Acme"),
            posting("Platform Engineer", "Globex"),
            posting("Data Engineer", "Initech"),
        ];
        let sup = supervisor(store, jobs, true, 1, Duration::ZERO);

        let report = sup.run_cycle(candidate).await.unwrap();
        assert_eq!(report.submitted, 1);
        assert_eq!(report.skipped_daily_cap, 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_recorded_without_application() {
        let (store, candidate) = seeded_store().await;
        let job = posting("Backend Engineer", "Acme");
        let job_id = job.id;
        let sup = supervisor(store.clone(), vec![job], false, 10, Duration::ZERO);

        let report = sup.run_cycle(candidate).await.unwrap();
        assert_eq!(report.submitted, 0);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("scripted failure"));
        assert!(store
            .applications_for_candidate(candidate, None)
            .await
            .unwrap()
            .is_empty());
        // Failed tries still land in the attempt log, per try.
        let attempts = store.attempts_for_job(job_id).await;
        assert_eq!(attempts.len(), 2);
        assert!(attempts.iter().all(|a| !a.success));
        let stats = store.load_method_stats().await.unwrap();
        assert_eq!(stats.counter("http-form").attempts, 1);
        assert_eq!(stats.counter("http-form").successes, 0);
    }

    #[tokio::test]
    async fn test_concurrent_cycle_rejected_not_queued() {
        let (store, candidate) = seeded_store().await;
        let jobs = vec![posting("Backend Engineer", "Acme"), posting("Platform Engineer", "Globex")];
        // 200ms pacing between the two submissions keeps the first cycle
        // busy long enough to observe the guard.
        let sup = supervisor(store, jobs, true, 10, Duration::from_millis(200));

        let running = sup.clone();
        let handle = tokio::spawn(async move { running.run_cycle(candidate).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = sup.run_cycle(candidate).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let first = handle.await.unwrap().unwrap();
        assert_eq!(first.submitted, 2);
        // Guard released after the cycle.
        assert!(sup.run_cycle(candidate).await.is_ok());
    }

    #[tokio::test]
    async fn test_source_failure_ends_cycle_with_zero_postings() {
        let (store, candidate) = seeded_store().await;
        let orchestrator = ApplyOrchestrator::new(
            vec![Arc::new(AlwaysChannel { succeed: true })],
            MethodSelector::default(),
            2,
            Duration::ZERO,
        );
        let sup = Supervisor::new(
            store,
            Arc::new(FailingSource),
            Scorer::new(Arc::new(FixedSimilarity(0.65))),
            orchestrator,
            SupervisorOptions {
                weights: ScoringWeights::default(),
                accept_threshold: 0.5,
                max_applications_per_day: 10,
                job_delay_min: Duration::ZERO,
                job_delay_max: Duration::ZERO,
            },
        );

        // Connector total failure is a summary, not an error.
        let report = sup.run_cycle(candidate).await.unwrap();
        assert_eq!(report.jobs_fetched, 0);
        assert_eq!(report.submitted, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("job source failed"));
        // Guard released.
        assert!(sup.run_cycle(candidate).await.is_ok());
    }

    #[tokio::test]
    async fn test_manual_apply_rejects_duplicate() {
        let (store, candidate) = seeded_store().await;
        let job = posting("Backend Engineer", "Acme");
        store.upsert_posting(&job).await.unwrap();
        let sup = supervisor(store.clone(), Vec::new(), true, 10, Duration::ZERO);

        let report = sup.apply_single(candidate, job.id).await.unwrap();
        assert!(report.success);
        assert!(store
            .application_for_job(candidate, job.id)
            .await
            .unwrap()
            .is_some());

        let dup = sup.apply_single(candidate, job.id).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_manual_apply_enforces_daily_cap() {
        let (store, candidate) = seeded_store().await;
        let first = posting("Backend Engineer", "Acme");
        let second = posting("Platform Engineer", "Globex");
        store.upsert_posting(&first).await.unwrap();
        store.upsert_posting(&second).await.unwrap();
        let sup = supervisor(store.clone(), Vec::new(), true, 1, Duration::ZERO);

        assert!(sup.apply_single(candidate, first.id).await.unwrap().success);

        // Cap of 1 is already spent; the second manual apply never reaches
        // the delivery channel.
        let capped = sup.apply_single(candidate, second.id).await;
        assert!(matches!(capped, Err(AppError::Conflict(_))));
        assert!(store
            .application_for_job(candidate, second.id)
            .await
            .unwrap()
            .is_none());
        assert!(store.attempts_for_job(second.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_manual_applies_accumulate_stats() {
        let (store, candidate) = seeded_store().await;
        let first = posting("Backend Engineer", "Acme");
        let second = posting("Platform Engineer", "Globex");
        store.upsert_posting(&first).await.unwrap();
        store.upsert_posting(&second).await.unwrap();
        let orchestrator = ApplyOrchestrator::new(
            vec![Arc::new(SlowChannel {
                delay: Duration::from_millis(50),
            })],
            MethodSelector::default(),
            2,
            Duration::ZERO,
        );
        let sup = Arc::new(Supervisor::new(
            store.clone(),
            Arc::new(StaticSource { jobs: Vec::new() }),
            Scorer::new(Arc::new(FixedSimilarity(0.65))),
            orchestrator,
            SupervisorOptions {
                weights: ScoringWeights::default(),
                accept_threshold: 0.5,
                max_applications_per_day: 10,
                job_delay_min: Duration::ZERO,
                job_delay_max: Duration::ZERO,
            },
        ));

        let racing = sup.clone();
        let first_id = first.id;
        let handle = tokio::spawn(async move { racing.apply_single(candidate, first_id).await });
        let second_report = sup.apply_single(candidate, second.id).await.unwrap();
        let first_report = handle.await.unwrap().unwrap();
        assert!(first_report.success);
        assert!(second_report.success);

        // Overlapping passes serialize on the shared counters; the
        // persisted snapshot holds both submissions.
        let stats = store.load_method_stats().await.unwrap();
        assert_eq!(stats.counter("http-form").attempts, 2);
        assert_eq!(stats.counter("http-form").successes, 2);
    }

    #[tokio::test]
    async fn test_manual_apply_unknown_posting_is_not_found() {
        let (store, candidate) = seeded_store().await;
        let sup = supervisor(store, Vec::new(), true, 10, Duration::ZERO);
        let err = sup.apply_single(candidate, Uuid::new_v4()).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_method_stats_reset_clears_counters() {
        let (store, candidate) = seeded_store().await;
        let job = posting("Backend Engineer", "Acme");
        store.upsert_posting(&job).await.unwrap();
        let sup = supervisor(store.clone(), Vec::new(), true, 10, Duration::ZERO);
        sup.apply_single(candidate, job.id).await.unwrap();
        assert_eq!(
            store.load_method_stats().await.unwrap().counter("http-form").attempts,
            1
        );

        sup.reset_method_stats().await.unwrap();
        let stats = store.load_method_stats().await.unwrap();
        assert_eq!(stats.counter("http-form").attempts, 0);
    }

    #[tokio::test]
    async fn test_unknown_candidate_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let sup = supervisor(store, Vec::new(), true, 10, Duration::ZERO);
        let err = sup.run_cycle(Uuid::new_v4()).await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_learning_pass_updates_engine_settings() {
        let (store, candidate) = seeded_store().await;
        // Empty window: the learner loosens the threshold for a quiet funnel.
        let orchestrator = ApplyOrchestrator::new(
            vec![Arc::new(AlwaysChannel { succeed: true })],
            MethodSelector::default(),
            2,
            Duration::ZERO,
        );
        let sup = Supervisor::new(
            store,
            Arc::new(StaticSource { jobs: Vec::new() }),
            Scorer::new(Arc::new(FixedSimilarity(0.65))),
            orchestrator,
            SupervisorOptions {
                weights: ScoringWeights::default(),
                accept_threshold: 0.7,
                max_applications_per_day: 10,
                job_delay_min: Duration::ZERO,
                job_delay_max: Duration::ZERO,
            },
        );
        let outcome = sup.run_learning(candidate).await.unwrap();
        let after = sup.settings().await;
        assert!((after.accept_threshold - 0.65).abs() < 1e-9);
        assert!((after.accept_threshold - outcome.accept_threshold).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_status_reflects_last_cycle() {
        let (store, candidate) = seeded_store().await;
        let sup = supervisor(store, vec![posting("Backend Engineer", "Acme")], true, 10, Duration::ZERO);
        assert!(sup.status().await.last_cycle.is_none());

        sup.run_cycle(candidate).await.unwrap();
        let status = sup.status().await;
        assert!(!status.running);
        let last = status.last_cycle.unwrap();
        assert_eq!(last.submitted, 1);
    }

    #[test]
    fn test_search_params_from_profile_skills() {
        let mut profile = CandidateProfile::empty(Uuid::new_v4());
        profile.skills = "Python, Django, AWS, Kubernetes".to_string();
        profile.preferred_location = "Berlin".to_string();
        let params = search_params_for(&profile);
        assert_eq!(params.keywords, "Python Django AWS");
        assert_eq!(params.location, "Berlin");

        let empty = CandidateProfile::empty(Uuid::new_v4());
        let fallback = search_params_for(&empty);
        assert_eq!(fallback.keywords, SearchParams::default().keywords);
    }
}
