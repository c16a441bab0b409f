//! Orders delivery channels for one job from structural applicability and
//! observed success rates.

use std::sync::Arc;

use crate::apply::channel::DeliveryChannel;
use crate::apply::stats::MethodStats;
use crate::models::job::JobPosting;

/// Fixed platform-affinity preference used to break rate ties. Names not
/// in this list sort after it, in their given order.
const AFFINITY: &[&str] = &["email", "http-form", "platform"];

fn affinity_rank(name: &str) -> usize {
    AFFINITY
        .iter()
        .position(|n| *n == name)
        .unwrap_or(AFFINITY.len())
}

#[derive(Debug, Clone)]
pub struct MethodSelector {
    /// Channels with a success rate below this are deprioritized to the
    /// back of the order, but stay available as fallbacks.
    pub rate_floor: f64,
}

impl Default for MethodSelector {
    fn default() -> Self {
        Self { rate_floor: 0.3 }
    }
}

impl MethodSelector {
    /// Orders the structurally applicable channels for `job`: by success
    /// rate descending (untested → 1.0), affinity as tie-break, sub-floor
    /// channels last.
    pub fn order<'a>(
        &self,
        job: &JobPosting,
        channels: &'a [Arc<dyn DeliveryChannel>],
        stats: &MethodStats,
    ) -> Vec<&'a Arc<dyn DeliveryChannel>> {
        let mut applicable: Vec<_> = channels.iter().filter(|c| c.applicable(job)).collect();
        applicable.sort_by(|a, b| {
            let (ra, rb) = (stats.success_rate(a.name()), stats.success_rate(b.name()));
            let (fa, fb) = (ra < self.rate_floor, rb < self.rate_floor);
            fa.cmp(&fb)
                .then(rb.total_cmp(&ra))
                .then(affinity_rank(a.name()).cmp(&affinity_rank(b.name())))
        });
        applicable
    }

    /// Contract form: ordered channel names only.
    pub fn order_methods(
        &self,
        job: &JobPosting,
        channels: &[Arc<dyn DeliveryChannel>],
        stats: &MethodStats,
    ) -> Vec<String> {
        self.order(job, channels, stats)
            .into_iter()
            .map(|c| c.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::channel::ChannelResult;
    use crate::models::profile::CandidateProfile;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    /// Fake channel with a fixed name and an applicability switch.
    struct Fake {
        name: &'static str,
        mail_only: bool,
    }

    #[async_trait]
    impl DeliveryChannel for Fake {
        fn name(&self) -> &'static str {
            self.name
        }

        fn applicable(&self, job: &JobPosting) -> bool {
            if self.mail_only {
                job.has_mail_locator()
            } else {
                job.has_locator() && !job.has_mail_locator()
            }
        }

        async fn send(
            &self,
            _profile: &CandidateProfile,
            _job: &JobPosting,
            _message: &str,
        ) -> ChannelResult {
            ChannelResult::ok()
        }
    }

    fn channels() -> Vec<Arc<dyn DeliveryChannel>> {
        vec![
            Arc::new(Fake {
                name: "email",
                mail_only: true,
            }),
            Arc::new(Fake {
                name: "http-form",
                mail_only: false,
            }),
            Arc::new(Fake {
                name: "platform",
                mail_only: false,
            }),
        ]
    }

    fn posting(locator: &str) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            organization: "Acme".to_string(),
            location: "Remote".to_string(),
            description: String::new(),
            source: "connector".to_string(),
            apply_locator: locator.to_string(),
            salary_min: None,
            salary_max: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_inapplicable_channels_never_returned() {
        let selector = MethodSelector::default();
        let order = selector.order_methods(
            &posting("mailto:jobs@acme.test"),
            &channels(),
            &MethodStats::new(),
        );
        assert_eq!(order, vec!["email"]);

        let order = selector.order_methods(
            &posting("https://acme.test/apply"),
            &channels(),
            &MethodStats::new(),
        );
        assert!(!order.contains(&"email".to_string()));
    }

    #[test]
    fn test_untested_channels_tie_break_by_affinity() {
        let selector = MethodSelector::default();
        let order = selector.order_methods(
            &posting("https://acme.test/apply"),
            &channels(),
            &MethodStats::new(),
        );
        // Both untested at rate 1.0; affinity puts http-form first.
        assert_eq!(order, vec!["http-form", "platform"]);
    }

    #[test]
    fn test_higher_rate_wins() {
        let selector = MethodSelector::default();
        let mut stats = MethodStats::new();
        // http-form: 1/2. platform: 2/2.
        stats.record_attempt("http-form");
        stats.record_attempt("http-form");
        stats.record_success("http-form");
        stats.record_attempt("platform");
        stats.record_attempt("platform");
        stats.record_success("platform");
        stats.record_success("platform");

        let order =
            selector.order_methods(&posting("https://acme.test/apply"), &channels(), &stats);
        assert_eq!(order, vec!["platform", "http-form"]);
    }

    #[test]
    fn test_sub_floor_channel_deprioritized_not_removed() {
        let selector = MethodSelector::default();
        let mut stats = MethodStats::new();
        // platform: 1/10 = 0.1, below the 0.3 floor.
        for _ in 0..10 {
            stats.record_attempt("platform");
        }
        stats.record_success("platform");
        // http-form: 1/2 = 0.5.
        stats.record_attempt("http-form");
        stats.record_attempt("http-form");
        stats.record_success("http-form");

        let order =
            selector.order_methods(&posting("https://acme.test/apply"), &channels(), &stats);
        assert_eq!(order, vec!["http-form", "platform"]);
    }

    #[test]
    fn test_no_locator_yields_empty_order() {
        let selector = MethodSelector::default();
        let order = selector.order_methods(&posting(""), &channels(), &MethodStats::new());
        assert!(order.is_empty());
    }
}
