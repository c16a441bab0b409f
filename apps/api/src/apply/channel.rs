//! Delivery channel contract and the two production channels.
//!
//! A channel must never return an error from `send`: every failure mode is
//! expressed as an unsuccessful `ChannelResult` so the orchestrator's
//! retry/fallback logic sees one uniform shape. Transport timeouts are
//! bounded by the reqwest client timeout.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::models::job::JobPosting;
use crate::models::profile::CandidateProfile;

/// Outcome of one delivery try.
#[derive(Debug, Clone)]
pub struct ChannelResult {
    pub success: bool,
    pub error: Option<String>,
    pub detail: Option<serde_json::Value>,
}

impl ChannelResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            detail: None,
        }
    }

    pub fn ok_with(detail: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            detail: Some(detail),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            detail: None,
        }
    }
}

/// A named delivery mechanism capable of submitting one application.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Structural applicability: can this channel address the job's apply
    /// locator at all. The selector never orders an inapplicable channel.
    fn applicable(&self, job: &JobPosting) -> bool;

    /// Transmits the application. Never errors; failure is a result.
    async fn send(
        &self,
        profile: &CandidateProfile,
        job: &JobPosting,
        message: &str,
    ) -> ChannelResult;
}

fn bounded_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

/// Mail-shaped locators only. Hands the message to an outbound relay
/// endpoint; the relay owns actual SMTP transport.
pub struct EmailChannel {
    client: Client,
    relay_url: Option<String>,
}

impl EmailChannel {
    pub fn new(relay_url: Option<String>) -> Self {
        Self {
            client: bounded_client(),
            relay_url,
        }
    }
}

#[async_trait]
impl DeliveryChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    fn applicable(&self, job: &JobPosting) -> bool {
        job.has_mail_locator()
    }

    async fn send(
        &self,
        profile: &CandidateProfile,
        job: &JobPosting,
        message: &str,
    ) -> ChannelResult {
        let Some(relay) = &self.relay_url else {
            return ChannelResult::fail("no email relay configured");
        };
        let to = job.apply_locator.trim_start_matches("mailto:");
        let payload = json!({
            "to": to,
            "from": profile.email,
            "subject": format!("Application for {} — {}", job.title, profile.full_name),
            "body": message,
        });
        match self.client.post(relay).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                ChannelResult::ok_with(json!({ "relayed_to": to }))
            }
            Ok(resp) => ChannelResult::fail(format!("relay returned {}", resp.status())),
            Err(e) => ChannelResult::fail(format!("relay request failed: {e}")),
        }
    }
}

/// Generic HTTP form submission for any non-mail locator.
pub struct HttpFormChannel {
    client: Client,
}

impl HttpFormChannel {
    pub fn new() -> Self {
        Self {
            client: bounded_client(),
        }
    }
}

impl Default for HttpFormChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryChannel for HttpFormChannel {
    fn name(&self) -> &'static str {
        "http-form"
    }

    fn applicable(&self, job: &JobPosting) -> bool {
        job.has_locator() && !job.has_mail_locator()
    }

    async fn send(
        &self,
        profile: &CandidateProfile,
        job: &JobPosting,
        message: &str,
    ) -> ChannelResult {
        let form = [
            ("name", profile.full_name.as_str()),
            ("email", profile.email.as_str()),
            ("cover_letter", message),
        ];
        match self
            .client
            .post(job.apply_locator.trim())
            .form(&form)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => ChannelResult::ok(),
            Ok(resp) => ChannelResult::fail(format!(
                "application endpoint returned {}",
                resp.status()
            )),
            Err(e) => ChannelResult::fail(format!("form submission failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

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
    fn test_email_channel_applicability() {
        let ch = EmailChannel::new(None);
        assert!(ch.applicable(&posting("mailto:jobs@acme.test")));
        assert!(!ch.applicable(&posting("https://acme.test/apply")));
        assert!(!ch.applicable(&posting("")));
    }

    #[test]
    fn test_form_channel_applicability() {
        let ch = HttpFormChannel::new();
        assert!(ch.applicable(&posting("https://acme.test/apply")));
        assert!(!ch.applicable(&posting("mailto:jobs@acme.test")));
        assert!(!ch.applicable(&posting("  ")));
    }

    #[tokio::test]
    async fn test_email_without_relay_fails_cleanly() {
        let ch = EmailChannel::new(None);
        let profile = CandidateProfile::empty(Uuid::new_v4());
        let result = ch
            .send(&profile, &posting("mailto:jobs@acme.test"), "hello")
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("relay"));
    }
}
