//! Deterministic application message built from profile and posting.

use crate::models::job::JobPosting;
use crate::models::profile::CandidateProfile;

/// Builds the cover message sent with every application. Intentionally a
/// plain template: channels own formatting concerns, this owns content.
pub fn build_message(profile: &CandidateProfile, job: &JobPosting) -> String {
    let mut lines = vec![
        format!("Dear {} hiring team,", job.organization),
        String::new(),
        format!(
            "I am writing to apply for the {} position. My background includes: {}.",
            job.title,
            summary_line(profile)
        ),
    ];
    if let Some(recent) = profile.experience.first() {
        lines.push(format!(
            "Most recently I worked as {} at {}.",
            recent.title, recent.organization
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "Best regards,\n{}\n{}",
        profile.full_name, profile.email
    ));
    lines.join("\n")
}

fn summary_line(profile: &CandidateProfile) -> String {
    if profile.skills.trim().is_empty() {
        "a range of software engineering experience".to_string()
    } else {
        profile.skills.trim().to_string()
    }
}
