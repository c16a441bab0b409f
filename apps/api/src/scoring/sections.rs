//! Section extraction — builds the three comparable text blocks (skills,
//! experience, education) for each side of a match.
//!
//! The candidate side is structured, so extraction is concatenation plus
//! synonym expansion. The job side is free text, so sections are derived by
//! keyword and pattern matching. Extraction quality is a tunable, not a
//! contract: callers only rely on "empty in → empty out".

use regex::Regex;
use std::sync::OnceLock;

use crate::models::profile::CandidateProfile;

/// The three text blocks extracted from one side of a match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionTexts {
    pub skills: String,
    pub experience: String,
    pub education: String,
}

/// Synonym expansions for common stacks. Literal tool names in postings
/// rarely match the exact spelling in a profile, so both spellings and a
/// few category words are appended.
const SKILL_SYNONYMS: &[(&str, &str)] = &[
    ("javascript", "js frontend web development"),
    ("typescript", "ts frontend web development"),
    ("react", "reactjs frontend ui component library"),
    ("python", "backend programming scripting"),
    ("node.js", "nodejs backend javascript server runtime"),
    ("django", "python web framework backend"),
    ("postgresql", "postgres sql relational database"),
    ("kubernetes", "k8s container orchestration"),
    ("aws", "cloud infrastructure amazon web services"),
];

/// Technology terms looked for in a job description when deriving its
/// skills section.
const JOB_SKILL_KEYWORDS: &[&str] = &[
    "python",
    "javascript",
    "js",
    "typescript",
    "java",
    "c++",
    "c#",
    "php",
    "ruby",
    "go",
    "rust",
    "swift",
    "kotlin",
    "scala",
    "html",
    "css",
    "sql",
    "react",
    "reactjs",
    "angular",
    "vue",
    "node",
    "nodejs",
    "node.js",
    "django",
    "flask",
    "spring",
    "laravel",
    "express",
    "fastapi",
    "rails",
    "mysql",
    "postgresql",
    "postgres",
    "mongodb",
    "redis",
    "sqlite",
    "elasticsearch",
    "cassandra",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "k8s",
    "terraform",
    "ansible",
    "jenkins",
    "git",
    "github",
    "gitlab",
    "ci/cd",
    "linux",
    "microservices",
    "machine learning",
    "deep learning",
    "tensorflow",
    "pytorch",
    "pandas",
    "numpy",
    "data science",
    "rest api",
    "graphql",
    "frontend",
    "backend",
    "full stack",
    "agile",
    "scrum",
    "tdd",
    "unit testing",
];

fn skills_section_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?is)(?:skills?|technologies|requirements?|qualifications?)[:\-]\s*(.+?)(?:\n\n|\n[A-Z]|$)",
            r"(?is)(?:must have|required)[:\-]?\s*(.+?)(?:\n\n|\n[A-Z]|$)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn experience_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(\d+\+?\s*years?\s*(?:of\s*)?experience)",
            r"(?i)(experience\s+(?:in|with)[^.\n]+)",
            r"(?i)(responsibilities?[:\-]\s*[^.\n]+)",
            r"(?i)(you\s+will[^.\n]+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn education_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(bachelor'?s?\s*(?:degree)?[^.\n]*)",
            r"(?i)(master'?s?\s*(?:degree)?[^.\n]*)",
            r"(?i)(phd[^.\n]*|doctorate[^.\n]*)",
            r"(?i)(degree\s+in[^.\n]+)",
            r"(?i)(education[:\-][^.\n]+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Builds the candidate-side sections from a structured profile.
pub fn candidate_sections(profile: &CandidateProfile) -> SectionTexts {
    let mut skills = profile.skills.trim().to_string();
    let lower = skills.to_lowercase();
    for (term, expansion) in SKILL_SYNONYMS {
        if lower.contains(term) {
            skills.push(' ');
            skills.push_str(expansion);
        }
    }

    let experience = profile
        .experience
        .iter()
        .map(|e| format!("{} {} {}", e.title, e.organization, e.description))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    let education = profile
        .education
        .iter()
        .map(|e| format!("{} {} {}", e.degree, e.field, e.institution))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    SectionTexts {
        skills,
        experience,
        education,
    }
}

/// Derives the job-side sections from an unstructured description.
pub fn job_sections(description: &str) -> SectionTexts {
    SectionTexts {
        skills: extract_job_skills(description),
        experience: collect_matches(description, experience_patterns()),
        education: collect_matches(description, education_patterns()),
    }
}

fn extract_job_skills(description: &str) -> String {
    let lower = description.to_lowercase();
    let mut found: Vec<&str> = JOB_SKILL_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| lower.contains(kw))
        .collect();

    // Dedicated skills/requirements blocks carry terms the keyword list
    // doesn't know about.
    let mut parts: Vec<String> = found.drain(..).map(str::to_string).collect();
    for re in skills_section_patterns() {
        for cap in re.captures_iter(description) {
            if let Some(m) = cap.get(1) {
                parts.push(m.as_str().trim().to_string());
            }
        }
    }
    parts.join(" ")
}

fn collect_matches(text: &str, patterns: &[Regex]) -> String {
    let mut out = Vec::new();
    for re in patterns {
        for cap in re.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                out.push(m.as_str().trim().to_string());
            }
        }
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{EducationEntry, ExperienceEntry};
    use chrono::Utc;
    use uuid::Uuid;

    fn profile(skills: &str) -> CandidateProfile {
        CandidateProfile {
            id: Uuid::new_v4(),
            full_name: "A Candidate".to_string(),
            email: "a@example.test".to_string(),
            skills: skills.to_string(),
            experience: vec![ExperienceEntry {
                title: "Software Developer".to_string(),
                organization: "Tech Corp".to_string(),
                description: "Built web applications with React and Node.js".to_string(),
            }],
            education: vec![EducationEntry {
                degree: "Bachelor of Technology".to_string(),
                field: "Computer Science".to_string(),
                institution: "Tech University".to_string(),
            }],
            preferred_location: "Remote".to_string(),
            min_salary: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_candidate_sections_concatenate_structured_entries() {
        let s = candidate_sections(&profile("Python, SQL"));
        assert!(s.experience.contains("Software Developer"));
        assert!(s.experience.contains("Tech Corp"));
        assert!(s.education.contains("Computer Science"));
    }

    #[test]
    fn test_skill_synonym_expansion() {
        let s = candidate_sections(&profile("JavaScript, React"));
        assert!(s.skills.to_lowercase().contains("frontend"));
        assert!(s.skills.to_lowercase().contains("reactjs"));
    }

    #[test]
    fn test_empty_profile_yields_empty_sections() {
        let p = CandidateProfile::empty(Uuid::new_v4());
        assert_eq!(candidate_sections(&p), SectionTexts::default());
    }

    #[test]
    fn test_job_skills_picked_from_description() {
        let s = job_sections("We need Python and PostgreSQL. Requirements: Django, testing.");
        let skills = s.skills.to_lowercase();
        assert!(skills.contains("python"));
        assert!(skills.contains("postgresql"));
        assert!(skills.contains("django"));
    }

    #[test]
    fn test_job_experience_duration_phrases() {
        let s = job_sections("3+ years of experience with distributed systems required.");
        assert!(s.experience.to_lowercase().contains("3+ years"));
    }

    #[test]
    fn test_job_education_degree_phrases() {
        let s = job_sections("Bachelor's degree in Computer Science or equivalent.");
        assert!(s.education.to_lowercase().contains("bachelor"));
    }

    #[test]
    fn test_empty_description_yields_empty_sections() {
        assert_eq!(job_sections(""), SectionTexts::default());
    }
}
