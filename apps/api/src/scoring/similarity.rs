//! Section similarity — pluggable, trait-based semantic closeness in [0,1].
//!
//! Default when an embeddings endpoint is configured: `EmbeddingSimilarity`
//! (remote vectors, cosine). Otherwise `LexicalSimilarity` (token overlap).
//! Bag-of-words cosine is the last-resort path, used when an embedding call
//! fails mid-flight. All backends honor the same contract: bounded [0,1],
//! exactly 0 when either side is empty, monotonically increasing with
//! overlap.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::warn;

/// Curated technical terms whose exact presence on both sides earns the
/// skills-section bonus. Generic embeddings underweight literal tool and
/// language matches; this corrects for it.
const IMPORTANT_KEYWORDS: &[&str] = &[
    "python",
    "javascript",
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
    "angular",
    "vue",
    "django",
    "flask",
    "spring",
    "laravel",
    "rails",
    "express",
    "fastapi",
    "nodejs",
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "elasticsearch",
    "cassandra",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "jenkins",
    "github",
    "gitlab",
    "git",
    "linux",
    "unix",
    "bash",
    "terraform",
    "ansible",
];

/// The similarity seam. Carried in the scorer as `Arc<dyn SectionSimilarity>`
/// so backends swap at startup without touching scoring logic.
#[async_trait]
pub trait SectionSimilarity: Send + Sync {
    /// Bounded [0,1]; 0 when either side is empty. Never errors — backends
    /// degrade to a lexical result instead.
    async fn similarity(&self, a: &str, b: &str) -> f64;

    /// Short backend label recorded in score rationales.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// Lexical backends (pure functions, no I/O)
// ────────────────────────────────────────────────────────────────────────────

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of token sets.
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    let (ta, tb) = (tokens(a), tokens(b));
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    intersection / union
}

/// Term-frequency cosine. Last-resort backend.
pub fn cosine_bow(a: &str, b: &str) -> f64 {
    let count = |text: &str| {
        let mut m: HashMap<String, f64> = HashMap::new();
        for t in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
            .filter(|t| !t.is_empty())
        {
            *m.entry(t.to_string()).or_insert(0.0) += 1.0;
        }
        m
    };
    let (va, vb) = (count(a), count(b));
    if va.is_empty() || vb.is_empty() {
        return 0.0;
    }
    let dot: f64 = va
        .iter()
        .filter_map(|(t, x)| vb.get(t).map(|y| x * y))
        .sum();
    let norm = |v: &HashMap<String, f64>| v.values().map(|x| x * x).sum::<f64>().sqrt();
    let denom = norm(&va) * norm(&vb);
    if denom <= f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}

/// Bonus for exact curated-keyword matches between two skills sections:
/// +0.05 per matched term, capped at +0.2. Applied on top of the base
/// similarity (the sum is clamped to 1.0 by the caller).
pub fn keyword_overlap_bonus(a: &str, b: &str) -> f64 {
    let (ta, tb) = (tokens(a), tokens(b));
    let matched = IMPORTANT_KEYWORDS
        .iter()
        .filter(|kw| ta.contains(**kw) && tb.contains(**kw))
        .count();
    (matched as f64 * 0.05).min(0.2)
}

/// Token-overlap backend used when no embedding endpoint is configured.
pub struct LexicalSimilarity;

#[async_trait]
impl SectionSimilarity for LexicalSimilarity {
    async fn similarity(&self, a: &str, b: &str) -> f64 {
        token_jaccard(a, b)
    }

    fn backend(&self) -> &'static str {
        "lexical"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Embedding backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f64>,
}

/// Remote-embedding backend: posts both texts to an embeddings endpoint and
/// takes the cosine of the returned vectors. Any transport or shape error
/// degrades to bag-of-words cosine instead of propagating.
pub struct EmbeddingSimilarity {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl EmbeddingSimilarity {
    pub fn new(url: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url,
            api_key,
        }
    }

    async fn embed_pair(&self, a: &str, b: &str) -> Result<(Vec<f64>, Vec<f64>), String> {
        let mut req = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "input": [a, b] }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("embedding endpoint returned {}", resp.status()));
        }
        let body: EmbeddingResponse = resp.json().await.map_err(|e| e.to_string())?;
        let mut it = body.data.into_iter();
        match (it.next(), it.next()) {
            (Some(x), Some(y)) => Ok((x.embedding, y.embedding)),
            _ => Err("embedding endpoint returned fewer than two vectors".to_string()),
        }
    }
}

fn cosine_vectors(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na <= f64::EPSILON || nb <= f64::EPSILON {
        0.0
    } else {
        (dot / (na * nb)).clamp(0.0, 1.0)
    }
}

#[async_trait]
impl SectionSimilarity for EmbeddingSimilarity {
    async fn similarity(&self, a: &str, b: &str) -> f64 {
        if a.trim().is_empty() || b.trim().is_empty() {
            return 0.0;
        }
        match self.embed_pair(a, b).await {
            Ok((va, vb)) => cosine_vectors(&va, &vb),
            Err(e) => {
                warn!("Embedding call failed, using bag-of-words fallback: {e}");
                cosine_bow(a, b)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "embedding"
    }
}
