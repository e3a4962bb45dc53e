use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod confidence;
pub mod sources;
pub mod verifier;

// Re-export for convenience
pub use confidence::{candidate_confidence, status_for};
pub use sources::{Candidate, CrossRef, SemanticScholar, VerificationSource};
pub use verifier::Verifier;

/// Outcome of verifying a single reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Ambiguous,
    NotFound,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Ambiguous => "ambiguous",
            VerificationStatus::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification metadata for one reference, keyed by [`refscope_core::Reference::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedReference {
    pub ref_id: String,
    pub status: VerificationStatus,
    /// Match confidence in `[0, 1]`, rounded to three decimals.
    pub confidence: f64,
    /// Which source produced the match (`crossref`, `semantic_scholar`).
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub canonical_title: Option<String>,
    #[serde(default)]
    pub canonical_doi: Option<String>,
    #[serde(default)]
    pub canonical_authors: Option<Vec<String>>,
    #[serde(default)]
    pub canonical_year: Option<i32>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl VerifiedReference {
    /// A `NotFound` record with zero confidence.
    pub fn not_found(ref_id: &str, notes: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.to_string(),
            status: VerificationStatus::NotFound,
            confidence: 0.0,
            source: None,
            canonical_title: None,
            canonical_doi: None,
            canonical_authors: None,
            canonical_year: None,
            abstract_text: None,
            notes: Some(notes.into()),
        }
    }
}

/// Per-status counts over one verification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationStats {
    pub total: usize,
    pub verified: usize,
    pub ambiguous: usize,
    pub not_found: usize,
}

impl VerificationStats {
    pub fn from_references(references: &[VerifiedReference]) -> Self {
        let mut stats = Self {
            total: references.len(),
            ..Self::default()
        };
        for r in references {
            match r.status {
                VerificationStatus::Verified => stats.verified += 1,
                VerificationStatus::Ambiguous => stats.ambiguous += 1,
                VerificationStatus::NotFound => stats.not_found += 1,
            }
        }
        stats
    }
}

/// Result of verifying every reference of an [`refscope_core::ExtractionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub references: Vec<VerifiedReference>,
    pub stats: VerificationStats,
}

/// Settings for a verification run.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Contact address sent to CrossRef's polite pool.
    pub crossref_mailto: Option<String>,
    pub s2_api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// The chain stops at the first result at or above this confidence.
    pub confidence_threshold: f64,
    pub use_semantic_scholar: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            crossref_mailto: None,
            s2_api_key: None,
            timeout: Duration::from_secs(30),
            confidence_threshold: 0.8,
            use_semantic_scholar: true,
        }
    }
}

impl VerifyConfig {
    /// Apply the `[verify]` table of a config file on top of these settings.
    pub fn merge_file(mut self, section: &refscope_core::config_file::VerifySection) -> Self {
        if let Some(ref mailto) = section.crossref_mailto {
            self.crossref_mailto = Some(mailto.clone());
        }
        if let Some(ref key) = section.s2_api_key {
            self.s2_api_key = Some(key.clone());
        }
        if let Some(secs) = section.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = section.confidence_threshold {
            self.confidence_threshold = threshold.clamp(0.0, 1.0);
        }
        if let Some(use_s2) = section.use_semantic_scholar {
            self.use_semantic_scholar = use_s2;
        }
        self
    }
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("verification client error: {0}")]
    Client(String),
}
