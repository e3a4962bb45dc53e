use std::time::Duration;

use refscope_core::{ExtractionResult, Reference};

use crate::confidence::{best_candidate, round_confidence, status_for};
use crate::sources::{CrossRef, SemanticScholar, VerificationSource};
use crate::{VerificationResult, VerificationStats, VerifiedReference, VerifyConfig, VerifyError};

/// Verifies references against a chain of sources, tried in order.
pub struct Verifier {
    client: reqwest::Client,
    sources: Vec<Box<dyn VerificationSource>>,
    timeout: Duration,
    confidence_threshold: f64,
}

impl Verifier {
    /// CrossRef, then Semantic Scholar unless disabled.
    pub fn new(config: &VerifyConfig) -> Result<Self, VerifyError> {
        let mut sources: Vec<Box<dyn VerificationSource>> = vec![Box::new(CrossRef {
            mailto: config.crossref_mailto.clone(),
        })];
        if config.use_semantic_scholar {
            sources.push(Box::new(SemanticScholar {
                api_key: config.s2_api_key.clone(),
            }));
        }
        Self::with_sources(config, sources)
    }

    /// A verifier over an explicit source chain.
    pub fn with_sources(
        config: &VerifyConfig,
        sources: Vec<Box<dyn VerificationSource>>,
    ) -> Result<Self, VerifyError> {
        if sources.is_empty() {
            return Err(VerifyError::Client("no verification sources configured".into()));
        }
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            sources,
            timeout: config.timeout,
            confidence_threshold: config.confidence_threshold,
        })
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Query one source and score its candidates.
    ///
    /// Source errors are logged and treated as "no match".
    pub async fn verify_with(
        &self,
        source: &dyn VerificationSource,
        reference: &Reference,
    ) -> Option<VerifiedReference> {
        let candidates = match source.search(reference, &self.client, self.timeout).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(
                    source = source.name(),
                    ref_id = %reference.id,
                    error = %e,
                    "verification source error"
                );
                return None;
            }
        };

        let (best, confidence) = best_candidate(reference, &candidates)?;
        let confidence = round_confidence(confidence);
        Some(VerifiedReference {
            ref_id: reference.id.clone(),
            status: status_for(confidence),
            confidence,
            source: Some(source.name().to_string()),
            canonical_title: Some(best.title.clone()).filter(|t| !t.is_empty()),
            canonical_doi: best.doi.clone(),
            canonical_authors: Some(best.authors.clone()).filter(|a| !a.is_empty()),
            canonical_year: best.year,
            abstract_text: best.abstract_text.clone(),
            notes: None,
        })
    }

    /// Run the source chain for one reference.
    ///
    /// Stops at the first result reaching the confidence threshold; otherwise
    /// returns the most confident result seen, or a `NotFound` record.
    pub async fn verify_reference(&self, reference: &Reference) -> VerifiedReference {
        let mut best: Option<VerifiedReference> = None;

        for source in &self.sources {
            let Some(result) = self.verify_with(source.as_ref(), reference).await else {
                continue;
            };
            if result.confidence >= self.confidence_threshold {
                tracing::info!(
                    ref_id = %reference.id,
                    source = source.name(),
                    confidence = result.confidence,
                    "verified"
                );
                return result;
            }
            if best.as_ref().is_none_or(|b| result.confidence > b.confidence) {
                best = Some(result);
            }
        }

        match best {
            Some(best) => {
                tracing::info!(
                    ref_id = %reference.id,
                    confidence = best.confidence,
                    status = %best.status,
                    "best match below threshold"
                );
                best
            }
            None => {
                tracing::warn!(ref_id = %reference.id, "not found in any source");
                VerifiedReference::not_found(
                    &reference.id,
                    format!("Not found in {}", self.source_names().join(", ")),
                )
            }
        }
    }

    /// Verify every reference of an extraction, one at a time.
    ///
    /// `progress` is called after each reference with `(done, total, result)`.
    pub async fn verify_all<F>(&self, extraction: &ExtractionResult, mut progress: F) -> VerificationResult
    where
        F: FnMut(usize, usize, &VerifiedReference),
    {
        let total = extraction.references.len();
        let mut references = Vec::with_capacity(total);

        for (i, reference) in extraction.references.iter().enumerate() {
            let title: String = reference.title.chars().take(60).collect();
            tracing::debug!(index = i + 1, total, title = %title, "verifying reference");
            let result = self.verify_reference(reference).await;
            progress(i + 1, total, &result);
            references.push(result);
        }

        let stats = VerificationStats::from_references(&references);
        tracing::info!(
            total = stats.total,
            verified = stats.verified,
            ambiguous = stats.ambiguous,
            not_found = stats.not_found,
            "verification complete"
        );
        VerificationResult { references, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain() {
        let verifier = Verifier::new(&VerifyConfig::default()).unwrap();
        assert_eq!(verifier.source_names(), vec!["crossref", "semantic_scholar"]);

        let config = VerifyConfig {
            use_semantic_scholar: false,
            ..VerifyConfig::default()
        };
        let verifier = Verifier::new(&config).unwrap();
        assert_eq!(verifier.source_names(), vec!["crossref"]);
    }

    #[test]
    fn test_empty_chain_is_an_error() {
        let err = Verifier::with_sources(&VerifyConfig::default(), Vec::new())
            .err()
            .unwrap();
        assert!(matches!(err, VerifyError::Client(_)));
    }
}
