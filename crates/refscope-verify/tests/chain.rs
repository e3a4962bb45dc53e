use std::sync::Arc;

use refscope_core::{ExtractionResult, Reference};
use refscope_verify::sources::mock::{MockResponse, MockSource};
use refscope_verify::sources::{Candidate, VerificationSource};
use refscope_verify::{VerificationStatus, Verifier, VerifyConfig};

/// Lets a test keep a handle on a mock after handing it to the verifier.
struct Shared(Arc<MockSource>);

impl VerificationSource for Shared {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn search<'a>(
        &'a self,
        reference: &'a Reference,
        client: &'a reqwest::Client,
        timeout: std::time::Duration,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<Candidate>, String>> + Send + 'a>>
    {
        self.0.search(reference, client, timeout)
    }
}

fn reference(id: &str, title: &str) -> Reference {
    Reference {
        id: id.into(),
        authors: vec!["Smith, J.".into()],
        title: title.into(),
        year: Some(2020),
        journal: None,
        volume: None,
        pages: None,
        doi: None,
        raw_text: title.into(),
    }
}

fn verifier(sources: Vec<Arc<MockSource>>) -> Verifier {
    let boxed = sources
        .into_iter()
        .map(|s| Box::new(Shared(s)) as Box<dyn VerificationSource>)
        .collect();
    Verifier::with_sources(&VerifyConfig::default(), boxed).unwrap()
}

const TITLE: &str = "Machine learning in healthcare";

#[tokio::test]
async fn test_first_confident_source_stops_chain() {
    let first = Arc::new(MockSource::new("crossref", MockResponse::hit(TITLE, Some(2020))));
    let second = Arc::new(MockSource::new("semantic_scholar", MockResponse::hit(TITLE, Some(2020))));
    let v = verifier(vec![first.clone(), second.clone()]);

    let result = v.verify_reference(&reference("ref_01", TITLE)).await;
    assert_eq!(result.status, VerificationStatus::Verified);
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.source.as_deref(), Some("crossref"));
    assert_eq!(result.canonical_title.as_deref(), Some(TITLE));
    assert_eq!(first.call_count(), 1);
    assert_eq!(second.call_count(), 0, "chain should stop at the first confident hit");
}

#[tokio::test]
async fn test_error_falls_through_to_next_source() {
    let first = Arc::new(MockSource::new("crossref", MockResponse::Error("HTTP 503".into())));
    let second = Arc::new(MockSource::new("semantic_scholar", MockResponse::hit(TITLE, Some(2020))));
    let v = verifier(vec![first.clone(), second.clone()]);

    let result = v.verify_reference(&reference("ref_01", TITLE)).await;
    assert_eq!(result.source.as_deref(), Some("semantic_scholar"));
    assert_eq!(result.status, VerificationStatus::Verified);
    assert_eq!(second.call_count(), 1);
}

#[tokio::test]
async fn test_best_below_threshold_is_kept() {
    // Both sources return a partial match; the better one wins.
    let weak = MockResponse::hit("Healthcare", None);
    let better = MockResponse::hit("Machine learning", Some(2020));
    let first = Arc::new(MockSource::new("crossref", weak));
    let second = Arc::new(MockSource::new("semantic_scholar", better));
    let v = verifier(vec![first, second]);

    let result = v.verify_reference(&reference("ref_01", TITLE)).await;
    assert_eq!(result.source.as_deref(), Some("semantic_scholar"));
    assert!(result.confidence < 0.8, "confidence {}", result.confidence);
    assert!(result.confidence >= 0.5, "confidence {}", result.confidence);
    assert_eq!(result.status, VerificationStatus::Ambiguous);
}

#[tokio::test]
async fn test_nothing_found_yields_not_found_record() {
    let first = Arc::new(MockSource::new("crossref", MockResponse::empty()));
    let second = Arc::new(MockSource::new(
        "semantic_scholar",
        MockResponse::hit("Topology", Some(2022)),
    ));
    let v = verifier(vec![first, second]);

    let result = v.verify_reference(&reference("ref_07", TITLE)).await;
    assert_eq!(result.ref_id, "ref_07");
    assert_eq!(result.status, VerificationStatus::NotFound);
    assert_eq!(result.confidence, 0.0);
    assert!(result.source.is_none());
    assert_eq!(result.notes.as_deref(), Some("Not found in crossref, semantic_scholar"));
}

#[tokio::test]
async fn test_doi_match_is_conclusive() {
    let mut r = reference("ref_01", TITLE);
    r.doi = Some("10.1038/test".into());
    let hit = MockResponse::Candidates(vec![Candidate {
        title: "Completely different".into(),
        doi: Some("10.1038/TEST".into()),
        authors: vec!["Jane Smith".into()],
        ..Candidate::default()
    }]);
    let v = verifier(vec![Arc::new(MockSource::new("crossref", hit))]);

    let result = v.verify_reference(&r).await;
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.canonical_doi.as_deref(), Some("10.1038/TEST"));
    assert_eq!(result.canonical_authors, Some(vec!["Jane Smith".to_string()]));
}

#[tokio::test]
async fn test_verify_all_counts_and_progress() {
    let source = Arc::new(MockSource::with_sequence(
        "crossref",
        vec![
            MockResponse::hit(TITLE, Some(2020)),
            MockResponse::Error("timeout".into()),
            MockResponse::hit("Deep learning for NLP tasks", None),
        ],
    ));
    let v = verifier(vec![source.clone()]);

    let extraction = ExtractionResult {
        source_pdf: "paper.pdf".into(),
        references: vec![
            reference("ref_01", TITLE),
            reference("ref_02", "Graph neural networks"),
            reference("ref_03", "Deep learning for NLP"),
        ],
        unparsed: Vec::new(),
        model_used: "regex:apa".into(),
    };

    let mut seen = Vec::new();
    let result = v
        .verify_all(&extraction, |done, total, r| seen.push((done, total, r.ref_id.clone())))
        .await;

    assert_eq!(source.call_count(), 3);
    assert_eq!(
        seen,
        vec![
            (1, 3, "ref_01".to_string()),
            (2, 3, "ref_02".to_string()),
            (3, 3, "ref_03".to_string()),
        ]
    );
    let ids: Vec<_> = result.references.iter().map(|r| r.ref_id.as_str()).collect();
    assert_eq!(ids, vec!["ref_01", "ref_02", "ref_03"]);
    assert_eq!(result.stats.total, 3);
    assert_eq!(result.stats.verified, 2);
    assert_eq!(result.stats.not_found, 1);
    assert_eq!(result.references[1].status, VerificationStatus::NotFound);
}

#[tokio::test]
async fn test_verification_result_json_shape() {
    let v = verifier(vec![Arc::new(MockSource::new("crossref", MockResponse::empty()))]);
    let extraction = ExtractionResult {
        source_pdf: "paper.pdf".into(),
        references: vec![reference("ref_01", TITLE)],
        unparsed: Vec::new(),
        model_used: "regex:apa".into(),
    };
    let result = v.verify_all(&extraction, |_, _, _| {}).await;
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["stats"]["not_found"], 1);
    assert_eq!(value["references"][0]["status"], "not_found");
    assert_eq!(value["references"][0]["ref_id"], "ref_01");
}
