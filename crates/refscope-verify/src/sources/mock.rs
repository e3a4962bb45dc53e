//! Mock verification source for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use refscope_core::Reference;

use super::{Candidate, VerificationSource};

/// A configurable mock response for [`MockSource`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return these candidates.
    Candidates(Vec<Candidate>),
    /// Simulate a request failure.
    Error(String),
}

impl MockResponse {
    /// A single candidate with just a title and year.
    pub fn hit(title: &str, year: Option<i32>) -> Self {
        MockResponse::Candidates(vec![Candidate {
            title: title.to_string(),
            year,
            ..Candidate::default()
        }])
    }

    pub fn empty() -> Self {
        MockResponse::Candidates(Vec::new())
    }
}

/// A hand-rolled mock implementing [`VerificationSource`] for tests.
///
/// Returns a fixed response, or a sequence of responses (one per call,
/// repeating the last), and counts calls.
pub struct MockSource {
    name: &'static str,
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    call_count: AtomicUsize,
}

impl MockSource {
    /// Create a mock that always returns `response`.
    pub fn new(name: &'static str, response: MockResponse) -> Self {
        Self {
            name,
            responses: Mutex::new(Vec::new()),
            fallback: response,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(name: &'static str, mut responses: Vec<MockResponse>) -> Self {
        // Reverse so the next response can be popped off the end.
        responses.reverse();
        let fallback = responses.first().cloned().unwrap_or_else(MockResponse::empty);
        Self {
            name,
            responses: Mutex::new(responses),
            fallback,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `search()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> MockResponse {
        let popped = match self.responses.lock() {
            Ok(mut seq) => seq.pop(),
            Err(poisoned) => poisoned.into_inner().pop(),
        };
        popped.unwrap_or_else(|| self.fallback.clone())
    }
}

impl VerificationSource for MockSource {
    fn name(&self) -> &str {
        self.name
    }

    fn search<'a>(
        &'a self,
        _reference: &'a Reference,
        _client: &'a reqwest::Client,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candidate>, String>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let response = self.next_response();

        Box::pin(async move {
            match response {
                MockResponse::Candidates(candidates) => Ok(candidates),
                MockResponse::Error(msg) => Err(msg),
            }
        })
    }
}
