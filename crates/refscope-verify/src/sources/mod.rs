pub mod crossref;
pub mod mock;
pub mod semantic_scholar;

pub use crossref::CrossRef;
pub use semantic_scholar::SemanticScholar;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use refscope_core::Reference;

/// One search hit returned by a scholarly database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub abstract_text: Option<String>,
}

/// A scholarly database searched for candidates matching a reference.
///
/// Only the title, first author and year of a reference are sent out.
pub trait VerificationSource: Send + Sync {
    /// Short identifier recorded in [`crate::VerifiedReference::source`].
    fn name(&self) -> &str;

    /// Search for candidates. Errors are reported as strings and downgraded
    /// to "no match" by the caller.
    fn search<'a>(
        &'a self,
        reference: &'a Reference,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candidate>, String>> + Send + 'a>>;
}

/// User-Agent sent with every request.
pub(crate) const USER_AGENT: &str = concat!("refscope/", env!("CARGO_PKG_VERSION"));

pub(crate) fn check_status(resp: &reqwest::Response) -> Result<(), String> {
    let status = resp.status();
    if status.as_u16() == 429 {
        return Err("Rate limited (429)".into());
    }
    if !status.is_success() {
        return Err(format!("HTTP {}", status));
    }
    Ok(())
}
