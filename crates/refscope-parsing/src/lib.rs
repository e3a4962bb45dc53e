use std::path::Path;

use thiserror::Error;

pub mod config;
pub mod detector;
pub mod extractor;
pub mod section;
pub mod split;
pub mod styles;
pub mod text;

pub use config::{ParsingConfig, ParsingConfigBuilder, StyleWeights};
pub use detector::{detect_style, sample_references, score_styles};
pub use extractor::ReferenceExtractor;
pub use section::split_reference_section;
pub use styles::{ParsedSection, StyleParser, parser_for};
pub use text::normalize_text;
// Re-export domain types from core (canonical definitions live there)
pub use refscope_core::{
    BackendError, CitationStyle, ExtractionResult, ParsedDocument, PdfBackend, Reference,
    UnparsedReference,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Extract references from a PDF file using the given backend for text extraction.
///
/// Pipeline:
/// 1. Extract text from the PDF via `backend`
/// 2. Normalize typography (quotes, dashes, ligatures)
/// 3. Isolate the reference section, or fall back to the document tail
/// 4. Detect the citation style
/// 5. Split the section into chunks and parse each with the style's parser
pub fn extract_references(
    pdf_path: &Path,
    backend: &dyn PdfBackend,
) -> Result<ExtractionResult, ParsingError> {
    ReferenceExtractor::new().extract_references_via_backend(pdf_path, backend)
}
