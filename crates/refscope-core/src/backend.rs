use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors turn a PDF into linearized plain text, one page after another
/// in page order. Normalization, section isolation and reference parsing
/// happen downstream in `refscope_parsing::ReferenceExtractor`.
pub trait PdfBackend: Send + Sync {
    /// Short backend name used in log messages.
    fn name(&self) -> &str;

    /// Extract the full text content of a PDF file.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}
