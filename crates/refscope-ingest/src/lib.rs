use std::path::{Path, PathBuf};

use thiserror::Error;

use refscope_core::config_file::PdfSection;
use refscope_parsing::ReferenceExtractor;

pub mod fallback;

// Re-export domain types for convenience
pub use fallback::{FallbackBackend, PdfExtractBackend, space_ratio};
pub use refscope_core::{ExtractionResult, ParsedDocument, Reference};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("PDF not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("expected a .pdf file, got: {}", .0.display())]
    NotPdf(PathBuf),
    #[error("all text extraction backends failed (primary: {primary}; fallback: {secondary})")]
    AllBackendsFailed { primary: String, secondary: String },
    #[error("PDF extraction error: {0}")]
    Parsing(#[from] refscope_parsing::ParsingError),
}

/// The default extraction chain: MuPDF word positions first, `pdf-extract`
/// as the fallback.
pub fn default_backend() -> FallbackBackend {
    backend_from_config(&PdfSection::default())
}

/// Build the extraction chain from the `[pdf]` config table.
#[cfg(feature = "pdf")]
pub fn backend_from_config(pdf: &PdfSection) -> FallbackBackend {
    let mut mupdf = refscope_pdf_mupdf::MupdfBackend::new();
    if let Some(ratio) = pdf.header_ratio {
        mupdf = mupdf.with_header_exclusion(ratio);
    }
    if let Some(ratio) = pdf.footer_ratio {
        mupdf = mupdf.with_footer_exclusion(ratio);
    }
    if let Some(width) = pdf.column_bin_width {
        mupdf = mupdf.with_column_bin_width(width);
    }
    if let Some(density) = pdf.column_gap_density {
        mupdf = mupdf.with_column_gap_density(density);
    }

    let chain = FallbackBackend::new(Box::new(mupdf), Box::new(PdfExtractBackend));
    match pdf.min_space_ratio {
        Some(ratio) => chain.with_min_space_ratio(ratio),
        None => chain,
    }
}

/// Build the extraction chain from the `[pdf]` config table.
///
/// Without the `pdf` feature only `pdf-extract` is available.
#[cfg(not(feature = "pdf"))]
pub fn backend_from_config(pdf: &PdfSection) -> FallbackBackend {
    let chain = FallbackBackend::single(Box::new(PdfExtractBackend));
    match pdf.min_space_ratio {
        Some(ratio) => chain.with_min_space_ratio(ratio),
        None => chain,
    }
}

fn check_pdf_path(path: &Path) -> Result<(), IngestError> {
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(IngestError::NotPdf(path.to_path_buf()));
    }
    Ok(())
}

/// Extract, normalize and split a PDF into body text and reference section.
pub fn parse_pdf(path: &Path) -> Result<ParsedDocument, IngestError> {
    parse_pdf_with(path, &default_backend(), &ReferenceExtractor::new())
}

/// [`parse_pdf`] with an explicit backend chain and extractor configuration.
pub fn parse_pdf_with(
    path: &Path,
    backend: &FallbackBackend,
    extractor: &ReferenceExtractor,
) -> Result<ParsedDocument, IngestError> {
    check_pdf_path(path)?;
    let raw_text = backend.extract(path)?;
    let doc = extractor.parse_document(&raw_text);

    tracing::info!(
        path = %path.display(),
        total_chars = doc.full_text.len(),
        body_chars = doc.body_text.len(),
        reference_chars = doc.reference_section.len(),
        "parsed PDF"
    );
    Ok(doc)
}

/// Extract structured references from a PDF with the default pipeline.
pub fn extract_references(path: &Path) -> Result<ExtractionResult, IngestError> {
    extract_references_with(path, &default_backend(), &ReferenceExtractor::new())
}

/// [`extract_references`] with an explicit backend chain and extractor.
pub fn extract_references_with(
    path: &Path,
    backend: &FallbackBackend,
    extractor: &ReferenceExtractor,
) -> Result<ExtractionResult, IngestError> {
    let doc = parse_pdf_with(path, backend, extractor)?;
    Ok(extractor.extract_from_document(&doc, &path.display().to_string()))
}
