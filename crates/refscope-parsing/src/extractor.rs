use std::path::Path;

use refscope_core::{CitationStyle, ExtractionResult, ParsedDocument, PdfBackend};

use crate::config::ParsingConfig;
use crate::styles::{ParsedSection, parser_for};
use crate::{ParsingError, detector, section, text};

/// A configurable reference extraction pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`ReferenceExtractor::with_config`] to force a style or tune thresholds.
#[derive(Debug, Clone, Default)]
pub struct ReferenceExtractor {
    config: ParsingConfig,
}

impl ReferenceExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Normalize document text and isolate the reference section (steps 1-2).
    pub fn parse_document(&self, raw_text: &str) -> ParsedDocument {
        let full_text = text::normalize_text(raw_text);
        let (body_text, reference_section) =
            section::split_reference_section_with_config(&full_text, &self.config);
        ParsedDocument {
            full_text,
            reference_section,
            body_text,
        }
    }

    /// The text to parse: the isolated section, or the document tail when
    /// no heading was found.
    pub fn reference_region<'a>(&self, doc: &'a ParsedDocument) -> &'a str {
        if !doc.reference_section.trim().is_empty() {
            return &doc.reference_section;
        }
        let region = section::fallback_region(&doc.full_text, self.config.fallback_fraction);
        tracing::warn!(
            fraction = self.config.fallback_fraction,
            chars = region.len(),
            "no reference section found, using document tail"
        );
        region
    }

    /// Per-style scores for `section`, in priority order.
    pub fn score_styles(&self, section: &str) -> Vec<(CitationStyle, f64)> {
        detector::score_styles_with_config(section, &self.config)
    }

    /// The forced style, or the detected one (step 3).
    pub fn detect_style(&self, section: &str) -> CitationStyle {
        match self.config.style {
            Some(style) => style,
            None => detector::detect_style_with_config(section, &self.config),
        }
    }

    /// Split and parse a section in `style` (steps 4-5).
    pub fn parse_section(&self, section: &str, style: CitationStyle) -> ParsedSection {
        parser_for(style, &self.config.weights).parse_all(section)
    }

    /// Run the full pipeline on a PDF file, extracting text with `backend`.
    pub fn extract_references_via_backend(
        &self,
        pdf_path: &Path,
        backend: &dyn PdfBackend,
    ) -> Result<ExtractionResult, ParsingError> {
        let raw_text = backend.extract_text(pdf_path)?;
        Ok(self.extract_references_from_text(&raw_text, &pdf_path.display().to_string()))
    }

    /// Run the pipeline on already-extracted text.
    ///
    /// Never fails: a document without a recognizable reference list yields an
    /// empty result, and chunks no pattern could parse land in `unparsed`.
    pub fn extract_references_from_text(&self, raw_text: &str, source_pdf: &str) -> ExtractionResult {
        let doc = self.parse_document(raw_text);
        self.extract_from_document(&doc, source_pdf)
    }

    /// Run detection and parsing on an already isolated document.
    pub fn extract_from_document(&self, doc: &ParsedDocument, source_pdf: &str) -> ExtractionResult {
        let region = self.reference_region(doc);
        let style = self.detect_style(region);
        let parsed = self.parse_section(region, style);

        tracing::info!(
            source = source_pdf,
            style = %style,
            references = parsed.references.len(),
            unparsed = parsed.unparsed.len(),
            "extracted references"
        );

        ExtractionResult {
            source_pdf: source_pdf.to_string(),
            references: parsed.references,
            unparsed: parsed.unparsed,
            model_used: style.model_tag(),
        }
    }
}
