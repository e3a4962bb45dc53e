use std::path::Path;

use refscope_core::{BackendError, PdfBackend};

use crate::IngestError;

/// Pure-Rust text extraction through `pdf-extract`.
///
/// No layout information is available, so two-column pages come out in
/// whatever order the content stream draws them. Used as the secondary
/// backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl PdfBackend for PdfExtractBackend {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        pdf_extract::extract_text(path).map_err(|e| BackendError::ExtractionError(e.to_string()))
    }
}

/// Fraction of space characters among all non-newline characters.
///
/// Extractions that lost inter-word separators (broken ligature or font
/// encodings) come out as long runs of glued words and score far below
/// ordinary prose, which sits around 15%.
pub fn space_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut spaces = 0usize;
    for c in text.chars().filter(|&c| c != '\n') {
        total += 1;
        if c == ' ' {
            spaces += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        spaces as f64 / total as f64
    }
}

/// Two backends tried in order.
///
/// The secondary runs when the primary fails, returns blank text, or returns
/// text whose [`space_ratio`] is below `min_space_ratio`.
pub struct FallbackBackend {
    primary: Box<dyn PdfBackend>,
    secondary: Option<Box<dyn PdfBackend>>,
    min_space_ratio: f64,
}

impl FallbackBackend {
    pub fn new(primary: Box<dyn PdfBackend>, secondary: Box<dyn PdfBackend>) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
            min_space_ratio: 0.06,
        }
    }

    /// A chain with no secondary backend.
    pub fn single(primary: Box<dyn PdfBackend>) -> Self {
        Self {
            primary,
            secondary: None,
            min_space_ratio: 0.06,
        }
    }

    pub fn with_min_space_ratio(mut self, ratio: f64) -> Self {
        self.min_space_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn min_space_ratio(&self) -> f64 {
        self.min_space_ratio
    }

    /// Extract text, keeping both failure reasons when neither backend
    /// produces anything.
    pub fn extract(&self, path: &Path) -> Result<String, IngestError> {
        let primary_failure = match self.primary.extract_text(path) {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!(backend = self.primary.name(), "empty text, trying fallback backend");
                PrimaryFailure::Empty
            }
            Ok(text) => {
                let ratio = space_ratio(&text);
                if ratio >= self.min_space_ratio {
                    return Ok(text);
                }
                tracing::warn!(
                    backend = self.primary.name(),
                    ratio,
                    min = self.min_space_ratio,
                    "low space ratio, trying fallback backend"
                );
                PrimaryFailure::LowSpaceRatio(text)
            }
            Err(e) => {
                tracing::warn!(backend = self.primary.name(), error = %e, "extraction failed, trying fallback backend");
                PrimaryFailure::Error(e.to_string())
            }
        };

        let secondary_error = match &self.secondary {
            Some(secondary) => match secondary.extract_text(path) {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => "no text extracted".to_string(),
                Err(e) => e.to_string(),
            },
            None => "no fallback backend configured".to_string(),
        };

        match primary_failure {
            // Degraded text beats no text.
            PrimaryFailure::LowSpaceRatio(text) => {
                tracing::warn!(
                    error = %secondary_error,
                    "fallback backend failed, keeping low-quality text"
                );
                Ok(text)
            }
            PrimaryFailure::Empty => Err(IngestError::AllBackendsFailed {
                primary: "no text extracted".to_string(),
                secondary: secondary_error,
            }),
            PrimaryFailure::Error(primary) => Err(IngestError::AllBackendsFailed {
                primary,
                secondary: secondary_error,
            }),
        }
    }
}

enum PrimaryFailure {
    Empty,
    LowSpaceRatio(String),
    Error(String),
}

impl PdfBackend for FallbackBackend {
    fn name(&self) -> &str {
        "fallback"
    }

    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        self.extract(path)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<&'static str, &'static str>);

    impl PdfBackend for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
            self.0
                .map(str::to_string)
                .map_err(|e| BackendError::ExtractionError(e.to_string()))
        }
    }

    const PROSE: &str = "Smith, J. (2020). Machine learning in healthcare. Nature Medicine.";
    const GLUED: &str = "Smith,J.(2020).Machinelearninginhealthcare.NatureMedicine,26(3),309-316.";

    fn chain(primary: Result<&'static str, &'static str>, secondary: Result<&'static str, &'static str>) -> FallbackBackend {
        FallbackBackend::new(Box::new(Fixed(primary)), Box::new(Fixed(secondary)))
    }

    #[test]
    fn test_space_ratio() {
        assert_eq!(space_ratio(""), 0.0);
        assert_eq!(space_ratio("a b\n"), 1.0 / 3.0);
        assert!(space_ratio(PROSE) > 0.06);
        assert!(space_ratio(GLUED) < 0.06);
    }

    #[test]
    fn test_primary_used_when_good() {
        let text = chain(Ok(PROSE), Ok("secondary")).extract(Path::new("x.pdf")).unwrap();
        assert_eq!(text, PROSE);
    }

    #[test]
    fn test_fallback_on_empty_and_error() {
        let text = chain(Ok("  \n"), Ok(PROSE)).extract(Path::new("x.pdf")).unwrap();
        assert_eq!(text, PROSE);
        let text = chain(Err("boom"), Ok(PROSE)).extract(Path::new("x.pdf")).unwrap();
        assert_eq!(text, PROSE);
    }

    #[test]
    fn test_fallback_on_low_space_ratio() {
        let text = chain(Ok(GLUED), Ok(PROSE)).extract(Path::new("x.pdf")).unwrap();
        assert_eq!(text, PROSE);
        // Secondary failing keeps the degraded primary text.
        let text = chain(Ok(GLUED), Err("nope")).extract(Path::new("x.pdf")).unwrap();
        assert_eq!(text, GLUED);
    }

    #[test]
    fn test_both_failing_is_fatal() {
        let err = chain(Err("bad xref"), Ok("")).extract(Path::new("x.pdf")).unwrap_err();
        match err {
            IngestError::AllBackendsFailed { primary, secondary } => {
                assert!(primary.contains("bad xref"));
                assert_eq!(secondary, "no text extracted");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_backend_chain() {
        let backend = FallbackBackend::single(Box::new(Fixed(Ok(GLUED))));
        assert_eq!(backend.extract(Path::new("x.pdf")).unwrap(), GLUED);

        let backend = FallbackBackend::single(Box::new(Fixed(Err("boom"))));
        let err = backend.extract_text(Path::new("x.pdf")).unwrap_err();
        assert!(matches!(err, BackendError::ExtractionError(_)));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let text = chain(Ok(GLUED), Ok(PROSE))
            .with_min_space_ratio(0.0)
            .extract(Path::new("x.pdf"))
            .unwrap();
        assert_eq!(text, GLUED);
    }
}
