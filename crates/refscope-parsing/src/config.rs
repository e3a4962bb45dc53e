use regex::Regex;

use refscope_core::CitationStyle;

use crate::styles::apa::ApaWeights;
use crate::styles::chicago::ChicagoWeights;
use crate::styles::harvard::HarvardWeights;
use crate::styles::ieee::IeeeWeights;
use crate::styles::vancouver::VancouverWeights;

/// Scorer weights for every style, one struct per variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleWeights {
    pub apa: ApaWeights,
    pub ieee: IeeeWeights,
    pub vancouver: VancouverWeights,
    pub harvard: HarvardWeights,
    pub chicago: ChicagoWeights,
}

/// Configuration for the reference extraction pipeline.
///
/// `section_header_re` is `None` when the built-in heading vocabulary is used.
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── section.rs ──
    /// Regex to locate the reference section heading (last match wins).
    pub(crate) section_header_re: Option<Regex>,
    /// Fraction of the document skipped when no heading is found (0.0–1.0).
    pub(crate) fallback_fraction: f64,

    // ── detector.rs ──
    /// Number of reference chunks scored during style detection.
    pub(crate) sample_size: usize,
    /// Parse with this style instead of detecting one.
    pub(crate) style: Option<CitationStyle>,

    // ── styles/ ──
    pub(crate) weights: StyleWeights,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            section_header_re: None,
            fallback_fraction: 0.8,
            sample_size: 5,
            style: None,
            weights: StyleWeights::default(),
        }
    }
}

impl ParsingConfig {
    pub fn fallback_fraction(&self) -> f64 {
        self.fallback_fraction
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// The forced citation style, if any.
    pub fn style(&self) -> Option<CitationStyle> {
        self.style
    }

    pub fn weights(&self) -> &StyleWeights {
        &self.weights
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    section_header_re: Option<String>,
    fallback_fraction: Option<f64>,
    sample_size: Option<usize>,
    style: Option<CitationStyle>,
    weights: Option<StyleWeights>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section_header_regex(mut self, pattern: &str) -> Self {
        self.section_header_re = Some(pattern.to_string());
        self
    }

    pub fn fallback_fraction(mut self, fraction: f64) -> Self {
        self.fallback_fraction = Some(fraction);
        self
    }

    pub fn sample_size(mut self, n: usize) -> Self {
        self.sample_size = Some(n);
        self
    }

    /// Skip detection and parse every document in `style`.
    pub fn style(mut self, style: CitationStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn weights(mut self, weights: StyleWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let section_header_re = self
            .section_header_re
            .map(|p| Regex::new(&p))
            .transpose()?;

        Ok(ParsingConfig {
            section_header_re,
            fallback_fraction: self.fallback_fraction.unwrap_or(0.8).clamp(0.0, 1.0),
            sample_size: self.sample_size.unwrap_or(5).max(1),
            style: self.style,
            weights: self.weights.unwrap_or_default(),
        })
    }
}
