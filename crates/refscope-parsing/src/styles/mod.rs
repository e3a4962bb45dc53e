//! Per-style reference scorers, splitters and parsers.
//!
//! Every style follows the same two-tier strategy: one strict pattern for the
//! canonical field order, then a looser anchor-based decomposition. A parser
//! never fails on malformed input; it returns `None` and the pipeline records
//! the chunk as unparsed.

use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::{CitationStyle, Reference, UnparsedReference, extract_doi, normalize_doi, reference_id};

use crate::config::StyleWeights;
use crate::split::default_split;

pub mod apa;
pub mod chicago;
pub mod harvard;
pub mod ieee;
pub mod vancouver;

pub use apa::ApaParser;
pub use chicago::ChicagoParser;
pub use harvard::HarvardParser;
pub use ieee::IeeeParser;
pub use vancouver::VancouverParser;

/// References parsed from one section, plus the chunks that produced none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSection {
    pub references: Vec<Reference>,
    pub unparsed: Vec<UnparsedReference>,
}

/// A citation-style implementation.
pub trait StyleParser: Send + Sync {
    fn style(&self) -> CitationStyle;

    /// How well one raw reference matches this style, in `[0, 1]`.
    fn score_match(&self, raw: &str) -> f64;

    /// Parse one raw reference. `None` means no pattern of this style could
    /// decompose the text.
    fn parse_reference(&self, raw: &str, id: &str) -> Option<Reference>;

    /// Split a reference section into raw single-reference strings.
    fn split_references(&self, section: &str) -> Vec<String> {
        default_split(section)
    }

    /// Split and parse a whole section. The n-th chunk gets id `ref_{n:02}`
    /// whether or not it parses.
    fn parse_all(&self, section: &str) -> ParsedSection {
        let mut parsed = ParsedSection::default();
        for (i, chunk) in self.split_references(section).iter().enumerate() {
            let id = reference_id(i);
            match self.parse_reference(chunk, &id) {
                Some(reference) => parsed.references.push(reference),
                None => {
                    tracing::debug!(id = %id, style = %self.style(), "unparsed reference chunk");
                    parsed.unparsed.push(UnparsedReference {
                        id,
                        raw_text: chunk.clone(),
                    });
                }
            }
        }
        parsed
    }
}

/// The parser for `style`, using the matching weights from `weights`.
pub fn parser_for(style: CitationStyle, weights: &StyleWeights) -> Box<dyn StyleParser> {
    match style {
        CitationStyle::Apa => Box::new(ApaParser::new(weights.apa.clone())),
        CitationStyle::Ieee => Box::new(IeeeParser::new(weights.ieee.clone())),
        CitationStyle::Vancouver => Box::new(VancouverParser::new(weights.vancouver.clone())),
        CitationStyle::Harvard => Box::new(HarvardParser::new(weights.harvard.clone())),
        CitationStyle::Chicago => Box::new(ChicagoParser::new(weights.chicago.clone())),
    }
}

/// All parsers in priority order.
pub fn all_parsers(weights: &StyleWeights) -> Vec<Box<dyn StyleParser>> {
    CitationStyle::ALL
        .iter()
        .map(|&style| parser_for(style, weights))
        .collect()
}

// ── shared field helpers ──

/// Leading `[n]` marker.
pub(crate) fn starts_with_bracket_number(text: &str) -> bool {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[\d+\]").unwrap());
    RE.is_match(text)
}

/// Trim whitespace and the given trailing punctuation.
pub(crate) fn clean(s: &str, trailing: &[char]) -> String {
    s.trim()
        .trim_end_matches(|c: char| trailing.contains(&c) || c.is_whitespace())
        .to_string()
}

/// `Some(s)` unless `s` is blank after cleaning.
pub(crate) fn field(s: &str, trailing: &[char]) -> Option<String> {
    let s = clean(s, trailing);
    if s.is_empty() { None } else { Some(s) }
}

/// Drop the period that ends an author list unless it closes an initial
/// (`Doe, A.`, `Barnes, J.L.`), so every author keeps its written form.
pub(crate) fn trim_author_list_end(s: &str) -> &str {
    static INITIAL_END_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?:^|[\s,.-])[A-Z]\.$").unwrap());
    let s = s.trim();
    if INITIAL_END_RE.is_match(s) {
        s
    } else {
        s.trim_end_matches('.')
    }
}

/// Leading four-digit year of `s`.
pub(crate) fn year_of(s: &str) -> Option<i32> {
    s.get(..4).and_then(|y| y.parse().ok())
}

/// Prefer a DOI captured by a style pattern, otherwise look anywhere in the text.
pub(crate) fn resolve_doi(captured: Option<&str>, text: &str) -> Option<String> {
    captured
        .and_then(normalize_doi)
        .or_else(|| extract_doi(text))
}
