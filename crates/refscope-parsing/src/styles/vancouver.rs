//! Vancouver (NLM) and AMA.
//!
//! Vancouver: `Last AB, Last CD. Title. J Abbrev. Year Mon;Vol(Issue):Pages.`
//! AMA:       `Last AB, Last CD. Title. J Abbrev. Year;Vol(Issue):Pages.`

use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::{CitationStyle, Reference};

use super::{StyleParser, clean, field, resolve_doi, year_of};
use crate::split::{default_split, split_before_lines};

#[derive(Debug, Clone, PartialEq)]
pub struct VancouverWeights {
    /// `Lastname AB` initials without periods.
    pub compact_initials: f64,
    /// `Year;Volume`.
    pub year_semicolon_volume: f64,
    pub unquoted: f64,
    /// No `(Year).` near the start.
    pub no_parenthesized_year: f64,
    /// No `vol.` or `pp.` labels.
    pub no_labels: f64,
}

impl Default for VancouverWeights {
    fn default() -> Self {
        Self {
            compact_initials: 0.35,
            year_semicolon_volume: 0.35,
            unquoted: 0.1,
            no_parenthesized_year: 0.1,
            no_labels: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VancouverParser {
    weights: VancouverWeights,
}

impl VancouverParser {
    pub fn new(weights: VancouverWeights) -> Self {
        Self { weights }
    }
}

static COMPACT_INITIALS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+ [A-Z]{1,4}[,.]").unwrap());

fn strip_leading_number(text: &str) -> &str {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\.\s*").unwrap());
    match RE.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// `Last AB, Last CD, et al.`
fn parse_authors(author_str: &str) -> Vec<String> {
    static ET_AL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",?\s*et al\.?$").unwrap());
    let s = author_str.trim().trim_end_matches('.');
    let s = ET_AL_RE.replace(s, "");
    s.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

impl StyleParser for VancouverParser {
    fn style(&self) -> CitationStyle {
        CitationStyle::Vancouver
    }

    fn score_match(&self, raw: &str) -> f64 {
        static SEMICOLON_VOLUME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}[^;]*;\d+").unwrap());
        static PAREN_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\d{4}\)\.").unwrap());

        let text = strip_leading_number(raw).trim();
        let head: String = text.chars().take(100).collect();
        let lower = text.to_lowercase();

        let w = &self.weights;
        let mut score = 0.0;
        if COMPACT_INITIALS_RE.is_match(text) {
            score += w.compact_initials;
        }
        if SEMICOLON_VOLUME_RE.is_match(text) {
            score += w.year_semicolon_volume;
        }
        if !text.contains('"') && !text.contains('\'') {
            score += w.unquoted;
        }
        if !PAREN_YEAR_RE.is_match(&head) {
            score += w.no_parenthesized_year;
        }
        if !lower.contains("vol.") && !lower.contains("pp.") {
            score += w.no_labels;
        }
        score.clamp(0.0, 1.0)
    }

    /// Entries are usually numbered `1.`, `2.`; wrapped lines are rejoined.
    fn split_references(&self, section: &str) -> Vec<String> {
        static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\.\s").unwrap());
        let refs = split_before_lines(section.trim(), &MARKER_RE);
        if refs.len() > 1 {
            refs
        } else {
            default_split(section)
        }
    }

    fn parse_reference(&self, raw: &str, id: &str) -> Option<Reference> {
        static STRICT_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(concat!(
                r"(?s)^(?P<authors>.+?)\.\s+",
                r"(?P<title>.+?)\.\s+",
                r"(?P<journal>.+?)\.\s+",
                r"(?P<year>\d{4})",
                r"(?:\s+[A-Z][a-z]+(?:\s+\d{1,2})?)?",
                r";(?P<volume>\d+)",
                r"(?:\((?P<issue>[^)]+)\))?",
                r":(?P<pages>\w+[-–—]\w+)",
                r"\.",
                r"(?:\s*doi:\s*(?P<doi>\S+?)\.?)?",
                r"\s*$",
            ))
            .unwrap()
        });

        let raw = raw.trim();
        let text = strip_leading_number(raw).trim();
        let Some(caps) = STRICT_RE.captures(text) else {
            return parse_loose(text, raw, id);
        };

        Some(Reference {
            id: id.to_string(),
            authors: parse_authors(&caps["authors"]),
            title: clean(&caps["title"], &[]),
            year: year_of(&caps["year"]),
            journal: field(&caps["journal"], &[]),
            volume: Some(caps["volume"].to_string()),
            pages: Some(caps["pages"].to_string()),
            doi: resolve_doi(caps.name("doi").map(|m| m.as_str()), text),
            raw_text: raw.to_string(),
        })
    }
}

/// Anchor on compact initials plus a year; split the rest on sentence ends.
fn parse_loose(text: &str, raw: &str, id: &str) -> Option<Reference> {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
    static PERIOD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+").unwrap());
    static JOURNAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\.?\s*\d{4}").unwrap());
    static VOLUME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r";(\d+)").unwrap());
    static PAGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":(\w+[-–—]\w+)").unwrap());
    static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)doi:\s*(\S+?)\.?\s*$").unwrap());

    if !COMPACT_INITIALS_RE.is_match(text) {
        return None;
    }
    let year = YEAR_RE.find(text).and_then(|m| year_of(m.as_str()))?;

    let parts: Vec<&str> = PERIOD_RE.splitn(text, 4).collect();
    if parts.len() < 2 {
        return None;
    }

    let mut journal = None;
    let mut volume = None;
    let mut pages = None;
    let mut doi = None;

    if parts.len() > 2 {
        let rest = parts[2..].join(". ");
        journal = JOURNAL_RE
            .captures(&rest)
            .and_then(|c| field(&c[1], &['.']));
        volume = VOLUME_RE.captures(&rest).map(|c| c[1].to_string());
        pages = PAGES_RE.captures(&rest).map(|c| c[1].to_string());
        doi = DOI_RE
            .captures(&rest)
            .and_then(|c| resolve_doi(Some(&c[1]), ""));
    }

    Some(Reference {
        id: id.to_string(),
        authors: parse_authors(parts[0]),
        title: clean(parts[1], &['.']),
        year: Some(year),
        journal,
        volume,
        pages,
        doi: doi.or_else(|| resolve_doi(None, text)),
        raw_text: raw.to_string(),
    })
}
