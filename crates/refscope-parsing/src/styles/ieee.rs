//! IEEE.
//!
//! `[n] F. M. Last, F. Last, and F. Last, "Title," Journal, vol. X, no. Y, pp. A-B, Mon. Year, doi: ...`

use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::{CitationStyle, Reference};

use super::{StyleParser, clean, field, resolve_doi, starts_with_bracket_number, year_of};
use crate::split::{default_split, split_before_lines};

#[derive(Debug, Clone, PartialEq)]
pub struct IeeeWeights {
    pub bracket_number: f64,
    pub quoted_title: f64,
    /// A `vol. N` label.
    pub volume_label: f64,
    /// A `doi:` label.
    pub doi_label: f64,
    /// Authors written initials first (`G. Liu`).
    pub initials_first: f64,
}

impl Default for IeeeWeights {
    fn default() -> Self {
        Self {
            bracket_number: 0.3,
            quoted_title: 0.2,
            volume_label: 0.3,
            doi_label: 0.1,
            initials_first: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IeeeParser {
    weights: IeeeWeights,
}

impl IeeeParser {
    pub fn new(weights: IeeeWeights) -> Self {
        Self { weights }
    }
}

fn strip_bracket_number(text: &str) -> &str {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[\d+\]\s*").unwrap());
    match RE.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Split an IEEE author list.
///
/// Initials carry periods and sit before the surname, so naive comma
/// splitting is followed by regrouping: parts accumulate until they contain
/// a word without a trailing period (the surname).
fn parse_authors(author_str: &str) -> Vec<String> {
    static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+and\s+").unwrap());

    let s = AND_RE.replace_all(author_str.trim(), ", ");
    let mut authors = Vec::new();
    let mut current = String::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !current.is_empty() {
            current.push_str(", ");
        }
        current.push_str(part);
        if current.split_whitespace().any(|w| !w.ends_with('.')) {
            authors.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        authors.push(current);
    }
    authors
}

impl StyleParser for IeeeParser {
    fn style(&self) -> CitationStyle {
        CitationStyle::Ieee
    }

    fn score_match(&self, raw: &str) -> f64 {
        static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"".+?""#).unwrap());
        static VOLUME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"vol\.\s*\d+").unwrap());
        static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"doi:\s*\S+").unwrap());
        static INITIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]\.\s").unwrap());

        let w = &self.weights;
        let mut score = 0.0;
        if starts_with_bracket_number(raw) {
            score += w.bracket_number;
        }
        if QUOTED_RE.is_match(raw) {
            score += w.quoted_title;
        }
        if VOLUME_RE.is_match(raw) {
            score += w.volume_label;
        }
        if DOI_RE.is_match(raw) {
            score += w.doi_label;
        }
        if INITIAL_RE.is_match(strip_bracket_number(raw).trim()) {
            score += w.initials_first;
        }
        score.clamp(0.0, 1.0)
    }

    /// Entries are bracket-numbered; wrapped lines are rejoined.
    fn split_references(&self, section: &str) -> Vec<String> {
        static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[\d+\]").unwrap());
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
                r#"(?s)^(?P<authors>.+?),\s*"(?P<title>.+?),"?\s*"#,
                r"(?P<journal>.+?),",
                r"\s*vol\.\s*(?P<volume>\S+),",
                r"(?:\s*no\.\s*(?P<issue>\S+?),)?",
                r"\s*pp?\.\s*(?P<pages>\d+(?:\s*[-–—]\s*\d+)*),",
                r"\s*(?:(?P<month>[A-Z][a-z]+\.?\s+)?(?P<year>\d{4}))",
                r"(?:,\s*doi:\s*(?P<doi>\S+?))?",
                r"\.?\s*$",
            ))
            .unwrap()
        });

        let raw = raw.trim();
        let text = strip_bracket_number(raw).trim();
        let Some(caps) = STRICT_RE.captures(text) else {
            return parse_loose(text, raw, id);
        };

        Some(Reference {
            id: id.to_string(),
            authors: parse_authors(&caps["authors"]),
            title: clean(&caps["title"], &[',']),
            year: year_of(&caps["year"]),
            journal: field(&caps["journal"], &[]),
            volume: field(&caps["volume"], &[',']),
            pages: Some(caps["pages"].to_string()),
            doi: resolve_doi(caps.name("doi").map(|m| m.as_str()), text),
            raw_text: raw.to_string(),
        })
    }
}

/// Anchor on the double-quoted title.
fn parse_loose(text: &str, raw: &str, id: &str) -> Option<Reference> {
    static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""(.+?)""#).unwrap());
    static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)doi:\s*(\S+?)\.?\s*$").unwrap());
    static VOLUME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"vol\.\s*(\S+?),").unwrap());
    static PAGES_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"pp?\.\s*(\d+(?:\s*[-–—]\s*\d+)*)").unwrap());
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

    let title_m = TITLE_RE.captures(text)?;
    let quoted = title_m.get(0)?;
    let title = clean(&title_m[1], &[',', '.']);
    if title.is_empty() {
        return None;
    }

    let authors_str = clean(&text[..quoted.start()], &[',']);
    let rest = text[quoted.end()..].trim().trim_start_matches(',').trim();

    let doi = DOI_RE
        .captures(rest)
        .and_then(|c| resolve_doi(Some(&c[1]), ""));
    let volume_m = VOLUME_RE.captures(rest);
    let pages_m = PAGES_RE.captures(rest);

    // Page numbers can look like years: prefer a year after the pages, then
    // one before them.
    let pages_span = pages_m
        .as_ref()
        .and_then(|c| c.get(0))
        .map_or((0, 0), |m| (m.start(), m.end()));
    let year_at = YEAR_RE
        .find(&rest[pages_span.1..])
        .map(|m| (pages_span.1 + m.start(), m.as_str()))
        .or_else(|| {
            YEAR_RE
                .find(&rest[..pages_span.0])
                .map(|m| (m.start(), m.as_str()))
        });

    let journal = match (&volume_m, year_at) {
        (Some(v), _) => field(&rest[..v.get(0)?.start()], &[',']),
        (None, Some((pos, _))) => field(&rest[..pos], &[',']),
        (None, None) => None,
    };

    Some(Reference {
        id: id.to_string(),
        authors: parse_authors(&authors_str),
        title,
        year: year_at.and_then(|(_, y)| year_of(y)),
        journal,
        volume: volume_m.map(|c| c[1].to_string()),
        pages: pages_m.map(|c| c[1].to_string()),
        doi: doi.or_else(|| resolve_doi(None, text)),
        raw_text: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authors_regroups_initials() {
        assert_eq!(
            parse_authors("G. Liu, K. Y. Lee, and H. F. Jordan"),
            vec!["G. Liu", "K. Y. Lee", "H. F. Jordan"]
        );
    }

    #[test]
    fn test_strict_with_doi() {
        let parser = IeeeParser::default();
        let r = parser
            .parse_reference(
                "[3] A. Vaswani and N. Shazeer, \"Attention is all you need,\" Adv. Neural Inf. Process. Syst., vol. 30, pp. 5998-6008, Dec. 2017, doi: 10.5555/3295222.3295349.",
                "ref_03",
            )
            .unwrap();
        assert_eq!(r.authors, vec!["A. Vaswani", "N. Shazeer"]);
        assert_eq!(r.title, "Attention is all you need");
        assert_eq!(r.journal.as_deref(), Some("Adv. Neural Inf. Process. Syst."));
        assert_eq!(r.year, Some(2017));
        assert_eq!(r.doi.as_deref(), Some("10.5555/3295222.3295349"));
        assert!(r.raw_text.starts_with("[3] "));
    }

    #[test]
    fn test_loose_conference_paper() {
        let parser = IeeeParser::default();
        let r = parser
            .parse_reference(
                "[7] K. He, X. Zhang, S. Ren, and J. Sun, \"Deep residual learning for image recognition,\" in Proc. IEEE CVPR, 2016, pp. 770-778.",
                "ref_07",
            )
            .unwrap();
        assert_eq!(r.title, "Deep residual learning for image recognition");
        assert_eq!(r.authors.len(), 4);
        assert_eq!(r.pages.as_deref(), Some("770-778"));
        assert_eq!(r.volume, None);
        assert_eq!(r.journal.as_deref(), Some("in Proc. IEEE CVPR"));
    }

    #[test]
    fn test_unquoted_entry_is_unparsed() {
        let parser = IeeeParser::default();
        assert!(parser.parse_reference("[1] Some web page, 2020.", "ref_01").is_none());
    }

    #[test]
    fn test_split_rejoins_wrapped_lines() {
        let parser = IeeeParser::default();
        let refs = parser.split_references("[1] A. B,\n\"T1,\" J, 2001.\n[2] C. D, \"T2,\" J, 2002.");
        assert_eq!(refs, vec!["[1] A. B, \"T1,\" J, 2001.", "[2] C. D, \"T2,\" J, 2002."]);
    }
}
