//! APA (7th edition).
//!
//! `Author, A. A., & Author, B. B. (Year). Title. Journal, Vol(Issue), Pages. https://doi.org/...`

use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::{CitationStyle, Reference};

use super::{
    StyleParser, clean, field, resolve_doi, starts_with_bracket_number, trim_author_list_end,
    year_of,
};
use crate::split::split_where;

#[derive(Debug, Clone, PartialEq)]
pub struct ApaWeights {
    /// `Surname, I. ... (Year).`, the strongest APA signal.
    pub year_after_author: f64,
    pub no_bracket_number: f64,
    pub unquoted_title: f64,
    /// DOI written as an `https://doi.org/` URL.
    pub doi_url: f64,
    /// Entry opens with `Surname, I.`.
    pub surname_initials: f64,
}

impl Default for ApaWeights {
    fn default() -> Self {
        Self {
            year_after_author: 0.4,
            no_bracket_number: 0.1,
            unquoted_title: 0.15,
            doi_url: 0.15,
            surname_initials: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApaParser {
    weights: ApaWeights,
}

impl ApaParser {
    pub fn new(weights: ApaWeights) -> Self {
        Self { weights }
    }
}

/// Split an APA author list: `Last, F. M., Last, F., & Last, F.`
///
/// A `...` omission marker (21+ authors) becomes an ordinary separator.
fn parse_authors(author_str: &str) -> Vec<String> {
    static AMPERSAND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",?\s*&\s*").unwrap());
    static SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s+").unwrap());
    static SURNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][a-z]").unwrap());

    let s = trim_author_list_end(author_str);
    let s = AMPERSAND_RE.replace_all(s, ", ");
    let s = s.replace("...", ",");

    split_where(&s, &SEP_RE, |_, after| SURNAME_RE.is_match(after))
        .into_iter()
        .filter_map(|part| field(part, &[',']))
        .collect()
}

impl StyleParser for ApaParser {
    fn style(&self) -> CitationStyle {
        CitationStyle::Apa
    }

    fn score_match(&self, raw: &str) -> f64 {
        static YEAR_AFTER_AUTHOR_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[A-Z][a-z]+,\s+[A-Z]\.\s.*?\(\d{4}\)\.").unwrap());
        static SURNAME_INITIAL_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Z][a-z]+,\s+[A-Z]\.").unwrap());

        let w = &self.weights;
        let mut score = 0.0;
        if YEAR_AFTER_AUTHOR_RE.is_match(raw) {
            score += w.year_after_author;
        }
        if !starts_with_bracket_number(raw) {
            score += w.no_bracket_number;
        }
        if !raw.contains('"') && !raw.contains('\'') {
            score += w.unquoted_title;
        }
        if raw.contains("https://doi.org/") {
            score += w.doi_url;
        }
        if SURNAME_INITIAL_RE.is_match(raw) {
            score += w.surname_initials;
        }
        score.clamp(0.0, 1.0)
    }

    fn parse_reference(&self, raw: &str, id: &str) -> Option<Reference> {
        static STRICT_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(concat!(
                r"(?s)^(?P<authors>.+?)\s+",
                r"\((?P<year>\d{4})\)\.\s+",
                r"(?P<title>.+?)\.\s+",
                r"(?P<journal>[^,]+?),",
                r"\s*(?P<volume>\d+)",
                r"(?:\((?P<issue>[^)]+)\))?",
                r"(?:,\s*(?P<pages>\d+[-–—]\d+|Article\s+\w+))?",
                r"\.",
                r"(?:\s*(?P<doi>https?://doi\.org/\S+))?",
                r"\s*$",
            ))
            .unwrap()
        });

        let text = raw.trim();
        let Some(caps) = STRICT_RE.captures(text) else {
            return parse_loose(text, id);
        };

        Some(Reference {
            id: id.to_string(),
            authors: parse_authors(&caps["authors"]),
            title: clean(&caps["title"], &[]),
            year: year_of(&caps["year"]),
            journal: field(&caps["journal"], &[]),
            volume: Some(caps["volume"].to_string()),
            pages: caps.name("pages").map(|m| m.as_str().to_string()),
            doi: resolve_doi(caps.name("doi").map(|m| m.as_str()), text),
            raw_text: text.to_string(),
        })
    }
}

/// Anchor on `(Year).` and split the remainder best-effort.
fn parse_loose(text: &str, id: &str) -> Option<Reference> {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{4})[a-z]?\)\.").unwrap());
    static DOI_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"https?://(?:dx\.)?doi\.org/(\S+?)\.?\s*$").unwrap());
    static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^(.+?)\.\s+([A-Z].+)$").unwrap());
    static JVP_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(.+?),\s*(\d+)(?:\([^)]*\))?,?\s*(\d+[-–—]\d+|Article\s+\w+)?").unwrap()
    });

    let year_m = YEAR_RE.captures(text)?;
    let whole = year_m.get(0)?;
    let authors_str = &text[..whole.start()];
    let mut rest = text[whole.end()..].trim();

    let mut doi = None;
    if let Some(caps) = DOI_RE.captures(rest) {
        doi = resolve_doi(Some(&caps[1]), "");
        rest = rest[..caps.get(0)?.start()].trim();
    }

    let mut title = clean(rest, &['.']);
    let mut journal = None;
    let mut volume = None;
    let mut pages = None;

    if let Some(caps) = TITLE_RE.captures(rest) {
        title = clean(&caps[1], &[]);
        let journal_part = clean(&caps[2], &['.']);
        match JVP_RE.captures(&journal_part) {
            Some(jvp) => {
                journal = field(&jvp[1], &[]);
                volume = Some(jvp[2].to_string());
                pages = jvp.get(3).map(|m| m.as_str().to_string());
            }
            None => journal = field(&journal_part, &[]),
        }
    }

    if title.is_empty() {
        return None;
    }

    Some(Reference {
        id: id.to_string(),
        authors: parse_authors(authors_str),
        title,
        year: year_of(&year_m[1]),
        journal,
        volume,
        pages,
        doi: doi.or_else(|| resolve_doi(None, text)),
        raw_text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authors_with_ampersand() {
        assert_eq!(
            parse_authors("Grady, J. S., Her, M., Moreno, G., Perez, C., & Yelinek, J."),
            vec!["Grady, J. S.", "Her, M.", "Moreno, G.", "Perez, C.", "Yelinek, J."]
        );
    }

    #[test]
    fn test_parse_authors_with_omission_marker() {
        let authors = parse_authors("Wiskunde, B., Arafat, H., ... Ross, D. J.");
        assert_eq!(authors.first().map(String::as_str), Some("Wiskunde, B."));
        assert_eq!(authors.last().map(String::as_str), Some("Ross, D. J."));
        assert_eq!(authors.len(), 3);
    }

    #[test]
    fn test_strict_with_doi() {
        let parser = ApaParser::default();
        let r = parser
            .parse_reference(
                "Smith, J., & Doe, A. (2020). Machine learning in healthcare. Nature Medicine, 26(3), 309-316. https://doi.org/10.1038/s41591-020-0803-x",
                "ref_01",
            )
            .unwrap();
        assert_eq!(r.authors, vec!["Smith, J.", "Doe, A."]);
        assert_eq!(r.pages.as_deref(), Some("309-316"));
        assert_eq!(r.doi.as_deref(), Some("10.1038/s41591-020-0803-x"));
    }

    #[test]
    fn test_loose_book_style_entry() {
        let parser = ApaParser::default();
        let r = parser
            .parse_reference(
                "Kahneman, D. (2011). Thinking, fast and slow. Farrar, Straus and Giroux.",
                "ref_02",
            )
            .unwrap();
        assert_eq!(r.year, Some(2011));
        assert_eq!(r.title, "Thinking, fast and slow");
        assert_eq!(r.journal.as_deref(), Some("Farrar, Straus and Giroux"));
        assert_eq!(r.volume, None);
    }

    #[test]
    fn test_loose_requires_parenthesized_year() {
        let parser = ApaParser::default();
        assert!(parser.parse_reference("Kahneman, D. Thinking, fast and slow.", "ref_01").is_none());
    }
}
