//! Chicago (Notes-Bibliography and Author-Date).
//!
//! NB: `Last, First. "Title." Journal Vol, no. Issue (Year): Pages. https://doi.org/...`
//! AD: `Last, First. Year. "Title." Journal Vol (Issue): Pages.`

use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::{CitationStyle, Reference};

use super::{
    StyleParser, clean, field, resolve_doi, starts_with_bracket_number, trim_author_list_end,
    year_of,
};
use crate::split::split_author_year;

#[derive(Debug, Clone, PartialEq)]
pub struct ChicagoWeights {
    /// Double-quoted title.
    pub quoted_title: f64,
    /// `no. N` issue label.
    pub issue_label: f64,
    /// `(Year):` before the pages.
    pub parenthesized_year_colon: f64,
    /// `Surname, Firstname` with a spelled-out first name.
    pub full_first_name: f64,
    pub no_bracket_number: f64,
    /// No `pp.` label.
    pub no_pp: f64,
    /// `Surname, First ... Year.` author-date opening.
    ///
    /// A category of its own: the notes-bibliography signals above sum to
    /// 1.0 and this bonus lets author-date entries clear the same bar
    /// without `no.` labels or `(Year):`. The total is clamped to 1.0.
    pub author_date: f64,
}

impl Default for ChicagoWeights {
    fn default() -> Self {
        Self {
            quoted_title: 0.2,
            issue_label: 0.2,
            parenthesized_year_colon: 0.3,
            full_first_name: 0.15,
            no_bracket_number: 0.05,
            no_pp: 0.1,
            author_date: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChicagoParser {
    weights: ChicagoWeights,
}

impl ChicagoParser {
    pub fn new(weights: ChicagoWeights) -> Self {
        Self { weights }
    }
}

/// Start of a Chicago entry: `Surname, F` and, within 200 characters, a
/// sentence end followed by an author-date year or a quoted title.
static NEXT_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[A-Z][A-Za-z\x{C0}-\x{24F}'-]+,\s+[A-Z].{0,200}?\.\s+(?:\d{4}[a-z]?\.|")"#)
        .unwrap()
});

static DOI_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://(?:dx\.)?doi\.org/(\S+?)\.?\s*$").unwrap());

/// `Last, First, and First Last` or a single `Last, First Middle`.
fn parse_authors(author_str: &str) -> Vec<String> {
    static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",?\s+and\s+").unwrap());

    let s = trim_author_list_end(author_str);
    if s.is_empty() {
        return Vec::new();
    }
    AND_RE.split(s).filter_map(|a| field(a, &[','])).collect()
}

impl StyleParser for ChicagoParser {
    fn style(&self) -> CitationStyle {
        CitationStyle::Chicago
    }

    fn score_match(&self, raw: &str) -> f64 {
        static DOUBLE_QUOTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]+?""#).unwrap());
        static ISSUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"no\.\s*\d+").unwrap());
        static YEAR_COLON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\d{4}\):").unwrap());
        static FULL_FIRST_NAME_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Z][a-z]+,\s+[A-Z][a-z]+").unwrap());
        static AUTHOR_DATE_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Z][a-z]+,\s*[A-Z][a-z]+.*?\.\s*\d{4}[a-z]?\.").unwrap());

        let w = &self.weights;
        let mut score = 0.0;
        if DOUBLE_QUOTES_RE.is_match(raw) {
            score += w.quoted_title;
        }
        if ISSUE_RE.is_match(raw) {
            score += w.issue_label;
        }
        if YEAR_COLON_RE.is_match(raw) {
            score += w.parenthesized_year_colon;
        }
        if FULL_FIRST_NAME_RE.is_match(raw) {
            score += w.full_first_name;
        }
        if !starts_with_bracket_number(raw) {
            score += w.no_bracket_number;
        }
        if !raw.contains("pp.") {
            score += w.no_pp;
        }
        if AUTHOR_DATE_RE.is_match(raw) {
            score += w.author_date;
        }
        score.clamp(0.0, 1.0)
    }

    fn split_references(&self, section: &str) -> Vec<String> {
        split_author_year(section, &NEXT_REFERENCE_RE)
    }

    fn parse_reference(&self, raw: &str, id: &str) -> Option<Reference> {
        static NOTES_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(concat!(
                r"(?s)^(?P<authors>.+?)\.\s+",
                r#""(?P<title>.+?)\.?"\s+"#,
                r"(?P<journal>.+?)\s+",
                r"(?P<volume>\d+),\s*",
                r"no\.\s*(?:\d+)\s*",
                r"\((?P<year>\d{4})\):\s*",
                r"(?P<pages>\d+[-–—]\d+)",
                r"\.",
                r"(?:\s*(?P<doi>https?://doi\.org/\S+?)\.?)?",
                r"\s*$",
            ))
            .unwrap()
        });
        static AUTHOR_DATE_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(concat!(
                r"(?s)^(?P<authors>.+?)\.\s+",
                r"(?P<year>\d{4})[a-z]?\.\s+",
                r#""(?P<title>.+?)\.?"\s+"#,
                r"(?P<journal>.+?)\s+",
                r"(?P<volume>\d+)",
                r"(?:\s*\([^)]+\)|,\s*no\.\s*\d+)?",
                r":\s*(?P<pages>\d+[-–—]\d+)",
                r"\.",
                r"(?:\s*(?P<doi>https?://doi\.org/\S+?)\.?)?",
                r"\s*$",
            ))
            .unwrap()
        });

        let text = raw.trim();
        let Some(caps) = NOTES_RE
            .captures(text)
            .or_else(|| AUTHOR_DATE_RE.captures(text))
        else {
            return parse_loose(text, id);
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
            raw_text: text.to_string(),
        })
    }
}

/// Anchor on the double-quoted title; without one, try the unquoted
/// author-date book form.
fn parse_loose(text: &str, id: &str) -> Option<Reference> {
    static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""(.+?)""#).unwrap());
    static PAREN_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{4})\)").unwrap());
    static BARE_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").unwrap());
    static TRAILING_YEAR_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\.\s*\d{4}[a-z]?\.?$").unwrap());
    static ISSUE_VOLUME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+),\s*no\.\s*\d+").unwrap());
    static COLON_VOLUME_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(\d+)\s*(?:\([^)]*\))?:\s*\d").unwrap());
    static PAGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*(\d+[-–—]\d+)").unwrap());

    let Some(title_m) = TITLE_RE.captures(text) else {
        return parse_unquoted(text, id);
    };
    let quoted = title_m.get(0)?;

    let year = PAREN_YEAR_RE
        .captures(text)
        .or_else(|| BARE_YEAR_RE.captures(text))
        .and_then(|c| year_of(&c[1]))?;

    let authors_str = text[..quoted.start()].trim();
    let authors_str = TRAILING_YEAR_RE.replace(authors_str, "");
    let mut rest = text[quoted.end()..].trim();

    let mut doi = None;
    if let Some(c) = DOI_URL_RE.captures(rest) {
        doi = resolve_doi(Some(&c[1]), "");
        rest = rest[..c.get(0)?.start()].trim();
    }

    let mut journal = None;
    let volume_m = ISSUE_VOLUME_RE
        .captures(rest)
        .or_else(|| COLON_VOLUME_RE.captures(rest));
    let volume = match &volume_m {
        Some(c) => {
            journal = field(&rest[..c.get(0)?.start()], &['.', ',']);
            Some(c[1].to_string())
        }
        None => None,
    };
    let pages = PAGES_RE.captures(rest).map(|c| c[1].to_string());

    if journal.is_none() {
        journal = journal_before_digits(rest);
    }

    Some(Reference {
        id: id.to_string(),
        authors: parse_authors(&authors_str),
        title: clean(&title_m[1], &['.', ',']),
        year: Some(year),
        journal,
        volume,
        pages,
        doi: doi.or_else(|| resolve_doi(None, text)),
        raw_text: text.to_string(),
    })
}

/// `Last, First. Year. Title. Publisher or Journal ...`
fn parse_unquoted(text: &str, id: &str) -> Option<Reference> {
    static AD_BOOK_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?s)^(?P<authors>.+?)\.\s+(?P<year>\d{4})[a-z]?\.\s+(?P<title>.+?)\.\s+(?P<rest>.+)$")
            .unwrap()
    });
    static VOLUME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*(?:\([^)]*\))?:\s*\d").unwrap());
    static PAGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*(\d+[-–—]\d+)").unwrap());

    let caps = AD_BOOK_RE.captures(text)?;
    let mut rest = caps["rest"].trim();
    let mut doi = None;
    if let Some(c) = DOI_URL_RE.captures(rest) {
        doi = resolve_doi(Some(&c[1]), "");
        rest = rest[..c.get(0)?.start()].trim();
    }

    Some(Reference {
        id: id.to_string(),
        authors: parse_authors(&caps["authors"]),
        title: clean(&caps["title"], &[]),
        year: year_of(&caps["year"]),
        journal: journal_before_digits(rest),
        volume: VOLUME_RE.captures(rest).map(|c| c[1].to_string()),
        pages: PAGES_RE.captures(rest).map(|c| c[1].to_string()),
        doi: doi.or_else(|| resolve_doi(None, text)),
        raw_text: text.to_string(),
    })
}

/// Venue text up to the first digit.
fn journal_before_digits(rest: &str) -> Option<String> {
    let rest = rest.trim_start_matches(['.', ',']).trim();
    let end = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
    field(&rest[..end], &['.', ','])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authors() {
        assert_eq!(parse_authors("Kwon, Hyeyoung."), vec!["Kwon, Hyeyoung"]);
        assert_eq!(
            parse_authors("Smith, John, and Jane Doe"),
            vec!["Smith, John", "Jane Doe"]
        );
        assert!(parse_authors("  ").is_empty());
    }

    #[test]
    fn test_author_date_strict() {
        let parser = ChicagoParser::default();
        let r = parser
            .parse_reference(
                "Smith, John, and Jane Doe. 2020. \"Counting Things.\" Journal of Things 12 (3): 45-67.",
                "ref_01",
            )
            .unwrap();
        assert_eq!(r.authors, vec!["Smith, John", "Jane Doe"]);
        assert_eq!(r.year, Some(2020));
        assert_eq!(r.title, "Counting Things");
        assert_eq!(r.journal.as_deref(), Some("Journal of Things"));
        assert_eq!(r.volume.as_deref(), Some("12"));
        assert_eq!(r.pages.as_deref(), Some("45-67"));
    }

    #[test]
    fn test_loose_without_issue_label() {
        let parser = ChicagoParser::default();
        let r = parser
            .parse_reference(
                "Kwon, Hyeyoung. \"Inclusion Work.\" American Journal of Sociology 127 (2022): 1818-59.",
                "ref_02",
            )
            .unwrap();
        assert_eq!(r.title, "Inclusion Work");
        assert_eq!(r.year, Some(2022));
        assert_eq!(r.journal.as_deref(), Some("American Journal of Sociology"));
        assert_eq!(r.volume.as_deref(), Some("127"));
        assert_eq!(r.pages.as_deref(), Some("1818-59"));
    }

    #[test]
    fn test_unquoted_author_date_book() {
        let parser = ChicagoParser::default();
        let r = parser
            .parse_reference(
                "Kahneman, Daniel. 2011. Thinking, Fast and Slow. New York: Farrar, Straus and Giroux.",
                "ref_03",
            )
            .unwrap();
        assert_eq!(r.year, Some(2011));
        assert_eq!(r.title, "Thinking, Fast and Slow");
        assert_eq!(r.journal.as_deref(), Some("New York: Farrar, Straus and Giroux"));
        assert_eq!(r.volume, None);
    }

    #[test]
    fn test_no_year_is_unparsed() {
        let parser = ChicagoParser::default();
        assert!(parser.parse_reference("Smith, John. \"Undated.\" Somewhere.", "ref_01").is_none());
    }

    #[test]
    fn test_author_date_signal() {
        let parser = ChicagoParser::default();
        let ad = "Smith, John. 2020. \"Counting Things.\" Journal of Things 12 (3): 45-67.";
        assert!(parser.score_match(ad) > 0.5);
    }

    #[test]
    fn test_two_entries_use_default_split() {
        let section = "Smith, John. 2020. \"Counting Things.\" Journal of Things 12 (3): 45-67.\n\n\
            Doe, Jane. 2019. \"Other Things.\" Journal of Stuff 4 (1): 1-9.";
        let parsed = ChicagoParser::default().parse_all(section);
        assert!(parsed.unparsed.is_empty());
        let titles: Vec<_> = parsed.references.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Counting Things", "Other Things"]);
        assert_eq!(parsed.references[1].id, "ref_02");
    }

    #[test]
    fn test_notes_bibliography_weights_sum_to_one() {
        let w = ChicagoWeights::default();
        let nb = w.quoted_title
            + w.issue_label
            + w.parenthesized_year_colon
            + w.full_first_name
            + w.no_bracket_number
            + w.no_pp;
        assert!((nb - 1.0).abs() < 1e-9, "{nb}");
    }
}
