//! Harvard.
//!
//! Traditional: `Last, F.M. (Year) 'Title', Journal, Vol(Issue), pp. Pages. doi:...`
//! RBA variant: `Last FI and FI Last (Year), 'Title', Journal, Vol(Issue), pp Pages.`

use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::{CitationStyle, Reference};

use super::{
    StyleParser, clean, field, resolve_doi, starts_with_bracket_number, trim_author_list_end,
    year_of,
};
use crate::split::{split_author_year, split_where};

#[derive(Debug, Clone, PartialEq)]
pub struct HarvardWeights {
    /// Single-quoted title together with a parenthesized year.
    pub quoted_title_with_year: f64,
    /// Single-quoted title without one (weak: Chicago author-date quotes too).
    pub quoted_title_alone: f64,
    /// `Author ... (Year)` followed by a comma or space.
    pub parenthesized_year: f64,
    pub pp_pages: f64,
    pub no_bracket_number: f64,
    pub surname_initials: f64,
    /// Subtracted when the entry reads `Surname, First ... Year.`
    pub author_date_penalty: f64,
}

impl Default for HarvardWeights {
    fn default() -> Self {
        Self {
            quoted_title_with_year: 0.35,
            quoted_title_alone: 0.1,
            parenthesized_year: 0.25,
            pp_pages: 0.2,
            no_bracket_number: 0.1,
            surname_initials: 0.1,
            author_date_penalty: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HarvardParser {
    weights: HarvardWeights,
}

impl HarvardParser {
    pub fn new(weights: HarvardWeights) -> Self {
        Self { weights }
    }
}

/// Start of a Harvard entry: a capitalized surname and, within 200
/// characters, a `(Year)`.
static NEXT_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Za-z\x{C0}-\x{24F}'-]+[\s,].{0,200}?\(\d{4}[a-z]?\)").unwrap()
});

/// Split a Harvard author list, traditional or RBA.
fn parse_authors(author_str: &str) -> Vec<String> {
    static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",?\s+and\s+").unwrap());
    static RBA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][a-z]+ [A-Z]{1,3}[,\s]").unwrap());
    static SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s+").unwrap());
    static SURNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][a-z]").unwrap());

    let s = trim_author_list_end(author_str.trim().trim_end_matches(','));
    let s = AND_RE.replace_all(s, ", ");

    // RBA: "Last FI, Last FI" has no periods after initials
    if RBA_RE.is_match(&s) {
        return s.split(',').filter_map(|a| field(a, &[])).collect();
    }

    split_where(&s, &SEP_RE, |_, after| SURNAME_RE.is_match(after))
        .into_iter()
        .filter_map(|a| field(a, &[',']))
        .collect()
}

impl StyleParser for HarvardParser {
    fn style(&self) -> CitationStyle {
        CitationStyle::Harvard
    }

    fn score_match(&self, raw: &str) -> f64 {
        static SINGLE_QUOTES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'.*?'").unwrap());
        static PAREN_YEAR_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[A-Z][a-z]+.*?\(\d{4}[a-z]?\)[,\s]").unwrap());
        static PP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpp\.?\s*\d+").unwrap());
        static SURNAME_INITIAL_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Z][a-z]+[,\s]+[A-Z][.\s]").unwrap());
        static AUTHOR_DATE_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Z][a-z]+,\s*[A-Z][a-z]+.*?\.\s*\d{4}[a-z]?\.").unwrap());

        let w = &self.weights;
        let mut score = 0.0;
        let has_paren_year = PAREN_YEAR_RE.is_match(raw);
        if SINGLE_QUOTES_RE.is_match(raw) {
            score += if has_paren_year {
                w.quoted_title_with_year
            } else {
                w.quoted_title_alone
            };
        }
        if has_paren_year {
            score += w.parenthesized_year;
        }
        if PP_RE.is_match(raw) {
            score += w.pp_pages;
        }
        if !starts_with_bracket_number(raw) {
            score += w.no_bracket_number;
        }
        if SURNAME_INITIAL_RE.is_match(raw) {
            score += w.surname_initials;
        }
        if AUTHOR_DATE_RE.is_match(raw) {
            score -= w.author_date_penalty;
        }
        score.clamp(0.0, 1.0)
    }

    /// Line-wrapped entries are rejoined and cut before each `Surname ... (Year)`.
    fn split_references(&self, section: &str) -> Vec<String> {
        split_author_year(section, &NEXT_REFERENCE_RE)
    }

    fn parse_reference(&self, raw: &str, id: &str) -> Option<Reference> {
        static STRICT_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(concat!(
                r"(?s)^(?P<authors>.+?)\s+",
                r"\((?P<year>\d{4}[a-z]?)\)",
                r"[,.]?\s+",
                r"'(?P<title>.+?)',?\s+",
                r"(?P<journal>.+?),",
                r"\s*(?:vol\.\s*)?(?P<volume>\d+)",
                r"(?:\((?P<issue>[^)]+)\))?",
                r"(?:,\s*pp\.?\s*(?P<pages>\d+[-–—]\d+))?",
                r"\.",
                r"(?:\s*(?:doi:\s*)?(?P<doi>\S+?)\.?)?",
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

/// Anchor on `(Year)`; take a single-quoted title when it follows the year,
/// else the first comma segment after the year.
fn parse_loose(text: &str, id: &str) -> Option<Reference> {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{4})[a-z]?\)").unwrap());
    static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(.+?)'").unwrap());
    static COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s+").unwrap());
    static DOI_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(?:doi:\s*|https?://(?:dx\.)?doi\.org/)(\S+?)\.?\s*$").unwrap()
    });
    static PAGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpp\.?\s*(\d+[-–—]\d+)").unwrap());
    static VOLUME_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?:vol\.\s*)?(\d+)(?:\([^)]*\))?").unwrap());
    static JOURNAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^,]+)").unwrap());

    let year_m = YEAR_RE.captures(text)?;
    let year_span = year_m.get(0)?;
    let authors_str = &text[..year_span.start()];
    let after_year = text[year_span.end()..]
        .trim()
        .trim_start_matches(['.', ','])
        .trim();

    let quoted = QUOTED_RE
        .captures(text)
        .filter(|c| c.get(0).is_some_and(|m| m.start() + 5 > year_span.end()));

    let (title, rest) = match quoted {
        Some(c) => {
            let end = c.get(0)?.end();
            (
                clean(&c[1], &[]),
                text[end..].trim().trim_start_matches(',').trim().to_string(),
            )
        }
        None => {
            let mut parts = COMMA_RE.splitn(after_year, 2);
            let title = parts.next().unwrap_or_default();
            let rest = parts.next().unwrap_or_default();
            (
                clean(title.trim_matches('\''), &['.']),
                rest.to_string(),
            )
        }
    };

    if title.chars().count() < 5 {
        return None;
    }

    let mut rest = rest.as_str();
    let mut doi = None;
    if let Some(c) = DOI_RE.captures(rest) {
        doi = resolve_doi(Some(&c[1]), "");
        rest = rest[..c.get(0)?.start()].trim();
    }

    let pages = PAGES_RE.captures(rest).map(|c| c[1].to_string());

    let (journal, volume) = match VOLUME_RE.captures(rest) {
        Some(c) => (
            field(&rest[..c.get(0)?.start()], &[',']),
            Some(c[1].to_string()),
        ),
        None => (
            JOURNAL_RE.captures(rest).and_then(|c| field(&c[1], &['.'])),
            None,
        ),
    };

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
    fn test_parse_authors_traditional_and_rba() {
        assert_eq!(
            parse_authors("Black, J. and Barnes, J.L."),
            vec!["Black, J.", "Barnes, J.L."]
        );
        assert_eq!(
            parse_authors("Bishop J, Gill T and Lancaster D"),
            vec!["Bishop J", "Gill T", "Lancaster D"]
        );
        assert_eq!(parse_authors("Kent C, Smith K"), vec!["Kent C", "Smith K"]);
        assert_eq!(
            parse_authors("Smith, J.K., Jones, P."),
            vec!["Smith, J.K.", "Jones, P."]
        );
    }

    #[test]
    fn test_loose_rba_working_paper() {
        let parser = HarvardParser::default();
        let r = parser
            .parse_reference(
                "Bishop J and Tulip P (2017), 'Anticipatory Monetary Policy and the Price Puzzle', RBA Research Discussion Paper No 2017-02.",
                "ref_01",
            )
            .unwrap();
        assert_eq!(r.title, "Anticipatory Monetary Policy and the Price Puzzle");
        assert_eq!(r.year, Some(2017));
        assert_eq!(r.authors, vec!["Bishop J", "Tulip P"]);
        assert_eq!(r.journal.as_deref(), Some("RBA Research Discussion Paper No"));
        assert_eq!(r.volume.as_deref(), Some("2017"));
    }

    #[test]
    fn test_loose_unquoted_title() {
        let parser = HarvardParser::default();
        let r = parser
            .parse_reference("Smith, J. (2009a) Economic growth revisited, Journal of Things.", "ref_02")
            .unwrap();
        assert_eq!(r.year, Some(2009));
        assert_eq!(r.title, "Economic growth revisited");
        assert_eq!(r.journal.as_deref(), Some("Journal of Things"));
    }

    #[test]
    fn test_split_joins_wrapped_entries() {
        let parser = HarvardParser::default();
        let section = "Adams A (2001), 'One', Journal\nA, 1(1), pp 1-2.\nBrown B (2002), 'Two',\nJournal B, 2(2), pp 3-4.\n12\nCole C (2003), 'Three', Journal C, 3, pp 5-6. Dunn D (2004), 'Four', Journal D, 4, pp 7-8.";
        let refs = parser.split_references(section);
        assert_eq!(refs.len(), 4, "{refs:?}");
        assert_eq!(refs[0], "Adams A (2001), 'One', Journal A, 1(1), pp 1-2.");
        assert_eq!(refs[2], "Cole C (2003), 'Three', Journal C, 3, pp 5-6.");
    }

    #[test]
    fn test_author_date_penalty() {
        let parser = HarvardParser::default();
        let chicago_ad = "Smith, John. 2020. 'Quoted' Things. Journal 3: 1-2.";
        let harvard = "Smith, J. (2020) 'Quoted things', Journal, 3, pp. 1-2.";
        assert!(parser.score_match(harvard) > parser.score_match(chicago_ad));
    }

    #[test]
    fn test_two_entries_use_default_split() {
        let section = "Adams A (2001), 'One', Journal A, 1(1), pp 1-2.\n\n\
            Brown B (2002), 'Two', Journal B,\n2(2), pp 3-4.";
        let parser = HarvardParser::default();
        assert_eq!(
            parser.split_references(section),
            vec![
                "Adams A (2001), 'One', Journal A, 1(1), pp 1-2.",
                "Brown B (2002), 'Two', Journal B, 2(2), pp 3-4."
            ]
        );
        let parsed = parser.parse_all(section);
        assert_eq!(parsed.references.len(), 2);
        assert_eq!(parsed.references[1].title, "Two");
    }
}
