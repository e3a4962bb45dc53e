//! Reference-boundary splitting shared by the style parsers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::unwrap_lines;

/// Split `text` at matches of `sep` for which `accept(before, after)` holds.
///
/// The separator itself is dropped. `after` is the remainder of the text
/// following the separator, which lets callers express a lookahead condition
/// with an anchored regex.
pub(crate) fn split_where<'a>(
    text: &'a str,
    sep: &Regex,
    accept: impl Fn(&str, &str) -> bool,
) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for m in sep.find_iter(text) {
        if accept(&text[..m.start()], &text[m.end()..]) {
            pieces.push(&text[start..m.start()]);
            start = m.end();
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Trim each piece, unwrap its lines and drop empty pieces.
pub(crate) fn tidy<'a>(pieces: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    pieces
        .into_iter()
        .map(unwrap_lines)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split at line starts whose line begins with `marker` (an anchored regex).
pub(crate) fn split_before_lines(section: &str, marker: &Regex) -> Vec<String> {
    static NEWLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n").unwrap());
    tidy(split_where(section, &NEWLINE_RE, |_, after| {
        marker.is_match(after)
    }))
}

/// The shared splitter.
///
/// 1. Numbered entries: a line starting with `[n]` or a 1–3 digit `n. `.
/// 2. Blank-line separated paragraphs.
/// 3. One reference per line.
///
/// Line breaks inside a chunk are collapsed to single spaces.
pub fn default_split(section: &str) -> Vec<String> {
    static NUMBERED_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[ \t]*(?:\[\d+\]|\d{1,3}\.\s)").unwrap());
    static BLANK_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

    let section = section.trim();

    let numbered = split_before_lines(section, &NUMBERED_RE);
    if numbered.len() > 1 {
        return numbered;
    }

    let paragraphs = tidy(BLANK_LINE_RE.split(section));
    if paragraphs.len() > 1 {
        return paragraphs;
    }

    section
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove running page furniture from a line-joined reference block.
///
/// Dropped when they sit between two references:
/// - page numbers (`... 2015. 32 Smith, J. (2016)`)
/// - running heads that pair a journal name and year with a page number
///   (`32 Journal of Applied Things 2019`)
/// - `DRAFT`/`Preprint` watermarks
///
/// `Page N of M` stamps are dropped wherever they appear.
pub(crate) fn strip_page_noise(joined: &str, next_reference: &Regex) -> String {
    static PAGE_OF_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\s+page\s+\d+\s+of\s+\d+\b").unwrap());
    static CAPS_WATERMARK_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\s+(?:DRAFT|PREPRINT|AUTHOR MANUSCRIPT|NOT FOR DISTRIBUTION)\b").unwrap()
    });
    static WATERMARK_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\s+(?:Draft|Preprint|Author manuscript)(?:\s+(?:version|copy))?\s+").unwrap()
    });
    static RUNNING_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
        const TITLE: &str = r"[A-Z][A-Za-z&.:-]*(?:\s+(?:[A-Z][A-Za-z&.:-]*|of|and|the|in|for|on|&)){0,8}";
        Regex::new(&format!(
            r"\s+(?:\d{{1,3}}\s+{TITLE}\s+(?:19|20)\d{{2}}|{TITLE}\s+(?:19|20)\d{{2}}\s+\d{{1,3}})\s+"
        ))
        .unwrap()
    });
    static PAGE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\d{1,3}\s+").unwrap());

    let between_references =
        |before: &str, after: &str| before.ends_with('.') && next_reference.is_match(after);

    let joined = PAGE_OF_RE.replace_all(joined, "");
    let joined = CAPS_WATERMARK_RE.replace_all(&joined, "");
    let joined = split_where(&joined, &WATERMARK_RE, between_references).join(" ");
    let joined = split_where(&joined, &RUNNING_HEAD_RE, between_references).join(" ");
    split_where(&joined, &PAGE_NUMBER_RE, |_, after| {
        next_reference.is_match(after)
    })
    .join(" ")
}

/// Split a line-wrapped author-year reference list.
///
/// PDF extraction wraps long references and loses the blank lines between
/// them, so the block is joined into one line and cut wherever a sentence
/// ends (`.`) and `next_reference` (an anchored regex describing the start of
/// an entry) matches. Four or more chunks are required; otherwise the shared
/// splitter's result is used.
pub(crate) fn split_author_year(section: &str, next_reference: &Regex) -> Vec<String> {
    static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let joined = unwrap_lines(section.trim());
    let joined = strip_page_noise(&joined, next_reference);

    let parts = tidy(split_where(&joined, &WS_RE, |before, after| {
        before.ends_with('.') && next_reference.is_match(after)
    }));

    if parts.len() > 3 {
        parts
    } else {
        tracing::debug!(
            chunks = parts.len(),
            "author-year boundaries too sparse, using default splitter"
        );
        default_split(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_split_where_keeps_text_between_separators() {
        let re = Regex::new(r",\s+").unwrap();
        let upper = Regex::new(r"^[A-Z][a-z]").unwrap();
        let pieces = split_where("Smith, J., Doe, A., and more", &re, |_, after| {
            upper.is_match(after)
        });
        assert_eq!(pieces, vec!["Smith, J.", "Doe, A., and more"]);
    }

    #[test]
    fn test_numbered_bracket_split() {
        let section = "[1] A. One, \"T1,\" J, 2001.\n[2] B. Two,\n\"T2,\" J, 2002.\n[3] C. Three, \"T3,\" J, 2003.";
        let chunks = default_split(section);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], "[2] B. Two, \"T2,\" J, 2002.");
        assert_eq!(non_ws(&chunks.concat()), non_ws(section));
    }

    #[test]
    fn test_numbered_dot_split() {
        let section = "1. Halpern SD. Title one. J. 2002;1:1-2.\n2. Rose ME. Title\ntwo. J. 2002;2:3-4.";
        let chunks = default_split(section);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], "2. Rose ME. Title two. J. 2002;2:3-4.");
    }

    #[test]
    fn test_four_digit_number_is_not_an_entry_marker() {
        let section = "Smith, J. (2020). A title.\n2020. continued text";
        let chunks = default_split(section);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "Smith, J. (2020). A title.");
    }

    #[test]
    fn test_blank_line_split_is_content_preserving() {
        let section = "Smith, J. (2020). First\nwrapped title. J, 1.\n\n  \nDoe, A. (2021). Second. J, 2.";
        let chunks = default_split(section);
        assert_eq!(
            chunks,
            vec![
                "Smith, J. (2020). First wrapped title. J, 1.",
                "Doe, A. (2021). Second. J, 2."
            ]
        );
        assert_eq!(non_ws(&chunks.concat()), non_ws(section));
    }

    #[test]
    fn test_line_fallback() {
        let chunks = default_split("first ref\nsecond ref\n\n");
        assert_eq!(chunks, vec!["first ref", "second ref"]);
    }

    #[test]
    fn test_empty_section() {
        assert!(default_split("   \n ").is_empty());
    }

    #[test]
    fn test_strip_page_noise() {
        let next = Regex::new(r"^[A-Z][a-z]+,").unwrap();
        let cleaned = strip_page_noise("Journal 3, 1-2. 32 Smith, J. Page 4 of 10 x", &next);
        assert_eq!(cleaned, "Journal 3, 1-2. Smith, J. x");
    }

    fn harvard_start() -> Regex {
        Regex::new(r"^[A-Z][A-Za-z'-]+[\s,].{0,200}?\(\d{4}[a-z]?\)").unwrap()
    }

    #[test]
    fn test_strip_running_head_and_watermark() {
        let next = harvard_start();
        let cleaned = strip_page_noise(
            "Journal B, 2(2), pp 3-4. 32 Journal of Applied Things 2019 DRAFT Cole C (2003), 'Three'",
            &next,
        );
        assert_eq!(cleaned, "Journal B, 2(2), pp 3-4. Cole C (2003), 'Three'");

        let cleaned = strip_page_noise("pp 3-4. Preprint Cole C (2003), 'Three'", &next);
        assert_eq!(cleaned, "pp 3-4. Cole C (2003), 'Three'");

        let cleaned = strip_page_noise("pp 3-4. J. Appl. Things 2019 33 Cole C (2003), 'Three'", &next);
        assert_eq!(cleaned, "pp 3-4. Cole C (2003), 'Three'");
    }

    #[test]
    fn test_journal_year_inside_entry_is_kept() {
        let next = harvard_start();
        let entry = "Adams A (2001), 'One', Journal of Things 2019 12, pp 1-2. Brown B (2002), 'Two'";
        assert_eq!(strip_page_noise(entry, &next), entry);
    }

    #[test]
    fn test_author_year_split_drops_furniture() {
        let section = "Adams A (2001), 'One', Journal A, 1(1), pp 1-2.\n\
            Brown B (2002), 'Two', Journal B, 2(2), pp 3-4.\n\
            32 Journal of Applied Things 2019\nDRAFT\n\
            Cole C (2003), 'Three', Journal C, 3, pp 5-6.\n\
            Dunn D (2004), 'Four', Journal D, 4, pp 7-8.";
        let chunks = split_author_year(section, &harvard_start());
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[2], "Cole C (2003), 'Three', Journal C, 3, pp 5-6.");
        assert!(!chunks.concat().contains("DRAFT"));
    }

    #[test]
    fn test_author_year_sparse_boundaries_use_default_split() {
        let section = "Adams A (2001), 'One', Journal A, 1(1), pp 1-2.\n\n\
            Brown B (2002), 'Two',\nJournal B, 2(2), pp 3-4.";
        let chunks = split_author_year(section, &harvard_start());
        assert_eq!(chunks, default_split(section));
        assert_eq!(
            chunks,
            vec![
                "Adams A (2001), 'One', Journal A, 1(1), pp 1-2.",
                "Brown B (2002), 'Two', Journal B, 2(2), pp 3-4."
            ]
        );
    }
}
