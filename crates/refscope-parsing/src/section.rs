use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;

/// Standalone reference-list heading: the line holds nothing but the heading
/// word(s), optionally after a stray leading period.
pub(crate) static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*\.?[ \t]*(?:references|bibliography|works[ \t]+cited|literature[ \t]+cited|citations)[ \t]*\r?$",
    )
    .unwrap()
});

/// Split document text into `(body, reference_section)`.
///
/// The **last** standalone heading wins, so a table-of-contents entry earlier
/// in the document does not truncate the reference list. The heading itself
/// belongs to neither part. Without a heading the whole text is the body and
/// the reference section is empty; callers decide on a fallback region.
pub fn split_reference_section(text: &str) -> (String, String) {
    split_reference_section_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`split_reference_section`].
pub(crate) fn split_reference_section_with_config(
    text: &str,
    config: &ParsingConfig,
) -> (String, String) {
    let heading_re = config.section_header_re.as_ref().unwrap_or(&HEADING_RE);

    match heading_re.find_iter(text).last() {
        Some(m) => (
            text[..m.start()].trim().to_string(),
            text[m.end()..].trim().to_string(),
        ),
        None => {
            tracing::warn!("no reference section heading found");
            (text.to_string(), String::new())
        }
    }
}

/// The tail of the document starting at `fraction` of its length.
///
/// Used as the reference region when no heading is found. The cut is moved
/// forward to the next line start so the region never begins mid-line.
pub fn fallback_region(text: &str, fraction: f64) -> &str {
    let fraction = fraction.clamp(0.0, 1.0);
    let cutoff = (text.len() as f64 * fraction) as usize;
    // Don't split in the middle of a UTF-8 codepoint
    let cutoff = text
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| i >= cutoff)
        .unwrap_or(text.len());
    let start = if cutoff == 0 {
        0
    } else {
        text[cutoff..]
            .find('\n')
            .map(|i| cutoff + i + 1)
            .unwrap_or(cutoff)
    };
    text[start..].trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsingConfigBuilder;

    #[test]
    fn test_basic_split() {
        let (body, refs) = split_reference_section("Body.\n\nReferences\n\nRef 1.\nRef 2.");
        assert_eq!(body, "Body.");
        assert!(refs.contains("Ref 1."));
        assert!(refs.contains("Ref 2."));
        assert!(!body.contains("References"));
        assert!(!refs.contains("References"));
    }

    #[test]
    fn test_heading_vocabulary() {
        for heading in ["Bibliography", "Works Cited", "Literature  Cited", "Citations", ". REFERENCES"] {
            let text = format!("Some content.\n\n{heading}\n\nAuthor (2021).");
            let (body, refs) = split_reference_section(&text);
            assert_eq!(body, "Some content.", "heading {heading:?}");
            assert_eq!(refs, "Author (2021).", "heading {heading:?}");
        }
    }

    #[test]
    fn test_case_insensitive() {
        let (body, refs) = split_reference_section("Body.\n\nREFERENCES\n\nRef here.");
        assert_eq!(body, "Body.");
        assert_eq!(refs, "Ref here.");
    }

    #[test]
    fn test_last_heading_wins() {
        let text = "Contents\nReferences\nIntroduction\nWe cite [1].\nReferences\n[1] A. Author, \"T,\" 2020.";
        let (body, refs) = split_reference_section(text);
        assert!(body.contains("We cite [1]."));
        assert_eq!(refs, "[1] A. Author, \"T,\" 2020.");
    }

    #[test]
    fn test_toc_line_with_page_number_is_not_a_heading() {
        let text = "Contents\nReferences...page 10\nBody text.\n\nReferences\nRef 1.";
        let (body, refs) = split_reference_section(text);
        assert!(body.contains("References...page 10"));
        assert_eq!(refs, "Ref 1.");
    }

    #[test]
    fn test_heading_inside_sentence_is_ignored() {
        let (body, refs) = split_reference_section("See the references below for details.");
        assert_eq!(body, "See the references below for details.");
        assert_eq!(refs, "");
    }

    #[test]
    fn test_crlf_line_endings() {
        let (body, refs) = split_reference_section("Body.\r\nReferences\r\nRef 1.");
        assert_eq!(body, "Body.");
        assert_eq!(refs, "Ref 1.");
    }

    #[test]
    fn test_no_heading() {
        let (body, refs) = split_reference_section("Just body text.");
        assert_eq!(body, "Just body text.");
        assert_eq!(refs, "");
    }

    #[test]
    fn test_custom_heading_regex() {
        let config = ParsingConfigBuilder::new()
            .section_header_regex(r"(?im)^\s*Bibliografía\s*$")
            .build()
            .unwrap();
        let (body, refs) =
            split_reference_section_with_config("Texto.\nBibliografía\nRef 1.", &config);
        assert_eq!(body, "Texto.");
        assert_eq!(refs, "Ref 1.");
    }

    #[test]
    fn test_fallback_region_takes_tail_from_line_start() {
        let text = "line one\nline two\nline three\nline four\nline five";
        let region = fallback_region(text, 0.8);
        assert_eq!(region, "line five");
        assert_eq!(fallback_region(text, 0.0), text);
        assert_eq!(fallback_region("", 0.8), "");
    }
}
