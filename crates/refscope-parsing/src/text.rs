use unicode_normalization::UnicodeNormalization;

/// Map typographic punctuation to its ASCII equivalent.
///
/// Returns `None` for characters that should be dropped entirely.
fn ascii_punctuation(c: char) -> Option<char> {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => Some('\''),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => Some('"'),
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => Some('-'),
        '\u{00A0}' | '\u{2007}' | '\u{2009}' | '\u{202F}' => Some(' '),
        // soft hyphen, zero-width space/joiners, BOM
        '\u{00AD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => None,
        '\r' => None,
        other => Some(other),
    }
}

/// Normalize extracted PDF text for pattern matching.
///
/// Applies NFKC (which expands the `ﬁ`/`ﬂ`/`ﬀ` ligature code points and
/// compatibility spaces), then rewrites curly quotes to straight quotes and
/// en/em dashes to hyphens. Downstream patterns match on ASCII punctuation
/// only, so this must run before isolation and parsing.
pub fn normalize_text(text: &str) -> String {
    text.nfkc().filter_map(ascii_punctuation).collect()
}

/// Collapse line breaks (and the whitespace around them) to single spaces.
pub fn unwrap_lines(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
