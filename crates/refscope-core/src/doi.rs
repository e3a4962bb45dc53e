use once_cell::sync::Lazy;
use regex::Regex;

/// Strip trailing punctuation and unbalanced closing brackets from a DOI.
fn clean_doi(doi: &str) -> String {
    let mut doi = doi.trim_end_matches(['.', ',', ';', ':']);

    for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
        while doi.ends_with(close) && doi.matches(close).count() > doi.matches(open).count() {
            doi = &doi[..doi.len() - 1];
            doi = doi.trim_end_matches(['.', ',', ';', ':']);
        }
    }

    doi.to_string()
}

/// Normalize a DOI as written in a reference to its bare form.
///
/// Accepts `10.1086/720277`, `doi:10.1086/720277`, `doi: 10.1086/720277`,
/// `https://doi.org/10.1086/720277` and `http://dx.doi.org/...`, with or
/// without a trailing period. Returns `None` when what remains is not a DOI.
pub fn normalize_doi(raw: &str) -> Option<String> {
    static PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(?:https?://(?:dx\.)?doi\.org/|doi:\s*|doi\s+)").unwrap()
    });

    let trimmed = raw.trim();
    let bare = PREFIX_RE.replace(trimmed, "");
    let doi = clean_doi(bare.trim());

    if doi.starts_with("10.") && doi.contains('/') {
        Some(doi)
    } else {
        None
    }
}

/// Find the first DOI anywhere in a reference string.
///
/// URL forms are preferred over bare identifiers. DOIs broken across a line
/// after a hyphen are rejoined before matching.
pub fn extract_doi(text: &str) -> Option<String> {
    static SPLIT_HYPHEN_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(10\.\d{4,}/[^\s\]>,]+-)\s*\n\s*(\S+)").unwrap());
    let text = SPLIT_HYPHEN_RE.replace_all(text, "$1$2");

    static URL_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)https?://(?:dx\.)?doi\.org/(10\.\d{4,}/[^\s\]>},]+)").unwrap()
    });
    if let Some(caps) = URL_RE.captures(&text) {
        return normalize_doi(&caps[1]);
    }

    static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,}/[^\s\]>},]+").unwrap());
    DOI_RE.find(&text).and_then(|m| normalize_doi(m.as_str()))
}
