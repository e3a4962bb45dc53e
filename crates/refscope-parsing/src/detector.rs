use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::CitationStyle;

use crate::config::ParsingConfig;
use crate::styles::all_parsers;

/// Group a reference section into candidate chunks for scoring.
///
/// A chunk starts at a line opening with `[n]` or `n. ` and ends at the next
/// such line or a blank line. With fewer than two chunks, blank-line
/// paragraphs are tried, then single lines.
pub fn sample_references(section: &str) -> Vec<String> {
    static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\[\d+\]|\d{1,3}\.\s)").unwrap());

    let section = section.trim();
    let mut samples = Vec::new();
    let mut current = String::new();

    for line in section.lines().map(str::trim) {
        if line.is_empty() || NUMBERED_RE.is_match(line) {
            if !current.is_empty() {
                samples.push(std::mem::take(&mut current));
            }
            current.push_str(line);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        samples.push(current);
    }

    if samples.len() < 2 {
        samples = section
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
    }
    if samples.len() < 2 {
        samples = section
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
    }
    samples
}

/// Mean score of every style over the first sampled chunks, in priority order.
///
/// All scores are zero when the section yields no samples.
pub fn score_styles(section: &str) -> Vec<(CitationStyle, f64)> {
    score_styles_with_config(section, &ParsingConfig::default())
}

/// Config-aware version of [`score_styles`].
pub(crate) fn score_styles_with_config(
    section: &str,
    config: &ParsingConfig,
) -> Vec<(CitationStyle, f64)> {
    let samples = sample_references(section);
    let samples = &samples[..samples.len().min(config.sample_size.max(1))];

    all_parsers(&config.weights)
        .iter()
        .map(|parser| {
            let total: f64 = samples.iter().map(|s| parser.score_match(s)).sum();
            let mean = if samples.is_empty() {
                0.0
            } else {
                total / samples.len() as f64
            };
            (parser.style(), mean)
        })
        .collect()
}

/// Detect the citation style of a reference section.
///
/// The style with the highest mean score wins; ties go to the earlier style
/// in [`CitationStyle::ALL`]. An empty section defaults to APA.
pub fn detect_style(section: &str) -> CitationStyle {
    detect_style_with_config(section, &ParsingConfig::default())
}

/// Config-aware version of [`detect_style`].
pub(crate) fn detect_style_with_config(section: &str, config: &ParsingConfig) -> CitationStyle {
    if sample_references(section).is_empty() {
        tracing::warn!("no reference samples found, defaulting to APA");
        return CitationStyle::Apa;
    }

    let scores = score_styles_with_config(section, config);
    let mut best = (CitationStyle::Apa, f64::MIN);
    for &(style, score) in &scores {
        if score > best.1 {
            best = (style, score);
        }
    }

    tracing::info!(style = %best.0, scores = ?scores, "detected citation style");
    best.0
}
