use std::io::Write;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use refscope_core::{CitationStyle, ExtractionResult};
use refscope_verify::{VerificationResult, VerificationStatus};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

/// Print the summary after extraction.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    pdf_name: &str,
    result: &ExtractionResult,
    output: Option<&Path>,
    color: ColorMode,
) -> std::io::Result<()> {
    let style = result
        .style()
        .map(|s| s.to_string())
        .unwrap_or_else(|| result.model_used.clone());

    if color.enabled() {
        writeln!(
            w,
            "Extracted {} references from {} ({} style)",
            result.references.len().to_string().bold(),
            pdf_name.bold(),
            style.cyan()
        )?;
    } else {
        writeln!(
            w,
            "Extracted {} references from {} ({} style)",
            result.references.len(),
            pdf_name,
            style
        )?;
    }

    if !result.unparsed.is_empty() {
        let ids: Vec<&str> = result.unparsed.iter().map(|u| u.id.as_str()).collect();
        let msg = format!(
            "{} chunks could not be parsed: {}",
            result.unparsed.len(),
            ids.join(", ")
        );
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }

    if let Some(path) = output {
        writeln!(w, "Wrote {}", path.display())?;
    }
    Ok(())
}

/// Print every parsed reference and every unparsed chunk, without writing files.
pub fn print_dry_run(
    w: &mut dyn Write,
    pdf_name: &str,
    result: &ExtractionResult,
    color: ColorMode,
) -> std::io::Result<()> {
    let style = result.style().map(|s| s.to_string()).unwrap_or_default();
    if color.enabled() {
        writeln!(
            w,
            "{} {} ({} references, {} style)\n",
            "DRY RUN:".bold().cyan(),
            pdf_name.bold(),
            result.references.len(),
            style
        )?;
    } else {
        writeln!(
            w,
            "DRY RUN: {} ({} references, {} style)\n",
            pdf_name,
            result.references.len(),
            style
        )?;
    }

    for reference in &result.references {
        if color.enabled() {
            writeln!(w, "{}", format!("[{}]", reference.id).bold().yellow())?;
        } else {
            writeln!(w, "[{}]", reference.id)?;
        }
        writeln!(w, "  Title:   {}", reference.title)?;
        writeln!(
            w,
            "  Authors: {}",
            if reference.authors.is_empty() {
                "(none)".to_string()
            } else {
                reference.authors.join("; ")
            }
        )?;
        if let Some(year) = reference.year {
            writeln!(w, "  Year:    {}", year)?;
        }
        if let Some(ref journal) = reference.journal {
            writeln!(w, "  Journal: {}", journal)?;
        }
        match (&reference.volume, &reference.pages) {
            (Some(v), Some(p)) => writeln!(w, "  Volume:  {} (pp. {})", v, p)?,
            (Some(v), None) => writeln!(w, "  Volume:  {}", v)?,
            (None, Some(p)) => writeln!(w, "  Pages:   {}", p)?,
            (None, None) => {}
        }
        if let Some(ref doi) = reference.doi {
            writeln!(w, "  DOI:     {}", doi)?;
        }
        let raw = truncate(&reference.raw_text.split_whitespace().collect::<Vec<_>>().join(" "), 200);
        if color.enabled() {
            writeln!(w, "  Raw:     {}", raw.dimmed())?;
        } else {
            writeln!(w, "  Raw:     {}", raw)?;
        }
        writeln!(w)?;
    }

    for chunk in &result.unparsed {
        let raw = truncate(&chunk.raw_text.split_whitespace().collect::<Vec<_>>().join(" "), 200);
        if color.enabled() {
            writeln!(w, "{} {}", format!("[{}]", chunk.id).bold().red(), "UNPARSED".red())?;
        } else {
            writeln!(w, "[{}] UNPARSED", chunk.id)?;
        }
        writeln!(w, "  Raw:     {}", raw)?;
        writeln!(w)?;
    }

    writeln!(
        w,
        "Total: {} parsed, {} unparsed",
        result.references.len(),
        result.unparsed.len()
    )?;
    Ok(())
}

/// Print the per-style score table, marking the chosen style.
pub fn print_style_scores(
    w: &mut dyn Write,
    pdf_name: &str,
    scores: &[(CitationStyle, f64)],
    chosen: CitationStyle,
    color: ColorMode,
) -> std::io::Result<()> {
    header(w, &format!("CITATION STYLE: {}", pdf_name), color)?;
    for (style, score) in scores {
        let bar = "#".repeat((score * 40.0).round() as usize);
        let line = format!("  {:<10} {:.3}  {}", style.as_str(), score, bar);
        if *style == chosen {
            if color.enabled() {
                writeln!(w, "{}", line.green().bold())?;
            } else {
                writeln!(w, "{}  <-", line)?;
            }
        } else if color.enabled() {
            writeln!(w, "{}", line.dimmed())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }
    writeln!(w)?;
    writeln!(w, "Detected style: {}", chosen)?;
    Ok(())
}

/// A progress bar over `total` references, drawn on stderr.
pub fn verification_progress(total: usize, color: ColorMode) -> ProgressBar {
    let template = if color.enabled() {
        "{spinner:.cyan} Verifying [{bar:40.cyan/dim}] {pos}/{len} {msg}"
    } else {
        "Verifying [{bar:40}] {pos}/{len} {msg}"
    };
    let bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Print the verification summary and every reference that did not verify.
pub fn print_verification_summary(
    w: &mut dyn Write,
    result: &VerificationResult,
    output: Option<&Path>,
    color: ColorMode,
) -> std::io::Result<()> {
    let doubtful: Vec<_> = result
        .references
        .iter()
        .filter(|r| r.status != VerificationStatus::Verified)
        .collect();

    if !doubtful.is_empty() {
        writeln!(w)?;
        for r in &doubtful {
            let label = match r.status {
                VerificationStatus::Ambiguous => "AMBIGUOUS",
                _ => "NOT FOUND",
            };
            let title = r.canonical_title.as_deref().unwrap_or("");
            let detail = if title.is_empty() {
                r.notes.clone().unwrap_or_default()
            } else {
                format!("closest match: \"{}\"", truncate(title, 70))
            };
            if color.enabled() {
                let label = match r.status {
                    VerificationStatus::Ambiguous => label.yellow().to_string(),
                    _ => label.red().to_string(),
                };
                writeln!(w, "  [{}] {} ({:.2}) {}", r.ref_id, label, r.confidence, detail.dimmed())?;
            } else {
                writeln!(w, "  [{}] {} ({:.2}) {}", r.ref_id, label, r.confidence, detail)?;
            }
        }
    }

    writeln!(w)?;
    header(w, "VERIFICATION SUMMARY", color)?;
    let stats = &result.stats;
    writeln!(w, "  References checked: {}", stats.total)?;
    if color.enabled() {
        writeln!(w, "  {} {}", "Verified:".green(), stats.verified)?;
        writeln!(w, "  {} {}", "Ambiguous:".yellow(), stats.ambiguous)?;
        writeln!(w, "  {} {}", "Not found:".red(), stats.not_found)?;
    } else {
        writeln!(w, "  Verified: {}", stats.verified)?;
        writeln!(w, "  Ambiguous: {}", stats.ambiguous)?;
        writeln!(w, "  Not found: {}", stats.not_found)?;
    }
    if let Some(path) = output {
        writeln!(w)?;
        writeln!(w, "Wrote {}", path.display())?;
    }
    writeln!(w)?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
