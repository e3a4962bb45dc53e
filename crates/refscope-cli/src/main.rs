use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use refscope_core::config_file::{self, ConfigFile};
use refscope_core::{CitationStyle, ExtractionResult};
use refscope_ingest::{FallbackBackend, backend_from_config};
use refscope_parsing::{ParsingConfigBuilder, ReferenceExtractor};
use refscope_verify::{VerificationResult, Verifier, VerifyConfig};

mod output;

use output::ColorMode;

/// Extract, classify and verify the reference list of an academic PDF
#[derive(Parser, Debug)]
#[command(name = "refscope", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract structured references from a PDF into JSON
    Extract {
        /// Path to the PDF manuscript
        pdf_path: PathBuf,

        /// Output JSON path (default: <stem>_references.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip detection and parse in this style (apa, ieee, vancouver, harvard, chicago)
        #[arg(long)]
        style: Option<CitationStyle>,

        /// Print the parsed references instead of writing JSON
        #[arg(long)]
        dry_run: bool,
    },

    /// Score every citation style against a PDF's reference list
    Detect {
        /// Path to the PDF manuscript
        pdf_path: PathBuf,
    },

    /// Verify an extraction JSON against CrossRef and Semantic Scholar
    Verify {
        /// Path to a <stem>_references.json file
        json_path: PathBuf,

        /// Output JSON path (default: <stem>_verified.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only query CrossRef
        #[arg(long)]
        no_semantic_scholar: bool,

        /// Contact address for CrossRef's polite pool
        #[arg(long)]
        crossref_mailto: Option<String>,

        /// Semantic Scholar API key
        #[arg(long)]
        s2_api_key: Option<String>,
    },

    /// Extract and verify in one go
    Run {
        /// Path to the PDF manuscript
        pdf_path: PathBuf,

        /// Directory for the JSON outputs
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Skip detection and parse in this style
        #[arg(long)]
        style: Option<CitationStyle>,

        /// Only query CrossRef
        #[arg(long)]
        no_semantic_scholar: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color = ColorMode(!cli.no_color);
    let file_config = config_file::load_config();

    match cli.command {
        Command::Extract {
            pdf_path,
            output,
            style,
            dry_run,
        } => extract(&pdf_path, output, style, dry_run, &file_config, color),
        Command::Detect { pdf_path } => detect(&pdf_path, &file_config, color),
        Command::Verify {
            json_path,
            output,
            no_semantic_scholar,
            crossref_mailto,
            s2_api_key,
        } => {
            let config = verify_config(
                &file_config,
                crossref_mailto.or_else(|| std::env::var("CROSSREF_MAILTO").ok()),
                s2_api_key.or_else(|| std::env::var("S2_API_KEY").ok()),
                no_semantic_scholar,
            );
            verify(&json_path, output, &config, color).await
        }
        Command::Run {
            pdf_path,
            output_dir,
            style,
            no_semantic_scholar,
        } => {
            let config = verify_config(
                &file_config,
                std::env::var("CROSSREF_MAILTO").ok(),
                std::env::var("S2_API_KEY").ok(),
                no_semantic_scholar,
            );
            run(&pdf_path, &output_dir, style, &file_config, &config, color).await
        }
    }
}

/// Logs go to stderr so JSON and summaries on stdout stay clean.
fn init_logging(verbose: bool) {
    let default = if verbose { "refscope=debug" } else { "refscope=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the forced style: CLI flag > `REFSCOPE_STYLE` > config file.
fn resolve_style(
    flag: Option<CitationStyle>,
    env: Option<String>,
    file: Option<&str>,
) -> anyhow::Result<Option<CitationStyle>> {
    if flag.is_some() {
        return Ok(flag);
    }
    if let Some(value) = env.filter(|v| !v.trim().is_empty()) {
        return Ok(Some(value.parse::<CitationStyle>().map_err(|e| {
            anyhow::anyhow!("REFSCOPE_STYLE: {}", e)
        })?));
    }
    match file {
        Some(value) => Ok(Some(value.parse::<CitationStyle>().map_err(|e| {
            anyhow::anyhow!("config [parsing].style: {}", e)
        })?)),
        None => Ok(None),
    }
}

fn build_extractor(
    file_config: &ConfigFile,
    style: Option<CitationStyle>,
) -> anyhow::Result<ReferenceExtractor> {
    let parsing = file_config.parsing.clone().unwrap_or_default();
    let style = resolve_style(
        style,
        std::env::var("REFSCOPE_STYLE").ok(),
        parsing.style.as_deref(),
    )?;

    let mut builder = ParsingConfigBuilder::new();
    if let Some(ref pattern) = parsing.section_header_re {
        builder = builder.section_header_regex(pattern);
    }
    if let Some(fraction) = parsing.fallback_fraction {
        builder = builder.fallback_fraction(fraction);
    }
    if let Some(n) = parsing.sample_size {
        builder = builder.sample_size(n);
    }
    if let Some(style) = style {
        builder = builder.style(style);
    }

    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("invalid [parsing].section_header_re: {}", e))?;
    Ok(ReferenceExtractor::with_config(config))
}

fn build_backend(file_config: &ConfigFile) -> FallbackBackend {
    backend_from_config(&file_config.pdf.clone().unwrap_or_default())
}

/// Resolve verification settings: flags > env vars > config file > defaults.
fn verify_config(
    file_config: &ConfigFile,
    crossref_mailto: Option<String>,
    s2_api_key: Option<String>,
    no_semantic_scholar: bool,
) -> VerifyConfig {
    let mut config = match file_config.verify {
        Some(ref section) => VerifyConfig::default().merge_file(section),
        None => VerifyConfig::default(),
    };
    if crossref_mailto.is_some() {
        config.crossref_mailto = crossref_mailto;
    }
    if s2_api_key.is_some() {
        config.s2_api_key = s2_api_key;
    }
    if no_semantic_scholar {
        config.use_semantic_scholar = false;
    }
    config
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `paper.pdf` -> `paper_references.json`, next to the working directory.
fn references_path(pdf_path: &Path) -> PathBuf {
    PathBuf::from(format!("{}_references.json", file_stem(pdf_path)))
}

/// `paper_references.json` -> `paper_verified.json`.
fn verified_path(json_path: &Path) -> PathBuf {
    let stem = file_stem(json_path);
    let stem = stem.strip_suffix("_references").unwrap_or(&stem);
    PathBuf::from(format!("{}_verified.json", stem))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path.display(), e))?;
    Ok(())
}

fn extract_from_pdf(
    pdf_path: &Path,
    file_config: &ConfigFile,
    style: Option<CitationStyle>,
) -> anyhow::Result<ExtractionResult> {
    if !pdf_path.exists() {
        anyhow::bail!("File not found: {}", pdf_path.display());
    }
    let extractor = build_extractor(file_config, style)?;
    let backend = build_backend(file_config);
    Ok(refscope_ingest::extract_references_with(
        pdf_path, &backend, &extractor,
    )?)
}

fn extract(
    pdf_path: &Path,
    output: Option<PathBuf>,
    style: Option<CitationStyle>,
    dry_run: bool,
    file_config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    let result = extract_from_pdf(pdf_path, file_config, style)?;
    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());

    if dry_run {
        output::print_dry_run(&mut writer, &file_name(pdf_path), &result, color)?;
        return Ok(());
    }

    let output = output.unwrap_or_else(|| references_path(pdf_path));
    write_json(&output, &result)?;
    output::print_extraction_summary(
        &mut writer,
        &file_name(pdf_path),
        &result,
        Some(output.as_path()),
        color,
    )?;
    Ok(())
}

fn detect(pdf_path: &Path, file_config: &ConfigFile, color: ColorMode) -> anyhow::Result<()> {
    if !pdf_path.exists() {
        anyhow::bail!("File not found: {}", pdf_path.display());
    }
    // Scores are always computed; a forced style only changes the choice.
    let extractor = build_extractor(file_config, None)?;
    let backend = build_backend(file_config);
    let doc = refscope_ingest::parse_pdf_with(pdf_path, &backend, &extractor)?;

    let region = extractor.reference_region(&doc);
    let scores = extractor.score_styles(region);
    let chosen = extractor.detect_style(region);

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    output::print_style_scores(&mut writer, &file_name(pdf_path), &scores, chosen, color)?;
    Ok(())
}

async fn verify_extraction(
    extraction: &ExtractionResult,
    config: &VerifyConfig,
    color: ColorMode,
) -> anyhow::Result<VerificationResult> {
    let verifier = Verifier::new(config)?;
    let bar = output::verification_progress(extraction.references.len(), color);
    let result = verifier
        .verify_all(extraction, |_, _, r| {
            bar.set_message(format!("{} {}", r.ref_id, r.status));
            bar.inc(1);
        })
        .await;
    bar.finish_and_clear();
    Ok(result)
}

async fn verify(
    json_path: &Path,
    output: Option<PathBuf>,
    config: &VerifyConfig,
    color: ColorMode,
) -> anyhow::Result<()> {
    if !json_path.exists() {
        anyhow::bail!("File not found: {}", json_path.display());
    }
    let content = std::fs::read_to_string(json_path)?;
    let extraction: ExtractionResult = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{} is not an extraction result: {}", json_path.display(), e))?;

    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    if extraction.references.is_empty() {
        writeln!(writer, "No references to verify.")?;
        return Ok(());
    }

    let result = verify_extraction(&extraction, config, color).await?;
    let output = output.unwrap_or_else(|| verified_path(json_path));
    write_json(&output, &result)?;
    output::print_verification_summary(&mut writer, &result, Some(output.as_path()), color)?;
    Ok(())
}

async fn run(
    pdf_path: &Path,
    output_dir: &Path,
    style: Option<CitationStyle>,
    file_config: &ConfigFile,
    config: &VerifyConfig,
    color: ColorMode,
) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = Box::new(std::io::stdout());
    std::fs::create_dir_all(output_dir)?;

    writeln!(writer, "Stage 1: Extracting references...")?;
    let extraction = extract_from_pdf(pdf_path, file_config, style)?;
    let references_out = output_dir.join(references_path(pdf_path));
    write_json(&references_out, &extraction)?;
    output::print_extraction_summary(
        &mut writer,
        &file_name(pdf_path),
        &extraction,
        Some(references_out.as_path()),
        color,
    )?;

    if extraction.references.is_empty() {
        writeln!(writer, "No references to verify.")?;
        return Ok(());
    }

    writeln!(writer, "Stage 2: Verifying references online...")?;
    let verification = verify_extraction(&extraction, config, color).await?;
    let verified_out = output_dir.join(verified_path(&references_out));
    write_json(&verified_out, &verification)?;
    output::print_verification_summary(&mut writer, &verification, Some(verified_out.as_path()), color)?;
    Ok(())
}
