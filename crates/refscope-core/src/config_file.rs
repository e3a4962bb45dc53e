use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub parsing: Option<ParsingSection>,
    pub pdf: Option<PdfSection>,
    pub verify: Option<VerifySection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingSection {
    /// Force a citation style instead of detecting one.
    pub style: Option<String>,
    /// Regex overriding the reference heading vocabulary.
    pub section_header_re: Option<String>,
    /// Where the fallback region starts, as a fraction of the document.
    pub fallback_fraction: Option<f64>,
    pub sample_size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfSection {
    pub header_ratio: Option<f32>,
    pub footer_ratio: Option<f32>,
    pub column_bin_width: Option<f32>,
    pub column_gap_density: Option<f32>,
    /// Minimum space-to-character ratio before the secondary backend is tried.
    pub min_space_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifySection {
    pub crossref_mailto: Option<String>,
    pub s2_api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub confidence_threshold: Option<f64>,
    pub use_semantic_scholar: Option<bool>,
}

/// Platform config directory path: `<config_dir>/refscope/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("refscope").join("config.toml"))
}

/// Load config by cascading CWD `.refscope.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".refscope.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match read_config(path) {
        Ok(config) => Some(config),
        Err(ConfigError::Io(_)) => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
            None
        }
    }
}

/// Read a config file, reporting why it could not be used.
pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bp = base.parsing.unwrap_or_default();
    let op = overlay.parsing.unwrap_or_default();
    let bd = base.pdf.unwrap_or_default();
    let od = overlay.pdf.unwrap_or_default();
    let bv = base.verify.unwrap_or_default();
    let ov = overlay.verify.unwrap_or_default();

    ConfigFile {
        parsing: Some(ParsingSection {
            style: op.style.or(bp.style),
            section_header_re: op.section_header_re.or(bp.section_header_re),
            fallback_fraction: op.fallback_fraction.or(bp.fallback_fraction),
            sample_size: op.sample_size.or(bp.sample_size),
        }),
        pdf: Some(PdfSection {
            header_ratio: od.header_ratio.or(bd.header_ratio),
            footer_ratio: od.footer_ratio.or(bd.footer_ratio),
            column_bin_width: od.column_bin_width.or(bd.column_bin_width),
            column_gap_density: od.column_gap_density.or(bd.column_gap_density),
            min_space_ratio: od.min_space_ratio.or(bd.min_space_ratio),
        }),
        verify: Some(VerifySection {
            crossref_mailto: ov.crossref_mailto.or(bv.crossref_mailto),
            s2_api_key: ov.s2_api_key.or(bv.s2_api_key),
            timeout_secs: ov.timeout_secs.or(bv.timeout_secs),
            confidence_threshold: ov.confidence_threshold.or(bv.confidence_threshold),
            use_semantic_scholar: ov.use_semantic_scholar.or(bv.use_semantic_scholar),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_parses() {
        let toml_str = "[parsing]\nstyle = \"ieee\"\n\n[verify]\ntimeout_secs = 10\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.parsing.unwrap().style.as_deref(), Some("ieee"));
        assert_eq!(parsed.verify.unwrap().timeout_secs, Some(10));
        assert!(parsed.pdf.is_none());
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = ConfigFile {
            verify: Some(VerifySection {
                crossref_mailto: Some("base@example.org".into()),
                s2_api_key: Some("base-key".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            verify: Some(VerifySection {
                crossref_mailto: Some("me@example.org".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).verify.unwrap();
        assert_eq!(merged.crossref_mailto.as_deref(), Some("me@example.org"));
        assert_eq!(merged.s2_api_key.as_deref(), Some("base-key"));
    }

    #[test]
    fn test_merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            pdf: Some(PdfSection {
                min_space_ratio: Some(0.1),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.pdf.unwrap().min_space_ratio, Some(0.1));
    }

    #[test]
    fn test_read_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pdf]\nheader_ratio = 0.06\n").unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(config.pdf.unwrap().header_ratio, Some(0.06));
    }

    #[test]
    fn test_invalid_file_is_an_error_but_skipped_by_cascade() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[parsing\nstyle = ").unwrap();
        assert!(matches!(read_config(&path), Err(ConfigError::Toml(_))));
        assert!(load_from_path(&path).is_none());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("absent.toml")).is_none());
        assert!(matches!(
            read_config(&dir.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
