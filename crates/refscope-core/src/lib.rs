use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod doi;
pub mod layout;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use doi::{extract_doi, normalize_doi};
pub use layout::{ColumnLayout, PageWords, Word};

/// A reference parsed out of a manuscript's reference list.
///
/// Records are produced once per extraction run and never mutated afterwards;
/// verification attaches separate records keyed by [`Reference::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Stable per-document key (`ref_01`, `ref_02`, ...), assigned in document order.
    pub id: String,
    /// Author names as written in the reference.
    pub authors: Vec<String>,
    pub title: String,
    pub year: Option<i32>,
    /// Journal or venue name.
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub pages: Option<String>,
    /// Bare DOI (no `https://doi.org/` or `doi:` prefix).
    pub doi: Option<String>,
    /// The exact reference chunk this record was parsed from.
    pub raw_text: String,
}

/// A reference chunk that no pattern of the active style could decompose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnparsedReference {
    /// The id the chunk would have received.
    pub id: String,
    pub raw_text: String,
}

/// Result of extracting references from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub source_pdf: String,
    pub references: Vec<Reference>,
    /// Chunks at positions that produced no reference.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unparsed: Vec<UnparsedReference>,
    /// `regex:<style>`, naming the parser that produced the data.
    pub model_used: String,
}

impl ExtractionResult {
    /// The citation style encoded in `model_used`, if any.
    pub fn style(&self) -> Option<CitationStyle> {
        self.model_used
            .strip_prefix("regex:")
            .and_then(|s| s.parse().ok())
    }
}

/// Normalized document text split into body and reference list.
///
/// If no reference heading was found, `reference_section` is empty and
/// `body_text == full_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub full_text: String,
    pub reference_section: String,
    pub body_text: String,
}

/// The supported citation styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    Apa,
    Ieee,
    Vancouver,
    Harvard,
    Chicago,
}

impl CitationStyle {
    /// All styles in priority order. Detection ties resolve to the earlier entry.
    pub const ALL: [CitationStyle; 5] = [
        CitationStyle::Apa,
        CitationStyle::Ieee,
        CitationStyle::Vancouver,
        CitationStyle::Harvard,
        CitationStyle::Chicago,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStyle::Apa => "apa",
            CitationStyle::Ieee => "ieee",
            CitationStyle::Vancouver => "vancouver",
            CitationStyle::Harvard => "harvard",
            CitationStyle::Chicago => "chicago",
        }
    }

    /// The `model_used` tag recorded alongside references parsed in this style.
    pub fn model_tag(&self) -> String {
        format!("regex:{}", self.as_str())
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown citation style: {0} (expected apa, ieee, vancouver, harvard or chicago)")]
pub struct UnknownStyle(pub String);

impl FromStr for CitationStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apa" => Ok(CitationStyle::Apa),
            "ieee" => Ok(CitationStyle::Ieee),
            "vancouver" | "ama" => Ok(CitationStyle::Vancouver),
            "harvard" => Ok(CitationStyle::Harvard),
            "chicago" => Ok(CitationStyle::Chicago),
            other => Err(UnknownStyle(other.to_string())),
        }
    }
}

/// Format the sequential reference id for a 0-based position.
pub fn reference_id(index: usize) -> String {
    format!("ref_{:02}", index + 1)
}
