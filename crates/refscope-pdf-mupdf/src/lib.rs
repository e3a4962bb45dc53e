use std::path::Path;

use mupdf::{Document, Quad, TextPageFlags};

use refscope_core::{BackendError, ColumnLayout, PageWords, PdfBackend, Word};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// Kept in its own crate so that builds without the `pdf` feature of
/// `refscope-ingest` never link mupdf.
///
/// Pages are read as positioned words. Each page is split at its column gap
/// (see [`ColumnLayout`]) before words are regrouped into lines.
///
/// Blocks in the top 4% and bottom 5% of a page are dropped, which keeps
/// running heads and page numbers out of references that cross a page break.
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    /// Default 0.05. `None` disables footer exclusion.
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    /// Default 0.04. `None` disables header exclusion.
    header_exclusion_ratio: Option<f32>,
    layout: ColumnLayout,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            footer_exclusion_ratio: Some(0.05),
            header_exclusion_ratio: Some(0.04),
            layout: ColumnLayout::default(),
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    /// Histogram bin width for column-gap detection, in page units.
    pub fn with_column_bin_width(mut self, width: f32) -> Self {
        if width > 0.0 {
            self.layout.bin_width = width;
        }
        self
    }

    /// Maximum gap-bin density relative to the page average.
    pub fn with_column_gap_density(mut self, density: f32) -> Self {
        if density > 0.0 {
            self.layout.max_gap_density = density;
        }
        self
    }

    /// Replace the whole column layout configuration.
    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }
}

fn quad_bounds(q: &Quad) -> (f32, f32, f32, f32) {
    (
        q.ul.x.min(q.ll.x),
        q.ul.y.min(q.ur.y),
        q.ur.x.max(q.lr.x),
        q.ll.y.max(q.lr.y),
    )
}

/// Accumulates characters of one line into whitespace-separated words.
#[derive(Default)]
struct WordBuilder {
    text: String,
    bounds: Option<(f32, f32, f32, f32)>,
}

impl WordBuilder {
    fn push(&mut self, c: char, (x0, y0, x1, y1): (f32, f32, f32, f32)) {
        self.text.push(c);
        self.bounds = Some(match self.bounds {
            None => (x0, y0, x1, y1),
            Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
        });
    }

    fn finish(&mut self, words: &mut Vec<Word>) {
        if let Some((x0, y0, x1, y1)) = self.bounds.take() {
            words.push(Word::new(std::mem::take(&mut self.text), x0, y0, x1, y1));
        }
        self.text.clear();
    }
}

impl PdfBackend for MupdfBackend {
    fn name(&self) -> &str {
        "mupdf"
    }

    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages_text = Vec::new();

        for (page_no, page_result) in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            .enumerate()
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let page_bounds = page
                .bounds()
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let page_height = page_bounds.y1 - page_bounds.y0;

            let header_threshold = self
                .header_exclusion_ratio
                .map(|r| page_bounds.y0 + page_height * r);
            let footer_threshold = self
                .footer_exclusion_ratio
                .map(|r| page_bounds.y1 - page_height * r);

            let mut words = Vec::new();
            for block in text_page.blocks() {
                let block_bounds = block.bounds();

                // Skip blocks entirely within the header region
                if header_threshold.is_some_and(|t| block_bounds.y1 <= t) {
                    continue;
                }
                // Skip blocks whose top edge is in the footer region
                if footer_threshold.is_some_and(|t| block_bounds.y0 >= t) {
                    continue;
                }

                for line in block.lines() {
                    let mut word = WordBuilder::default();
                    for c in line.chars() {
                        let ch = c.char().unwrap_or('\u{FFFD}');
                        if ch.is_whitespace() {
                            word.finish(&mut words);
                            continue;
                        }
                        let (x0, y0, x1, y1) = quad_bounds(&c.quad());
                        word.push(
                            ch,
                            (
                                x0 - page_bounds.x0,
                                y0 - page_bounds.y0,
                                x1 - page_bounds.x0,
                                y1 - page_bounds.y0,
                            ),
                        );
                    }
                    word.finish(&mut words);
                }
            }

            let page_words = PageWords {
                width: page_bounds.x1 - page_bounds.x0,
                height: page_height,
                words,
            };
            tracing::trace!(page = page_no + 1, words = page_words.words.len(), "page words");
            pages_text.push(self.layout.linearize(&page_words));
        }

        Ok(pages_text.join("\n\n"))
    }
}
