//! Page linearization from word boxes.
//!
//! Two-column papers extracted line-by-line interleave the left and right
//! columns. Given word positions, [`ColumnLayout`] looks for a vertical
//! whitespace gap near the middle of the page and, when one exists, emits
//! the left column before the right one.
//!
//! The gap search is a word-center histogram: bins of `bin_width` units
//! span the page, and the middle `search_band` fraction of bins is scanned
//! for a local minimum holding at most `max_gap_density` times the average
//! bin count. A candidate is rejected when too many words straddle it, which
//! is what happens on a single-column page whose words merely left a sparse
//! bin by chance.

/// A word and its bounding box, in page units with the origin at the
/// page's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Word {
    pub fn new(text: impl Into<String>, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            y0,
            x1,
            y1,
        }
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).abs()
    }
}

/// All words of one page.
#[derive(Debug, Clone, Default)]
pub struct PageWords {
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
}

/// Column-gap detection parameters.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    /// Histogram bin width in page units.
    pub bin_width: f32,
    /// Maximum gap-bin count as a fraction of the average bin count.
    pub max_gap_density: f32,
    /// Fraction of bins, centered on the page middle, searched for a gap.
    pub search_band: f32,
    /// Maximum fraction of the page's words allowed to straddle the gap.
    pub max_crossing_ratio: f32,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            bin_width: 10.0,
            max_gap_density: 0.25,
            search_band: 0.4,
            max_crossing_ratio: 0.03,
        }
    }
}

impl ColumnLayout {
    /// Locate the x-coordinate separating two text columns, if any.
    pub fn find_column_gap(&self, page: &PageWords) -> Option<f32> {
        if page.words.is_empty() || page.width <= 0.0 || self.bin_width <= 0.0 {
            return None;
        }

        let n_bins = (page.width / self.bin_width).ceil() as usize;
        if n_bins < 5 {
            return None;
        }

        let mut histogram = vec![0usize; n_bins];
        for word in &page.words {
            let bin = (word.center_x() / self.bin_width).floor();
            if bin >= 0.0 {
                histogram[(bin as usize).min(n_bins - 1)] += 1;
            }
        }

        let average = page.words.len() as f32 / n_bins as f32;
        let threshold = average * self.max_gap_density;

        let band = ((n_bins as f32 * self.search_band) / 2.0).round() as usize;
        let middle = n_bins / 2;
        let lo = middle.saturating_sub(band).max(1);
        let hi = (middle + band).min(n_bins - 2);

        let page_center = page.width / 2.0;
        let mut best: Option<(usize, f32)> = None;
        for i in lo..=hi {
            let count = histogram[i];
            let is_local_min = count <= histogram[i - 1] && count <= histogram[i + 1];
            if !is_local_min || count as f32 > threshold {
                continue;
            }
            let x = (i as f32 + 0.5) * self.bin_width;
            let better = match best {
                None => true,
                Some((best_i, best_x)) => {
                    count < histogram[best_i]
                        || (count == histogram[best_i]
                            && (x - page_center).abs() < (best_x - page_center).abs())
                }
            };
            if better {
                best = Some((i, x));
            }
        }

        let (_, gap_x) = best?;

        let crossing = page
            .words
            .iter()
            .filter(|w| w.x0 < gap_x && w.x1 > gap_x)
            .count();
        if crossing as f32 > page.words.len() as f32 * self.max_crossing_ratio {
            tracing::trace!(gap_x, crossing, "column gap rejected, words straddle it");
            return None;
        }

        let left = page.words.iter().filter(|w| w.center_x() < gap_x).count();
        if left == 0 || left == page.words.len() {
            return None;
        }

        Some(gap_x)
    }

    /// Produce the page text in reading order: the left column, then the
    /// right column, when a gap is found; plain top-to-bottom lines otherwise.
    pub fn linearize(&self, page: &PageWords) -> String {
        match self.find_column_gap(page) {
            Some(gap_x) => {
                tracing::debug!(gap_x, words = page.words.len(), "two-column page");
                let (left, right): (Vec<&Word>, Vec<&Word>) =
                    page.words.iter().partition(|w| w.center_x() < gap_x);
                let mut text = words_to_lines(&left);
                let right_text = words_to_lines(&right);
                if !text.is_empty() && !right_text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&right_text);
                text
            }
            None => words_to_lines(&page.words.iter().collect::<Vec<_>>()),
        }
    }
}

/// Group words into lines by vertical position and join them, top to bottom.
pub fn words_to_lines(words: &[&Word]) -> String {
    let mut sorted: Vec<&Word> = words.to_vec();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut lines: Vec<(f32, f32, Vec<&Word>)> = Vec::new();
    for word in sorted {
        match lines.last_mut() {
            Some((line_y, line_h, members))
                if (word.center_y() - *line_y).abs()
                    <= 0.5 * line_h.max(word.height()).max(1.0) =>
            {
                members.push(word);
                *line_h = line_h.max(word.height());
            }
            _ => lines.push((word.center_y(), word.height(), vec![word])),
        }
    }

    lines
        .into_iter()
        .map(|(_, _, mut members)| {
            members.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            members
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
