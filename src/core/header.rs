//! Header scanning - locate a table by its header labels
//!
//! Tables in the source workbooks are not anchored at A1: a sheet may carry a
//! title block, notes or context cells above the real header. The scanner
//! walks rows top to bottom and picks the first row where enough distinct
//! labels appear, which fixes the table's column layout for that sheet.

use crate::types::{fold, Grid};
use std::collections::HashMap;

/// Default number of rows inspected when looking for a header
pub const DEFAULT_SCAN_WINDOW: usize = 15;

/// Default number of distinct labels a header row must contain
pub const DEFAULT_MIN_MATCHES: usize = 2;

#[derive(Debug, Clone, PartialEq)]
struct Label {
    name: String,
    /// Folded spellings accepted for this label
    synonyms: Vec<String>,
}

/// Ordered set of labels, each with its accepted spellings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    /// One label per name, matched by its own spelling only
    pub fn exact(names: &[String]) -> Self {
        names
            .iter()
            .fold(Self::default(), |set, name| set.with_label(name, &[]))
    }

    /// Add a label accepting its own name plus `synonyms`
    pub fn with_label(mut self, name: &str, synonyms: &[String]) -> Self {
        let mut folded: Vec<String> = vec![fold(name)];
        for synonym in synonyms {
            let s = fold(synonym);
            if !folded.contains(&s) {
                folded.push(s);
            }
        }
        self.labels.push(Label {
            name: name.to_string(),
            synonyms: folded,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }

    /// Canonical name of the label a folded cell value spells, if any
    pub fn match_cell(&self, folded: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.synonyms.iter().any(|s| s == folded))
            .map(|l| l.name.as_str())
    }
}

/// Where a table header was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLocation {
    pub row: usize,
    /// Canonical label -> column index
    pub columns: HashMap<String, usize>,
}

impl HeaderLocation {
    pub fn column(&self, label: &str) -> Option<usize> {
        self.columns.get(label).copied()
    }
}

/// Row-window header scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderScanner {
    /// Rows to inspect; None inspects the whole grid
    pub window: Option<usize>,
    pub min_matches: usize,
}

impl Default for HeaderScanner {
    fn default() -> Self {
        Self {
            window: Some(DEFAULT_SCAN_WINDOW),
            min_matches: DEFAULT_MIN_MATCHES,
        }
    }
}

impl HeaderScanner {
    pub fn new(window: Option<usize>, min_matches: usize) -> Self {
        Self {
            window,
            min_matches,
        }
    }

    /// First row within the window holding at least `min_matches` distinct
    /// labels. When a label appears twice in that row the right-most cell wins.
    pub fn scan(&self, grid: &Grid, labels: &LabelSet) -> Option<HeaderLocation> {
        let limit = self
            .window
            .map_or(grid.height(), |w| w.min(grid.height()));
        let required = self.min_matches.max(1);

        for row in 0..limit {
            let mut columns = HashMap::new();
            for (col, cell) in grid.row(row).iter().enumerate() {
                let Some(folded) = cell.folded() else {
                    continue;
                };
                if let Some(name) = labels.match_cell(&folded) {
                    columns.insert(name.to_string(), col);
                }
            }
            if columns.len() >= required {
                return Some(HeaderLocation { row, columns });
            }
        }
        None
    }
}

/// Scan with the default 15-row window and two-label minimum
pub fn find_header(grid: &Grid, labels: &LabelSet) -> Option<HeaderLocation> {
    HeaderScanner::default().scan(grid, labels)
}

/// A cell that looks like it was meant to be a header label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderHint {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

/// Cells in the first `rows` rows whose text contains one of `needles`.
/// Used to explain a failed scan to the user.
pub fn header_hints(grid: &Grid, rows: usize, needles: &[&str]) -> Vec<HeaderHint> {
    let mut hints = Vec::new();
    for row in 0..rows.min(grid.height()) {
        for (col, cell) in grid.row(row).iter().enumerate() {
            let Some(text) = cell.normalized() else {
                continue;
            };
            let lower = text.to_lowercase();
            if needles.iter().any(|n| lower.contains(n)) {
                hints.push(HeaderHint { row, col, text });
            }
        }
    }
    hints
}

/// Render the non-empty cells of the first rows, one line per row
pub fn preview_rows(grid: &Grid, rows: usize, cols: usize) -> Vec<String> {
    (0..rows.min(grid.height()))
        .map(|row| {
            let values: Vec<String> = grid
                .row(row)
                .iter()
                .take(cols)
                .filter_map(|c| c.normalized())
                .map(|s| format!("'{}'", s))
                .collect();
            format!("Row {}: [{}]", row, values.join(", "))
        })
        .collect()
}
