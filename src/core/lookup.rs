//! Key -> value lookups built once per source grid
//!
//! Duplicate keys are handled differently by the two lookups:
//! order quantities accumulate (two order lines for one item add up), while
//! summary descriptions are plain overwrites.

use crate::config::SummaryConfig;
use crate::core::header::HeaderLocation;
use crate::types::{fold, CellValue, Grid};
use std::collections::HashMap;
use tracing::{debug, info, warn};

//==============================================================================
// Quantity lookup
//==============================================================================

/// A row skipped while building a lookup
#[derive(Debug, Clone, PartialEq)]
pub struct LookupWarning {
    pub row: usize,
    pub key: String,
    pub raw_value: String,
}

impl std::fmt::Display for LookupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {}: invalid quantity value '{}' for item '{}'",
            self.row + 1,
            self.raw_value,
            self.key
        )
    }
}

/// Item -> summed quantity, iterable in first-insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantityLookup {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
    processed_rows: usize,
    warnings: Vec<LookupWarning>,
}

impl QuantityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the accumulator for `key`, creating it at the end
    pub fn add(&mut self, key: &str, value: f64) {
        match self.index.get(key) {
            Some(&pos) => {
                if let Some(entry) = self.entries.get_mut(pos) {
                    entry.1 += value;
                }
            }
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.index
            .get(key)
            .and_then(|&pos| self.entries.get(pos))
            .map(|(_, v)| *v)
    }

    /// First entry, in insertion order, whose folded key equals the folded
    /// identifier. Differently-cased duplicates resolve to whichever was
    /// inserted first.
    pub fn find_folded(&self, identifier: &str) -> Option<f64> {
        let wanted = fold(identifier);
        self.entries
            .iter()
            .find(|(key, _)| fold(key) == wanted)
            .map(|(_, v)| *v)
    }

    /// Exact match first, then the case/whitespace-insensitive fallback
    pub fn resolve(&self, identifier: &str) -> Option<f64> {
        self.get(identifier).or_else(|| self.find_folded(identifier))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Rows that contributed to the lookup
    pub fn processed_rows(&self) -> usize {
        self.processed_rows
    }

    pub fn warnings(&self) -> &[LookupWarning] {
        &self.warnings
    }
}

/// Build an item -> quantity lookup from the rows below `header`.
///
/// Rows with an empty key or value are ignored. A value that is not a
/// number skips the row and is recorded as a warning.
pub fn build_quantity_lookup(
    grid: &Grid,
    header: &HeaderLocation,
    key_label: &str,
    value_label: &str,
) -> QuantityLookup {
    let mut lookup = QuantityLookup::new();
    let (Some(key_col), Some(value_col)) = (header.column(key_label), header.column(value_label))
    else {
        warn!(
            sheet = grid.name(),
            "header row {} lacks '{}' or '{}'; no quantities loaded",
            header.row + 1,
            key_label,
            value_label
        );
        return lookup;
    };

    for row in header.row + 1..grid.height() {
        let key_cell = grid.get(row, key_col);
        let value_cell = grid.get(row, value_col);
        let Some(key) = key_cell.normalized() else {
            continue;
        };
        if value_cell.is_empty() {
            continue;
        }

        let quantity = match value_cell {
            CellValue::Date(_) => None,
            other => other.as_number(),
        };
        match quantity {
            Some(q) => {
                lookup.add(&key, q);
                lookup.processed_rows += 1;
                if lookup.processed_rows <= 5 {
                    debug!("order item '{}' -> qty {}", key, q);
                }
            }
            None => {
                let warning = LookupWarning {
                    row,
                    key,
                    raw_value: value_cell.to_string(),
                };
                warn!(sheet = grid.name(), "{}", warning);
                lookup.warnings.push(warning);
            }
        }
    }

    info!(
        sheet = grid.name(),
        "processed {} order rows into {} unique items",
        lookup.processed_rows,
        lookup.len()
    );
    lookup
}

//==============================================================================
// Summary lookup
//==============================================================================

/// Issue key -> human-readable summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryLookup {
    entries: HashMap<String, String>,
}

impl SummaryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the key -> description table of the Summary sheet.
///
/// The first cell equal to the key marker fixes the header row and key
/// column; the value column is the first cell of that row equal to the value
/// marker. Missing markers yield an empty lookup.
pub fn build_summary_lookup(grid: &Grid, markers: &SummaryConfig) -> SummaryLookup {
    let mut lookup = SummaryLookup::new();
    let limit = markers
        .scan_window
        .map_or(grid.height(), |w| w.min(grid.height()));

    let anchor = (0..limit).find_map(|row| {
        grid.row(row)
            .iter()
            .position(|c| c.normalized().as_deref() == Some(markers.key_marker.as_str()))
            .map(|col| (row, col))
    });
    let Some((header_row, key_col)) = anchor else {
        warn!(
            sheet = grid.name(),
            "'{}' column not found; summary substitution disabled", markers.key_marker
        );
        return lookup;
    };

    let value_col = grid
        .row(header_row)
        .iter()
        .position(|c| c.normalized().as_deref() == Some(markers.value_marker.as_str()));
    let Some(value_col) = value_col else {
        warn!(
            sheet = grid.name(),
            "'{}' column not found next to '{}'", markers.value_marker, markers.key_marker
        );
        return lookup;
    };

    for row in header_row + 1..grid.height() {
        if let (Some(key), Some(value)) = (
            grid.get(row, key_col).normalized(),
            grid.get(row, value_col).normalized(),
        ) {
            lookup.insert(key, value);
        }
    }

    info!(
        sheet = grid.name(),
        "summary lookup holds {} entries",
        lookup.len()
    );
    lookup
}
