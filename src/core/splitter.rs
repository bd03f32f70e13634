//! Vendor splitter - cut one PO list into a workbook per vendor
//!
//! The PO list export puts a variable number of banner rows above its header,
//! so the header row is detected from keywords first. Only a fixed set of
//! columns is carried over to the vendor files; columns missing from the
//! export are reported, not fatal.

use crate::config::SplitConfig;
use crate::error::{MergeError, MergeResult};
use crate::types::{fold, CellValue, Grid};
use chrono::NaiveDate;
use regex::Regex;
use tracing::{info, warn};

/// Rows of one vendor, restricted to the kept columns
#[derive(Debug, Clone, PartialEq)]
pub struct VendorGroup {
    pub vendor: String,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub header_row: usize,
    pub vendor_column: String,
    /// Required columns present in the sheet, in declared order
    pub columns: Vec<String>,
    /// Required columns absent from the sheet
    pub missing_columns: Vec<String>,
    /// Vendors in order of first appearance
    pub groups: Vec<VendorGroup>,
}

fn named_columns(grid: &Grid, row: usize) -> usize {
    grid.row(row).iter().filter(|c| !c.is_empty()).count()
}

/// Index of the PO list header row.
///
/// Takes the first row within the window mentioning one of the header
/// keywords. If that row names fewer than `min_named_columns` cells, the
/// later rows of the window are tried and the one naming the most cells wins.
pub fn detect_header_row(grid: &Grid, config: &SplitConfig) -> usize {
    let window = config.header_window.min(grid.height());
    let keywords: Vec<String> = config.header_keywords.iter().map(|k| fold(k)).collect();

    let mut header_row = (0..window)
        .find(|&row| {
            grid.row(row)
                .iter()
                .filter_map(CellValue::folded)
                .any(|v| keywords.iter().any(|k| v.contains(k.as_str())))
        })
        .unwrap_or(0);

    let mut best = named_columns(grid, header_row);
    if best < config.min_named_columns {
        for row in 1..window {
            let count = named_columns(grid, row);
            if count > best {
                best = count;
                header_row = row;
            }
        }
    }
    header_row
}

/// Trimmed names of the non-empty header cells
pub fn header_columns(grid: &Grid, header_row: usize) -> Vec<String> {
    grid.row(header_row)
        .iter()
        .filter_map(CellValue::normalized)
        .filter(|s| !s.is_empty())
        .collect()
}

/// First column whose name mentions one of the vendor keywords
pub fn suggest_vendor_column(columns: &[String], keywords: &[String]) -> Option<String> {
    columns
        .iter()
        .find(|c| {
            let lower = c.to_lowercase();
            keywords.iter().any(|k| lower.contains(&fold(k)))
        })
        .cloned()
}

fn column_index(grid: &Grid, header_row: usize, name: &str) -> Option<usize> {
    grid.row(header_row)
        .iter()
        .position(|c| c.normalized().as_deref() == Some(name))
}

/// Group the data rows under `header_row` by the value of `vendor_column`.
///
/// Rows with an empty vendor cell belong to no group.
pub fn split_by_vendor(
    grid: &Grid,
    header_row: usize,
    vendor_column: &str,
    config: &SplitConfig,
) -> MergeResult<SplitPlan> {
    let vendor_col = column_index(grid, header_row, vendor_column)
        .ok_or_else(|| MergeError::ColumnNotFound(vendor_column.to_string()))?;

    let mut kept: Vec<(String, usize)> = Vec::new();
    let mut missing_columns = Vec::new();
    for name in &config.required_columns {
        match column_index(grid, header_row, name) {
            Some(col) => kept.push((name.clone(), col)),
            None => missing_columns.push(name.clone()),
        }
    }
    if !missing_columns.is_empty() {
        warn!(sheet = grid.name(), "missing columns: {}", missing_columns.join(", "));
    }
    info!(
        sheet = grid.name(),
        "keeping {} columns: {}",
        kept.len(),
        kept.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>().join(", ")
    );

    let mut groups: Vec<VendorGroup> = Vec::new();
    for row in header_row + 1..grid.height() {
        let vendor_cell = grid.get(row, vendor_col);
        if vendor_cell.is_empty() {
            continue;
        }
        let vendor = vendor_cell.to_string();
        let cells: Vec<CellValue> = kept.iter().map(|(_, col)| grid.get(row, *col).clone()).collect();

        match groups.iter_mut().find(|g| g.vendor == vendor) {
            Some(group) => group.rows.push(cells),
            None => groups.push(VendorGroup {
                vendor,
                rows: vec![cells],
            }),
        }
    }
    info!(sheet = grid.name(), "found {} unique vendors", groups.len());

    Ok(SplitPlan {
        header_row,
        vendor_column: vendor_column.to_string(),
        columns: kept.into_iter().map(|(name, _)| name).collect(),
        missing_columns,
        groups,
    })
}

/// Replace characters that are not allowed in file names
pub fn sanitize_vendor(vendor: &str) -> MergeResult<String> {
    let pattern = Regex::new(r#"[/\\:*?"<>|]"#)
        .map_err(|e| MergeError::Config(format!("Regex error: {}", e)))?;
    Ok(pattern.replace_all(vendor, "_").into_owned())
}

/// `PREFIX(Vendor)_MY26 SEP_market PO_18-10-2026.xlsx`
pub fn vendor_file_name(
    prefix: &str,
    vendor: &str,
    model_year: &str,
    month: &str,
    date: NaiveDate,
) -> MergeResult<String> {
    Ok(format!(
        "{}({})_{} {}_market PO_{}.xlsx",
        prefix,
        sanitize_vendor(vendor)?,
        model_year,
        month,
        date.format("%d-%m-%Y")
    ))
}
