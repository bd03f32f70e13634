//! Load → process → write, shared by the CLI and the API server

use crate::config::{Config, SplitConfig};
use crate::core::pipeline::consolidate;
use crate::core::splitter::{
    detect_header_row, header_columns, split_by_vendor, suggest_vendor_column, vendor_file_name,
};
use crate::error::{MergeError, MergeResult};
use crate::excel::{ExcelExporter, ExcelImporter, VendorExporter};
use crate::types::MatchStats;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Number of item/quantity pairs echoed back after a run
const SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSample {
    pub item: String,
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidateReport {
    pub output_path: PathBuf,
    pub stats: MatchStats,
    pub processed_sheets: Vec<String>,
    pub skipped_sheets: Vec<String>,
    pub order_items: usize,
    pub order_warnings: usize,
    pub samples: Vec<MatchSample>,
}

/// `<dir>/<stem><suffix>.xlsx` next to the main workbook
pub fn default_output_path(main_path: &Path, suffix: &str) -> PathBuf {
    let stem = main_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    main_path.with_file_name(format!("{}{}.xlsx", stem, suffix))
}

/// Join order quantities into the main workbook and write the result.
///
/// Either input failing to open aborts before anything is written.
pub fn run_consolidate(
    main_path: &Path,
    order_path: &Path,
    output_path: Option<&Path>,
    config: &Config,
) -> MergeResult<ConsolidateReport> {
    let settings = &config.consolidate;
    let main = ExcelImporter::new(main_path).import()?;
    let order = ExcelImporter::new(order_path).import()?;

    let result = consolidate(&main, &order, settings)?;

    let output_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(main_path, &settings.output_suffix));
    ExcelExporter::new(&result, settings).export(&output_path)?;
    info!("file saved: {}", output_path.display());

    let item_idx = settings
        .required_labels
        .iter()
        .position(|l| *l == settings.identifier_label);
    let samples = result
        .table
        .records
        .iter()
        .take(SAMPLE_SIZE)
        .map(|r| MatchSample {
            item: item_idx
                .and_then(|i| r.values.get(i))
                .map(|c| c.to_string())
                .unwrap_or_default(),
            quantity: r.quantity,
        })
        .collect();

    Ok(ConsolidateReport {
        output_path,
        stats: result.stats,
        processed_sheets: result.processed_sheets,
        skipped_sheets: result.skipped_sheets,
        order_items: result.order_items,
        order_warnings: result.order_warnings,
        samples,
    })
}

/// `name` itself when unused, otherwise `stem (2).xlsx`, `stem (3).xlsx`, ...
fn claim_file_name(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let stem = name.strip_suffix(".xlsx").unwrap_or(&name);
    let mut n = 2;
    loop {
        let candidate = format!("{} ({}).xlsx", stem, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorFile {
    pub vendor: String,
    pub file_name: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitReport {
    pub output_dir: PathBuf,
    pub header_row: usize,
    pub vendor_column: String,
    pub columns: Vec<String>,
    pub missing_columns: Vec<String>,
    pub files: Vec<VendorFile>,
}

/// Write one formatted workbook per vendor into `output_dir`.
///
/// Without an explicit vendor column the first header naming a vendor or
/// supplier is used.
pub fn run_split(
    input: &Path,
    vendor_column: Option<&str>,
    output_dir: &Path,
    settings: &SplitConfig,
    date: NaiveDate,
) -> MergeResult<SplitReport> {
    let grid = ExcelImporter::new(input).import_sheet(&settings.sheet)?;
    let header_row = detect_header_row(&grid, settings);
    info!(
        sheet = grid.name(),
        "found headers in row {}",
        header_row + 1
    );

    let vendor_column = match vendor_column {
        Some(c) => c.to_string(),
        None => suggest_vendor_column(&header_columns(&grid, header_row), &settings.vendor_keywords)
            .ok_or_else(|| MergeError::ColumnNotFound("vendor".to_string()))?,
    };

    let plan = split_by_vendor(&grid, header_row, &vendor_column, settings)?;

    fs::create_dir_all(output_dir)?;
    let mut files = Vec::with_capacity(plan.groups.len());
    let mut used = HashSet::new();
    for group in &plan.groups {
        let base_name = vendor_file_name(
            &settings.file_prefix,
            &group.vendor,
            &settings.model_year,
            &settings.month,
            date,
        )?;
        let file_name = claim_file_name(base_name.clone(), &mut used);
        if file_name != base_name {
            warn!(
                vendor = group.vendor.as_str(),
                "file name {} already taken, writing {}", base_name, file_name
            );
        }
        VendorExporter::new(&plan.columns, &group.rows).export(&output_dir.join(&file_name))?;
        info!(
            "created {} ({} rows, {} columns)",
            file_name,
            group.rows.len(),
            plan.columns.len()
        );
        files.push(VendorFile {
            vendor: group.vendor.clone(),
            file_name,
            rows: group.rows.len(),
        });
    }

    Ok(SplitReport {
        output_dir: output_dir.to_path_buf(),
        header_row: plan.header_row,
        vendor_column: plan.vendor_column,
        columns: plan.columns,
        missing_columns: plan.missing_columns,
        files,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnsReport {
    pub sheet: String,
    pub header_row: usize,
    pub columns: Vec<String>,
    pub suggested_vendor_column: Option<String>,
}

/// Header columns of the PO sheet, for choosing a vendor column
pub fn inspect_columns(input: &Path, settings: &SplitConfig) -> MergeResult<ColumnsReport> {
    let grid = ExcelImporter::new(input).import_sheet(&settings.sheet)?;
    let header_row = detect_header_row(&grid, settings);
    let columns = header_columns(&grid, header_row);
    let suggested_vendor_column = suggest_vendor_column(&columns, &settings.vendor_keywords);

    Ok(ColumnsReport {
        sheet: settings.sheet.clone(),
        header_row,
        columns,
        suggested_vendor_column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let out = default_output_path(Path::new("/data/plan.xlsx"), "_processed");
        assert_eq!(out, PathBuf::from("/data/plan_processed.xlsx"));

        let bare = default_output_path(Path::new("plan.xls"), "_processed");
        assert_eq!(bare, PathBuf::from("plan_processed.xlsx"));
    }

    #[test]
    fn test_claim_file_name_suffixes_duplicates() {
        let mut used = HashSet::new();
        assert_eq!(claim_file_name("P(A_B).xlsx".to_string(), &mut used), "P(A_B).xlsx");
        assert_eq!(claim_file_name("P(A_B).xlsx".to_string(), &mut used), "P(A_B) (2).xlsx");
        assert_eq!(claim_file_name("P(A_B).xlsx".to_string(), &mut used), "P(A_B) (3).xlsx");
        assert_eq!(claim_file_name("P(C).xlsx".to_string(), &mut used), "P(C).xlsx");
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out.xlsx");
        let err = run_consolidate(
            &dir.path().join("missing.xlsx"),
            &dir.path().join("orders.xlsx"),
            Some(&out),
            &Config::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::Open { .. }));
        assert!(!out.exists());
    }
}
