//! Sheet aggregation - run extraction over every data sheet and concatenate

use crate::config::ConsolidateConfig;
use crate::core::extractor::RowExtractor;
use crate::core::header::HeaderScanner;
use crate::core::lookup::{QuantityLookup, SummaryLookup};
use crate::types::{CellValue, Grid, OutputTable, Workbook};
use tracing::{info, warn};

/// Result of aggregating one workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateOutcome {
    pub table: OutputTable,
    /// Sheets whose header was found, in workbook order
    pub processed_sheets: Vec<String>,
    /// Sheets skipped because no header was found
    pub skipped_sheets: Vec<String>,
}

/// Context values of a sheet, read positionally from its top-left cells.
///
/// When the identity cell holds a key known to the summary lookup, the first
/// context value is replaced by that key's description.
pub fn sheet_context(grid: &Grid, summary: &SummaryLookup, config: &ConsolidateConfig) -> Vec<CellValue> {
    let mut context: Vec<CellValue> = config
        .context_cells
        .iter()
        .map(|c| grid.get(c.row, c.col).trimmed())
        .collect();

    let identity = grid
        .get(config.identity_cell.row, config.identity_cell.col)
        .normalized();
    if let Some(description) = identity.as_deref().and_then(|key| summary.get(key)) {
        if let Some(first) = context.first_mut() {
            info!(
                sheet = grid.name(),
                "found {} in summary, model set to '{}'",
                identity.as_deref().unwrap_or_default(),
                description
            );
            *first = CellValue::Text(description.to_string());
        }
    }

    context
}

/// Extract and concatenate records from every sheet except the summary sheet.
/// Sheets without a recognizable header are skipped, never fatal.
pub fn aggregate(
    workbook: &Workbook,
    summary: &SummaryLookup,
    quantities: &QuantityLookup,
    config: &ConsolidateConfig,
) -> AggregateOutcome {
    let labels = config.sheet_labels();
    let scanner = HeaderScanner::new(config.sheet_scan_window, config.min_header_matches);
    let extractor = RowExtractor::new(&config.required_labels, &config.identifier_label);

    let mut outcome = AggregateOutcome {
        table: OutputTable {
            columns: config.output_columns(),
            records: Vec::new(),
        },
        ..Default::default()
    };

    for grid in &workbook.sheets {
        if grid.name() == config.summary_sheet {
            continue;
        }

        let Some(header) = scanner.scan(grid, &labels) else {
            warn!(sheet = grid.name(), "required table not found, skipping sheet");
            outcome.skipped_sheets.push(grid.name().to_string());
            continue;
        };

        let context = sheet_context(grid, summary, config);
        let mut records = extractor.extract(grid, &header, &context, quantities);
        for record in &mut records {
            record.source_sheet = Some(grid.name().to_string());
        }

        info!(
            sheet = grid.name(),
            "processed {} rows (header at row {})",
            records.len(),
            header.row + 1
        );
        outcome.table.records.extend(records);
        outcome.processed_sheets.push(grid.name().to_string());
    }

    outcome
}
