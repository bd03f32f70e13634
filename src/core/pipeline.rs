//! Consolidation pipeline over two loaded workbooks
//!
//! order workbook -> quantity lookup
//! main workbook  -> summary lookup + per-sheet extraction -> combined table
//!
//! Everything here is pure: the workbooks are read-only snapshots and all
//! lookups are created per call, so concurrent runs share nothing.

use crate::config::{ConsolidateConfig, OrderConfig, ORDER_ITEM_LABEL, ORDER_QUANTITY_LABEL};
use crate::core::aggregator::aggregate;
use crate::core::header::{header_hints, preview_rows, HeaderScanner};
use crate::core::lookup::{build_quantity_lookup, build_summary_lookup, QuantityLookup, SummaryLookup};
use crate::error::{MergeError, MergeResult};
use crate::types::{Grid, MatchStats, OutputTable, Workbook};
use tracing::{debug, info, warn};

/// Everything a consolidation run produces before it is written out
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    pub table: OutputTable,
    /// The main workbook's Summary sheet, copied to the output as-is
    pub summary_sheet: Option<Grid>,
    pub stats: MatchStats,
    pub processed_sheets: Vec<String>,
    pub skipped_sheets: Vec<String>,
    /// Unique items in the order lookup
    pub order_items: usize,
    /// Order rows skipped for a malformed quantity
    pub order_warnings: usize,
}

/// Build the quantity lookup from the order workbook.
///
/// A missing sheet or header is not fatal: the run continues without
/// order quantities.
pub fn build_order_lookup(order: &Workbook, config: &OrderConfig) -> QuantityLookup {
    let grid = match &config.sheet {
        Some(name) => order.sheet(name),
        None => order.first_sheet(),
    };
    let Some(grid) = grid else {
        warn!(
            "order sheet {} not found; continuing without order quantities",
            config.sheet.as_deref().unwrap_or("(first)")
        );
        return QuantityLookup::new();
    };

    for line in preview_rows(grid, 10, 10) {
        debug!(sheet = grid.name(), "{}", line);
    }

    let scanner = HeaderScanner::new(config.scan_window, 2);
    let Some(header) = scanner.scan(grid, &config.labels()) else {
        warn!(
            sheet = grid.name(),
            "could not find item and quantity columns; continuing without order quantities"
        );
        for hint in header_hints(grid, 10, &["item", "quantity", "qty"]) {
            warn!(
                "  potential column '{}' at row {}, col {}",
                hint.text,
                hint.row + 1,
                hint.col + 1
            );
        }
        return QuantityLookup::new();
    };

    info!(
        sheet = grid.name(),
        "order header at row {}: item col {:?}, quantity col {:?}",
        header.row + 1,
        header.column(ORDER_ITEM_LABEL).map(|c| c + 1),
        header.column(ORDER_QUANTITY_LABEL).map(|c| c + 1)
    );
    build_quantity_lookup(grid, &header, ORDER_ITEM_LABEL, ORDER_QUANTITY_LABEL)
}

/// Build the summary lookup from the main workbook's Summary sheet
pub fn build_main_summary(main: &Workbook, config: &ConsolidateConfig) -> SummaryLookup {
    match main.sheet(&config.summary_sheet) {
        Some(grid) => build_summary_lookup(grid, &config.summary),
        None => {
            warn!(
                "sheet '{}' not found; model names are taken as-is",
                config.summary_sheet
            );
            SummaryLookup::new()
        }
    }
}

/// Run the whole join. Fails only when no data sheet had a recognizable
/// table, since there would be nothing to write.
pub fn consolidate(
    main: &Workbook,
    order: &Workbook,
    config: &ConsolidateConfig,
) -> MergeResult<Consolidation> {
    let quantities = build_order_lookup(order, &config.order);
    let summary = build_main_summary(main, config);
    let outcome = aggregate(main, &summary, &quantities, config);

    if outcome.processed_sheets.is_empty() {
        return Err(MergeError::NoTables(format!(
            "no sheet contains at least {} of: {}",
            config.min_header_matches,
            config.required_labels.join(", ")
        )));
    }

    let stats = MatchStats::from_records(&outcome.table.records);
    info!(
        "combined {} rows, ordered quantities found for {}",
        stats.total_records, stats.matched_records
    );

    Ok(Consolidation {
        summary_sheet: main.sheet(&config.summary_sheet).cloned(),
        table: outcome.table,
        stats,
        processed_sheets: outcome.processed_sheets,
        skipped_sheets: outcome.skipped_sheets,
        order_items: quantities.len(),
        order_warnings: quantities.warnings().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn t(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn order_workbook() -> Workbook {
        Workbook::new(vec![Grid::new(
            "Orders",
            vec![
                vec![t("Open orders")],
                vec![],
                vec![t("Item"), t("Order Qty")],
                vec![t("A1"), n(5.0)],
                vec![t("A1"), n(3.0)],
                vec![t("B1"), n(2.0)],
            ],
        )])
    }

    fn main_workbook() -> Workbook {
        Workbook::new(vec![
            Grid::new(
                "Summary",
                vec![
                    vec![t("Issue key"), t("Summary")],
                    vec![t("PRJ-1"), t("Trail bike")],
                ],
            ),
            Grid::new(
                "PRJ-1",
                vec![
                    vec![t("PRJ-1"), t("raw")],
                    vec![t("Date"), t("2025-09-01")],
                    vec![t("Planner"), t("Item Number"), t("Item Description")],
                    vec![t("Ann"), t("a1 "), t("Frame")],
                    vec![t("Bob"), t("Z9"), t("Fork")],
                ],
            ),
        ])
    }

    #[test]
    fn test_order_lookup_sums_duplicates() {
        let lookup = build_order_lookup(&order_workbook(), &OrderConfig::default());
        assert_eq!(lookup.get("A1"), Some(8.0));
        assert_eq!(lookup.get("B1"), Some(2.0));
    }

    #[test]
    fn test_order_lookup_missing_header_is_empty() {
        let order = Workbook::new(vec![Grid::new("Orders", vec![vec![t("Item")]])]);
        assert!(build_order_lookup(&order, &OrderConfig::default()).is_empty());
    }

    #[test]
    fn test_order_lookup_named_sheet_missing() {
        let config = OrderConfig {
            sheet: Some("Nope".to_string()),
            ..Default::default()
        };
        assert!(build_order_lookup(&order_workbook(), &config).is_empty());
    }

    #[test]
    fn test_consolidate_end_to_end() {
        let result = consolidate(&main_workbook(), &order_workbook(), &ConsolidateConfig::default()).unwrap();
        assert_eq!(result.stats.total_records, 2);
        assert_eq!(result.stats.matched_records, 1);
        assert_eq!(result.stats.match_rate, 50.0);
        assert_eq!(result.table.records[0].quantity, Some(8.0));
        assert_eq!(result.table.records[0].context[0], t("Trail bike"));
        assert!(result.summary_sheet.is_some());
        assert_eq!(result.order_items, 2);
    }

    #[test]
    fn test_consolidate_without_tables_fails() {
        let main = Workbook::new(vec![Grid::new("Other", vec![vec![t("nothing")]])]);
        let err = consolidate(&main, &order_workbook(), &ConsolidateConfig::default()).unwrap_err();
        assert!(matches!(err, MergeError::NoTables(_)));
    }
}
