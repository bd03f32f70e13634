//! End-to-end consolidation tests: real .xlsx fixtures in, real .xlsx out

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use sheetmerge::config::Config;
use sheetmerge::error::MergeError;
use sheetmerge::runner::{default_output_path, run_consolidate};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

enum Fx {
    T(&'static str),
    N(f64),
    E,
}

use Fx::{E, N, T};

fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Fx>>)]) {
    let mut workbook = XlsxWorkbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    T(s) => {
                        sheet.write_string(r as u32, c as u16, *s).unwrap();
                    }
                    N(n) => {
                        sheet.write_number(r as u32, c as u16, *n).unwrap();
                    }
                    E => {}
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

fn header_row() -> Vec<Fx> {
    vec![
        T("Planner"),
        T("Published"),
        T("Item Number"),
        T("Item Description"),
        T("Oracle On Hand"),
    ]
}

/// Order export with two banner rows above its header
fn order_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("orders.xlsx");
    write_workbook(
        &path,
        &[(
            "Export",
            vec![
                vec![T("Weekly order export")],
                vec![],
                vec![T("Item"), T("Order Qty")],
                vec![T("A1"), N(5.0)],
                vec![T("A1"), N(3.0)],
                vec![T("B1"), N(2.0)],
            ],
        )],
    );
    path
}

fn summary_sheet() -> (&'static str, Vec<Vec<Fx>>) {
    (
        "Summary",
        vec![
            vec![T("Issue key"), T("Summary")],
            vec![T("PRJ-1"), T("Widget Pro")],
        ],
    )
}

fn line_sheet() -> (&'static str, Vec<Vec<Fx>>) {
    (
        "Line1",
        vec![
            vec![T("PRJ-1"), T(" raw model ")],
            vec![T("B2C"), T("2025-09-01")],
            vec![],
            header_row(),
            vec![T("Ann"), T("Y"), T("a1 "), T("Bolt"), N(10.0)],
            vec![T("Bob"), T("N"), T("B1"), T("Nut"), N(4.0)],
            vec![],
            vec![T("Cy"), T("Y"), T("C9"), T("Pin"), N(0.0)],
        ],
    )
}

fn read_sheet(path: &Path, name: &str) -> Range<Data> {
    let mut workbook = open_workbook_auto(path).unwrap();
    workbook.worksheet_range(name).unwrap()
}

fn text_at(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        _ => String::new(),
    }
}

fn number_at(range: &Range<Data>, row: u32, col: u32) -> Option<f64> {
    match range.get_value((row, col)) {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        _ => None,
    }
}

// Column positions in the Combined sheet
const MODEL: u32 = 0;
const B2C_DATE: u32 = 1;
const ITEM_NUMBER: u32 = 4;
const ORDERED_QTY: u32 = 7;
const SOURCE_SHEET: u32 = 8;

// ═══════════════════════════════════════════════════════════════════════════
// HAPPY PATH
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_consolidate_writes_summary_and_combined() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[summary_sheet(), line_sheet()]);
    let orders = order_fixture(dir.path());

    let report = run_consolidate(&main, &orders, None, &Config::default()).unwrap();

    assert_eq!(report.output_path, dir.path().join("plan_processed.xlsx"));
    assert!(report.output_path.exists());
    assert_eq!(report.processed_sheets, vec!["Line1"]);
    assert_eq!(report.order_items, 2);

    let mut workbook = open_workbook_auto(&report.output_path).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Summary", "Combined"]);

    let summary = workbook.worksheet_range("Summary").unwrap();
    assert_eq!(text_at(&summary, 1, 1), "Widget Pro");
}

#[test]
fn test_combined_header_and_context() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[summary_sheet(), line_sheet()]);
    let orders = order_fixture(dir.path());
    let out = dir.path().join("out.xlsx");

    run_consolidate(&main, &orders, Some(&out), &Config::default()).unwrap();
    let combined = read_sheet(&out, "Combined");

    let header: Vec<String> = (0..9).map(|c| text_at(&combined, 0, c)).collect();
    assert_eq!(
        header,
        vec![
            "Model",
            "B2C Date",
            "Planner",
            "Published",
            "Item Number",
            "Item Description",
            "Oracle On Hand",
            "Ordered Qty",
            "Source_Sheet",
        ]
    );

    // Blank rows between data rows are dropped
    assert_eq!(combined.get_size().0, 4);

    for row in 1..4 {
        // A1 names a Summary key, so its description replaces B1
        assert_eq!(text_at(&combined, row, MODEL), "Widget Pro");
        assert_eq!(text_at(&combined, row, B2C_DATE), "2025-09-01");
        assert_eq!(text_at(&combined, row, SOURCE_SHEET), "Line1");
    }
}

#[test]
fn test_quantities_joined_by_item_number() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[summary_sheet(), line_sheet()]);
    let orders = order_fixture(dir.path());
    let out = dir.path().join("out.xlsx");

    let report = run_consolidate(&main, &orders, Some(&out), &Config::default()).unwrap();
    let combined = read_sheet(&out, "Combined");

    // "a1 " only matches "A1" through the case and whitespace insensitive pass
    assert_eq!(text_at(&combined, 1, ITEM_NUMBER).trim(), "a1");
    assert_eq!(number_at(&combined, 1, ORDERED_QTY), Some(8.0));
    assert_eq!(number_at(&combined, 2, ORDERED_QTY), Some(2.0));
    assert_eq!(number_at(&combined, 3, ORDERED_QTY), None);

    assert_eq!(report.stats.total_records, 3);
    assert_eq!(report.stats.matched_records, 2);
    assert!((report.stats.match_rate - 66.666).abs() < 0.01);

    assert_eq!(report.samples.len(), 3);
    assert_eq!(report.samples[2].item, "C9");
    assert_eq!(report.samples[2].quantity, None);
}

// ═══════════════════════════════════════════════════════════════════════════
// DEGRADED INPUTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_header_without_data_rows_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[summary_sheet(), ("Empty", vec![header_row()])]);
    let orders = order_fixture(dir.path());
    let out = dir.path().join("out.xlsx");

    let report = run_consolidate(&main, &orders, Some(&out), &Config::default()).unwrap();
    assert_eq!(report.processed_sheets, vec!["Empty"]);
    assert_eq!(report.stats.total_records, 0);
    assert_eq!(report.stats.match_rate, 0.0);

    let combined = read_sheet(&out, "Combined");
    assert_eq!(combined.get_size().0, 1);
}

#[test]
fn test_missing_summary_marker_keeps_raw_model() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(
        &main,
        &[
            ("Summary", vec![vec![T("Key"), T("Summary")], vec![T("PRJ-1"), T("Widget Pro")]]),
            line_sheet(),
        ],
    );
    let orders = order_fixture(dir.path());
    let out = dir.path().join("out.xlsx");

    run_consolidate(&main, &orders, Some(&out), &Config::default()).unwrap();
    let combined = read_sheet(&out, "Combined");
    assert_eq!(text_at(&combined, 1, MODEL), "raw model");
}

#[test]
fn test_sheet_without_table_is_skipped() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(
        &main,
        &[
            summary_sheet(),
            ("Notes", vec![vec![T("Planner"), T("call vendor")], vec![T("misc")]]),
            line_sheet(),
        ],
    );
    let orders = order_fixture(dir.path());
    let out = dir.path().join("out.xlsx");

    let report = run_consolidate(&main, &orders, Some(&out), &Config::default()).unwrap();
    assert_eq!(report.processed_sheets, vec!["Line1"]);
    assert_eq!(report.skipped_sheets, vec!["Notes"]);

    let combined = read_sheet(&out, "Combined");
    for row in 1..combined.get_size().0 as u32 {
        assert_eq!(text_at(&combined, row, SOURCE_SHEET), "Line1");
    }
}

#[test]
fn test_order_without_header_leaves_quantities_empty() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[summary_sheet(), line_sheet()]);
    let orders = dir.path().join("orders.xlsx");
    write_workbook(&orders, &[("Export", vec![vec![T("SKU"), T("Count")], vec![T("A1"), N(5.0)]])]);
    let out = dir.path().join("out.xlsx");

    let report = run_consolidate(&main, &orders, Some(&out), &Config::default()).unwrap();
    assert_eq!(report.order_items, 0);
    assert_eq!(report.stats.matched_records, 0);
    assert_eq!(report.stats.total_records, 3);
}

#[test]
fn test_invalid_order_quantity_is_counted() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[summary_sheet(), line_sheet()]);
    let orders = dir.path().join("orders.xlsx");
    write_workbook(
        &orders,
        &[(
            "Export",
            vec![
                vec![T("Part Number"), T("Quantity")],
                vec![T("A1"), T("n/a")],
                vec![T("B1"), T("7")],
            ],
        )],
    );
    let out = dir.path().join("out.xlsx");

    let report = run_consolidate(&main, &orders, Some(&out), &Config::default()).unwrap();
    assert_eq!(report.order_warnings, 1);
    assert_eq!(report.order_items, 1);
    assert_eq!(report.stats.matched_records, 1);
}

#[test]
fn test_no_sheet_with_table_is_fatal() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[summary_sheet(), ("Notes", vec![vec![T("nothing here")]])]);
    let orders = order_fixture(dir.path());

    let err = run_consolidate(&main, &orders, None, &Config::default()).unwrap_err();
    assert!(matches!(err, MergeError::NoTables(_)));
    assert!(!default_output_path(&main, "_processed").exists());
}

#[test]
fn test_missing_summary_sheet_omits_copy() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[line_sheet()]);
    let orders = order_fixture(dir.path());
    let out = dir.path().join("out.xlsx");

    run_consolidate(&main, &orders, Some(&out), &Config::default()).unwrap();
    let workbook = open_workbook_auto(&out).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Combined"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_custom_output_sheet_name() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("plan.xlsx");
    write_workbook(&main, &[summary_sheet(), line_sheet()]);
    let orders = order_fixture(dir.path());
    let out = dir.path().join("out.xlsx");

    let config = Config::from_yaml_str("consolidate:\n  output_sheet: All Lines\n").unwrap();
    run_consolidate(&main, &orders, Some(&out), &config).unwrap();

    let workbook = open_workbook_auto(&out).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Summary", "All Lines"]);
}
