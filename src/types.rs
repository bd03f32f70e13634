use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use std::fmt;

//==============================================================================
// Cell values
//==============================================================================

/// A single loosely-typed spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Empty,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Trimmed display text, or None for an empty cell
    pub fn normalized(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.to_string().trim().to_string()),
        }
    }

    /// Trimmed, case-folded display text, or None for an empty cell
    pub fn folded(&self) -> Option<String> {
        self.normalized().map(|s| s.to_lowercase())
    }

    /// Numeric interpretation of the cell. Text is parsed after trimming;
    /// dates and empty cells have no numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Date(_) | CellValue::Empty => None,
        }
    }

    /// Trim text cells, leave everything else untouched
    pub fn trimmed(&self) -> CellValue {
        match self {
            CellValue::Text(s) => CellValue::Text(s.trim().to_string()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Date(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            CellValue::Empty => Ok(()),
        }
    }
}

/// Render a number the way a user typed it: whole numbers lose the `.0`
/// so `12345` from one workbook matches `12345.0` from another.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Trim and case-fold a label or key for comparison
pub fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert a timestamp to an Excel serial date (1900 system)
pub fn to_excel_serial(dt: &NaiveDateTime) -> f64 {
    dt.signed_duration_since(excel_epoch()).num_milliseconds() as f64 / 86_400_000.0
}

//==============================================================================
// Grids and workbooks
//==============================================================================

/// The rectangular cell contents of one sheet, row-major, 0-indexed.
///
/// Positions are absolute: `(0, 0)` is A1 even when the sheet's used range
/// starts further down. Reads outside the grid return [`CellValue::Empty`].
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    name: String,
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

impl Grid {
    /// Build a grid, padding short rows with empty cells
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self {
            name: name.into(),
            rows,
            width,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn row(&self, row: usize) -> &[CellValue] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// All sheets of one spreadsheet document, in workbook order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Grid>,
}

impl Workbook {
    pub fn new(sheets: Vec<Grid>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Grid> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn first_sheet(&self) -> Option<&Grid> {
        self.sheets.first()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Grid::name).collect()
    }
}

//==============================================================================
// Extraction output
//==============================================================================

/// One output row assembled from a source row plus derived fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Per-sheet context values (Model, B2C Date, ...)
    pub context: Vec<CellValue>,
    /// Required-label values in declared label order
    pub values: Vec<CellValue>,
    /// Looked-up order quantity; None when the item has no match
    pub quantity: Option<f64>,
    /// Source sheet name, set by the aggregator
    pub source_sheet: Option<String>,
}

impl Record {
    pub fn has_quantity(&self) -> bool {
        matches!(self.quantity, Some(q) if q != 0.0)
    }
}

/// The combined table: header names plus records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl OutputTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flatten a record into cells in column order
    pub fn row_cells(record: &Record) -> Vec<CellValue> {
        let mut cells = Vec::with_capacity(record.context.len() + record.values.len() + 2);
        cells.extend(record.context.iter().cloned());
        cells.extend(record.values.iter().cloned());
        cells.push(record.quantity.map_or(CellValue::Empty, CellValue::Number));
        cells.push(
            record
                .source_sheet
                .clone()
                .map_or(CellValue::Empty, CellValue::Text),
        );
        cells
    }
}

/// Match statistics reported after a consolidation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MatchStats {
    pub total_records: usize,
    pub matched_records: usize,
    pub match_rate: f64,
}

impl MatchStats {
    pub fn from_records(records: &[Record]) -> Self {
        let total_records = records.len();
        let matched_records = records.iter().filter(|r| r.has_quantity()).count();
        let match_rate = if total_records == 0 {
            0.0
        } else {
            matched_records as f64 / total_records as f64 * 100.0
        };
        Self {
            total_records,
            matched_records,
            match_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_number_display_drops_whole_fraction() {
        assert_eq!(CellValue::Number(12345.0).to_string(), "12345");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Number(-3.0).to_string(), "-3");
    }

    #[test]
    fn test_date_display() {
        let midnight = NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::Date(midnight).to_string(), "2025-09-01");

        let afternoon = midnight + Duration::hours(14);
        assert_eq!(
            CellValue::Date(afternoon).to_string(),
            "2025-09-01 14:00:00"
        );
    }

    #[test]
    fn test_normalized_and_folded() {
        assert_eq!(text("  A1 ").normalized(), Some("A1".to_string()));
        assert_eq!(text("  Item Number ").folded(), Some("item number".to_string()));
        assert_eq!(CellValue::Empty.normalized(), None);
    }

    #[test]
    fn test_as_number() {
        assert_eq!(CellValue::Number(4.0).as_number(), Some(4.0));
        assert_eq!(text(" 7.5 ").as_number(), Some(7.5));
        assert_eq!(text("seven").as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }

    #[test]
    fn test_excel_serial_known_dates() {
        // 45901 is 2025-09-01 in the 1900 date system
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(to_excel_serial(&day.and_hms_opt(0, 0, 0).unwrap()), 45901.0);
        assert_eq!(to_excel_serial(&day.and_hms_opt(18, 0, 0).unwrap()), 45901.75);
    }

    #[test]
    fn test_grid_pads_and_reads_out_of_range() {
        let grid = Grid::new("s", vec![vec![text("a")], vec![text("b"), text("c")]]);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(0, 1), &CellValue::Empty);
        assert_eq!(grid.get(1, 1), &text("c"));
        assert_eq!(grid.get(10, 10), &CellValue::Empty);
        assert!(grid.row(5).is_empty());
    }

    #[test]
    fn test_workbook_lookup() {
        let wb = Workbook::new(vec![Grid::new("Summary", vec![]), Grid::new("X", vec![])]);
        assert_eq!(wb.sheet_names(), vec!["Summary", "X"]);
        assert!(wb.sheet("X").is_some());
        assert!(wb.sheet("x").is_none());
        assert_eq!(wb.first_sheet().map(Grid::name), Some("Summary"));
    }

    #[test]
    fn test_match_stats() {
        let rec = |q: Option<f64>| Record {
            context: vec![],
            values: vec![],
            quantity: q,
            source_sheet: None,
        };
        let stats = MatchStats::from_records(&[rec(Some(8.0)), rec(Some(0.0)), rec(None), rec(Some(1.0))]);
        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.matched_records, 2);
        assert_eq!(stats.match_rate, 50.0);

        let empty = MatchStats::from_records(&[]);
        assert_eq!(empty.match_rate, 0.0);
    }

    #[test]
    fn test_row_cells_order() {
        let record = Record {
            context: vec![text("M1")],
            values: vec![text("A1"), CellValue::Empty],
            quantity: None,
            source_sheet: Some("Sheet2".to_string()),
        };
        let cells = OutputTable::row_cells(&record);
        assert_eq!(
            cells,
            vec![text("M1"), text("A1"), CellValue::Empty, CellValue::Empty, text("Sheet2")]
        );
    }
}
