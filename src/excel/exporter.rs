//! Excel exporter implementation

use crate::config::ConsolidateConfig;
use crate::core::pipeline::Consolidation;
use crate::error::{MergeError, MergeResult};
use crate::types::{to_excel_serial, CellValue, Grid, OutputTable};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use std::path::Path;

const VENDOR_FONT: &str = "Calibri Light";
const VENDOR_HEADER_FILL: u32 = 0xD9E1F2;
const SHORT_DATE_FORMAT: &str = "m/d/yyyy";
const ISO_DATE_FORMAT: &str = "yyyy-mm-dd";
const UPC_FORMAT: &str = "# ?/?";
const MAX_COLUMN_WIDTH: usize = 50;

fn export_err(what: &str, e: impl std::fmt::Display) -> MergeError {
    MergeError::Export(format!("Failed to {}: {}", what, e))
}

fn add_named_sheet<'a>(workbook: &'a mut Workbook, name: &str) -> MergeResult<&'a mut Worksheet> {
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(name)
        .map_err(|e| export_err("set worksheet name", e))?;
    Ok(worksheet)
}

/// Write one cell; dates become serial numbers with `date_format`
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
) -> MergeResult<()> {
    match cell {
        CellValue::Text(s) => {
            worksheet
                .write_string(row, col, s)
                .map_err(|e| export_err("write text", e))?;
        }
        CellValue::Number(n) => {
            worksheet
                .write_number(row, col, *n)
                .map_err(|e| export_err("write number", e))?;
        }
        CellValue::Date(dt) => {
            worksheet
                .write_number_with_format(row, col, to_excel_serial(dt), date_format)
                .map_err(|e| export_err("write date", e))?;
        }
        CellValue::Empty => {}
    }
    Ok(())
}

//==============================================================================
// Consolidated workbook
//==============================================================================

/// Writes the consolidated workbook: a copy of the Summary sheet followed by
/// the combined table
pub struct ExcelExporter<'a> {
    consolidation: &'a Consolidation,
    summary_sheet: &'a str,
    output_sheet: &'a str,
}

impl<'a> ExcelExporter<'a> {
    /// Create a new Excel exporter
    pub fn new(consolidation: &'a Consolidation, config: &'a ConsolidateConfig) -> Self {
        Self {
            consolidation,
            summary_sheet: &config.summary_sheet,
            output_sheet: &config.output_sheet,
        }
    }

    /// Export to an .xlsx file
    pub fn export(&self, output_path: &Path) -> MergeResult<()> {
        let mut workbook = self.build()?;
        workbook
            .save(output_path)
            .map_err(|e| export_err("save Excel file", e))?;
        Ok(())
    }

    fn build(&self) -> MergeResult<Workbook> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format(ISO_DATE_FORMAT);

        if let Some(summary) = &self.consolidation.summary_sheet {
            let worksheet = add_named_sheet(&mut workbook, self.summary_sheet)?;
            Self::copy_grid(worksheet, summary, &date_format)?;
        }

        let worksheet = add_named_sheet(&mut workbook, self.output_sheet)?;
        Self::write_table(worksheet, &self.consolidation.table, &date_format)?;

        Ok(workbook)
    }

    /// Values-only copy, cell for cell at the same positions
    fn copy_grid(worksheet: &mut Worksheet, grid: &Grid, date_format: &Format) -> MergeResult<()> {
        for (row_idx, row) in grid.rows().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                write_cell(worksheet, row_idx as u32, col_idx as u16, cell, date_format)?;
            }
        }
        Ok(())
    }

    fn write_table(
        worksheet: &mut Worksheet,
        table: &OutputTable,
        date_format: &Format,
    ) -> MergeResult<()> {
        for (col_idx, name) in table.columns.iter().enumerate() {
            worksheet
                .write_string(0, col_idx as u16, name)
                .map_err(|e| export_err("write header", e))?;
        }

        for (row_idx, record) in table.records.iter().enumerate() {
            let excel_row = row_idx as u32 + 1;
            for (col_idx, cell) in OutputTable::row_cells(record).iter().enumerate() {
                write_cell(worksheet, excel_row, col_idx as u16, cell, date_format)?;
            }
        }
        Ok(())
    }
}

//==============================================================================
// Vendor files
//==============================================================================

/// Header mentions a date-like unit
pub fn is_date_column(header: &str) -> bool {
    let lower = header.trim().to_lowercase();
    ["date", "month", "year", "time"]
        .iter()
        .any(|k| lower.contains(k))
}

/// Parse the date spellings found in PO exports
pub fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if !(s.contains('/') || s.contains('-')) {
        return None;
    }
    ["%m/%d/%Y", "%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%m/%d/%y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Keep digits and dots of a UPC and read the result as a number
pub fn upc_number(s: &str) -> Option<f64> {
    let digits: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

/// Writes one vendor's rows with the fixed PO-file look: Calibri Light
/// throughout, shaded bold header, short dates and UPCs as fractions
pub struct VendorExporter<'a> {
    columns: &'a [String],
    rows: &'a [Vec<CellValue>],
}

impl<'a> VendorExporter<'a> {
    pub fn new(columns: &'a [String], rows: &'a [Vec<CellValue>]) -> Self {
        Self { columns, rows }
    }

    pub fn export(&self, output_path: &Path) -> MergeResult<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let base = Format::new().set_font_name(VENDOR_FONT).set_font_size(11);
        let header = base
            .clone()
            .set_bold()
            .set_background_color(Color::RGB(VENDOR_HEADER_FILL));
        let date = base.clone().set_num_format(SHORT_DATE_FORMAT);
        let upc = base.clone().set_num_format(UPC_FORMAT);

        for (col_idx, name) in self.columns.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col_idx as u16, name, &header)
                .map_err(|e| export_err("write header", e))?;
        }

        for (row_idx, row) in self.rows.iter().enumerate() {
            let excel_row = row_idx as u32 + 1;
            for (col_idx, cell) in row.iter().enumerate() {
                let name = self.columns.get(col_idx).map(String::as_str).unwrap_or("");
                let is_upc = name.trim().eq_ignore_ascii_case("upc");
                let col = col_idx as u16;

                let result = match cell {
                    CellValue::Empty => continue,
                    CellValue::Date(dt) => {
                        worksheet.write_number_with_format(excel_row, col, to_excel_serial(dt), &date)
                    }
                    CellValue::Number(n) if is_upc => {
                        worksheet.write_number_with_format(excel_row, col, *n, &upc)
                    }
                    CellValue::Number(n) => worksheet.write_number_with_format(excel_row, col, *n, &base),
                    CellValue::Text(s) => match (is_upc, upc_number(s), parse_date_text(s)) {
                        (true, Some(n), _) => {
                            worksheet.write_number_with_format(excel_row, col, n, &upc)
                        }
                        (false, _, Some(dt)) if is_date_column(name) => worksheet
                            .write_number_with_format(excel_row, col, to_excel_serial(&dt), &date),
                        _ => worksheet.write_string_with_format(excel_row, col, s, &base),
                    },
                };
                result.map_err(|e| export_err("write cell", e))?;
            }
        }

        for (col_idx, width) in self.column_widths().into_iter().enumerate() {
            worksheet
                .set_column_width(col_idx as u16, width as f64)
                .map_err(|e| export_err("set column width", e))?;
        }

        workbook
            .save(output_path)
            .map_err(|e| export_err("save vendor file", e))?;
        Ok(())
    }

    /// Longest rendered value plus padding, capped
    pub fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let longest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col_idx))
                    .map(|cell| cell.to_string().chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0);
                (longest + 2).min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }
}
