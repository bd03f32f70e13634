//! Excel importer implementation - spreadsheet file → sheet grids

use crate::error::{MergeError, MergeResult};
use crate::types::{CellValue, Grid, Workbook};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Reads .xlsx/.xlsm/.xls/.ods files into header-less grids
pub struct ExcelImporter {
    path: PathBuf,
}

impl ExcelImporter {
    /// Create a new Excel importer
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load every readable sheet. A file that cannot be opened is fatal; a
    /// single sheet that fails to decode is logged and left out.
    pub fn import(&self) -> MergeResult<Workbook> {
        let mut workbook =
            open_workbook_auto(&self.path).map_err(|e| MergeError::open(&self.path, e))?;

        let sheet_names = workbook.sheet_names().to_vec();
        info!(
            "loaded {}: sheets {:?}",
            self.path.display(),
            sheet_names
        );

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            match workbook.worksheet_range(&sheet_name) {
                Ok(range) => sheets.push(Self::range_to_grid(&sheet_name, &range)),
                Err(e) => warn!(sheet = sheet_name.as_str(), "error reading sheet: {}", e),
            }
        }

        Ok(Workbook::new(sheets))
    }

    /// Load one named sheet
    pub fn import_sheet(&self, sheet_name: &str) -> MergeResult<Grid> {
        let mut workbook =
            open_workbook_auto(&self.path).map_err(|e| MergeError::open(&self.path, e))?;

        if !workbook.sheet_names().iter().any(|s| s == sheet_name) {
            return Err(MergeError::SheetNotFound(sheet_name.to_string()));
        }

        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| MergeError::open(&self.path, e))?;
        Ok(Self::range_to_grid(sheet_name, &range))
    }

    /// Place the used range at its absolute position so A1 is always (0, 0)
    fn range_to_grid(sheet_name: &str, range: &Range<Data>) -> Grid {
        let Some((start_row, start_col)) = range.start() else {
            return Grid::new(sheet_name, Vec::new());
        };
        let (start_row, start_col) = (start_row as usize, start_col as usize);
        let (height, width) = range.get_size();

        let mut rows = vec![vec![CellValue::Empty; start_col + width]; start_row + height];
        for (row, col, data) in range.cells() {
            if let Some(cell) = rows
                .get_mut(start_row + row)
                .and_then(|r| r.get_mut(start_col + col))
            {
                *cell = Self::convert_cell(data);
            }
        }

        Grid::new(sheet_name, rows)
    }

    /// Map a calamine cell onto the four-way cell model
    fn convert_cell(data: &Data) -> CellValue {
        match data {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
            // as_datetime honours the workbook's 1900/1904 date system
            Data::DateTime(dt) => dt
                .as_datetime()
                .map_or(CellValue::Number(dt.as_f64()), CellValue::Date),
            Data::DateTimeIso(s) => Self::parse_iso_datetime(s)
                .map_or_else(|| CellValue::Text(s.clone()), CellValue::Date),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }

    fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}
