//! Spreadsheet file I/O
//!
//! - Import: .xlsx/.xls/.ods → header-less sheet grids (calamine)
//! - Export: consolidated workbook and per-vendor files (rust_xlsxwriter)

mod exporter;
mod importer;

pub use exporter::{is_date_column, parse_date_text, upc_number, ExcelExporter, VendorExporter};
pub use importer::ExcelImporter;
