//! Row extraction - turn the rows under a header into records

use crate::core::header::HeaderLocation;
use crate::core::lookup::QuantityLookup;
use crate::types::{CellValue, Grid, Record};

/// Extracts required-label columns and joins order quantities by identifier
#[derive(Debug, Clone, Copy)]
pub struct RowExtractor<'a> {
    required_labels: &'a [String],
    identifier_label: &'a str,
}

impl<'a> RowExtractor<'a> {
    pub fn new(required_labels: &'a [String], identifier_label: &'a str) -> Self {
        Self {
            required_labels,
            identifier_label,
        }
    }

    /// One record per row below the header that has at least one non-empty
    /// required cell. Labels missing from the header read as empty.
    pub fn extract(
        &self,
        grid: &Grid,
        header: &HeaderLocation,
        context: &[CellValue],
        quantities: &QuantityLookup,
    ) -> Vec<Record> {
        let mut records = Vec::new();

        for row in header.row + 1..grid.height() {
            let values: Vec<CellValue> = self
                .required_labels
                .iter()
                .map(|label| {
                    header
                        .column(label)
                        .map_or(CellValue::Empty, |col| grid.get(row, col).clone())
                })
                .collect();

            if values.iter().all(CellValue::is_empty) {
                continue;
            }

            let quantity = self
                .identifier(&values)
                .and_then(|id| quantities.resolve(&id));

            records.push(Record {
                context: context.to_vec(),
                values,
                quantity,
                source_sheet: None,
            });
        }

        records
    }

    /// Trimmed identifier of a row, if the identifier cell has text
    fn identifier(&self, values: &[CellValue]) -> Option<String> {
        let pos = self
            .required_labels
            .iter()
            .position(|l| l == self.identifier_label)?;
        values
            .get(pos)
            .and_then(CellValue::normalized)
            .filter(|id| !id.is_empty())
    }
}
