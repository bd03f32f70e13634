//! Run configuration
//!
//! Every label, marker and scan window the extractors rely on lives here so a
//! differently laid out workbook can be handled with a YAML file instead of a
//! rebuild. All fields have defaults; a config file only needs the keys it
//! changes.

use crate::core::header::LabelSet;
use crate::error::{MergeError, MergeResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Canonical label for the identifier column of the order document
pub const ORDER_ITEM_LABEL: &str = "Item";
/// Canonical label for the quantity column of the order document
pub const ORDER_QUANTITY_LABEL: &str = "Order Quantity";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub consolidate: ConsolidateConfig,
    pub split: SplitConfig,
}

impl Config {
    /// Load a YAML configuration file
    pub fn load(path: &Path) -> MergeResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> MergeResult<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to the defaults
    pub fn load_or_default(path: Option<&Path>) -> MergeResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_yaml(&self) -> MergeResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> MergeResult<()> {
        let c = &self.consolidate;
        if c.required_labels.is_empty() {
            return Err(MergeError::Config(
                "consolidate.required_labels must not be empty".to_string(),
            ));
        }
        if !c.required_labels.contains(&c.identifier_label) {
            return Err(MergeError::Config(format!(
                "consolidate.identifier_label '{}' is not one of the required labels",
                c.identifier_label
            )));
        }
        if c.min_header_matches == 0 {
            return Err(MergeError::Config(
                "consolidate.min_header_matches must be at least 1".to_string(),
            ));
        }
        if c.order.identifier_synonyms.is_empty() || c.order.quantity_synonyms.is_empty() {
            return Err(MergeError::Config(
                "consolidate.order synonym lists must not be empty".to_string(),
            ));
        }
        if self.split.required_columns.is_empty() {
            return Err(MergeError::Config(
                "split.required_columns must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A positional cell address, 0-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

/// A per-sheet context value read from a fixed cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextCell {
    pub name: String,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidateConfig {
    pub summary_sheet: String,
    pub output_sheet: String,
    /// Appended to the main file's stem when no output path is given
    pub output_suffix: String,
    pub required_labels: Vec<String>,
    /// Required label whose value keys the quantity lookup
    pub identifier_label: String,
    /// The first entry is the one replaced by the Summary description
    pub context_cells: Vec<ContextCell>,
    /// Cell holding the sheet's own issue key
    pub identity_cell: CellRef,
    pub min_header_matches: usize,
    /// Header scan window for data sheets; None scans every row
    pub sheet_scan_window: Option<usize>,
    pub quantity_column: String,
    pub source_column: String,
    pub summary: SummaryConfig,
    pub order: OrderConfig,
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        Self {
            summary_sheet: "Summary".to_string(),
            output_sheet: "Combined".to_string(),
            output_suffix: "_processed".to_string(),
            required_labels: [
                "Planner",
                "Published",
                "Item Number",
                "Item Description",
                "Oracle On Hand",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            identifier_label: "Item Number".to_string(),
            context_cells: vec![
                ContextCell {
                    name: "Model".to_string(),
                    row: 0,
                    col: 1,
                },
                ContextCell {
                    name: "B2C Date".to_string(),
                    row: 1,
                    col: 1,
                },
            ],
            identity_cell: CellRef { row: 0, col: 0 },
            min_header_matches: 2,
            sheet_scan_window: None,
            quantity_column: "Ordered Qty".to_string(),
            source_column: "Source_Sheet".to_string(),
            summary: SummaryConfig::default(),
            order: OrderConfig::default(),
        }
    }
}

impl ConsolidateConfig {
    /// Labels searched for in every data sheet
    pub fn sheet_labels(&self) -> LabelSet {
        LabelSet::exact(&self.required_labels)
    }

    /// Output column names in table order
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.context_cells.iter().map(|c| c.name.clone()).collect();
        columns.extend(self.required_labels.iter().cloned());
        columns.push(self.quantity_column.clone());
        columns.push(self.source_column.clone());
        columns
    }
}

/// Markers of the key/description table on the Summary sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub key_marker: String,
    pub value_marker: String,
    /// None scans the whole sheet
    pub scan_window: Option<usize>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            key_marker: "Issue key".to_string(),
            value_marker: "Summary".to_string(),
            scan_window: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Sheet holding the order table; None uses the first sheet
    pub sheet: Option<String>,
    pub identifier_synonyms: Vec<String>,
    pub quantity_synonyms: Vec<String>,
    pub scan_window: Option<usize>,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            identifier_synonyms: [
                "item",
                "item number",
                "item_number",
                "itemNumber",
                "part",
                "part number",
                "part_number",
                "partNumber",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            quantity_synonyms: [
                "order quantity",
                "order qty",
                "ordered quantity",
                "quantity",
                "qty",
                "order_quantity",
                "ordered_qty",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            scan_window: Some(15),
        }
    }
}

impl OrderConfig {
    pub fn labels(&self) -> LabelSet {
        LabelSet::default()
            .with_label(ORDER_ITEM_LABEL, &self.identifier_synonyms)
            .with_label(ORDER_QUANTITY_LABEL, &self.quantity_synonyms)
    }
}

/// Settings of the per-vendor splitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub sheet: String,
    /// Rows inspected when looking for the header row
    pub header_window: usize,
    pub header_keywords: Vec<String>,
    /// A header row with fewer named cells triggers a wider search
    pub min_named_columns: usize,
    pub required_columns: Vec<String>,
    pub vendor_keywords: Vec<String>,
    pub output_dir: String,
    pub file_prefix: String,
    pub model_year: String,
    pub month: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            sheet: "PO list".to_string(),
            header_window: 5,
            header_keywords: [
                "vendor",
                "po",
                "number",
                "model",
                "category",
                "item",
                "description",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_named_columns: 3,
            required_columns: [
                "Vendor name",
                "Sbc Market Code",
                "Po number",
                "Rider Experience",
                "Category",
                "Model",
                "Item number",
                "Item description",
                "Pod Quantity Ordered",
                "Ship To Loc Name",
                "prod month",
                "Upc",
                "Mpl Model Year",
                "Need by date",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            vendor_keywords: vec!["vendor".to_string(), "supplier".to_string()],
            output_dir: "vendor_splits".to_string(),
            file_prefix: "TRENDPOWER".to_string(),
            model_year: "MY26".to_string(),
            month: "SEP".to_string(),
        }
    }
}
