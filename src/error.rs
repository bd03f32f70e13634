use std::path::Path;
use thiserror::Error;

pub type MergeResult<T> = Result<T, MergeError>;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to open workbook '{path}': {message}")]
    Open { path: String, message: String },

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("No tables found: {0}")]
    NoTables(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MergeError {
    /// Wrap a reader failure for the workbook at `path`
    pub fn open(path: &Path, cause: impl std::fmt::Display) -> Self {
        MergeError::Open {
            path: path.display().to_string(),
            message: cause.to_string(),
        }
    }
}
