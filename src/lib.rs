//! sheetmerge - consolidation of planning workbooks
//!
//! Collects the data tables scattered over the sheets of a planning workbook
//! into one table, joins ordered quantities from a separate order export and
//! writes the result as a new workbook. A second tool splits a PO list into
//! one formatted workbook per vendor.
//!
//! # Example
//!
//! ```no_run
//! use sheetmerge::config::Config;
//! use sheetmerge::runner::run_consolidate;
//! use std::path::Path;
//!
//! let report = run_consolidate(
//!     Path::new("plan.xlsx"),
//!     Path::new("orders.xlsx"),
//!     None,
//!     &Config::default(),
//! )?;
//!
//! println!("Matched: {:.1}%", report.stats.match_rate);
//! # Ok::<(), sheetmerge::error::MergeError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod runner;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{MergeError, MergeResult};
pub use types::{CellValue, Grid, MatchStats, OutputTable, Record, Workbook};
