//! CLI command handlers

pub mod commands;

pub use commands::{columns, consolidate, show_config, split};
