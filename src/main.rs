use clap::{Parser, Subcommand};
use sheetmerge::cli;
use sheetmerge::error::MergeResult;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetmerge")]
#[command(about = "Consolidate planning workbooks and split PO lists by vendor")]
#[command(long_about = "sheetmerge - Spreadsheet consolidation for planning workbooks

Merges the data tables of every sheet in a planning workbook into one
'Combined' table and joins the ordered quantities from an order export.
Also splits a PO list into one formatted workbook per vendor.

COMMANDS:
  consolidate - Combine sheets and attach ordered quantities
  split       - One workbook per vendor from a PO list
  columns     - Show the PO list columns and the detected vendor column
  config      - Print the effective configuration as YAML

EXAMPLES:
  sheetmerge consolidate plan.xlsx orders.xlsx       # Writes plan_processed.xlsx
  sheetmerge split po.xlsx --model-year MY27 --month JAN
  sheetmerge -c layout.yaml consolidate plan.xlsx orders.xlsx

LOGGING:
  Diagnostics go to stderr. Set RUST_LOG (e.g. RUST_LOG=sheetmerge=debug)
  to change the level.")]
#[command(version)]
struct Cli {
    /// YAML configuration file overriding labels, markers and scan windows
    #[arg(short, long, global = true, env = "SHEETMERGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Consolidate a planning workbook.

Every sheet except 'Summary' is scanned for the table whose header row names
the required labels (Planner, Published, Item Number, Item Description,
Oracle On Hand). Rows below the header are collected together with the
sheet's Model (B1, or the Summary description of the sheet's issue key in
A1) and B2C Date (B2). Ordered quantities come from the order export,
matched by item number.

The output holds a values-only copy of 'Summary' and the 'Combined' table.
Without --output it is written next to the main file as <name>_processed.xlsx.")]
    /// Combine sheets and attach ordered quantities
    Consolidate {
        /// Planning workbook (.xlsx, .xls, .ods)
        main_file: PathBuf,

        /// Order export with item and order quantity columns
        order_file: PathBuf,

        /// Output path (default: <main>_processed.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show sample matching results and debug logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Split a PO list into one workbook per vendor
    Split {
        /// Workbook containing the 'PO list' sheet
        input: PathBuf,

        /// Column to group by (default: first column naming a vendor or supplier)
        #[arg(long)]
        vendor_column: Option<String>,

        /// Model year used in the file names (e.g. MY26)
        #[arg(long)]
        model_year: Option<String>,

        /// Month used in the file names (e.g. SEP)
        #[arg(long)]
        month: Option<String>,

        /// Output directory (default: vendor_splits)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the PO list header columns
    Columns {
        /// Workbook containing the 'PO list' sheet
        input: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "sheetmerge=debug"
    } else {
        "sheetmerge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> MergeResult<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Consolidate { verbose, .. } | Commands::Split { verbose, .. } => *verbose,
        _ => false,
    };
    init_logging(verbose);

    match cli.command {
        Commands::Consolidate {
            main_file,
            order_file,
            output,
            verbose,
        } => cli::consolidate(main_file, order_file, output, cli.config, verbose),

        Commands::Split {
            input,
            vendor_column,
            model_year,
            month,
            output_dir,
            verbose: _,
        } => cli::split(input, vendor_column, model_year, month, output_dir, cli.config),

        Commands::Columns { input } => cli::columns(input, cli.config),

        Commands::Config => cli::show_config(cli.config),
    }
}
