use crate::config::Config;
use crate::error::MergeResult;
use crate::runner::{self, ConsolidateReport, SplitReport};
use crate::types::format_number;
use chrono::Local;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Format a percentage with one decimal place
fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate)
}

/// Status column of the sample listing; zero counts as unmatched, as in
/// the match statistics
fn match_status(quantity: Option<f64>) -> &'static str {
    match quantity {
        Some(q) if q != 0.0 => "MATCHED",
        _ => "NO MATCH",
    }
}

fn print_consolidate_report(report: &ConsolidateReport, verbose: bool) {
    println!("{}", "✅ Consolidation complete".bold().green());
    println!("   Output: {}", report.output_path.display().to_string().bright_blue());
    println!(
        "   Sheets: {} processed, {} skipped",
        report.processed_sheets.len(),
        report.skipped_sheets.len()
    );
    for sheet in &report.skipped_sheets {
        println!("      {} {} (no required table)", "⚠️".yellow(), sheet);
    }
    println!("   Order items: {}", report.order_items);
    if report.order_warnings > 0 {
        println!(
            "   {} {} order rows had an invalid quantity",
            "⚠️".yellow(),
            report.order_warnings
        );
    }
    println!(
        "   Ordered quantities found for {} out of {} items ({})",
        report.stats.matched_records.to_string().bold(),
        report.stats.total_records,
        format_rate(report.stats.match_rate)
    );

    if verbose && !report.samples.is_empty() {
        println!("\n{}", "📋 Sample matching results:".cyan());
        for sample in &report.samples {
            let qty = sample.quantity.map(format_number).unwrap_or_default();
            let status = match match_status(sample.quantity) {
                "MATCHED" => "MATCHED".green(),
                other => other.red(),
            };
            println!("   '{}' -> {} ({})", sample.item, qty, status);
        }
    }
}

/// Execute the consolidate command
pub fn consolidate(
    main_file: PathBuf,
    order_file: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    verbose: bool,
) -> MergeResult<()> {
    println!("{}", "📊 sheetmerge - Consolidating sheets".bold().green());
    println!("   Main file:  {}", main_file.display());
    println!("   Order file: {}", order_file.display());
    println!();

    let config = Config::load_or_default(config.as_deref())?;
    let report = runner::run_consolidate(&main_file, &order_file, output.as_deref(), &config)?;
    print_consolidate_report(&report, verbose);
    Ok(())
}

fn print_split_report(report: &SplitReport) {
    println!("{}", "✅ Split complete".bold().green());
    println!(
        "   Vendor column: {} (header row {})",
        report.vendor_column.bright_blue(),
        report.header_row + 1
    );
    if !report.missing_columns.is_empty() {
        println!(
            "   {} Missing columns: {}",
            "⚠️".yellow(),
            report.missing_columns.join(", ")
        );
    }
    println!("   Keeping {} columns", report.columns.len());
    for file in &report.files {
        println!(
            "   📄 {} ({} rows)",
            file.file_name.cyan(),
            file.rows
        );
    }
    println!(
        "\n   Created {} files in '{}'",
        report.files.len().to_string().bold(),
        display_path(&report.output_dir)
    );
}

/// Execute the split command
pub fn split(
    input: PathBuf,
    vendor_column: Option<String>,
    model_year: Option<String>,
    month: Option<String>,
    output_dir: Option<PathBuf>,
    config: Option<PathBuf>,
) -> MergeResult<()> {
    println!("{}", "✂️  sheetmerge - Splitting by vendor".bold().green());
    println!("   File: {}", input.display());
    println!();

    let mut config = Config::load_or_default(config.as_deref())?;
    if let Some(year) = model_year {
        config.split.model_year = year;
    }
    if let Some(m) = month {
        config.split.month = m;
    }
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.split.output_dir));

    let report = runner::run_split(
        &input,
        vendor_column.as_deref(),
        &output_dir,
        &config.split,
        Local::now().date_naive(),
    )?;
    print_split_report(&report);
    Ok(())
}

/// Execute the columns command
pub fn columns(input: PathBuf, config: Option<PathBuf>) -> MergeResult<()> {
    let config = Config::load_or_default(config.as_deref())?;
    let report = runner::inspect_columns(&input, &config.split)?;

    println!(
        "{}",
        format!("📋 Columns of '{}' (header row {})", report.sheet, report.header_row + 1)
            .bold()
            .green()
    );
    for column in &report.columns {
        let marker = if Some(column) == report.suggested_vendor_column.as_ref() {
            " ← vendor".yellow().to_string()
        } else {
            String::new()
        };
        println!("   {}{}", column.cyan(), marker);
    }
    if report.suggested_vendor_column.is_none() {
        println!("   {} No vendor column detected", "⚠️".yellow());
    }
    Ok(())
}

/// Execute the config command - print the effective configuration
pub fn show_config(config: Option<PathBuf>) -> MergeResult<()> {
    let config = Config::load_or_default(config.as_deref())?;
    print!("{}", config.to_yaml()?);
    Ok(())
}

/// Resolve a relative path against the working directory for display
pub fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
