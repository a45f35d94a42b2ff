//! Rusty Marks - student marks analyzer.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, unreadable roster or roster without marks

mod analysis;
mod cli;
mod config;
mod data;
mod report;

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error, info};

use analysis::{analyze, AnalysisOptions};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use data::model::CellValue;

fn main() {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
        return;
    }

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    debug!("Arguments: {args:?}");

    if let Err(e) = run(&args) {
        error!("Analysis failed: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Handle --init-config: write a default configuration file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        anyhow::bail!("{DEFAULT_CONFIG_FILE} already exists. Remove it first or edit it manually.");
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {DEFAULT_CONFIG_FILE}"))?;

    println!("Created {DEFAULT_CONFIG_FILE} with default settings.");
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(args);
    debug!("Config: {config:?}");

    let file = args.file.as_deref().context("no roster file given")?;
    let roster = data::loader::load_file(file)?;

    let options = AnalysisOptions {
        identifier: config.input.id_column.clone(),
        student: args.student.as_deref().map(CellValue::parse),
        histogram_bins: config.report.histogram_bins,
    };
    let analysis = analyze(&roster, &options)
        .with_context(|| format!("analysing {}", file.display()))?;

    info!(
        "Subject columns: {}",
        analysis.enriched.subject_columns().join(", ")
    );

    let output = match config.report.format {
        OutputFormat::Text => report::render_text(&roster, &analysis, &config.report.sections)?,
        OutputFormat::Json => report::render_json(&analysis)?,
    };
    println!("{output}");
    Ok(())
}
