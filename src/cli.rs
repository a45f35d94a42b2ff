//! Command-line interface argument parsing.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rusty Marks - student marks analyzer
///
/// Reads a roster of student marks (CSV, JSON or Parquet), adds Total and
/// Average columns, and lists students with a low average or lagging in
/// any subject.
///
/// Examples:
///   rusty-marks marks.csv
///   rusty-marks marks.csv --student "Asha" --section student
///   rusty-marks marks.parquet --id-column Roll --format json
///   rusty-marks --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Roster file to analyze (.csv, .json, .parquet)
    #[arg(value_name = "FILE", required_unless_present = "init_config")]
    pub file: Option<PathBuf>,

    /// Column holding student names or ids (default: first column)
    #[arg(long, value_name = "COLUMN")]
    pub id_column: Option<String>,

    /// Show the rows of one student
    #[arg(short, long, value_name = "ID")]
    pub student: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Number of bins for the Total distribution
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// Report sections to print (comma-separated)
    ///
    /// Example: --section processed,low-average,lagging
    #[arg(long = "section", value_name = "SECTIONS", value_delimiter = ',')]
    pub sections: Option<Vec<Section>>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .rusty-marks.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .rusty-marks.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Text tables (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

/// A block of the text report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    /// The roster as loaded
    Uploaded,
    /// Roster with Total and Average
    Processed,
    /// Rows of the selected student
    Student,
    /// Students with Average < 40
    LowAverage,
    /// Students with any subject mark < 35
    Lagging,
    /// Histogram, per-student averages, scatter and subject spread data
    Charts,
}

impl Section {
    pub fn all() -> Vec<Section> {
        vec![
            Section::Uploaded,
            Section::Processed,
            Section::Student,
            Section::LowAverage,
            Section::Lagging,
            Section::Charts,
        ]
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref file) = self.file {
            if !file.is_file() {
                return Err(format!("Roster file does not exist: {}", file.display()));
            }
        }

        if self.bins == Some(0) {
            return Err("Bins must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            log::LevelFilter::Error
        } else if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }
}
