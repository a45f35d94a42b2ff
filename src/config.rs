//! Configuration file handling.
//!
//! Settings come from `.rusty-marks.toml` (or `--config`); command-line
//! flags override them. The classification thresholds are fixed and cannot
//! be configured.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{Args, OutputFormat, Section};
use crate::data::summary::DEFAULT_HISTOGRAM_BINS;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".rusty-marks.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// How the roster is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Identifier column; the first column when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_column: Option<String>,
}

/// What gets printed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Sections of the text report, in print order.
    #[serde(default = "Section::all")]
    pub sections: Vec<Section>,

    /// Bin count for the Total distribution.
    #[serde(default = "default_bins")]
    pub histogram_bins: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            sections: Section::all(),
            histogram_bins: default_bins(),
        }
    }
}

fn default_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref id_column) = args.id_column {
            self.input.id_column = Some(id_column.clone());
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref sections) = args.sections {
            self.report.sections = sections.clone();
        }
        if let Some(bins) = args.bins {
            self.report.histogram_bins = bins;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.input.id_column.is_none());
        assert_eq!(config.report.format, OutputFormat::Text);
        assert_eq!(config.report.histogram_bins, 10);
        assert_eq!(config.report.sections, Section::all());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[input]
id_column = "Roll"

[report]
format = "json"
sections = ["processed", "low-average"]
histogram_bins = 4
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.id_column.as_deref(), Some("Roll"));
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(
            config.report.sections,
            vec![Section::Processed, Section::LowAverage]
        );
        assert_eq!(config.report.histogram_bins, 4);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("[report]\nhistogram_bins = 3\n").unwrap();
        assert_eq!(config.report.sections, Section::all());
        assert_eq!(config.report.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config: Config =
            toml::from_str("[report]\nhistogram_bins = 3\nformat = \"json\"\n").unwrap();
        let args = Args::parse_from([
            "rusty-marks",
            "roster.csv",
            "--bins",
            "7",
            "--id-column",
            "Name",
        ]);
        config.merge_with_args(&args);
        assert_eq!(config.report.histogram_bins, 7);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.input.id_column.as_deref(), Some("Name"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[report]"));
        let round: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(round.report.histogram_bins, 10);
    }
}
