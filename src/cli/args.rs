//! Command-line argument definitions
//!
//! The complete CLI surface using the clap derive API: one subcommand per
//! operation plus global options for configuration and logging.

use crate::error::{MosError, Result};
use crate::models::Model;
use crate::processor::writer::OutputFormat;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse and align archived NWS MOS forecast bulletins
///
/// Reads single-station GFS (MAV) and NAM (MET) bulletins from a per-station
/// archive, aligns the issuances that forecast each validation date, and
/// exports day-1 forecast features for verification against observations.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mosobs",
    version,
    about = "Parse and align archived NWS MOS forecast bulletins",
    long_about = "Parses fixed-width NWS Model Output Statistics bulletins, aligns the GFS and NAM \
                  issuances from the day before each validation date, and writes day-1 forecast \
                  features (max/min, 12-hour PoP and QPF, wind) to Parquet or CSV."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// ~/.config/mosobs/config.toml and falls back to built-in defaults.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Root of the bulletin archive, overriding the configuration
    #[arg(long = "data-root", value_name = "DIR", global = true)]
    pub data_root: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse one bulletin file and print its derived maps
    Parse(ParseArgs),
    /// Align the issuances forecasting one validation date
    Align(AlignArgs),
    /// Align a date range and write a feature table
    Process(ProcessArgs),
    /// Split a multi-station compilation into archived bulletins
    Split(SplitArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct ParseArgs {
    /// Bulletin file to parse
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Parser)]
pub struct AlignArgs {
    /// Station identifier, e.g. KAUS
    #[arg(short = 's', long = "station")]
    pub station: String,

    /// Validation date (YYYY-MM-DD)
    #[arg(short = 'd', long = "date", value_name = "DATE")]
    pub date: NaiveDate,

    /// Models to align (comma-separated)
    #[arg(
        short = 'm',
        long = "models",
        value_delimiter = ',',
        default_values = ["GFS", "NAM"]
    )]
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, Parser)]
pub struct ProcessArgs {
    /// Station identifier, e.g. KAUS
    #[arg(short = 's', long = "station")]
    pub station: String,

    /// First validation date (YYYY-MM-DD)
    #[arg(long = "start", value_name = "DATE")]
    pub start: NaiveDate,

    /// Last validation date, inclusive (YYYY-MM-DD)
    #[arg(long = "end", value_name = "DATE")]
    pub end: NaiveDate,

    /// Output file for the feature table
    ///
    /// Defaults to ./{STATION}_features.{parquet,csv}
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Output format; inferred from the output extension when omitted
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Models to align (comma-separated)
    #[arg(
        short = 'm',
        long = "models",
        value_delimiter = ',',
        default_values = ["GFS", "NAM"]
    )]
    pub models: Vec<Model>,

    /// Number of dates aligned concurrently
    #[arg(short = 'j', long = "workers", value_name = "COUNT")]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Parser)]
pub struct SplitArgs {
    /// Decompressed compilation file
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Station identifier to extract
    #[arg(short = 's', long = "station")]
    pub station: String,

    /// Model of the compilation
    #[arg(short = 'm', long = "model", default_value = "GFS")]
    pub model: Model,
}

impl Args {
    /// Determine the log level from verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check explicitly given paths before any work starts
    pub fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(MosError::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        if let Commands::Process(process) = &self.command {
            process.validate()?;
        }

        Ok(())
    }
}

impl ProcessArgs {
    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(MosError::configuration(format!(
                "Start date {} is after end date {}",
                self.start, self.end
            )));
        }

        if self.workers == Some(0) {
            return Err(MosError::configuration(
                "Number of workers must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Resolve output path and format from the flags given
    pub fn output(&self) -> (PathBuf, OutputFormat) {
        match (&self.output_path, self.format) {
            (Some(path), Some(format)) => (path.clone(), format),
            (Some(path), None) => (path.clone(), OutputFormat::from_path(path)),
            (None, format) => {
                let format = format.unwrap_or_default();
                let path = PathBuf::from(format!(
                    "{}_features.{}",
                    self.station.to_uppercase(),
                    format.extension()
                ));
                (path, format)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_command() {
        let args = Args::try_parse_from([
            "mosobs",
            "-vv",
            "process",
            "--station",
            "KAUS",
            "--start",
            "2009-01-01",
            "--end",
            "2009-01-31",
            "--models",
            "gfs",
            "-o",
            "out/kaus.csv",
        ])
        .unwrap();

        assert_eq!(args.get_log_level(), "debug");
        match &args.command {
            Commands::Process(process) => {
                assert_eq!(process.models, vec![Model::Gfs]);
                assert_eq!(
                    process.output(),
                    (PathBuf::from("out/kaus.csv"), OutputFormat::Csv)
                );
                assert!(process.validate().is_ok());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_models_and_output() {
        let args = Args::try_parse_from([
            "mosobs", "process", "-s", "kaus", "--start", "2009-01-01", "--end", "2009-01-01",
        ])
        .unwrap();

        match &args.command {
            Commands::Process(process) => {
                assert_eq!(process.models, vec![Model::Gfs, Model::Nam]);
                assert_eq!(
                    process.output(),
                    (
                        PathBuf::from("KAUS_features.parquet"),
                        OutputFormat::Parquet
                    )
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_reversed_range_fails_validation() {
        let args = Args::try_parse_from([
            "mosobs", "process", "-s", "KAUS", "--start", "2009-02-01", "--end", "2009-01-01",
        ])
        .unwrap();

        assert!(args.validate().is_err());
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = Args::try_parse_from([
            "mosobs", "-q", "-vvv", "align", "-s", "KAUS", "-d", "2009-01-02",
        ])
        .unwrap();

        assert_eq!(args.get_log_level(), "error");
    }

    #[test]
    fn test_invalid_model_rejected() {
        let result = Args::try_parse_from([
            "mosobs", "split", "-i", "mav.txt", "-s", "KAUS", "-m", "ECMWF",
        ]);
        assert!(result.is_err());
    }
}
