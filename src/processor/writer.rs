//! Feature table writing
//!
//! Flattens aligned forecasts into a long-format table, one row per
//! validation date and issuance slot, and writes it as Parquet or CSV.
//! Absent values become nulls.

use crate::aligner::AlignedForecast;
use crate::error::Result;

use clap::ValueEnum;
use polars::prelude::{Column, CsvWriter, DataFrame, ParquetWriter, SerWriter};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Table file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Apache Parquet
    #[default]
    Parquet,
    /// Comma-separated values with a header row
    Csv,
}

impl OutputFormat {
    /// Infer the format from a file extension, defaulting to Parquet
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
            _ => OutputFormat::Parquet,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Writes aligned forecasts as a feature table
#[derive(Debug, Clone)]
pub struct FeatureTableWriter {
    output_path: PathBuf,
    format: OutputFormat,
}

impl FeatureTableWriter {
    pub fn new(output_path: PathBuf, format: OutputFormat) -> Self {
        Self {
            output_path,
            format,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Build the long-format feature table
    pub fn to_dataframe(forecasts: &[AlignedForecast]) -> Result<DataFrame> {
        let mut validation_date = Vec::new();
        let mut station = Vec::new();
        let mut source = Vec::new();
        let mut model = Vec::new();
        let mut issuance_hour = Vec::new();
        let mut available = Vec::new();
        let mut max_temp = Vec::new();
        let mut min_temp = Vec::new();
        let mut qpf_early = Vec::new();
        let mut qpf_late = Vec::new();
        let mut pop_early = Vec::new();
        let mut pop_late = Vec::new();
        let mut wind_quadrant = Vec::new();
        let mut mean_wind_speed = Vec::new();

        for forecast in forecasts {
            for slot in &forecast.slots {
                let features = slot.features(forecast.validation_date);

                validation_date.push(forecast.validation_date.format("%Y-%m-%d").to_string());
                station.push(forecast.station.clone());
                source.push(slot.key());
                model.push(slot.model.to_string());
                issuance_hour.push(slot.hour.hour() as i32);
                available.push(slot.is_available());
                max_temp.push(features.max_temp);
                min_temp.push(features.min_temp);
                qpf_early.push(features.qpf_early);
                qpf_late.push(features.qpf_late);
                pop_early.push(features.pop_early);
                pop_late.push(features.pop_late);
                wind_quadrant.push(features.wind_quadrant.map(|q| q.to_string()));
                mean_wind_speed.push(features.mean_wind_speed);
            }
        }

        let df = DataFrame::new(vec![
            Column::new("validation_date".into(), validation_date),
            Column::new("station".into(), station),
            Column::new("source".into(), source),
            Column::new("model".into(), model),
            Column::new("issuance_hour".into(), issuance_hour),
            Column::new("available".into(), available),
            Column::new("max_temp".into(), max_temp),
            Column::new("min_temp".into(), min_temp),
            Column::new("qpf_early".into(), qpf_early),
            Column::new("qpf_late".into(), qpf_late),
            Column::new("pop_early".into(), pop_early),
            Column::new("pop_late".into(), pop_late),
            Column::new("wind_quadrant".into(), wind_quadrant),
            Column::new("mean_wind_speed".into(), mean_wind_speed),
        ])?;

        Ok(df)
    }

    /// Write the table and return the number of rows written
    pub fn write(&self, forecasts: &[AlignedForecast]) -> Result<usize> {
        let mut df = Self::to_dataframe(forecasts)?;

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = std::fs::File::create(&self.output_path)?;
        match self.format {
            OutputFormat::Parquet => {
                ParquetWriter::new(file).finish(&mut df)?;
            }
            OutputFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(&mut df)?;
            }
        }

        debug!(
            "Wrote {} feature rows to {} ({:?})",
            df.height(),
            self.output_path.display(),
            self.format
        );

        Ok(df.height())
    }
}
