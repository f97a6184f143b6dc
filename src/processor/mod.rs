//! Batch alignment over a date range.
//!
//! Runs the aligner for every validation date in an inclusive range with
//! bounded concurrency and writes the resulting feature table.

pub mod writer;

#[cfg(test)]
pub mod tests;

use self::writer::{FeatureTableWriter, OutputFormat};

use crate::aligner::{AlignedForecast, Aligner};
use crate::config::MosConfig;
use crate::error::{MosError, Result};
use crate::models::{Model, ProcessingStats};

use chrono::NaiveDate;
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use strum::IntoEnumIterator;
use tokio::task;
use tracing::{debug, info};

/// Aligns one station over a range of validation dates
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    aligner: Arc<Aligner>,
    config: Arc<MosConfig>,
    station: String,
    models: Vec<Model>,
    output: Option<FeatureTableWriter>,
    quiet: bool,
}

impl BatchProcessor {
    pub fn new(config: Arc<MosConfig>, station: impl Into<String>) -> Self {
        Self {
            aligner: Arc::new(Aligner::new(config.clone())),
            config,
            station: station.into().to_uppercase(),
            models: Model::iter().collect(),
            output: None,
            quiet: false,
        }
    }

    /// Restrict the models aligned
    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.models = models;
        self
    }

    /// Write the feature table to `path` after alignment
    pub fn with_output(mut self, path: PathBuf, format: OutputFormat) -> Self {
        self.output = Some(FeatureTableWriter::new(path, format));
        self
    }

    /// Suppress the progress bar and summary
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Align every date in `start..=end`, preserving date order
    pub async fn align_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Vec<AlignedForecast>, ProcessingStats)> {
        if start > end {
            return Err(MosError::configuration(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        if self.models.is_empty() {
            return Err(MosError::configuration("no models selected"));
        }

        let dates: Vec<NaiveDate> = start.iter_days().take_while(|date| *date <= end).collect();
        let concurrent_limit = self.config.max_concurrent_files.clamp(1, dates.len());
        debug!(
            "Aligning {} dates for {} with concurrency {}",
            dates.len(),
            self.station,
            concurrent_limit
        );

        let pb = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(dates.len() as u64)
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Aligning {}", self.station));

        let results = stream::iter(dates)
            .map(|date| {
                let aligner = self.aligner.clone();
                let station = self.station.clone();
                let models = self.models.clone();
                let pb = pb.clone();
                async move {
                    let result =
                        task::spawn_blocking(move || aligner.align(&station, date, &models)).await;
                    pb.inc(1);
                    result
                }
            })
            .buffered(concurrent_limit)
            .collect::<Vec<_>>()
            .await;

        pb.finish_with_message("Alignment complete");

        let mut stats = ProcessingStats::default();
        let mut forecasts = Vec::with_capacity(results.len());
        for result in results {
            let aligned = result??;
            stats.dates_processed += 1;
            stats.bulletins_parsed += aligned.available_count();
            stats.bulletins_missing += aligned.missing_count();
            stats.bulletins_rejected += aligned.rejected().len();
            forecasts.push(aligned);
        }

        Ok((forecasts, stats))
    }

    /// Align the range and write the feature table if an output is set
    pub async fn process(&self, start: NaiveDate, end: NaiveDate) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        if !self.quiet {
            println!(
                "{} {} {} {} {}",
                "Aligning".bright_green().bold(),
                self.station.bright_white().bold(),
                start,
                "to".bright_cyan(),
                end
            );
        }

        let (forecasts, mut stats) = self.align_range(start, end).await?;

        if let Some(writer) = &self.output {
            let writer = writer.clone();
            let (rows, writer) = task::spawn_blocking(move || {
                let rows = writer.write(&forecasts);
                (rows, writer)
            })
            .await?;
            stats.rows_written = rows?;
            stats.output_path = Some(writer.output_path().to_path_buf());
            info!(
                "Wrote {} rows to {}",
                stats.rows_written,
                writer.output_path().display()
            );
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        if !self.quiet {
            print_summary(&stats);
        }

        Ok(stats)
    }
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Dates aligned:".bright_cyan(),
        stats.dates_processed.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Bulletins parsed:".bright_cyan(),
        stats.bulletins_parsed.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Bulletins missing:".bright_cyan(),
        stats.bulletins_missing.to_string().bright_white()
    );
    if stats.bulletins_rejected > 0 {
        println!(
            "  {} {}",
            "Bulletins rejected:".bright_red(),
            stats.bulletins_rejected.to_string().bright_red().bold()
        );
    }
    if let Some(path) = &stats.output_path {
        println!(
            "  {} {} ({} rows)",
            "Output:".bright_cyan(),
            path.display(),
            stats.rows_written.to_string().bright_white().bold()
        );
    }
}
