//! Basic batch processing tests

use super::{create_test_archive, test_config};
use crate::models::Model;
use crate::processor::BatchProcessor;
use crate::processor::writer::OutputFormat;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_align_range_collects_stats() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_archive(&temp_dir);

    let processor = BatchProcessor::new(test_config(&root), "KAUS").with_quiet(true);
    let (forecasts, stats) = processor
        .align_range(date(2009, 1, 1), date(2009, 1, 3))
        .await
        .unwrap();

    assert_eq!(stats.dates_processed, 3);
    assert_eq!(stats.bulletins_parsed, 6);
    assert_eq!(stats.bulletins_rejected, 1);
    assert_eq!(stats.bulletins_missing, 17);

    let dates: Vec<_> = forecasts.iter().map(|f| f.validation_date).collect();
    assert_eq!(dates, vec![date(2009, 1, 1), date(2009, 1, 2), date(2009, 1, 3)]);

    // The only issuance from Dec 31 is the 18Z GFS run
    assert_eq!(forecasts[0].available_count(), 1);
    assert!(forecasts[0].get("GFS18Z").is_some());
}

#[tokio::test]
async fn test_process_writes_parquet() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_archive(&temp_dir);
    let output_path = temp_dir.path().join("output").join("kaus.parquet");

    let processor = BatchProcessor::new(test_config(&root), "kaus")
        .with_output(output_path.clone(), OutputFormat::Parquet)
        .with_quiet(true);
    let stats = processor
        .process(date(2009, 1, 2), date(2009, 1, 2))
        .await
        .unwrap();

    assert_eq!(stats.rows_written, 8);
    assert_eq!(stats.output_path, Some(output_path.clone()));
    assert!(output_path.exists());

    let df = ParquetReader::new(fs::File::open(&output_path).unwrap())
        .finish()
        .unwrap();
    assert_eq!(df.height(), 8);
    assert_eq!(df.width(), 14);
    assert_eq!(df.get_column_names()[2].as_str(), "source");

    let available = df
        .column("available")
        .unwrap()
        .as_materialized_series()
        .bool()
        .unwrap()
        .into_iter()
        .filter(|value| *value == Some(true))
        .count();
    assert_eq!(available, 5);

    let max_temp = df.column("max_temp").unwrap();
    assert_eq!(max_temp.null_count(), 3);
}

#[tokio::test]
async fn test_process_writes_csv() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_test_archive(&temp_dir);
    let output_path = temp_dir.path().join("features.csv");

    let processor = BatchProcessor::new(test_config(&root), "KAUS")
        .with_models(vec![Model::Gfs])
        .with_output(output_path.clone(), OutputFormat::Csv)
        .with_quiet(true);
    let stats = processor
        .process(date(2009, 1, 2), date(2009, 1, 2))
        .await
        .unwrap();

    assert_eq!(stats.rows_written, 4);

    let text = fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("validation_date,station,source,model,issuance_hour,available"));
    assert!(lines[1].starts_with("2009-01-02,KAUS,GFS00Z,GFS,0,true,63,44,3,3,31,83,S,"));
    assert!(lines[4].starts_with("2009-01-02,KAUS,GFS18Z,GFS,18,true,62,45,0,0,56,8,S,"));
}
