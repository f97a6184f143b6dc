//! Integration tests for forecast alignment and feature export

use chrono::NaiveDate;
use mosobs::aligner::SlotStatus;
use mosobs::processor::writer::{FeatureTableWriter, OutputFormat};
use mosobs::{Aligner, Model, MosConfig, WindQuadrant};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn fixture_aligner() -> Aligner {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data");
    Aligner::new(Arc::new(MosConfig::default().with_data_root(root)))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Missing 12Z NAM and rejected 06Z NAM leave absent slots while every GFS
/// issuance still contributes its day-1 values
#[test]
fn test_alignment_with_partial_archive() {
    let aligned = fixture_aligner()
        .align("kaus", date(2009, 1, 2), &[Model::Gfs, Model::Nam])
        .unwrap();

    assert_eq!(aligned.station, "KAUS");
    assert_eq!(aligned.slots.len(), 8);

    let statuses: Vec<(String, bool)> = aligned
        .slots
        .iter()
        .map(|slot| (slot.key(), slot.is_available()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("GFS00Z".to_string(), true),
            ("NAM00Z".to_string(), true),
            ("GFS06Z".to_string(), true),
            ("NAM06Z".to_string(), false),
            ("GFS12Z".to_string(), true),
            ("NAM12Z".to_string(), false),
            ("GFS18Z".to_string(), true),
            ("NAM18Z".to_string(), false),
        ]
    );
    assert!(matches!(
        aligned.slot("NAM06Z").unwrap().status,
        SlotStatus::Rejected(_)
    ));
}

#[test]
fn test_day_one_features_per_issuance() {
    let aligned = fixture_aligner()
        .align("KAUS", date(2009, 1, 2), &[Model::Gfs, Model::Nam])
        .unwrap();
    let features: Vec<_> = aligned.features();

    let lookup = |key: &str| {
        features
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, f)| *f)
            .unwrap()
    };

    let gfs12 = lookup("GFS12Z");
    assert_eq!(gfs12.max_temp, Some(63));
    assert_eq!(gfs12.min_temp, Some(42));
    assert_eq!(gfs12.pop_early, Some(81));
    assert_eq!(gfs12.pop_late, Some(33));
    assert_eq!(gfs12.qpf_early, Some(1));
    assert_eq!(gfs12.mean_wind_speed, Some(7.0));
    assert_eq!(gfs12.wind_quadrant, Some(WindQuadrant::South));

    let nam00 = lookup("NAM00Z");
    assert_eq!(nam00.max_temp, Some(61));
    assert_eq!(nam00.min_temp, Some(42));
    assert_eq!(nam00.pop_early, Some(35));
    assert_eq!(nam00.mean_wind_speed, Some(4.0));

    let nam12 = lookup("NAM12Z");
    assert!(nam12.max_temp.is_none());
    assert!(nam12.wind_quadrant.is_none());
}

#[test]
fn test_feature_table_export() {
    let temp_dir = TempDir::new().unwrap();
    let aligner = fixture_aligner();
    let forecasts: Vec<_> = [date(2009, 1, 1), date(2009, 1, 2)]
        .into_iter()
        .map(|d| aligner.align("KAUS", d, &[Model::Gfs]).unwrap())
        .collect();

    let df = FeatureTableWriter::to_dataframe(&forecasts).unwrap();
    assert_eq!(df.height(), 8);
    assert_eq!(df.width(), 14);

    let path = temp_dir.path().join("nested").join("features.csv");
    let writer = FeatureTableWriter::new(path.clone(), OutputFormat::from_path(&path));
    assert_eq!(writer.write(&forecasts).unwrap(), 8);

    let text = std::fs::read_to_string(&path).unwrap();
    let first_day: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("2009-01-01"))
        .collect();
    assert_eq!(first_day.len(), 4);
    assert!(first_day[0].contains("GFS00Z,GFS,0,false"));
    assert!(first_day[3].starts_with("2009-01-01,KAUS,GFS18Z,GFS,18,true,48,30,2,2,58,10,"));
}
