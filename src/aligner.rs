//! Forecast-to-observation alignment.
//!
//! For a validation date V, every issuance made on V - 1 (00Z, 06Z, 12Z and
//! 18Z for each selected model) forecasts V as its day 1. The aligner loads
//! those bulletins into one record keyed `{MODEL}{HH}Z` and derives the
//! day-1 features each one predicts. A missing or unparsable bulletin
//! leaves an absent slot and never aborts the rest of the alignment.

use crate::archive::BulletinArchive;
use crate::config::MosConfig;
use crate::constants::WIND_DIRECTION_SCALE;
use crate::error::{MosError, Result};
use crate::models::{Bulletin, FieldCode, IssuanceHour, Model};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{debug, warn};

/// Compass quadrant of the mean day-1 wind direction
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum WindQuadrant {
    #[strum(serialize = "N")]
    North,
    #[strum(serialize = "E")]
    East,
    #[strum(serialize = "S")]
    South,
    #[strum(serialize = "W")]
    West,
}

impl WindQuadrant {
    /// Classify a direction in degrees.
    ///
    /// N = (315, 360] and [0, 45], E = (45, 135], S = (135, 225],
    /// W = (225, 315].
    pub fn from_degrees(degrees: f64) -> Self {
        if degrees > 45.0 && degrees <= 135.0 {
            WindQuadrant::East
        } else if degrees > 135.0 && degrees <= 225.0 {
            WindQuadrant::South
        } else if degrees > 225.0 && degrees <= 315.0 {
            WindQuadrant::West
        } else {
            WindQuadrant::North
        }
    }
}

/// Day-1 values one issuance predicts for the validation date
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastFeatures {
    pub max_temp: Option<i32>,
    pub min_temp: Option<i32>,
    pub qpf_early: Option<i32>,
    pub qpf_late: Option<i32>,
    pub pop_early: Option<i32>,
    pub pop_late: Option<i32>,
    pub wind_quadrant: Option<WindQuadrant>,
    pub mean_wind_speed: Option<f64>,
}

impl ForecastFeatures {
    pub fn from_bulletin(bulletin: &Bulletin, date: NaiveDate) -> Self {
        let extremes = bulletin.extremes().get(date);
        let precip = bulletin.precip().get(date);

        let wind_direction = bulletin
            .numeric_on(FieldCode::Wdr, date)
            .and_then(|values| mean(&values))
            .map(|tens| tens * WIND_DIRECTION_SCALE);
        let wind_speed = bulletin
            .numeric_on(FieldCode::Wsp, date)
            .and_then(|values| mean(&values));

        Self {
            max_temp: extremes.and_then(|day| day.max),
            min_temp: extremes.and_then(|day| day.min),
            qpf_early: precip.map(|day| day.quantity[0]),
            qpf_late: precip.map(|day| day.quantity[1]),
            pop_early: precip.map(|day| day.probability[0]),
            pop_late: precip.map(|day| day.probability[1]),
            wind_quadrant: wind_direction.map(WindQuadrant::from_degrees),
            mean_wind_speed: wind_speed,
        }
    }
}

/// Mean of a series; absent if the series is empty or holds an absent value
pub fn mean(values: &[Option<i32>]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let total = values
        .iter()
        .map(|value| value.map(f64::from))
        .sum::<Option<f64>>()?;

    Some(total / values.len() as f64)
}

/// Why an issuance slot holds no bulletin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    Available,
    /// No bulletin file exists
    Missing,
    /// The file exists but could not be parsed
    Rejected(String),
}

/// One issuance of one model within an aligned forecast
#[derive(Debug, Clone)]
pub struct IssuanceSlot {
    pub model: Model,
    pub hour: IssuanceHour,
    pub bulletin: Option<Bulletin>,
    pub status: SlotStatus,
}

impl IssuanceSlot {
    /// Slot key such as `GFS18Z`
    pub fn key(&self) -> String {
        format!("{}{}", self.model, self.hour)
    }

    pub fn is_available(&self) -> bool {
        self.bulletin.is_some()
    }

    /// Day-1 features for `date`; all absent when the slot is empty
    pub fn features(&self, date: NaiveDate) -> ForecastFeatures {
        self.bulletin
            .as_ref()
            .map(|bulletin| ForecastFeatures::from_bulletin(bulletin, date))
            .unwrap_or_default()
    }
}

/// All issuances forecasting one validation date at one station
#[derive(Debug, Clone)]
pub struct AlignedForecast {
    pub station: String,
    pub validation_date: NaiveDate,
    pub slots: Vec<IssuanceSlot>,
}

impl AlignedForecast {
    pub fn slot(&self, key: &str) -> Option<&IssuanceSlot> {
        self.slots.iter().find(|slot| slot.key() == key)
    }

    /// Bulletin in a slot; `None` for unknown keys and absent slots alike
    pub fn get(&self, key: &str) -> Option<&Bulletin> {
        self.slot(key).and_then(|slot| slot.bulletin.as_ref())
    }

    pub fn keys(&self) -> Vec<String> {
        self.slots.iter().map(IssuanceSlot::key).collect()
    }

    pub fn available_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_available()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status == SlotStatus::Missing)
            .count()
    }

    /// Keys and error text of slots whose bulletin failed to parse
    pub fn rejected(&self) -> Vec<(String, &str)> {
        self.slots
            .iter()
            .filter_map(|slot| match &slot.status {
                SlotStatus::Rejected(reason) => Some((slot.key(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Day-1 features of every slot, in slot order
    pub fn features(&self) -> Vec<(String, ForecastFeatures)> {
        self.slots
            .iter()
            .map(|slot| (slot.key(), slot.features(self.validation_date)))
            .collect()
    }
}

/// Aligns archived issuances onto validation dates
#[derive(Debug, Clone)]
pub struct Aligner {
    archive: BulletinArchive,
    hours: Vec<IssuanceHour>,
}

impl Aligner {
    pub fn new(config: Arc<MosConfig>) -> Self {
        let hours = config.issuance_hours();
        Self {
            archive: BulletinArchive::new(config),
            hours,
        }
    }

    /// Align the issuances of `models` made the day before `validation_date`
    pub fn align(
        &self,
        station: &str,
        validation_date: NaiveDate,
        models: &[Model],
    ) -> Result<AlignedForecast> {
        let model_date = validation_date.pred_opt().ok_or_else(|| {
            MosError::configuration(format!("no day precedes {}", validation_date))
        })?;

        let mut slots = Vec::with_capacity(self.hours.len() * models.len());
        for &hour in &self.hours {
            for &model in models {
                slots.push(self.load_slot(station, model, model_date, hour));
            }
        }

        let aligned = AlignedForecast {
            station: station.to_uppercase(),
            validation_date,
            slots,
        };

        debug!(
            "Aligned {} for {}: {}/{} issuances available",
            aligned.station,
            validation_date,
            aligned.available_count(),
            aligned.slots.len()
        );

        Ok(aligned)
    }

    fn load_slot(
        &self,
        station: &str,
        model: Model,
        date: NaiveDate,
        hour: IssuanceHour,
    ) -> IssuanceSlot {
        let (bulletin, status) = match self.archive.load(station, model, date, hour) {
            Ok(bulletin) => (Some(bulletin), SlotStatus::Available),
            Err(e) if e.is_not_found() => {
                debug!("No {} {} bulletin for {} on {}", model, hour, station, date);
                (None, SlotStatus::Missing)
            }
            Err(e) => {
                warn!(
                    "Rejected {} {} bulletin for {} on {}: {}",
                    model, hour, station, date, e
                );
                (None, SlotStatus::Rejected(e.to_string()))
            }
        };

        IssuanceSlot {
            model,
            hour,
            bulletin,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn fixture_aligner() -> Aligner {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data");
        Aligner::new(Arc::new(MosConfig::default().with_data_root(root)))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_wind_quadrant_boundaries() {
        assert_eq!(WindQuadrant::from_degrees(0.0), WindQuadrant::North);
        assert_eq!(WindQuadrant::from_degrees(45.0), WindQuadrant::North);
        assert_eq!(WindQuadrant::from_degrees(45.5), WindQuadrant::East);
        assert_eq!(WindQuadrant::from_degrees(135.0), WindQuadrant::East);
        assert_eq!(WindQuadrant::from_degrees(225.0), WindQuadrant::South);
        assert_eq!(WindQuadrant::from_degrees(315.0), WindQuadrant::West);
        assert_eq!(WindQuadrant::from_degrees(320.0), WindQuadrant::North);
        assert_eq!(WindQuadrant::from_degrees(360.0), WindQuadrant::North);
        assert_eq!(WindQuadrant::South.to_string(), "S");
    }

    #[test]
    fn test_mean_propagates_absence() {
        assert_eq!(mean(&[Some(4), Some(5), Some(9)]), Some(6.0));
        assert_eq!(mean(&[Some(4), None, Some(9)]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_align_slot_order_and_keys() {
        let aligned = fixture_aligner()
            .align("KAUS", date(2009, 1, 2), &[Model::Gfs, Model::Nam])
            .unwrap();

        assert_eq!(
            aligned.keys(),
            vec![
                "GFS00Z", "NAM00Z", "GFS06Z", "NAM06Z", "GFS12Z", "NAM12Z", "GFS18Z", "NAM18Z"
            ]
        );
        assert_eq!(aligned.available_count(), 5);
        assert_eq!(aligned.missing_count(), 2);
    }

    #[test]
    fn test_absent_nam_slot_does_not_hide_gfs() {
        let aligned = fixture_aligner()
            .align("KAUS", date(2009, 1, 2), &[Model::Gfs, Model::Nam])
            .unwrap();

        assert!(aligned.get("NAM12Z").is_none());
        assert_eq!(aligned.slot("NAM12Z").unwrap().status, SlotStatus::Missing);

        let gfs = aligned.get("GFS18Z").unwrap();
        assert_eq!(gfs.issuance_hour(), IssuanceHour::Z18);

        let features = aligned.slot("GFS18Z").unwrap().features(date(2009, 1, 2));
        assert_eq!(features.max_temp, Some(62));
        assert_eq!(features.min_temp, Some(45));
        assert_eq!(features.pop_early, Some(56));
        assert_eq!(features.pop_late, Some(8));
        assert_eq!(features.qpf_early, Some(0));
        assert_eq!(features.wind_quadrant, Some(WindQuadrant::South));
        assert_eq!(features.mean_wind_speed, Some(7.5));
    }

    #[test]
    fn test_unparsable_bulletin_is_rejected() {
        let aligned = fixture_aligner()
            .align("KAUS", date(2009, 1, 2), &[Model::Nam])
            .unwrap();

        let rejected = aligned.rejected();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].0, "NAM06Z");
        assert!(rejected[0].1.contains("WSP"));
        assert!(aligned.get("NAM00Z").is_some());
    }

    #[test]
    fn test_absent_slot_has_absent_features() {
        let aligned = fixture_aligner()
            .align("KAUS", date(2009, 1, 2), &[Model::Nam])
            .unwrap();

        let features = aligned.slot("NAM18Z").unwrap().features(date(2009, 1, 2));
        assert_eq!(features, ForecastFeatures::default());
    }

    #[test]
    fn test_morning_issuance_features() {
        let aligned = fixture_aligner()
            .align("KAUS", date(2009, 1, 2), &[Model::Gfs])
            .unwrap();

        let features = aligned.features();
        assert_eq!(features.len(), 4);

        let (key, gfs00) = &features[0];
        assert_eq!(key, "GFS00Z");
        assert_eq!(gfs00.max_temp, Some(63));
        assert_eq!(gfs00.min_temp, Some(44));
        assert_eq!(gfs00.pop_early, Some(31));
        assert_eq!(gfs00.qpf_late, Some(3));
        assert_eq!(gfs00.mean_wind_speed, Some(6.0));

        let (_, gfs06) = &features[1];
        assert_eq!(gfs06.mean_wind_speed, Some(6.5));
        assert_eq!(gfs06.max_temp, Some(64));
    }

    #[test]
    fn test_date_without_issuances() {
        let aligned = fixture_aligner()
            .align("KAUS", date(2011, 6, 1), &[Model::Gfs, Model::Nam])
            .unwrap();

        assert_eq!(aligned.available_count(), 0);
        assert_eq!(aligned.missing_count(), 8);
        assert!(
            aligned
                .features()
                .iter()
                .all(|(_, features)| features.max_temp.is_none())
        );
    }
}
