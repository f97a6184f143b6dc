//! Core data structures for MOS bulletin processing.
//!
//! Defines the model and issuance-hour enumerations, the closed set of field
//! codes with their decode rules, and the immutable records produced by the
//! bulletin parser.

use crate::constants::{GFS_VARIANT, NAM_VARIANT};
use crate::error::MosError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use strum::{Display, EnumIter, EnumString};

/// Forecast models whose MOS guidance is archived
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Model {
    /// Global Forecast System (MAV guidance)
    #[strum(to_string = "GFS", serialize = "GFS-MAV", serialize = "MAV")]
    #[serde(rename = "GFS")]
    Gfs,
    /// North American Mesoscale model (MET guidance)
    #[strum(to_string = "NAM", serialize = "NAM-MET", serialize = "MET")]
    #[serde(rename = "NAM")]
    Nam,
}

impl Model {
    /// Short name, also used as the archive subdirectory
    pub fn short_name(self) -> &'static str {
        match self {
            Model::Gfs => "GFS",
            Model::Nam => "NAM",
        }
    }

    /// Archive variant name used in bulletin file names unless overridden
    pub fn default_variant(self) -> &'static str {
        match self {
            Model::Gfs => GFS_VARIANT,
            Model::Nam => NAM_VARIANT,
        }
    }
}

/// Model run hour of a bulletin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssuanceHour {
    Z00,
    Z06,
    Z12,
    Z18,
}

impl IssuanceHour {
    pub const ALL: [IssuanceHour; 4] = [
        IssuanceHour::Z00,
        IssuanceHour::Z06,
        IssuanceHour::Z12,
        IssuanceHour::Z18,
    ];

    /// Hour of day (UTC)
    pub fn hour(self) -> u32 {
        match self {
            IssuanceHour::Z00 => 0,
            IssuanceHour::Z06 => 6,
            IssuanceHour::Z12 => 12,
            IssuanceHour::Z18 => 18,
        }
    }

    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            0 => Some(IssuanceHour::Z00),
            6 => Some(IssuanceHour::Z06),
            12 => Some(IssuanceHour::Z12),
            18 => Some(IssuanceHour::Z18),
            _ => None,
        }
    }

    /// Morning runs (00Z, 06Z) carry a same-day max in the summary row
    pub fn is_morning(self) -> bool {
        self.hour() < 12
    }
}

impl TryFrom<u32> for IssuanceHour {
    type Error = MosError;

    fn try_from(hour: u32) -> Result<Self, Self::Error> {
        IssuanceHour::from_hour(hour).ok_or_else(|| {
            MosError::format(
                "header",
                format!("unsupported issuance hour {} (expected 0, 6, 12 or 18)", hour),
            )
        })
    }
}

impl fmt::Display for IssuanceHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}Z", self.hour())
    }
}

/// How the value slots of a data row are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    /// Integer; a blank slot is absent, anything else non-numeric is an error
    Integer,
    /// Trimmed string, blank included
    Categorical,
    /// Probability or quantity; blank means missing, otherwise integer
    IntegerOrMissing,
    /// Max/min summary row; blank slots are skipped
    Summary,
}

/// Field codes modelled by the parser. Rows with any other code are ignored.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum FieldCode {
    /// Temperature (F)
    #[strum(serialize = "TMP")]
    Tmp,
    /// Dewpoint (F)
    #[strum(serialize = "DPT")]
    Dpt,
    /// Cloud cover category
    #[strum(serialize = "CLD")]
    Cld,
    /// Wind direction (tens of degrees)
    #[strum(serialize = "WDR")]
    Wdr,
    /// Wind speed (kt)
    #[strum(serialize = "WSP")]
    Wsp,
    /// Ceiling height category
    #[strum(serialize = "CIG")]
    Cig,
    /// Visibility category
    #[strum(serialize = "VIS")]
    Vis,
    /// Obstruction to vision
    #[strum(serialize = "OBV")]
    Obv,
    /// Probability of snow
    #[strum(serialize = "POS")]
    Pos,
    /// Probability of freezing precipitation
    #[strum(serialize = "POZ")]
    Poz,
    /// Precipitation type
    #[strum(serialize = "TYP")]
    Typ,
    /// 6-hour probability of precipitation
    #[strum(serialize = "P06")]
    P06,
    /// 6-hour precipitation amount category
    #[strum(serialize = "Q06")]
    Q06,
    /// 12-hour probability of precipitation
    #[strum(serialize = "P12")]
    P12,
    /// 12-hour precipitation amount category
    #[strum(serialize = "Q12")]
    Q12,
    /// Daily max/min summary row
    #[strum(to_string = "X/N", serialize = "N/X")]
    MaxMin,
}

impl FieldCode {
    pub fn decode_rule(self) -> DecodeRule {
        use FieldCode::*;

        match self {
            Tmp | Dpt | Wdr | Wsp | Cig | Vis | Pos | Poz => DecodeRule::Integer,
            Obv | Cld | Typ => DecodeRule::Categorical,
            P06 | Q06 | P12 | Q12 => DecodeRule::IntegerOrMissing,
            MaxMin => DecodeRule::Summary,
        }
    }
}

/// Decoded values of one data row, one entry per forecast timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValues {
    /// `None` is the absent-value marker, never zero
    Numeric(Vec<Option<i32>>),
    Categorical(Vec<String>),
}

impl FieldValues {
    pub fn len(&self) -> usize {
        match self {
            FieldValues::Numeric(values) => values.len(),
            FieldValues::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numeric(&self) -> Option<&[Option<i32>]> {
        match self {
            FieldValues::Numeric(values) => Some(values),
            FieldValues::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&[String]> {
        match self {
            FieldValues::Categorical(values) => Some(values),
            FieldValues::Numeric(_) => None,
        }
    }
}

/// Per-field time series of one bulletin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSeries {
    series: BTreeMap<FieldCode, FieldValues>,
}

impl FieldSeries {
    pub(crate) fn insert(&mut self, code: FieldCode, values: FieldValues) {
        self.series.insert(code, values);
    }

    pub fn get(&self, code: FieldCode) -> Option<&FieldValues> {
        self.series.get(&code)
    }

    pub fn numeric(&self, code: FieldCode) -> Option<&[Option<i32>]> {
        self.get(code).and_then(FieldValues::as_numeric)
    }

    pub fn categorical(&self, code: FieldCode) -> Option<&[String]> {
        self.get(code).and_then(FieldValues::as_categorical)
    }

    pub fn codes(&self) -> impl Iterator<Item = FieldCode> + '_ {
        self.series.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Month and day of one label on the forecast-date row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLabel {
    pub month: u32,
    pub day: u32,
}

/// Metadata parsed from the first three lines of a bulletin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletinHeader {
    pub station: String,
    pub issued: NaiveDateTime,
    pub issuance_hour: IssuanceHour,
    /// Forecast-date labels in chronological order
    pub day_labels: Vec<DayLabel>,
    /// Hour-of-day of each forecast column
    pub forecast_hours: Vec<u32>,
}

/// Forecast max/min temperature for one calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxMin {
    pub max: Option<i32>,
    pub min: Option<i32>,
}

impl MaxMin {
    /// Diurnal range; absent unless both ends are present
    pub fn range(&self) -> Option<i32> {
        Some(self.max? - self.min?)
    }
}

/// Daily max/min map derived from the summary row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyExtremes {
    days: BTreeMap<NaiveDate, MaxMin>,
}

impl DailyExtremes {
    pub(crate) fn from_days(days: BTreeMap<NaiveDate, MaxMin>) -> Self {
        Self { days }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&MaxMin> {
        self.days.get(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &MaxMin)> {
        self.days.iter()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Rebuild the five summary-row values with the inverse of the slot
    /// table used for `hour`. Returns `None` if any required value is absent.
    pub fn to_summary_slots(&self, hour: IssuanceHour) -> Option<[i32; 5]> {
        let mut days = self.days.values();
        let (first, second, third) = (days.next()?, days.next()?, days.next()?);

        if hour.is_morning() {
            Some([
                first.max?,
                second.min?,
                second.max?,
                third.min?,
                third.max?,
            ])
        } else {
            Some([
                first.min?,
                first.max?,
                second.min?,
                second.max?,
                third.min?,
            ])
        }
    }
}

/// Two consecutive 12-hour windows starting on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecipDay {
    /// P12 for the early and late window
    pub probability: [i32; 2],
    /// Q12 category for the early and late window
    pub quantity: [i32; 2],
}

impl PrecipDay {
    pub fn max_probability(&self) -> i32 {
        self.probability[0].max(self.probability[1])
    }
}

/// 12-hour precipitation map keyed by window-start date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecipWindows {
    days: BTreeMap<NaiveDate, PrecipDay>,
}

impl PrecipWindows {
    pub(crate) fn from_days(days: BTreeMap<NaiveDate, PrecipDay>) -> Self {
        Self { days }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PrecipDay> {
        self.days.get(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &PrecipDay)> {
        self.days.iter()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// One fully parsed bulletin. Built once by the parser, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bulletin {
    header: BulletinHeader,
    timestamps: Vec<NaiveDateTime>,
    fields: FieldSeries,
    extremes: DailyExtremes,
    precip: PrecipWindows,
}

impl Bulletin {
    pub(crate) fn new(
        header: BulletinHeader,
        timestamps: Vec<NaiveDateTime>,
        fields: FieldSeries,
        extremes: DailyExtremes,
        precip: PrecipWindows,
    ) -> Self {
        Self {
            header,
            timestamps,
            fields,
            extremes,
            precip,
        }
    }

    pub fn header(&self) -> &BulletinHeader {
        &self.header
    }

    pub fn station(&self) -> &str {
        &self.header.station
    }

    pub fn issued(&self) -> NaiveDateTime {
        self.header.issued
    }

    pub fn issuance_hour(&self) -> IssuanceHour {
        self.header.issuance_hour
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn fields(&self) -> &FieldSeries {
        &self.fields
    }

    pub fn extremes(&self) -> &DailyExtremes {
        &self.extremes
    }

    pub fn precip(&self) -> &PrecipWindows {
        &self.precip
    }

    /// Values of a numeric field at the timestamps valid on `date`
    pub fn numeric_on(&self, code: FieldCode, date: NaiveDate) -> Option<Vec<Option<i32>>> {
        let values = self.fields.numeric(code)?;
        Some(
            self.timestamps
                .iter()
                .zip(values)
                .filter(|(ts, _)| ts.date() == date)
                .map(|(_, value)| *value)
                .collect(),
        )
    }
}

/// Batch processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub dates_processed: usize,
    pub bulletins_parsed: usize,
    pub bulletins_missing: usize,
    pub bulletins_rejected: usize,
    pub rows_written: usize,
    pub output_path: Option<PathBuf>,
    pub processing_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_model_parsing() {
        assert_eq!(Model::from_str("GFS").unwrap(), Model::Gfs);
        assert_eq!(Model::from_str("nam").unwrap(), Model::Nam);
        assert_eq!(Model::from_str("GFS-MAV").unwrap(), Model::Gfs);
        assert!(Model::from_str("ECMWF").is_err());
        assert_eq!(Model::Gfs.to_string(), "GFS");
        assert_eq!(Model::Nam.default_variant(), "NAM-MET");
    }

    #[test]
    fn test_issuance_hour_validation() {
        assert_eq!(IssuanceHour::try_from(18).unwrap(), IssuanceHour::Z18);
        assert!(IssuanceHour::try_from(3).is_err());
        assert!(IssuanceHour::Z06.is_morning());
        assert!(!IssuanceHour::Z12.is_morning());
        assert_eq!(IssuanceHour::Z06.to_string(), "06Z");
    }

    #[test]
    fn test_field_code_rule_table() {
        for code in FieldCode::iter() {
            let rule = code.decode_rule();
            match code.to_string().as_str() {
                "TMP" | "DPT" | "WDR" | "WSP" | "CIG" | "VIS" | "POS" | "POZ" => {
                    assert_eq!(rule, DecodeRule::Integer)
                }
                "OBV" | "CLD" | "TYP" => assert_eq!(rule, DecodeRule::Categorical),
                "P06" | "Q06" | "P12" | "Q12" => assert_eq!(rule, DecodeRule::IntegerOrMissing),
                "X/N" => assert_eq!(rule, DecodeRule::Summary),
                other => panic!("unexpected field code {}", other),
            }
        }
        assert_eq!(FieldCode::from_str("N/X").unwrap(), FieldCode::MaxMin);
        assert!(FieldCode::from_str("T06").is_err());
    }

    #[test]
    fn test_max_min_range_propagates_absence() {
        let full = MaxMin {
            max: Some(62),
            min: Some(45),
        };
        let half = MaxMin {
            max: None,
            min: Some(38),
        };
        assert_eq!(full.range(), Some(17));
        assert_eq!(half.range(), None);
    }
}
