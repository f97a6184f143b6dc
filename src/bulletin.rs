//! MOS bulletin parser.
//!
//! Turns the lines of one station bulletin into a [`Bulletin`]: the header,
//! the per-field series, reconstructed forecast timestamps, the daily
//! max/min map and the 12-hour precipitation map. Parsing is all or
//! nothing; any layout problem aborts with an error and no partial result.

use crate::config::MosConfig;
use crate::constants::{
    HEADER_TOKEN_COUNT, PRECIP_ENTRY_COUNT, PRECIP_WINDOW_HOURS, SUMMARY_SLOT_COUNT,
};
use crate::decoder::{DecodedRow, decode_row};
use crate::error::{MosError, Result};
use crate::models::{
    Bulletin, BulletinHeader, DailyExtremes, DayLabel, FieldCode, FieldSeries, IssuanceHour,
    MaxMin, PrecipDay, PrecipWindows,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, trace};

static DAY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{3,4})\s*(\d{1,2})$").expect("day label pattern is valid")
});

/// Station, issuance time and run hour from a bulletin's first line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    pub station: String,
    pub issued: NaiveDateTime,
    pub issuance_hour: IssuanceHour,
}

/// Parse a header line such as
/// `KAUS   GFS MOS GUIDANCE    1/01/2009  1800 UTC`
pub fn parse_header_line(line: &str) -> Result<HeaderLine> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != HEADER_TOKEN_COUNT {
        return Err(MosError::format(
            "header",
            format!(
                "expected {} tokens, found {}",
                HEADER_TOKEN_COUNT,
                tokens.len()
            ),
        ));
    }

    let date = parse_run_date(tokens[4])?;
    let run_time: u32 = tokens[5]
        .parse()
        .map_err(|_| MosError::format("header", format!("invalid run time '{}'", tokens[5])))?;
    let hour = run_time / 100;
    let issuance_hour = IssuanceHour::try_from(hour)?;

    let issued = date
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| MosError::format("header", format!("invalid run time '{}'", tokens[5])))?;

    Ok(HeaderLine {
        station: tokens[0].to_string(),
        issued,
        issuance_hour,
    })
}

fn parse_run_date(text: &str) -> Result<NaiveDate> {
    let invalid = || MosError::format("header", format!("invalid run date '{}'", text));

    let parts: Vec<&str> = text.split('/').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let month: u32 = parts[0].parse().map_err(|_| invalid())?;
    let day: u32 = parts[1].parse().map_err(|_| invalid())?;
    let year: i32 = parts[2].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parser for single-station MOS bulletins
#[derive(Debug, Clone)]
pub struct BulletinParser {
    config: Arc<MosConfig>,
}

impl BulletinParser {
    pub fn new(config: Arc<MosConfig>) -> Self {
        Self { config }
    }

    /// Parse bulletin text
    pub fn parse_str(&self, text: &str) -> Result<Bulletin> {
        let lines: Vec<&str> = text.lines().collect();
        self.parse(&lines)
    }

    /// Parse the ordered lines of one bulletin
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> Result<Bulletin> {
        let mut lines = lines.iter().map(|line| line.as_ref().trim());

        let header_line = lines
            .next()
            .ok_or_else(|| MosError::format("header", "bulletin is empty"))?;
        let header_line = parse_header_line(header_line)?;

        let date_row = lines
            .next()
            .ok_or_else(|| MosError::format("forecast dates", "missing forecast-date row"))?;
        let day_labels = self.parse_day_labels(date_row)?;
        // 00Z/06Z runs leave no room to label a final one-column day
        let unlabelled_last_day = date_row.ends_with('/');

        let hour_row = lines
            .next()
            .ok_or_else(|| MosError::format("forecast hours", "missing forecast-hour row"))?;
        let forecast_hours = parse_forecast_hours(hour_row)?;
        let width = hour_row.len();

        let mut fields = FieldSeries::default();
        let mut summary = None;

        for line in lines {
            match decode_row(line, width)? {
                Some(DecodedRow::Series(code, values)) => {
                    if values.len() != forecast_hours.len() {
                        return Err(MosError::format(
                            "data row",
                            format!(
                                "{} has {} values for {} forecast hours",
                                code,
                                values.len(),
                                forecast_hours.len()
                            ),
                        ));
                    }
                    fields.insert(code, values);
                }
                Some(DecodedRow::Summary(values)) => summary = Some(values),
                None => trace!("Skipping unmodelled row '{}'", line),
            }
        }

        let header = BulletinHeader {
            station: header_line.station,
            issued: header_line.issued,
            issuance_hour: header_line.issuance_hour,
            day_labels,
            forecast_hours,
        };

        let (timestamps, days) = build_timeline(&header, unlabelled_last_day)?;
        let extremes = build_extremes(header.issuance_hour, &days, summary)?;
        let precip = build_precip(header.issuance_hour, &timestamps, &fields)?;

        debug!(
            "Parsed {} bulletin issued {}: {} timestamps, {} fields",
            header.station,
            header.issued,
            timestamps.len(),
            fields.len()
        );

        Ok(Bulletin::new(header, timestamps, fields, extremes, precip))
    }

    fn parse_day_labels(&self, row: &str) -> Result<Vec<DayLabel>> {
        let labels = row
            .split('/')
            .skip(1)
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(|label| self.parse_day_label(label))
            .collect::<Result<Vec<_>>>()?;

        if labels.is_empty() {
            return Err(MosError::format(
                "forecast dates",
                format!("no date labels in '{}'", row),
            ));
        }

        Ok(labels)
    }

    fn parse_day_label(&self, label: &str) -> Result<DayLabel> {
        let invalid = || MosError::format("forecast dates", format!("invalid label '{}'", label));

        let captures = DAY_LABEL.captures(label).ok_or_else(invalid)?;
        let month = self
            .config
            .month_number(&captures[1])
            .ok_or_else(invalid)?;
        let day = captures[2].parse().map_err(|_| invalid())?;

        Ok(DayLabel { month, day })
    }
}

fn parse_forecast_hours(row: &str) -> Result<Vec<u32>> {
    let hours = row
        .split_whitespace()
        .skip(1)
        .map(|token| match token.parse::<u32>() {
            Ok(hour) if hour < 24 => Ok(hour),
            _ => Err(MosError::format(
                "forecast hours",
                format!("invalid hour '{}'", token),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    if hours.is_empty() {
        return Err(MosError::format("forecast hours", "no forecast hours"));
    }

    Ok(hours)
}

/// Reconstruct forecast-valid timestamps and the distinct forecast days.
///
/// The first column takes its date from the first label; every later
/// 00-hour column rolls the date forward by one day. When the date row ends
/// in an empty `/` segment the final day carries no label.
fn build_timeline(
    header: &BulletinHeader,
    unlabelled_last_day: bool,
) -> Result<(Vec<NaiveDateTime>, Vec<NaiveDate>)> {
    let invalid = |reason: String| MosError::format("forecast dates", reason);

    let first = header
        .day_labels
        .first()
        .ok_or_else(|| invalid("no date labels".to_string()))?;

    // The 18Z run of Dec 31 has no columns left in the issuance year
    let issued = header.issued;
    let new_years_eve = issued.month() == 12 && issued.day() == 31;
    let year = if new_years_eve && header.issuance_hour == IssuanceHour::Z18 {
        issued.year() + 1
    } else {
        issued.year()
    };

    let mut current = NaiveDate::from_ymd_opt(year, first.month, first.day).ok_or_else(|| {
        invalid(format!(
            "label {:02}/{:02} is not a valid date in {}",
            first.month, first.day, year
        ))
    })?;

    let mut days = vec![current];
    let mut timestamps: Vec<NaiveDateTime> = Vec::with_capacity(header.forecast_hours.len());

    for (i, &hour) in header.forecast_hours.iter().enumerate() {
        if i > 0 && hour == 0 {
            current = current
                .succ_opt()
                .ok_or_else(|| invalid(format!("date overflow after {}", current)))?;
            days.push(current);
        }

        let timestamp = current
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| invalid(format!("invalid hour {}", hour)))?;

        if let Some(previous) = timestamps.last() {
            if timestamp <= *previous {
                return Err(MosError::format(
                    "forecast hours",
                    format!("{} does not follow {}", timestamp, previous),
                ));
            }
        }
        timestamps.push(timestamp);
    }

    let labelled_days = days.len() - usize::from(unlabelled_last_day);
    if labelled_days != header.day_labels.len() {
        return Err(invalid(format!(
            "{} date labels for {} forecast days",
            header.day_labels.len(),
            days.len()
        )));
    }

    Ok((timestamps, days))
}

/// Map the five summary values onto forecast days.
///
/// Morning runs open with a same-day max; 12Z runs skip the issuance day;
/// 18Z runs have no issuance-day columns so their first day is already D+1.
fn build_extremes(
    hour: IssuanceHour,
    days: &[NaiveDate],
    summary: Option<Vec<i32>>,
) -> Result<DailyExtremes> {
    let summary =
        summary.ok_or_else(|| MosError::format("summary row", "missing X/N (N/X) row"))?;

    if summary.len() < SUMMARY_SLOT_COUNT {
        return Err(MosError::format(
            "summary row",
            format!(
                "expected {} values, found {}",
                SUMMARY_SLOT_COUNT,
                summary.len()
            ),
        ));
    }

    let offset = match hour {
        IssuanceHour::Z12 => 1,
        _ => 0,
    };
    let window = days.get(offset..offset + 3).ok_or_else(|| {
        MosError::format(
            "summary row",
            format!("{} forecast days are too few for a {} run", days.len(), hour),
        )
    })?;

    let s = &summary[..SUMMARY_SLOT_COUNT];
    let values = if hour.is_morning() {
        [
            MaxMin {
                max: Some(s[0]),
                min: None,
            },
            MaxMin {
                max: Some(s[2]),
                min: Some(s[1]),
            },
            MaxMin {
                max: Some(s[4]),
                min: Some(s[3]),
            },
        ]
    } else {
        [
            MaxMin {
                max: Some(s[1]),
                min: Some(s[0]),
            },
            MaxMin {
                max: Some(s[3]),
                min: Some(s[2]),
            },
            MaxMin {
                max: None,
                min: Some(s[4]),
            },
        ]
    };

    Ok(DailyExtremes::from_days(
        window.iter().copied().zip(values).collect(),
    ))
}

/// Re-key 12-hour P12/Q12 values by the date their window starts
fn build_precip(
    hour: IssuanceHour,
    timestamps: &[NaiveDateTime],
    fields: &FieldSeries,
) -> Result<PrecipWindows> {
    let probability = fields
        .numeric(FieldCode::P12)
        .ok_or_else(|| MosError::format("precipitation", "missing P12 row"))?;
    let quantity = fields
        .numeric(FieldCode::Q12)
        .ok_or_else(|| MosError::format("precipitation", "missing Q12 row"))?;

    let shift = TimeDelta::hours(PRECIP_WINDOW_HOURS);
    let skip = usize::from(hour.is_morning());

    let entries: Vec<(NaiveDateTime, i32, i32)> = timestamps
        .iter()
        .zip(probability.iter().zip(quantity))
        .filter_map(|(ts, (p, q))| Some((*ts - shift, (*p)?, (*q)?)))
        .skip(skip)
        .collect();

    if entries.len() < PRECIP_ENTRY_COUNT {
        return Err(MosError::format(
            "precipitation",
            format!(
                "expected at least {} 12-hour windows, found {}",
                PRECIP_ENTRY_COUNT,
                entries.len()
            ),
        ));
    }

    let day = |first: usize| {
        let (start, p0, q0) = entries[first];
        let (_, p1, q1) = entries[first + 1];
        (
            start.date(),
            PrecipDay {
                probability: [p0, p1],
                quantity: [q0, q1],
            },
        )
    };

    let (day1, early) = day(0);
    let (day2, late) = day(2);
    if day1 == day2 {
        return Err(MosError::format(
            "precipitation",
            format!("both 12-hour pairs start on {}", day1),
        ));
    }

    Ok(PrecipWindows::from_days(BTreeMap::from([
        (day1, early),
        (day2, late),
    ])))
}
