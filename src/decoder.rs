//! Field decoder for fixed-width MOS data rows.
//!
//! A data row is a 3-character field code followed by 3-character value
//! slots starting at column 4. Rows are trimmed and then right-padded to the
//! width of the forecast-hour row, which recovers trailing slots that were
//! lost to whitespace stripping (common on the 12-hour rows).

use crate::constants::{FIELD_CODE_WIDTH, FIRST_SLOT_OFFSET, SLOT_WIDTH};
use crate::error::{MosError, Result};
use crate::models::{DecodeRule, FieldCode, FieldValues};
use std::str::FromStr;

/// A data row split into its code and raw slot text
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub code: String,
    pub slots: Vec<String>,
}

impl RawRow {
    /// Trim `line`, pad it to `width`, and cut it into code and slots
    pub fn split(line: &str, width: usize) -> Result<Self> {
        let trimmed = line.trim();
        if !trimmed.is_ascii() {
            return Err(MosError::format(
                "data row",
                format!("non-ASCII content in '{}'", trimmed),
            ));
        }

        let padded = format!("{:<width$}", trimmed, width = width);
        let code = padded[..FIELD_CODE_WIDTH.min(padded.len())].to_string();

        let slots = (FIRST_SLOT_OFFSET..padded.len())
            .step_by(SLOT_WIDTH)
            .map(|start| padded[start..(start + SLOT_WIDTH).min(padded.len())].to_string())
            .collect();

        Ok(Self { code, slots })
    }
}

/// A decoded data row routed by its field code
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRow {
    /// A per-timestamp series
    Series(FieldCode, FieldValues),
    /// Non-blank values of the max/min summary row, in slot order
    Summary(Vec<i32>),
}

/// Decode one data row.
///
/// Returns `Ok(None)` for field codes that are not modelled; bulletins carry
/// supplemental rows (T06, SNW, ...) that are skipped without error.
pub fn decode_row(line: &str, width: usize) -> Result<Option<DecodedRow>> {
    let raw = RawRow::split(line, width)?;

    let Ok(code) = FieldCode::from_str(&raw.code) else {
        return Ok(None);
    };

    let row = match code.decode_rule() {
        DecodeRule::Integer | DecodeRule::IntegerOrMissing => {
            let values = raw
                .slots
                .iter()
                .enumerate()
                .map(|(slot, text)| decode_integer(code, slot, text))
                .collect::<Result<Vec<_>>>()?;
            DecodedRow::Series(code, FieldValues::Numeric(values))
        }
        DecodeRule::Categorical => {
            let values = raw.slots.iter().map(|s| s.trim().to_string()).collect();
            DecodedRow::Series(code, FieldValues::Categorical(values))
        }
        DecodeRule::Summary => DecodedRow::Summary(decode_summary(code, &raw.slots)?),
    };

    Ok(Some(row))
}

/// Decode one integer slot; blank is the absent marker, never zero
pub fn decode_integer(code: FieldCode, slot: usize, text: &str) -> Result<Option<i32>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<i32>()
        .map(Some)
        .map_err(|_| MosError::decode(code.to_string(), slot, text))
}

fn decode_summary(code: FieldCode, slots: &[String]) -> Result<Vec<i32>> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(slot, text)| decode_integer(code, slot, text).transpose())
        .collect()
}
