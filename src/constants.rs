//! Format constants and defaults for MOS bulletin processing
//!
//! Column layout of the MDL fixed-width bulletins, archive naming defaults,
//! and the month-abbreviation table used by forecast-date rows.

// =============================================================================
// Bulletin Layout
// =============================================================================

/// Width of the field code at the start of each data row
pub const FIELD_CODE_WIDTH: usize = 3;

/// Column of the first value slot in a data row
pub const FIRST_SLOT_OFFSET: usize = 4;

/// Width of one value slot (and the spacing between slots)
pub const SLOT_WIDTH: usize = 3;

/// Whitespace-separated tokens on the header line:
/// station, model, "MOS", "GUIDANCE", date, time, "UTC"
pub const HEADER_TOKEN_COUNT: usize = 7;

/// Values required in the X/N (N/X) summary row
pub const SUMMARY_SLOT_COUNT: usize = 5;

/// 12-hour precipitation fields are valid at the window end; shift by this
/// many hours to key them at the window start
pub const PRECIP_WINDOW_HOURS: i64 = 12;

/// Entries of the shifted precipitation series consumed for the two days
pub const PRECIP_ENTRY_COUNT: usize = 4;

/// Marker present on every bulletin header line
pub const BULLETIN_MARKER: &str = "MOS GUIDANCE";

/// Upper bound on the number of lines in one station bulletin
pub const MAX_BULLETIN_LINES: usize = 30;

// =============================================================================
// Issuance and Archive Defaults
// =============================================================================

/// Model run hours (UTC) that produce bulletins
pub const ISSUANCE_HOURS: &[u32] = &[0, 6, 12, 18];

/// Default directory holding per-station bulletin archives
pub const DEFAULT_DATA_ROOT: &str = "data_arch";

/// Default archive variant name for GFS bulletins
pub const GFS_VARIANT: &str = "GFS-MAV";

/// Default archive variant name for NAM bulletins
pub const NAM_VARIANT: &str = "NAM-MET";

/// Configuration file name looked up under the user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the user config directory
pub const APP_DIR_NAME: &str = "mosobs";

// =============================================================================
// Calendar
// =============================================================================

/// Month labels used on forecast-date rows.
///
/// MDL writes three-letter abbreviations except for JUNE, JULY and SEPT; both
/// spellings are accepted.
pub const MONTH_ABBREVIATIONS: &[(&str, u32)] = &[
    ("JAN", 1),
    ("FEB", 2),
    ("MAR", 3),
    ("APR", 4),
    ("MAY", 5),
    ("JUN", 6),
    ("JUNE", 6),
    ("JUL", 7),
    ("JULY", 7),
    ("AUG", 8),
    ("SEP", 9),
    ("SEPT", 9),
    ("OCT", 10),
    ("NOV", 11),
    ("DEC", 12),
];

// =============================================================================
// Day-1 Features
// =============================================================================

/// WDR is reported in tens of degrees
pub const WIND_DIRECTION_SCALE: f64 = 10.0;
