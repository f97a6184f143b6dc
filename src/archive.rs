//! On-disk bulletin archive.
//!
//! Bulletins are stored one per file under
//! `{data_root}/{STATION}/{MODEL}/{STATION}.{MMDDYYYY}.{VARIANT}.{HH}Z`.
//! The archive resolves lookups to paths, loads and parses stored bulletins,
//! and splits decompressed multi-station compilations into single files.

use crate::bulletin::{BulletinParser, parse_header_line};
use crate::config::MosConfig;
use crate::constants::{BULLETIN_MARKER, MAX_BULLETIN_LINES};
use crate::error::{MosError, Result};
use crate::models::{Bulletin, IssuanceHour, Model};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Per-station archive of MOS bulletins
#[derive(Debug, Clone)]
pub struct BulletinArchive {
    config: Arc<MosConfig>,
    parser: BulletinParser,
}

impl BulletinArchive {
    pub fn new(config: Arc<MosConfig>) -> Self {
        let parser = BulletinParser::new(config.clone());
        Self { config, parser }
    }

    /// Archive root directory
    pub fn root(&self) -> &Path {
        &self.config.data_root
    }

    /// File name of one bulletin, e.g. `KAUS.01012009.GFS-MAV.18Z`
    pub fn file_name(
        &self,
        station: &str,
        model: Model,
        date: NaiveDate,
        hour: IssuanceHour,
    ) -> String {
        format!(
            "{}.{}.{}.{}",
            station.to_uppercase(),
            date.format("%m%d%Y"),
            self.config.model_variants.variant(model),
            hour
        )
    }

    /// Directory holding one station's bulletins for one model
    pub fn model_dir(&self, station: &str, model: Model) -> PathBuf {
        self.root()
            .join(station.to_uppercase())
            .join(model.short_name())
    }

    pub fn path_for(
        &self,
        station: &str,
        model: Model,
        date: NaiveDate,
        hour: IssuanceHour,
    ) -> PathBuf {
        self.model_dir(station, model)
            .join(self.file_name(station, model, date, hour))
    }

    /// Read the raw text of a stored bulletin
    pub fn read(
        &self,
        station: &str,
        model: Model,
        date: NaiveDate,
        hour: IssuanceHour,
    ) -> Result<String> {
        let path = self.path_for(station, model, date, hour);
        if !path.is_file() {
            return Err(MosError::NotFound { path });
        }
        Ok(std::fs::read_to_string(&path)?)
    }

    /// Load and parse a stored bulletin
    pub fn load(
        &self,
        station: &str,
        model: Model,
        date: NaiveDate,
        hour: IssuanceHour,
    ) -> Result<Bulletin> {
        let text = self.read(station, model, date, hour)?;
        self.parser.parse_str(&text)
    }

    /// Write one bulletin block under its conventional path.
    ///
    /// The station, date and hour come from the block's own header line.
    pub fn store<S: AsRef<str>>(&self, block: &[S], model: Model) -> Result<PathBuf> {
        let first = block
            .first()
            .ok_or_else(|| MosError::format("header", "bulletin block is empty"))?;
        let header = parse_header_line(first.as_ref())?;

        let path = self.path_for(
            &header.station,
            model,
            header.issued.date(),
            header.issuance_hour,
        );
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut text = block
            .iter()
            .map(|line| line.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        text.push('\n');
        std::fs::write(&path, text)?;

        debug!("Stored bulletin {}", path.display());
        Ok(path)
    }

    /// Split a compilation and store every block found for `station`
    pub fn import_compilation(
        &self,
        text: &str,
        station: &str,
        model: Model,
    ) -> Result<Vec<PathBuf>> {
        let paths = split_compilation(text, station, model)
            .iter()
            .map(|block| self.store(block, model))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Stored {} {} bulletins for {}",
            paths.len(),
            model,
            station.to_uppercase()
        );
        Ok(paths)
    }

    /// All stored bulletins of one station and model, sorted by path
    pub fn stored_bulletins(&self, station: &str, model: Model) -> Result<Vec<PathBuf>> {
        let station = station.to_uppercase();
        let pattern = self.model_dir(&station, model).join(format!(
            "{}.*.{}.*Z",
            station,
            self.config.model_variants.variant(model)
        ));
        let pattern = pattern.to_string_lossy();

        let entries = glob::glob(&pattern).map_err(|e| {
            MosError::configuration(format!("Invalid archive pattern '{}': {}", pattern, e))
        })?;

        let mut paths: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
        paths.sort();
        Ok(paths)
    }
}

/// Find the bulletin blocks of one station in a multi-station compilation.
///
/// A block starts at a header line whose first token is the station id and
/// which contains `{MODEL} MOS GUIDANCE`. It ends before the next header,
/// a blank line, or the end of input, and never exceeds the bulletin line
/// limit.
pub fn split_compilation<'a>(text: &'a str, station: &str, model: Model) -> Vec<Vec<&'a str>> {
    let lines: Vec<&str> = text.lines().collect();
    let marker = format!("{} {}", model.short_name(), BULLETIN_MARKER);

    let is_station_header = |line: &str| {
        line.split_whitespace()
            .next()
            .is_some_and(|token| token.eq_ignore_ascii_case(station))
            && line.contains(&marker)
    };

    lines
        .iter()
        .enumerate()
        .filter(|&(_, &line)| is_station_header(line))
        .map(|(start, _)| {
            let limit = (start + MAX_BULLETIN_LINES).min(lines.len());
            let end = (start + 1..limit)
                .find(|&i| lines[i].contains(BULLETIN_MARKER) || lines[i].trim().is_empty())
                .unwrap_or(limit);
            lines[start..end].to_vec()
        })
        .collect()
}
