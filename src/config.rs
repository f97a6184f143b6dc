//! Configuration management and validation.
//!
//! `MosConfig` replaces the lookup tables a bulletin archive depends on
//! (model variant names, month labels, data-path convention) with one
//! explicit value. It is built once, validated, and shared read-only with
//! the parser, archive and aligner.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DATA_ROOT, ISSUANCE_HOURS, MONTH_ABBREVIATIONS,
};
use crate::error::{MosError, Result};
use crate::models::{IssuanceHour, Model};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archive variant names per model, e.g. `GFS -> GFS-MAV`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariants {
    pub gfs: String,
    pub nam: String,
}

impl Default for ModelVariants {
    fn default() -> Self {
        Self {
            gfs: Model::Gfs.default_variant().to_string(),
            nam: Model::Nam.default_variant().to_string(),
        }
    }
}

impl ModelVariants {
    pub fn variant(&self, model: Model) -> &str {
        match model {
            Model::Gfs => &self.gfs,
            Model::Nam => &self.nam,
        }
    }
}

/// Global configuration for MOS processing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MosConfig {
    /// Root of the per-station bulletin archive
    pub data_root: PathBuf,

    /// Archive variant names used in bulletin file names
    pub model_variants: ModelVariants,

    /// Month labels accepted on forecast-date rows
    pub months: BTreeMap<String, u32>,

    /// Issuance hours looked up by the aligner
    pub issuance_hours: Vec<u32>,

    /// Maximum number of dates aligned concurrently in batch mode
    pub max_concurrent_files: usize,
}

impl Default for MosConfig {
    fn default() -> Self {
        let months = MONTH_ABBREVIATIONS
            .iter()
            .map(|(label, month)| (label.to_string(), *month))
            .collect();

        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            model_variants: ModelVariants::default(),
            months,
            issuance_hours: ISSUANCE_HOURS.to_vec(),
            max_concurrent_files: num_cpus::get().max(1),
        }
    }
}

impl MosConfig {
    /// Default config file location (`<config dir>/mosobs/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| MosError::configuration("Could not determine user config directory"))
    }

    /// Load configuration from a TOML file; unspecified keys take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: MosConfig = toml::from_str(&text).map_err(|e| {
            MosError::configuration(format!("Invalid config file '{}': {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file, else the default location if it exists,
    /// else built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_config_path() {
            Ok(default_path) if default_path.exists() => Self::from_file(&default_path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Set the archive root
    pub fn with_data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.data_root = data_root.into();
        self
    }

    /// Set maximum concurrent alignments
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    /// Override the archive variant name of one model
    pub fn with_model_variant(mut self, model: Model, variant: impl Into<String>) -> Self {
        match model {
            Model::Gfs => self.model_variants.gfs = variant.into(),
            Model::Nam => self.model_variants.nam = variant.into(),
        }
        self
    }

    /// Month number for a forecast-date label such as `JAN` or `SEPT`
    pub fn month_number(&self, label: &str) -> Option<u32> {
        self.months.get(label).copied()
    }

    /// Configured issuance hours as typed values
    pub fn issuance_hours(&self) -> Vec<IssuanceHour> {
        self.issuance_hours
            .iter()
            .filter_map(|hour| IssuanceHour::from_hour(*hour))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_files == 0 {
            return Err(MosError::configuration(
                "max_concurrent_files must be at least 1",
            ));
        }

        if let Some(hour) = self
            .issuance_hours
            .iter()
            .find(|hour| IssuanceHour::from_hour(**hour).is_none())
        {
            return Err(MosError::configuration(format!(
                "issuance hour {} is not one of 0, 6, 12, 18",
                hour
            )));
        }

        if let Some((label, month)) = self.months.iter().find(|(_, m)| !(1..=12).contains(*m)) {
            return Err(MosError::configuration(format!(
                "month label '{}' maps to invalid month {}",
                label, month
            )));
        }

        for month in 1..=12 {
            if !self.months.values().any(|m| *m == month) {
                return Err(MosError::configuration(format!(
                    "no month label configured for month {}",
                    month
                )));
            }
        }

        if self.model_variants.gfs.trim().is_empty() || self.model_variants.nam.trim().is_empty() {
            return Err(MosError::configuration("model variant names must not be empty"));
        }

        Ok(())
    }
}
