//! MOS bulletin parsing and forecast alignment
//!
//! A library for working with archived NWS Model Output Statistics (MOS)
//! guidance bulletins, the fixed-width GFS (MAV) and NAM (MET) text products.
//!
//! This library provides tools for:
//! - Decoding fixed-width bulletin rows into typed per-field series
//! - Reconstructing forecast-valid timestamps and daily max/min and 12-hour
//!   precipitation maps from one bulletin
//! - Storing bulletins in a per-station archive and splitting multi-station
//!   compilations
//! - Aligning the issuances that forecast a validation date and extracting
//!   day-1 features
//! - Exporting feature tables over a date range to Parquet or CSV

pub mod aligner;
pub mod archive;
pub mod bulletin;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod models;
pub mod processor;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use aligner::{AlignedForecast, Aligner, ForecastFeatures, WindQuadrant};
pub use archive::BulletinArchive;
pub use bulletin::BulletinParser;
pub use config::MosConfig;
pub use error::{MosError, Result};
pub use models::{Bulletin, FieldCode, IssuanceHour, Model};
pub use processor::BatchProcessor;
