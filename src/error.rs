//! Error handling for MOS bulletin processing.
//!
//! Format and decode failures are fatal to the bulletin being parsed; a
//! missing bulletin file is recoverable by the aligner, which records it as
//! an absent slot instead of propagating.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MosError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A header line or data row does not match the expected layout.
    #[error("Malformed bulletin ({context}): {reason}")]
    Format { context: String, reason: String },

    /// A value slot cannot be decoded under its field's rule.
    #[error("Cannot decode {field} slot {slot}: '{value}'")]
    Decode {
        field: String,
        slot: usize,
        value: String,
    },

    #[error("Bulletin not found at path: {path}")]
    NotFound { path: PathBuf },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl MosError {
    /// Create a format error for the named part of a bulletin
    pub fn format(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error for one value slot
    pub fn decode(field: impl Into<String>, slot: usize, value: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            slot,
            value: value.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when the error only means the bulletin file does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, MosError>;
