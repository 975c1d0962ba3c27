//! Typed failures raised by the catalog library.
//!
//! Library functions return [`crate::Result`] (an `anyhow::Result`); these
//! variants travel inside it so callers can `downcast_ref::<CatalogError>()`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("required column '{0}' is missing from the catalog")]
    MissingColumn(String),

    #[error("row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported configuration version {found} (expected {expected})")]
    UnsupportedConfigVersion { found: u32, expected: u32 },
}
