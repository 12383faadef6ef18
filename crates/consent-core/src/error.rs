//! Error types for `consent-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("pin must be exactly four digits")]
  InvalidPin,

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("{field} must be a positive number")]
  NotPositive { field: &'static str },

  #[error("csv import failed: {0}")]
  Csv(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
