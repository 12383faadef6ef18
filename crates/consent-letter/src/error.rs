//! Error type for `consent-letter`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("qr image is not a png")]
  InvalidQr,

  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
