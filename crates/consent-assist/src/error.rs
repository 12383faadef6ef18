//! Error type for `consent-assist`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("assistant returned {status}: {body}")]
  Upstream { status: u16, body: String },

  #[error("assistant returned no text")]
  EmptyResponse,

  #[error("not an http(s) url: {0}")]
  InvalidUrl(String),

  #[error("policy page returned {0}; the site may block automated access")]
  PageStatus(u16),

  #[error("policy page has too little readable text ({0} chars)")]
  PageTooShort(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
