//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Missing or expired session, wrong admin password or teacher PIN.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  /// Valid session, but not allowed to touch this resource.
  #[error("forbidden: {0}")]
  Forbidden(String),

  /// An optional external service is not configured.
  #[error("unavailable: {0}")]
  Unavailable(String),

  /// An external service failed; the message is safe to show to users.
  #[error("upstream: {0}")]
  Upstream(String),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }

  /// The fixed refusal for a guardian whose PIN or names differ from the
  /// stored record.
  pub fn not_authorized_to_edit() -> Self {
    Self::Forbidden("not authorized to edit this consent record".to_string())
  }
}

impl From<consent_core::Error> for ApiError {
  fn from(e: consent_core::Error) -> Self { Self::BadRequest(e.to_string()) }
}

impl From<consent_assist::Error> for ApiError {
  fn from(e: consent_assist::Error) -> Self {
    use consent_assist::Error as E;
    match e {
      E::InvalidUrl(_) => Self::BadRequest(e.to_string()),
      E::PageStatus(_) | E::PageTooShort(_) => Self::Upstream(e.to_string()),
      E::Http(_) | E::Upstream { .. } | E::EmptyResponse => {
        tracing::warn!(error = %e, "assistant call failed");
        Self::Upstream("the assistant service is unavailable; try again later".to_string())
      }
    }
  }
}

impl From<consent_letter::Error> for ApiError {
  fn from(e: consent_letter::Error) -> Self {
    match e {
      consent_letter::Error::InvalidQr => Self::BadRequest(e.to_string()),
      other => Self::Internal(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),
      ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
