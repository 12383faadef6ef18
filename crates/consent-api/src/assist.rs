//! `POST /assist/privacy-summary`: a short guardian-facing summary of a
//! software's privacy policy. Open to every role.

use axum::{Json, extract::State};
use consent_core::{store::ConsentStore, validate::required};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
  pub url: String,
}

#[derive(Debug, Serialize)]
pub struct Summary {
  pub summary: String,
}

pub async fn privacy_summary<S: ConsentStore>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<SummaryRequest>,
) -> Result<Json<Summary>, ApiError> {
  let assist = state
    .assist
    .clone()
    .ok_or_else(|| ApiError::Unavailable("policy summaries are not configured".to_string()))?;
  let url = required(&body.url, "url")?;

  tracing::debug!(role = auth.session.role(), url, "summarising privacy policy");
  let summary = assist.summarize_privacy_policy(url).await?;
  Ok(Json(Summary { summary }))
}
