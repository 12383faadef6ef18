//! Handlers for the guardian consent form.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/guardian/consent` | Form data plus any earlier answers |
//! | `PUT`  | `/guardian/consent` | Replaces the record; returns a receipt |

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use consent_core::{
  aggregate::tally_student,
  class::{ClassConfig, SoftwareItem},
  code::confirmation_code,
  consent::{ConsentRecord, ConsentResponse, NewConsent, StoredResponse},
  session::GuardianIdentity,
  store::ConsentStore,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::GuardianSession, error::ApiError};

/// The guardian's class, if it is still collecting consent, and the record
/// for their slot, if one exists and they may edit it.
async fn load<S: ConsentStore>(
  state: &AppState<S>,
  identity: &GuardianIdentity,
) -> Result<(ClassConfig, Option<ConsentRecord>), ApiError> {
  let class = state
    .store
    .get_class(identity.class_id.clone())
    .await
    .map_err(ApiError::store)?
    .filter(|c| c.is_active)
    .ok_or_else(|| ApiError::NotFound("this class is not collecting consent".to_string()))?;

  let record = state
    .store
    .get_consent(identity.consent_id())
    .await
    .map_err(ApiError::store)?;
  if let Some(r) = &record
    && !identity.may_edit(r)
  {
    return Err(ApiError::not_authorized_to_edit());
  }
  Ok((class, record))
}

// ─── Form ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FormItem {
  #[serde(flatten)]
  pub software: SoftwareItem,
  pub approved: bool,
  pub response: ConsentResponse,
}

#[derive(Debug, Serialize)]
pub struct ConsentForm {
  pub school_name:       String,
  pub year:              u8,
  pub section:           u8,
  pub teacher_name:      String,
  pub teacher_note:      Option<String>,
  pub student_number:    u32,
  pub items:             Vec<FormItem>,
  pub submitted:         bool,
  pub confirmation_code: Option<String>,
}

/// `GET /guardian/consent`
pub async fn form<S: ConsentStore>(
  State(state): State<AppState<S>>,
  GuardianSession(identity): GuardianSession,
) -> Result<Json<ConsentForm>, ApiError> {
  let (class, record) = load(&state, &identity).await?;
  let school = state
    .store
    .get_school(identity.school_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("school {} not found", identity.school_id)))?;
  let approved = state
    .store
    .list_approvals(identity.school_id)
    .await
    .map_err(ApiError::store)?;

  let items = class
    .active_softwares()
    .iter()
    .map(|sw| FormItem {
      approved: sw.approved(Some(&approved)),
      response: record
        .as_ref()
        .map_or(ConsentResponse::UNANSWERED, |r| r.response(&sw.id)),
      software: sw.clone(),
    })
    .collect();

  Ok(Json(ConsentForm {
    school_name: school.name,
    year: class.year,
    section: class.section,
    teacher_name: class.teacher_name,
    teacher_note: class.teacher_note,
    student_number: identity.student_number,
    items,
    submitted: record.is_some(),
    confirmation_code: record.and_then(|r| r.confirmation_code),
  }))
}

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  /// Software id → answer. Ids not on the class's active list are dropped.
  pub responses: BTreeMap<String, ConsentResponse>,
}

#[derive(Debug, Serialize)]
pub struct Receipt {
  pub confirmation_code: String,
  pub agreed_slots:      usize,
  pub total_slots:       usize,
  pub updated_at:        DateTime<Utc>,
}

/// `PUT /guardian/consent`
///
/// The first submission for a slot draws a confirmation code; later ones
/// keep it.
pub async fn submit<S: ConsentStore>(
  State(state): State<AppState<S>>,
  GuardianSession(identity): GuardianSession,
  Json(body): Json<SubmitBody>,
) -> Result<Json<Receipt>, ApiError> {
  let (class, existing) = load(&state, &identity).await?;
  let softwares = class.active_softwares();

  let responses: BTreeMap<String, StoredResponse> = body
    .responses
    .into_iter()
    .filter(|(id, _)| softwares.iter().any(|sw| &sw.id == id))
    .map(|(id, r)| (id, StoredResponse::from(r)))
    .collect();
  let code = existing
    .and_then(|r| r.confirmation_code)
    .unwrap_or_else(|| confirmation_code(&mut OsRng));

  let record = state
    .store
    .put_consent(NewConsent {
      school_id:         identity.school_id,
      class_id:          identity.class_id.clone(),
      student_number:    identity.student_number,
      student_name:      identity.student_name.trim().to_owned(),
      parent_name:       identity.parent_name.trim().to_owned(),
      pin:               identity.pin.clone(),
      responses,
      confirmation_code: Some(code.clone()),
    })
    .await
    .map_err(ApiError::store)?;

  let tally = tally_student(&record, softwares);
  tracing::info!(
    consent_id = %record.consent_id,
    agreed = tally.agreed_slots,
    total = tally.total_slots,
    "consent submitted"
  );
  Ok(Json(Receipt {
    confirmation_code: code,
    agreed_slots:      tally.agreed_slots,
    total_slots:       tally.total_slots,
    updated_at:        record.updated_at,
  }))
}
