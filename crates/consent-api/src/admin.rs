//! Handlers for a school administrator's class and account management.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `PUT`    | `/admin/password` | Requires the current password |
//! | `GET`    | `/admin/pending` | Unapproved software across all classes |
//! | `GET`    | `/admin/classes` | Overview, ordered by year and section |
//! | `DELETE` | `/admin/classes/{id}` | Consent records are kept; teacher sessions end |
//! | `GET`    | `/admin/classes/{id}/report` | |
//! | `POST`   | `/admin/classes/{id}/approve-pending` | Atomic batch |
//! | `PUT`    | `/admin/classes/{id}/pin` | Teacher sessions end |
//! | `POST`   | `/admin/classes/{id}/softwares` | CSV body |
//! | `DELETE` | `/admin/classes/{id}/softwares/{software_id}` | |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use bytes::Bytes;
use consent_core::{
  aggregate::{ClassOverview, ClassReport, class_overview, class_report},
  approval::{pending_approvals, unapproved},
  class::{ClassConfig, SoftwareItem},
  identity::ClassId,
  import::import_softwares as parse_softwares,
  store::ConsentStore,
  validate::validate_pin,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  approvals::{ImportSummary, approve_names},
  auth::{AdminSession, hash_password, verify_password},
  error::ApiError,
};

/// Load a class of the admin's own school. Classes of other schools are
/// reported as missing.
async fn owned_class<S: ConsentStore>(
  state: &AppState<S>,
  school_id: Uuid,
  id: &str,
) -> Result<ClassConfig, ApiError> {
  state
    .store
    .get_class(ClassId::from_raw(id))
    .await
    .map_err(ApiError::store)?
    .filter(|c| c.school_id == school_id)
    .ok_or_else(|| ApiError::NotFound(format!("class {id} not found")))
}

/// Spreadsheet exports must be saved as UTF-8.
pub(crate) fn csv_text(body: &Bytes) -> Result<&str, ApiError> {
  std::str::from_utf8(body)
    .map_err(|_| consent_core::Error::Csv("file is not UTF-8 encoded".into()).into())
}

// ─── Account ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
  pub current_password: String,
  pub new_password:     String,
}

/// `PUT /admin/password`
pub async fn change_password<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Json(body): Json<PasswordBody>,
) -> Result<StatusCode, ApiError> {
  let school = state
    .store
    .get_school(admin.school_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("school {} not found", admin.school_id)))?;
  if !verify_password(&body.current_password, &school.admin_password_hash) {
    return Err(ApiError::Unauthorized("incorrect admin password".to_string()));
  }
  if body.new_password.is_empty() {
    return Err(consent_core::Error::MissingField("new_password").into());
  }

  state
    .store
    .set_admin_password(admin.school_id, hash_password(&body.new_password)?)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(school_id = %admin.school_id, "admin password changed");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Overview ─────────────────────────────────────────────────────────────────

/// `GET /admin/pending`
pub async fn pending<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
) -> Result<Json<Vec<SoftwareItem>>, ApiError> {
  let classes = state
    .store
    .list_classes(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  let approved = state
    .store
    .list_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(pending_approvals(&classes, &approved)))
}

/// `GET /admin/classes`
pub async fn classes<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
) -> Result<Json<Vec<ClassOverview>>, ApiError> {
  let classes = state
    .store
    .list_classes(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  let approved = state
    .store
    .list_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(class_overview(&classes, &approved)))
}

/// `GET /admin/classes/{id}/report`
pub async fn report<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<String>,
) -> Result<Json<ClassReport>, ApiError> {
  let class = owned_class(&state, admin.school_id, &id).await?;
  let consents = state
    .store
    .list_consents(class.class_id.clone())
    .await
    .map_err(ApiError::store)?;
  let approved = state
    .store
    .list_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(class_report(&class, consents, &approved)))
}

// ─── Class changes ────────────────────────────────────────────────────────────

/// `POST /admin/classes/{id}/approve-pending`
///
/// Approves every unapproved item of the class in one batch, then refreshes
/// the class's cached approval flags.
pub async fn approve_pending<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<String>,
) -> Result<Json<ImportSummary>, ApiError> {
  let mut class = owned_class(&state, admin.school_id, &id).await?;
  let approved = state
    .store
    .list_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  let names: Vec<String> = unapproved(class.active_softwares(), &approved)
    .into_iter()
    .map(|sw| sw.name.clone())
    .collect();

  let summary = approve_names(&state, admin.school_id, &names, None).await?;

  let approved = state
    .store
    .list_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  class.refresh_approval_cache(&approved);
  state.store.put_class(class).await.map_err(ApiError::store)?;
  Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct PinBody {
  pub pin: String,
}

/// `PUT /admin/classes/{id}/pin`
pub async fn reset_pin<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<String>,
  Json(body): Json<PinBody>,
) -> Result<StatusCode, ApiError> {
  validate_pin(&body.pin)?;
  let mut class = owned_class(&state, admin.school_id, &id).await?;
  class.pin = body.pin;
  state.store.put_class(class.clone()).await.map_err(ApiError::store)?;
  let revoked = state.sessions.close_class(&class.class_id).await;
  tracing::info!(class_id = %id, revoked, "teacher PIN reset");
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /admin/classes/{id}`
pub async fn delete_class<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let class = owned_class(&state, admin.school_id, &id).await?;
  state
    .store
    .delete_class(class.class_id.clone())
    .await
    .map_err(ApiError::store)?;
  let revoked = state.sessions.close_class(&class.class_id).await;
  tracing::info!(class_id = %id, revoked, "class deleted");
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /admin/classes/{id}/softwares` — body is the CSV text.
pub async fn import_softwares<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<String>,
  body: Bytes,
) -> Result<Json<ClassConfig>, ApiError> {
  let items = parse_softwares(csv_text(&body)?)?;
  let mut class = owned_class(&state, admin.school_id, &id).await?;
  let approved = state
    .store
    .list_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;

  let count = items.len();
  class.append_softwares(items, &approved);
  state.store.put_class(class.clone()).await.map_err(ApiError::store)?;
  tracing::info!(class_id = %id, count, "softwares imported by admin");
  Ok(Json(class))
}

/// `DELETE /admin/classes/{id}/softwares/{software_id}`
pub async fn delete_software<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path((id, software_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
  let mut class = owned_class(&state, admin.school_id, &id).await?;
  if !class.remove_software(&software_id) {
    return Err(ApiError::NotFound(format!("software {software_id} not found")));
  }
  state.store.put_class(class).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
