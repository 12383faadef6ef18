//! Handlers for a school's approved-software list.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/approvals` | Oldest first |
//! | `POST`   | `/admin/approvals` | One name, rejected if already approved |
//! | `DELETE` | `/admin/approvals` | Clear all (atomic) |
//! | `DELETE` | `/admin/approvals/{id}` | |
//! | `POST`   | `/admin/approvals/extract` | Multipart `file`; names are advisory |
//! | `POST`   | `/admin/approvals/import` | Reviewed names; duplicates skipped |

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use consent_core::{
  approval::{ApprovedSoftware, NewApproval, is_approved, plan_import},
  store::ConsentStore,
  validate::required,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::AdminSession, error::ApiError};

/// Reply to the batch operations.
#[derive(Debug, Serialize)]
pub struct ImportSummary {
  pub added:   usize,
  pub skipped: usize,
}

/// Plan `names` against the school's list and persist the new ones in one
/// batch.
pub(crate) async fn approve_names<S: ConsentStore>(
  state: &AppState<S>,
  school_id: Uuid,
  names: &[String],
  document_url: Option<&str>,
) -> Result<ImportSummary, ApiError> {
  let existing = state
    .store
    .list_approvals(school_id)
    .await
    .map_err(ApiError::store)?;
  let plan = plan_import(&existing, names);

  let inputs: Vec<NewApproval> = plan
    .to_add
    .iter()
    .map(|name| NewApproval {
      document_url: document_url.map(str::to_owned),
      ..NewApproval::named(name)
    })
    .collect();
  let added = if inputs.is_empty() {
    0
  } else {
    state
      .store
      .add_approvals(school_id, inputs)
      .await
      .map_err(ApiError::store)?
      .len()
  };

  tracing::info!(%school_id, added, skipped = plan.skipped, "approvals imported");
  Ok(ImportSummary { added, skipped: plan.skipped })
}

// ─── List / create ────────────────────────────────────────────────────────────

/// `GET /admin/approvals`
pub async fn list<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
) -> Result<Json<Vec<ApprovedSoftware>>, ApiError> {
  let approvals = state
    .store
    .list_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(approvals))
}

/// `POST /admin/approvals`
pub async fn create<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Json(body): Json<NewApproval>,
) -> Result<impl IntoResponse, ApiError> {
  let name = required(&body.software_name, "software_name")?;
  let existing = state
    .store
    .list_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  if is_approved(&existing, name) {
    return Err(ApiError::BadRequest(format!("{name} is already approved")));
  }

  let approval = state
    .store
    .add_approval(admin.school_id, NewApproval {
      software_name: name.to_owned(),
      privacy_url:   body.privacy_url.trim().to_owned(),
      document_url:  body.document_url,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    school_id = %admin.school_id,
    name = %approval.software_name,
    "software approved"
  );
  Ok((StatusCode::CREATED, Json(approval)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /admin/approvals/{id}`
pub async fn delete_one<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let deleted = state
    .store
    .delete_approval(admin.school_id, id)
    .await
    .map_err(ApiError::store)?;
  if deleted {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("approval {id} not found")))
  }
}

#[derive(Debug, Serialize)]
pub struct Cleared {
  pub removed: usize,
}

/// `DELETE /admin/approvals`
pub async fn clear<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
) -> Result<Json<Cleared>, ApiError> {
  let removed = state
    .store
    .clear_approvals(admin.school_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(school_id = %admin.school_id, removed, "approvals cleared");
  Ok(Json(Cleared { removed }))
}

// ─── Document extraction ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Extracted {
  pub names: Vec<String>,
}

/// `POST /admin/approvals/extract`
///
/// Reads software titles off the uploaded committee document. Nothing is
/// saved: the operator reviews the names and posts them to `import`.
pub async fn extract<S: ConsentStore>(
  State(state): State<AppState<S>>,
  _admin: AdminSession,
  mut multipart: Multipart,
) -> Result<Json<Extracted>, ApiError> {
  let assist = state
    .assist
    .clone()
    .ok_or_else(|| ApiError::Unavailable("document extraction is not configured".to_string()))?;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.body_text()))?
  {
    if field.name() != Some("file") {
      continue;
    }
    let file_name = field.file_name().unwrap_or("upload").to_owned();
    let mime = field.content_type().map(str::to_owned);
    let bytes = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if bytes.is_empty() {
      return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
    }

    let names = assist
      .extract_software_names(&bytes, &file_name, mime.as_deref())
      .await?;
    return Ok(Json(Extracted { names }));
  }

  Err(consent_core::Error::MissingField("file").into())
}

// ─── Import ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub names:        Vec<String>,
  /// Where the reviewed document is kept, recorded on every new approval.
  #[serde(default)]
  pub document_url: Option<String>,
}

/// `POST /admin/approvals/import`
pub async fn import<S: ConsentStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Json(body): Json<ImportBody>,
) -> Result<Json<ImportSummary>, ApiError> {
  let summary = approve_names(
    &state,
    admin.school_id,
    &body.names,
    body.document_url.as_deref().filter(|u| !u.trim().is_empty()),
  )
  .await?;
  Ok(Json(summary))
}
