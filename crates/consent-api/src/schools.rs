//! Handlers for the public `/schools` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/schools` | Id and name only |
//! | `POST` | `/schools` | Body: `{"name":"…","admin_password":"…"}` |
//! | `GET`  | `/schools/{id}/classes` | Active classes, for the guardian login picker |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use consent_core::{
  code::access_code,
  identity::ClassId,
  school::{NewSchool, SchoolSummary},
  store::ConsentStore,
  validate::required,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::hash_password, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /schools`
pub async fn list<S: ConsentStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<SchoolSummary>>, ApiError> {
  let schools = state.store.list_schools().await.map_err(ApiError::store)?;
  Ok(Json(schools.iter().map(SchoolSummary::from).collect()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:           String,
  pub admin_password: String,
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub school_id:   Uuid,
  pub name:        String,
  pub access_code: String,
}

/// `POST /schools`
pub async fn create<S: ConsentStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let name = required(&body.name, "name")?.to_owned();
  if body.admin_password.is_empty() {
    return Err(consent_core::Error::MissingField("admin_password").into());
  }

  let school = state
    .store
    .create_school(NewSchool {
      name,
      admin_password_hash: hash_password(&body.admin_password)?,
      access_code: access_code(&mut OsRng),
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(school_id = %school.school_id, name = %school.name, "school registered");
  Ok((
    StatusCode::CREATED,
    Json(Created {
      school_id:   school.school_id,
      name:        school.name,
      access_code: school.access_code,
    }),
  ))
}

// ─── Classes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ClassEntry {
  pub class_id: ClassId,
  pub year:     u8,
  pub section:  u8,
}

/// `GET /schools/{id}/classes` — classes currently collecting consent.
pub async fn classes<S: ConsentStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<ClassEntry>>, ApiError> {
  state
    .store
    .get_school(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("school {id} not found")))?;

  let classes = state.store.list_classes(id).await.map_err(ApiError::store)?;
  Ok(Json(
    classes
      .into_iter()
      .filter(|c| c.is_active)
      .map(|c| ClassEntry { class_id: c.class_id, year: c.year, section: c.section })
      .collect(),
  ))
}
