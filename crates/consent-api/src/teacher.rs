//! Handlers for the teacher's own class.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/teacher/class` | Configuration with fresh approval flags |
//! | `PUT`    | `/teacher/class` | Selection and note |
//! | `POST`   | `/teacher/class/softwares` | CSV body, appended to the registry |
//! | `DELETE` | `/teacher/class/softwares` | Empties the class and deactivates it |
//! | `POST`   | `/teacher/class/reset` | Clears the selection and deactivates |
//! | `GET`    | `/teacher/report` | |
//! | `GET`    | `/teacher/link` | Guardian form URL, for the QR code |
//! | `DELETE` | `/teacher/consents/{student_number}` | |
//! | `POST`   | `/teacher/letter` | `.docx` download |

use axum::{
  Json,
  extract::{Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use chrono::{Datelike as _, Utc};
use consent_core::{
  aggregate::{ClassReport, class_report},
  approval::{ApprovedSoftware, unapproved},
  class::ClassConfig,
  identity::consent_id,
  import::import_softwares as parse_softwares,
  store::ConsentStore,
};
use consent_letter::{LetterInput, letter_file_name, render_letter};
use serde::{Deserialize, Serialize};

use crate::{AppState, admin::csv_text, auth::TeacherSession, error::ApiError};

const DOCX_CONTENT_TYPE: &str =
  "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The session's class and the school's approved list.
async fn load<S: ConsentStore>(
  state: &AppState<S>,
  teacher: &TeacherSession,
) -> Result<(ClassConfig, Vec<ApprovedSoftware>), ApiError> {
  let class = state
    .store
    .get_class(teacher.class_id.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("class {} not found", teacher.class_id)))?;
  let approved = state
    .store
    .list_approvals(teacher.school_id)
    .await
    .map_err(ApiError::store)?;
  Ok((class, approved))
}

#[derive(Debug, Serialize)]
pub struct ClassView {
  #[serde(flatten)]
  pub class:   ClassConfig,
  /// Names of active items still awaiting committee approval.
  pub pending: Vec<String>,
}

fn view(mut class: ClassConfig, approved: &[ApprovedSoftware]) -> ClassView {
  class.refresh_approval_cache(approved);
  let pending = unapproved(class.active_softwares(), approved)
    .into_iter()
    .map(|sw| sw.name.clone())
    .collect();
  ClassView { class, pending }
}

// ─── Class configuration ──────────────────────────────────────────────────────

/// `GET /teacher/class`
pub async fn get_class<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
) -> Result<Json<ClassView>, ApiError> {
  let (class, approved) = load(&state, &teacher).await?;
  Ok(Json(view(class, &approved)))
}

#[derive(Debug, Deserialize)]
pub struct SelectionBody {
  pub selected_ids: Vec<String>,
  #[serde(default)]
  pub teacher_note: Option<String>,
}

/// `PUT /teacher/class`
pub async fn save_selection<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
  Json(body): Json<SelectionBody>,
) -> Result<Json<ClassView>, ApiError> {
  let (mut class, approved) = load(&state, &teacher).await?;
  class.select(&body.selected_ids, &approved);
  class.teacher_note = body
    .teacher_note
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty());
  class.is_active = true;

  state.store.put_class(class.clone()).await.map_err(ApiError::store)?;
  tracing::info!(
    class_id = %class.class_id,
    selected = class.selected_softwares.len(),
    "selection saved"
  );
  Ok(Json(view(class, &approved)))
}

/// `POST /teacher/class/softwares` — body is the CSV text.
pub async fn import_softwares<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
  body: Bytes,
) -> Result<Json<ClassView>, ApiError> {
  let items = parse_softwares(csv_text(&body)?)?;
  let (mut class, approved) = load(&state, &teacher).await?;

  let count = items.len();
  class.append_softwares(items, &approved);
  state.store.put_class(class.clone()).await.map_err(ApiError::store)?;
  tracing::info!(class_id = %class.class_id, count, "softwares imported");
  Ok(Json(view(class, &approved)))
}

/// `DELETE /teacher/class/softwares`
pub async fn clear_registry<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
) -> Result<Json<ClassView>, ApiError> {
  let (mut class, approved) = load(&state, &teacher).await?;
  class.registry_softwares.clear();
  class.selected_softwares.clear();
  class.is_active = false;

  state.store.put_class(class.clone()).await.map_err(ApiError::store)?;
  tracing::info!(class_id = %class.class_id, "software registry cleared");
  Ok(Json(view(class, &approved)))
}

/// `POST /teacher/class/reset`
pub async fn reset_selection<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
) -> Result<Json<ClassView>, ApiError> {
  let (mut class, approved) = load(&state, &teacher).await?;
  class.selected_softwares.clear();
  class.is_active = false;

  state.store.put_class(class.clone()).await.map_err(ApiError::store)?;
  tracing::info!(class_id = %class.class_id, "selection reset");
  Ok(Json(view(class, &approved)))
}

// ─── Consents ─────────────────────────────────────────────────────────────────

/// `GET /teacher/report`
pub async fn report<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
) -> Result<Json<ClassReport>, ApiError> {
  let (class, approved) = load(&state, &teacher).await?;
  let consents = state
    .store
    .list_consents(class.class_id.clone())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(class_report(&class, consents, &approved)))
}

/// `DELETE /teacher/consents/{student_number}`
pub async fn reset_consent<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
  Path(student_number): Path<u32>,
) -> Result<StatusCode, ApiError> {
  let id = consent_id(&teacher.class_id, student_number);
  let deleted = state
    .store
    .delete_consent(id.clone())
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("no consent for student {student_number}")));
  }
  tracing::info!(consent_id = %id, "consent reset");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Guardian link and letter ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Link {
  pub url: String,
}

fn guardian_url<S: ConsentStore>(state: &AppState<S>, teacher: &TeacherSession) -> String {
  format!(
    "{}/guardian?school={}&class={}",
    state.config.base_url.trim_end_matches('/'),
    teacher.school_id,
    teacher.class_id
  )
}

/// `GET /teacher/link`
pub async fn link<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
) -> Json<Link> {
  Json(Link { url: guardian_url(&state, &teacher) })
}

#[derive(Debug, Deserialize)]
pub struct LetterBody {
  /// The QR code the client rendered from `/teacher/link`.
  pub qr_png_base64: String,
  #[serde(default)]
  pub school_year:   Option<i32>,
}

/// Percent-encode everything outside the RFC 5987 attribute characters.
fn encode_ext_value(value: &str) -> String {
  let mut out = String::with_capacity(value.len() * 3);
  for b in value.bytes() {
    if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
      out.push(b as char);
    } else {
      out.push_str(&format!("%{b:02X}"));
    }
  }
  out
}

/// `POST /teacher/letter`
pub async fn letter<S: ConsentStore>(
  State(state): State<AppState<S>>,
  teacher: TeacherSession,
  Json(body): Json<LetterBody>,
) -> Result<impl IntoResponse, ApiError> {
  let qr_png = STANDARD
    .decode(body.qr_png_base64.trim())
    .map_err(|e| ApiError::BadRequest(format!("qr_png_base64: {e}")))?;
  let (class, _) = load(&state, &teacher).await?;
  let school = state
    .store
    .get_school(teacher.school_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("school {} not found", teacher.school_id)))?;

  let bytes = render_letter(&LetterInput {
    school_name:  school.name,
    year:         class.year,
    section:      class.section,
    teacher_name: class.teacher_name,
    school_year:  body.school_year.unwrap_or_else(|| Utc::now().year()),
    guardian_url: Some(guardian_url(&state, &teacher)),
    qr_png,
  })?;

  let file_name = letter_file_name(class.year, class.section);
  let disposition = format!(
    "attachment; filename=\"letter-{}-{}.docx\"; filename*=UTF-8''{}",
    class.year,
    class.section,
    encode_ext_value(&file_name)
  );
  tracing::info!(class_id = %class.class_id, size = bytes.len(), "letter rendered");
  Ok((
    [
      (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    bytes,
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ext_value_encoding() {
    assert_eq!(encode_ext_value("a b.docx"), "a%20b.docx");
    assert_eq!(encode_ext_value("반"), "%EB%B0%98");
  }
}
