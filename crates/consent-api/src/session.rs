//! Role selection: login and logout for administrators, teachers and
//! guardians.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/session/admin` | School id + admin password |
//! | `POST`   | `/session/teacher` | Registers the class on first login |
//! | `POST`   | `/session/guardian` | Checked against any existing record |
//! | `GET`    | `/session` | The caller's session |
//! | `DELETE` | `/session` | Logout |

use axum::{Json, extract::State, http::StatusCode};
use consent_core::{
  class::ClassConfig,
  identity::class_id,
  school::School,
  session::{GuardianIdentity, Session},
  store::ConsentStore,
  validate::{positive, required, validate_pin},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{Authenticated, verify_password},
  error::ApiError,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:   String,
  pub session: Session,
}

async fn school<S: ConsentStore>(state: &AppState<S>, id: Uuid) -> Result<School, ApiError> {
  state
    .store
    .get_school(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("school {id} not found")))
}

async fn open<S: ConsentStore>(state: &AppState<S>, session: Session) -> Json<LoginResponse> {
  let token = state.sessions.open(session.clone()).await;
  Json(LoginResponse { token, session })
}

// ─── Admin ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdminLogin {
  pub school_id: Uuid,
  pub password:  String,
}

/// `POST /session/admin`
pub async fn admin_login<S: ConsentStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<AdminLogin>,
) -> Result<Json<LoginResponse>, ApiError> {
  let school = school(&state, body.school_id).await?;
  if !verify_password(&body.password, &school.admin_password_hash) {
    tracing::info!(school_id = %school.school_id, "admin login rejected");
    return Err(ApiError::Unauthorized("incorrect admin password".to_string()));
  }
  Ok(open(&state, Session::Admin { school_id: school.school_id }).await)
}

// ─── Teacher ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TeacherLogin {
  pub school_id:    Uuid,
  pub year:         u8,
  pub section:      u8,
  pub teacher_name: String,
  pub pin:          String,
}

/// `POST /session/teacher`
///
/// The first login for a year and section registers the class under the
/// given teacher name and PIN. Later logins must repeat both; an inactive
/// class is re-activated.
pub async fn teacher_login<S: ConsentStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<TeacherLogin>,
) -> Result<Json<LoginResponse>, ApiError> {
  let year = positive(body.year, "year")?;
  let section = positive(body.section, "section")?;
  let teacher_name = required(&body.teacher_name, "teacher_name")?;
  validate_pin(&body.pin)?;
  school(&state, body.school_id).await?;

  let id = class_id(body.school_id, year, section);
  match state.store.get_class(id.clone()).await.map_err(ApiError::store)? {
    None => {
      let class = ClassConfig::new(body.school_id, year, section, teacher_name, &body.pin);
      state.store.put_class(class).await.map_err(ApiError::store)?;
      tracing::info!(class_id = %id, "class registered");
    }
    Some(mut class) => {
      if class.teacher_name.trim() != teacher_name {
        return Err(ApiError::Unauthorized(
          "teacher name does not match the registered teacher".to_string(),
        ));
      }
      if class.pin != body.pin {
        return Err(ApiError::Unauthorized("incorrect PIN".to_string()));
      }
      if !class.is_active {
        class.is_active = true;
        state.store.put_class(class).await.map_err(ApiError::store)?;
        tracing::info!(class_id = %id, "class re-activated");
      }
    }
  }

  Ok(open(&state, Session::Teacher { school_id: body.school_id, class_id: id }).await)
}

// ─── Guardian ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GuardianLogin {
  pub school_id:      Uuid,
  pub year:           u8,
  pub section:        u8,
  pub student_number: u32,
  pub student_name:   String,
  pub parent_name:    String,
  pub pin:            String,
}

/// `POST /session/guardian`
///
/// The PIN and names are a claim, not a credential: they are only compared
/// against an existing record for the same student slot.
pub async fn guardian_login<S: ConsentStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<GuardianLogin>,
) -> Result<Json<LoginResponse>, ApiError> {
  let year = positive(body.year, "year")?;
  let section = positive(body.section, "section")?;
  let student_number = positive(body.student_number, "student_number")?;
  let student_name = required(&body.student_name, "student_name")?;
  let parent_name = required(&body.parent_name, "parent_name")?;
  validate_pin(&body.pin)?;

  let id = class_id(body.school_id, year, section);
  let class = state
    .store
    .get_class(id.clone())
    .await
    .map_err(ApiError::store)?
    .filter(|c| c.is_active)
    .ok_or_else(|| ApiError::NotFound("this class is not collecting consent".to_string()))?;

  let identity = GuardianIdentity {
    school_id: class.school_id,
    class_id: class.class_id,
    student_number,
    student_name: student_name.to_owned(),
    parent_name: parent_name.to_owned(),
    pin: body.pin,
  };
  let existing = state
    .store
    .get_consent(identity.consent_id())
    .await
    .map_err(ApiError::store)?;
  if let Some(record) = existing
    && !identity.may_edit(&record)
  {
    tracing::info!(consent_id = %record.consent_id, "guardian resume rejected");
    return Err(ApiError::not_authorized_to_edit());
  }

  Ok(open(&state, Session::Guardian(identity)).await)
}

// ─── Current / logout ─────────────────────────────────────────────────────────

/// `GET /session`
pub async fn current<S: ConsentStore>(auth: Authenticated) -> Json<Session> {
  Json(auth.session)
}

/// `DELETE /session`
pub async fn logout<S: ConsentStore>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> StatusCode {
  state.sessions.close(&auth.token).await;
  StatusCode::NO_CONTENT
}
