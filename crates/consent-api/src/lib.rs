//! JSON REST API for the consent service.
//!
//! Exposes an axum [`Router`] backed by any [`ConsentStore`]. Every route
//! lives under `/api`; sessions are carried as `Authorization: Bearer` tokens
//! issued by the `/api/session/*` login routes.

pub mod admin;
pub mod approvals;
pub mod assist;
pub mod auth;
pub mod error;
pub mod guardian;
pub mod schools;
pub mod session;
pub mod teacher;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post, put},
};
use consent_assist::GeminiClient;
use consent_core::store::ConsentStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::SessionStore;

/// Scanned committee documents can be large.
const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CONSENT_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// Public origin of the guardian web form, used for links and QR codes.
  #[serde(default = "default_base_url")]
  pub base_url:             String,
  /// Leave unset to disable document extraction and policy summaries.
  #[serde(default)]
  pub gemini_api_key:       Option<String>,
  #[serde(default = "default_gemini_model")]
  pub gemini_model:         String,
  #[serde(default = "default_gemini_base_url")]
  pub gemini_base_url:      String,
  /// Minutes a session may sit unused before it is dropped.
  #[serde(default = "default_session_idle_minutes")]
  pub session_idle_minutes: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("consent.db") }
fn default_base_url() -> String { "http://localhost:8080".to_string() }
fn default_gemini_model() -> String { "gemini-2.0-flash".to_string() }
fn default_session_idle_minutes() -> u64 { auth::DEFAULT_IDLE_TIMEOUT.as_secs() / 60 }
fn default_gemini_base_url() -> String {
  "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 default_host(),
      port:                 default_port(),
      store_path:           default_store_path(),
      base_url:             default_base_url(),
      gemini_api_key:       None,
      gemini_model:         default_gemini_model(),
      gemini_base_url:      default_gemini_base_url(),
      session_idle_minutes: default_session_idle_minutes(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: ConsentStore> {
  pub store:    Arc<S>,
  pub sessions: Arc<SessionStore>,
  /// `None` when no assistant is configured.
  pub assist:   Option<Arc<GeminiClient>>,
  pub config:   Arc<ServerConfig>,
}

// Manual impl: cloning only touches the `Arc`s, so `S` itself need not be
// `Clone`.
impl<S: ConsentStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      sessions: self.sessions.clone(),
      assist:   self.assist.clone(),
      config:   self.config.clone(),
    }
  }
}

impl<S: ConsentStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig, assist: Option<GeminiClient>) -> Self {
    Self {
      store:    Arc::new(store),
      sessions: Arc::new(SessionStore::with_idle_timeout(Duration::from_secs(
        config.session_idle_minutes.saturating_mul(60),
      ))),
      assist:   assist.map(Arc::new),
      config:   Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router, with every route nested under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ConsentStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let api = Router::new()
    // Public
    .route("/schools", get(schools::list::<S>).post(schools::create::<S>))
    .route("/schools/{id}/classes", get(schools::classes::<S>))
    // Sessions
    .route("/session", get(session::current::<S>).delete(session::logout::<S>))
    .route("/session/admin", post(session::admin_login::<S>))
    .route("/session/teacher", post(session::teacher_login::<S>))
    .route("/session/guardian", post(session::guardian_login::<S>))
    // Assistant
    .route("/assist/privacy-summary", post(assist::privacy_summary::<S>))
    // Admin: approvals
    .route(
      "/admin/approvals",
      get(approvals::list::<S>)
        .post(approvals::create::<S>)
        .delete(approvals::clear::<S>),
    )
    .route("/admin/approvals/{id}", delete(approvals::delete_one::<S>))
    .route(
      "/admin/approvals/extract",
      post(approvals::extract::<S>).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
    )
    .route("/admin/approvals/import", post(approvals::import::<S>))
    // Admin: school and classes
    .route("/admin/password", put(admin::change_password::<S>))
    .route("/admin/pending", get(admin::pending::<S>))
    .route("/admin/classes", get(admin::classes::<S>))
    .route("/admin/classes/{id}", delete(admin::delete_class::<S>))
    .route("/admin/classes/{id}/report", get(admin::report::<S>))
    .route("/admin/classes/{id}/approve-pending", post(admin::approve_pending::<S>))
    .route("/admin/classes/{id}/pin", put(admin::reset_pin::<S>))
    .route("/admin/classes/{id}/softwares", post(admin::import_softwares::<S>))
    .route(
      "/admin/classes/{id}/softwares/{software_id}",
      delete(admin::delete_software::<S>),
    )
    // Teacher
    .route("/teacher/class", get(teacher::get_class::<S>).put(teacher::save_selection::<S>))
    .route(
      "/teacher/class/softwares",
      post(teacher::import_softwares::<S>).delete(teacher::clear_registry::<S>),
    )
    .route("/teacher/class/reset", post(teacher::reset_selection::<S>))
    .route("/teacher/report", get(teacher::report::<S>))
    .route("/teacher/link", get(teacher::link::<S>))
    .route("/teacher/consents/{student_number}", delete(teacher::reset_consent::<S>))
    .route("/teacher/letter", post(teacher::letter::<S>))
    // Guardian
    .route("/guardian/consent", get(guardian::form::<S>).put(guardian::submit::<S>))
    .with_state(state);

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
