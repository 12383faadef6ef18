//! Admin password hashing, the session table and the bearer-token extractors.
//!
//! A login creates a [`Session`] and hands back an opaque token; every other
//! protected route resolves the token through one of the extractors below.

use std::{
  collections::HashMap,
  time::{Duration, Instant},
};

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use consent_core::{
  identity::ClassId,
  session::{GuardianIdentity, Session},
  store::ConsentStore,
};
use rand_core::{OsRng, RngCore as _};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

const TOKEN_BYTES: usize = 32;

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  PasswordHash::new(password_hash)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

// ─── Session table ───────────────────────────────────────────────────────────

/// Idle time after which a session is dropped when no other value is
/// configured.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

struct Entry {
  session:   Session,
  last_seen: Instant,
}

/// Live sessions keyed by bearer token. A session ends at logout, after
/// `idle_timeout` without use, or when an admin revokes it.
pub struct SessionStore {
  sessions:     RwLock<HashMap<String, Entry>>,
  idle_timeout: Duration,
}

impl Default for SessionStore {
  fn default() -> Self { Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT) }
}

impl SessionStore {
  pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
    Self { sessions: RwLock::default(), idle_timeout }
  }

  /// Register `session` and return its new token. Expired entries are
  /// pruned on the way.
  pub async fn open(&self, session: Session) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    let now = Instant::now();
    let mut sessions = self.sessions.write().await;
    sessions.retain(|_, e| now.duration_since(e.last_seen) < self.idle_timeout);
    sessions.insert(token.clone(), Entry { session, last_seen: now });
    token
  }

  /// Resolve `token` and mark it used. An idle session is removed instead.
  pub async fn get(&self, token: &str) -> Option<Session> {
    let now = Instant::now();
    let mut sessions = self.sessions.write().await;
    let entry = sessions.get_mut(token)?;
    if now.duration_since(entry.last_seen) >= self.idle_timeout {
      sessions.remove(token);
      return None;
    }
    entry.last_seen = now;
    Some(entry.session.clone())
  }

  /// Returns `false` if the token was not live.
  pub async fn close(&self, token: &str) -> bool {
    self.sessions.write().await.remove(token).is_some()
  }

  /// Drop every session matching `revoked`; returns how many were dropped.
  pub async fn close_where(&self, revoked: impl Fn(&Session) -> bool) -> usize {
    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, e| !revoked(&e.session));
    before - sessions.len()
  }

  /// Drop every teacher session bound to `class_id`.
  pub async fn close_class(&self, class_id: &ClassId) -> usize {
    self
      .close_where(|s| matches!(s, Session::Teacher { class_id: c, .. } if c == class_id))
      .await
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Any live session, together with the token that named it.
pub struct Authenticated {
  pub token:   String,
  pub session: Session,
}

/// A live administrator session.
pub struct AdminSession {
  pub school_id: Uuid,
}

/// A live teacher session.
pub struct TeacherSession {
  pub school_id: Uuid,
  pub class_id:  ClassId,
}

/// A live guardian session.
pub struct GuardianSession(pub GuardianIdentity);

fn bearer_token(parts: &Parts) -> Option<&str> {
  parts
    .headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

fn wrong_role(expected: &str) -> ApiError {
  ApiError::Forbidden(format!("this action requires the {expected} role"))
}

impl<S: ConsentStore> FromRequestParts<AppState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(parts)
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?
      .to_owned();
    let session = state
      .sessions
      .get(&token)
      .await
      .ok_or_else(|| ApiError::Unauthorized("session expired or unknown".to_string()))?;
    Ok(Self { token, session })
  }
}

impl<S: ConsentStore> FromRequestParts<AppState<S>> for AdminSession {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match Authenticated::from_request_parts(parts, state).await?.session {
      Session::Admin { school_id } => Ok(Self { school_id }),
      _ => Err(wrong_role("admin")),
    }
  }
}

impl<S: ConsentStore> FromRequestParts<AppState<S>> for TeacherSession {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match Authenticated::from_request_parts(parts, state).await?.session {
      Session::Teacher { school_id, class_id } => Ok(Self { school_id, class_id }),
      _ => Err(wrong_role("teacher")),
    }
  }
}

impl<S: ConsentStore> FromRequestParts<AppState<S>> for GuardianSession {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match Authenticated::from_request_parts(parts, state).await?.session {
      Session::Guardian(identity) => Ok(Self(identity)),
      _ => Err(wrong_role("guardian")),
    }
  }
}
