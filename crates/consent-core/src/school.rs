//! School — the root tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A school as stored. Never serialised to unauthenticated callers; use
/// [`SchoolSummary`] for public listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
  pub school_id:           Uuid,
  pub name:                String,
  /// argon2 PHC string of the administrator password.
  pub admin_password_hash: String,
  pub access_code:         String,
  pub created_at:          DateTime<Utc>,
}

/// Input to [`crate::store::ConsentStore::create_school`].
/// `school_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSchool {
  pub name:                String,
  pub admin_password_hash: String,
  pub access_code:         String,
}

/// The public face of a school: enough to pick it from a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolSummary {
  pub school_id: Uuid,
  pub name:      String,
}

impl From<&School> for SchoolSummary {
  fn from(s: &School) -> Self {
    Self { school_id: s.school_id, name: s.name.clone() }
  }
}
