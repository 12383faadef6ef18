//! Explicit per-role sessions.
//!
//! A [`Session`] is created when a user picks a role and passes its login
//! check, and dropped at logout. Every operation receives the identity it
//! acts for from the session rather than from ambient state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  consent::ConsentRecord,
  identity::{ClassId, ConsentId, consent_id},
};

/// The identity a guardian claims for one student slot. Not a credential: the
/// PIN and names are compared as plain strings against an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianIdentity {
  pub school_id:      Uuid,
  pub class_id:       ClassId,
  pub student_number: u32,
  pub student_name:   String,
  pub parent_name:    String,
  pub pin:            String,
}

impl GuardianIdentity {
  pub fn consent_id(&self) -> ConsentId { consent_id(&self.class_id, self.student_number) }

  /// Whether this guardian may resume `record`: same PIN, and the same
  /// student and guardian names once trimmed.
  pub fn may_edit(&self, record: &ConsentRecord) -> bool {
    record.pin == self.pin
      && record.student_name.trim() == self.student_name.trim()
      && record.parent_name.trim() == self.parent_name.trim()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Session {
  Admin { school_id: Uuid },
  Teacher { school_id: Uuid, class_id: ClassId },
  Guardian(GuardianIdentity),
}

impl Session {
  pub fn role(&self) -> &'static str {
    match self {
      Self::Admin { .. } => "admin",
      Self::Teacher { .. } => "teacher",
      Self::Guardian(_) => "guardian",
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use chrono::Utc;

  use super::*;
  use crate::identity::class_id;

  fn guardian() -> GuardianIdentity {
    GuardianIdentity {
      school_id:      Uuid::nil(),
      class_id:       class_id(Uuid::nil(), 1, 1),
      student_number: 4,
      student_name:   "Kim Minji".into(),
      parent_name:    "Kim Sora".into(),
      pin:            "1234".into(),
    }
  }

  fn stored_for(g: &GuardianIdentity) -> ConsentRecord {
    ConsentRecord {
      consent_id:        g.consent_id(),
      school_id:         g.school_id,
      class_id:          g.class_id.clone(),
      student_number:    g.student_number,
      student_name:      " Kim Minji".into(),
      parent_name:       "Kim Sora ".into(),
      pin:               "1234".into(),
      responses:         BTreeMap::new(),
      confirmation_code: None,
      updated_at:        Utc::now(),
    }
  }

  #[test]
  fn matching_triple_may_edit() {
    let g = guardian();
    assert!(g.may_edit(&stored_for(&g)));
  }

  #[test]
  fn any_mismatch_is_rejected() {
    let g = guardian();
    let mut r = stored_for(&g);
    r.pin = "4321".into();
    assert!(!g.may_edit(&r));

    let mut r = stored_for(&g);
    r.student_name = "Lee Minji".into();
    assert!(!g.may_edit(&r));

    let mut r = stored_for(&g);
    r.parent_name = "kim sora".into();
    assert!(!g.may_edit(&r));
  }

  #[test]
  fn session_serializes_with_role_tag() {
    let s = Session::Admin { school_id: Uuid::nil() };
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["role"], "admin");
    assert_eq!(s.role(), "admin");
  }
}
