//! Deterministic composite keys.
//!
//! A class is identified by `{school}-{year}-{section}` and a consent record
//! by `{class}-{student_number}`. Because the keys are derived rather than
//! allocated, writing a class or a consent record is always an upsert: at most
//! one configuration exists per class and at most one record per student slot.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a [`ClassConfig`](crate::class::ClassConfig).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(String);

/// Identifier of a [`ConsentRecord`](crate::consent::ConsentRecord).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentId(String);

impl ClassId {
  /// Wrap an already-derived key, e.g. one read back from storage or a URL.
  pub fn from_raw(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl ConsentId {
  pub fn from_raw(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ClassId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl fmt::Display for ConsentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Key of the class `year`/`section` in `school_id`.
pub fn class_id(school_id: Uuid, year: u8, section: u8) -> ClassId {
  ClassId(format!("{school_id}-{year}-{section}"))
}

/// Key of the consent slot for `student_number` in `class_id`.
pub fn consent_id(class_id: &ClassId, student_number: u32) -> ConsentId {
  ConsentId(format!("{class_id}-{student_number}"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn class_id_is_deterministic() {
    let school = Uuid::new_v4();
    assert_eq!(class_id(school, 3, 2), class_id(school, 3, 2));
    assert_eq!(class_id(school, 3, 2).as_str(), format!("{school}-3-2"));
  }

  #[test]
  fn class_ids_differ_per_section() {
    let school = Uuid::new_v4();
    assert_ne!(class_id(school, 1, 12), class_id(school, 11, 2));
    assert_ne!(class_id(school, 1, 1), class_id(school, 1, 2));
  }

  #[test]
  fn consent_id_extends_class_id() {
    let school = Uuid::new_v4();
    let class = class_id(school, 5, 1);
    let id = consent_id(&class, 17);
    assert_eq!(id.as_str(), format!("{school}-5-1-17"));
    assert_ne!(id, consent_id(&class, 7));
  }
}
