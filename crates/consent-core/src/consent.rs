//! Consent records and the response normalizer.
//!
//! Guardians answer up to three independent yes/no questions per software
//! item. Records written before the three-axis model stored a bare boolean
//! (or null) per item; both shapes are read through [`normalize`] and never
//! compared directly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{ClassId, ConsentId};

// ─── Responses ───────────────────────────────────────────────────────────────

/// A guardian's decision on one software item. `None` means unanswered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentResponse {
  /// Legacy basic agreement.
  #[serde(default)]
  pub agree:          Option<bool>,
  #[serde(default, alias = "collectionUse")]
  pub collection_use: Option<bool>,
  #[serde(default, alias = "thirdParty")]
  pub third_party:    Option<bool>,
}

impl ConsentResponse {
  /// Every axis unanswered.
  pub const UNANSWERED: Self = Self {
    agree:          None,
    collection_use: None,
    third_party:    None,
  };

  pub fn axes(&self) -> [Option<bool>; 3] {
    [self.agree, self.collection_use, self.third_party]
  }

  pub fn fully_agreed(&self) -> bool {
    self.axes().iter().all(|v| *v == Some(true))
  }

  pub fn any_disagreed(&self) -> bool {
    self.axes().iter().any(|v| *v == Some(false))
  }

  /// `true` answers on the two current axes (collection/use, third party).
  pub fn current_axes_agreed(&self) -> usize {
    [self.collection_use, self.third_party]
      .iter()
      .filter(|v| **v == Some(true))
      .count()
  }
}

/// A response as it sits in storage: either the legacy single value or the
/// structured form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredResponse {
  LegacyBoolean(Option<bool>),
  Structured(ConsentResponse),
}

impl From<ConsentResponse> for StoredResponse {
  fn from(r: ConsentResponse) -> Self { Self::Structured(r) }
}

impl StoredResponse {
  pub fn normalize(&self) -> ConsentResponse {
    match *self {
      Self::LegacyBoolean(agree) => ConsentResponse { agree, ..ConsentResponse::UNANSWERED },
      Self::Structured(r) => r,
    }
  }
}

/// Upgrade whatever is stored for an item (possibly nothing) to the
/// three-axis form.
pub fn normalize(raw: Option<&StoredResponse>) -> ConsentResponse {
  raw.map_or(ConsentResponse::UNANSWERED, StoredResponse::normalize)
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// One student slot's consent decisions for a class. Keyed by
/// [`crate::identity::consent_id`]; a resubmission replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
  pub consent_id:        ConsentId,
  pub school_id:         Uuid,
  pub class_id:          ClassId,
  pub student_number:    u32,
  pub student_name:      String,
  pub parent_name:       String,
  pub pin:               String,
  /// Software id → stored response.
  pub responses:         BTreeMap<String, StoredResponse>,
  pub confirmation_code: Option<String>,
  /// Server-assigned on every write.
  pub updated_at:        DateTime<Utc>,
}

impl ConsentRecord {
  /// The normalized response for `software_id`.
  pub fn response(&self, software_id: &str) -> ConsentResponse {
    normalize(self.responses.get(software_id))
  }
}

/// Input to [`crate::store::ConsentStore::put_consent`]. The store derives the
/// id from `class_id` and `student_number` and stamps `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConsent {
  pub school_id:         Uuid,
  pub class_id:          ClassId,
  pub student_number:    u32,
  pub student_name:      String,
  pub parent_name:       String,
  pub pin:               String,
  pub responses:         BTreeMap<String, StoredResponse>,
  pub confirmation_code: Option<String>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn stored(v: serde_json::Value) -> StoredResponse {
    serde_json::from_value(v).expect("stored response")
  }

  #[test]
  fn normalize_null_and_missing() {
    assert_eq!(normalize(None), ConsentResponse::UNANSWERED);
    assert_eq!(stored(json!(null)).normalize(), ConsentResponse::UNANSWERED);
  }

  #[test]
  fn normalize_legacy_boolean() {
    assert_eq!(
      stored(json!(true)).normalize(),
      ConsentResponse { agree: Some(true), collection_use: None, third_party: None }
    );
    assert_eq!(stored(json!(false)).normalize().agree, Some(false));
  }

  #[test]
  fn normalize_partial_structure_defaults_to_null() {
    assert_eq!(
      stored(json!({ "agree": false })).normalize(),
      ConsentResponse { agree: Some(false), collection_use: None, third_party: None }
    );
    assert_eq!(
      stored(json!({ "third_party": true, "collection_use": null })).normalize(),
      ConsentResponse { agree: None, collection_use: None, third_party: Some(true) }
    );
  }

  #[test]
  fn camel_case_documents_are_accepted() {
    assert_eq!(
      stored(json!({ "agree": true, "collectionUse": true, "thirdParty": false })).normalize(),
      ConsentResponse { agree: Some(true), collection_use: Some(true), third_party: Some(false) }
    );
  }

  #[test]
  fn stored_shapes_serialize_back_unchanged() {
    assert_eq!(serde_json::to_value(StoredResponse::LegacyBoolean(None)).unwrap(), json!(null));
    assert_eq!(serde_json::to_value(StoredResponse::LegacyBoolean(Some(true))).unwrap(), json!(true));
    let s = StoredResponse::from(ConsentResponse { agree: None, collection_use: Some(true), third_party: Some(false) });
    assert_eq!(
      serde_json::to_value(s).unwrap(),
      json!({ "agree": null, "collection_use": true, "third_party": false })
    );
  }

  #[test]
  fn bucket_predicates() {
    let all = ConsentResponse { agree: Some(true), collection_use: Some(true), third_party: Some(true) };
    assert!(all.fully_agreed());
    assert!(!all.any_disagreed());
    assert_eq!(all.current_axes_agreed(), 2);

    let mixed = ConsentResponse { agree: None, collection_use: Some(false), third_party: None };
    assert!(!mixed.fully_agreed());
    assert!(mixed.any_disagreed());
  }
}
