//! Board ("SMC") approval records and the name matcher.
//!
//! Approval is decided by name only: an item is approved when some record for
//! the school has the same trimmed, case-folded name. There is no fuzzy
//! matching; a stray trademark sign or inner space makes a name pending.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::class::{ClassConfig, SoftwareItem};

/// A software title cleared by a school's governing committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedSoftware {
  pub approval_id:   Uuid,
  pub school_id:     Uuid,
  pub software_name: String,
  pub privacy_url:   String,
  /// Scanned committee document the name was taken from, if any.
  pub document_url:  Option<String>,
  /// Server-assigned.
  pub approved_at:   DateTime<Utc>,
}

/// Input to the approval write operations of
/// [`crate::store::ConsentStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApproval {
  pub software_name: String,
  #[serde(default)]
  pub privacy_url:   String,
  #[serde(default)]
  pub document_url:  Option<String>,
}

impl NewApproval {
  /// An approval for `name` with the name trimmed and no links.
  pub fn named(name: &str) -> Self {
    Self {
      software_name: name.trim().to_owned(),
      privacy_url:   String::new(),
      document_url:  None,
    }
  }
}

// ─── Matching ────────────────────────────────────────────────────────────────

fn match_key(name: &str) -> String { name.trim().to_lowercase() }

/// Case- and surrounding-whitespace-insensitive equality. Blank names never
/// match anything, including each other.
pub fn names_match(a: &str, b: &str) -> bool {
  let (a, b) = (a.trim(), b.trim());
  if a.is_empty() || b.is_empty() {
    return false;
  }
  a.to_lowercase() == b.to_lowercase()
}

/// Whether `software_name` appears on the approved list.
pub fn is_approved(approved: &[ApprovedSoftware], software_name: &str) -> bool {
  approved
    .iter()
    .any(|a| names_match(&a.software_name, software_name))
}

/// Items of `items` that are not approved, in order.
pub fn unapproved<'a>(
  items: &'a [SoftwareItem],
  approved: &[ApprovedSoftware],
) -> Vec<&'a SoftwareItem> {
  items
    .iter()
    .filter(|sw| !is_approved(approved, &sw.name))
    .collect()
}

/// Every unapproved item used by any of `classes`, one per distinct name
/// (first occurrence wins).
pub fn pending_approvals(
  classes: &[ClassConfig],
  approved: &[ApprovedSoftware],
) -> Vec<SoftwareItem> {
  let mut seen = HashSet::new();
  classes
    .iter()
    .flat_map(|c| c.active_softwares())
    .filter(|sw| !is_approved(approved, &sw.name))
    .filter(|sw| seen.insert(match_key(&sw.name)))
    .cloned()
    .collect()
}

// ─── Batch import ────────────────────────────────────────────────────────────

/// Outcome of planning a batch of reviewed names against an approved list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
  /// Names to persist, trimmed, in input order.
  pub to_add:  Vec<String>,
  /// Non-blank names dropped because they were already approved or repeated
  /// earlier in the batch.
  pub skipped: usize,
}

/// Decide which of `names` to add. Blank entries are ignored outright;
/// duplicates use the same rule as [`is_approved`].
pub fn plan_import<S: AsRef<str>>(
  existing: &[ApprovedSoftware],
  names: &[S],
) -> ImportPlan {
  let mut seen: HashSet<String> = existing
    .iter()
    .map(|a| match_key(&a.software_name))
    .filter(|k| !k.is_empty())
    .collect();

  let mut to_add = Vec::new();
  let mut skipped = 0;
  for name in names.iter().map(|n| n.as_ref().trim()) {
    if name.is_empty() {
      continue;
    }
    if seen.insert(match_key(name)) {
      to_add.push(name.to_owned());
    } else {
      skipped += 1;
    }
  }
  ImportPlan { to_add, skipped }
}
