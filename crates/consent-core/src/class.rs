//! Class configuration and the software items embedded in it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  approval::{ApprovedSoftware, is_approved},
  identity::{ClassId, class_id},
};

/// A piece of software a teacher proposes to use with a class. Embedded in
/// [`ClassConfig`]; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareItem {
  pub id:                     String,
  pub name:                   String,
  #[serde(default)]
  pub age_range:              String,
  #[serde(default)]
  pub url:                    String,
  #[serde(default)]
  pub privacy_url:            String,
  /// Notice text shown to guardians for the collection/use decision.
  #[serde(default)]
  pub collection_use_consent: Option<String>,
  /// Notice text shown to guardians for the third-party decision.
  #[serde(default)]
  pub third_party_consent:    Option<String>,
  /// Approval status cached when the item was last saved. Only trust it when
  /// the school's approved list is unavailable.
  #[serde(default)]
  pub is_smc_approved:        Option<bool>,
  #[serde(default)]
  pub has_ai:                 bool,
  #[serde(default)]
  pub has_lms:                bool,
}

impl SoftwareItem {
  /// Convenience constructor with a fresh id and every optional field empty.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      id:                     format!("sw-{}", Uuid::new_v4().simple()),
      name:                   name.into(),
      age_range:              String::new(),
      url:                    String::new(),
      privacy_url:            String::new(),
      collection_use_consent: None,
      third_party_consent:    None,
      is_smc_approved:        None,
      has_ai:                 false,
      has_lms:                false,
    }
  }

  /// Approval status, preferring the live approved list over the cache.
  pub fn approved(&self, approved: Option<&[ApprovedSoftware]>) -> bool {
    match approved {
      Some(list) => is_approved(list, &self.name),
      None => self.is_smc_approved.unwrap_or(false),
    }
  }
}

/// One class's consent setup. At most one exists per school/year/section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
  pub class_id:           ClassId,
  pub school_id:          Uuid,
  pub year:               u8,
  pub section:            u8,
  pub teacher_name:       String,
  pub pin:                String,
  pub is_active:          bool,
  /// Every candidate the teacher has uploaded.
  #[serde(default)]
  pub registry_softwares: Vec<SoftwareItem>,
  /// The subset presented to guardians by configurations that predate the
  /// registry.
  #[serde(default)]
  pub selected_softwares: Vec<SoftwareItem>,
  #[serde(default)]
  pub teacher_note:       Option<String>,
}

impl ClassConfig {
  /// A freshly registered, active class with no software.
  pub fn new(
    school_id: Uuid,
    year: u8,
    section: u8,
    teacher_name: impl Into<String>,
    pin: impl Into<String>,
  ) -> Self {
    Self {
      class_id: class_id(school_id, year, section),
      school_id,
      year,
      section,
      teacher_name: teacher_name.into(),
      pin: pin.into(),
      is_active: true,
      registry_softwares: Vec::new(),
      selected_softwares: Vec::new(),
      teacher_note: None,
    }
  }

  /// The canonical list shown to guardians and used for aggregation: the
  /// registry when it has entries, otherwise the selection.
  pub fn active_softwares(&self) -> &[SoftwareItem] {
    if self.registry_softwares.is_empty() {
      &self.selected_softwares
    } else {
      &self.registry_softwares
    }
  }

  /// Append `items` to the registry and select the whole registry, as a
  /// freshly imported list is immediately offered to guardians.
  pub fn append_softwares(
    &mut self,
    items: Vec<SoftwareItem>,
    approved: &[ApprovedSoftware],
  ) {
    self.registry_softwares.extend(items);
    self.selected_softwares = self.registry_softwares.clone();
    self.is_active = true;
    self.refresh_approval_cache(approved);
  }

  /// Replace the selection with the registry entries whose ids are listed,
  /// keeping registry order.
  pub fn select(&mut self, ids: &[String], approved: &[ApprovedSoftware]) {
    self.selected_softwares = self
      .registry_softwares
      .iter()
      .filter(|sw| ids.contains(&sw.id))
      .cloned()
      .collect();
    self.refresh_approval_cache(approved);
  }

  /// Remove one item from both lists. Returns `false` if it was in neither.
  pub fn remove_software(&mut self, software_id: &str) -> bool {
    let before = self.registry_softwares.len() + self.selected_softwares.len();
    self.registry_softwares.retain(|sw| sw.id != software_id);
    self.selected_softwares.retain(|sw| sw.id != software_id);
    before != self.registry_softwares.len() + self.selected_softwares.len()
  }

  /// Rewrite `is_smc_approved` on every embedded item from the live list.
  pub fn refresh_approval_cache(&mut self, approved: &[ApprovedSoftware]) {
    for sw in self
      .registry_softwares
      .iter_mut()
      .chain(self.selected_softwares.iter_mut())
    {
      sw.is_smc_approved = Some(is_approved(approved, &sw.name));
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn approved(names: &[&str]) -> Vec<ApprovedSoftware> {
    names
      .iter()
      .map(|n| ApprovedSoftware {
        approval_id:   Uuid::new_v4(),
        school_id:     Uuid::nil(),
        software_name: (*n).to_owned(),
        privacy_url:   String::new(),
        document_url:  None,
        approved_at:   Utc::now(),
      })
      .collect()
  }

  #[test]
  fn registry_is_authoritative_when_present() {
    let mut class = ClassConfig::new(Uuid::nil(), 1, 1, "Kim", "1234");
    class.selected_softwares = vec![SoftwareItem::new("Legacy")];
    assert_eq!(class.active_softwares()[0].name, "Legacy");

    class.registry_softwares = vec![SoftwareItem::new("Padlet"), SoftwareItem::new("Zoom")];
    let names: Vec<_> = class.active_softwares().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Padlet", "Zoom"]);
  }

  #[test]
  fn empty_class_has_no_active_softwares() {
    let class = ClassConfig::new(Uuid::nil(), 1, 1, "Kim", "1234");
    assert!(class.active_softwares().is_empty());
  }

  #[test]
  fn append_selects_everything_and_caches_approval() {
    let list = approved(&["Classting"]);
    let mut class = ClassConfig::new(Uuid::nil(), 2, 3, "Lee", "0000");
    class.is_active = false;
    class.append_softwares(vec![SoftwareItem::new("classting"), SoftwareItem::new("Padlet")], &list);

    assert!(class.is_active);
    assert_eq!(class.selected_softwares.len(), 2);
    assert_eq!(class.registry_softwares[0].is_smc_approved, Some(true));
    assert_eq!(class.registry_softwares[1].is_smc_approved, Some(false));
  }

  #[test]
  fn live_list_beats_stale_cache() {
    let mut sw = SoftwareItem::new("Padlet");
    sw.is_smc_approved = Some(true);
    assert!(!sw.approved(Some(&[])));
    assert!(sw.approved(None));
  }

  #[test]
  fn select_keeps_registry_order() {
    let mut class = ClassConfig::new(Uuid::nil(), 1, 1, "Kim", "1234");
    class.registry_softwares = vec![SoftwareItem::new("A"), SoftwareItem::new("B"), SoftwareItem::new("C")];
    let ids = vec![class.registry_softwares[2].id.clone(), class.registry_softwares[0].id.clone()];
    class.select(&ids, &[]);
    let names: Vec<_> = class.selected_softwares.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["A", "C"]);
  }

  #[test]
  fn remove_software_from_both_lists() {
    let mut class = ClassConfig::new(Uuid::nil(), 1, 1, "Kim", "1234");
    class.append_softwares(vec![SoftwareItem::new("A"), SoftwareItem::new("B")], &[]);
    let id = class.registry_softwares[0].id.clone();
    assert!(class.remove_software(&id));
    assert_eq!(class.registry_softwares.len(), 1);
    assert_eq!(class.selected_softwares.len(), 1);
    assert!(!class.remove_software(&id));
  }
}
