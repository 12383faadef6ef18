//! Consent aggregation for teacher and admin dashboards.
//!
//! Every count is derived on read from the class's active software list and
//! its consent records; nothing here is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  approval::{ApprovedSoftware, is_approved},
  class::{ClassConfig, SoftwareItem},
  consent::{ConsentRecord, ConsentResponse},
  identity::{ClassId, ConsentId},
  mask::mask_name,
};

/// Consent slots counted per software item for a student: collection/use and
/// third party. The legacy basic agreement is informational only.
pub const SLOTS_PER_SOFTWARE: usize = 2;

/// Disagreeing students listed by name on a software row; the rest are
/// only counted.
pub const DISAGREE_PREVIEW: usize = 3;

// ─── Buckets ─────────────────────────────────────────────────────────────────

/// Where one response lands in a per-software summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
  /// All three axes answered yes.
  FullyAgreed,
  /// At least one axis answered no. Wins over unanswered axes.
  Disagreed,
  Pending,
}

impl Bucket {
  pub fn of(r: &ConsentResponse) -> Self {
    if r.fully_agreed() {
      Self::FullyAgreed
    } else if r.any_disagreed() {
      Self::Disagreed
    } else {
      Self::Pending
    }
  }
}

// ─── Per software ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareTally {
  pub software_id:          String,
  pub name:                 String,
  pub approved:             bool,
  pub fully_agreed:         usize,
  pub disagreed:            usize,
  pub pending:              usize,
  /// Masked names of the first [`DISAGREE_PREVIEW`] disagreeing students, in
  /// student-number order.
  pub disagreeing_students: Vec<String>,
}

/// Partition `consents` (assumed sorted by student number) for one item.
pub fn tally_software(
  software: &SoftwareItem,
  consents: &[ConsentRecord],
  approved: &[ApprovedSoftware],
) -> SoftwareTally {
  let mut tally = SoftwareTally {
    software_id:          software.id.clone(),
    name:                 software.name.clone(),
    approved:             is_approved(approved, &software.name),
    fully_agreed:         0,
    disagreed:            0,
    pending:              0,
    disagreeing_students: Vec::new(),
  };

  for record in consents {
    match Bucket::of(&record.response(&software.id)) {
      Bucket::FullyAgreed => tally.fully_agreed += 1,
      Bucket::Disagreed => {
        tally.disagreed += 1;
        if tally.disagreeing_students.len() < DISAGREE_PREVIEW {
          tally.disagreeing_students.push(mask_name(&record.student_name));
        }
      }
      Bucket::Pending => tally.pending += 1,
    }
  }
  tally
}

// ─── Per student ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResponse {
  pub software_id: String,
  pub name:        String,
  pub response:    ConsentResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentTally {
  pub consent_id:        ConsentId,
  pub student_number:    u32,
  pub student_name:      String,
  pub parent_name:       String,
  pub confirmation_code: Option<String>,
  pub agreed_slots:      usize,
  pub total_slots:       usize,
  pub updated_at:        DateTime<Utc>,
  pub items:             Vec<ItemResponse>,
}

/// Count `true` answers on the current axes over `softwares`. The denominator
/// is always `softwares.len() * SLOTS_PER_SOFTWARE`, whether or not the record
/// has an entry for each item.
pub fn tally_student(record: &ConsentRecord, softwares: &[SoftwareItem]) -> StudentTally {
  let items: Vec<ItemResponse> = softwares
    .iter()
    .map(|sw| ItemResponse {
      software_id: sw.id.clone(),
      name:        sw.name.clone(),
      response:    record.response(&sw.id),
    })
    .collect();

  StudentTally {
    consent_id:        record.consent_id.clone(),
    student_number:    record.student_number,
    student_name:      mask_name(&record.student_name),
    parent_name:       mask_name(&record.parent_name),
    confirmation_code: record.confirmation_code.clone(),
    agreed_slots:      items.iter().map(|i| i.response.current_axes_agreed()).sum(),
    total_slots:       softwares.len() * SLOTS_PER_SOFTWARE,
    updated_at:        record.updated_at,
    items,
  }
}

// ─── Per class ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReport {
  pub class_id:  ClassId,
  pub year:      u8,
  pub section:   u8,
  pub softwares: Vec<SoftwareTally>,
  pub students:  Vec<StudentTally>,
}

/// Build the full dashboard for `class`. Consents are ordered by student
/// number before counting.
pub fn class_report(
  class: &ClassConfig,
  mut consents: Vec<ConsentRecord>,
  approved: &[ApprovedSoftware],
) -> ClassReport {
  consents.sort_by_key(|c| c.student_number);
  let softwares = class.active_softwares();

  ClassReport {
    class_id:  class.class_id.clone(),
    year:      class.year,
    section:   class.section,
    softwares: softwares
      .iter()
      .map(|sw| tally_software(sw, &consents, approved))
      .collect(),
    students:  consents
      .iter()
      .map(|c| tally_student(c, softwares))
      .collect(),
  }
}

/// A row of the admin class overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassOverview {
  pub class_id:       ClassId,
  pub year:           u8,
  pub section:        u8,
  pub teacher_name:   String,
  pub is_active:      bool,
  pub software_count: usize,
  pub pending_count:  usize,
}

/// Overview rows ordered by year, then section. Teacher names are masked.
pub fn class_overview(
  classes: &[ClassConfig],
  approved: &[ApprovedSoftware],
) -> Vec<ClassOverview> {
  let mut rows: Vec<ClassOverview> = classes
    .iter()
    .map(|c| {
      let softwares = c.active_softwares();
      ClassOverview {
        class_id:       c.class_id.clone(),
        year:           c.year,
        section:        c.section,
        teacher_name:   mask_name(&c.teacher_name),
        is_active:      c.is_active,
        software_count: softwares.len(),
        pending_count:  softwares
          .iter()
          .filter(|sw| !is_approved(approved, &sw.name))
          .count(),
      }
    })
    .collect();
  rows.sort_by_key(|r| (r.year, r.section));
  rows
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use serde_json::json;
  use uuid::Uuid;

  use super::*;
  use crate::{consent::StoredResponse, identity::consent_id};

  fn resp(agree: Option<bool>, cu: Option<bool>, tp: Option<bool>) -> ConsentResponse {
    ConsentResponse { agree, collection_use: cu, third_party: tp }
  }

  fn record(class: &ClassConfig, number: u32, name: &str, responses: &[(&str, StoredResponse)]) -> ConsentRecord {
    ConsentRecord {
      consent_id:        consent_id(&class.class_id, number),
      school_id:         class.school_id,
      class_id:          class.class_id.clone(),
      student_number:    number,
      student_name:      name.to_owned(),
      parent_name:       "Parent".to_owned(),
      pin:               "1234".to_owned(),
      responses:         responses
        .iter()
        .map(|(k, v)| ((*k).to_owned(), *v))
        .collect::<BTreeMap<_, _>>(),
      confirmation_code: Some("ABC".to_owned()),
      updated_at:        Utc::now(),
    }
  }

  fn class_with(names: &[&str]) -> ClassConfig {
    let mut class = ClassConfig::new(Uuid::nil(), 1, 1, "Kim", "1234");
    class.registry_softwares = names
      .iter()
      .enumerate()
      .map(|(i, n)| SoftwareItem { id: format!("sw{i}"), ..SoftwareItem::new(*n) })
      .collect();
    class
  }

  #[test]
  fn disagreement_beats_pending() {
    assert_eq!(Bucket::of(&resp(None, Some(false), None)), Bucket::Disagreed);
    assert_eq!(Bucket::of(&resp(Some(true), Some(true), Some(true))), Bucket::FullyAgreed);
    assert_eq!(Bucket::of(&resp(Some(true), Some(true), None)), Bucket::Pending);
    assert_eq!(Bucket::of(&ConsentResponse::UNANSWERED), Bucket::Pending);
  }

  #[test]
  fn buckets_partition_every_record() {
    let class = class_with(&["Padlet"]);
    let shapes = [
      StoredResponse::LegacyBoolean(None),
      StoredResponse::LegacyBoolean(Some(true)),
      StoredResponse::LegacyBoolean(Some(false)),
      resp(Some(true), Some(true), Some(true)).into(),
      resp(Some(false), None, Some(true)).into(),
      resp(None, None, None).into(),
      resp(Some(true), Some(false), Some(true)).into(),
    ];
    let mut consents: Vec<_> = shapes
      .iter()
      .enumerate()
      .map(|(i, s)| record(&class, i as u32 + 1, "학생이름", &[("sw0", *s)]))
      .collect();
    consents.push(record(&class, 99, "No Entry", &[]));

    let t = tally_software(&class.registry_softwares[0], &consents, &[]);
    assert_eq!(t.fully_agreed + t.disagreed + t.pending, consents.len());
    assert_eq!(t.fully_agreed, 1);
    assert_eq!(t.disagreed, 3);
    assert_eq!(t.pending, 4);
    assert_eq!(t.disagreeing_students.len(), DISAGREE_PREVIEW);
    assert_eq!(t.disagreeing_students[0], "학**름");
  }

  #[test]
  fn student_denominator_is_two_per_software() {
    let class = class_with(&["A", "B", "C"]);
    let full = record(&class, 1, "Kim", &[
      ("sw0", resp(Some(true), Some(true), Some(true)).into()),
      ("sw1", resp(Some(false), Some(true), Some(false)).into()),
      ("sw2", StoredResponse::LegacyBoolean(Some(true))),
    ]);
    let t = tally_student(&full, class.active_softwares());
    assert_eq!(t.total_slots, 6);
    assert_eq!(t.agreed_slots, 3);

    let empty = record(&class, 2, "Lee", &[]);
    let t = tally_student(&empty, class.active_softwares());
    assert_eq!(t.total_slots, 6);
    assert_eq!(t.agreed_slots, 0);
  }

  #[test]
  fn report_orders_students_and_masks_names() {
    let class = class_with(&["A"]);
    let consents = vec![
      record(&class, 12, "홍길동", &[]),
      record(&class, 3, "Jo", &[]),
    ];
    let report = class_report(&class, consents, &[]);
    let numbers: Vec<_> = report.students.iter().map(|s| s.student_number).collect();
    assert_eq!(numbers, [3, 12]);
    assert_eq!(report.students[0].student_name, "J*");
    assert_eq!(report.students[1].student_name, "홍*동");
    assert_eq!(report.softwares[0].pending, 2);
  }

  #[test]
  fn legacy_record_reads_through_normalizer() {
    let class = class_with(&["A"]);
    let raw: BTreeMap<String, StoredResponse> =
      serde_json::from_value(json!({ "sw0": true })).unwrap();
    let mut rec = record(&class, 1, "Kim", &[]);
    rec.responses = raw;
    let t = tally_student(&rec, class.active_softwares());
    assert_eq!(t.items[0].response, resp(Some(true), None, None));
    assert_eq!(t.agreed_slots, 0);
  }

  #[test]
  fn overview_counts_pending_and_sorts() {
    let mut a = class_with(&["Padlet", "Zoom"]);
    a.year = 2;
    let mut b = class_with(&["Zoom"]);
    b.teacher_name = "김선생".into();
    let approved = vec![ApprovedSoftware {
      approval_id:   Uuid::new_v4(),
      school_id:     Uuid::nil(),
      software_name: "zoom".into(),
      privacy_url:   String::new(),
      document_url:  None,
      approved_at:   Utc::now(),
    }];
    let rows = class_overview(&[a, b], &approved);
    assert_eq!(rows[0].year, 1);
    assert_eq!(rows[0].pending_count, 0);
    assert_eq!(rows[1].pending_count, 1);
    assert_eq!(rows[1].software_count, 2);
    assert_eq!(rows[0].teacher_name, "김*생");
    assert_eq!(rows[1].teacher_name, "K*m");
  }
}
