//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Embedded collections
//! (software lists, per-software responses) are stored as compact JSON.
//! UUIDs are stored as hyphenated lowercase strings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use consent_core::{
  approval::ApprovedSoftware,
  class::{ClassConfig, SoftwareItem},
  consent::{ConsentRecord, StoredResponse},
  identity::{ClassId, ConsentId},
  school::School,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Software lists ──────────────────────────────────────────────────────────

pub fn encode_softwares(items: &[SoftwareItem]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_softwares(s: &str) -> Result<Vec<SoftwareItem>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Responses ───────────────────────────────────────────────────────────────

pub fn encode_responses(r: &BTreeMap<String, StoredResponse>) -> Result<String> {
  Ok(serde_json::to_string(r)?)
}

pub fn decode_responses(s: &str) -> Result<BTreeMap<String, StoredResponse>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Integers ────────────────────────────────────────────────────────────────

fn narrow<T: TryFrom<i64>>(column: &'static str, value: i64) -> Result<T> {
  T::try_from(value).map_err(|_| Error::OutOfRange { column, value })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `schools` row.
pub struct RawSchool {
  pub school_id:           String,
  pub name:                String,
  pub admin_password_hash: String,
  pub access_code:         String,
  pub created_at:          String,
}

impl RawSchool {
  pub const COLUMNS: &'static str =
    "school_id, name, admin_password_hash, access_code, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      school_id:           row.get(0)?,
      name:                row.get(1)?,
      admin_password_hash: row.get(2)?,
      access_code:         row.get(3)?,
      created_at:          row.get(4)?,
    })
  }

  pub fn into_school(self) -> Result<School> {
    Ok(School {
      school_id:           decode_uuid(&self.school_id)?,
      name:                self.name,
      admin_password_hash: self.admin_password_hash,
      access_code:         self.access_code,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `approvals` row.
pub struct RawApproval {
  pub approval_id:   String,
  pub school_id:     String,
  pub software_name: String,
  pub privacy_url:   String,
  pub document_url:  Option<String>,
  pub approved_at:   String,
}

impl RawApproval {
  pub const COLUMNS: &'static str =
    "approval_id, school_id, software_name, privacy_url, document_url, approved_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      approval_id:   row.get(0)?,
      school_id:     row.get(1)?,
      software_name: row.get(2)?,
      privacy_url:   row.get(3)?,
      document_url:  row.get(4)?,
      approved_at:   row.get(5)?,
    })
  }

  pub fn into_approval(self) -> Result<ApprovedSoftware> {
    Ok(ApprovedSoftware {
      approval_id:   decode_uuid(&self.approval_id)?,
      school_id:     decode_uuid(&self.school_id)?,
      software_name: self.software_name,
      privacy_url:   self.privacy_url,
      document_url:  self.document_url,
      approved_at:   decode_dt(&self.approved_at)?,
    })
  }
}

/// Raw values read directly from a `classes` row.
pub struct RawClass {
  pub class_id:      String,
  pub school_id:     String,
  pub year:          i64,
  pub section:       i64,
  pub teacher_name:  String,
  pub pin:           String,
  pub is_active:     bool,
  pub registry_json: String,
  pub selected_json: String,
  pub teacher_note:  Option<String>,
}

impl RawClass {
  pub const COLUMNS: &'static str = "class_id, school_id, year, section, \
     teacher_name, pin, is_active, registry_json, selected_json, teacher_note";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      class_id:      row.get(0)?,
      school_id:     row.get(1)?,
      year:          row.get(2)?,
      section:       row.get(3)?,
      teacher_name:  row.get(4)?,
      pin:           row.get(5)?,
      is_active:     row.get(6)?,
      registry_json: row.get(7)?,
      selected_json: row.get(8)?,
      teacher_note:  row.get(9)?,
    })
  }

  pub fn into_class(self) -> Result<ClassConfig> {
    Ok(ClassConfig {
      class_id:           ClassId::from_raw(self.class_id),
      school_id:          decode_uuid(&self.school_id)?,
      year:               narrow("year", self.year)?,
      section:            narrow("section", self.section)?,
      teacher_name:       self.teacher_name,
      pin:                self.pin,
      is_active:          self.is_active,
      registry_softwares: decode_softwares(&self.registry_json)?,
      selected_softwares: decode_softwares(&self.selected_json)?,
      teacher_note:       self.teacher_note,
    })
  }
}

/// Raw values read directly from a `consents` row.
pub struct RawConsent {
  pub consent_id:        String,
  pub school_id:         String,
  pub class_id:          String,
  pub student_number:    i64,
  pub student_name:      String,
  pub parent_name:       String,
  pub pin:               String,
  pub responses_json:    String,
  pub confirmation_code: Option<String>,
  pub updated_at:        String,
}

impl RawConsent {
  pub const COLUMNS: &'static str = "consent_id, school_id, class_id, \
     student_number, student_name, parent_name, pin, responses_json, \
     confirmation_code, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      consent_id:        row.get(0)?,
      school_id:         row.get(1)?,
      class_id:          row.get(2)?,
      student_number:    row.get(3)?,
      student_name:      row.get(4)?,
      parent_name:       row.get(5)?,
      pin:               row.get(6)?,
      responses_json:    row.get(7)?,
      confirmation_code: row.get(8)?,
      updated_at:        row.get(9)?,
    })
  }

  pub fn into_consent(self) -> Result<ConsentRecord> {
    Ok(ConsentRecord {
      consent_id:        ConsentId::from_raw(self.consent_id),
      school_id:         decode_uuid(&self.school_id)?,
      class_id:          ClassId::from_raw(self.class_id),
      student_number:    narrow("student_number", self.student_number)?,
      student_name:      self.student_name,
      parent_name:       self.parent_name,
      pin:               self.pin,
      responses:         decode_responses(&self.responses_json)?,
      confirmation_code: self.confirmation_code,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}
