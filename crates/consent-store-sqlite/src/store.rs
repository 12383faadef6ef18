//! [`SqliteStore`] — the SQLite implementation of [`ConsentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use consent_core::{
  approval::{ApprovedSoftware, NewApproval},
  class::ClassConfig,
  consent::{ConsentRecord, NewConsent},
  identity::{ClassId, ConsentId, consent_id},
  school::{NewSchool, School},
  store::ConsentStore,
};

use crate::{
  Result,
  encode::{
    RawApproval, RawClass, RawConsent, RawSchool, encode_dt, encode_responses,
    encode_softwares, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A consent store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn approval_row(school_id: Uuid, input: NewApproval) -> ApprovedSoftware {
  ApprovedSoftware {
    approval_id: Uuid::new_v4(),
    school_id,
    software_name: input.software_name,
    privacy_url: input.privacy_url,
    document_url: input.document_url,
    approved_at: Utc::now(),
  }
}

fn insert_approval(
  conn: &rusqlite::Connection,
  a: &ApprovedSoftware,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO approvals (
       approval_id, school_id, software_name, privacy_url, document_url,
       approved_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(a.approval_id),
      encode_uuid(a.school_id),
      a.software_name,
      a.privacy_url,
      a.document_url,
      encode_dt(a.approved_at),
    ],
  )?;
  Ok(())
}

// ─── ConsentStore impl ───────────────────────────────────────────────────────

impl ConsentStore for SqliteStore {
  type Error = crate::Error;

  // ── Schools ───────────────────────────────────────────────────────────────

  async fn create_school(&self, input: NewSchool) -> Result<School> {
    let school = School {
      school_id:           Uuid::new_v4(),
      name:                input.name,
      admin_password_hash: input.admin_password_hash,
      access_code:         input.access_code,
      created_at:          Utc::now(),
    };

    let id_str = encode_uuid(school.school_id);
    let name = school.name.clone();
    let hash = school.admin_password_hash.clone();
    let code = school.access_code.clone();
    let at_str = encode_dt(school.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO schools (
             school_id, name, admin_password_hash, access_code, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, hash, code, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(school_id = %school.school_id, "school created");
    Ok(school)
  }

  async fn get_school(&self, id: Uuid) -> Result<Option<School>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {} FROM schools WHERE school_id = ?1", RawSchool::COLUMNS);
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawSchool::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSchool::into_school).transpose()
  }

  async fn list_schools(&self) -> Result<Vec<School>> {
    let raws = self
      .conn
      .call(|conn| {
        let sql =
          format!("SELECT {} FROM schools ORDER BY name, rowid", RawSchool::COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawSchool::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSchool::into_school).collect()
  }

  async fn set_admin_password(&self, id: Uuid, password_hash: String) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE schools SET admin_password_hash = ?2 WHERE school_id = ?1",
          rusqlite::params![id_str, password_hash],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Approvals ─────────────────────────────────────────────────────────────

  async fn add_approval(
    &self,
    school_id: Uuid,
    input: NewApproval,
  ) -> Result<ApprovedSoftware> {
    let approval = approval_row(school_id, input);
    let row = approval.clone();
    self
      .conn
      .call(move |conn| {
        insert_approval(conn, &row)?;
        Ok(())
      })
      .await?;
    Ok(approval)
  }

  async fn add_approvals(
    &self,
    school_id: Uuid,
    inputs: Vec<NewApproval>,
  ) -> Result<Vec<ApprovedSoftware>> {
    let approvals: Vec<ApprovedSoftware> = inputs
      .into_iter()
      .map(|input| approval_row(school_id, input))
      .collect();
    let rows = approvals.clone();

    // Either every row lands or none does.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for a in &rows {
          insert_approval(&tx, a)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(%school_id, count = approvals.len(), "approvals added");
    Ok(approvals)
  }

  async fn list_approvals(&self, school_id: Uuid) -> Result<Vec<ApprovedSoftware>> {
    let id_str = encode_uuid(school_id);
    let raws = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM approvals WHERE school_id = ?1 ORDER BY rowid",
          RawApproval::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawApproval::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawApproval::into_approval).collect()
  }

  async fn delete_approval(&self, school_id: Uuid, approval_id: Uuid) -> Result<bool> {
    let school_str = encode_uuid(school_id);
    let approval_str = encode_uuid(approval_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM approvals WHERE approval_id = ?1 AND school_id = ?2",
          rusqlite::params![approval_str, school_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn clear_approvals(&self, school_id: Uuid) -> Result<usize> {
    let id_str = encode_uuid(school_id);
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "DELETE FROM approvals WHERE school_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(n)
      })
      .await?;
    tracing::debug!(%school_id, removed, "approvals cleared");
    Ok(removed)
  }

  // ── Classes ───────────────────────────────────────────────────────────────

  async fn get_class(&self, id: ClassId) -> Result<Option<ClassConfig>> {
    let raw = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {} FROM classes WHERE class_id = ?1", RawClass::COLUMNS);
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id.as_str()], RawClass::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawClass::into_class).transpose()
  }

  async fn list_classes(&self, school_id: Uuid) -> Result<Vec<ClassConfig>> {
    let id_str = encode_uuid(school_id);
    let raws = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM classes WHERE school_id = ?1 ORDER BY year, section",
          RawClass::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawClass::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawClass::into_class).collect()
  }

  async fn put_class(&self, class: ClassConfig) -> Result<()> {
    let registry = encode_softwares(&class.registry_softwares)?;
    let selected = encode_softwares(&class.selected_softwares)?;
    let school_str = encode_uuid(class.school_id);
    let class_id = class.class_id.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO classes (
             class_id, school_id, year, section, teacher_name, pin,
             is_active, registry_json, selected_json, teacher_note
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT(class_id) DO UPDATE SET
             school_id     = excluded.school_id,
             year          = excluded.year,
             section       = excluded.section,
             teacher_name  = excluded.teacher_name,
             pin           = excluded.pin,
             is_active     = excluded.is_active,
             registry_json = excluded.registry_json,
             selected_json = excluded.selected_json,
             teacher_note  = excluded.teacher_note",
          rusqlite::params![
            class.class_id.as_str(),
            school_str,
            class.year,
            class.section,
            class.teacher_name,
            class.pin,
            class.is_active,
            registry,
            selected,
            class.teacher_note,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(%class_id, "class saved");
    Ok(())
  }

  async fn delete_class(&self, id: ClassId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM classes WHERE class_id = ?1",
          rusqlite::params![id.as_str()],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Consents ──────────────────────────────────────────────────────────────

  async fn get_consent(&self, id: ConsentId) -> Result<Option<ConsentRecord>> {
    let raw = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {} FROM consents WHERE consent_id = ?1", RawConsent::COLUMNS);
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id.as_str()], RawConsent::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawConsent::into_consent).transpose()
  }

  async fn list_consents(&self, class_id: ClassId) -> Result<Vec<ConsentRecord>> {
    let raws = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM consents WHERE class_id = ?1 ORDER BY student_number",
          RawConsent::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![class_id.as_str()], RawConsent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawConsent::into_consent).collect()
  }

  async fn put_consent(&self, input: NewConsent) -> Result<ConsentRecord> {
    let record = ConsentRecord {
      consent_id:        consent_id(&input.class_id, input.student_number),
      school_id:         input.school_id,
      class_id:          input.class_id,
      student_number:    input.student_number,
      student_name:      input.student_name,
      parent_name:       input.parent_name,
      pin:               input.pin,
      responses:         input.responses,
      confirmation_code: input.confirmation_code,
      updated_at:        Utc::now(),
    };

    let consent_str = record.consent_id.as_str().to_owned();
    let school_str = encode_uuid(record.school_id);
    let class_str = record.class_id.as_str().to_owned();
    let number = record.student_number;
    let student = record.student_name.clone();
    let parent = record.parent_name.clone();
    let pin = record.pin.clone();
    let responses = encode_responses(&record.responses)?;
    let code = record.confirmation_code.clone();
    let at_str = encode_dt(record.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO consents (
             consent_id, school_id, class_id, student_number, student_name,
             parent_name, pin, responses_json, confirmation_code, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT(consent_id) DO UPDATE SET
             school_id         = excluded.school_id,
             class_id          = excluded.class_id,
             student_number    = excluded.student_number,
             student_name      = excluded.student_name,
             parent_name       = excluded.parent_name,
             pin               = excluded.pin,
             responses_json    = excluded.responses_json,
             confirmation_code = excluded.confirmation_code,
             updated_at        = excluded.updated_at",
          rusqlite::params![
            consent_str, school_str, class_str, number, student, parent, pin,
            responses, code, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(consent_id = %record.consent_id, "consent saved");
    Ok(record)
  }

  async fn delete_consent(&self, id: ConsentId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM consents WHERE consent_id = ?1",
          rusqlite::params![id.as_str()],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }
}
