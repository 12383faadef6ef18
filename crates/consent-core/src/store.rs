//! The `ConsentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `consent-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.
//!
//! Per collection the store offers get-by-id, query-by-equality, upsert and
//! delete-by-id. Two operations are batches that must commit atomically:
//! [`ConsentStore::add_approvals`] and [`ConsentStore::clear_approvals`].
//! Every other write is an independent last-writer-wins upsert.

use std::future::Future;

use uuid::Uuid;

use crate::{
  approval::{ApprovedSoftware, NewApproval},
  class::ClassConfig,
  consent::{ConsentRecord, NewConsent},
  identity::{ClassId, ConsentId},
  school::{NewSchool, School},
};

/// Abstraction over a consent store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ConsentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Schools ───────────────────────────────────────────────────────────

  /// Persist a new school; the store assigns its id and creation time.
  fn create_school(
    &self,
    input: NewSchool,
  ) -> impl Future<Output = Result<School, Self::Error>> + Send + '_;

  fn get_school(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<School>, Self::Error>> + Send + '_;

  /// All schools, ordered by name.
  fn list_schools(
    &self,
  ) -> impl Future<Output = Result<Vec<School>, Self::Error>> + Send + '_;

  /// Replace the admin password hash. Returns `false` if the school does not
  /// exist.
  fn set_admin_password(
    &self,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Approvals ─────────────────────────────────────────────────────────

  /// Record one approval. The approval time is set by the store.
  fn add_approval(
    &self,
    school_id: Uuid,
    input: NewApproval,
  ) -> impl Future<Output = Result<ApprovedSoftware, Self::Error>> + Send + '_;

  /// Record several approvals in one transaction: all or none.
  fn add_approvals(
    &self,
    school_id: Uuid,
    inputs: Vec<NewApproval>,
  ) -> impl Future<Output = Result<Vec<ApprovedSoftware>, Self::Error>> + Send + '_;

  /// Approvals for a school, oldest first.
  fn list_approvals(
    &self,
    school_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ApprovedSoftware>, Self::Error>> + Send + '_;

  /// Delete one approval belonging to `school_id`. Returns `false` if no such
  /// approval exists for that school.
  fn delete_approval(
    &self,
    school_id: Uuid,
    approval_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete every approval of a school in one transaction. Returns the number
  /// removed.
  fn clear_approvals(
    &self,
    school_id: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Classes ───────────────────────────────────────────────────────────

  fn get_class(
    &self,
    id: ClassId,
  ) -> impl Future<Output = Result<Option<ClassConfig>, Self::Error>> + Send + '_;

  fn list_classes(
    &self,
    school_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ClassConfig>, Self::Error>> + Send + '_;

  /// Insert or wholly replace the configuration stored under
  /// `class.class_id`.
  fn put_class(
    &self,
    class: ClassConfig,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns `false` if the class did not exist. Consent records are left in
  /// place.
  fn delete_class(
    &self,
    id: ClassId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Consents ──────────────────────────────────────────────────────────

  fn get_consent(
    &self,
    id: ConsentId,
  ) -> impl Future<Output = Result<Option<ConsentRecord>, Self::Error>> + Send + '_;

  fn list_consents(
    &self,
    class_id: ClassId,
  ) -> impl Future<Output = Result<Vec<ConsentRecord>, Self::Error>> + Send + '_;

  /// Upsert under the id derived from `input.class_id` and
  /// `input.student_number`, replacing any previous record entirely.
  fn put_consent(
    &self,
    input: NewConsent,
  ) -> impl Future<Output = Result<ConsentRecord, Self::Error>> + Send + '_;

  fn delete_consent(
    &self,
    id: ConsentId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
