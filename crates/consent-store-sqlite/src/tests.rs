//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeMap;

use consent_core::{
  approval::NewApproval,
  class::{ClassConfig, SoftwareItem},
  consent::{ConsentResponse, NewConsent, StoredResponse},
  identity::{ClassId, ConsentId, class_id, consent_id},
  school::{NewSchool, School},
  store::ConsentStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn school(s: &SqliteStore, name: &str) -> School {
  s.create_school(NewSchool {
    name:                name.into(),
    admin_password_hash: "hash".into(),
    access_code:         "ABC234".into(),
  })
  .await
  .unwrap()
}

fn new_consent(class: &ClassId, school_id: Uuid, n: u32) -> NewConsent {
  NewConsent {
    school_id,
    class_id: class.clone(),
    student_number: n,
    student_name: format!("Student {n}"),
    parent_name: format!("Parent {n}"),
    pin: "1234".into(),
    responses: BTreeMap::new(),
    confirmation_code: None,
  }
}

// ─── Schools ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_school() {
  let s = store().await;
  let created = school(&s, "Hanbit Elementary").await;

  let fetched = s.get_school(created.school_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Hanbit Elementary");
  assert_eq!(fetched.access_code, "ABC234");
  assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn get_school_missing_returns_none() {
  let s = store().await;
  assert!(s.get_school(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn schools_list_by_name() {
  let s = store().await;
  school(&s, "Seoul").await;
  school(&s, "Busan").await;

  let names: Vec<_> = s
    .list_schools()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, ["Busan", "Seoul"]);
}

#[tokio::test]
async fn admin_password_update() {
  let s = store().await;
  let sc = school(&s, "A").await;
  assert!(s.set_admin_password(sc.school_id, "new".into()).await.unwrap());
  assert!(!s.set_admin_password(Uuid::new_v4(), "new".into()).await.unwrap());

  let fetched = s.get_school(sc.school_id).await.unwrap().unwrap();
  assert_eq!(fetched.admin_password_hash, "new");
}

// ─── Approvals ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn approvals_are_scoped_to_school() {
  let s = store().await;
  let a = school(&s, "A").await;
  let b = school(&s, "B").await;

  s.add_approval(a.school_id, NewApproval::named("Classting"))
    .await
    .unwrap();
  s.add_approval(b.school_id, NewApproval::named("Padlet"))
    .await
    .unwrap();

  let listed = s.list_approvals(a.school_id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].software_name, "Classting");
  assert_eq!(listed[0].school_id, a.school_id);
}

#[tokio::test]
async fn batch_add_preserves_order() {
  let s = store().await;
  let sc = school(&s, "A").await;

  let added = s
    .add_approvals(
      sc.school_id,
      vec![NewApproval::named("One"), NewApproval::named("Two")],
    )
    .await
    .unwrap();
  assert_eq!(added.len(), 2);

  let names: Vec<_> = s
    .list_approvals(sc.school_id)
    .await
    .unwrap()
    .into_iter()
    .map(|a| a.software_name)
    .collect();
  assert_eq!(names, ["One", "Two"]);
}

#[tokio::test]
async fn batch_add_is_atomic() {
  let s = store().await;
  // Unknown school violates the foreign key on the first row, so nothing of
  // the batch may remain.
  let err = s
    .add_approvals(
      Uuid::new_v4(),
      vec![NewApproval::named("One"), NewApproval::named("Two")],
    )
    .await;
  assert!(err.is_err());

  let sc = school(&s, "A").await;
  assert!(s.list_approvals(sc.school_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_one_and_clear_all() {
  let s = store().await;
  let a = school(&s, "A").await;
  let b = school(&s, "B").await;

  let added = s
    .add_approvals(
      a.school_id,
      vec![
        NewApproval::named("One"),
        NewApproval::named("Two"),
        NewApproval::named("Three"),
      ],
    )
    .await
    .unwrap();
  s.add_approval(b.school_id, NewApproval::named("Other"))
    .await
    .unwrap();

  // Wrong school: no effect.
  assert!(
    !s.delete_approval(b.school_id, added[0].approval_id)
      .await
      .unwrap()
  );
  assert!(
    s.delete_approval(a.school_id, added[0].approval_id)
      .await
      .unwrap()
  );
  assert_eq!(s.list_approvals(a.school_id).await.unwrap().len(), 2);

  assert_eq!(s.clear_approvals(a.school_id).await.unwrap(), 2);
  assert!(s.list_approvals(a.school_id).await.unwrap().is_empty());
  assert_eq!(s.list_approvals(b.school_id).await.unwrap().len(), 1);
}

// ─── Classes ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_class_round_trips_embedded_softwares() {
  let s = store().await;
  let sc = school(&s, "A").await;

  let mut class = ClassConfig::new(sc.school_id, 3, 2, "Park", "1234");
  class.append_softwares(
    vec![SoftwareItem::new("Classting"), SoftwareItem::new("Padlet")],
    &[],
  );
  class.teacher_note = Some("Bring tablets".into());
  s.put_class(class.clone()).await.unwrap();

  let fetched = s.get_class(class.class_id.clone()).await.unwrap().unwrap();
  assert_eq!(fetched, class);
}

#[tokio::test]
async fn put_class_replaces_existing() {
  let s = store().await;
  let sc = school(&s, "A").await;

  let mut class = ClassConfig::new(sc.school_id, 1, 1, "Park", "1234");
  s.put_class(class.clone()).await.unwrap();
  class.teacher_name = "Choi".into();
  class.is_active = false;
  s.put_class(class.clone()).await.unwrap();

  let listed = s.list_classes(sc.school_id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].teacher_name, "Choi");
  assert!(!listed[0].is_active);
}

#[tokio::test]
async fn list_classes_orders_by_year_then_section() {
  let s = store().await;
  let sc = school(&s, "A").await;
  for (y, sec) in [(2, 1), (1, 3), (1, 1)] {
    s.put_class(ClassConfig::new(sc.school_id, y, sec, "T", "1111"))
      .await
      .unwrap();
  }
  let order: Vec<_> = s
    .list_classes(sc.school_id)
    .await
    .unwrap()
    .into_iter()
    .map(|c| (c.year, c.section))
    .collect();
  assert_eq!(order, [(1, 1), (1, 3), (2, 1)]);
}

#[tokio::test]
async fn delete_class_keeps_consents() {
  let s = store().await;
  let sc = school(&s, "A").await;
  let class = ClassConfig::new(sc.school_id, 1, 1, "Park", "1234");
  s.put_class(class.clone()).await.unwrap();
  s.put_consent(new_consent(&class.class_id, sc.school_id, 1))
    .await
    .unwrap();

  assert!(s.delete_class(class.class_id.clone()).await.unwrap());
  assert!(!s.delete_class(class.class_id.clone()).await.unwrap());
  assert!(s.get_class(class.class_id.clone()).await.unwrap().is_none());
  assert_eq!(s.list_consents(class.class_id).await.unwrap().len(), 1);
}

// ─── Consents ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_consent_derives_id() {
  let s = store().await;
  let sc = school(&s, "A").await;
  let cid = class_id(sc.school_id, 4, 2);

  let record = s.put_consent(new_consent(&cid, sc.school_id, 7)).await.unwrap();
  assert_eq!(record.consent_id, consent_id(&cid, 7));

  let fetched = s
    .get_consent(record.consent_id.clone())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.student_name, "Student 7");
}

#[tokio::test]
async fn repeated_submission_leaves_one_record() {
  let s = store().await;
  let sc = school(&s, "A").await;
  let cid = class_id(sc.school_id, 1, 1);

  let mut first = new_consent(&cid, sc.school_id, 3);
  first.responses.insert(
    "sw-a".into(),
    StoredResponse::from(ConsentResponse {
      agree:          None,
      collection_use: Some(false),
      third_party:    Some(false),
    }),
  );
  s.put_consent(first).await.unwrap();

  let mut second = new_consent(&cid, sc.school_id, 3);
  second.confirmation_code = Some("K7Q".into());
  second.responses.insert(
    "sw-a".into(),
    StoredResponse::from(ConsentResponse {
      agree:          None,
      collection_use: Some(true),
      third_party:    Some(true),
    }),
  );
  s.put_consent(second).await.unwrap();

  let all = s.list_consents(cid.clone()).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].response("sw-a").current_axes_agreed(), 2);
  assert_eq!(all[0].confirmation_code.as_deref(), Some("K7Q"));
}

#[tokio::test]
async fn legacy_boolean_responses_survive_storage() {
  let s = store().await;
  let sc = school(&s, "A").await;
  let cid = class_id(sc.school_id, 1, 1);

  let mut input = new_consent(&cid, sc.school_id, 1);
  input
    .responses
    .insert("sw-old".into(), StoredResponse::LegacyBoolean(Some(true)));
  let record = s.put_consent(input).await.unwrap();

  let fetched = s.get_consent(record.consent_id).await.unwrap().unwrap();
  let response = fetched.response("sw-old");
  assert_eq!(response.agree, Some(true));
  assert_eq!(response.collection_use, None);
  assert!(!response.fully_agreed());
}

#[tokio::test]
async fn list_consents_filters_by_class_and_sorts() {
  let s = store().await;
  let sc = school(&s, "A").await;
  let one = class_id(sc.school_id, 1, 1);
  let two = class_id(sc.school_id, 1, 2);

  for n in [5, 2, 9] {
    s.put_consent(new_consent(&one, sc.school_id, n)).await.unwrap();
  }
  s.put_consent(new_consent(&two, sc.school_id, 1)).await.unwrap();

  let numbers: Vec<_> = s
    .list_consents(one)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.student_number)
    .collect();
  assert_eq!(numbers, [2, 5, 9]);
}

#[tokio::test]
async fn delete_consent_by_id() {
  let s = store().await;
  let sc = school(&s, "A").await;
  let cid = class_id(sc.school_id, 1, 1);
  let record = s.put_consent(new_consent(&cid, sc.school_id, 1)).await.unwrap();

  assert!(s.delete_consent(record.consent_id.clone()).await.unwrap());
  assert!(
    !s.delete_consent(ConsentId::from_raw("missing"))
      .await
      .unwrap()
  );
  assert!(s.get_consent(record.consent_id).await.unwrap().is_none());
}
