//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, Utc};
use registrar_core::{
  Error as CoreError,
  academic_year::{AcademicYearPatch, NewAcademicYear},
  admin::{NewAdmin, Session},
  course::NewCourse,
  department::{DepartmentPatch, NewDepartment},
  entity::EntityKind,
  lifecycle::{LifecycleOp, RecordState, View},
  person::{FacultyPatch, NewFaculty, NewStudent, PersonDetails, PersonStatus, StudentPatch},
  query::{ListQuery, PageRequest, SortDirection},
  reference::{Reference, ResolveMode},
  store::{AdminStore, RegistryStore, StoreError},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn domain(err: &Error) -> &CoreError {
  err.domain().expect("domain error")
}

fn person(first: &str, last: &str, email: &str) -> PersonDetails {
  PersonDetails {
    first_name: first.into(),
    last_name: last.into(),
    email: email.into(),
    ..Default::default()
  }
}

fn faculty(email: &str) -> NewFaculty {
  NewFaculty {
    person:     person("Ana", "Cruz", email),
    position:   "Instructor".into(),
    department: None,
  }
}

fn year(label: &str, active: bool) -> NewAcademicYear {
  let start: i32 = label[..4].parse().unwrap();
  NewAcademicYear {
    school_year: label.into(),
    start_date:  NaiveDate::from_ymd_opt(start, 6, 1),
    end_date:    NaiveDate::from_ymd_opt(start + 1, 3, 31),
    is_active:   active,
  }
}

fn student(email: &str, department: &str, course: &str, year_id: i64) -> NewStudent {
  NewStudent {
    person:        person("Juan", "Dela Cruz", email),
    department:    Some(Reference::ByName(department.into())),
    course:        Some(Reference::ByName(course.into())),
    academic_year: Some(Reference::ById(year_id)),
    year_level:    "1st Year".into(),
  }
}

// ─── Reference resolution ────────────────────────────────────────────────────

#[tokio::test]
async fn resolving_a_name_twice_creates_one_department() {
  let s = store().await;
  let nursing = Reference::ByName("Nursing".into());

  let first = s
    .resolve(EntityKind::Department, nursing.clone(), None, ResolveMode::Create)
    .await
    .unwrap();
  let second = s
    .resolve(EntityKind::Department, nursing, None, ResolveMode::Create)
    .await
    .unwrap();

  assert!(first.is_some());
  assert_eq!(first, second);
  assert_eq!(s.count(EntityKind::Department, View::All).await.unwrap(), 1);
}

#[tokio::test]
async fn read_only_resolution_never_creates() {
  let s = store().await;
  let found = s
    .resolve(
      EntityKind::Department,
      Reference::ByName("Engineering".into()),
      None,
      ResolveMode::ReadOnly,
    )
    .await
    .unwrap();
  assert_eq!(found, None);
  assert_eq!(s.count(EntityKind::Department, View::All).await.unwrap(), 0);
}

#[tokio::test]
async fn names_match_exactly() {
  let s = store().await;
  s.create_department(NewDepartment::named("Nursing")).await.unwrap();
  let other = s
    .resolve(
      EntityKind::Department,
      Reference::ByName("nursing".into()),
      None,
      ResolveMode::Create,
    )
    .await
    .unwrap();
  // case differs, so a second department is created
  assert_eq!(s.count(EntityKind::Department, View::Active).await.unwrap(), 2);
  assert!(other.is_some());
}

#[tokio::test]
async fn unknown_ids_are_invalid_on_writes() {
  let s = store().await;
  let err = s
    .create_course(NewCourse { name: "BSN".into(), department: Some(Reference::ById(99)) })
    .await
    .unwrap_err();
  let CoreError::Validation(v) = domain(&err) else { panic!("expected validation") };
  assert_eq!(v.messages("department"), ["The selected department is invalid."]);
}

#[tokio::test]
async fn academic_years_are_never_created_implicitly() {
  let s = store().await;
  let mut input = student("j@school.edu", "Nursing", "BSN", 1);
  input.academic_year = Some(Reference::ByName("2030-2031".into()));
  let err = s.create_student(input).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Validation(v) if v.contains("academic_year")));
  // the failed write rolled back the department and course it resolved
  assert_eq!(s.count(EntityKind::Department, View::All).await.unwrap(), 0);
  assert_eq!(s.count(EntityKind::Course, View::All).await.unwrap(), 0);
}

// ─── Creation side effects ───────────────────────────────────────────────────

#[tokio::test]
async fn student_creation_creates_missing_course_under_department() {
  let s = store().await;
  let y = s.create_academic_year(year("2024-2025", true)).await.unwrap();

  let created = s
    .create_student(student("juan@school.edu", "Nursing", "New Course", y.id))
    .await
    .unwrap();

  let dept_id = created.department_id.unwrap();
  let course = s
    .get_course(created.course_id.unwrap(), View::Active)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(course.name, "New Course");
  assert_eq!(course.department_id, dept_id);
  assert_eq!(created.department_name.as_deref(), Some("Nursing"));
  assert_eq!(created.school_year.as_deref(), Some("2024-2025"));
}

#[tokio::test]
async fn course_ids_must_belong_to_the_department() {
  let s = store().await;
  let y = s.create_academic_year(year("2024-2025", false)).await.unwrap();
  let arts = s
    .create_course(NewCourse { name: "BA".into(), department: Some(Reference::ByName("Arts".into())) })
    .await
    .unwrap();

  let mut input = student("x@school.edu", "Nursing", "", y.id);
  input.course = Some(Reference::ById(arts.id));
  let err = s.create_student(input).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Validation(v) if v.contains("course")));
}

#[tokio::test]
async fn course_names_are_unique_per_department() {
  let s = store().await;
  let course = |dept: &str| NewCourse {
    name:       "General Studies".into(),
    department: Some(Reference::ByName(dept.into())),
  };
  s.create_course(course("Arts")).await.unwrap();
  s.create_course(course("Science")).await.unwrap();
  let err = s.create_course(course("Arts")).await.unwrap_err();
  let CoreError::Validation(v) = domain(&err) else { panic!("expected validation") };
  assert_eq!(v.messages("name"), ["The name has already been taken."]);
}

// ─── Uniqueness and lifecycle ────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_department_name_is_a_validation_error() {
  let s = store().await;
  s.create_department(NewDepartment::named("Nursing")).await.unwrap();
  let err = s.create_department(NewDepartment::named("Nursing")).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Validation(v) if v.contains("name")));
}

#[tokio::test]
async fn archive_then_restore_round_trips() {
  let s = store().await;
  let created = s.create_faculty(faculty("ana@school.edu")).await.unwrap();

  s.archive(EntityKind::Faculty, created.id).await.unwrap();
  let archived = s.get_faculty(created.id, View::All).await.unwrap().unwrap();
  assert_eq!(archived.state, RecordState::Archived);
  assert!(archived.archived_at.is_some());

  let event = s.restore(EntityKind::Faculty, created.id).await.unwrap();
  assert_eq!(event.op, LifecycleOp::Restore);
  let restored = s.get_faculty(created.id, View::Active).await.unwrap().unwrap();
  assert_eq!(restored, created);
}

#[tokio::test]
async fn every_kind_round_trips_through_archive() {
  let s = store().await;
  let y = s.create_academic_year(year("2024-2025", true)).await.unwrap();
  let st = s
    .create_student(student("juan@school.edu", "Nursing", "BSN", y.id))
    .await
    .unwrap();
  let d = s.get_department(st.department_id.unwrap(), View::All).await.unwrap().unwrap();
  let c = s.get_course(st.course_id.unwrap(), View::All).await.unwrap().unwrap();
  let f = s.create_faculty(faculty("ana@school.edu")).await.unwrap();

  macro_rules! round_trip {
    ($kind:expr, $record:expr, $get:ident) => {{
      s.archive($kind, $record.id).await.unwrap();
      s.restore($kind, $record.id).await.unwrap();
      let restored = s.$get($record.id, View::Active).await.unwrap().unwrap();
      assert_eq!(restored, $record, "{} changed across archive and restore", $kind);
    }};
  }

  round_trip!(EntityKind::Department, d, get_department);
  round_trip!(EntityKind::Course, c, get_course);
  round_trip!(EntityKind::Faculty, f, get_faculty);
  round_trip!(EntityKind::Student, st, get_student);
  round_trip!(EntityKind::AcademicYear, y, get_academic_year);
  assert_eq!(s.current_academic_year().await.unwrap().map(|y| y.id), Some(y.id));
}

#[tokio::test]
async fn lifecycle_preconditions() {
  let s = store().await;
  let d = s.create_department(NewDepartment::named("Nursing")).await.unwrap();

  let err = s.purge(EntityKind::Department, d.id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { scope: View::Archived, .. }));

  let err = s.restore(EntityKind::Department, d.id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { .. }));

  s.archive(EntityKind::Department, d.id).await.unwrap();
  let err = s.archive(EntityKind::Department, d.id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { scope: View::Active, .. }));

  s.purge(EntityKind::Department, d.id).await.unwrap();
  assert!(s.get_department(d.id, View::All).await.unwrap().is_none());
  let err = s.purge(EntityKind::Department, d.id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { .. }));
}

#[tokio::test]
async fn restore_conflicts_leave_the_record_archived() {
  let s = store().await;
  let first = s.create_faculty(faculty("shared@school.edu")).await.unwrap();
  s.archive(EntityKind::Faculty, first.id).await.unwrap();

  // the address is free again among active faculty
  s.create_faculty(faculty("shared@school.edu")).await.unwrap();

  let err = s.restore(EntityKind::Faculty, first.id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Conflict(m) if m.contains("email")));
  let still = s.get_faculty(first.id, View::All).await.unwrap().unwrap();
  assert_eq!(still.state, RecordState::Archived);
}

#[tokio::test]
async fn updates_apply_to_archived_records() {
  let s = store().await;
  let d = s.create_department(NewDepartment::named("Nursing")).await.unwrap();
  s.archive(EntityKind::Department, d.id).await.unwrap();

  let patch = DepartmentPatch { name: Some("College of Nursing".into()), head_id: None };
  let updated = s.update_department(d.id, patch).await.unwrap();
  assert_eq!(updated.name, "College of Nursing");
  assert_eq!(updated.state, RecordState::Archived);
}

#[tokio::test]
async fn update_ignores_self_for_uniqueness() {
  let s = store().await;
  let f = s.create_faculty(faculty("ana@school.edu")).await.unwrap();
  let patch = FacultyPatch { position: Some("Professor".into()), ..Default::default() };
  let updated = s.update_faculty(f.id, patch).await.unwrap();
  assert_eq!(updated.position, "Professor");
  assert_eq!(updated.person.email, "ana@school.edu");
  assert!(updated.updated_at >= f.updated_at);
}

#[tokio::test]
async fn missing_records_are_not_found_on_update() {
  let s = store().await;
  let err = s.update_student(41, StudentPatch::default()).await.unwrap_err();
  assert!(matches!(
    domain(&err),
    CoreError::NotFound { kind: EntityKind::Student, id: 41, .. }
  ));
}

#[tokio::test]
async fn purging_a_department_cascades_and_detaches() {
  let s = store().await;
  let y = s.create_academic_year(year("2024-2025", false)).await.unwrap();
  let st = s
    .create_student(student("juan@school.edu", "Nursing", "BSN", y.id))
    .await
    .unwrap();
  let dept_id = st.department_id.unwrap();

  s.archive(EntityKind::Department, dept_id).await.unwrap();
  s.purge(EntityKind::Department, dept_id).await.unwrap();

  assert_eq!(s.count(EntityKind::Course, View::All).await.unwrap(), 0);
  let st = s.get_student(st.id, View::All).await.unwrap().unwrap();
  assert_eq!(st.department_id, None);
  assert_eq!(st.course_id, None);
  assert_eq!(st.academic_year_id, Some(y.id));
}

// ─── Academic years ──────────────────────────────────────────────────────────

#[tokio::test]
async fn activation_is_exclusive() {
  let s = store().await;
  let a = s.create_academic_year(year("2023-2024", true)).await.unwrap();
  let b = s.create_academic_year(year("2024-2025", false)).await.unwrap();
  assert!(a.is_active);

  let b = s.activate_academic_year(b.id).await.unwrap();
  assert!(b.is_active);
  let a = s.get_academic_year(a.id, View::All).await.unwrap().unwrap();
  assert!(!a.is_active);
  assert_eq!(s.current_academic_year().await.unwrap().map(|y| y.id), Some(b.id));

  // creating with is_active flips the flag again
  let c = s.create_academic_year(year("2025-2026", true)).await.unwrap();
  let b = s.get_academic_year(b.id, View::All).await.unwrap().unwrap();
  assert!(c.is_active && !b.is_active);
}

#[tokio::test]
async fn the_current_year_round_trips_through_archive() {
  let s = store().await;
  let a = s.create_academic_year(year("2024-2025", true)).await.unwrap();
  s.archive(EntityKind::AcademicYear, a.id).await.unwrap();
  assert!(s.current_academic_year().await.unwrap().is_none());

  let err = s.activate_academic_year(a.id).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::NotFound { scope: View::Active, .. }));

  s.restore(EntityKind::AcademicYear, a.id).await.unwrap();
  let restored = s.get_academic_year(a.id, View::Active).await.unwrap().unwrap();
  assert_eq!(restored, a);
  assert_eq!(s.current_academic_year().await.unwrap().map(|y| y.id), Some(a.id));
}

#[tokio::test]
async fn activating_while_the_current_year_is_archived() {
  let s = store().await;
  let a = s.create_academic_year(year("2024-2025", true)).await.unwrap();
  let b = s.create_academic_year(year("2025-2026", false)).await.unwrap();
  s.archive(EntityKind::AcademicYear, a.id).await.unwrap();

  // the archived year's flag does not block a new current year
  s.activate_academic_year(b.id).await.unwrap();
  s.restore(EntityKind::AcademicYear, a.id).await.unwrap();
  let a = s.get_academic_year(a.id, View::Active).await.unwrap().unwrap();
  assert!(!a.is_active);
  assert_eq!(s.current_academic_year().await.unwrap().map(|y| y.id), Some(b.id));
}

#[tokio::test]
async fn archived_current_year_can_still_be_edited() {
  let s = store().await;
  let a = s.create_academic_year(year("2024-2025", true)).await.unwrap();
  s.archive(EntityKind::AcademicYear, a.id).await.unwrap();

  let patch = AcademicYearPatch {
    school_year: Some("SY 2024-2025".into()),
    ..Default::default()
  };
  let updated = s.update_academic_year(a.id, patch).await.unwrap();
  assert_eq!(updated.school_year, "SY 2024-2025");
  assert_eq!(updated.state, RecordState::Archived);
}

// ─── Listings ────────────────────────────────────────────────────────────────

async fn seeded() -> SqliteStore {
  let s = store().await;
  let y = s.create_academic_year(year("2024-2025", true)).await.unwrap();
  for (i, (dept, course)) in [
    ("Nursing", "BSN"),
    ("Nursing", "BSN"),
    ("Nursing", "Midwifery"),
    ("Engineering", "BSCE"),
  ]
  .into_iter()
  .enumerate()
  {
    s.create_student(student(&format!("s{i}@school.edu"), dept, course, y.id))
      .await
      .unwrap();
  }
  s
}

#[tokio::test]
async fn views_partition_records() {
  let s = seeded().await;
  s.archive(EntityKind::Student, 1).await.unwrap();

  let active = s.list_students(&ListQuery::in_view(View::Active)).await.unwrap();
  let archived = s.list_students(&ListQuery::in_view(View::Archived)).await.unwrap();
  let all = s.list_students(&ListQuery::in_view(View::All)).await.unwrap();

  assert_eq!(active.data.len(), 3);
  assert!(active.data.iter().all(|st| st.state == RecordState::Active));
  assert_eq!(archived.data.len(), 1);
  assert!(archived.data.iter().all(|st| st.state == RecordState::Archived));
  assert_eq!(all.data.len(), 4);
}

#[tokio::test]
async fn filters_by_name_or_id() {
  let s = seeded().await;
  let by_name = ListQuery {
    department: Some(Reference::ByName("Nursing".into())),
    course: Some(Reference::ByName("BSN".into())),
    ..ListQuery::default()
  };
  assert_eq!(s.list_students(&by_name).await.unwrap().data.len(), 2);

  let nursing = s.list_students(&by_name).await.unwrap().data[0].department_id.unwrap();
  let by_id = ListQuery {
    department: Some(Reference::ById(nursing)),
    ..ListQuery::default()
  };
  assert_eq!(s.list_students(&by_id).await.unwrap().data.len(), 3);

  let unknown = ListQuery {
    department: Some(Reference::ByName("Astronomy".into())),
    ..ListQuery::default()
  };
  assert!(s.list_students(&unknown).await.unwrap().data.is_empty());
}

#[tokio::test]
async fn search_is_case_insensitive_and_literal() {
  let s = seeded().await;
  let q = |term: &str| ListQuery { search: Some(term.into()), ..ListQuery::default() };

  assert_eq!(s.list_students(&q("ENGINEER")).await.unwrap().data.len(), 1);
  assert_eq!(s.list_students(&q("midwif")).await.unwrap().data.len(), 1);
  assert_eq!(s.list_students(&q("s1@")).await.unwrap().data.len(), 1);
  assert!(s.list_students(&q("%")).await.unwrap().data.is_empty());
}

#[tokio::test]
async fn status_filter_and_sorting() {
  let s = seeded().await;
  let patch = StudentPatch {
    person: registrar_core::person::PersonPatch {
      status: Some(PersonStatus::Inactive),
      ..Default::default()
    },
    ..Default::default()
  };
  s.update_student(2, patch).await.unwrap();

  let inactive = ListQuery { status: Some(PersonStatus::Inactive), ..ListQuery::default() };
  let listed = s.list_students(&inactive).await.unwrap();
  assert_eq!(listed.data.iter().map(|st| st.id).collect::<Vec<_>>(), [2]);

  let by_email = ListQuery {
    sort: Some("email".into()),
    direction: SortDirection::Asc,
    ..ListQuery::default()
  };
  let emails = s
    .list_students(&by_email)
    .await
    .unwrap()
    .data
    .into_iter()
    .map(|st| st.person.email)
    .collect::<Vec<_>>();
  assert_eq!(emails, ["s0@school.edu", "s1@school.edu", "s2@school.edu", "s3@school.edu"]);
}

#[tokio::test]
async fn unsupported_filters_are_rejected() {
  let s = seeded().await;
  let q = ListQuery { course: Some(Reference::ById(1)), ..ListQuery::default() };
  let err = s.list_departments(&q).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Validation(v) if v.contains("course")));
}

#[tokio::test]
async fn pagination_and_stats() {
  let s = seeded().await;
  s.archive(EntityKind::Student, 4).await.unwrap();

  let q = ListQuery {
    page: Some(PageRequest::new(Some(2), Some(2))),
    with_stats: true,
    sort: Some("id".into()),
    direction: SortDirection::Asc,
    ..ListQuery::default()
  };
  let listing = s.list_students(&q).await.unwrap();
  let meta = listing.meta.unwrap();
  assert_eq!((meta.page, meta.per_page, meta.total, meta.last_page), (2, 2, 3, 2));
  assert_eq!(listing.data.iter().map(|st| st.id).collect::<Vec<_>>(), [3]);

  let stats = listing.stats.unwrap();
  assert_eq!((stats.total, stats.active, stats.archived), (4, 3, 1));
  let counts = stats
    .by_department
    .iter()
    .map(|c| (c.department.as_str(), c.count))
    .collect::<Vec<_>>();
  assert_eq!(counts, [("Engineering", 0), ("Nursing", 3)]);
}

#[tokio::test]
async fn departments_without_members_are_counted() {
  let s = store().await;
  s.create_department(NewDepartment::named("Arts")).await.unwrap();
  let counts = s.count_by_department(EntityKind::Faculty).await.unwrap();
  assert_eq!(counts.len(), 1);
  assert_eq!(counts[0].count, 0);
  assert!(s.count_by_department(EntityKind::AcademicYear).await.unwrap().is_empty());
}

// ─── Admins and sessions ─────────────────────────────────────────────────────

#[tokio::test]
async fn sessions_resolve_until_expiry() {
  let s = store().await;
  let admin = s
    .create_admin(NewAdmin {
      name:          "Registrar".into(),
      email:         "admin@school.edu".into(),
      password_hash: "$argon2id$stub".into(),
    })
    .await
    .unwrap();

  let (found, hash) = s
    .find_admin_credentials("admin@school.edu".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found, admin);
  assert_eq!(hash, "$argon2id$stub");

  let now = Utc::now();
  s.create_session(Session {
    token_digest: "abc".into(),
    admin_id:     admin.id,
    created_at:   now,
    expires_at:   now + Duration::hours(1),
  })
  .await
  .unwrap();

  assert_eq!(s.find_session("abc".into(), now).await.unwrap(), Some(admin.clone()));
  assert_eq!(s.find_session("abc".into(), now + Duration::hours(2)).await.unwrap(), None);
  assert_eq!(s.purge_expired_sessions(now + Duration::hours(2)).await.unwrap(), 1);
  assert!(!s.delete_session("abc".into()).await.unwrap());
}

#[tokio::test]
async fn admin_emails_are_unique() {
  let s = store().await;
  let new = || NewAdmin {
    name:          "A".into(),
    email:         "a@school.edu".into(),
    password_hash: "h".into(),
  };
  s.create_admin(new()).await.unwrap();
  let err = s.create_admin(new()).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::Validation(v) if v.contains("email")));
}
