//! The `RegistryStore` and `AdminStore` traits.
//!
//! Storage backends (e.g. `registrar-store-sqlite`) implement these traits;
//! the HTTP layer (`registrar-api`, `registrar-server`) depends only on the
//! abstraction.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  Error,
  academic_year::{AcademicYear, AcademicYearPatch, NewAcademicYear},
  admin::{Admin, AdminPatch, NewAdmin, Session},
  course::{Course, CoursePatch, NewCourse},
  department::{Department, DepartmentPatch, NewDepartment},
  entity::EntityKind,
  lifecycle::{LifecycleEvent, LifecycleOp, View},
  person::{Faculty, FacultyPatch, NewFaculty, NewStudent, Student, StudentPatch},
  query::{DepartmentCount, ListQuery, Listing},
  reference::{Reference, ResolveMode},
};

/// Backend errors must expose the domain error they carry, if any, so callers
/// can map validation, not-found and conflict failures without knowing the
/// backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&Error>;
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Abstraction over a registrar backend.
///
/// Reads take a [`View`]; `get_*` returns `None` when the record does not
/// exist within that view. Updates apply to active and archived records
/// alike. Writes that accept name-or-id references resolve them with
/// [`ResolveMode::Create`] inside the same transaction as the write.
///
/// All methods return `Send` futures so the trait can be used behind `axum`.
pub trait RegistryStore: Send + Sync {
  type Error: StoreError;

  // ── Departments ───────────────────────────────────────────────────────

  fn create_department(
    &self,
    input: NewDepartment,
  ) -> impl Future<Output = Result<Department, Self::Error>> + Send + '_;

  fn update_department(
    &self,
    id: i64,
    patch: DepartmentPatch,
  ) -> impl Future<Output = Result<Department, Self::Error>> + Send + '_;

  fn get_department(
    &self,
    id: i64,
    view: View,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_;

  fn list_departments<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Listing<Department>, Self::Error>> + Send + 'a;

  // ── Courses ───────────────────────────────────────────────────────────

  fn create_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn update_course(
    &self,
    id: i64,
    patch: CoursePatch,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: i64,
    view: View,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn list_courses<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Listing<Course>, Self::Error>> + Send + 'a;

  // ── Faculty ───────────────────────────────────────────────────────────

  fn create_faculty(
    &self,
    input: NewFaculty,
  ) -> impl Future<Output = Result<Faculty, Self::Error>> + Send + '_;

  fn update_faculty(
    &self,
    id: i64,
    patch: FacultyPatch,
  ) -> impl Future<Output = Result<Faculty, Self::Error>> + Send + '_;

  fn get_faculty(
    &self,
    id: i64,
    view: View,
  ) -> impl Future<Output = Result<Option<Faculty>, Self::Error>> + Send + '_;

  fn list_faculty<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Listing<Faculty>, Self::Error>> + Send + 'a;

  // ── Students ──────────────────────────────────────────────────────────

  fn create_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn update_student(
    &self,
    id: i64,
    patch: StudentPatch,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn get_student(
    &self,
    id: i64,
    view: View,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  fn list_students<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Listing<Student>, Self::Error>> + Send + 'a;

  // ── Academic years ────────────────────────────────────────────────────

  fn create_academic_year(
    &self,
    input: NewAcademicYear,
  ) -> impl Future<Output = Result<AcademicYear, Self::Error>> + Send + '_;

  fn update_academic_year(
    &self,
    id: i64,
    patch: AcademicYearPatch,
  ) -> impl Future<Output = Result<AcademicYear, Self::Error>> + Send + '_;

  fn get_academic_year(
    &self,
    id: i64,
    view: View,
  ) -> impl Future<Output = Result<Option<AcademicYear>, Self::Error>> + Send + '_;

  fn list_academic_years<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Listing<AcademicYear>, Self::Error>> + Send + 'a;

  /// Make `id` the current year, clearing the flag on every other year in
  /// the same transaction. Only active years can be activated.
  fn activate_academic_year(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<AcademicYear, Self::Error>> + Send + '_;

  fn current_academic_year(
    &self,
  ) -> impl Future<Output = Result<Option<AcademicYear>, Self::Error>> + Send + '_;

  // ── Generic operations ────────────────────────────────────────────────

  /// Turn a reference into an id of `kind`.
  ///
  /// `parent` scopes course names to a department; it is ignored for other
  /// kinds. In [`ResolveMode::ReadOnly`] an unknown name yields `None`; in
  /// [`ResolveMode::Create`] it creates the record. An id that does not name
  /// an active record is a validation error in `Create` mode and `None` in
  /// `ReadOnly` mode.
  fn resolve(
    &self,
    kind: EntityKind,
    reference: Reference,
    parent: Option<i64>,
    mode: ResolveMode,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Apply a lifecycle transition. Restores re-check uniqueness against
  /// active records and fail with a conflict, leaving the record archived.
  fn transition(
    &self,
    kind: EntityKind,
    id: i64,
    op: LifecycleOp,
  ) -> impl Future<Output = Result<LifecycleEvent, Self::Error>> + Send + '_;

  fn archive(
    &self,
    kind: EntityKind,
    id: i64,
  ) -> impl Future<Output = Result<LifecycleEvent, Self::Error>> + Send + '_ {
    self.transition(kind, id, LifecycleOp::Archive)
  }

  fn restore(
    &self,
    kind: EntityKind,
    id: i64,
  ) -> impl Future<Output = Result<LifecycleEvent, Self::Error>> + Send + '_ {
    self.transition(kind, id, LifecycleOp::Restore)
  }

  /// Permanently delete an archived record.
  fn purge(
    &self,
    kind: EntityKind,
    id: i64,
  ) -> impl Future<Output = Result<LifecycleEvent, Self::Error>> + Send + '_ {
    self.transition(kind, id, LifecycleOp::Purge)
  }

  fn count(
    &self,
    kind: EntityKind,
    view: View,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Active members of `kind` per active department, zero counts included,
  /// ordered by department name. Empty for kinds without a department
  /// relation.
  fn count_by_department(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<Vec<DepartmentCount>, Self::Error>> + Send + '_;
}

// ─── Credentials ─────────────────────────────────────────────────────────────

/// Administrator accounts and sessions.
pub trait AdminStore: RegistryStore {
  fn create_admin(
    &self,
    input: NewAdmin,
  ) -> impl Future<Output = Result<Admin, Self::Error>> + Send + '_;

  /// The admin with `email` and their stored password hash.
  fn find_admin_credentials(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<(Admin, String)>, Self::Error>> + Send + '_;

  fn get_admin(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Admin>, Self::Error>> + Send + '_;

  fn update_admin(
    &self,
    id: i64,
    patch: AdminPatch,
  ) -> impl Future<Output = Result<Admin, Self::Error>> + Send + '_;

  fn admin_password_hash(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  fn set_admin_password(
    &self,
    id: i64,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The admin owning an unexpired session with this token digest.
  fn find_session(
    &self,
    token_digest: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Admin>, Self::Error>> + Send + '_;

  /// Returns whether a session was removed.
  fn delete_session(
    &self,
    token_digest: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Drop sessions that expired before `now`; returns how many were removed.
  fn purge_expired_sessions(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
