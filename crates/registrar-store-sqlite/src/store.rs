//! [`SqliteStore`]: the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use chrono::Utc;
use registrar_core::{
  academic_year::{AcademicYear, AcademicYearPatch, NewAcademicYear},
  course::{Course, CoursePatch, NewCourse},
  department::{Department, DepartmentPatch, NewDepartment},
  entity::EntityKind,
  lifecycle::{LifecycleEvent, LifecycleOp, View},
  person::{Faculty, FacultyPatch, NewFaculty, NewStudent, Student, StudentPatch},
  query::{DepartmentCount, ListQuery, Listing},
  reference::{Reference, ResolveMode},
  store::RegistryStore,
};
use rusqlite::{Connection, Transaction};

use crate::{
  Result,
  encode::{RawAcademicYear, RawCourse, RawDepartment, RawFaculty, RawStudent, Table},
  lifecycle, query, resolve,
  schema::SCHEMA,
  write,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registrar store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
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

  /// Open an in-memory store for tests.
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

  /// Run `f` on the connection thread. Domain errors travel back as the inner
  /// `Result`.
  pub(crate) async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside a transaction that commits only if `f` succeeds.
  pub(crate) async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }

  async fn get<T: Table>(&self, id: i64, view: View) -> Result<Option<T::Record>> {
    self.read(move |conn| query::fetch::<T>(conn, id, view)).await
  }

  async fn list<T: Table>(&self, query: &ListQuery) -> Result<Listing<T::Record>> {
    query.validate_for(T::KIND)?;
    let query = query.clone();
    self.read(move |conn| query::list::<T>(conn, &query)).await
  }
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = crate::Error;

  // ── Departments ───────────────────────────────────────────────────────────

  async fn create_department(&self, input: NewDepartment) -> Result<Department> {
    self.write(move |tx| write::create_department(tx, input, Utc::now())).await
  }

  async fn update_department(&self, id: i64, patch: DepartmentPatch) -> Result<Department> {
    self.write(move |tx| write::update_department(tx, id, patch, Utc::now())).await
  }

  async fn get_department(&self, id: i64, view: View) -> Result<Option<Department>> {
    self.get::<RawDepartment>(id, view).await
  }

  async fn list_departments<'a>(&'a self, query: &'a ListQuery) -> Result<Listing<Department>> {
    self.list::<RawDepartment>(query).await
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn create_course(&self, input: NewCourse) -> Result<Course> {
    self.write(move |tx| write::create_course(tx, input, Utc::now())).await
  }

  async fn update_course(&self, id: i64, patch: CoursePatch) -> Result<Course> {
    self.write(move |tx| write::update_course(tx, id, patch, Utc::now())).await
  }

  async fn get_course(&self, id: i64, view: View) -> Result<Option<Course>> {
    self.get::<RawCourse>(id, view).await
  }

  async fn list_courses<'a>(&'a self, query: &'a ListQuery) -> Result<Listing<Course>> {
    self.list::<RawCourse>(query).await
  }

  // ── Faculty ───────────────────────────────────────────────────────────────

  async fn create_faculty(&self, input: NewFaculty) -> Result<Faculty> {
    self.write(move |tx| write::create_faculty(tx, input, Utc::now())).await
  }

  async fn update_faculty(&self, id: i64, patch: FacultyPatch) -> Result<Faculty> {
    self.write(move |tx| write::update_faculty(tx, id, patch, Utc::now())).await
  }

  async fn get_faculty(&self, id: i64, view: View) -> Result<Option<Faculty>> {
    self.get::<RawFaculty>(id, view).await
  }

  async fn list_faculty<'a>(&'a self, query: &'a ListQuery) -> Result<Listing<Faculty>> {
    self.list::<RawFaculty>(query).await
  }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn create_student(&self, input: NewStudent) -> Result<Student> {
    self.write(move |tx| write::create_student(tx, input, Utc::now())).await
  }

  async fn update_student(&self, id: i64, patch: StudentPatch) -> Result<Student> {
    self.write(move |tx| write::update_student(tx, id, patch, Utc::now())).await
  }

  async fn get_student(&self, id: i64, view: View) -> Result<Option<Student>> {
    self.get::<RawStudent>(id, view).await
  }

  async fn list_students<'a>(&'a self, query: &'a ListQuery) -> Result<Listing<Student>> {
    self.list::<RawStudent>(query).await
  }

  // ── Academic years ────────────────────────────────────────────────────────

  async fn create_academic_year(&self, input: NewAcademicYear) -> Result<AcademicYear> {
    self.write(move |tx| write::create_academic_year(tx, input, Utc::now())).await
  }

  async fn update_academic_year(
    &self,
    id: i64,
    patch: AcademicYearPatch,
  ) -> Result<AcademicYear> {
    self.write(move |tx| write::update_academic_year(tx, id, patch, Utc::now())).await
  }

  async fn get_academic_year(&self, id: i64, view: View) -> Result<Option<AcademicYear>> {
    self.get::<RawAcademicYear>(id, view).await
  }

  async fn list_academic_years<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> Result<Listing<AcademicYear>> {
    self.list::<RawAcademicYear>(query).await
  }

  async fn activate_academic_year(&self, id: i64) -> Result<AcademicYear> {
    self.write(move |tx| write::activate_academic_year(tx, id, Utc::now())).await
  }

  async fn current_academic_year(&self) -> Result<Option<AcademicYear>> {
    self.read(write::current_academic_year).await
  }

  // ── Generic operations ────────────────────────────────────────────────────

  async fn resolve(
    &self,
    kind: EntityKind,
    reference: Reference,
    parent: Option<i64>,
    mode: ResolveMode,
  ) -> Result<Option<i64>> {
    self
      .write(move |tx| resolve::resolve(tx, kind, &reference, parent, mode, Utc::now()))
      .await
  }

  async fn transition(&self, kind: EntityKind, id: i64, op: LifecycleOp) -> Result<LifecycleEvent> {
    self.write(move |tx| lifecycle::transition(tx, kind, id, op, Utc::now())).await
  }

  async fn count(&self, kind: EntityKind, view: View) -> Result<u64> {
    self.read(move |conn| query::count(conn, kind, view)).await
  }

  async fn count_by_department(&self, kind: EntityKind) -> Result<Vec<DepartmentCount>> {
    self.read(move |conn| query::count_by_department(conn, kind)).await
  }
}
