//! Per-entity create and update flows.
//!
//! Each function runs inside the caller's transaction: field validation,
//! uniqueness among active records, reference resolution and the write
//! itself either all take effect or none do.

use chrono::{DateTime, Utc};
use registrar_core::{
  Error as CoreError,
  academic_year::{AcademicYear, AcademicYearPatch, NewAcademicYear},
  course::{Course, CoursePatch, NewCourse},
  department::{Department, DepartmentPatch, NewDepartment},
  entity::EntityKind,
  lifecycle::View,
  person::{Faculty, FacultyPatch, NewFaculty, NewStudent, PersonDetails, Student, StudentPatch},
  reference::{Reference, ResolveMode},
  validate::{ValidationErrors, humanize},
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter, types::Value};

use crate::{
  Result,
  encode::{
    RawAcademicYear, RawCourse, RawDepartment, RawFaculty, RawStudent, Table, encode_date,
    encode_dt, encode_sex,
  },
  query::fetch,
  resolve::resolve,
};

// ─── Shared checks ───────────────────────────────────────────────────────────

/// Load a record in any state, or fail with not-found.
pub fn load<T: Table>(conn: &Connection, id: i64) -> Result<T::Record> {
  fetch::<T>(conn, id, View::All)?
    .ok_or_else(|| CoreError::not_found(T::KIND, id, View::All).into())
}

/// Record a "taken" error for every unique rule of `kind` that another active
/// record already satisfies. `value_of` supplies the candidate's column
/// values for rule fields and scopes.
fn check_unique(
  conn: &Connection,
  kind: EntityKind,
  exclude: Option<i64>,
  value_of: impl Fn(&str) -> Value,
  errors: &mut ValidationErrors,
) -> Result<()> {
  for rule in kind.descriptor().unique {
    let mut sql = format!(
      "SELECT 1 FROM {} WHERE archived_at IS NULL AND {} = ?",
      kind.table(),
      rule.field
    );
    let mut params = vec![value_of(rule.field)];
    if let Some(scope) = rule.scope {
      sql.push_str(&format!(" AND {scope} IS ?"));
      params.push(value_of(scope));
    }
    if let Some(id) = exclude {
      sql.push_str(" AND id != ?");
      params.push(Value::Integer(id));
    }
    sql.push_str(" LIMIT 1");

    let clash: Option<i64> = conn
      .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
      .optional()?;
    if clash.is_some() {
      errors.taken(rule.field);
    }
  }
  Ok(())
}

/// Resolve a reference that must be present, creating missing master data.
fn resolve_required(
  conn: &Connection,
  kind: EntityKind,
  reference: Option<&Reference>,
  parent: Option<i64>,
  now: DateTime<Utc>,
) -> Result<i64> {
  let field = kind.field();
  let Some(reference) = reference else {
    let message = format!("The {} field is required.", humanize(field));
    return Err(ValidationErrors::single(field, message).into());
  };
  resolve(conn, kind, reference, parent, ResolveMode::Create, now)?.ok_or_else(|| {
    let mut errors = ValidationErrors::new();
    errors.invalid_reference(field);
    errors.into()
  })
}

/// Like [`resolve_required`], but a reference that still names the stored id
/// is kept as is, even if that record has since been archived.
fn resolve_kept(
  conn: &Connection,
  kind: EntityKind,
  reference: Option<&Reference>,
  stored: Option<i64>,
  parent: Option<i64>,
  now: DateTime<Utc>,
) -> Result<i64> {
  match (reference, stored) {
    (Some(Reference::ById(id)), Some(current)) if *id == current => Ok(current),
    _ => resolve_required(conn, kind, reference, parent, now),
  }
}

fn person_values(p: &PersonDetails) -> [Value; 10] {
  let text = |s: &Option<String>| s.clone().map_or(Value::Null, Value::Text);
  [
    Value::Text(p.first_name.clone()),
    text(&p.middle_name),
    Value::Text(p.last_name.clone()),
    text(&p.suffix),
    p.date_of_birth.map_or(Value::Null, |d| Value::Text(encode_date(d))),
    p.sex.map_or(Value::Null, |s| Value::Text(encode_sex(s).to_owned())),
    text(&p.phone),
    Value::Text(p.email.clone()),
    text(&p.address),
    Value::Text(p.status.as_str().to_owned()),
  ]
}

const PERSON_SET: &str = "first_name = ?, middle_name = ?, last_name = ?, suffix = ?, \
   date_of_birth = ?, sex = ?, phone = ?, email = ?, address = ?, status = ?";

const PERSON_INSERT: &str = "first_name, middle_name, last_name, suffix, \
   date_of_birth, sex, phone, email, address, status";

fn email_unique(
  conn: &Connection,
  kind: EntityKind,
  email: &str,
  exclude: Option<i64>,
  errors: &mut ValidationErrors,
) -> Result<()> {
  check_unique(conn, kind, exclude, |_| Value::Text(email.to_owned()), errors)
}

// ─── Departments ─────────────────────────────────────────────────────────────

fn check_head(conn: &Connection, head_id: Option<i64>, errors: &mut ValidationErrors) -> Result<()> {
  let Some(head_id) = head_id else { return Ok(()) };
  let found: Option<i64> = conn
    .query_row(
      "SELECT id FROM faculties WHERE id = ?1 AND archived_at IS NULL",
      [head_id],
      |row| row.get(0),
    )
    .optional()?;
  if found.is_none() {
    errors.invalid_reference("head_id");
  }
  Ok(())
}

pub fn create_department(
  conn: &Connection,
  input: NewDepartment,
  now: DateTime<Utc>,
) -> Result<Department> {
  input.validate()?;
  let mut errors = ValidationErrors::new();
  check_unique(conn, EntityKind::Department, None, |_| Value::Text(input.name.clone()), &mut errors)?;
  check_head(conn, input.head_id, &mut errors)?;
  errors.finish()?;

  conn.execute(
    "INSERT INTO departments (name, head_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    params![input.name, input.head_id, encode_dt(now)],
  )?;
  load::<RawDepartment>(conn, conn.last_insert_rowid())
}

pub fn update_department(
  conn: &Connection,
  id: i64,
  patch: DepartmentPatch,
  now: DateTime<Utc>,
) -> Result<Department> {
  let current = load::<RawDepartment>(conn, id)?;
  let candidate = patch.apply(&current);
  candidate.validate()?;

  let mut errors = ValidationErrors::new();
  if current.state.is_active() {
    check_unique(
      conn,
      EntityKind::Department,
      Some(id),
      |_| Value::Text(candidate.name.clone()),
      &mut errors,
    )?;
  }
  if candidate.head_id != current.head_id {
    check_head(conn, candidate.head_id, &mut errors)?;
  }
  errors.finish()?;

  conn.execute(
    "UPDATE departments SET name = ?1, head_id = ?2, updated_at = ?3 WHERE id = ?4",
    params![candidate.name, candidate.head_id, encode_dt(now), id],
  )?;
  load::<RawDepartment>(conn, id)
}

// ─── Courses ─────────────────────────────────────────────────────────────────

fn course_unique(
  conn: &Connection,
  name: &str,
  department: i64,
  exclude: Option<i64>,
) -> Result<()> {
  let mut errors = ValidationErrors::new();
  check_unique(
    conn,
    EntityKind::Course,
    exclude,
    |field| match field {
      "department_id" => Value::Integer(department),
      _ => Value::Text(name.to_owned()),
    },
    &mut errors,
  )?;
  Ok(errors.finish()?)
}

pub fn create_course(conn: &Connection, input: NewCourse, now: DateTime<Utc>) -> Result<Course> {
  input.validate()?;
  let department =
    resolve_required(conn, EntityKind::Department, input.department.as_ref(), None, now)?;
  course_unique(conn, &input.name, department, None)?;

  conn.execute(
    "INSERT INTO courses (name, department_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    params![input.name, department, encode_dt(now)],
  )?;
  load::<RawCourse>(conn, conn.last_insert_rowid())
}

pub fn update_course(
  conn: &Connection,
  id: i64,
  patch: CoursePatch,
  now: DateTime<Utc>,
) -> Result<Course> {
  let current = load::<RawCourse>(conn, id)?;
  let candidate = patch.apply(&current);
  candidate.validate()?;

  let department = resolve_kept(
    conn,
    EntityKind::Department,
    candidate.department.as_ref(),
    Some(current.department_id),
    None,
    now,
  )?;
  if current.state.is_active() {
    course_unique(conn, &candidate.name, department, Some(id))?;
  }

  conn.execute(
    "UPDATE courses SET name = ?1, department_id = ?2, updated_at = ?3 WHERE id = ?4",
    params![candidate.name, department, encode_dt(now), id],
  )?;
  load::<RawCourse>(conn, id)
}

// ─── Faculty ─────────────────────────────────────────────────────────────────

pub fn create_faculty(conn: &Connection, input: NewFaculty, now: DateTime<Utc>) -> Result<Faculty> {
  input.validate()?;
  let mut errors = ValidationErrors::new();
  email_unique(conn, EntityKind::Faculty, &input.person.email, None, &mut errors)?;
  errors.finish()?;

  let department = match &input.department {
    Some(reference) => {
      Some(resolve_required(conn, EntityKind::Department, Some(reference), None, now)?)
    }
    None => None,
  };

  let at = encode_dt(now);
  let mut values = person_values(&input.person).to_vec();
  values.extend([
    Value::Text(input.position),
    department.map_or(Value::Null, Value::Integer),
    Value::Text(at.clone()),
    Value::Text(at),
  ]);
  conn.execute(
    &format!(
      "INSERT INTO faculties ({PERSON_INSERT}, position, department_id, created_at, updated_at)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ),
    params_from_iter(values.iter()),
  )?;
  load::<RawFaculty>(conn, conn.last_insert_rowid())
}

pub fn update_faculty(
  conn: &Connection,
  id: i64,
  patch: FacultyPatch,
  now: DateTime<Utc>,
) -> Result<Faculty> {
  let current = load::<RawFaculty>(conn, id)?;
  let candidate = patch.apply(&current);
  candidate.validate()?;

  let mut errors = ValidationErrors::new();
  if current.state.is_active() {
    email_unique(conn, EntityKind::Faculty, &candidate.person.email, Some(id), &mut errors)?;
  }
  errors.finish()?;

  let department = match &candidate.department {
    Some(reference) => Some(resolve_kept(
      conn,
      EntityKind::Department,
      Some(reference),
      current.department_id,
      None,
      now,
    )?),
    None => None,
  };

  let mut values = person_values(&candidate.person).to_vec();
  values.extend([
    Value::Text(candidate.position),
    department.map_or(Value::Null, Value::Integer),
    Value::Text(encode_dt(now)),
    Value::Integer(id),
  ]);
  conn.execute(
    &format!(
      "UPDATE faculties SET {PERSON_SET}, position = ?, department_id = ?, updated_at = ?
       WHERE id = ?"
    ),
    params_from_iter(values.iter()),
  )?;
  load::<RawFaculty>(conn, id)
}

// ─── Students ────────────────────────────────────────────────────────────────

pub fn create_student(conn: &Connection, input: NewStudent, now: DateTime<Utc>) -> Result<Student> {
  input.validate()?;
  let mut errors = ValidationErrors::new();
  email_unique(conn, EntityKind::Student, &input.person.email, None, &mut errors)?;
  errors.finish()?;

  let department =
    resolve_required(conn, EntityKind::Department, input.department.as_ref(), None, now)?;
  let course =
    resolve_required(conn, EntityKind::Course, input.course.as_ref(), Some(department), now)?;
  let year =
    resolve_required(conn, EntityKind::AcademicYear, input.academic_year.as_ref(), None, now)?;

  let at = encode_dt(now);
  let mut values = person_values(&input.person).to_vec();
  values.extend([
    Value::Integer(department),
    Value::Integer(course),
    Value::Integer(year),
    Value::Text(input.year_level),
    Value::Text(at.clone()),
    Value::Text(at),
  ]);
  conn.execute(
    &format!(
      "INSERT INTO students ({PERSON_INSERT}, department_id, course_id, academic_year_id,
                             year_level, created_at, updated_at)
       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ),
    params_from_iter(values.iter()),
  )?;
  load::<RawStudent>(conn, conn.last_insert_rowid())
}

pub fn update_student(
  conn: &Connection,
  id: i64,
  patch: StudentPatch,
  now: DateTime<Utc>,
) -> Result<Student> {
  let current = load::<RawStudent>(conn, id)?;
  let candidate = patch.apply(&current);
  candidate.validate()?;

  let mut errors = ValidationErrors::new();
  if current.state.is_active() {
    email_unique(conn, EntityKind::Student, &candidate.person.email, Some(id), &mut errors)?;
  }
  errors.finish()?;

  let department = resolve_kept(
    conn,
    EntityKind::Department,
    candidate.department.as_ref(),
    current.department_id,
    None,
    now,
  )?;
  // A kept course id is only trusted while the department is unchanged.
  let course = if Some(department) == current.department_id {
    resolve_kept(
      conn,
      EntityKind::Course,
      candidate.course.as_ref(),
      current.course_id,
      Some(department),
      now,
    )?
  } else {
    resolve_required(conn, EntityKind::Course, candidate.course.as_ref(), Some(department), now)?
  };
  let year = resolve_kept(
    conn,
    EntityKind::AcademicYear,
    candidate.academic_year.as_ref(),
    current.academic_year_id,
    None,
    now,
  )?;

  let mut values = person_values(&candidate.person).to_vec();
  values.extend([
    Value::Integer(department),
    Value::Integer(course),
    Value::Integer(year),
    Value::Text(candidate.year_level),
    Value::Text(encode_dt(now)),
    Value::Integer(id),
  ]);
  conn.execute(
    &format!(
      "UPDATE students SET {PERSON_SET}, department_id = ?, course_id = ?,
              academic_year_id = ?, year_level = ?, updated_at = ?
       WHERE id = ?"
    ),
    params_from_iter(values.iter()),
  )?;
  load::<RawStudent>(conn, id)
}

// ─── Academic years ──────────────────────────────────────────────────────────

/// Flip the current-year flag onto `id`, clearing it everywhere else.
fn set_current(conn: &Connection, id: i64, now: DateTime<Utc>) -> Result<()> {
  conn.execute(
    "UPDATE academic_years SET is_active = 0 WHERE is_active = 1 AND id != ?1",
    [id],
  )?;
  conn.execute(
    "UPDATE academic_years SET is_active = 1, updated_at = ?1 WHERE id = ?2",
    params![encode_dt(now), id],
  )?;
  Ok(())
}

fn year_dates(input: &NewAcademicYear) -> Result<(String, String)> {
  match (input.start_date, input.end_date) {
    (Some(start), Some(end)) => Ok((encode_date(start), encode_date(end))),
    _ => Err(ValidationErrors::single("start_date", "The start date field is required.").into()),
  }
}

pub fn create_academic_year(
  conn: &Connection,
  input: NewAcademicYear,
  now: DateTime<Utc>,
) -> Result<AcademicYear> {
  input.validate()?;
  let mut errors = ValidationErrors::new();
  check_unique(
    conn,
    EntityKind::AcademicYear,
    None,
    |_| Value::Text(input.school_year.clone()),
    &mut errors,
  )?;
  errors.finish()?;

  let (start, end) = year_dates(&input)?;
  conn.execute(
    "INSERT INTO academic_years (school_year, start_date, end_date, is_active, created_at, updated_at)
     VALUES (?1, ?2, ?3, 0, ?4, ?4)",
    params![input.school_year, start, end, encode_dt(now)],
  )?;
  let id = conn.last_insert_rowid();
  if input.is_active {
    set_current(conn, id, now)?;
  }
  load::<RawAcademicYear>(conn, id)
}

pub fn update_academic_year(
  conn: &Connection,
  id: i64,
  patch: AcademicYearPatch,
  now: DateTime<Utc>,
) -> Result<AcademicYear> {
  let current = load::<RawAcademicYear>(conn, id)?;
  let candidate = patch.apply(&current);
  candidate.validate()?;

  let mut errors = ValidationErrors::new();
  if current.state.is_active() {
    check_unique(
      conn,
      EntityKind::AcademicYear,
      Some(id),
      |_| Value::Text(candidate.school_year.clone()),
      &mut errors,
    )?;
  } else if candidate.is_active && !current.is_active {
    errors.add("is_active", "An archived academic year cannot be made current.");
  }
  errors.finish()?;

  let (start, end) = year_dates(&candidate)?;
  conn.execute(
    "UPDATE academic_years
     SET school_year = ?1, start_date = ?2, end_date = ?3, updated_at = ?4,
         is_active = CASE WHEN ?5 THEN is_active ELSE 0 END
     WHERE id = ?6",
    params![candidate.school_year, start, end, encode_dt(now), candidate.is_active, id],
  )?;
  if candidate.is_active && !current.is_active {
    set_current(conn, id, now)?;
  }
  load::<RawAcademicYear>(conn, id)
}

/// Make an active year the current one.
pub fn activate_academic_year(
  conn: &Connection,
  id: i64,
  now: DateTime<Utc>,
) -> Result<AcademicYear> {
  if fetch::<RawAcademicYear>(conn, id, View::Active)?.is_none() {
    return Err(CoreError::not_found(EntityKind::AcademicYear, id, View::Active).into());
  }
  set_current(conn, id, now)?;
  let year = load::<RawAcademicYear>(conn, id)?;
  tracing::info!(id, school_year = %year.school_year, "academic year activated");
  Ok(year)
}

pub fn current_academic_year(conn: &Connection) -> Result<Option<AcademicYear>> {
  let id: Option<i64> = conn
    .query_row(
      "SELECT id FROM academic_years WHERE is_active = 1 AND archived_at IS NULL",
      [],
      |row| row.get(0),
    )
    .optional()?;
  id.map(|id| load::<RawAcademicYear>(conn, id)).transpose()
}
