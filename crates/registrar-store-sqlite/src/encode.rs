//! Encoding and decoding between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with microsecond precision and a
//! `Z` suffix, so lexical order is chronological order. Calendar dates are
//! `YYYY-MM-DD`. Enumerations are stored by their display names.
//!
//! Each `Raw*` struct mirrors one row of a [`Table::COLUMNS`] projection;
//! decoding into the domain record happens outside the connection closure.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use registrar_core::{
  academic_year::AcademicYear,
  course::Course,
  department::Department,
  entity::EntityKind,
  lifecycle::RecordState,
  person::{Faculty, PersonDetails, PersonStatus, Sex, Student},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_sex(sex: Sex) -> &'static str {
  match sex {
    Sex::Male => "Male",
    Sex::Female => "Female",
  }
}

fn decode_sex(s: &str) -> Result<Sex> {
  match s {
    "Male" => Ok(Sex::Male),
    "Female" => Ok(Sex::Female),
    other => Err(Error::Decode { column: "sex", value: other.to_owned() }),
  }
}

fn decode_status(s: &str) -> Result<PersonStatus> {
  s.parse()
    .map_err(|_| Error::Decode { column: "status", value: s.to_owned() })
}

// ─── Table projections ───────────────────────────────────────────────────────

/// A row shape selectable from one entity's table (aliased `t`) and its
/// joins. Used by the generic fetch and list code.
pub trait Table: Sized + Send + 'static {
  type Record: Send + 'static;

  const KIND: EntityKind;
  /// Projection in `from_row` order.
  const COLUMNS: &'static str;
  /// `FROM` clause body, including the joins the searchable and sortable
  /// columns refer to.
  const FROM: &'static str;

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

  fn decode(self) -> Result<Self::Record>;
}

struct Stamps {
  created_at:  String,
  updated_at:  String,
  archived_at: Option<String>,
}

impl Stamps {
  fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      created_at:  row.get(at)?,
      updated_at:  row.get(at + 1)?,
      archived_at: row.get(at + 2)?,
    })
  }

  fn decode(self) -> Result<(DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>)> {
    Ok((
      decode_dt(&self.created_at)?,
      decode_dt(&self.updated_at)?,
      decode_opt_dt(self.archived_at)?,
    ))
  }
}

// ── Departments ──────────────────────────────────────────────────────────────

pub struct RawDepartment {
  id:        i64,
  name:      String,
  head_id:   Option<i64>,
  head_name: Option<String>,
  stamps:    Stamps,
}

impl Table for RawDepartment {
  type Record = Department;

  const KIND: EntityKind = EntityKind::Department;
  const COLUMNS: &'static str = "t.id, t.name, t.head_id, \
     h.first_name || ' ' || h.last_name, \
     t.created_at, t.updated_at, t.archived_at";
  const FROM: &'static str = "departments t LEFT JOIN faculties h ON h.id = t.head_id";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      name:      row.get(1)?,
      head_id:   row.get(2)?,
      head_name: row.get(3)?,
      stamps:    Stamps::from_row(row, 4)?,
    })
  }

  fn decode(self) -> Result<Department> {
    let (created_at, updated_at, archived_at) = self.stamps.decode()?;
    Ok(Department {
      id: self.id,
      name: self.name,
      head_id: self.head_id,
      head_name: self.head_name,
      created_at,
      updated_at,
      archived_at,
      state: RecordState::from_marker(archived_at),
    })
  }
}

// ── Courses ──────────────────────────────────────────────────────────────────

pub struct RawCourse {
  id:              i64,
  name:            String,
  department_id:   i64,
  department_name: Option<String>,
  stamps:          Stamps,
}

impl Table for RawCourse {
  type Record = Course;

  const KIND: EntityKind = EntityKind::Course;
  const COLUMNS: &'static str =
    "t.id, t.name, t.department_id, d.name, t.created_at, t.updated_at, t.archived_at";
  const FROM: &'static str = "courses t LEFT JOIN departments d ON d.id = t.department_id";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      name:            row.get(1)?,
      department_id:   row.get(2)?,
      department_name: row.get(3)?,
      stamps:          Stamps::from_row(row, 4)?,
    })
  }

  fn decode(self) -> Result<Course> {
    let (created_at, updated_at, archived_at) = self.stamps.decode()?;
    Ok(Course {
      id: self.id,
      name: self.name,
      department_id: self.department_id,
      department_name: self.department_name,
      created_at,
      updated_at,
      archived_at,
      state: RecordState::from_marker(archived_at),
    })
  }
}

// ── Academic years ───────────────────────────────────────────────────────────

pub struct RawAcademicYear {
  id:          i64,
  school_year: String,
  start_date:  String,
  end_date:    String,
  is_active:   bool,
  stamps:      Stamps,
}

impl Table for RawAcademicYear {
  type Record = AcademicYear;

  const KIND: EntityKind = EntityKind::AcademicYear;
  const COLUMNS: &'static str = "t.id, t.school_year, t.start_date, t.end_date, t.is_active, \
     t.created_at, t.updated_at, t.archived_at";
  const FROM: &'static str = "academic_years t";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      school_year: row.get(1)?,
      start_date:  row.get(2)?,
      end_date:    row.get(3)?,
      is_active:   row.get(4)?,
      stamps:      Stamps::from_row(row, 5)?,
    })
  }

  fn decode(self) -> Result<AcademicYear> {
    let (created_at, updated_at, archived_at) = self.stamps.decode()?;
    Ok(AcademicYear {
      id: self.id,
      school_year: self.school_year,
      start_date: decode_date(&self.start_date)?,
      end_date: decode_date(&self.end_date)?,
      is_active: self.is_active,
      created_at,
      updated_at,
      archived_at,
      state: RecordState::from_marker(archived_at),
    })
  }
}

// ── People ───────────────────────────────────────────────────────────────────

/// Personal columns shared by faculty and students; both projections list
/// them right after `t.id`, in this order: first_name, middle_name,
/// last_name, suffix, date_of_birth, sex, phone, email, address, status.
struct RawPerson {
  first_name:    String,
  middle_name:   Option<String>,
  last_name:     String,
  suffix:        Option<String>,
  date_of_birth: Option<String>,
  sex:           Option<String>,
  phone:         Option<String>,
  email:         String,
  address:       Option<String>,
  status:        String,
}

impl RawPerson {
  /// Number of columns consumed.
  const WIDTH: usize = 10;

  fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      first_name:    row.get(at)?,
      middle_name:   row.get(at + 1)?,
      last_name:     row.get(at + 2)?,
      suffix:        row.get(at + 3)?,
      date_of_birth: row.get(at + 4)?,
      sex:           row.get(at + 5)?,
      phone:         row.get(at + 6)?,
      email:         row.get(at + 7)?,
      address:       row.get(at + 8)?,
      status:        row.get(at + 9)?,
    })
  }

  fn decode(self) -> Result<PersonDetails> {
    Ok(PersonDetails {
      first_name:    self.first_name,
      middle_name:   self.middle_name,
      last_name:     self.last_name,
      suffix:        self.suffix,
      date_of_birth: self.date_of_birth.as_deref().map(decode_date).transpose()?,
      sex:           self.sex.as_deref().map(decode_sex).transpose()?,
      phone:         self.phone,
      email:         self.email,
      address:       self.address,
      status:        decode_status(&self.status)?,
    })
  }
}

pub struct RawFaculty {
  id:              i64,
  person:          RawPerson,
  position:        String,
  department_id:   Option<i64>,
  department_name: Option<String>,
  stamps:          Stamps,
}

impl Table for RawFaculty {
  type Record = Faculty;

  const KIND: EntityKind = EntityKind::Faculty;
  const COLUMNS: &'static str = "t.id, \
     t.first_name, t.middle_name, t.last_name, t.suffix, t.date_of_birth, \
     t.sex, t.phone, t.email, t.address, t.status, \
     t.position, t.department_id, d.name, \
     t.created_at, t.updated_at, t.archived_at";
  const FROM: &'static str = "faculties t LEFT JOIN departments d ON d.id = t.department_id";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    let at = 1 + RawPerson::WIDTH;
    Ok(Self {
      id:              row.get(0)?,
      person:          RawPerson::from_row(row, 1)?,
      position:        row.get(at)?,
      department_id:   row.get(at + 1)?,
      department_name: row.get(at + 2)?,
      stamps:          Stamps::from_row(row, at + 3)?,
    })
  }

  fn decode(self) -> Result<Faculty> {
    let (created_at, updated_at, archived_at) = self.stamps.decode()?;
    Ok(Faculty {
      id: self.id,
      person: self.person.decode()?,
      position: self.position,
      department_id: self.department_id,
      department_name: self.department_name,
      created_at,
      updated_at,
      archived_at,
      state: RecordState::from_marker(archived_at),
    })
  }
}

pub struct RawStudent {
  id:               i64,
  person:           RawPerson,
  department_id:    Option<i64>,
  department_name:  Option<String>,
  course_id:        Option<i64>,
  course_name:      Option<String>,
  academic_year_id: Option<i64>,
  school_year:      Option<String>,
  year_level:       String,
  stamps:           Stamps,
}

impl Table for RawStudent {
  type Record = Student;

  const KIND: EntityKind = EntityKind::Student;
  const COLUMNS: &'static str = "t.id, \
     t.first_name, t.middle_name, t.last_name, t.suffix, t.date_of_birth, \
     t.sex, t.phone, t.email, t.address, t.status, \
     t.department_id, d.name, t.course_id, c.name, t.academic_year_id, y.school_year, \
     t.year_level, t.created_at, t.updated_at, t.archived_at";
  const FROM: &'static str = "students t \
     LEFT JOIN departments d    ON d.id = t.department_id \
     LEFT JOIN courses c        ON c.id = t.course_id \
     LEFT JOIN academic_years y ON y.id = t.academic_year_id";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    let at = 1 + RawPerson::WIDTH;
    Ok(Self {
      id:               row.get(0)?,
      person:           RawPerson::from_row(row, 1)?,
      department_id:    row.get(at)?,
      department_name:  row.get(at + 1)?,
      course_id:        row.get(at + 2)?,
      course_name:      row.get(at + 3)?,
      academic_year_id: row.get(at + 4)?,
      school_year:      row.get(at + 5)?,
      year_level:       row.get(at + 6)?,
      stamps:           Stamps::from_row(row, at + 7)?,
    })
  }

  fn decode(self) -> Result<Student> {
    let (created_at, updated_at, archived_at) = self.stamps.decode()?;
    Ok(Student {
      id: self.id,
      person: self.person.decode()?,
      department_id: self.department_id,
      department_name: self.department_name,
      course_id: self.course_id,
      course_name: self.course_name,
      academic_year_id: self.academic_year_id,
      school_year: self.school_year,
      year_level: self.year_level,
      created_at,
      updated_at,
      archived_at,
      state: RecordState::from_marker(archived_at),
    })
  }
}
