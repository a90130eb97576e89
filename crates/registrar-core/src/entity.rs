//! Entity descriptors: the parameters of the generic archive service.
//!
//! Every resource shares one lifecycle, one resolver and one list builder.
//! What differs between them (table, unique fields, searchable columns,
//! relations) is captured here as static data so backends never branch on a
//! concrete record type.
//!
//! Column names are qualified with the aliases backends use when assembling
//! queries: `t` is the entity's own table, `d` the joined department, `c` the
//! joined course, `y` the joined academic year and `h` a department head.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The five record families managed by the registrar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  Department,
  Course,
  Faculty,
  Student,
  AcademicYear,
}

impl EntityKind {
  pub const ALL: [EntityKind; 5] = [
    Self::Department,
    Self::Course,
    Self::Faculty,
    Self::Student,
    Self::AcademicYear,
  ];

  pub fn descriptor(self) -> &'static EntityDescriptor {
    match self {
      Self::Department => &DEPARTMENT,
      Self::Course => &COURSE,
      Self::Faculty => &FACULTY,
      Self::Student => &STUDENT,
      Self::AcademicYear => &ACADEMIC_YEAR,
    }
  }

  /// Lower-case singular label used in messages, e.g. `"academic year"`.
  pub fn label(self) -> &'static str { self.descriptor().label }

  /// Capitalised label for the start of a sentence, e.g. `"Academic year"`.
  pub fn title(self) -> &'static str { self.descriptor().title }

  /// The URL path segment of the resource collection.
  pub fn path(self) -> &'static str { self.descriptor().path }

  pub fn from_path(path: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.path() == path)
  }

  pub fn table(self) -> &'static str { self.descriptor().table }

  /// The request field that carries a reference to this kind, e.g.
  /// `"academic_year"`.
  pub fn field(self) -> &'static str {
    match self {
      Self::Department => "department",
      Self::Course => "course",
      Self::Faculty => "faculty",
      Self::Student => "student",
      Self::AcademicYear => "academic_year",
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// ─── Descriptor ──────────────────────────────────────────────────────────────

/// A field whose value must be unique among active records, optionally within
/// a partition (e.g. course names are unique per department).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueRule {
  /// Column name; also the request field that receives the error message.
  pub field: &'static str,
  pub scope: Option<&'static str>,
}

/// A foreign key that listings can filter on and search through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
  pub target: EntityKind,
  /// Foreign-key column on the owning table.
  pub column: &'static str,
}

#[derive(Debug)]
pub struct EntityDescriptor {
  pub kind:        EntityKind,
  pub table:       &'static str,
  pub label:       &'static str,
  pub title:       &'static str,
  pub path:        &'static str,
  /// Column matched by name references; `None` means the kind can only be
  /// referenced by id.
  pub name_column: Option<&'static str>,
  pub unique:      &'static [UniqueRule],
  /// Qualified columns searched with a case-insensitive substring match.
  pub searchable:  &'static [&'static str],
  /// Sort keys accepted from callers, mapped to qualified columns.
  pub sortable:    &'static [(&'static str, &'static str)],
  pub relations:   &'static [Relation],
  /// Whether the kind carries an Active/Inactive status column.
  pub has_status:  bool,
}

impl EntityDescriptor {
  pub fn relation(&self, target: EntityKind) -> Option<&Relation> {
    self.relations.iter().find(|r| r.target == target)
  }

  pub fn sort_column(&self, key: &str) -> Option<&'static str> {
    self
      .sortable
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, column)| *column)
  }
}

static DEPARTMENT: EntityDescriptor = EntityDescriptor {
  kind:        EntityKind::Department,
  table:       "departments",
  label:       "department",
  title:       "Department",
  path:        "departments",
  name_column: Some("name"),
  unique:      &[UniqueRule { field: "name", scope: None }],
  searchable:  &["t.name"],
  sortable:    &[
    ("id", "t.id"),
    ("created_at", "t.created_at"),
    ("updated_at", "t.updated_at"),
    ("name", "t.name"),
  ],
  relations:   &[],
  has_status:  false,
};

static COURSE: EntityDescriptor = EntityDescriptor {
  kind:        EntityKind::Course,
  table:       "courses",
  label:       "course",
  title:       "Course",
  path:        "courses",
  name_column: Some("name"),
  unique:      &[UniqueRule { field: "name", scope: Some("department_id") }],
  searchable:  &["t.name", "d.name"],
  sortable:    &[
    ("id", "t.id"),
    ("created_at", "t.created_at"),
    ("updated_at", "t.updated_at"),
    ("name", "t.name"),
    ("department", "d.name"),
  ],
  relations:   &[Relation {
    target: EntityKind::Department,
    column: "department_id",
  }],
  has_status:  false,
};

static FACULTY: EntityDescriptor = EntityDescriptor {
  kind:        EntityKind::Faculty,
  table:       "faculties",
  label:       "faculty",
  title:       "Faculty",
  path:        "faculties",
  name_column: None,
  unique:      &[UniqueRule { field: "email", scope: None }],
  searchable:  &[
    "t.first_name",
    "t.middle_name",
    "t.last_name",
    "t.email",
    "t.position",
    "d.name",
  ],
  sortable:    &[
    ("id", "t.id"),
    ("created_at", "t.created_at"),
    ("updated_at", "t.updated_at"),
    ("first_name", "t.first_name"),
    ("last_name", "t.last_name"),
    ("email", "t.email"),
    ("position", "t.position"),
    ("status", "t.status"),
    ("department", "d.name"),
  ],
  relations:   &[Relation {
    target: EntityKind::Department,
    column: "department_id",
  }],
  has_status:  true,
};

static STUDENT: EntityDescriptor = EntityDescriptor {
  kind:        EntityKind::Student,
  table:       "students",
  label:       "student",
  title:       "Student",
  path:        "students",
  name_column: None,
  unique:      &[UniqueRule { field: "email", scope: None }],
  searchable:  &[
    "t.first_name",
    "t.middle_name",
    "t.last_name",
    "t.email",
    "d.name",
    "c.name",
  ],
  sortable:    &[
    ("id", "t.id"),
    ("created_at", "t.created_at"),
    ("updated_at", "t.updated_at"),
    ("first_name", "t.first_name"),
    ("last_name", "t.last_name"),
    ("email", "t.email"),
    ("year_level", "t.year_level"),
    ("status", "t.status"),
    ("department", "d.name"),
    ("course", "c.name"),
  ],
  relations:   &[
    Relation {
      target: EntityKind::Department,
      column: "department_id",
    },
    Relation {
      target: EntityKind::Course,
      column: "course_id",
    },
    Relation {
      target: EntityKind::AcademicYear,
      column: "academic_year_id",
    },
  ],
  has_status:  true,
};

static ACADEMIC_YEAR: EntityDescriptor = EntityDescriptor {
  kind:        EntityKind::AcademicYear,
  table:       "academic_years",
  label:       "academic year",
  title:       "Academic year",
  path:        "academic-years",
  name_column: Some("school_year"),
  unique:      &[UniqueRule { field: "school_year", scope: None }],
  searchable:  &["t.school_year"],
  sortable:    &[
    ("id", "t.id"),
    ("created_at", "t.created_at"),
    ("updated_at", "t.updated_at"),
    ("school_year", "t.school_year"),
    ("start_date", "t.start_date"),
    ("end_date", "t.end_date"),
  ],
  relations:   &[],
  has_status:  false,
};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn paths_round_trip() {
    for kind in EntityKind::ALL {
      assert_eq!(EntityKind::from_path(kind.path()), Some(kind));
      assert_eq!(kind.descriptor().kind, kind);
    }
    assert_eq!(EntityKind::from_path("teachers"), None);
  }

  #[test]
  fn course_names_are_unique_per_department() {
    let rule = EntityKind::Course.descriptor().unique[0];
    assert_eq!(rule.field, "name");
    assert_eq!(rule.scope, Some("department_id"));
  }

  #[test]
  fn sort_keys_map_to_whitelisted_columns() {
    let student = EntityKind::Student.descriptor();
    assert_eq!(student.sort_column("created_at"), Some("t.created_at"));
    assert_eq!(student.sort_column("course"), Some("c.name"));
    assert_eq!(student.sort_column("created_at; DROP TABLE students"), None);
  }

  #[test]
  fn only_students_relate_to_academic_years() {
    for kind in EntityKind::ALL {
      let has = kind.descriptor().relation(EntityKind::AcademicYear).is_some();
      assert_eq!(has, kind == EntityKind::Student, "{kind}");
    }
  }
}
