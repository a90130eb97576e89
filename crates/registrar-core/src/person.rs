//! Faculty and students, the two person-shaped records.
//!
//! Both carry the same personal details (structured name, contact fields,
//! Active/Inactive status); they differ in their organisational links.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  lifecycle::RecordState,
  reference::{self, Reference},
  validate::{MAX_TEXT, ValidationErrors, blank_as_none, blank_as_null},
};

// ─── Shared value types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
  #[serde(alias = "male", alias = "M")]
  Male,
  #[serde(alias = "female", alias = "F")]
  Female,
}

/// Employment status for faculty, enrolment status for students. Independent
/// of the archive lifecycle: an inactive record is still an active row.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum PersonStatus {
  #[default]
  #[serde(alias = "active")]
  Active,
  #[serde(alias = "inactive")]
  Inactive,
}

impl PersonStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "Active",
      Self::Inactive => "Inactive",
    }
  }
}

impl fmt::Display for PersonStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PersonStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "active" => Ok(Self::Active),
      "inactive" => Ok(Self::Inactive),
      other => Err(format!("unknown status {other:?}")),
    }
  }
}

/// Personal details common to faculty and students. Accepts the legacy form
/// field names (`f_name`, `email_address`, …) as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonDetails {
  #[serde(default, alias = "f_name")]
  pub first_name:    String,
  #[serde(default, alias = "m_name", deserialize_with = "blank_as_none")]
  pub middle_name:   Option<String>,
  #[serde(default, alias = "l_name")]
  pub last_name:     String,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub suffix:        Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub date_of_birth: Option<NaiveDate>,
  #[serde(default)]
  pub sex:           Option<Sex>,
  #[serde(default, alias = "phone_number", deserialize_with = "blank_as_none")]
  pub phone:         Option<String>,
  #[serde(default, alias = "email_address")]
  pub email:         String,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub address:       Option<String>,
  #[serde(default)]
  pub status:        PersonStatus,
}

impl PersonDetails {
  /// "First Middle Last Suffix", skipping absent parts.
  pub fn full_name(&self) -> String {
    [
      Some(self.first_name.as_str()),
      self.middle_name.as_deref(),
      Some(self.last_name.as_str()),
      self.suffix.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
  }

  pub fn validate_into(&self, errors: &mut ValidationErrors) {
    errors.required_text("first_name", &self.first_name, MAX_TEXT);
    errors.optional_text("middle_name", self.middle_name.as_deref(), MAX_TEXT);
    errors.required_text("last_name", &self.last_name, MAX_TEXT);
    errors.optional_text("suffix", self.suffix.as_deref(), 20);
    errors.optional_text("phone", self.phone.as_deref(), 50);
    errors.email("email", &self.email);
    errors.optional_text("address", self.address.as_deref(), MAX_TEXT);
    if self.date_of_birth.is_some_and(|dob| dob > Utc::now().date_naive()) {
      errors.add("date_of_birth", "The date of birth must be a date before today.");
    }
  }
}

/// Partial update of [`PersonDetails`]; absent fields are left unchanged and
/// optional fields sent as `null` or blank are cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonPatch {
  #[serde(default, alias = "f_name")]
  pub first_name:    Option<String>,
  #[serde(default, alias = "m_name", deserialize_with = "blank_as_null")]
  pub middle_name:   Option<Option<String>>,
  #[serde(default, alias = "l_name")]
  pub last_name:     Option<String>,
  #[serde(default, deserialize_with = "blank_as_null")]
  pub suffix:        Option<Option<String>>,
  #[serde(default, deserialize_with = "blank_as_null")]
  pub date_of_birth: Option<Option<NaiveDate>>,
  #[serde(default)]
  pub sex:           Option<Sex>,
  #[serde(default, alias = "phone_number", deserialize_with = "blank_as_null")]
  pub phone:         Option<Option<String>>,
  #[serde(default, alias = "email_address")]
  pub email:         Option<String>,
  #[serde(default, deserialize_with = "blank_as_null")]
  pub address:       Option<Option<String>>,
  #[serde(default)]
  pub status:        Option<PersonStatus>,
}

impl PersonPatch {
  pub fn apply(self, current: &PersonDetails) -> PersonDetails {
    let c = current.clone();
    PersonDetails {
      first_name:    self.first_name.unwrap_or(c.first_name),
      middle_name:   self.middle_name.unwrap_or(c.middle_name),
      last_name:     self.last_name.unwrap_or(c.last_name),
      suffix:        self.suffix.unwrap_or(c.suffix),
      date_of_birth: self.date_of_birth.unwrap_or(c.date_of_birth),
      sex:           self.sex.or(c.sex),
      phone:         self.phone.unwrap_or(c.phone),
      email:         self.email.unwrap_or(c.email),
      address:       self.address.unwrap_or(c.address),
      status:        self.status.unwrap_or(c.status),
    }
  }
}

// ─── Faculty ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
  pub id:              i64,
  #[serde(flatten)]
  pub person:          PersonDetails,
  pub position:        String,
  pub department_id:   Option<i64>,
  pub department_name: Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub archived_at:     Option<DateTime<Utc>>,
  pub state:           RecordState,
}

/// Input to [`crate::store::RegistryStore::create_faculty`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFaculty {
  #[serde(flatten)]
  pub person:     PersonDetails,
  #[serde(default)]
  pub position:   String,
  /// Resolved with create-if-missing semantics.
  #[serde(default, alias = "department_id", deserialize_with = "reference::optional")]
  pub department: Option<Reference>,
}

impl NewFaculty {
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::new();
    self.person.validate_into(&mut errors);
    errors.required_text("position", &self.position, MAX_TEXT);
    errors.finish()
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacultyPatch {
  #[serde(flatten)]
  pub person:     PersonPatch,
  #[serde(default)]
  pub position:   Option<String>,
  #[serde(default, alias = "department_id", deserialize_with = "reference::optional")]
  pub department: Option<Reference>,
}

impl FacultyPatch {
  /// Merge onto the stored record, producing a full candidate to validate.
  pub fn apply(self, current: &Faculty) -> NewFaculty {
    NewFaculty {
      person:     self.person.apply(&current.person),
      position:   self.position.unwrap_or_else(|| current.position.clone()),
      department: self
        .department
        .or_else(|| current.department_id.map(Reference::ById)),
    }
  }
}

// ─── Student ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub id:               i64,
  #[serde(flatten)]
  pub person:           PersonDetails,
  pub department_id:    Option<i64>,
  pub department_name:  Option<String>,
  pub course_id:        Option<i64>,
  pub course_name:      Option<String>,
  pub academic_year_id: Option<i64>,
  pub school_year:      Option<String>,
  pub year_level:       String,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
  pub archived_at:      Option<DateTime<Utc>>,
  pub state:            RecordState,
}

/// Input to [`crate::store::RegistryStore::create_student`].
///
/// `department` and `course` are resolved with create-if-missing semantics
/// (a course name is looked up within the resolved department);
/// `academic_year` must already exist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStudent {
  #[serde(flatten)]
  pub person:        PersonDetails,
  #[serde(default, alias = "department_id", deserialize_with = "reference::optional")]
  pub department:    Option<Reference>,
  #[serde(default, alias = "course_id", deserialize_with = "reference::optional")]
  pub course:        Option<Reference>,
  #[serde(default, alias = "academic_year_id", deserialize_with = "reference::optional")]
  pub academic_year: Option<Reference>,
  #[serde(default, alias = "year_level_id")]
  pub year_level:    String,
}

impl NewStudent {
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::new();
    self.person.validate_into(&mut errors);
    for (field, value) in [
      ("department", &self.department),
      ("course", &self.course),
      ("academic_year", &self.academic_year),
    ] {
      if value.is_none() {
        errors.add(field, format!("The {} field is required.", field.replace('_', " ")));
      }
    }
    errors.required_text("year_level", &self.year_level, 50);
    errors.finish()
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
  #[serde(flatten)]
  pub person:        PersonPatch,
  #[serde(default, alias = "department_id", deserialize_with = "reference::optional")]
  pub department:    Option<Reference>,
  #[serde(default, alias = "course_id", deserialize_with = "reference::optional")]
  pub course:        Option<Reference>,
  #[serde(default, alias = "academic_year_id", deserialize_with = "reference::optional")]
  pub academic_year: Option<Reference>,
  #[serde(default, alias = "year_level_id")]
  pub year_level:    Option<String>,
}

impl StudentPatch {
  pub fn apply(self, current: &Student) -> NewStudent {
    NewStudent {
      person:        self.person.apply(&current.person),
      department:    self
        .department
        .or_else(|| current.department_id.map(Reference::ById)),
      course:        self.course.or_else(|| current.course_id.map(Reference::ById)),
      academic_year: self
        .academic_year
        .or_else(|| current.academic_year_id.map(Reference::ById)),
      year_level:    self.year_level.unwrap_or_else(|| current.year_level.clone()),
    }
  }
}
