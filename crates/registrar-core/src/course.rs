//! Courses, each offered by exactly one department.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  lifecycle::RecordState,
  reference::{self, Reference},
  validate::{MAX_TEXT, ValidationErrors},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub id:              i64,
  pub name:            String,
  pub department_id:   i64,
  pub department_name: Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub archived_at:     Option<DateTime<Utc>>,
  pub state:           RecordState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCourse {
  #[serde(default, alias = "course_name")]
  pub name:       String,
  /// Resolved with create-if-missing semantics.
  #[serde(default, alias = "department_id", deserialize_with = "reference::optional")]
  pub department: Option<Reference>,
}

impl NewCourse {
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::new();
    errors.required_text("name", &self.name, MAX_TEXT);
    if self.department.is_none() {
      errors.add("department", "The department field is required.");
    }
    errors.finish()
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
  #[serde(default, alias = "course_name")]
  pub name:       Option<String>,
  #[serde(default, alias = "department_id", deserialize_with = "reference::optional")]
  pub department: Option<Reference>,
}

impl CoursePatch {
  pub fn apply(self, current: &Course) -> NewCourse {
    NewCourse {
      name:       self.name.unwrap_or_else(|| current.name.clone()),
      department: Some(
        self.department.unwrap_or(Reference::ById(current.department_id)),
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn department_is_required() {
    let c = NewCourse { name: "BS Nursing".into(), department: None };
    let crate::Error::Validation(v) = c.validate().unwrap_err() else {
      panic!("expected validation error")
    };
    assert_eq!(v.messages("department"), ["The department field is required."]);
  }

  #[test]
  fn accepts_department_by_name_or_id() {
    let c: NewCourse =
      serde_json::from_str(r#"{"course_name":"BSN","department":"Nursing"}"#).unwrap();
    assert_eq!(c.department, Some(Reference::ByName("Nursing".into())));
    let c: NewCourse =
      serde_json::from_str(r#"{"name":"BSN","department_id":"3"}"#).unwrap();
    assert_eq!(c.department, Some(Reference::ById(3)));
  }
}
