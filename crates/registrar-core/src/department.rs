//! Departments: the top of the organisational hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  lifecycle::RecordState,
  validate::{MAX_TEXT, ValidationErrors, nullable},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  pub id:          i64,
  pub name:        String,
  /// The faculty member heading the department, if any.
  pub head_id:     Option<i64>,
  pub head_name:   Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  pub archived_at: Option<DateTime<Utc>>,
  pub state:       RecordState,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDepartment {
  #[serde(default, alias = "department_name")]
  pub name:    String,
  #[serde(default, alias = "department_head_id")]
  pub head_id: Option<i64>,
}

impl NewDepartment {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: name.into(), head_id: None }
  }

  /// Field checks only; uniqueness and head existence are checked by the
  /// store.
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::new();
    errors.required_text("name", &self.name, MAX_TEXT);
    errors.positive_id("head_id", self.head_id);
    errors.finish()
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentPatch {
  #[serde(default, alias = "department_name")]
  pub name:    Option<String>,
  /// `null` clears the head; an absent field leaves it unchanged.
  #[serde(default, alias = "department_head_id", deserialize_with = "nullable")]
  pub head_id: Option<Option<i64>>,
}

impl DepartmentPatch {
  pub fn apply(self, current: &Department) -> NewDepartment {
    NewDepartment {
      name:    self.name.unwrap_or_else(|| current.name.clone()),
      head_id: self.head_id.unwrap_or(current.head_id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_name_is_rejected() {
    assert!(NewDepartment::named("  ").validate().is_err());
    assert!(NewDepartment::named("Nursing").validate().is_ok());
  }

  #[test]
  fn head_can_be_cleared_with_null() {
    let now = Utc::now();
    let current = Department {
      id:          1,
      name:        "Nursing".into(),
      head_id:     Some(4),
      head_name:   Some("Ana Cruz".into()),
      created_at:  now,
      updated_at:  now,
      archived_at: None,
      state:       RecordState::Active,
    };

    let keep: DepartmentPatch = serde_json::from_str(r#"{"name":"Nursing Dept"}"#).unwrap();
    let merged = keep.apply(&current);
    assert_eq!(merged.name, "Nursing Dept");
    assert_eq!(merged.head_id, Some(4));

    let clear: DepartmentPatch = serde_json::from_str(r#"{"head_id":null}"#).unwrap();
    assert_eq!(clear.apply(&current).head_id, None);
  }

  #[test]
  fn legacy_names_are_accepted() {
    let d: NewDepartment =
      serde_json::from_str(r#"{"department_name":"Arts","department_head_id":2}"#).unwrap();
    assert_eq!(d.name, "Arts");
    assert_eq!(d.head_id, Some(2));
  }
}
