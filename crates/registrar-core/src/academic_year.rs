//! Academic years. At most one is flagged as the current year.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  lifecycle::RecordState,
  validate::{ValidationErrors, blank_as_none},
};

/// Longest accepted `school_year` label, e.g. `"2024-2025"`.
pub const MAX_SCHOOL_YEAR: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicYear {
  pub id:          i64,
  pub school_year: String,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
  pub is_active:   bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  pub archived_at: Option<DateTime<Utc>>,
  pub state:       RecordState,
}

impl AcademicYear {
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start_date <= date && date <= self.end_date
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAcademicYear {
  #[serde(default)]
  pub school_year: String,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub start_date:  Option<NaiveDate>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub end_date:    Option<NaiveDate>,
  /// `true` makes this the current year, clearing the flag on every other.
  #[serde(default)]
  pub is_active:   bool,
}

impl NewAcademicYear {
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::new();
    errors.required_text("school_year", &self.school_year, MAX_SCHOOL_YEAR);
    match (self.start_date, self.end_date) {
      (Some(start), Some(end)) => errors.date_order("end_date", start, end, "start_date"),
      (start, end) => {
        if start.is_none() {
          errors.add("start_date", "The start date field is required.");
        }
        if end.is_none() {
          errors.add("end_date", "The end date field is required.");
        }
      }
    }
    errors.finish()
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcademicYearPatch {
  #[serde(default)]
  pub school_year: Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub start_date:  Option<NaiveDate>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub end_date:    Option<NaiveDate>,
  #[serde(default)]
  pub is_active:   Option<bool>,
}

impl AcademicYearPatch {
  pub fn apply(self, current: &AcademicYear) -> NewAcademicYear {
    NewAcademicYear {
      school_year: self.school_year.unwrap_or_else(|| current.school_year.clone()),
      start_date:  Some(self.start_date.unwrap_or(current.start_date)),
      end_date:    Some(self.end_date.unwrap_or(current.end_date)),
      is_active:   self.is_active.unwrap_or(current.is_active),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  #[test]
  fn end_before_start_is_rejected() {
    let y = NewAcademicYear {
      school_year: "2024-2025".into(),
      start_date:  Some(date(2025, 6, 1)),
      end_date:    Some(date(2024, 6, 1)),
      is_active:   false,
    };
    let crate::Error::Validation(v) = y.validate().unwrap_err() else {
      panic!("expected validation error")
    };
    assert!(v.contains("end_date"));
  }

  #[test]
  fn dates_and_label_are_required() {
    let y: NewAcademicYear =
      serde_json::from_str(r#"{"school_year":"","start_date":"","end_date":null}"#).unwrap();
    let crate::Error::Validation(v) = y.validate().unwrap_err() else {
      panic!("expected validation error")
    };
    for field in ["school_year", "start_date", "end_date"] {
      assert!(v.contains(field), "{field}");
    }
  }

  #[test]
  fn label_is_capped_at_twenty_chars() {
    let y = NewAcademicYear {
      school_year: "2024-2025 first semester".into(),
      start_date:  Some(date(2024, 6, 1)),
      end_date:    Some(date(2025, 3, 31)),
      is_active:   false,
    };
    assert!(y.validate().is_err());
  }

  #[test]
  fn parses_iso_dates() {
    let y: NewAcademicYear = serde_json::from_str(
      r#"{"school_year":"2024-2025","start_date":"2024-06-01","end_date":"2025-03-31","is_active":true}"#,
    )
    .unwrap();
    assert!(y.validate().is_ok());
    assert!(y.is_active);
    assert_eq!(y.start_date, Some(date(2024, 6, 1)));
  }
}
