//! Field-level validation producing a `field → messages` map.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{Error, Result};

/// Default upper bound for free-text fields.
pub const MAX_TEXT: usize = 255;

/// Accumulated validation failures, keyed by request field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  pub fn single(field: &str, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

  pub fn messages(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn first_message(&self) -> Option<&str> {
    self.0.values().flatten().next().map(String::as_str)
  }

  /// `Ok(())` if nothing was recorded, otherwise [`Error::Validation`].
  pub fn finish(self) -> Result<()> {
    if self.is_empty() { Ok(()) } else { Err(Error::Validation(self)) }
  }

  // ── Rules ─────────────────────────────────────────────────────────────────

  pub fn required_text(&mut self, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
      self.add(field, format!("The {} field is required.", humanize(field)));
    } else {
      self.max_len(field, value, max);
    }
  }

  pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) {
    if let Some(v) = value {
      self.max_len(field, v, max);
    }
  }

  fn max_len(&mut self, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
      self.add(
        field,
        format!(
          "The {} field must not be greater than {max} characters.",
          humanize(field)
        ),
      );
    }
  }

  pub fn email(&mut self, field: &str, value: &str) {
    if value.trim().is_empty() {
      self.add(field, format!("The {} field is required.", humanize(field)));
      return;
    }
    if !is_email(value) {
      self.add(
        field,
        format!("The {} field must be a valid email address.", humanize(field)),
      );
    }
    self.max_len(field, value, MAX_TEXT);
  }

  pub fn positive_id(&mut self, field: &str, value: Option<i64>) {
    if matches!(value, Some(id) if id <= 0) {
      self.add(field, format!("The selected {} is invalid.", humanize(field)));
    }
  }

  pub fn date_order(
    &mut self,
    field: &str,
    start: NaiveDate,
    end: NaiveDate,
    after: &str,
  ) {
    if end < start {
      self.add(
        field,
        format!(
          "The {} field must be a date after or equal to {}.",
          humanize(field),
          humanize(after)
        ),
      );
    }
  }

  /// Record a uniqueness failure for `field`.
  pub fn taken(&mut self, field: &str) {
    self.add(field, format!("The {} has already been taken.", humanize(field)));
  }

  /// Record an invalid reference for `field`.
  pub fn invalid_reference(&mut self, field: &str) {
    self.add(field, format!("The selected {} is invalid.", humanize(field)));
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let extra = self.0.values().map(Vec::len).sum::<usize>().saturating_sub(1);
    match (self.first_message(), extra) {
      (None, _) => f.write_str("the given data was invalid"),
      (Some(m), 0) => f.write_str(m),
      (Some(m), 1) => write!(f, "{m} (and 1 more error)"),
      (Some(m), n) => write!(f, "{m} (and {n} more errors)"),
    }
  }
}

/// Deserialise an optional text-encoded value, treating blank strings (as
/// sent by HTML forms) like an absent field.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: FromStr,
  T::Err: fmt::Display,
{
  Option::<String>::deserialize(deserializer)?
    .filter(|s| !s.trim().is_empty())
    .map(|s| s.parse().map_err(de::Error::custom))
    .transpose()
}

/// Distinguish an explicit `null` from an absent field in partial updates:
/// with `#[serde(default)]`, absent is `None` and `null` is `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// [`nullable`] for text-encoded fields: `null` and blank strings both clear
/// the stored value.
pub fn blank_as_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: FromStr,
  T::Err: fmt::Display,
{
  blank_as_none(deserializer).map(Some)
}

/// `department_id` → `department id`.
pub fn humanize(field: &str) -> String { field.replace('_', " ") }

fn is_email(value: &str) -> bool {
  let Some((local, domain)) = value.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && !value.chars().any(char::is_whitespace)
    && domain
      .split_once('.')
      .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn required_text_rejects_blank() {
    let mut e = ValidationErrors::new();
    e.required_text("first_name", "   ", MAX_TEXT);
    assert_eq!(e.messages("first_name"), ["The first name field is required."]);
  }

  #[test]
  fn max_length_counts_chars() {
    let mut e = ValidationErrors::new();
    e.required_text("school_year", "2024-2025", 20);
    assert!(e.is_empty());
    e.required_text("school_year", &"x".repeat(21), 20);
    assert_eq!(
      e.first_message(),
      Some("The school year field must not be greater than 20 characters.")
    );
  }

  #[test]
  fn email_shapes() {
    for ok in ["a@b.co", "first.last@school.edu.ph"] {
      let mut e = ValidationErrors::new();
      e.email("email", ok);
      assert!(e.is_empty(), "{ok}");
    }
    for bad in ["", "plain", "@b.co", "a@b", "a@@b.co", "a b@c.de", "a@b."] {
      let mut e = ValidationErrors::new();
      e.email("email", bad);
      assert!(e.contains("email"), "{bad:?}");
    }
  }

  #[test]
  fn date_order_allows_equal_dates() {
    let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut e = ValidationErrors::new();
    e.date_order("end_date", d, d, "start_date");
    assert!(e.is_empty());
    e.date_order("end_date", d, d.pred_opt().unwrap(), "start_date");
    assert_eq!(
      e.first_message(),
      Some("The end date field must be a date after or equal to start date.")
    );
  }

  #[test]
  fn finish_wraps_into_error() {
    assert!(ValidationErrors::new().finish().is_ok());
    let err = ValidationErrors::single("name", "bad").finish().unwrap_err();
    assert!(matches!(err, Error::Validation(ref v) if v.messages("name") == ["bad"]));
  }

  #[test]
  fn serialises_as_plain_map() {
    let e = ValidationErrors::single("name", "The name has already been taken.");
    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json, serde_json::json!({ "name": ["The name has already been taken."] }));
  }
}
