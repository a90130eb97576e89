//! Query-string parameters for listings, turned into a [`ListQuery`].

use registrar_core::{
  entity::EntityKind,
  lifecycle::View,
  person::PersonStatus,
  query::{ListQuery, PageRequest, SortDirection},
  reference::{self, Reference},
  validate::{ValidationErrors, blank_as_none},
};
use serde::Deserialize;

use crate::error::ApiError;

/// `?search=&department=&course=&academic_year=&status=&view=&sort=&direction=&page=&per_page=&stats=`
///
/// Blank values (as sent by HTML forms) mean "not supplied".
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub search:        Option<String>,
  #[serde(default, deserialize_with = "reference::optional")]
  pub department:    Option<Reference>,
  #[serde(default, deserialize_with = "reference::optional")]
  pub course:        Option<Reference>,
  #[serde(default, deserialize_with = "reference::optional")]
  pub academic_year: Option<Reference>,
  #[serde(default)]
  pub status:        Option<String>,
  #[serde(default)]
  pub view:          Option<String>,
  #[serde(default, alias = "sort_by")]
  pub sort:          Option<String>,
  #[serde(default, alias = "sort_direction")]
  pub direction:     Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub page:          Option<u32>,
  #[serde(default, deserialize_with = "blank_as_none")]
  pub per_page:      Option<u32>,
  #[serde(default)]
  pub stats:         Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

impl ListParams {
  pub fn into_query(self, kind: EntityKind) -> Result<ListQuery, ApiError> {
    let mut errors = ValidationErrors::new();

    let explicit_view = non_blank(self.view);
    let legacy_allowed = explicit_view.is_none();
    let mut view = match explicit_view {
      Some(raw) => raw.parse::<View>().unwrap_or_else(|e| {
        errors.add("view", format!("{e}."));
        View::default()
      }),
      None => View::default(),
    };

    // `status` is the person status where the kind has one. Older clients
    // also sent the archive view through it (`status=archived`).
    let mut status = None;
    if let Some(raw) = non_blank(self.status) {
      let person = raw.parse::<PersonStatus>().ok().filter(|_| kind.descriptor().has_status);
      match (person, raw.parse::<View>()) {
        (Some(s), _) => status = Some(s),
        (None, Ok(v)) if legacy_allowed => view = v,
        _ => errors.add("status", "The selected status is invalid."),
      }
    }

    let direction = match non_blank(self.direction) {
      Some(raw) => raw.parse::<SortDirection>().unwrap_or_else(|e| {
        errors.add("direction", e);
        SortDirection::default()
      }),
      None => SortDirection::default(),
    };

    errors.finish()?;

    let page = (self.page.is_some() || self.per_page.is_some())
      .then(|| PageRequest::new(self.page, self.per_page));

    Ok(ListQuery {
      search: non_blank(self.search),
      department: self.department,
      course: self.course,
      academic_year: self.academic_year,
      status,
      view,
      sort: non_blank(self.sort),
      direction,
      page,
      with_stats: self
        .stats
        .is_some_and(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
    })
  }
}

/// `?view=` on single-record reads. Defaults to every record.
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
  #[serde(default)]
  pub view: Option<String>,
}

impl ViewParams {
  pub fn into_view(self) -> Result<View, ApiError> {
    match non_blank(self.view) {
      Some(raw) => raw
        .parse()
        .map_err(|e| ValidationErrors::single("view", format!("{e}.")).into()),
      None => Ok(View::All),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(pairs: &[(&str, &str)]) -> ListParams {
    let mut params = ListParams::default();
    for (key, value) in pairs {
      let value = Some((*value).to_owned());
      match *key {
        "status" => params.status = value,
        "view" => params.view = value,
        "direction" => params.direction = value,
        "search" => params.search = value,
        _ => unreachable!(),
      }
    }
    params
  }

  #[test]
  fn legacy_archived_status_selects_the_archived_view() {
    let q = params(&[("status", "archived")]).into_query(EntityKind::Student).unwrap();
    assert_eq!(q.view, View::Archived);
    assert_eq!(q.status, None);
  }

  #[test]
  fn person_status_wins_for_kinds_that_have_one() {
    let q = params(&[("status", "Inactive")]).into_query(EntityKind::Faculty).unwrap();
    assert_eq!(q.status, Some(PersonStatus::Inactive));
    assert_eq!(q.view, View::Active);
  }

  #[test]
  fn unknown_status_is_a_validation_error() {
    let err = params(&[("status", "graduated")]).into_query(EntityKind::Student).unwrap_err();
    assert!(matches!(err, ApiError::Validation(e) if e.contains("status")));
  }

  #[test]
  fn blank_values_are_ignored() {
    let q = params(&[("search", "  "), ("view", ""), ("direction", "")])
      .into_query(EntityKind::Course)
      .unwrap();
    assert_eq!(q.search, None);
    assert_eq!(q.view, View::Active);
    assert!(q.page.is_none());
  }

  #[test]
  fn paging_is_opt_in() {
    let q = ListParams { per_page: Some(500), ..ListParams::default() }
      .into_query(EntityKind::Department)
      .unwrap();
    let page = q.page.unwrap();
    assert_eq!(page.page(), 1);
    assert_eq!(page.per_page(), 100);
  }

  #[test]
  fn single_reads_default_to_all() {
    assert_eq!(ViewParams::default().into_view().unwrap(), View::All);
  }
}
