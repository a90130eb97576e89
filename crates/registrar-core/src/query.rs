//! List queries and their results.
//!
//! A [`ListQuery`] combines free-text search, exact filters, the lifecycle
//! [`View`], sorting, pagination and an optional statistics block. It is
//! validated against an [`EntityKind`] before a backend sees it, so backends
//! only ever receive filters and sort keys the kind supports.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  entity::EntityKind,
  lifecycle::View,
  person::PersonStatus,
  reference::Reference,
  validate::ValidationErrors,
};

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Sort key used when the caller names none.
pub const DEFAULT_SORT: &str = "created_at";

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

impl SortDirection {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

impl FromStr for SortDirection {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "asc" => Ok(Self::Asc),
      "desc" => Ok(Self::Desc),
      other => Err(format!("unknown sort direction {other:?}")),
    }
  }
}

impl fmt::Display for SortDirection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Asc => "asc",
      Self::Desc => "desc",
    })
  }
}

// ─── Pagination ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  page:     u32,
  per_page: u32,
}

impl PageRequest {
  /// Normalise caller input: `page` is at least 1, `per_page` defaults to
  /// [`DEFAULT_PER_PAGE`] and is clamped to `1..=MAX_PER_PAGE`.
  pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
    Self {
      page:     page.unwrap_or(1).max(1),
      per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
    }
  }

  pub fn page(&self) -> u32 { self.page }

  pub fn per_page(&self) -> u32 { self.per_page }

  pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.per_page) }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(None, None) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
  pub page:      u32,
  pub per_page:  u32,
  pub total:     u64,
  pub last_page: u64,
}

impl PageMeta {
  pub fn new(request: PageRequest, total: u64) -> Self {
    let per_page = u64::from(request.per_page);
    Self {
      page: request.page,
      per_page: request.per_page,
      total,
      last_page: total.div_ceil(per_page).max(1),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for the `list_*` methods of
/// [`RegistryStore`](crate::store::RegistryStore).
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
  /// Case-insensitive substring over the kind's searchable columns.
  pub search:        Option<String>,
  pub department:    Option<Reference>,
  pub course:        Option<Reference>,
  pub academic_year: Option<Reference>,
  /// Active/Inactive; only for kinds that carry a status.
  pub status:        Option<PersonStatus>,
  pub view:          View,
  /// A key from the kind's sortable list; defaults to [`DEFAULT_SORT`].
  pub sort:          Option<String>,
  pub direction:     SortDirection,
  /// `None` returns every matching row.
  pub page:          Option<PageRequest>,
  pub with_stats:    bool,
}

impl ListQuery {
  pub fn in_view(view: View) -> Self { Self { view, ..Self::default() } }

  /// The trimmed search term, if any is left after trimming.
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }

  /// The qualified column to order by.
  pub fn sort_column(&self, kind: EntityKind) -> &'static str {
    let descriptor = kind.descriptor();
    self
      .sort
      .as_deref()
      .and_then(|key| descriptor.sort_column(key))
      .unwrap_or("t.created_at")
  }

  /// Reject filters and sort keys `kind` does not support.
  pub fn validate_for(&self, kind: EntityKind) -> Result<()> {
    let descriptor = kind.descriptor();
    let mut errors = ValidationErrors::new();
    for (field, value, target) in [
      ("department", &self.department, EntityKind::Department),
      ("course", &self.course, EntityKind::Course),
      ("academic_year", &self.academic_year, EntityKind::AcademicYear),
    ] {
      if value.is_some() && descriptor.relation(target).is_none() {
        errors.add(field, format!("{} cannot be filtered by {}.", plural(kind), target.label()));
      }
    }
    if self.status.is_some() && !descriptor.has_status {
      errors.add("status", format!("{} have no status.", plural(kind)));
    }
    if let Some(key) = self.sort.as_deref() {
      if descriptor.sort_column(key).is_none() {
        errors.add("sort", format!("The sort key {key:?} is not supported."));
      }
    }
    errors.finish()
  }
}

fn plural(kind: EntityKind) -> String {
  match kind {
    EntityKind::Faculty => "Faculty".into(),
    other => format!("{}s", other.title()),
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Active members per department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentCount {
  pub department_id: i64,
  pub department:    String,
  pub count:         u64,
}

/// Collection-wide figures; independent of the query's filters and page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
  pub total:         u64,
  pub active:        u64,
  pub archived:      u64,
  /// Empty for kinds without a department relation.
  pub by_department: Vec<DepartmentCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing<T> {
  pub data:  Vec<T>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub meta:  Option<PageMeta>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub stats: Option<Stats>,
}

impl<T> Listing<T> {
  pub fn empty() -> Self { Self { data: Vec::new(), meta: None, stats: None } }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_request_normalises_input() {
    let p = PageRequest::new(Some(0), Some(500));
    assert_eq!((p.page(), p.per_page()), (1, MAX_PER_PAGE));
    let p = PageRequest::new(Some(3), None);
    assert_eq!((p.page(), p.per_page(), p.offset()), (3, 10, 20));
    assert_eq!(PageRequest::new(None, Some(0)).per_page(), 1);
  }

  #[test]
  fn last_page_is_at_least_one() {
    let req = PageRequest::new(Some(1), Some(10));
    assert_eq!(PageMeta::new(req, 0).last_page, 1);
    assert_eq!(PageMeta::new(req, 10).last_page, 1);
    assert_eq!(PageMeta::new(req, 11).last_page, 2);
  }

  #[test]
  fn unsupported_filters_are_rejected() {
    let q = ListQuery { course: Some(Reference::ById(1)), ..Default::default() };
    assert!(q.validate_for(EntityKind::Student).is_ok());
    let crate::Error::Validation(v) = q.validate_for(EntityKind::Faculty).unwrap_err() else {
      panic!("expected validation error")
    };
    assert!(v.contains("course"));

    let q = ListQuery { status: Some(PersonStatus::Active), ..Default::default() };
    assert!(q.validate_for(EntityKind::Department).is_err());
    assert!(q.validate_for(EntityKind::Faculty).is_ok());
  }

  #[test]
  fn sort_keys_are_whitelisted() {
    let q = ListQuery { sort: Some("name".into()), ..Default::default() };
    assert!(q.validate_for(EntityKind::Course).is_ok());
    assert_eq!(q.sort_column(EntityKind::Course), "t.name");
    assert!(q.validate_for(EntityKind::Student).is_err());
    assert_eq!(ListQuery::default().sort_column(EntityKind::Student), "t.created_at");
  }

  #[test]
  fn blank_search_is_ignored() {
    let q = ListQuery { search: Some("   ".into()), ..Default::default() };
    assert_eq!(q.search_term(), None);
    let q = ListQuery { search: Some(" ana ".into()), ..Default::default() };
    assert_eq!(q.search_term(), Some("ana"));
  }

  #[test]
  fn listing_omits_absent_blocks() {
    let l: Listing<i64> = Listing { data: vec![1], meta: None, stats: None };
    assert_eq!(serde_json::to_value(&l).unwrap(), serde_json::json!({ "data": [1] }));
  }
}
