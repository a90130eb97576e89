//! The list/filter query builder.
//!
//! Every clause is assembled from whitelisted, statically known column names
//! (see [`registrar_core::entity`]); caller-supplied values only ever travel
//! as positional `?` parameters.

use registrar_core::{
  entity::EntityKind,
  lifecycle::View,
  query::{DepartmentCount, ListQuery, Listing, PageMeta, Stats},
  reference::Reference,
};
use rusqlite::{Connection, OptionalExtension as _, params_from_iter, types::Value};

use crate::{Result, encode::Table};

/// `WHERE` predicate for a view over the `t` alias.
pub fn view_clause(view: View) -> Option<&'static str> {
  match view {
    View::Active => Some("t.archived_at IS NULL"),
    View::Archived => Some("t.archived_at IS NOT NULL"),
    View::All => None,
  }
}

/// Escape `LIKE` wildcards so the term matches literally (with `ESCAPE '\'`).
pub fn like_pattern(term: &str) -> String {
  let mut out = String::with_capacity(term.len() + 2);
  out.push('%');
  for ch in term.chars() {
    if matches!(ch, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(ch);
  }
  out.push('%');
  out
}

/// Conjunctive `WHERE` clause plus its parameters.
#[derive(Debug, Default)]
pub struct Filter {
  conds:  Vec<String>,
  params: Vec<Value>,
}

impl Filter {
  pub fn build(kind: EntityKind, query: &ListQuery) -> Self {
    let descriptor = kind.descriptor();
    let mut filter = Self::default();

    if let Some(clause) = view_clause(query.view) {
      filter.conds.push(clause.to_owned());
    }

    if let Some(term) = query.search_term() {
      let pattern = like_pattern(term);
      let ors = descriptor
        .searchable
        .iter()
        .map(|col| format!("{col} LIKE ? ESCAPE '\\'"))
        .collect::<Vec<_>>();
      filter.params.extend(ors.iter().map(|_| Value::Text(pattern.clone())));
      filter.conds.push(format!("({})", ors.join(" OR ")));
    }

    for (target, reference) in [
      (EntityKind::Department, &query.department),
      (EntityKind::Course, &query.course),
      (EntityKind::AcademicYear, &query.academic_year),
    ] {
      let (Some(reference), Some(relation)) = (reference, descriptor.relation(target)) else {
        continue;
      };
      filter.reference(relation.column, target, reference);
    }

    if let Some(status) = query.status {
      filter.conds.push("t.status = ?".to_owned());
      filter.params.push(Value::Text(status.as_str().to_owned()));
    }

    filter
  }

  /// An id matches the column directly; a name matches any active record of
  /// the target with exactly that name. An unknown name matches nothing.
  fn reference(&mut self, column: &str, target: EntityKind, reference: &Reference) {
    match reference {
      Reference::ById(id) => {
        self.conds.push(format!("t.{column} = ?"));
        self.params.push(Value::Integer(*id));
      }
      Reference::ByName(name) => match target.descriptor().name_column {
        Some(name_column) => {
          self.conds.push(format!(
            "t.{column} IN (SELECT id FROM {} WHERE {name_column} = ? AND archived_at IS NULL)",
            target.table()
          ));
          self.params.push(Value::Text(name.clone()));
        }
        None => self.conds.push("0".to_owned()),
      },
    }
  }

  pub fn where_sql(&self) -> String {
    if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    }
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Fetch one record of `T` by id within `view`.
pub fn fetch<T: Table>(conn: &Connection, id: i64, view: View) -> Result<Option<T::Record>> {
  let view = view_clause(view).map(|c| format!(" AND {c}")).unwrap_or_default();
  let sql = format!("SELECT {} FROM {} WHERE t.id = ?1{view}", T::COLUMNS, T::FROM);
  let raw = conn.query_row(&sql, [id], T::from_row).optional()?;
  raw.map(T::decode).transpose()
}

/// Run a [`ListQuery`] against `T`'s table. The query must already have been
/// validated for `T::KIND`.
pub fn list<T: Table>(conn: &Connection, query: &ListQuery) -> Result<Listing<T::Record>> {
  let kind = T::KIND;
  let filter = Filter::build(kind, query);
  let where_sql = filter.where_sql();
  let direction = query.direction.as_sql();

  let mut sql = format!(
    "SELECT {} FROM {} {where_sql} ORDER BY {} {direction}, t.id {direction}",
    T::COLUMNS,
    T::FROM,
    query.sort_column(kind),
  );
  let mut params = filter.params.clone();

  let meta = match query.page {
    Some(page) => {
      let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} {where_sql}", T::FROM),
        params_from_iter(filter.params.iter()),
        |row| row.get(0),
      )?;
      sql.push_str(" LIMIT ? OFFSET ?");
      params.push(Value::Integer(i64::from(page.per_page())));
      params.push(Value::Integer(i64::try_from(page.offset()).unwrap_or(i64::MAX)));
      Some(PageMeta::new(page, total as u64))
    }
    None => None,
  };

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(params.iter()), T::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let data = raws.into_iter().map(T::decode).collect::<Result<Vec<_>>>()?;

  let stats = if query.with_stats { Some(stats(conn, kind)?) } else { None };

  Ok(Listing { data, meta, stats })
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

pub fn count(conn: &Connection, kind: EntityKind, view: View) -> Result<u64> {
  let view = view_clause(view).map(|c| format!(" WHERE {c}")).unwrap_or_default();
  let n: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM {} t{view}", kind.table()),
    [],
    |row| row.get(0),
  )?;
  Ok(n as u64)
}

/// Active members per active department, zero counts included.
pub fn count_by_department(conn: &Connection, kind: EntityKind) -> Result<Vec<DepartmentCount>> {
  let Some(relation) = kind.descriptor().relation(EntityKind::Department) else {
    return Ok(Vec::new());
  };
  let sql = format!(
    "SELECT d.id, d.name, COUNT(t.id)
     FROM departments d
     LEFT JOIN {table} t ON t.{column} = d.id AND t.archived_at IS NULL
     WHERE d.archived_at IS NULL
     GROUP BY d.id, d.name
     ORDER BY d.name, d.id",
    table = kind.table(),
    column = relation.column,
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map([], |row| {
      Ok(DepartmentCount {
        department_id: row.get(0)?,
        department:    row.get(1)?,
        count:         row.get::<_, i64>(2)? as u64,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Whole-collection figures, independent of any filter.
pub fn stats(conn: &Connection, kind: EntityKind) -> Result<Stats> {
  let active = count(conn, kind, View::Active)?;
  let archived = count(conn, kind, View::Archived)?;
  Ok(Stats {
    total: active + archived,
    active,
    archived,
    by_department: count_by_department(conn, kind)?,
  })
}

#[cfg(test)]
mod tests {
  use registrar_core::person::PersonStatus;

  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("ana"), "%ana%");
    assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
  }

  #[test]
  fn filters_compose_conjunctively() {
    let query = ListQuery {
      search: Some("maria".into()),
      department: Some(Reference::ByName("Nursing".into())),
      course: Some(Reference::ById(3)),
      status: Some(PersonStatus::Inactive),
      ..ListQuery::default()
    };
    let filter = Filter::build(EntityKind::Student, &query);
    let sql = filter.where_sql();
    assert!(sql.starts_with("WHERE t.archived_at IS NULL AND ("));
    assert!(sql.contains("t.department_id IN (SELECT id FROM departments WHERE name = ?"));
    assert!(sql.contains("t.course_id = ?"));
    assert!(sql.ends_with("t.status = ?"));
    // six searchable columns, then department, course and status
    assert_eq!(filter.params.len(), 6 + 3);
  }

  #[test]
  fn all_view_without_filters_has_no_where() {
    let filter = Filter::build(EntityKind::Department, &ListQuery::in_view(View::All));
    assert_eq!(filter.where_sql(), "");
  }
}
