//! Name-or-id reference resolution.
//!
//! Runs on the caller's connection or transaction, so a create-if-missing
//! resolution and the write that depends on it commit or roll back together.

use chrono::{DateTime, Utc};
use registrar_core::{
  entity::EntityKind,
  reference::{Reference, ResolveMode},
  validate::ValidationErrors,
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{Error, Result, encode::encode_dt};

fn invalid(kind: EntityKind) -> Error {
  let mut errors = ValidationErrors::new();
  errors.invalid_reference(kind.field());
  errors.into()
}

pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Resolve `reference` to an active record of `kind`.
///
/// `parent` is the department a course must belong to.
pub fn resolve(
  conn: &Connection,
  kind: EntityKind,
  reference: &Reference,
  parent: Option<i64>,
  mode: ResolveMode,
  now: DateTime<Utc>,
) -> Result<Option<i64>> {
  let found = match reference {
    Reference::ById(id) => find_by_id(conn, kind, *id, parent)?,
    Reference::ByName(name) => find_by_name(conn, kind, name, parent)?,
  };

  match (found, mode, reference) {
    (Some(id), ..) => Ok(Some(id)),
    (None, ResolveMode::ReadOnly, _) => Ok(None),
    (None, ResolveMode::Create, Reference::ById(_)) => Err(invalid(kind)),
    (None, ResolveMode::Create, Reference::ByName(name)) => {
      create_named(conn, kind, name, parent, now).map(Some)
    }
  }
}

fn find_by_id(
  conn: &Connection,
  kind: EntityKind,
  id: i64,
  parent: Option<i64>,
) -> Result<Option<i64>> {
  let table = kind.table();
  let found = match (kind, parent) {
    (EntityKind::Course, Some(department)) => conn
      .query_row(
        "SELECT id FROM courses WHERE id = ?1 AND department_id = ?2 AND archived_at IS NULL",
        params![id, department],
        |row| row.get(0),
      )
      .optional()?,
    _ => conn
      .query_row(
        &format!("SELECT id FROM {table} WHERE id = ?1 AND archived_at IS NULL"),
        [id],
        |row| row.get(0),
      )
      .optional()?,
  };
  Ok(found)
}

fn find_by_name(
  conn: &Connection,
  kind: EntityKind,
  name: &str,
  parent: Option<i64>,
) -> Result<Option<i64>> {
  let Some(column) = kind.descriptor().name_column else {
    return Ok(None);
  };
  let table = kind.table();
  let found = match (kind, parent) {
    (EntityKind::Course, Some(department)) => conn
      .query_row(
        "SELECT id FROM courses
         WHERE name = ?1 AND department_id = ?2 AND archived_at IS NULL",
        params![name, department],
        |row| row.get(0),
      )
      .optional()?,
    _ => conn
      .query_row(
        &format!(
          "SELECT id FROM {table} WHERE {column} = ?1 AND archived_at IS NULL
           ORDER BY id LIMIT 1"
        ),
        [name],
        |row| row.get(0),
      )
      .optional()?,
  };
  Ok(found)
}

/// Create a department, or a course under `parent`, named `name`. Academic
/// years need dates and are never created implicitly.
fn create_named(
  conn: &Connection,
  kind: EntityKind,
  name: &str,
  parent: Option<i64>,
  now: DateTime<Utc>,
) -> Result<i64> {
  let at = encode_dt(now);
  let inserted = match (kind, parent) {
    (EntityKind::Department, _) => conn.execute(
      "INSERT INTO departments (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
      params![name, at],
    ),
    (EntityKind::Course, Some(department)) => conn.execute(
      "INSERT INTO courses (name, department_id, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?3)",
      params![name, department, at],
    ),
    _ => return Err(invalid(kind)),
  };

  match inserted {
    Ok(_) => {
      let id = conn.last_insert_rowid();
      tracing::info!(%kind, id, name, "created {kind} from reference");
      Ok(id)
    }
    // Another writer created it first.
    Err(e) if is_unique_violation(&e) => find_by_name(conn, kind, name, parent)?
      .ok_or_else(|| {
        registrar_core::Error::Conflict(format!("could not create {kind} {name:?}")).into()
      }),
    Err(e) => Err(e.into()),
  }
}
