//! Archive, restore and purge, parameterised by [`EntityKind`].

use chrono::{DateTime, Utc};
use registrar_core::{
  Error as CoreError,
  entity::EntityKind,
  lifecycle::{LifecycleEvent, LifecycleOp, RecordState},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{Result, encode::encode_dt};

fn current_state(conn: &Connection, kind: EntityKind, id: i64) -> Result<Option<RecordState>> {
  let marker: Option<Option<String>> = conn
    .query_row(
      &format!("SELECT archived_at FROM {} WHERE id = ?1", kind.table()),
      [id],
      |row| row.get(0),
    )
    .optional()?;
  Ok(marker.map(|m| if m.is_some() { RecordState::Archived } else { RecordState::Active }))
}

/// The first unique field of record `id` that another active record already
/// holds (within the same scope, if the rule is scoped).
pub fn restore_conflict(
  conn: &Connection,
  kind: EntityKind,
  id: i64,
) -> Result<Option<&'static str>> {
  let table = kind.table();
  for rule in kind.descriptor().unique {
    let scope = rule
      .scope
      .map(|s| format!(" AND o.{s} IS r.{s}"))
      .unwrap_or_default();
    let sql = format!(
      "SELECT 1 FROM {table} o JOIN {table} r ON r.id = ?1
       WHERE o.archived_at IS NULL AND o.id != r.id AND o.{field} = r.{field}{scope}
       LIMIT 1",
      field = rule.field,
    );
    let clash: Option<i64> = conn.query_row(&sql, [id], |row| row.get(0)).optional()?;
    if clash.is_some() {
      return Ok(Some(rule.field));
    }
  }
  Ok(None)
}

/// Apply `op` to record `id` of `kind`.
pub fn transition(
  conn: &Connection,
  kind: EntityKind,
  id: i64,
  op: LifecycleOp,
  now: DateTime<Utc>,
) -> Result<LifecycleEvent> {
  op.check(kind, id, current_state(conn, kind, id)?)?;
  let table = kind.table();

  match op {
    LifecycleOp::Archive => {
      // A year's current flag survives archiving; `current_academic_year`
      // only considers active rows.
      conn.execute(
        &format!("UPDATE {table} SET archived_at = ?1 WHERE id = ?2"),
        params![encode_dt(now), id],
      )?;
    }
    LifecycleOp::Restore => {
      if let Some(field) = restore_conflict(conn, kind, id)? {
        return Err(
          CoreError::Conflict(format!(
            "Cannot restore {}: another active {} has the same {}.",
            kind.label(),
            kind.label(),
            field.replace('_', " "),
          ))
          .into(),
        );
      }
      conn.execute(&format!("UPDATE {table} SET archived_at = NULL WHERE id = ?1"), [id])?;
    }
    LifecycleOp::Purge => {
      conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
    }
  }

  let event = LifecycleEvent { kind, id, op, at: now };
  tracing::info!(%kind, id, ?op, "{}", event.message());
  Ok(event)
}
