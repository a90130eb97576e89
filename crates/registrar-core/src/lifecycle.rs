//! The archive lifecycle shared by every record kind.
//!
//! A record is `Active` until archived, `Archived` until restored or purged,
//! and gone once purged. The soft-delete marker (`archived_at`) is the storage
//! encoding; [`RecordState`] is the state the rest of the system reasons
//! about.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, entity::EntityKind};

// ─── States ──────────────────────────────────────────────────────────────────

/// The recoverable states of a stored record. Purged records have no state;
/// they no longer exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
  Active,
  Archived,
}

impl RecordState {
  pub fn from_marker(archived_at: Option<DateTime<Utc>>) -> Self {
    match archived_at {
      Some(_) => Self::Archived,
      None => Self::Active,
    }
  }

  pub fn is_active(self) -> bool { matches!(self, Self::Active) }
}

// ─── View selector ───────────────────────────────────────────────────────────

/// Which records a read considers.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum View {
  #[default]
  Active,
  Archived,
  All,
}

impl View {
  pub fn admits(self, state: RecordState) -> bool {
    match self {
      Self::Active => state == RecordState::Active,
      Self::Archived => state == RecordState::Archived,
      Self::All => true,
    }
  }
}

impl fmt::Display for View {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Active => "active",
      Self::Archived => "archived",
      Self::All => "all",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownView(pub String);

impl fmt::Display for UnknownView {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown view {:?}; expected active, archived or all", self.0)
  }
}

impl std::error::Error for UnknownView {}

impl FromStr for View {
  type Err = UnknownView;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "active" => Ok(Self::Active),
      "archived" | "trashed" => Ok(Self::Archived),
      "all" => Ok(Self::All),
      _ => Err(UnknownView(s.to_owned())),
    }
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleOp {
  Archive,
  Restore,
  Purge,
}

impl LifecycleOp {
  /// The only state from which the operation may start. Purge requires a
  /// prior archive for every kind.
  pub fn requires(self) -> RecordState {
    match self {
      Self::Archive => RecordState::Active,
      Self::Restore | Self::Purge => RecordState::Archived,
    }
  }

  /// The resulting state; `None` once the record is purged.
  pub fn yields(self) -> Option<RecordState> {
    match self {
      Self::Archive => Some(RecordState::Archived),
      Self::Restore => Some(RecordState::Active),
      Self::Purge => None,
    }
  }

  /// The view the operation looks the record up in.
  pub fn lookup_view(self) -> View {
    match self.requires() {
      RecordState::Active => View::Active,
      RecordState::Archived => View::Archived,
    }
  }

  pub fn past_tense(self) -> &'static str {
    match self {
      Self::Archive => "archived",
      Self::Restore => "restored",
      Self::Purge => "permanently deleted",
    }
  }

  /// Validate the transition for a record currently in `current` (`None`
  /// when no row exists). A record outside the lookup view is reported as
  /// not found, exactly like a missing one.
  pub fn check(
    self,
    kind: EntityKind,
    id: i64,
    current: Option<RecordState>,
  ) -> Result<Option<RecordState>> {
    match current {
      Some(state) if state == self.requires() => Ok(self.yields()),
      _ => Err(Error::not_found(kind, id, self.lookup_view())),
    }
  }
}

/// The outcome of a successful lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
  pub kind: EntityKind,
  pub id:   i64,
  pub op:   LifecycleOp,
  pub at:   DateTime<Utc>,
}

impl LifecycleEvent {
  pub fn new(kind: EntityKind, id: i64, op: LifecycleOp) -> Self {
    Self { kind, id, op, at: Utc::now() }
  }

  /// Human-readable confirmation, e.g. "Student archived successfully".
  pub fn message(&self) -> String {
    match self.op {
      LifecycleOp::Purge => {
        format!("{} {}", self.kind.title(), self.op.past_tense())
      }
      _ => format!("{} {} successfully", self.kind.title(), self.op.past_tense()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn archive_requires_active() {
    let ok = LifecycleOp::Archive.check(EntityKind::Student, 1, Some(RecordState::Active));
    assert_eq!(ok.unwrap(), Some(RecordState::Archived));

    let err = LifecycleOp::Archive
      .check(EntityKind::Student, 1, Some(RecordState::Archived))
      .unwrap_err();
    assert!(matches!(
      err,
      Error::NotFound { scope: View::Active, id: 1, kind: EntityKind::Student }
    ));
  }

  #[test]
  fn restore_requires_archived() {
    assert!(
      LifecycleOp::Restore
        .check(EntityKind::Course, 4, Some(RecordState::Active))
        .is_err()
    );
    assert_eq!(
      LifecycleOp::Restore
        .check(EntityKind::Course, 4, Some(RecordState::Archived))
        .unwrap(),
      Some(RecordState::Active)
    );
  }

  #[test]
  fn purge_is_archive_first_and_terminal() {
    let err = LifecycleOp::Purge
      .check(EntityKind::Faculty, 9, Some(RecordState::Active))
      .unwrap_err();
    assert!(matches!(err, Error::NotFound { scope: View::Archived, .. }));

    let out = LifecycleOp::Purge
      .check(EntityKind::Faculty, 9, Some(RecordState::Archived))
      .unwrap();
    assert_eq!(out, None);
  }

  #[test]
  fn missing_records_are_not_found_for_every_op() {
    for op in [LifecycleOp::Archive, LifecycleOp::Restore, LifecycleOp::Purge] {
      assert!(op.check(EntityKind::Department, 77, None).is_err());
    }
  }

  #[test]
  fn views_admit_matching_states() {
    assert!(View::Active.admits(RecordState::Active));
    assert!(!View::Active.admits(RecordState::Archived));
    assert!(View::Archived.admits(RecordState::Archived));
    assert!(!View::Archived.admits(RecordState::Active));
    assert!(View::All.admits(RecordState::Archived));
  }

  #[test]
  fn view_parses_case_insensitively() {
    assert_eq!("ARCHIVED".parse::<View>().unwrap(), View::Archived);
    assert_eq!("all".parse::<View>().unwrap(), View::All);
    assert!("deleted".parse::<View>().is_err());
  }

  #[test]
  fn event_messages() {
    let e = LifecycleEvent::new(EntityKind::AcademicYear, 2, LifecycleOp::Restore);
    assert_eq!(e.message(), "Academic year restored successfully");
    let e = LifecycleEvent::new(EntityKind::Student, 2, LifecycleOp::Purge);
    assert_eq!(e.message(), "Student permanently deleted");
  }
}
