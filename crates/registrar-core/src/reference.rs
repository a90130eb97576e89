//! Name-or-id references to master data.
//!
//! Request fields such as `department` accept either a numeric identifier or
//! a display name. The ambiguity is settled once, at the boundary, by turning
//! the raw value into a [`Reference`]; resolvers then have one unambiguous
//! contract per call.

use std::{fmt, str::FromStr};

use serde::{
  Deserialize, Deserializer, Serialize, Serializer,
  de::{self, Visitor},
};

/// A foreign-key value as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
  ById(i64),
  /// Matched exactly (case-sensitive, no trimming) against the target's name.
  ByName(String),
}

/// How a resolver treats a name with no matching record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
  /// Create the missing record (writes).
  Create,
  /// Report "no match" (filters).
  ReadOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
  Empty,
  NonPositive(i64),
}

impl fmt::Display for ReferenceError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Empty => f.write_str("reference must not be empty"),
      Self::NonPositive(n) => write!(f, "identifier must be positive, got {n}"),
    }
  }
}

impl std::error::Error for ReferenceError {}

impl Reference {
  pub fn id(id: i64) -> Result<Self, ReferenceError> {
    if id > 0 { Ok(Self::ById(id)) } else { Err(ReferenceError::NonPositive(id)) }
  }

  pub fn name(name: impl Into<String>) -> Result<Self, ReferenceError> {
    let name = name.into();
    if name.trim().is_empty() { Err(ReferenceError::Empty) } else { Ok(Self::ByName(name)) }
  }

  /// Classify a textual value. A string that parses as a positive integer is
  /// an id; anything else non-blank is a name, kept verbatim.
  pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
    match raw.parse::<i64>() {
      Ok(n) if n > 0 => Ok(Self::ById(n)),
      _ => Self::name(raw),
    }
  }

  /// Like [`Reference::parse`], but an absent or blank value is "no filter".
  pub fn parse_filter(raw: Option<&str>) -> Option<Self> {
    raw.and_then(|r| Self::parse(r).ok())
  }

  pub fn as_id(&self) -> Option<i64> {
    match self {
      Self::ById(id) => Some(*id),
      Self::ByName(_) => None,
    }
  }
}

impl fmt::Display for Reference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ById(id) => write!(f, "#{id}"),
      Self::ByName(name) => write!(f, "{name:?}"),
    }
  }
}

impl FromStr for Reference {
  type Err = ReferenceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl From<i64> for Reference {
  fn from(id: i64) -> Self { Self::ById(id) }
}

// ─── Serde ───────────────────────────────────────────────────────────────────

impl Serialize for Reference {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::ById(id) => serializer.serialize_i64(*id),
      Self::ByName(name) => serializer.serialize_str(name),
    }
  }
}

impl<'de> Deserialize<'de> for Reference {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(ReferenceVisitor)
  }
}

struct ReferenceVisitor;

impl Visitor<'_> for ReferenceVisitor {
  type Value = Reference;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a positive integer id or a non-empty name")
  }

  fn visit_i64<E: de::Error>(self, v: i64) -> Result<Reference, E> {
    Reference::id(v).map_err(E::custom)
  }

  fn visit_u64<E: de::Error>(self, v: u64) -> Result<Reference, E> {
    let id = i64::try_from(v).map_err(E::custom)?;
    Reference::id(id).map_err(E::custom)
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<Reference, E> {
    Reference::parse(v).map_err(E::custom)
  }
}

/// `deserialize_with` helper for optional reference fields: `null`, a missing
/// field and a blank string all mean "not supplied".
pub fn optional<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<Option<Reference>, D::Error> {
  deserializer.deserialize_option(OptionalVisitor)
}

struct OptionalVisitor;

impl<'de> Visitor<'de> for OptionalVisitor {
  type Value = Option<Reference>;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("an optional id or name")
  }

  fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> { Ok(None) }

  fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> { Ok(None) }

  fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
    d.deserialize_any(self)
  }

  fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
    ReferenceVisitor.visit_i64(v).map(Some)
  }

  fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
    ReferenceVisitor.visit_u64(v).map(Some)
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
    if v.trim().is_empty() {
      return Ok(None);
    }
    ReferenceVisitor.visit_str(v).map(Some)
  }
}
