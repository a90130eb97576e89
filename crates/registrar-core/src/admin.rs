//! Administrator accounts and their bearer-token sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  validate::{MAX_TEXT, ValidationErrors},
};

/// Shortest accepted password.
pub const MIN_PASSWORD: usize = 6;

/// An administrator, as returned to clients. The password hash never leaves
/// the store except through
/// [`AdminStore::find_admin_credentials`](crate::store::AdminStore::find_admin_credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
  pub id:         i64,
  pub name:       String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
  pub name:          String,
  pub email:         String,
  /// PHC-format hash; hashing is the caller's concern.
  pub password_hash: String,
}

impl NewAdmin {
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::new();
    errors.required_text("name", &self.name, MAX_TEXT);
    errors.email("email", &self.email);
    errors.finish()
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminPatch {
  #[serde(default)]
  pub name:  Option<String>,
  #[serde(default)]
  pub email: Option<String>,
}

impl AdminPatch {
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = &self.name {
      errors.required_text("name", name, MAX_TEXT);
    }
    if let Some(email) = &self.email {
      errors.email("email", email);
    }
    errors.finish()
  }
}

/// Body of a password change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChange {
  #[serde(default)]
  pub current_password:          String,
  #[serde(default)]
  pub new_password:              String,
  #[serde(default)]
  pub new_password_confirmation: String,
}

impl PasswordChange {
  /// Shape checks; verifying `current_password` needs the stored hash.
  pub fn validate(&self) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if self.current_password.is_empty() {
      errors.add("current_password", "The current password field is required.");
    }
    if self.new_password.chars().count() < MIN_PASSWORD {
      errors.add(
        "new_password",
        format!("The new password field must be at least {MIN_PASSWORD} characters."),
      );
    }
    if self.new_password != self.new_password_confirmation {
      errors.add("new_password", "The new password field confirmation does not match.");
    }
    errors.finish()
  }
}

/// A stored session. Only the digest of the bearer token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_digest: String,
  pub admin_id:     i64,
  pub created_at:   DateTime<Utc>,
  pub expires_at:   DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  #[test]
  fn password_change_rules() {
    let ok = PasswordChange {
      current_password:          "old-secret".into(),
      new_password:              "secret".into(),
      new_password_confirmation: "secret".into(),
    };
    assert!(ok.validate().is_ok());

    let short = PasswordChange {
      new_password: "abc".into(),
      new_password_confirmation: "abd".into(),
      ..ok.clone()
    };
    let crate::Error::Validation(v) = short.validate().unwrap_err() else {
      panic!("expected validation error")
    };
    assert_eq!(v.messages("new_password").len(), 2);
  }

  #[test]
  fn sessions_expire_at_their_deadline() {
    let now = Utc::now();
    let s = Session {
      token_digest: "ab".into(),
      admin_id:     1,
      created_at:   now,
      expires_at:   now + Duration::hours(1),
    };
    assert!(!s.is_expired(now));
    assert!(s.is_expired(now + Duration::hours(1)));
  }
}
