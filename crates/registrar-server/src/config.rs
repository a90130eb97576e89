//! Runtime configuration, layered from `registrar.toml` and `REGISTRAR_*`
//! environment variables.

use std::{
  ops::RangeInclusive,
  path::{Path, PathBuf},
};

use serde::Deserialize;

/// Accepted `session_ttl_hours`: one hour up to a year.
pub const SESSION_TTL_HOURS: RangeInclusive<i64> = 1..=8760;

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  /// SQLite file; a leading `~/` is expanded against `$HOME`.
  pub database_path:     PathBuf,
  /// Lifetime of a bearer token issued at login.
  pub session_ttl_hours: i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              8000,
      database_path:     PathBuf::from("registrar.db"),
      session_ttl_hours: 24,
    }
  }
}

impl ServerConfig {
  /// Read the optional TOML file at `path`, then overlay the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("REGISTRAR"))
      .build()?
      .try_deserialize::<Self>()?
      .checked()
  }

  fn checked(self) -> Result<Self, config::ConfigError> {
    if !SESSION_TTL_HOURS.contains(&self.session_ttl_hours) {
      return Err(config::ConfigError::Message(format!(
        "session_ttl_hours must be between {} and {}, got {}",
        SESSION_TTL_HOURS.start(),
        SESSION_TTL_HOURS.end(),
        self.session_ttl_hours,
      )));
    }
    Ok(self)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn database_path(&self) -> PathBuf { expand_tilde(&self.database_path) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/registrar.toml")).unwrap();
    assert_eq!(cfg.session_ttl_hours, 24);
    assert_eq!(cfg.port, 8000);
  }

  #[test]
  fn session_lifetime_is_bounded() {
    for hours in [0, -1, 8761, i64::MAX] {
      let cfg = ServerConfig { session_ttl_hours: hours, ..ServerConfig::default() };
      assert!(cfg.checked().is_err(), "{hours}");
    }
    for hours in [1, 24, 8760] {
      let cfg = ServerConfig { session_ttl_hours: hours, ..ServerConfig::default() };
      assert_eq!(cfg.checked().unwrap().session_ttl_hours, hours);
    }
  }

  #[test]
  fn plain_paths_are_untouched() {
    assert_eq!(expand_tilde(Path::new("data/registrar.db")), PathBuf::from("data/registrar.db"));
    assert_eq!(expand_tilde(Path::new("/var/registrar.db")), PathBuf::from("/var/registrar.db"));
  }
}
