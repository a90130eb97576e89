//! `registrar`: command-line client for the registrar API.
//!
//! # Usage
//!
//! ```
//! registrar --url http://localhost:8000 --email admin@example.edu --password secret list students
//! registrar list faculties --view archived --search santos
//! registrar archive students 12
//! registrar activate 3
//! ```
//!
//! Settings are read from `~/.config/registrar/config.toml` (or `--config`),
//! then overridden by flags and `REGISTRAR_URL`, `REGISTRAR_EMAIL`,
//! `REGISTRAR_PASSWORD`.

mod client;
mod display;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use registrar_core::entity::EntityKind;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "registrar", about = "Command-line client for the registrar API")]
struct Args {
  /// Path to a TOML config file (url, email, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the registrar server (default: http://localhost:8000).
  #[arg(long, env = "REGISTRAR_URL")]
  url: Option<String>,

  /// Administrator email.
  #[arg(long, env = "REGISTRAR_EMAIL")]
  email: Option<String>,

  /// Administrator password (plaintext).
  #[arg(long, env = "REGISTRAR_PASSWORD", hide_env_values = true)]
  password: Option<String>,

  /// Print raw JSON instead of a table.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List records of a resource.
  List(ListArgs),
  /// Show one record.
  Show {
    #[arg(value_parser = parse_resource)]
    resource: EntityKind,
    id:       i64,
    /// active, archived or all.
    #[arg(long, default_value = "all")]
    view:     String,
  },
  /// Archive an active record.
  Archive {
    #[arg(value_parser = parse_resource)]
    resource: EntityKind,
    id:       i64,
  },
  /// Restore an archived record.
  Restore {
    #[arg(value_parser = parse_resource)]
    resource: EntityKind,
    id:       i64,
  },
  /// Permanently delete an archived record.
  Purge {
    #[arg(value_parser = parse_resource)]
    resource: EntityKind,
    id:       i64,
  },
  /// Make an academic year the current one.
  Activate { id: i64 },
  /// Active-record counts, the current academic year and per-department
  /// headcounts.
  Dashboard,
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
  #[arg(value_parser = parse_resource)]
  resource:      EntityKind,
  #[arg(long)]
  search:        Option<String>,
  /// active (default), archived or all.
  #[arg(long)]
  view:          Option<String>,
  /// Department id or name.
  #[arg(long)]
  department:    Option<String>,
  /// Course id or name.
  #[arg(long)]
  course:        Option<String>,
  /// Academic year id or school year.
  #[arg(long)]
  academic_year: Option<String>,
  /// Active or Inactive.
  #[arg(long)]
  status:        Option<String>,
  #[arg(long)]
  sort:          Option<String>,
  /// asc or desc.
  #[arg(long)]
  direction:     Option<String>,
  #[arg(long)]
  page:          Option<u32>,
  #[arg(long)]
  per_page:      Option<u32>,
  /// Include collection statistics.
  #[arg(long)]
  stats:         bool,
}

impl ListArgs {
  fn query(&self) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    let mut push = |key: &'static str, value: Option<String>| {
      if let Some(value) = value {
        query.push((key, value));
      }
    };
    push("search", self.search.clone());
    push("view", self.view.clone());
    push("department", self.department.clone());
    push("course", self.course.clone());
    push("academic_year", self.academic_year.clone());
    push("status", self.status.clone());
    push("sort", self.sort.clone());
    push("direction", self.direction.clone());
    push("page", self.page.map(|p| p.to_string()));
    push("per_page", self.per_page.map(|p| p.to_string()));
    push("stats", self.stats.then(|| "1".to_owned()));
    query
  }
}

fn parse_resource(raw: &str) -> Result<EntityKind, String> {
  EntityKind::from_path(raw).ok_or_else(|| {
    let known: Vec<_> = EntityKind::ALL.iter().map(|k| k.path()).collect();
    format!("unknown resource {raw:?}; expected one of {}", known.join(", "))
  })
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  email:    String,
  #[serde(default)]
  password: String,
}

fn default_config_path() -> Option<PathBuf> {
  let home = std::env::var_os("HOME")?;
  let path = PathBuf::from(home).join(".config/registrar/config.toml");
  path.exists().then_some(path)
}

fn load_config(explicit: Option<&PathBuf>) -> Result<ConfigFile> {
  let Some(path) = explicit.cloned().or_else(default_config_path) else {
    return Ok(ConfigFile::default());
  };
  let raw = std::fs::read_to_string(&path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let file_cfg = load_config(args.config.as_ref())?;

  // CLI flags (and env) override the config file, which overrides defaults.
  let non_empty = |s: &String| (!s.is_empty()).then(|| s.clone());
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8000".to_string()),
    email:    args.email.or_else(|| non_empty(&file_cfg.email)).unwrap_or_default(),
    password: args.password.or_else(|| non_empty(&file_cfg.password)).unwrap_or_default(),
  };

  let mut client = ApiClient::new(api_config)?;
  let json = args.json;

  match args.command {
    Command::List(list) => {
      let listing = client.list(list.resource, &list.query()).await?;
      if json {
        display::json(&listing)?;
      } else {
        display::listing(list.resource, &listing);
      }
    }
    Command::Show { resource, id, view } => {
      let record = client.show(resource, id, &view).await?;
      display::json(&record)?;
    }
    Command::Archive { resource, id } => println!("{}", client.archive(resource, id).await?),
    Command::Restore { resource, id } => println!("{}", client.restore(resource, id).await?),
    Command::Purge { resource, id } => println!("{}", client.purge(resource, id).await?),
    Command::Activate { id } => {
      let year = client.activate(id).await?;
      if json {
        display::json(&year)?;
      } else {
        let school_year = year["school_year"].as_str().unwrap_or("?");
        println!("{school_year} is now the current academic year");
      }
    }
    Command::Dashboard => {
      let summary = client.dashboard().await?;
      if json {
        display::json(&summary)?;
        return Ok(());
      }
      display::summary(&summary);
      for kind in [EntityKind::Student, EntityKind::Faculty] {
        let counts = client.by_department(kind).await?;
        display::by_department(kind, &counts);
      }
    }
  }

  Ok(())
}
