//! Plain-text rendering of API responses.

use anyhow::Result;
use registrar_core::{entity::EntityKind, query::Listing};
use serde::Serialize;
use serde_json::Value;

pub fn json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn text<'a>(record: &'a Value, key: &str) -> &'a str { record[key].as_str().unwrap_or("") }

/// The column a human would recognise the record by.
pub fn title(kind: EntityKind, record: &Value) -> String {
  match kind {
    EntityKind::Department | EntityKind::Course => text(record, "name").to_owned(),
    EntityKind::AcademicYear => {
      let current = if record["is_active"].as_bool() == Some(true) { " (current)" } else { "" };
      format!("{}{current}", text(record, "school_year"))
    }
    EntityKind::Faculty | EntityKind::Student => {
      [text(record, "first_name"), text(record, "middle_name"), text(record, "last_name")]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
  }
}

/// Secondary detail: the owning department, or an email.
fn detail(kind: EntityKind, record: &Value) -> String {
  match kind {
    EntityKind::Department => text(record, "head_name").to_owned(),
    EntityKind::Course => text(record, "department_name").to_owned(),
    EntityKind::Faculty | EntityKind::Student => {
      let dept = text(record, "department_name");
      if dept.is_empty() {
        text(record, "email").to_owned()
      } else {
        format!("{} · {dept}", text(record, "email"))
      }
    }
    EntityKind::AcademicYear => {
      format!("{} – {}", text(record, "start_date"), text(record, "end_date"))
    }
  }
}

pub fn listing(kind: EntityKind, listing: &Listing<Value>) {
  if listing.data.is_empty() {
    println!("No {} found.", kind.path().replace('-', " "));
  }
  for record in &listing.data {
    let id = record["id"].as_i64().unwrap_or_default();
    let archived = if text(record, "state") == "archived" { " [archived]" } else { "" };
    println!("{id:>6}  {:<40} {}{archived}", title(kind, record), detail(kind, record));
  }
  if let Some(meta) = &listing.meta {
    println!("page {} of {} ({} total)", meta.page, meta.last_page, meta.total);
  }
  if let Some(stats) = &listing.stats {
    println!(
      "{} total, {} active, {} archived",
      stats.total, stats.active, stats.archived
    );
    for row in &stats.by_department {
      println!("  {:<40} {}", row.department, row.count);
    }
  }
}

pub fn summary(summary: &Value) {
  for (label, key) in [
    ("Students", "students"),
    ("Faculty", "faculties"),
    ("Departments", "departments"),
    ("Courses", "courses"),
    ("Academic years", "academic_years"),
  ] {
    println!("{label:<16}{}", summary[key].as_u64().unwrap_or_default());
  }
  match summary["current_academic_year"].as_object() {
    Some(year) => {
      let school_year = year.get("school_year").and_then(Value::as_str).unwrap_or("?");
      println!("{:<16}{school_year}", "Current year");
    }
    None => println!("{:<16}none", "Current year"),
  }
}

pub fn by_department(kind: EntityKind, counts: &Value) {
  println!();
  println!("{} by department", kind.title());
  for row in counts.as_array().into_iter().flatten() {
    println!("  {:<40} {}", text(row, "department"), row["count"].as_u64().unwrap_or_default());
  }
}
