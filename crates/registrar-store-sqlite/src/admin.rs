//! [`AdminStore`] for [`SqliteStore`]: administrator accounts and sessions.

use chrono::{DateTime, Utc};
use registrar_core::{
  Error as CoreError,
  admin::{Admin, AdminPatch, NewAdmin, Session},
  store::AdminStore,
  validate::ValidationErrors,
};
use rusqlite::{Connection, OptionalExtension as _, Row, params};

use crate::{
  Result, SqliteStore,
  encode::{decode_dt, encode_dt},
};

struct RawAdmin {
  id:         i64,
  name:       String,
  email:      String,
  created_at: String,
  updated_at: String,
}

impl RawAdmin {
  const COLUMNS: &'static str = "a.id, a.name, a.email, a.created_at, a.updated_at";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      created_at: row.get(3)?,
      updated_at: row.get(4)?,
    })
  }

  fn into_admin(self) -> Result<Admin> {
    Ok(Admin {
      id:         self.id,
      name:       self.name,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

fn fetch_admin(conn: &Connection, id: i64) -> Result<Option<Admin>> {
  conn
    .query_row(
      &format!("SELECT {} FROM admins a WHERE a.id = ?1", RawAdmin::COLUMNS),
      [id],
      RawAdmin::from_row,
    )
    .optional()?
    .map(RawAdmin::into_admin)
    .transpose()
}

fn email_taken(conn: &Connection, email: &str, exclude: Option<i64>) -> Result<bool> {
  let found: Option<i64> = conn
    .query_row(
      "SELECT id FROM admins WHERE email = ?1 AND id IS NOT ?2",
      params![email, exclude],
      |row| row.get(0),
    )
    .optional()?;
  Ok(found.is_some())
}

impl AdminStore for SqliteStore {
  async fn create_admin(&self, input: NewAdmin) -> Result<Admin> {
    input.validate()?;
    self
      .write(move |tx| {
        if email_taken(tx, &input.email, None)? {
          let mut errors = ValidationErrors::new();
          errors.taken("email");
          return Err(errors.into());
        }
        let at = encode_dt(Utc::now());
        tx.execute(
          "INSERT INTO admins (name, email, password_hash, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          params![input.name, input.email, input.password_hash, at],
        )?;
        let id = tx.last_insert_rowid();
        fetch_admin(tx, id)?.ok_or_else(|| CoreError::Unauthorized.into())
      })
      .await
  }

  async fn find_admin_credentials(&self, email: String) -> Result<Option<(Admin, String)>> {
    let raw: Option<(RawAdmin, String)> = self
      .read(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {}, a.password_hash FROM admins a WHERE a.email = ?1",
                RawAdmin::COLUMNS
              ),
              [email],
              |row| Ok((RawAdmin::from_row(row)?, row.get(5)?)),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(|(admin, hash)| Ok((admin.into_admin()?, hash))).transpose()
  }

  async fn get_admin(&self, id: i64) -> Result<Option<Admin>> {
    self.read(move |conn| fetch_admin(conn, id)).await
  }

  async fn update_admin(&self, id: i64, patch: AdminPatch) -> Result<Admin> {
    patch.validate()?;
    self
      .write(move |tx| {
        let current = fetch_admin(tx, id)?.ok_or(CoreError::Unauthorized)?;
        let name = patch.name.unwrap_or(current.name);
        let email = patch.email.unwrap_or(current.email);
        if email_taken(tx, &email, Some(id))? {
          let mut errors = ValidationErrors::new();
          errors.taken("email");
          return Err(errors.into());
        }
        tx.execute(
          "UPDATE admins SET name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4",
          params![name, email, encode_dt(Utc::now()), id],
        )?;
        fetch_admin(tx, id)?.ok_or_else(|| CoreError::Unauthorized.into())
      })
      .await
  }

  async fn admin_password_hash(&self, id: i64) -> Result<Option<String>> {
    self
      .read(move |conn| {
        Ok(
          conn
            .query_row("SELECT password_hash FROM admins WHERE id = ?1", [id], |row| row.get(0))
            .optional()?,
        )
      })
      .await
  }

  async fn set_admin_password(&self, id: i64, password_hash: String) -> Result<()> {
    self
      .write(move |tx| {
        let changed = tx.execute(
          "UPDATE admins SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
          params![password_hash, encode_dt(Utc::now()), id],
        )?;
        if changed == 0 {
          return Err(CoreError::Unauthorized.into());
        }
        Ok(())
      })
      .await
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO sessions (token_digest, admin_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![
            session.token_digest,
            session.admin_id,
            encode_dt(session.created_at),
            encode_dt(session.expires_at),
          ],
        )?;
        Ok(())
      })
      .await
  }

  async fn find_session(&self, token_digest: String, now: DateTime<Utc>) -> Result<Option<Admin>> {
    let now = encode_dt(now);
    let raw: Option<RawAdmin> = self
      .read(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM sessions s JOIN admins a ON a.id = s.admin_id
                 WHERE s.token_digest = ?1 AND s.expires_at > ?2",
                RawAdmin::COLUMNS
              ),
              params![token_digest, now],
              RawAdmin::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAdmin::into_admin).transpose()
  }

  async fn delete_session(&self, token_digest: String) -> Result<bool> {
    self
      .write(move |tx| {
        Ok(tx.execute("DELETE FROM sessions WHERE token_digest = ?1", [token_digest])? > 0)
      })
      .await
  }

  async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
    let now = encode_dt(now);
    self
      .write(move |tx| {
        Ok(tx.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])? as u64)
      })
      .await
  }
}
