use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::AppError;

pub struct Storage {
  conn: Mutex<Connection>,
}

pub fn resolve_app_dir() -> Result<PathBuf, AppError> {
  let base = dirs_next::data_local_dir()
    .ok_or_else(|| AppError::new("PATH", "App data directory not found"))?;
  Ok(base.join("Receiptify"))
}

pub fn init_storage(app_dir: &Path) -> Result<Storage, AppError> {
  fs::create_dir_all(app_dir)?;
  let db_path = app_dir.join("receiptify.sqlite");
  let mut conn = Connection::open(db_path)?;
  configure_connection(&conn)?;
  run_migrations(&mut conn)?;

  Ok(Storage {
    conn: Mutex::new(conn),
  })
}

impl Storage {
  pub fn get(&self, key: &str) -> Result<Option<String>, AppError> {
    let guard = self.conn.lock()?;
    let mut stmt = guard.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
    let mut rows = stmt.query(params![key])?;
    if let Some(row) = rows.next()? {
      Ok(Some(row.get(0)?))
    } else {
      Ok(None)
    }
  }

  pub fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
    let guard = self.conn.lock()?;
    guard.execute(
      "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
      params![key, value],
    )?;
    Ok(())
  }

  pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T, AppError>) -> Result<T, AppError> {
    let guard = self.conn.lock()?;
    f(&guard)
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, AppError> {
    let mut conn = Connection::open_in_memory()?;
    run_migrations(&mut conn)?;
    Ok(Storage {
      conn: Mutex::new(conn),
    })
  }
}

fn configure_connection(conn: &Connection) -> Result<(), AppError> {
  conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
  conn.busy_timeout(Duration::from_secs(5))?;
  Ok(())
}

fn run_migrations(conn: &mut Connection) -> Result<(), AppError> {
  conn.execute_batch(
    "CREATE TABLE IF NOT EXISTS schema_migrations (version TEXT PRIMARY KEY, applied_at TEXT NOT NULL)",
  )?;

  apply_migration(conn, "001_init", include_str!("../migrations/001_init.sql"))?;
  Ok(())
}

fn apply_migration(conn: &mut Connection, version: &str, sql: &str) -> Result<(), AppError> {
  let exists: i64 = conn.query_row(
    "SELECT COUNT(*) FROM schema_migrations WHERE version = ?1",
    params![version],
    |row| row.get(0),
  )?;
  if exists > 0 {
    return Ok(());
  }

  conn.execute_batch(sql)?;
  conn.execute(
    "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
    params![version, Utc::now().to_rfc3339()],
  )?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn get_returns_none_for_missing_key() {
    let storage = Storage::open_in_memory().unwrap();
    assert!(storage.get("missing").unwrap().is_none());
  }

  #[test]
  fn set_then_get_roundtrips() {
    let storage = Storage::open_in_memory().unwrap();
    storage.set("alpha", "one").unwrap();
    storage.set("alpha", "two").unwrap();
    assert_eq!(storage.get("alpha").unwrap().as_deref(), Some("two"));
  }

  #[test]
  fn init_storage_creates_app_dir() {
    let dir = tempfile::tempdir().unwrap();
    let app_dir = dir.path().join("nested").join("Receiptify");
    let storage = init_storage(&app_dir).unwrap();
    storage.set("key", "value").unwrap();
    assert!(app_dir.join("receiptify.sqlite").exists());
  }
}
