use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::AppError;

pub fn append_audit(
  conn: &Connection,
  action: &str,
  entity_id: Option<String>,
  payload_json: String,
) -> Result<(), AppError> {
  let ts = Utc::now().to_rfc3339();
  conn.execute(
    "INSERT INTO audit_log (ts, action, entity_id, payload_json) VALUES (?1, ?2, ?3, ?4)",
    params![ts, action, entity_id, payload_json],
  )?;
  Ok(())
}
