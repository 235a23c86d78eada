use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::AppError;
use crate::storage::Storage;

const KEY_IDENTITY: &str = "receiptify_user_id";
const TOKEN_LEN: usize = 32;

pub fn load_or_create(storage: &Storage) -> Result<String, AppError> {
  if let Some(token) = storage.get(KEY_IDENTITY)? {
    if !token.trim().is_empty() {
      return Ok(token);
    }
  }

  let token = generate_token();
  storage.set(KEY_IDENTITY, &token)?;
  Ok(token)
}

fn generate_token() -> String {
  let suffix: String = rand::thread_rng()
    .sample_iter(&Alphanumeric)
    .take(TOKEN_LEN)
    .map(char::from)
    .collect();
  format!("user_{suffix}")
}
