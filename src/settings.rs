use crate::error::AppError;
use crate::models::Settings;
use crate::storage::Storage;

const KEY_API_KEY: &str = "receiptify_api_key";
const KEY_MODEL: &str = "receiptify_model";

const ENV_API_KEY: &str = "RECEIPTIFY_API_KEY";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub fn get_settings(storage: &Storage) -> Result<Settings, AppError> {
  let api_key = match storage.get(KEY_API_KEY)? {
    Some(value) if !value.trim().is_empty() => value,
    _ => std::env::var(ENV_API_KEY).unwrap_or_default(),
  };
  let model = match storage.get(KEY_MODEL)? {
    Some(value) if !value.trim().is_empty() => value,
    _ => DEFAULT_MODEL.to_string(),
  };

  Ok(Settings { api_key, model })
}

pub fn update_settings(storage: &Storage, settings: &Settings) -> Result<(), AppError> {
  storage.set(KEY_API_KEY, settings.api_key.trim())?;
  let model = settings.model.trim();
  storage.set(KEY_MODEL, if model.is_empty() { DEFAULT_MODEL } else { model })?;
  Ok(())
}
