use std::sync::Arc;

use crate::error::AppError;
use crate::models::ExpenseRecord;
use crate::storage::Storage;

pub struct ExpenseStore {
  storage: Arc<Storage>,
  identity: String,
}

impl ExpenseStore {
  pub fn new(storage: Arc<Storage>, identity: String) -> Self {
    Self { storage, identity }
  }

  fn key(&self) -> String {
    format!("receiptify_expenses_{}", self.identity)
  }

  pub fn load(&self) -> Result<Vec<ExpenseRecord>, AppError> {
    let raw = self.storage.get(&self.key()).map_err(|err| {
      tracing::error!(error = %err, "failed to read expense snapshot");
      AppError::new("STORAGE_LOAD", "Failed to load saved expenses")
    })?;

    match raw {
      None => Ok(Vec::new()),
      Some(raw) => serde_json::from_str(&raw).map_err(|err| {
        tracing::error!(error = %err, "stored expense snapshot is not valid JSON");
        AppError::new("STORAGE_LOAD", "Failed to load saved expenses")
      }),
    }
  }

  pub fn save(&self, records: &[ExpenseRecord]) -> Result<(), AppError> {
    let raw = serde_json::to_string(records)
      .map_err(|err| AppError::new("STORAGE_SAVE", err.to_string()))?;
    self.storage.set(&self.key(), &raw).map_err(|err| {
      tracing::error!(error = %err, "failed to write expense snapshot");
      AppError::new("STORAGE_SAVE", "Failed to save expenses")
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::LineItem;

  fn record(id: &str, date: Option<&str>) -> ExpenseRecord {
    ExpenseRecord {
      id: id.to_string(),
      merchant: Some("Cafe Luna".to_string()),
      date: date.map(str::to_string),
      total: Some(18.5),
      currency: Some("EUR".to_string()),
      items: vec![LineItem {
        description: "Kaffee".to_string(),
        description_en: "Coffee".to_string(),
        quantity: 2.0,
        unit_price: 3.5,
        price: 7.0,
      }],
    }
  }

  fn store() -> ExpenseStore {
    let storage = Arc::new(Storage::open_in_memory().unwrap());
    ExpenseStore::new(storage, "user_test".to_string())
  }

  #[test]
  fn load_without_snapshot_is_empty() {
    assert!(store().load().unwrap().is_empty());
  }

  #[test]
  fn save_then_load_roundtrips_in_order() {
    let store = store();
    let records = vec![record("2", Some("2025-02-01")), record("1", None)];
    store.save(&records).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, "2");
    assert_eq!(loaded[1].id, "1");
    assert_eq!(loaded[0].merchant.as_deref(), Some("Cafe Luna"));
    assert_eq!(loaded[0].items, records[0].items);
    assert!(loaded[1].date.is_none());
  }

  #[test]
  fn corrupt_snapshot_surfaces_load_error() {
    let storage = Arc::new(Storage::open_in_memory().unwrap());
    storage.set("receiptify_expenses_user_test", "{not json").unwrap();
    let store = ExpenseStore::new(storage, "user_test".to_string());

    let err = store.load().unwrap_err();
    assert_eq!(err.code, "STORAGE_LOAD");
  }

  #[test]
  fn snapshots_are_namespaced_by_identity() {
    let storage = Arc::new(Storage::open_in_memory().unwrap());
    let store_a = ExpenseStore::new(storage.clone(), "user_a".to_string());
    let store_b = ExpenseStore::new(storage, "user_b".to_string());

    store_a.save(&[record("1", None)]).unwrap();
    assert_eq!(store_a.load().unwrap().len(), 1);
    assert!(store_b.load().unwrap().is_empty());
  }
}
