use chrono::Utc;

use crate::domain::ordering::{self, SortOrder};
use crate::domain::totals;
use crate::error::AppError;
use crate::ingest::{normalize_items, ExtractedReceipt};
use crate::models::{ExpenseRecord, LineItem};
use crate::store::ExpenseStore;

pub struct EditSession {
  pub id: String,
  pub draft: ExpenseRecord,
}

// Canonical in-memory collection plus the single optional editing slot.
// Every mutation of the collection writes the full snapshot through the
// injected store; draft edits touch only the session until commit.
pub struct ExpenseController {
  store: ExpenseStore,
  records: Vec<ExpenseRecord>,
  editing: Option<EditSession>,
}

impl ExpenseController {
  pub fn new(store: ExpenseStore) -> Self {
    Self {
      store,
      records: Vec::new(),
      editing: None,
    }
  }

  pub fn load(&mut self) -> Result<(), AppError> {
    self.records = self.store.load()?;
    Ok(())
  }

  pub fn records(&self) -> &[ExpenseRecord] {
    &self.records
  }

  pub fn visible(&self, order: SortOrder) -> Vec<ExpenseRecord> {
    ordering::sorted_by_date(&self.records, order)
  }

  pub fn total(&self) -> f64 {
    totals::sum_totals(&self.records)
  }

  pub fn editing(&self) -> Option<&EditSession> {
    self.editing.as_ref()
  }

  pub fn ingest(&mut self, extracted: ExtractedReceipt) -> Result<ExpenseRecord, AppError> {
    let record = ExpenseRecord {
      id: self.next_id(),
      merchant: extracted.merchant,
      date: extracted.date,
      total: extracted.total,
      currency: extracted.currency,
      items: normalize_items(extracted.items),
    };
    self.records.insert(0, record.clone());
    self.store.save(&self.records)?;
    Ok(record)
  }

  pub fn begin_edit(&mut self, id: &str) -> Result<(), AppError> {
    let record = self
      .records
      .iter()
      .find(|record| record.id == id)
      .cloned()
      .ok_or_else(|| AppError::new("NOT_FOUND", "Expense not found"))?;

    if let Some(open) = &self.editing {
      tracing::warn!(replaced = %open.id, started = %id, "replacing open edit session");
    }
    self.editing = Some(EditSession {
      id: id.to_string(),
      draft: record,
    });
    Ok(())
  }

  pub fn cancel_edit(&mut self) {
    self.editing = None;
  }

  pub fn commit_edit(&mut self) -> Result<(), AppError> {
    let session = self
      .editing
      .take()
      .ok_or_else(|| AppError::new("NO_EDIT", "No expense is being edited"))?;

    if let Some(slot) = self.records.iter_mut().find(|record| record.id == session.id) {
      *slot = session.draft;
    }
    self.store.save(&self.records)
  }

  pub fn edit_field(&mut self, name: &str, value: &str) -> Result<(), AppError> {
    let draft = &mut self.open_session()?.draft;
    match name {
      "merchant" => draft.merchant = optional_text(value),
      "date" => draft.date = optional_text(value),
      "currency" => draft.currency = optional_text(value),
      "total" => draft.total = Some(parse_number(value)),
      _ => return Err(AppError::new("INVALID_FIELD", format!("Unknown field: {name}"))),
    }
    Ok(())
  }

  pub fn edit_item(&mut self, index: usize, name: &str, value: &str) -> Result<(), AppError> {
    let items = &mut self.open_session()?.draft.items;
    let item = items
      .get_mut(index)
      .ok_or_else(|| AppError::new("INVALID_INDEX", format!("No line item at {index}")))?;
    match name {
      "description" => item.description = value.to_string(),
      "description_en" => item.description_en = value.to_string(),
      "quantity" => item.quantity = parse_number(value),
      "unit_price" => item.unit_price = parse_number(value),
      "price" => item.price = parse_number(value),
      _ => return Err(AppError::new("INVALID_FIELD", format!("Unknown field: {name}"))),
    }
    Ok(())
  }

  pub fn add_item(&mut self) -> Result<(), AppError> {
    self.open_session()?.draft.items.push(LineItem::blank());
    Ok(())
  }

  pub fn remove_item(&mut self, index: usize) -> Result<(), AppError> {
    let items = &mut self.open_session()?.draft.items;
    if index >= items.len() {
      return Err(AppError::new("INVALID_INDEX", format!("No line item at {index}")));
    }
    items.remove(index);
    Ok(())
  }

  pub fn delete(&mut self, id: &str) -> Result<(), AppError> {
    self.records.retain(|record| record.id != id);
    self.store.save(&self.records)
  }

  fn open_session(&mut self) -> Result<&mut EditSession, AppError> {
    self
      .editing
      .as_mut()
      .ok_or_else(|| AppError::new("NO_EDIT", "No expense is being edited"))
  }

  // Epoch milliseconds, bumped until unique within the collection.
  fn next_id(&self) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
      let candidate = millis.to_string();
      if !self.records.iter().any(|record| record.id == candidate) {
        return candidate;
      }
      millis += 1;
    }
  }
}

fn parse_number(value: &str) -> f64 {
  value.trim().parse().unwrap_or(0.0)
}

fn optional_text(value: &str) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_string())
  }
}
