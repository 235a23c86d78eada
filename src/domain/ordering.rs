use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::ExpenseRecord;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Ascending,
  Descending,
}

// Display copy only; the canonical collection keeps ingestion order.
pub fn sorted_by_date(records: &[ExpenseRecord], order: SortOrder) -> Vec<ExpenseRecord> {
  let mut sorted = records.to_vec();
  sorted.sort_by(|a, b| {
    let (ka, kb) = (sort_key(a), sort_key(b));
    match order {
      SortOrder::Ascending => ka.cmp(&kb),
      SortOrder::Descending => kb.cmp(&ka),
    }
  });
  sorted
}

fn sort_key(record: &ExpenseRecord) -> NaiveDate {
  record
    .date
    .as_deref()
    .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
    .unwrap_or(NaiveDate::MIN)
}
