use crate::models::ExpenseRecord;

pub fn sum_totals(records: &[ExpenseRecord]) -> f64 {
  records
    .iter()
    .map(|record| record.total.unwrap_or(0.0))
    .sum()
}
