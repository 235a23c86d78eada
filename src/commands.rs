use serde::Serialize;
use tauri::State;

use crate::audit::log::append_audit;
use crate::domain::currency;
use crate::domain::ordering::SortOrder;
use crate::error::AppError;
use crate::ingest::{self, extract::ExtractionClient, IngestError};
use crate::models::{ExpenseRecord, LineItem, Settings};
use crate::settings;
use crate::AppState;

#[derive(Serialize)]
pub struct ExpenseRow {
  pub id: String,
  pub merchant: String,
  pub date: Option<String>,
  pub total: f64,
  pub currency_symbol: &'static str,
  pub items: Vec<LineItem>,
}

#[derive(Serialize)]
pub struct EditingView {
  pub id: String,
  pub draft: ExpenseRecord,
}

#[derive(Serialize)]
pub struct ExpenseView {
  pub records: Vec<ExpenseRow>,
  pub count: usize,
  pub total: f64,
  pub total_symbol: &'static str,
  pub editing: Option<EditingView>,
}

#[derive(Serialize)]
pub struct ReceiptPreview {
  pub data_base64: String,
  pub content_type: String,
}

#[tauri::command]
pub fn load_expenses(state: State<AppState>) -> Result<usize, AppError> {
  let mut controller = state.controller.lock()?;
  controller.load()?;
  Ok(controller.records().len())
}

#[tauri::command]
pub fn expense_view(state: State<AppState>, order: SortOrder) -> Result<ExpenseView, AppError> {
  let controller = state.controller.lock()?;

  let records = controller
    .visible(order)
    .into_iter()
    .map(|record| {
      let currency_symbol = currency::symbol_for(record.currency.as_deref());
      ExpenseRow {
        id: record.id,
        merchant: record.merchant.unwrap_or_else(|| "N/A".to_string()),
        date: record.date,
        total: record.total.unwrap_or(0.0),
        currency_symbol,
        items: record.items,
      }
    })
    .collect::<Vec<_>>();

  Ok(ExpenseView {
    count: records.len(),
    records,
    total: controller.total(),
    total_symbol: currency::DEFAULT_SYMBOL,
    editing: controller.editing().map(|session| EditingView {
      id: session.id.clone(),
      draft: session.draft.clone(),
    }),
  })
}

#[tauri::command]
pub async fn ingest_receipt(state: State<'_, AppState>, path: String) -> Result<ExpenseRecord, AppError> {
  let settings = settings::get_settings(&state.storage)?;
  if settings.api_key.trim().is_empty() {
    return Err(AppError::new("NO_API_KEY", "API key is not configured"));
  }
  let client = ExtractionClient::new(&settings).map_err(ingest_failure)?;

  tracing::debug!(%path, "ingest: reading");
  let image = ingest::read_image(&path).map_err(ingest_failure)?;

  tracing::debug!(media_type = %image.media_type, "ingest: requesting");
  let text = client.extract_text(&image).await.map_err(ingest_failure)?;

  tracing::debug!("ingest: parsing");
  let extracted = ingest::parse_extraction(&text).map_err(ingest_failure)?;

  let mut controller = state.controller.lock()?;
  let record = controller.ingest(extracted)?;
  state.storage.with_conn(|conn| {
    append_audit(
      conn,
      "INGEST_RECEIPT",
      Some(record.id.clone()),
      serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string()),
    )
  })?;
  tracing::info!(id = %record.id, "ingest: stored new expense");
  Ok(record)
}

#[tauri::command]
pub fn read_receipt_preview(path: String) -> Result<ReceiptPreview, AppError> {
  let image = ingest::read_image(&path).map_err(ingest_failure)?;
  Ok(ReceiptPreview {
    data_base64: image.data_base64,
    content_type: image.media_type,
  })
}

#[tauri::command]
pub fn begin_edit(state: State<AppState>, id: String) -> Result<(), AppError> {
  let mut controller = state.controller.lock()?;
  controller.begin_edit(&id)
}

#[tauri::command]
pub fn cancel_edit(state: State<AppState>) -> Result<(), AppError> {
  let mut controller = state.controller.lock()?;
  controller.cancel_edit();
  Ok(())
}

#[tauri::command]
pub fn commit_edit(state: State<AppState>) -> Result<(), AppError> {
  let mut controller = state.controller.lock()?;
  let audit = controller.editing().map(|session| {
    (
      session.id.clone(),
      serde_json::to_string(&session.draft).unwrap_or_else(|_| "{}".to_string()),
    )
  });
  controller.commit_edit()?;

  if let Some((id, payload)) = audit {
    state
      .storage
      .with_conn(|conn| append_audit(conn, "UPDATE_EXPENSE", Some(id), payload))?;
  }
  Ok(())
}

#[tauri::command]
pub fn edit_field(state: State<AppState>, name: String, value: String) -> Result<(), AppError> {
  let mut controller = state.controller.lock()?;
  controller.edit_field(&name, &value)
}

#[tauri::command]
pub fn edit_item(
  state: State<AppState>,
  index: usize,
  name: String,
  value: String,
) -> Result<(), AppError> {
  let mut controller = state.controller.lock()?;
  controller.edit_item(index, &name, &value)
}

#[tauri::command]
pub fn add_edit_item(state: State<AppState>) -> Result<(), AppError> {
  let mut controller = state.controller.lock()?;
  controller.add_item()
}

#[tauri::command]
pub fn remove_edit_item(state: State<AppState>, index: usize) -> Result<(), AppError> {
  let mut controller = state.controller.lock()?;
  controller.remove_item(index)
}

#[tauri::command]
pub fn delete_expense(state: State<AppState>, id: String) -> Result<(), AppError> {
  let mut controller = state.controller.lock()?;
  controller.delete(&id)?;

  let payload = serde_json::to_string(&serde_json::json!({ "id": id }))
    .unwrap_or_else(|_| "{}".to_string());
  state
    .storage
    .with_conn(|conn| append_audit(conn, "DELETE_EXPENSE", Some(id), payload))?;
  Ok(())
}

#[tauri::command]
pub fn get_settings(state: State<AppState>) -> Result<Settings, AppError> {
  settings::get_settings(&state.storage)
}

#[tauri::command]
pub fn update_settings(state: State<AppState>, settings_input: Settings) -> Result<Settings, AppError> {
  settings::update_settings(&state.storage, &settings_input)?;
  let payload = serde_json::to_string(&serde_json::json!({ "model": settings_input.model }))
    .unwrap_or_else(|_| "{}".to_string());
  state
    .storage
    .with_conn(|conn| append_audit(conn, "UPDATE_SETTINGS", None, payload))?;
  settings::get_settings(&state.storage)
}

fn ingest_failure(err: IngestError) -> AppError {
  tracing::error!(error = %err, "receipt ingestion failed");
  AppError::new("INGEST_FAILED", "Failed to process receipt. Please try again.")
}
