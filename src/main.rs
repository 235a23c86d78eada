#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod audit;
mod commands;
mod controller;
mod domain;
mod error;
mod identity;
mod ingest;
mod models;
mod settings;
mod storage;
mod store;

use std::sync::{Arc, Mutex};

use controller::ExpenseController;
use storage::Storage;
use store::ExpenseStore;

pub struct AppState {
  pub storage: Arc<Storage>,
  pub controller: Mutex<ExpenseController>,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("receiptify=info")),
    )
    .init();

  let app_dir = storage::resolve_app_dir().expect("Failed to resolve app data directory");
  let storage: Arc<Storage> =
    Arc::new(storage::init_storage(&app_dir).expect("Failed to initialize storage"));
  let identity = identity::load_or_create(&storage).expect("Failed to initialize user identity");
  tracing::info!(%identity, "storage ready");

  let controller = ExpenseController::new(ExpenseStore::new(storage.clone(), identity));

  tauri::Builder::default()
    .plugin(tauri_plugin_dialog::init())
    .manage(AppState {
      storage,
      controller: Mutex::new(controller),
    })
    .invoke_handler(tauri::generate_handler![
      commands::load_expenses,
      commands::expense_view,
      commands::ingest_receipt,
      commands::read_receipt_preview,
      commands::begin_edit,
      commands::cancel_edit,
      commands::commit_edit,
      commands::edit_field,
      commands::edit_item,
      commands::add_edit_item,
      commands::remove_edit_item,
      commands::delete_expense,
      commands::get_settings,
      commands::update_settings,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
