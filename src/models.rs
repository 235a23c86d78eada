use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExpenseRecord {
  pub id: String,
  #[serde(default)]
  pub merchant: Option<String>,
  #[serde(default)]
  pub date: Option<String>,
  #[serde(default)]
  pub total: Option<f64>,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub items: Vec<LineItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineItem {
  pub description: String,
  pub description_en: String,
  pub quantity: f64,
  pub unit_price: f64,
  pub price: f64,
}

impl LineItem {
  pub fn blank() -> Self {
    Self {
      description: String::new(),
      description_en: String::new(),
      quantity: 1.0,
      unit_price: 0.0,
      price: 0.0,
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
  pub api_key: String,
  pub model: String,
}
