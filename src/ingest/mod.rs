pub mod extract;

use std::fs;
use std::path::PathBuf;

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use crate::models::LineItem;

const RECEIPT_MAX_BYTES: u64 = 5 * 1024 * 1024;

// One variant per failure stage; the command boundary collapses all of
// them into a single generic user-facing message.
#[derive(Debug, Error)]
pub enum IngestError {
  #[error("failed to read receipt image: {0}")]
  Read(String),
  #[error("extraction request failed: {0}")]
  Request(String),
  #[error("could not decode extraction response: {0}")]
  Response(String),
}

#[derive(Debug)]
pub struct ReceiptImage {
  pub data_base64: String,
  pub media_type: String,
}

// Shape the extraction API is instructed to return.
#[derive(Debug, Deserialize)]
pub struct ExtractedReceipt {
  #[serde(default)]
  pub merchant: Option<String>,
  #[serde(default)]
  pub date: Option<String>,
  #[serde(default)]
  pub total: Option<f64>,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub items: Vec<ExtractedItem>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractedItem {
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub description_en: Option<String>,
  #[serde(default)]
  pub quantity: Option<f64>,
  #[serde(default)]
  pub unit_price: Option<f64>,
  #[serde(default)]
  pub price: Option<f64>,
}

pub fn read_image(path: &str) -> Result<ReceiptImage, IngestError> {
  let file_path = PathBuf::from(path);
  if !file_path.exists() {
    return Err(IngestError::Read(format!("no such file: {path}")));
  }

  let ext = file_path
    .extension()
    .and_then(|ext| ext.to_str())
    .unwrap_or("")
    .to_lowercase();
  let media_type = match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "webp" => "image/webp",
    "gif" => "image/gif",
    _ => return Err(IngestError::Read(format!("unsupported image type: .{ext}"))),
  };

  let metadata = fs::metadata(&file_path).map_err(|err| IngestError::Read(err.to_string()))?;
  if metadata.len() > RECEIPT_MAX_BYTES {
    return Err(IngestError::Read(format!(
      "file exceeds {RECEIPT_MAX_BYTES} bytes"
    )));
  }

  let bytes = fs::read(&file_path).map_err(|err| IngestError::Read(err.to_string()))?;
  Ok(ReceiptImage {
    data_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
    media_type: media_type.to_string(),
  })
}

pub fn parse_extraction(text: &str) -> Result<ExtractedReceipt, IngestError> {
  serde_json::from_str(strip_fences(text))
    .map_err(|err| IngestError::Response(err.to_string()))
}

// Models occasionally wrap the JSON body in a markdown code fence.
fn strip_fences(text: &str) -> &str {
  let trimmed = text.trim();
  let Some(rest) = trimmed.strip_prefix("```") else {
    return trimmed;
  };
  let rest = rest.strip_prefix("json").unwrap_or(rest);
  rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub fn normalize_items(items: Vec<ExtractedItem>) -> Vec<LineItem> {
  items
    .into_iter()
    .map(|item| {
      let price = item.price.unwrap_or(0.0);
      let quantity = match item.quantity {
        Some(quantity) if quantity != 0.0 => quantity,
        _ => 1.0,
      };
      LineItem {
        description: item.description.unwrap_or_default(),
        description_en: item.description_en.unwrap_or_default(),
        quantity,
        unit_price: item.unit_price.unwrap_or(price),
        price,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn read_image_maps_extension_to_media_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("receipt.JPG");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(&[0xff, 0xd8, 0xff]).unwrap();

    let image = read_image(path.to_str().unwrap()).unwrap();
    assert_eq!(image.media_type, "image/jpeg");
    assert_eq!(image.data_base64, "/9j/");
  }

  #[test]
  fn read_image_rejects_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("receipt.pdf");
    fs::write(&path, b"%PDF").unwrap();

    let err = read_image(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, IngestError::Read(_)));
  }

  #[test]
  fn read_image_rejects_missing_file() {
    let err = read_image("/nowhere/receipt.png").unwrap_err();
    assert!(matches!(err, IngestError::Read(_)));
  }

  #[test]
  fn parse_extraction_accepts_full_payload() {
    let text = r#"{
      "merchant": "Izakaya Tanaka",
      "date": "2025-04-12",
      "total": 3200,
      "currency": "JPY",
      "items": [
        {"description": "Karaage", "description_en": "Fried chicken", "quantity": 2, "unit_price": 600, "price": 1200},
        {"description": "Nama biiru", "description_en": "Draft beer", "price": 2000}
      ]
    }"#;

    let extracted = parse_extraction(text).unwrap();
    assert_eq!(extracted.merchant.as_deref(), Some("Izakaya Tanaka"));
    assert_eq!(extracted.total, Some(3200.0));
    assert_eq!(extracted.items.len(), 2);
  }

  #[test]
  fn parse_extraction_strips_markdown_fences() {
    let text = "```json\n{\"merchant\": \"Kiosk\", \"items\": []}\n```";
    let extracted = parse_extraction(text).unwrap();
    assert_eq!(extracted.merchant.as_deref(), Some("Kiosk"));
  }

  #[test]
  fn parse_extraction_rejects_malformed_payload() {
    let err = parse_extraction("receipt unreadable, sorry").unwrap_err();
    assert!(matches!(err, IngestError::Response(_)));
  }

  #[test]
  fn normalize_defaults_quantity_and_prices() {
    let items = vec![ExtractedItem {
      description: None,
      description_en: Some("Bento box".to_string()),
      quantity: None,
      unit_price: None,
      price: None,
    }];

    let normalized = normalize_items(items);
    assert_eq!(normalized[0].quantity, 1.0);
    assert_eq!(normalized[0].unit_price, 0.0);
    assert_eq!(normalized[0].price, 0.0);
    assert_eq!(normalized[0].description, "");
  }

  #[test]
  fn normalize_falls_back_unit_price_to_price() {
    let items = vec![ExtractedItem {
      description: Some("Sushi set".to_string()),
      description_en: Some("Sushi set".to_string()),
      quantity: Some(0.0),
      unit_price: None,
      price: Some(1200.0),
    }];

    let normalized = normalize_items(items);
    assert_eq!(normalized[0].unit_price, 1200.0);
    assert_eq!(normalized[0].quantity, 1.0);
    assert_eq!(normalized[0].price, 1200.0);
  }

  #[test]
  fn normalize_preserves_item_order() {
    let items = vec![
      ExtractedItem {
        description: Some("first".to_string()),
        description_en: None,
        quantity: Some(1.0),
        unit_price: Some(1.0),
        price: Some(1.0),
      },
      ExtractedItem {
        description: Some("second".to_string()),
        description_en: None,
        quantity: Some(1.0),
        unit_price: Some(2.0),
        price: Some(2.0),
      },
    ];

    let normalized = normalize_items(items);
    assert_eq!(normalized[0].description, "first");
    assert_eq!(normalized[1].description, "second");
  }
}
