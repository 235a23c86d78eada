use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::models::Settings;

use super::{IngestError, ReceiptImage};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;

const INSTRUCTION: &str = "Extract this receipt into JSON with exactly these fields: \
merchant (string), date (string, YYYY-MM-DD), total (number), currency (string, ISO 4217 code), \
items (array of objects with description, description_en, quantity, unit_price, price). \
description is the item text as printed on the receipt; description_en is its English translation. \
description_en and price are required for every item. \
Respond with the JSON object only, no prose.";

pub struct ExtractionClient {
  client: reqwest::Client,
  model: String,
}

impl ExtractionClient {
  pub fn new(settings: &Settings) -> Result<Self, IngestError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
      "x-api-key",
      HeaderValue::from_str(&settings.api_key)
        .map_err(|_| IngestError::Request("API key contains invalid characters".to_string()))?,
    );
    headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|err| IngestError::Request(err.to_string()))?;

    Ok(Self {
      client,
      model: settings.model.clone(),
    })
  }

  pub async fn extract_text(&self, image: &ReceiptImage) -> Result<String, IngestError> {
    let request = build_request(&self.model, image);

    let response = self
      .client
      .post(API_URL)
      .json(&request)
      .send()
      .await
      .map_err(|err| IngestError::Request(err.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|err| IngestError::Request(err.to_string()))?;

    if !status.is_success() {
      let detail = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|parsed| parsed.error.message)
        .unwrap_or(body);
      return Err(IngestError::Request(format!("HTTP {status}: {detail}")));
    }

    let parsed: ExtractResponse =
      serde_json::from_str(&body).map_err(|err| IngestError::Response(err.to_string()))?;
    parsed
      .content
      .into_iter()
      .find_map(|block| match block {
        ResponseBlock::Text { text } => Some(text),
        ResponseBlock::Other => None,
      })
      .ok_or_else(|| IngestError::Response("no text block in response".to_string()))
  }
}

fn build_request(model: &str, image: &ReceiptImage) -> ExtractRequest {
  ExtractRequest {
    model: model.to_string(),
    max_tokens: MAX_TOKENS,
    messages: vec![RequestMessage {
      role: "user",
      content: vec![
        RequestBlock::Image {
          source: ImageSource {
            source_type: "base64",
            media_type: image.media_type.clone(),
            data: image.data_base64.clone(),
          },
        },
        RequestBlock::Text {
          text: INSTRUCTION.to_string(),
        },
      ],
    }],
  }
}

#[derive(Serialize)]
struct ExtractRequest {
  model: String,
  max_tokens: u32,
  messages: Vec<RequestMessage>,
}

#[derive(Serialize)]
struct RequestMessage {
  role: &'static str,
  content: Vec<RequestBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RequestBlock {
  Image { source: ImageSource },
  Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
  #[serde(rename = "type")]
  source_type: &'static str,
  media_type: String,
  data: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
  content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ResponseBlock {
  #[serde(rename = "text")]
  Text { text: String },
  #[serde(other)]
  Other,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
  error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
  message: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn image() -> ReceiptImage {
    ReceiptImage {
      data_base64: "aGVsbG8=".to_string(),
      media_type: "image/png".to_string(),
    }
  }

  #[test]
  fn request_embeds_image_and_instruction() {
    let request = build_request("claude-sonnet-4-20250514", &image());
    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["model"], "claude-sonnet-4-20250514");
    assert_eq!(json["messages"][0]["role"], "user");

    let blocks = json["messages"][0]["content"].as_array().unwrap();
    assert_eq!(blocks[0]["type"], "image");
    assert_eq!(blocks[0]["source"]["type"], "base64");
    assert_eq!(blocks[0]["source"]["media_type"], "image/png");
    assert_eq!(blocks[0]["source"]["data"], "aGVsbG8=");
    assert_eq!(blocks[1]["type"], "text");

    let instruction = blocks[1]["text"].as_str().unwrap();
    for field in ["merchant", "date", "total", "currency", "description_en", "unit_price"] {
      assert!(instruction.contains(field), "instruction misses {field}");
    }
  }

  #[test]
  fn response_text_block_deserializes() {
    let body = r#"{"content":[{"type":"text","text":"{}"},{"type":"tool_use","id":"x"}]}"#;
    let parsed: ExtractResponse = serde_json::from_str(body).unwrap();
    let text = parsed.content.into_iter().find_map(|block| match block {
      ResponseBlock::Text { text } => Some(text),
      ResponseBlock::Other => None,
    });
    assert_eq!(text.as_deref(), Some("{}"));
  }

  #[test]
  fn api_error_body_yields_message() {
    let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"image too large"}}"#;
    let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
    assert_eq!(parsed.error.message, "image too large");
  }
}
