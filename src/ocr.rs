//! OCR capability for image uploads.
//!
//! Defines the [`OcrProvider`] trait and the [`OcrSpaceClient`]
//! implementation, which posts the image to an OCR.space-compatible
//! endpoint and joins the returned `ParsedResults[].ParsedText` fragments.
//!
//! The extractor treats any error from this capability as a warning for
//! that one file; OCR failures never abort a batch.

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

use crate::config::OcrConfig;

/// Converts image bytes to text via an external OCR service.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize(&self, filename: &str, bytes: &[u8]) -> Result<String>;
}

/// OCR.space API client.
///
/// Requires the `OCR_SPACE_API_KEY` environment variable; construction
/// fails without it so a missing credential surfaces at startup, not on
/// the first image upload.
pub struct OcrSpaceClient {
    api_key: String,
    endpoint: String,
    language: String,
    timeout_secs: u64,
}

impl OcrSpaceClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = std::env::var("OCR_SPACE_API_KEY")
            .map_err(|_| anyhow::anyhow!("OCR_SPACE_API_KEY environment variable not set"))?;
        Ok(Self {
            api_key,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

fn image_mime(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

/// Join the parsed text of every result block, one line per block.
///
/// A response without a `ParsedResults` array yields an empty string,
/// matching the service's shape for images with no recognizable text.
fn parse_ocr_response(json: &serde_json::Value) -> String {
    json.get("ParsedResults")
        .and_then(|r| r.as_array())
        .map(|results| {
            results
                .iter()
                .filter_map(|item| item.get("ParsedText").and_then(|t| t.as_str()))
                .map(|t| t.trim())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

#[async_trait]
impl OcrProvider for OcrSpaceClient {
    async fn recognize(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let data_uri = format!("data:{};base64,{}", image_mime(filename), encoded);

        let params = [
            ("apikey", self.api_key.as_str()),
            ("language", self.language.as_str()),
            ("base64Image", data_uri.as_str()),
        ];

        let response = client.post(&self.endpoint).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("OCR API error {}: {}", status, body);
        }

        let json: serde_json::Value = response.json().await?;
        Ok(parse_ocr_response(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_joins_result_blocks() {
        let json = serde_json::json!({
            "ParsedResults": [
                { "ParsedText": "  first page " },
                { "ParsedText": "second page" }
            ]
        });
        assert_eq!(parse_ocr_response(&json), "first page\nsecond page");
    }

    #[test]
    fn parse_missing_results_is_empty() {
        let json = serde_json::json!({ "OCRExitCode": 3 });
        assert_eq!(parse_ocr_response(&json), "");
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(image_mime("scan.PNG"), "image/png");
        assert_eq!(image_mime("photo.jpg"), "image/jpeg");
        assert_eq!(image_mime("photo.jpeg"), "image/jpeg");
    }
}
