//! Google Cloud Vision OCR Client
//!
//! TEXT_DETECTION via the `images:annotate` REST endpoint with API-key
//! authentication. An image with no detectable text yields an empty string.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::Ocr;

/// Vision API base URL
pub const API_BASE_URL: &str = "https://vision.googleapis.com";

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    /// Base64-encoded image bytes
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VisionClient {
    /// Create a client from the `GOOGLE_VISION_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_VISION_API_KEY")
            .context("GOOGLE_VISION_API_KEY environment variable not set")?;
        Self::new(&api_key)
    }

    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Explicit base URL (tests point this at a local stub).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Ocr for VisionClient {
    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: base64_encode(image),
                },
                features: vec![Feature {
                    r#type: "TEXT_DETECTION",
                }],
            }],
        };

        let url = format!("{}/v1/images:annotate?key={}", self.base_url, self.api_key);
        let resp: AnnotateResponse = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .context("Vision annotate request failed")?
            .error_for_status()
            .context("Vision annotate returned an error status")?
            .json()
            .await
            .context("Vision annotate response was not valid JSON")?;

        let Some(first) = resp.responses.into_iter().next() else {
            return Ok(String::new());
        };
        if let Some(err) = first.error {
            return Err(anyhow!("Vision annotate error: {}", err.message));
        }

        let text = first.full_text_annotation.map(|a| a.text).unwrap_or_default();
        debug!("OCR extracted {} chars", text.len());
        Ok(text)
    }
}

const B64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Standard base64 with padding, for the annotate image payload.
fn base64_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let n = (b0 << 16) | (b1 << 8) | b2;

        out.push(B64_ALPHABET[(n >> 18) as usize & 0x3f] as char);
        out.push(B64_ALPHABET[(n >> 12) as usize & 0x3f] as char);
        out.push(if chunk.len() > 1 {
            B64_ALPHABET[(n >> 6) as usize & 0x3f] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            B64_ALPHABET[n as usize & 0x3f] as char
        } else {
            '='
        });
    }
    out
}
