//! OCR collaborator
//!
//! The core only needs one thing from OCR: image bytes in, text out. The
//! trait keeps the bot testable without network access; `VisionClient` is
//! the production implementation against Google Cloud Vision.

mod client;

use anyhow::Result;
use async_trait::async_trait;

pub use client::VisionClient;

/// Turns image bytes into extracted text. Empty text is a valid answer
/// (a chart with no readable print).
#[async_trait]
pub trait Ocr: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> Result<String>;
}
