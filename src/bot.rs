//! Bot run loop
//!
//! Long-polls Telegram, routes each update through the session controller,
//! and renders outcomes back as reply text. Transport, OCR and file faults
//! are logged and the loop moves on; nothing here is fatal.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::signal_core::{AnalyzeOutcome, SessionController, UploadOutcome};
use crate::telegram::{Message, TelegramClient};
use crate::vision::Ocr;

/// The one instrument this bot recommends on.
const PAIR: &str = "XAUUSD";

const GREETING: &str = "SniperBot online. Send screenshots with captions 4H/1H/30M/15M/5M.";
const RESEND_PROMPT: &str = "Saved. Please resend with caption one of: 5M,15M,30M,1H,4H.";
const NO_DATA: &str = "No parsed screenshots found. Upload images with captions first.";
const NO_IMAGE: &str = "No image found.";
const OCR_FAILED: &str = "Could not read that image. Please try again.";

pub struct SniperBot {
    telegram: TelegramClient,
    ocr: Box<dyn Ocr>,
    controller: SessionController,
    /// Audit directory for received screenshots, partitioned by UTC date
    upload_dir: PathBuf,
    /// Long-poll hold time in seconds
    poll_timeout: u64,
}

impl SniperBot {
    pub fn new(
        telegram: TelegramClient,
        ocr: Box<dyn Ocr>,
        controller: SessionController,
        upload_dir: PathBuf,
        poll_timeout: u64,
    ) -> Self {
        Self {
            telegram,
            ocr,
            controller,
            upload_dir,
            poll_timeout,
        }
    }

    /// Poll forever. Each update is handled to completion before the next,
    /// which serializes same-user session operations.
    pub async fn run(&mut self) -> Result<()> {
        info!("Bot started");
        let mut offset: Option<i64> = None;

        loop {
            let updates = match self.telegram.get_updates(offset, self.poll_timeout).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("getUpdates failed, retrying: {:#}", e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let Some(message) = update.message else { continue };
                if let Err(e) = self.handle_message(&message).await {
                    error!("Failed to handle message {}: {:#}", message.message_id, e);
                }
            }
        }
    }

    async fn handle_message(&mut self, msg: &Message) -> Result<()> {
        let user = msg.from.as_ref().map_or(msg.chat.id, |u| u.id);

        let reply = match msg.text.as_deref().map(str::trim) {
            Some("/start") => GREETING.to_string(),
            Some("/analyze") => render_analysis(self.controller.handle_analyze(user)),
            _ if msg.photo.is_some() => self.handle_photo(user, msg).await?,
            Some(_) | None => return Ok(()), // not for us
        };

        self.telegram
            .send_message(msg.chat.id, &reply)
            .await
            .context("Failed to send reply")
    }

    async fn handle_photo(&mut self, user: i64, msg: &Message) -> Result<String> {
        let Some(photo) = msg.largest_photo() else {
            return Ok(NO_IMAGE.to_string());
        };

        let image = self
            .telegram
            .download_photo(&photo.file_id)
            .await
            .context("Failed to download photo")?;

        // Audit copy is written before any caption validation, so rejected
        // uploads are still on disk.
        if let Err(e) = self.save_upload(user, msg.message_id, &image).await {
            warn!("Audit save failed for user {}: {:#}", user, e);
        }

        let text = match self.ocr.extract_text(&image).await {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR failed for user {}: {:#}", user, e);
                return Ok(OCR_FAILED.to_string());
            }
        };

        let outcome = self
            .controller
            .handle_upload(user, msg.caption.as_deref(), &text);
        Ok(render_upload(outcome))
    }

    async fn save_upload(&self, user: i64, message_id: i64, image: &[u8]) -> Result<()> {
        let day_dir = self.upload_dir.join(Utc::now().format("%Y-%m-%d").to_string());
        tokio::fs::create_dir_all(&day_dir)
            .await
            .with_context(|| format!("Failed to create {}", day_dir.display()))?;
        let path = day_dir.join(format!("{}_{}.jpg", user, message_id));
        tokio::fs::write(&path, image)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

fn render_upload(outcome: UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Stored {
            timeframe,
            token_count,
            ..
        } => {
            if token_count == 0 {
                format!(
                    "{} parsed, but no prices were readable. Re-send {} or continue; /analyze when done.",
                    timeframe, timeframe
                )
            } else {
                format!("{} parsed. When done send /analyze", timeframe)
            }
        }
        UploadOutcome::BadCaption { .. } => RESEND_PROMPT.to_string(),
    }
}

fn render_analysis(outcome: AnalyzeOutcome) -> String {
    match outcome {
        AnalyzeOutcome::Recommendation(rec) => format!(
            "PAIR: {}\nSIDE: {}\nENTRY: {}\nSL: {}\nTP: {}\nLOTS: {}\nR:R: {}:1",
            PAIR, rec.side, rec.entry, rec.stop_loss, rec.take_profit, rec.position_size, rec.risk_reward
        ),
        AnalyzeOutcome::NoData => NO_DATA.to_string(),
        AnalyzeOutcome::Failed(err) => format!("Analysis error: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_core::{AnalysisError, Side, Timeframe, TradeRecommendation};

    #[test]
    fn test_render_stored_upload() {
        let text = render_upload(UploadOutcome::Stored {
            timeframe: Timeframe::M15,
            token_count: 3,
            session_size: 2,
        });
        assert_eq!(text, "15M parsed. When done send /analyze");
    }

    #[test]
    fn test_render_empty_upload_mentions_timeframe() {
        let text = render_upload(UploadOutcome::Stored {
            timeframe: Timeframe::H4,
            token_count: 0,
            session_size: 1,
        });
        assert!(text.contains("4H"));
        assert!(text.contains("no prices"));
    }

    #[test]
    fn test_render_bad_caption() {
        let text = render_upload(UploadOutcome::BadCaption {
            given: Some("1D".to_string()),
        });
        assert_eq!(text, RESEND_PROMPT);
    }

    #[test]
    fn test_render_recommendation() {
        let rec = TradeRecommendation {
            side: Side::Long,
            entry: 2000.0,
            stop_loss: 1998.5,
            take_profit: 2006.0,
            position_size: 0.67,
            risk_reward: 4.0,
        };
        let text = render_analysis(AnalyzeOutcome::Recommendation(rec));
        assert!(text.starts_with("PAIR: XAUUSD\nSIDE: LONG\n"));
        assert!(text.contains("SL: 1998.5"));
        assert!(text.contains("TP: 2006"));
        assert!(text.contains("LOTS: 0.67"));
        assert!(text.ends_with("R:R: 4:1"));
    }

    #[test]
    fn test_render_failures() {
        assert_eq!(render_analysis(AnalyzeOutcome::NoData), NO_DATA);
        assert_eq!(
            render_analysis(AnalyzeOutcome::Failed(AnalysisError::NoPriceFound)),
            "Analysis error: No price found."
        );
    }
}
