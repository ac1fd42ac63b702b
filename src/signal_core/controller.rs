//! Session Controller
//!
//! Orchestrates upload-time storage and analyze-time consumption. Per user
//! this is a two-state machine - Idle (no pending session) and Collecting -
//! realized by the store's empty-vs-nonempty map. Every failure is absorbed
//! into an outcome value here; nothing escapes to crash the poll loop.

use tracing::{info, warn};

use super::engine::{self, AnalysisError, SignalConfig, TradeRecommendation};
use super::extract::extract_prices;
use super::observation::Timeframe;
use super::session::SessionStore;

/// Result of one screenshot upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Observation stored (replacing any prior one for this timeframe).
    Stored {
        timeframe: Timeframe,
        /// Price-shaped tokens extracted from this screenshot.
        token_count: usize,
        /// Timeframes now pending in the session.
        session_size: usize,
    },
    /// Caption missing or not one of the five labels; nothing stored.
    BadCaption { given: Option<String> },
}

/// Result of one analyze trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeOutcome {
    /// Analysis succeeded; the session has been cleared.
    Recommendation(TradeRecommendation),
    /// No pending session for this user.
    NoData,
    /// Analysis failed; the session is left intact for a retry.
    Failed(AnalysisError),
}

/// Owns the session store and the signal config; one instance serves all
/// users, partitioned by user id.
pub struct SessionController {
    store: SessionStore,
    config: SignalConfig,
}

impl SessionController {
    pub fn new(store: SessionStore, config: SignalConfig) -> Self {
        Self { store, config }
    }

    /// Store the extracted observation for an upload, if its caption names a
    /// recognized timeframe. An unrecognized caption discards the parsed data
    /// (the transport layer still audits the raw image).
    pub fn handle_upload(&mut self, user: i64, caption: Option<&str>, ocr_text: &str) -> UploadOutcome {
        let Some(timeframe) = caption.and_then(|c| c.parse::<Timeframe>().ok()) else {
            info!("User {}: rejected caption {:?}", user, caption);
            return UploadOutcome::BadCaption {
                given: caption.map(str::to_string),
            };
        };

        let obs = extract_prices(ocr_text);
        let token_count = obs.numbers.len();
        if let Err(e) = self.store.put(user, timeframe, obs) {
            // Session stays usable in memory even if the file write failed.
            warn!("User {}: session persist failed: {:#}", user, e);
        }
        let session_size = self.store.timeframe_count(user);
        info!(
            "User {}: stored {} observation ({} tokens, {} timeframes pending)",
            user, timeframe, token_count, session_size
        );

        UploadOutcome::Stored {
            timeframe,
            token_count,
            session_size,
        }
    }

    /// Run the signal engine against the accumulated session.
    ///
    /// Success consumes the session (back to Idle); failure leaves it intact
    /// so the user can retry after more uploads.
    pub fn handle_analyze(&mut self, user: i64) -> AnalyzeOutcome {
        let snapshot = self.store.snapshot(user);
        if snapshot.is_empty() {
            return AnalyzeOutcome::NoData;
        }

        match engine::analyze(&snapshot, &self.config) {
            Ok(rec) => {
                if let Err(e) = self.store.clear(user) {
                    warn!("User {}: session clear persist failed: {:#}", user, e);
                }
                info!(
                    "User {}: {} @ {} (SL {}, TP {}, {} lots)",
                    user, rec.side, rec.entry, rec.stop_loss, rec.take_profit, rec.position_size
                );
                AnalyzeOutcome::Recommendation(rec)
            }
            Err(err) => {
                info!("User {}: analysis failed: {}", user, err);
                AnalyzeOutcome::Failed(err)
            }
        }
    }
}
