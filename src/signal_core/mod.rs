//! Signal Core - transport-agnostic screenshot analysis
//!
//! This module contains the core components, leaf first:
//! - Price token extraction from raw OCR text
//! - Timeframe labels and per-upload observations
//! - Per-user session accumulation (optionally file-backed)
//! - Signal derivation: entry, volatility proxy, bias, risk sizing
//! - Session lifecycle orchestration
//!
//! Nothing in here knows about Telegram or Google Vision.

pub mod controller;
pub mod engine;
pub mod extract;
pub mod observation;
pub mod session;

// Re-export commonly used types
pub use controller::{AnalyzeOutcome, SessionController, UploadOutcome};
pub use engine::{AnalysisError, Side, SignalConfig, TradeRecommendation};
pub use extract::extract_prices;
pub use observation::{Timeframe, TimeframeObservation};
pub use session::{SessionStore, UserSession};
