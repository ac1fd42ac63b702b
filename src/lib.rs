// Library crate - exports the signal core and the transport/OCR glue

pub mod bot;
pub mod signal_core;
pub mod telegram;
pub mod vision;

// Re-export commonly used types
pub use bot::SniperBot;
pub use signal_core::{
    AnalysisError, AnalyzeOutcome, SessionController, SessionStore, Side, SignalConfig,
    Timeframe, TimeframeObservation, TradeRecommendation, UploadOutcome,
};
