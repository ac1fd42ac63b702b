//! Timeframe labels and per-timeframe observations

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Chart interval a screenshot is tagged with.
///
/// Serializes as the caption label ("5M", "1H", ...) so it can be used
/// directly as a JSON map key in session files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5M")]
    M5,
    #[serde(rename = "15M")]
    M15,
    #[serde(rename = "30M")]
    M30,
    #[serde(rename = "1H")]
    H1,
    #[serde(rename = "4H")]
    H4,
}

impl Timeframe {
    /// Entry-price scan order: fastest chart wins.
    pub const PRIORITY: [Timeframe; 5] = [
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
    ];

    /// Caption label as the user types it.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M5 => "5M",
            Timeframe::M15 => "15M",
            Timeframe::M30 => "30M",
            Timeframe::H1 => "1H",
            Timeframe::H4 => "4H",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Timeframe {
    type Err = ();

    /// Parses a caption, tolerating whitespace and lowercase ("15m" -> M15).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "5M" => Ok(Timeframe::M5),
            "15M" => Ok(Timeframe::M15),
            "30M" => Ok(Timeframe::M30),
            "1H" => Ok(Timeframe::H1),
            "4H" => Ok(Timeframe::H4),
            _ => Err(()),
        }
    }
}

/// Extracted numeric data for one (user, timeframe) upload.
///
/// `numbers` keeps the price-shaped tokens in order of appearance as raw
/// strings (parsing is deferred to the signal engine); `raw` keeps the full
/// OCR text for audit. A repeat upload for the same timeframe replaces the
/// whole observation - numbers are never merged across uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframeObservation {
    pub numbers: Vec<String>,
    pub raw: String,
}

impl TimeframeObservation {
    pub fn new(numbers: Vec<String>, raw: impl Into<String>) -> Self {
        Self {
            numbers,
            raw: raw.into(),
        }
    }

    /// True when OCR found text but nothing price-shaped in it.
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}
