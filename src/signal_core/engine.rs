//! Signal Engine
//!
//! Turns an accumulated session snapshot into a single trade recommendation:
//! entry from the fastest populated timeframe, a population-standard-deviation
//! volatility proxy standing in for ATR, a last-vs-mean directional bias on
//! the 15M chart standing in for an EMA cross, and fixed-ratio risk sizing.
//!
//! This is deliberately a heuristic approximation layer over noisy OCR
//! output, not finance-grade indicator math.

use serde::Serialize;

use super::observation::Timeframe;
use super::session::UserSession;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Long,
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// Tunables for signal derivation and position sizing.
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Account balance in account-currency units
    pub balance: f64,
    /// Fraction of balance risked per trade
    pub risk_fraction: f64,
    /// Stop distance as a multiple of the volatility proxy
    pub atr_stop_mult: f64,
    /// Take-profit distance as a multiple of the stop distance
    pub reward_risk: f64,
    /// Account-currency value of one price point per lot
    pub contract_multiplier: f64,
    /// Number of trailing 15M tokens averaged for the bias reference
    pub bias_window: usize,
    /// Floor for the computed position size in lots
    pub min_position: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            balance: 10_000.0,
            risk_fraction: 0.01,
            atr_stop_mult: 1.5,
            reward_risk: 4.0,
            contract_multiplier: 100.0,
            bias_window: 5,
            min_position: 0.01,
        }
    }
}

/// One complete trade recommendation. Derived per analysis, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecommendation {
    pub side: Side,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Lots
    pub position_size: f64,
    pub risk_reward: f64,
}

/// Why an analysis produced no recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No timeframe in the session held a single numeric token.
    NoPriceFound,
    /// Unexpected computation fault, reported with its cause.
    Internal(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::NoPriceFound => write!(f, "No price found."),
            AnalysisError::Internal(cause) => write!(f, "{}", cause),
        }
    }
}

impl std::error::Error for AnalysisError {}

fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Entry price: the last token of the first populated timeframe in priority
/// order (5M first - the fastest chart carries the freshest print).
fn select_entry(session: &UserSession) -> Result<f64, AnalysisError> {
    for tf in Timeframe::PRIORITY {
        if let Some(last) = session.get(&tf).and_then(|obs| obs.numbers.last()) {
            return last.parse::<f64>().map_err(|e| {
                AnalysisError::Internal(format!("Bad entry token {:?} on {}: {}", last, tf, e))
            });
        }
    }
    Err(AnalysisError::NoPriceFound)
}

/// Population standard deviation of every parseable token in the session.
///
/// Tokens that fail to parse are filtered out here - tolerated OCR noise, not
/// a caught exception. Fewer than two usable values falls back to 1.0.
fn volatility_proxy(session: &UserSession) -> f64 {
    let values: Vec<f64> = session
        .values()
        .flat_map(|obs| obs.numbers.iter())
        .filter_map(|n| n.parse::<f64>().ok())
        .collect();

    if values.len() < 2 {
        return 1.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Directional bias from the 15M chart: Long when its last token exceeds the
/// mean of its trailing window, Short otherwise. No 15M data defaults Long.
fn directional_bias(session: &UserSession, window: usize) -> Result<Side, AnalysisError> {
    let Some(obs) = session.get(&Timeframe::M15).filter(|o| !o.is_empty()) else {
        return Ok(Side::Long);
    };

    let parse = |token: &String| -> Result<f64, AnalysisError> {
        token.parse::<f64>().map_err(|e| {
            AnalysisError::Internal(format!("Bad 15M token {:?}: {}", token, e))
        })
    };

    let tail_start = obs.numbers.len().saturating_sub(window.max(1));
    let tail = &obs.numbers[tail_start..];
    let Some(last_token) = tail.last() else {
        return Ok(Side::Long);
    };
    let mut sum = 0.0;
    for token in tail {
        sum += parse(token)?;
    }
    let reference = sum / tail.len() as f64;
    let last = parse(last_token)?;

    Ok(if last > reference { Side::Long } else { Side::Short })
}

/// Fixed-ratio risk arithmetic: stop at `atr_stop_mult` volatilities, target
/// at `reward_risk` stops, size for `risk_fraction` of balance.
///
/// A degenerate stop distance (zero or non-finite, e.g. every token in the
/// session identical) fails the analysis instead of emitting an unbounded
/// position size.
pub fn risk_parameters(
    entry: f64,
    volatility: f64,
    side: Side,
    config: &SignalConfig,
) -> Result<TradeRecommendation, AnalysisError> {
    let sl_distance = config.atr_stop_mult * volatility;
    if !sl_distance.is_finite() || sl_distance <= 0.0 {
        return Err(AnalysisError::Internal(format!(
            "Degenerate stop distance {} from volatility {}",
            sl_distance, volatility
        )));
    }
    let tp_distance = config.reward_risk * sl_distance;

    let (stop_loss, take_profit) = match side {
        Side::Long => (entry - sl_distance, entry + tp_distance),
        Side::Short => (entry + sl_distance, entry - tp_distance),
    };

    let risk = config.balance * config.risk_fraction;
    let position_size = round_dp(risk / (sl_distance * config.contract_multiplier), 2)
        .max(config.min_position);

    Ok(TradeRecommendation {
        side,
        entry: round_dp(entry, 3),
        stop_loss: round_dp(stop_loss, 3),
        take_profit: round_dp(take_profit, 3),
        position_size,
        risk_reward: config.reward_risk,
    })
}

/// Derive a recommendation from a session snapshot.
///
/// Fully succeeds or fully fails; the caller decides what happens to the
/// session afterwards.
pub fn analyze(
    session: &UserSession,
    config: &SignalConfig,
) -> Result<TradeRecommendation, AnalysisError> {
    let entry = select_entry(session)?;
    let volatility = volatility_proxy(session);
    let side = directional_bias(session, config.bias_window)?;
    risk_parameters(entry, volatility, side, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_core::observation::TimeframeObservation;

    fn obs(nums: &[&str]) -> TimeframeObservation {
        TimeframeObservation::new(nums.iter().map(|s| s.to_string()).collect(), "raw")
    }

    fn session(entries: &[(Timeframe, &[&str])]) -> UserSession {
        entries.iter().map(|(tf, nums)| (*tf, obs(nums))).collect()
    }

    #[test]
    fn test_empty_session_is_no_price() {
        let result = analyze(&UserSession::new(), &SignalConfig::default());
        assert_eq!(result, Err(AnalysisError::NoPriceFound));
    }

    #[test]
    fn test_empty_observations_are_no_price() {
        let snap = session(&[(Timeframe::M5, &[]), (Timeframe::H4, &[])]);
        assert_eq!(select_entry(&snap), Err(AnalysisError::NoPriceFound));
    }

    #[test]
    fn test_entry_priority_fastest_wins() {
        let snap = session(&[(Timeframe::H1, &["9.99"]), (Timeframe::M5, &["1.23"])]);
        assert_eq!(select_entry(&snap), Ok(1.23));

        let rec = analyze(&snap, &SignalConfig::default()).unwrap();
        assert_eq!(rec.entry, 1.23);
        assert_eq!(rec.side, Side::Long); // no 15M data -> default Long
    }

    #[test]
    fn test_entry_is_last_token() {
        let snap = session(&[(Timeframe::M30, &["2001.0", "2003.5", "2002.25"])]);
        assert_eq!(select_entry(&snap), Ok(2002.25));
    }

    #[test]
    fn test_volatility_population_std() {
        let snap = session(&[
            (Timeframe::M5, &["100.0", "200.0"]),
            (Timeframe::H1, &["300.0", "400.0"]),
        ]);
        let proxy = volatility_proxy(&snap);
        assert!((proxy - 111.80339887498948).abs() < 1e-9);
    }

    #[test]
    fn test_volatility_defaults_on_sparse_data() {
        assert_eq!(volatility_proxy(&session(&[(Timeframe::M5, &["2000.0"])])), 1.0);
        assert_eq!(volatility_proxy(&UserSession::new()), 1.0);
    }

    #[test]
    fn test_volatility_filters_unparseable_tokens() {
        // The junk token is discarded, leaving a single value -> default 1.0
        let snap = session(&[(Timeframe::M5, &["garbage", "2000.0"])]);
        assert_eq!(volatility_proxy(&snap), 1.0);
    }

    #[test]
    fn test_bias_follows_last_vs_mean() {
        let rising = session(&[(Timeframe::M15, &["101.0", "103.0", "105.0"])]);
        assert_eq!(directional_bias(&rising, 5), Ok(Side::Long));

        let falling = session(&[(Timeframe::M15, &["105.0", "103.0", "101.0"])]);
        assert_eq!(directional_bias(&falling, 5), Ok(Side::Short));
    }

    #[test]
    fn test_bias_window_limits_reference() {
        // Only the last 5 tokens feed the mean; the early outlier is ignored.
        let snap = session(&[(Timeframe::M15, &[
            "9000.0", "100.0", "100.0", "100.0", "100.0", "101.0",
        ])]);
        assert_eq!(directional_bias(&snap, 5), Ok(Side::Long));
    }

    #[test]
    fn test_bias_defaults_long_without_15m() {
        let snap = session(&[(Timeframe::H4, &["2000.0", "2010.0"])]);
        assert_eq!(directional_bias(&snap, 5), Ok(Side::Long));
    }

    #[test]
    fn test_risk_math_long() {
        // entry 2000, proxy 1.0 -> stop 1.5 away, target 6.0 away, 0.67 lots
        let rec = risk_parameters(2000.0, 1.0, Side::Long, &SignalConfig::default()).unwrap();
        assert_eq!(rec.stop_loss, 1998.5);
        assert_eq!(rec.take_profit, 2006.0);
        assert_eq!(rec.position_size, 0.67);
        assert_eq!(rec.risk_reward, 4.0);
    }

    #[test]
    fn test_risk_math_short_mirror() {
        let rec = risk_parameters(2000.0, 1.0, Side::Short, &SignalConfig::default()).unwrap();
        assert_eq!(rec.stop_loss, 2001.5);
        assert_eq!(rec.take_profit, 1994.0);
        assert_eq!(rec.position_size, 0.67);
    }

    #[test]
    fn test_position_size_floor() {
        // Huge stop distance -> computed size rounds to 0.00, floored to 0.01
        let rec = risk_parameters(2000.0, 500.0, Side::Long, &SignalConfig::default()).unwrap();
        assert_eq!(rec.position_size, 0.01);
    }

    #[test]
    fn test_analyze_end_to_end_single_timeframe() {
        let snap = session(&[(Timeframe::M5, &["2000.000"])]);
        let rec = analyze(&snap, &SignalConfig::default()).unwrap();
        assert_eq!(rec.side, Side::Long);
        assert_eq!(rec.entry, 2000.0);
        assert_eq!(rec.stop_loss, 1998.5);
        assert_eq!(rec.take_profit, 2006.0);
        assert_eq!(rec.position_size, 0.67);
    }

    #[test]
    fn test_identical_tokens_fail_cleanly() {
        // Zero standard deviation must not leak an unbounded position size.
        let snap = session(&[(Timeframe::M5, &["2000.0", "2000.0"])]);
        assert!(matches!(
            analyze(&snap, &SignalConfig::default()),
            Err(AnalysisError::Internal(_))
        ));
    }

    #[test]
    fn test_bad_entry_token_is_internal_error() {
        let snap = session(&[(Timeframe::M5, &["not-a-price"])]);
        assert!(matches!(select_entry(&snap), Err(AnalysisError::Internal(_))));
    }
}
