//! Recommendation engines.
//!
//! The basic engine crosses a fast and slow EMA, filtered by RSI. The
//! advanced engine compares the MACD line against its signal line and grades
//! the result by RSI zone. Both work on the latest indicator values only.

use crate::domain::indicator::{calculate_ema, calculate_macd, calculate_rsi, macd, rsi};
use crate::domain::signal::Signal;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LIMIT: usize = 300;

/// Indicator periods and the candle window fed to the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub limit: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            ema_fast: 12,
            ema_slow: 26,
            rsi_period: rsi::DEFAULT_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl EngineParams {
    /// Read `[indicators]` and `[market] limit`, falling back to defaults.
    /// Run `validate_config` first; negative values are clamped to zero here.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let d = Self::default();
        let get = |section: &str, key: &str, default: usize| {
            config.get_int(section, key, default as i64).max(0) as usize
        };
        Self {
            ema_fast: get("indicators", "ema_fast", d.ema_fast),
            ema_slow: get("indicators", "ema_slow", d.ema_slow),
            rsi_period: get("indicators", "rsi_period", d.rsi_period),
            macd_fast: get("indicators", "macd_fast", d.macd_fast),
            macd_slow: get("indicators", "macd_slow", d.macd_slow),
            macd_signal: get("indicators", "macd_signal", d.macd_signal),
            limit: get("market", "limit", d.limit),
        }
    }
}

/// EMA crossover filtered by RSI. Emits only BUY, SELL or HOLD.
pub fn basic_signal(ema_fast: Option<f64>, ema_slow: Option<f64>, rsi: Option<f64>) -> Signal {
    let mut signal = Signal::Hold;
    if let (Some(fast), Some(slow)) = (ema_fast, ema_slow) {
        if fast > slow && rsi.is_none_or(|r| r < 70.0) {
            signal = Signal::Buy;
        }
        // Checked after BUY and allowed to overwrite it.
        if fast < slow && rsi.is_none_or(|r| r > 30.0) {
            signal = Signal::Sell;
        }
    }
    signal
}

/// MACD momentum graded by RSI zone.
pub fn advanced_signal(macd: Option<f64>, macd_signal: Option<f64>, rsi: Option<f64>) -> Signal {
    let (Some(line), Some(sig)) = (macd, macd_signal) else {
        return Signal::Hold;
    };

    if line > sig {
        match rsi {
            Some(r) if r < 30.0 => Signal::StrongBuy,
            Some(r) if r < 50.0 => Signal::Buy,
            _ => Signal::Hold,
        }
    } else if line < sig {
        match rsi {
            Some(r) if r > 70.0 => Signal::StrongSell,
            Some(r) if r > 50.0 => Signal::Sell,
            _ => Signal::Hold,
        }
    } else {
        Signal::Hold
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Serialize))]
pub struct BasicRecommendation {
    pub symbol: String,
    pub interval: String,
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    pub rsi14: Option<f64>,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Serialize))]
pub struct AdvancedRecommendation {
    pub symbol: String,
    pub interval: String,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub rsi14: Option<f64>,
    pub signal: Signal,
}

pub fn basic_recommendation(
    symbol: &str,
    interval: &str,
    closes: &[f64],
    params: &EngineParams,
) -> BasicRecommendation {
    let ema12 = calculate_ema(closes, params.ema_fast).last();
    let ema26 = calculate_ema(closes, params.ema_slow).last();
    let rsi14 = calculate_rsi(closes, params.rsi_period).last();

    BasicRecommendation {
        symbol: symbol.to_string(),
        interval: interval.to_string(),
        ema12,
        ema26,
        rsi14,
        signal: basic_signal(ema12, ema26, rsi14),
    }
}

pub fn advanced_recommendation(
    symbol: &str,
    interval: &str,
    closes: &[f64],
    params: &EngineParams,
) -> AdvancedRecommendation {
    let series = calculate_macd(closes, params.macd_fast, params.macd_slow, params.macd_signal);
    let macd = series.line.last();
    let macd_signal = series.signal.last();
    let rsi14 = calculate_rsi(closes, params.rsi_period).last();

    AdvancedRecommendation {
        symbol: symbol.to_string(),
        interval: interval.to_string(),
        macd,
        macd_signal,
        macd_histogram: series.histogram.last(),
        rsi14,
        signal: advanced_signal(macd, macd_signal, rsi14),
    }
}
