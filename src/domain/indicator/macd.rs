//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//!
//! Known limitation: the signal EMA runs over the MACD line with its
//! undefined warmup positions replaced by 0.0, so the signal seed averages
//! those zeros in. Downstream signals depend on this, so it is kept as is.

use crate::domain::indicator::{ema, IndicatorSeries, IndicatorType};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let line: Vec<Option<f64>> = ema(closes.iter().copied(), fast)
        .zip(ema(closes.iter().copied(), slow))
        .map(|pair| match pair {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal_values: Vec<Option<f64>> =
        ema(line.iter().map(|v| v.unwrap_or(0.0)), signal).collect();

    let histogram: Vec<Option<f64>> = line
        .iter()
        .zip(&signal_values)
        .map(|pair| match pair {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdSeries {
        line: IndicatorSeries::new(IndicatorType::MacdLine { fast, slow }, line),
        signal: IndicatorSeries::new(IndicatorType::MacdSignal { fast, slow, signal }, signal_values),
        histogram: IndicatorSeries::new(
            IndicatorType::MacdHistogram { fast, slow, signal },
            histogram,
        ),
    }
}

pub fn calculate_macd_default(closes: &[f64]) -> MacdSeries {
    calculate_macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
