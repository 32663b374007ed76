//! Technical indicator implementations.
//!
//! Every indicator is available in two forms: a lazy iterator yielding one
//! `Option<f64>` per input close (`None` until enough history exists), and a
//! `calculate_*` function collecting that iterator into an [`IndicatorSeries`]
//! aligned 1:1 with its input.

pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::{calculate_ema, ema, Ema};
pub use macd::{calculate_macd, calculate_macd_default, MacdSeries};
pub use rsi::{calculate_rsi, rsi, Rsi};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
    MacdLine { fast: usize, slow: usize },
    MacdSignal { fast: usize, slow: usize, signal: usize },
    MacdHistogram { fast: usize, slow: usize, signal: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(indicator_type: IndicatorType, values: Vec<Option<f64>>) -> Self {
        Self {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Value at the final position; `None` if the series is empty or the
    /// last value is still in warmup.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::MacdLine { fast, slow } => write!(f, "MACD({},{})", fast, slow),
            IndicatorType::MacdSignal { fast, slow, signal } => {
                write!(f, "MACD_SIGNAL({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdHistogram { fast, slow, signal } => {
                write!(f, "MACD_HIST({},{},{})", fast, slow, signal)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_ema() {
        assert_eq!(IndicatorType::Ema(12).to_string(), "EMA(12)");
    }

    #[test]
    fn indicator_type_display_macd_signal() {
        let t = IndicatorType::MacdSignal {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(t.to_string(), "MACD_SIGNAL(12,26,9)");
    }

    #[test]
    fn last_skips_nothing_and_respects_warmup() {
        let series = IndicatorSeries::new(IndicatorType::Ema(3), vec![None, None, Some(2.0)]);
        assert_eq!(series.last(), Some(2.0));

        let warm = IndicatorSeries::new(IndicatorType::Ema(3), vec![Some(1.0), None]);
        assert_eq!(warm.last(), None);

        let empty = IndicatorSeries::new(IndicatorType::Rsi(14), vec![]);
        assert_eq!(empty.last(), None);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let series = IndicatorSeries::new(IndicatorType::Ema(1), vec![Some(1.0)]);
        assert_eq!(series.get(0), Some(1.0));
        assert_eq!(series.get(5), None);
    }

    #[test]
    fn defined_count() {
        let series = IndicatorSeries::new(IndicatorType::Rsi(2), vec![None, None, Some(50.0), Some(60.0)]);
        assert_eq!(series.defined_count(), 2);
        assert_eq!(series.len(), 4);
    }
}
