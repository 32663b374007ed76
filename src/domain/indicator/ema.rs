//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n closes, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) values are undefined. Periods of 0 or 1 are undefined
//! everywhere.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

/// Streaming EMA over an iterator of closes.
#[derive(Debug, Clone)]
pub struct Ema<I> {
    closes: I,
    period: usize,
    k: f64,
    index: usize,
    sum: f64,
    current: Option<f64>,
}

/// Lazily compute the EMA of `closes`. The returned iterator yields exactly
/// one value per input close.
pub fn ema<I>(closes: I, period: usize) -> Ema<I::IntoIter>
where
    I: IntoIterator<Item = f64>,
{
    Ema {
        closes: closes.into_iter(),
        period,
        k: 2.0 / (period as f64 + 1.0),
        index: 0,
        sum: 0.0,
        current: None,
    }
}

impl<I: Iterator<Item = f64>> Iterator for Ema<I> {
    type Item = Option<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let close = self.closes.next()?;
        let i = self.index;
        self.index += 1;

        if self.period <= 1 {
            return Some(None);
        }

        let value = match self.current {
            Some(prev) => Some(close * self.k + prev * (1.0 - self.k)),
            None => {
                self.sum += close;
                if i == self.period - 1 {
                    Some(self.sum / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.current = value;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.closes.size_hint()
    }
}

pub fn calculate_ema(closes: &[f64], period: usize) -> IndicatorSeries {
    IndicatorSeries::new(
        IndicatorType::Ema(period),
        ema(closes.iter().copied(), period).collect(),
    )
}
