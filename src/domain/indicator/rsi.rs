//! RSI (Relative Strength Index) indicator.
//!
//! The first `period` price changes are summed (not averaged) into the gain
//! and loss accumulators while the output stays undefined. Every later change
//! applies Wilder's smoothing to those accumulators:
//! - avg = (prev * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss)), with a zero
//! avg_loss replaced by [`LOSS_EPSILON`].
//!
//! Warmup: indices 0..=n are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub const DEFAULT_PERIOD: usize = 14;

/// Stand-in for a zero average loss.
pub const LOSS_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Rsi<I> {
    closes: I,
    period: usize,
    index: usize,
    prev_close: f64,
    gains: f64,
    losses: f64,
}

/// Lazily compute the RSI of `closes`, one value per input close.
pub fn rsi<I>(closes: I, period: usize) -> Rsi<I::IntoIter>
where
    I: IntoIterator<Item = f64>,
{
    Rsi {
        closes: closes.into_iter(),
        period,
        index: 0,
        prev_close: 0.0,
        gains: 0.0,
        losses: 0.0,
    }
}

impl<I: Iterator<Item = f64>> Iterator for Rsi<I> {
    type Item = Option<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let close = self.closes.next()?;
        let i = self.index;
        self.index += 1;

        let delta = close - self.prev_close;
        self.prev_close = close;

        if i == 0 || self.period == 0 {
            return Some(None);
        }

        if i <= self.period {
            if delta >= 0.0 {
                self.gains += delta;
            } else {
                self.losses -= delta;
            }
            return Some(None);
        }

        let n = self.period as f64;
        self.gains = (self.gains * (n - 1.0) + delta.max(0.0)) / n;
        self.losses = (self.losses * (n - 1.0) + (-delta).max(0.0)) / n;

        let losses = if self.losses == 0.0 {
            LOSS_EPSILON
        } else {
            self.losses
        };
        let rs = self.gains / losses;
        Some(Some(100.0 - 100.0 / (1.0 + rs)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.closes.size_hint()
    }
}

pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    IndicatorSeries::new(
        IndicatorType::Rsi(period),
        rsi(closes.iter().copied(), period).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_single_close() {
        let series = calculate_rsi(&[100.0], 14);
        assert_eq!(series.values, vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=20).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&closes, 14);

        assert_eq!(series.len(), 20);
        for i in 0..=14 {
            assert!(series.values[i].is_none(), "index {} should be undefined", i);
        }
        for i in 15..20 {
            assert!(series.values[i].is_some(), "index {} should be defined", i);
        }
    }

    #[test]
    fn rsi_all_gains_is_near_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&closes, 14);
        let v = series.last().unwrap();
        assert!(v > 99.999 && v <= 100.0, "RSI {} should approach 100", v);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert_relative_eq!(series.last().unwrap(), 0.0);
    }

    #[test]
    fn rsi_flat_prices_is_zero() {
        let series = calculate_rsi(&[50.0; 20], 14);
        assert_relative_eq!(series.last().unwrap(), 0.0);
    }

    #[test]
    fn rsi_smoothing_uses_raw_sums() {
        // period 2: deltas +2, -1 are summed, then smoothed with delta +3.
        let series = calculate_rsi(&[10.0, 12.0, 11.0, 14.0], 2);
        let gains = (2.0 * 1.0 + 3.0) / 2.0;
        let losses = (1.0 * 1.0 + 0.0) / 2.0;
        let expected = 100.0 - 100.0 / (1.0 + gains / losses);

        assert_eq!(&series.values[..3], &[None, None, None]);
        assert_relative_eq!(series.values[3].unwrap(), expected);
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&[100.0, 101.0, 102.0], 0);
        assert_eq!(series.values, vec![None, None, None]);
    }

    #[test]
    fn rsi_indicator_type() {
        let series = calculate_rsi(&[1.0], DEFAULT_PERIOD);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(14));
    }

    proptest! {
        #[test]
        fn rsi_bounded_and_aligned(
            closes in prop::collection::vec(0.0f64..1e5, 0..150),
            period in 1usize..30,
        ) {
            let series = calculate_rsi(&closes, period);
            prop_assert_eq!(series.len(), closes.len());
            for (i, v) in series.values.iter().enumerate() {
                if i <= period {
                    prop_assert!(v.is_none());
                } else {
                    let v = v.unwrap();
                    prop_assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
                }
            }
        }
    }
}
