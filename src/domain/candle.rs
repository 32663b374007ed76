//! OHLCV candle representation.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Serialize))]
pub struct Candle {
    /// Bucket open time, milliseconds since the Unix epoch (UTC).
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A zero-volume candle with every price set to `price`.
    pub fn flat(timestamp: i64, price: f64) -> Self {
        Self::new(timestamp, price, price, price, price, 0.0)
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Closing prices of a candle series, in order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_candle_has_equal_prices_and_no_volume() {
        let c = Candle::flat(60_000, 101.5);
        assert_eq!(c.open, 101.5);
        assert_eq!(c.high, 101.5);
        assert_eq!(c.low, 101.5);
        assert_eq!(c.close, 101.5);
        assert_eq!(c.volume, 0.0);
    }

    #[test]
    fn datetime_from_millis() {
        // 2024-01-01T00:00:00Z
        let c = Candle::flat(1_704_067_200_000, 1.0);
        let dt = c.datetime().unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn closes_in_order() {
        let candles = vec![Candle::flat(0, 1.0), Candle::flat(1, 2.0), Candle::flat(2, 3.0)];
        assert_eq!(closes(&candles), vec![1.0, 2.0, 3.0]);
    }
}
