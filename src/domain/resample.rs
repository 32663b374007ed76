//! Timeframe resampling of candle series.
//!
//! Candles are grouped into buckets aligned by [`Timeframe::bucket_start`];
//! each non-empty bucket becomes one candle stamped with the bucket start.
//! Empty buckets are not emitted; filling them is the job of
//! [`crate::domain::gaps::fill_candle_gaps`].

use crate::domain::candle::Candle;
use crate::domain::error::SpottraderError;
use crate::domain::timeframe::Timeframe;

/// Resample `candles` to the timeframe named by `timeframe`.
pub fn resample_ohlcv(candles: &[Candle], timeframe: &str) -> Result<Vec<Candle>, SpottraderError> {
    let tf: Timeframe = timeframe.parse()?;
    Ok(aggregate_candles(candles, tf))
}

/// Aggregate candles into `timeframe` buckets using OHLC semantics:
/// first open, max high, min low, last close, summed volume.
pub fn aggregate_candles(candles: &[Candle], timeframe: Timeframe) -> Vec<Candle> {
    if candles.is_empty() {
        return Vec::new();
    }

    let mut sorted = candles.to_vec();
    sorted.sort_by_key(|c| c.timestamp);

    let mut aggregated = Vec::new();
    let mut current: Option<Candle> = None;

    for candle in &sorted {
        let bucket_start = timeframe.bucket_start(candle.timestamp);

        match current {
            Some(ref mut agg) if agg.timestamp == bucket_start => {
                agg.high = agg.high.max(candle.high);
                agg.low = agg.low.min(candle.low);
                agg.close = candle.close;
                agg.volume += candle.volume;
            }
            _ => {
                if let Some(done) = current.take() {
                    aggregated.push(done);
                }
                current = Some(Candle::new(
                    bucket_start,
                    candle.open,
                    candle.high,
                    candle.low,
                    candle.close,
                    candle.volume,
                ));
            }
        }
    }

    if let Some(done) = current {
        aggregated.push(done);
    }

    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    fn c(ts: i64, o: f64, h: f64, l: f64, cl: f64, v: f64) -> Candle {
        Candle::new(ts, o, h, l, cl, v)
    }

    #[test]
    fn five_one_minute_candles_make_one_five_minute_candle() {
        let candles = vec![
            c(0, 10.0, 12.0, 9.0, 11.0, 1.0),
            c(MIN, 11.0, 15.0, 10.0, 14.0, 2.0),
            c(2 * MIN, 14.0, 14.5, 8.0, 9.0, 3.0),
            c(3 * MIN, 9.0, 10.0, 8.5, 9.5, 4.0),
            c(4 * MIN, 9.5, 11.0, 9.0, 10.5, 5.0),
        ];
        let out = resample_ohlcv(&candles, "5m").unwrap();

        assert_eq!(out, vec![c(0, 10.0, 15.0, 8.0, 10.5, 15.0)]);
    }

    #[test]
    fn empty_buckets_are_dropped() {
        let candles = vec![
            c(0, 1.0, 1.0, 1.0, 1.0, 1.0),
            c(20 * MIN, 2.0, 2.0, 2.0, 2.0, 1.0),
        ];
        let out = resample_ohlcv(&candles, "5m").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, 0);
        assert_eq!(out[1].timestamp, 20 * MIN);
    }

    #[test]
    fn output_is_stamped_with_bucket_start() {
        let candles = vec![c(7 * MIN, 1.0, 2.0, 0.5, 1.5, 3.0)];
        let out = resample_ohlcv(&candles, "5m").unwrap();
        assert_eq!(out[0].timestamp, 5 * MIN);
    }

    #[test]
    fn unsorted_input_is_ordered_first() {
        let candles = vec![
            c(MIN, 11.0, 11.0, 11.0, 11.0, 1.0),
            c(0, 10.0, 10.0, 10.0, 10.0, 1.0),
        ];
        let out = resample_ohlcv(&candles, "5m").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].open, 10.0);
        assert_eq!(out[0].close, 11.0);
    }

    #[test]
    fn unsupported_timeframe_is_rejected() {
        let err = resample_ohlcv(&[], "2m").unwrap_err();
        assert!(matches!(err, SpottraderError::UnsupportedTimeframe { .. }));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(resample_ohlcv(&[], "1h").unwrap().is_empty());
    }

    #[test]
    fn resampling_is_idempotent() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| c(i * MIN, 100.0 + i as f64, 101.0 + i as f64, 99.0, 100.5, 2.0))
            .collect();
        let once = resample_ohlcv(&candles, "15m").unwrap();
        let twice = resample_ohlcv(&once, "15m").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn same_granularity_is_identity() {
        let candles: Vec<Candle> = (0..5)
            .map(|i| c(i * MIN, 1.0, 2.0, 0.5, 1.5, 10.0))
            .collect();
        assert_eq!(resample_ohlcv(&candles, "1m").unwrap(), candles);
    }
}
