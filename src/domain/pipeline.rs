//! Request-level flows over a candle source.
//!
//! These tie the pure transforms to a [`CandlePort`] so the CLI and the web
//! adapter run exactly the same steps.

use crate::domain::candle::{closes, Candle};
use crate::domain::error::SpottraderError;
use crate::domain::gaps::reindex_candles;
use crate::domain::recommendation::{
    advanced_recommendation, basic_recommendation, AdvancedRecommendation, BasicRecommendation,
    EngineParams,
};
use crate::domain::resample::aggregate_candles;
use crate::domain::timeframe::Timeframe;
use crate::ports::candle_port::CandlePort;

/// Fetch, resample to `timeframe`, then fill missing buckets.
pub fn normalize_ohlcv(
    port: &dyn CandlePort,
    symbol: &str,
    timeframe: &str,
    limit: usize,
) -> Result<Vec<Candle>, SpottraderError> {
    let tf: Timeframe = timeframe.parse()?;
    let raw = port.fetch_candles(symbol, tf, limit)?;
    let resampled = aggregate_candles(&raw, tf);
    let filled = reindex_candles(&resampled, tf);

    tracing::debug!(
        symbol,
        timeframe = %tf,
        fetched = raw.len(),
        resampled = resampled.len(),
        filled = filled.len(),
        "normalized ohlcv"
    );
    Ok(filled)
}

fn fetch_closes(
    port: &dyn CandlePort,
    symbol: &str,
    tf: Timeframe,
    limit: usize,
) -> Result<Vec<f64>, SpottraderError> {
    let candles = port.fetch_candles(symbol, tf, limit)?;
    if candles.is_empty() {
        return Err(SpottraderError::NoData {
            symbol: symbol.to_string(),
            interval: tf.to_string(),
        });
    }
    Ok(closes(&candles))
}

pub fn recommend(
    port: &dyn CandlePort,
    symbol: &str,
    interval: &str,
    params: &EngineParams,
) -> Result<BasicRecommendation, SpottraderError> {
    let tf: Timeframe = interval.parse()?;
    let closes = fetch_closes(port, symbol, tf, params.limit)?;
    let rec = basic_recommendation(symbol, tf.as_str(), &closes, params);
    tracing::info!(symbol, interval = tf.as_str(), signal = %rec.signal, "basic recommendation");
    Ok(rec)
}

pub fn recommend_advanced(
    port: &dyn CandlePort,
    symbol: &str,
    interval: &str,
    params: &EngineParams,
) -> Result<AdvancedRecommendation, SpottraderError> {
    let tf: Timeframe = interval.parse()?;
    let closes = fetch_closes(port, symbol, tf, params.limit)?;
    let rec = advanced_recommendation(symbol, tf.as_str(), &closes, params);
    tracing::info!(symbol, interval = tf.as_str(), signal = %rec.signal, "advanced recommendation");
    Ok(rec)
}
