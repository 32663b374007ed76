//! Candle data source port trait.

use crate::domain::candle::Candle;
use crate::domain::error::SpottraderError;
use crate::domain::timeframe::Timeframe;

pub trait CandlePort {
    /// The most recent `limit` candles for `symbol` at `timeframe`, oldest
    /// first. Transport and storage errors are returned unchanged.
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, SpottraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SpottraderError>;
}
