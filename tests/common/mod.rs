#![allow(dead_code)]

use spottrader::domain::error::SpottraderError;
use spottrader::domain::quote_cache::Clock;
use spottrader::domain::timeframe::Timeframe;
use spottrader::ports::candle_port::CandlePort;
use spottrader::ports::price_port::PricePort;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use spottrader::domain::candle::Candle;

pub const MINUTE_MS: i64 = 60_000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// 2024-01-01 00:00:00 UTC, a Monday.
pub const JAN_1_2024: i64 = 1_704_067_200_000;

pub struct MockCandlePort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
    pub delay: Option<Duration>,
}

impl MockCandlePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            delay: None,
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl CandlePort for MockCandlePort {
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, SpottraderError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SpottraderError::Upstream {
                reason: reason.clone(),
            });
        }
        let candles = self
            .data
            .get(symbol)
            .ok_or_else(|| SpottraderError::NoData {
                symbol: symbol.to_string(),
                interval: timeframe.to_string(),
            })?;
        let skip = candles.len().saturating_sub(limit);
        Ok(candles[skip..].to_vec())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SpottraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Price source that counts how often it is asked.
pub struct MockPricePort {
    pub prices: HashMap<String, f64>,
    pub errors: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            errors: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PricePort for MockPricePort {
    fn ticker_price(&self, symbol: &str) -> Result<f64, SpottraderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SpottraderError::Upstream {
                reason: reason.clone(),
            });
        }
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| SpottraderError::Upstream {
                reason: format!("unknown symbol {}", symbol),
            })
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

pub fn make_candle(timestamp: i64, close: f64) -> Candle {
    Candle::new(timestamp, close, close + 1.0, close - 1.0, close, 1000.0)
}

/// `n` candles `step` ms apart with closes following a gentle wave around
/// `start_price`.
pub fn generate_candles(n: usize, start_ts: i64, step: i64, start_price: f64) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = start_price + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1;
            make_candle(start_ts + i as i64 * step, close)
        })
        .collect()
}

/// `n` candles whose closes move by `delta` each step.
pub fn trending_candles(n: usize, start_ts: i64, step: i64, start_price: f64, delta: f64) -> Vec<Candle> {
    (0..n)
        .map(|i| make_candle(start_ts + i as i64 * step, start_price + i as f64 * delta))
        .collect()
}
