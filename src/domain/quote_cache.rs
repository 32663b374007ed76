//! TTL cache in front of a spot price source.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::ports::price_port::PricePort;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Monotonic time source. `now` is measured from an arbitrary fixed origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedPrice {
    pub price: f64,
    pub fetched_at: Duration,
}

/// Symbol to price cache with a fixed time-to-live.
///
/// The lock is held only to read or write the map, never across a fetch, so
/// two callers may refresh the same symbol at once; the later write wins.
pub struct QuoteCache {
    ttl: Duration,
    clock: Box<dyn Clock>,
    entries: Mutex<HashMap<String, CachedPrice>>,
}

impl QuoteCache {
    pub fn new(ttl: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Box::new(SystemClock::new()))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Price for `symbol`, fetched from `source` unless a fresh entry exists.
    ///
    /// A failed fetch yields `None` and leaves any stored entry untouched.
    pub fn price(&self, source: &dyn PricePort, symbol: &str) -> Option<f64> {
        let now = self.clock.now();
        if let Some(hit) = self.entries().get(symbol) {
            if now.saturating_sub(hit.fetched_at) < self.ttl {
                tracing::trace!(symbol, price = hit.price, "quote cache hit");
                return Some(hit.price);
            }
        }

        match source.ticker_price(symbol) {
            Ok(price) => {
                self.entries().insert(
                    symbol.to_string(),
                    CachedPrice {
                        price,
                        fetched_at: now,
                    },
                );
                Some(price)
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "price lookup failed");
                None
            }
        }
    }

    /// The stored entry for `symbol`, whatever its age.
    pub fn last_known(&self, symbol: &str) -> Option<CachedPrice> {
        self.entries().get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedPrice>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
