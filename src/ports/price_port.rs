//! Spot price source port trait.

use crate::domain::error::SpottraderError;

pub trait PricePort {
    fn ticker_price(&self, symbol: &str) -> Result<f64, SpottraderError>;
}
