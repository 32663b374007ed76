//! Portfolio valuation in the quote asset.

use crate::domain::quote_cache::QuoteCache;
use crate::ports::price_port::PricePort;

pub const DEFAULT_QUOTE_ASSET: &str = "USDT";

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Deserialize))]
pub struct Balance {
    pub asset: String,
    #[cfg_attr(feature = "web", serde(default))]
    pub free: f64,
    #[cfg_attr(feature = "web", serde(default))]
    pub locked: f64,
}

impl Balance {
    pub fn new(asset: &str, free: f64, locked: f64) -> Self {
        Self {
            asset: asset.to_string(),
            free,
            locked,
        }
    }

    pub fn quantity(&self) -> f64 {
        self.free + self.locked
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Serialize))]
pub struct ValuedBalance {
    pub asset: String,
    pub free: f64,
    pub locked: f64,
    /// Market symbol used to price the asset, e.g. `BTCUSDT`.
    pub symbol: String,
    pub price: Option<f64>,
    pub value: Option<f64>,
    pub priced: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Serialize))]
pub struct Valuation {
    pub quote_asset: String,
    pub total: f64,
    pub items: Vec<ValuedBalance>,
}

/// Value every non-empty balance in `quote_asset`.
///
/// The quote asset itself is priced at 1. Other assets are priced through
/// `cache` as `{ASSET}{QUOTE}`; assets without a price are kept with
/// `priced = false` and count as zero. Items are ordered by value, largest
/// first.
pub fn value_balances(
    balances: &[Balance],
    quote_asset: &str,
    cache: &QuoteCache,
    source: &dyn PricePort,
) -> Valuation {
    let mut total = 0.0;
    let mut items = Vec::new();

    for balance in balances {
        let qty = balance.quantity();
        if qty == 0.0 {
            continue;
        }

        let symbol = format!("{}{}", balance.asset, quote_asset);
        let price = if balance.asset == quote_asset {
            Some(1.0)
        } else {
            cache.price(source, &symbol)
        };
        let value = price.map(|p| p * qty);
        total += value.unwrap_or(0.0);

        items.push(ValuedBalance {
            asset: balance.asset.clone(),
            free: balance.free,
            locked: balance.locked,
            symbol,
            price,
            value,
            priced: price.is_some(),
        });
    }

    items.sort_by(|a, b| {
        b.value
            .unwrap_or(0.0)
            .total_cmp(&a.value.unwrap_or(0.0))
    });

    tracing::debug!(items = items.len(), total, "portfolio valued");

    Valuation {
        quote_asset: quote_asset.to_string(),
        total,
        items,
    }
}
