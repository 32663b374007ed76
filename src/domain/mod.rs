//! Core domain types and logic.

pub mod candle;
pub mod config_validation;
pub mod error;
pub mod frame;
pub mod gaps;
pub mod indicator;
pub mod pipeline;
pub mod quote_cache;
pub mod recommendation;
pub mod resample;
pub mod signal;
pub mod timeframe;
pub mod valuation;
