//! spottrader: spot market indicators, OHLCV normalization and trade signals.
//!
//! Pure transforms live in [`domain`] and reach data only through the traits
//! in [`ports`]. [`adapters`] back those traits with CSV files, SQLite and an
//! HTTP API; [`cli`] wires them together.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
