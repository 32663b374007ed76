//! Configuration validation.
//!
//! Checks every setting the engines and adapters read before any command
//! runs, so bad values fail fast with a config error instead of surfacing as
//! empty indicator output.

use crate::domain::error::SpottraderError;
use crate::domain::recommendation::EngineParams;
use crate::ports::config_port::ConfigPort;

pub const MAX_LIMIT: i64 = 1000;
pub const DATA_SOURCES: [&str; 2] = ["csv", "sqlite"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SpottraderError> {
    validate_periods(config)?;
    validate_ordering(config)?;
    validate_limit(config)?;
    validate_ttl(config)?;
    validate_fetch_timeout(config)?;
    validate_source(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: String) -> SpottraderError {
    SpottraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), SpottraderError> {
    let defaults = EngineParams::default();
    let periods = [
        ("ema_fast", defaults.ema_fast),
        ("ema_slow", defaults.ema_slow),
        ("rsi_period", defaults.rsi_period),
        ("macd_fast", defaults.macd_fast),
        ("macd_slow", defaults.macd_slow),
        ("macd_signal", defaults.macd_signal),
    ];
    for (key, default) in periods {
        let value = config.get_int("indicators", key, default as i64);
        if value <= 0 {
            return Err(invalid("indicators", key, format!("{} must be positive", key)));
        }
    }
    Ok(())
}

fn validate_ordering(config: &dyn ConfigPort) -> Result<(), SpottraderError> {
    let d = EngineParams::default();
    let pairs = [
        (("ema_fast", d.ema_fast), ("ema_slow", d.ema_slow)),
        (("macd_fast", d.macd_fast), ("macd_slow", d.macd_slow)),
    ];
    for ((fast, fast_default), (slow, slow_default)) in pairs {
        let fast_value = config.get_int("indicators", fast, fast_default as i64);
        let slow_value = config.get_int("indicators", slow, slow_default as i64);
        if fast_value >= slow_value {
            return Err(invalid(
                "indicators",
                fast,
                format!("{} must be less than {}", fast, slow),
            ));
        }
    }
    Ok(())
}

fn validate_limit(config: &dyn ConfigPort) -> Result<(), SpottraderError> {
    let value = config.get_int("market", "limit", EngineParams::default().limit as i64);
    if !(1..=MAX_LIMIT).contains(&value) {
        return Err(invalid(
            "market",
            "limit",
            format!("limit must be between 1 and {}", MAX_LIMIT),
        ));
    }
    Ok(())
}

fn validate_ttl(config: &dyn ConfigPort) -> Result<(), SpottraderError> {
    let value = config.get_int("cache", "quote_ttl_secs", 60);
    if value <= 0 {
        return Err(invalid(
            "cache",
            "quote_ttl_secs",
            "quote_ttl_secs must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_fetch_timeout(config: &dyn ConfigPort) -> Result<(), SpottraderError> {
    let value = config.get_double("web", "fetch_timeout_secs", 20.0);
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "web",
            "fetch_timeout_secs",
            "fetch_timeout_secs must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), SpottraderError> {
    match config.get_string("data", "source") {
        None => Ok(()),
        Some(s) if DATA_SOURCES.contains(&s.trim()) => Ok(()),
        Some(s) => Err(invalid(
            "data",
            "source",
            format!("unknown data source '{}', expected csv or sqlite", s.trim()),
        )),
    }
}
