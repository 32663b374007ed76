//! Domain error types.

/// Top-level error type for spottrader.
#[derive(Debug, thiserror::Error)]
pub enum SpottraderError {
    #[error("unsupported timeframe: {timeframe}")]
    UnsupportedTimeframe { timeframe: String },

    #[error("unsupported fill method: {method}")]
    UnsupportedFillMethod { method: String },

    #[error("candle rows must carry a 'timestamp' column: {reason}")]
    MissingTimestampColumn { reason: String },

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("upstream fetch failed: {reason}")]
    Upstream { reason: String },

    #[error("no data for {symbol} at {interval}")]
    NoData { symbol: String, interval: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SpottraderError> for std::process::ExitCode {
    fn from(err: &SpottraderError) -> Self {
        let code: u8 = match err {
            SpottraderError::Io(_) => 1,
            SpottraderError::ConfigParse { .. }
            | SpottraderError::ConfigMissing { .. }
            | SpottraderError::ConfigInvalid { .. } => 2,
            SpottraderError::Database { .. }
            | SpottraderError::DatabaseQuery { .. }
            | SpottraderError::Upstream { .. } => 3,
            SpottraderError::UnsupportedTimeframe { .. }
            | SpottraderError::UnsupportedFillMethod { .. }
            | SpottraderError::MissingTimestampColumn { .. }
            | SpottraderError::MissingColumn { .. }
            | SpottraderError::MissingValue { .. } => 4,
            SpottraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
