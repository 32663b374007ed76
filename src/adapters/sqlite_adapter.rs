//! SQLite candle store.

use crate::domain::candle::Candle;
use crate::domain::error::SpottraderError;
use crate::domain::timeframe::Timeframe;
use crate::ports::candle_port::CandlePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> SpottraderError {
    SpottraderError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> SpottraderError {
    SpottraderError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SpottraderError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| SpottraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, SpottraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, SpottraderError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), SpottraderError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS candles (
                    symbol TEXT NOT NULL,
                    interval TEXT NOT NULL,
                    ts INTEGER NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume REAL NOT NULL,
                    PRIMARY KEY (symbol, interval, ts)
                );
                CREATE TABLE IF NOT EXISTS tickers (
                    symbol TEXT PRIMARY KEY,
                    price REAL NOT NULL
                );",
            )
            .map_err(query_error)
    }

    /// Insert or replace candles in one transaction. Returns the row count.
    pub fn insert_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<usize, SpottraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for c in candles {
            tx.execute(
                "INSERT OR REPLACE INTO candles (symbol, interval, ts, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    symbol,
                    timeframe.as_str(),
                    c.timestamp,
                    c.open,
                    c.high,
                    c.low,
                    c.close,
                    c.volume
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        tracing::info!(symbol, interval = timeframe.as_str(), rows = candles.len(), "stored candles");
        Ok(candles.len())
    }

    pub fn upsert_price(&self, symbol: &str, price: f64) -> Result<(), SpottraderError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO tickers (symbol, price) VALUES (?1, ?2)",
                params![symbol, price],
            )
            .map_err(query_error)?;
        Ok(())
    }

    /// First timestamp, last timestamp and row count for one series.
    pub fn data_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Option<(i64, i64, usize)>, SpottraderError> {
        let (min, max, count): (Option<i64>, Option<i64>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(ts), MAX(ts), COUNT(*) FROM candles WHERE symbol = ?1 AND interval = ?2",
                params![symbol, timeframe.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((min, max, count as usize))),
            _ => Ok(None),
        }
    }
}

impl CandlePort for SqliteAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, SpottraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT ts, open, high, low, close, volume
                 FROM candles
                 WHERE symbol = ?1 AND interval = ?2
                 ORDER BY ts DESC
                 LIMIT ?3",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![symbol, timeframe.as_str(), limit as i64], |row| {
                Ok(Candle::new(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .map_err(query_error)?;

        let mut candles = Vec::new();
        for row in rows {
            candles.push(row.map_err(query_error)?);
        }

        if candles.is_empty() {
            return Err(SpottraderError::NoData {
                symbol: symbol.to_string(),
                interval: timeframe.to_string(),
            });
        }
        candles.reverse();
        Ok(candles)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SpottraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM candles ORDER BY symbol")
            .map_err(query_error)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_error)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_error)?);
        }
        Ok(symbols)
    }
}

impl PricePort for SqliteAdapter {
    fn ticker_price(&self, symbol: &str) -> Result<f64, SpottraderError> {
        let price: Option<f64> = self
            .conn()
            .map_err(|e| SpottraderError::Upstream {
                reason: e.to_string(),
            })?
            .query_row(
                "SELECT price FROM tickers WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SpottraderError::Upstream {
                reason: e.to_string(),
            })?;

        price.ok_or_else(|| SpottraderError::Upstream {
            reason: format!("no ticker for {}", symbol),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn store() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn hourly(n: i64) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle::new(i * HOUR, 100.0, 101.0, 99.0, 100.0 + i as f64, 10.0))
            .collect()
    }

    #[test]
    fn from_config_missing_path() {
        let result = SqliteAdapter::from_config(&EmptyConfig);
        match result {
            Err(SpottraderError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn schema_initialization_is_repeatable() {
        let adapter = store();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn fetch_returns_latest_candles_ascending() {
        let adapter = store();
        adapter.insert_candles("BTCUSDT", Timeframe::Hour1, &hourly(5)).unwrap();

        let fetched = adapter.fetch_candles("BTCUSDT", Timeframe::Hour1, 3).unwrap();
        let ts: Vec<i64> = fetched.iter().map(|c| c.timestamp).collect();
        assert_eq!(ts, vec![2 * HOUR, 3 * HOUR, 4 * HOUR]);
        assert_eq!(fetched[2].close, 104.0);
    }

    #[test]
    fn series_are_keyed_by_interval() {
        let adapter = store();
        adapter.insert_candles("BTCUSDT", Timeframe::Hour1, &hourly(2)).unwrap();

        let err = adapter.fetch_candles("BTCUSDT", Timeframe::Day1, 10).unwrap_err();
        assert!(matches!(err, SpottraderError::NoData { .. }));
    }

    #[test]
    fn reinsert_replaces_rows() {
        let adapter = store();
        adapter.insert_candles("BTCUSDT", Timeframe::Hour1, &hourly(3)).unwrap();
        adapter
            .insert_candles("BTCUSDT", Timeframe::Hour1, &[Candle::flat(HOUR, 7.0)])
            .unwrap();

        let fetched = adapter.fetch_candles("BTCUSDT", Timeframe::Hour1, 10).unwrap();
        assert_eq!(fetched.len(), 3);
        assert_eq!(fetched[1], Candle::flat(HOUR, 7.0));
    }

    #[test]
    fn list_symbols_is_sorted_and_distinct() {
        let adapter = store();
        adapter.insert_candles("ETHUSDT", Timeframe::Hour1, &hourly(2)).unwrap();
        adapter.insert_candles("BTCUSDT", Timeframe::Hour1, &hourly(2)).unwrap();
        adapter.insert_candles("BTCUSDT", Timeframe::Day1, &hourly(1)).unwrap();

        assert_eq!(adapter.list_symbols().unwrap(), vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn data_range_reports_bounds() {
        let adapter = store();
        adapter.insert_candles("BTCUSDT", Timeframe::Hour1, &hourly(4)).unwrap();

        assert_eq!(
            adapter.data_range("BTCUSDT", Timeframe::Hour1).unwrap(),
            Some((0, 3 * HOUR, 4))
        );
        assert_eq!(adapter.data_range("BTCUSDT", Timeframe::Min1).unwrap(), None);
    }

    #[test]
    fn ticker_prices_round_trip() {
        let adapter = store();
        adapter.upsert_price("BTCUSDT", 42_000.0).unwrap();

        assert_eq!(adapter.ticker_price("BTCUSDT").unwrap(), 42_000.0);
        let err = adapter.ticker_price("ETHUSDT").unwrap_err();
        assert!(matches!(err, SpottraderError::Upstream { .. }));
    }
}
