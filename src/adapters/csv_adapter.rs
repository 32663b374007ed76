//! CSV file data adapter.
//!
//! Candle files live in one directory as `{SYMBOL}_{interval}.csv` with a
//! header row naming `timestamp,open,high,low,close,volume` in any order.
//! Spot prices come from `tickers.csv` (`symbol,price`).

use crate::domain::candle::Candle;
use crate::domain::error::SpottraderError;
use crate::domain::frame::Frame;
use crate::domain::timeframe::Timeframe;
use crate::domain::valuation::Balance;
use crate::ports::candle_port::CandlePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use std::collections::BTreeSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const TICKERS_FILE: &str = "tickers.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SpottraderError> {
        let dir = config
            .get_string("data", "csv_dir")
            .ok_or_else(|| SpottraderError::ConfigMissing {
                section: "data".to_string(),
                key: "csv_dir".to_string(),
            })?;
        Ok(Self::new(PathBuf::from(dir)))
    }

    fn csv_path(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }
}

fn parse_error(e: csv::Error) -> SpottraderError {
    SpottraderError::Database {
        reason: format!("CSV parse error: {}", e),
    }
}

/// Read a headed numeric table. Empty cells become missing values.
pub fn read_frame<R: Read>(reader: R) -> Result<Frame, SpottraderError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let mut frame = Frame::with_names(headers.as_slice());

    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(parse_error)?;
        let mut cells = Vec::with_capacity(headers.len());
        for (col, field) in record.iter().enumerate() {
            if field.is_empty() {
                cells.push(None);
                continue;
            }
            let value: f64 = field.parse().map_err(|e| SpottraderError::Database {
                reason: format!(
                    "invalid value '{}' in column '{}' at row {}: {}",
                    field,
                    headers.get(col).map(String::as_str).unwrap_or("?"),
                    row,
                    e
                ),
            })?;
            if !value.is_finite() {
                return Err(SpottraderError::Database {
                    reason: format!(
                        "non-finite value '{}' in column '{}' at row {}",
                        field,
                        headers.get(col).map(String::as_str).unwrap_or("?"),
                        row
                    ),
                });
            }
            cells.push(Some(value));
        }
        frame.push_row(&cells);
    }
    Ok(frame)
}

pub fn read_candles_file(path: &Path) -> Result<Vec<Candle>, SpottraderError> {
    let file = fs::File::open(path)?;
    read_frame(file)?.to_candles()
}

pub fn write_candles<W: Write>(writer: W, candles: &[Candle]) -> Result<(), SpottraderError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])
        .map_err(parse_error)?;
    for c in candles {
        wtr.write_record([
            c.timestamp.to_string(),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ])
        .map_err(parse_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read `asset,free,locked` rows.
pub fn read_balances(path: &Path) -> Result<Vec<Balance>, SpottraderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(parse_error)?;

    let mut balances = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(parse_error)?;
        let asset = record.get(0).unwrap_or_default();
        if asset.is_empty() {
            continue;
        }
        let amount = |idx: usize| -> Result<f64, SpottraderError> {
            match record.get(idx) {
                None | Some("") => Ok(0.0),
                Some(s) => s.parse::<f64>().map_err(|e| SpottraderError::Database {
                    reason: format!("invalid balance for {}: {}", asset, e),
                }),
            }
        };
        balances.push(Balance::new(asset, amount(1)?, amount(2)?));
    }
    Ok(balances)
}

/// Read `symbol,price` rows.
pub fn read_tickers(path: &Path) -> Result<Vec<(String, f64)>, SpottraderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(parse_error)?;

    let mut tickers = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(parse_error)?;
        let symbol = record.get(0).unwrap_or_default();
        let raw = record.get(1).unwrap_or_default();
        let price = raw.parse::<f64>().map_err(|e| SpottraderError::Database {
            reason: format!("invalid price '{}' for {}: {}", raw, symbol, e),
        })?;
        tickers.push((symbol.to_string(), price));
    }
    Ok(tickers)
}

/// Write a frame with its header. Missing cells are written empty.
pub fn write_frame<W: Write>(writer: W, frame: &Frame) -> Result<(), SpottraderError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(frame.columns().iter().map(|c| c.name.as_str()))
        .map_err(parse_error)?;
    for row in 0..frame.row_count() {
        wtr.write_record(frame.columns().iter().map(|c| match c.values[row] {
            Some(v) => v.to_string(),
            None => String::new(),
        }))
        .map_err(parse_error)?;
    }
    wtr.flush()?;
    Ok(())
}

impl CandlePort for CsvAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, SpottraderError> {
        let path = self.csv_path(symbol, timeframe);
        if !path.exists() {
            return Err(SpottraderError::NoData {
                symbol: symbol.to_string(),
                interval: timeframe.to_string(),
            });
        }

        let mut candles = read_candles_file(&path)?;
        candles.sort_by_key(|c| c.timestamp);
        let skip = candles.len().saturating_sub(limit);
        tracing::debug!(path = %path.display(), rows = candles.len(), limit, "read candle file");
        Ok(candles.split_off(skip))
    }

    fn list_symbols(&self) -> Result<Vec<String>, SpottraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SpottraderError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = BTreeSet::new();
        for entry in entries {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            let Some(stem) = name.strip_suffix(".csv") else {
                continue;
            };
            if let Some((symbol, interval)) = stem.rsplit_once('_') {
                if interval.parse::<Timeframe>().is_ok() {
                    symbols.insert(symbol.to_string());
                }
            }
        }
        Ok(symbols.into_iter().collect())
    }
}

impl PricePort for CsvAdapter {
    fn ticker_price(&self, symbol: &str) -> Result<f64, SpottraderError> {
        let path = self.base_path.join(TICKERS_FILE);
        let tickers = read_tickers(&path).map_err(|e| SpottraderError::Upstream {
            reason: format!("{}: {}", path.display(), e),
        })?;

        tickers
            .into_iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, price)| price)
            .ok_or_else(|| SpottraderError::Upstream {
                reason: format!("no ticker for {}", symbol),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HOUR: i64 = 3_600_000;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            7200000,110.0,120.0,105.0,115.0,55\n\
            0,100.0,110.0,90.0,105.0,50\n\
            3600000,105.0,115.0,100.0,110.0,60\n";

        fs::write(path.join("BTCUSDT_1h.csv"), csv_content).unwrap();
        fs::write(
            path.join("ETHUSDT_1d.csv"),
            "timestamp,open,high,low,close,volume\n",
        )
        .unwrap();
        fs::write(path.join("notes.csv"), "a,b\n").unwrap();
        fs::write(path.join(TICKERS_FILE), "symbol,price\nBTCUSDT,50000.5\nETHUSDT,2000\n")
            .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_candles_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let candles = adapter.fetch_candles("BTCUSDT", Timeframe::Hour1, 300).unwrap();

        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0], Candle::new(0, 100.0, 110.0, 90.0, 105.0, 50.0));
        assert_eq!(candles[2].timestamp, 2 * HOUR);
    }

    #[test]
    fn fetch_candles_keeps_most_recent_limit() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let candles = adapter.fetch_candles("BTCUSDT", Timeframe::Hour1, 2).unwrap();
        let ts: Vec<i64> = candles.iter().map(|c| c.timestamp).collect();
        assert_eq!(ts, vec![HOUR, 2 * HOUR]);
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_candles("XRPUSDT", Timeframe::Hour1, 10).unwrap_err();
        assert!(matches!(err, SpottraderError::NoData { symbol, .. } if symbol == "XRPUSDT"));
    }

    #[test]
    fn columns_may_come_in_any_order() {
        let frame = read_frame("close,volume,timestamp,open,low,high\n2,3,0,1,0.5,2.5\n".as_bytes())
            .unwrap();
        let candles = frame.to_candles().unwrap();
        assert_eq!(candles, vec![Candle::new(0, 1.0, 2.5, 0.5, 2.0, 3.0)]);
    }

    #[test]
    fn empty_cells_become_missing() {
        let frame = read_frame("timestamp,close\n0,\n60000,5\n".as_bytes()).unwrap();
        assert_eq!(frame.column("close").unwrap(), &[None, Some(5.0)]);
    }

    #[test]
    fn file_without_timestamp_column_is_rejected() {
        let (_dir, path) = setup_test_data();
        fs::write(path.join("SOLUSDT_1h.csv"), "open,high,low,close,volume\n1,1,1,1,1\n").unwrap();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_candles("SOLUSDT", Timeframe::Hour1, 10).unwrap_err();
        assert!(matches!(err, SpottraderError::MissingTimestampColumn { .. }));
    }

    #[test]
    fn non_numeric_cell_is_rejected() {
        let err = read_frame("timestamp,close\n0,abc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, SpottraderError::Database { .. }));
    }

    #[test]
    fn non_finite_cells_are_rejected() {
        for cell in ["NaN", "inf", "-inf"] {
            let csv = format!("timestamp,close\n0,1\n60000,{}\n", cell);
            let err = read_frame(csv.as_bytes()).unwrap_err();
            assert!(
                matches!(&err, SpottraderError::Database { reason } if reason.contains("non-finite")),
                "{}: {:?}",
                cell,
                err
            );
        }
    }

    #[test]
    fn fractional_timestamp_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd.csv");
        fs::write(
            &path,
            "timestamp,open,high,low,close,volume\n3600000.9,1,1,1,1,1\n",
        )
        .unwrap();
        let err = read_candles_file(&path).unwrap_err();
        assert!(matches!(err, SpottraderError::MissingTimestampColumn { .. }));
    }

    #[test]
    fn list_symbols_uses_valid_interval_suffixes() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols().unwrap();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn ticker_price_reads_tickers_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.ticker_price("BTCUSDT").unwrap(), 50000.5);
        let err = adapter.ticker_price("DOGEUSDT").unwrap_err();
        assert!(matches!(err, SpottraderError::Upstream { .. }));
    }

    #[test]
    fn write_candles_emits_header_and_rows() {
        let mut out = Vec::new();
        write_candles(&mut out, &[Candle::new(0, 1.0, 2.0, 0.5, 1.5, 10.0)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "timestamp,open,high,low,close,volume\n0,1,2,0.5,1.5,10\n");
    }

    #[test]
    fn write_frame_leaves_missing_cells_empty() {
        let frame = read_frame("timestamp,close\n0,\n60000,5.5\n".as_bytes()).unwrap();
        let mut out = Vec::new();
        write_frame(&mut out, &frame).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "timestamp,close\n0,\n60000,5.5\n");
    }

    #[test]
    fn read_balances_parses_rows() {
        let (_dir, path) = setup_test_data();
        let file = path.join("balances.csv");
        fs::write(&file, "asset,free,locked\nBTC,0.5,0.1\nUSDT,100,\n").unwrap();

        let balances = read_balances(&file).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0], Balance::new("BTC", 0.5, 0.1));
        assert_eq!(balances[1].locked, 0.0);
    }
}
