//! Column table for tabular rows that may contain missing cells.
//!
//! Raw OHLCV rows arrive as a `Frame` (for example from a CSV file with a
//! header) and become [`Candle`]s only through [`Frame::to_candles`], which is
//! where a missing `timestamp` column is detected.

use crate::domain::candle::Candle;
use crate::domain::error::SpottraderError;

pub const TIMESTAMP: &str = "timestamp";
pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
    rows: usize,
}

impl Frame {
    /// An empty frame with the given column names and no rows.
    pub fn with_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|n| Column {
                    name: n.as_ref().to_string(),
                    values: Vec::new(),
                })
                .collect(),
            rows: 0,
        }
    }

    /// Build a frame from whole columns. Shorter columns are padded with
    /// missing cells up to the longest one.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let columns = columns
            .into_iter()
            .map(|mut c| {
                c.values.resize(rows, None);
                c
            })
            .collect();
        Self { columns, rows }
    }

    pub fn from_candles(candles: &[Candle]) -> Self {
        let col = |name: &str, f: fn(&Candle) -> f64| Column {
            name: name.to_string(),
            values: candles.iter().map(|c| Some(f(c))).collect(),
        };
        Self {
            columns: vec![
                col(TIMESTAMP, |c| c.timestamp as f64),
                col("open", |c| c.open),
                col("high", |c| c.high),
                col("low", |c| c.low),
                col("close", |c| c.close),
                col("volume", |c| c.volume),
            ],
            rows: candles.len(),
        }
    }

    /// Append one row. Cells are matched to columns by position; missing
    /// trailing cells become `None` and surplus cells are ignored.
    pub fn push_row(&mut self, cells: &[Option<f64>]) {
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.values.push(cells.get(i).copied().flatten());
        }
        self.rows += 1;
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Apply `f` to every column, keeping names and row count.
    pub fn map_columns<F>(&self, mut f: F) -> Frame
    where
        F: FnMut(&[Option<f64>]) -> Vec<Option<f64>>,
    {
        Frame::from_columns(
            self.columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: f(&c.values),
                })
                .collect(),
        )
    }

    /// Convert rows to candles. Requires a fully populated `timestamp`
    /// column and the five OHLCV columns without gaps.
    pub fn to_candles(&self) -> Result<Vec<Candle>, SpottraderError> {
        let timestamps =
            self.column(TIMESTAMP)
                .ok_or_else(|| SpottraderError::MissingTimestampColumn {
                    reason: "no such column".to_string(),
                })?;

        let mut fields: Vec<&[Option<f64>]> = Vec::with_capacity(OHLCV_COLUMNS.len());
        for name in OHLCV_COLUMNS {
            let values = self.column(name).ok_or_else(|| SpottraderError::MissingColumn {
                column: name.to_string(),
            })?;
            fields.push(values);
        }

        let mut candles = Vec::with_capacity(self.rows);
        for row in 0..self.rows {
            let timestamp = timestamps[row].ok_or_else(|| SpottraderError::MissingTimestampColumn {
                reason: format!("row {} has no timestamp", row),
            })?;
            let timestamp = whole_millis(timestamp).ok_or_else(|| {
                SpottraderError::MissingTimestampColumn {
                    reason: format!("row {} has invalid timestamp {}", row, timestamp),
                }
            })?;

            // Non-finite prices count as missing.
            let cell = |idx: usize| {
                fields[idx][row]
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| SpottraderError::MissingValue {
                        column: OHLCV_COLUMNS[idx].to_string(),
                        row,
                    })
            };

            candles.push(Candle::new(
                timestamp,
                cell(0)?,
                cell(1)?,
                cell(2)?,
                cell(3)?,
                cell(4)?,
            ));
        }
        Ok(candles)
    }
}

/// `value` as integral epoch milliseconds, if it is one.
fn whole_millis(value: f64) -> Option<i64> {
    let in_range = value.is_finite() && value.abs() < i64::MAX as f64;
    (in_range && value.fract() == 0.0).then_some(value as i64)
}
