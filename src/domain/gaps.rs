//! Filling missing values and missing candles.
//!
//! Two independent modes:
//! - generic fill over a [`Frame`]: replaces missing cells column by column,
//!   never adding or removing rows;
//! - candle fill at a timeframe: inserts a flat, zero-volume candle for every
//!   bucket boundary between the first and last observed candle that has no
//!   data.

use std::fmt;
use std::str::FromStr;

use crate::domain::candle::Candle;
use crate::domain::error::SpottraderError;
use crate::domain::frame::Frame;
use crate::domain::timeframe::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMethod {
    /// Carry the last known value forward. Leading gaps stay missing.
    ForwardFill,
    /// Interpolate linearly by position between known values. Leading gaps
    /// stay missing; trailing gaps take the last known value.
    Linear,
    /// Replace every missing value with zero.
    Zero,
}

impl FromStr for FillMethod {
    type Err = SpottraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ffill" | "forward-fill" => Ok(FillMethod::ForwardFill),
            "linear" | "linear-interpolate" => Ok(FillMethod::Linear),
            "zero" | "zero-fill" => Ok(FillMethod::Zero),
            _ => Err(SpottraderError::UnsupportedFillMethod {
                method: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FillMethod::ForwardFill => "ffill",
            FillMethod::Linear => "linear",
            FillMethod::Zero => "zero",
        })
    }
}

pub fn fill_series(values: &[Option<f64>], method: FillMethod) -> Vec<Option<f64>> {
    match method {
        FillMethod::ForwardFill => {
            let mut last = None;
            values
                .iter()
                .map(|v| {
                    if v.is_some() {
                        last = *v;
                    }
                    last
                })
                .collect()
        }
        FillMethod::Zero => values.iter().map(|v| Some(v.unwrap_or(0.0))).collect(),
        FillMethod::Linear => interpolate_linear(values),
    }
}

fn interpolate_linear(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut prev: Option<(usize, f64)> = None;

    for (i, v) in values.iter().enumerate() {
        let Some(v) = *v else { continue };
        if let Some((j, pv)) = prev {
            let span = (i - j) as f64;
            for (step, slot) in out[j + 1..i].iter_mut().enumerate() {
                let t = (step + 1) as f64 / span;
                *slot = Some(pv + (v - pv) * t);
            }
        }
        prev = Some((i, v));
    }

    if let Some((j, pv)) = prev {
        for slot in &mut out[j + 1..] {
            *slot = Some(pv);
        }
    }
    out
}

/// Generic fill: apply `method` (by name) to every column of `frame`.
pub fn fill_frame(frame: &Frame, method: &str) -> Result<Frame, SpottraderError> {
    let method: FillMethod = method.parse()?;
    Ok(frame.map_columns(|values| fill_series(values, method)))
}

/// Candle fill: reindex `candles` onto every `timeframe` boundary from the
/// first to the last observed timestamp.
///
/// Missing boundaries get `open = high = low = close` equal to the previous
/// observed close and zero volume. Duplicate timestamps keep the last
/// occurrence. Candles that do not sit on a boundary are dropped; resample
/// first to align them.
pub fn fill_candle_gaps(candles: &[Candle], timeframe: &str) -> Result<Vec<Candle>, SpottraderError> {
    let tf: Timeframe = timeframe.parse()?;
    Ok(reindex_candles(candles, tf))
}

/// Candle fill for rows still in tabular form.
pub fn fill_frame_candles(frame: &Frame, timeframe: &str) -> Result<Vec<Candle>, SpottraderError> {
    let tf: Timeframe = timeframe.parse()?;
    let candles = frame.to_candles()?;
    Ok(reindex_candles(&candles, tf))
}

pub fn reindex_candles(candles: &[Candle], timeframe: Timeframe) -> Vec<Candle> {
    let observed = sorted_unique(candles);
    let (Some(first), Some(last)) = (observed.first(), observed.last()) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(observed.len());
    let mut prev_close = first.close;
    let mut dropped = 0usize;
    let mut next_observed = observed.iter().peekable();
    let mut boundary = first.timestamp;

    loop {
        while let Some(c) = next_observed.next_if(|c| c.timestamp < boundary) {
            tracing::debug!(timestamp = c.timestamp, "dropping off-boundary candle");
            dropped += 1;
        }

        match next_observed.next_if(|c| c.timestamp == boundary) {
            Some(c) => {
                prev_close = c.close;
                out.push(*c);
            }
            None => out.push(Candle::flat(boundary, prev_close)),
        }

        let next = timeframe.advance(boundary);
        if next > last.timestamp || next <= boundary {
            break;
        }
        boundary = next;
    }

    dropped += next_observed.count();
    if dropped > 0 {
        tracing::warn!(dropped, %timeframe, "candles off the timeframe grid were dropped");
    }
    out
}

fn sorted_unique(candles: &[Candle]) -> Vec<Candle> {
    let mut sorted = candles.to_vec();
    sorted.sort_by_key(|c| c.timestamp);

    let mut unique: Vec<Candle> = Vec::with_capacity(sorted.len());
    for c in sorted {
        match unique.last_mut() {
            Some(prev) if prev.timestamp == c.timestamp => *prev = c,
            _ => unique.push(c),
        }
    }
    unique
}
