//! Per-minute alignment of oxygen saturation, sleep stage and heart rate.
//!
//! Each series is bucketed onto a shared one-minute grid spanning every
//! observed timestamp, gaps are filled from a quadratic spline through the
//! known minutes, and the three columns are joined row by row.

pub mod bucket;
pub mod spline;

use crate::error::ConfigError;
use crate::signal::{floor_minute, AlignedRow, AlignedTable, Series, SignalKind};
use bucket::bucket_by_minute;
use chrono::{Duration, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};
use spline::QuadraticSpline;

/// How minutes before the first or after the last known value are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryFill {
    /// Evaluate the end pieces of the spline.
    Extrapolate,
    /// Repeat the nearest known value.
    Hold,
    /// Leave the minute without data.
    Leave,
}

/// Treatment of interpolated sleep-stage codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStagePolicy {
    /// Replace each value with the nearest code seen in the raw series.
    Snap,
    /// Keep the interpolated floats.
    Raw,
}

/// Tunables for [`align_with_config`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Known minutes a column needs before gaps are interpolated.
    pub min_spline_points: usize,
    pub boundary: BoundaryFill,
    pub sleep_stage: SleepStagePolicy,
    /// Literal written for missing values in formats without null.
    pub sentinel: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            min_spline_points: QuadraticSpline::MIN_KNOTS,
            boundary: BoundaryFill::Extrapolate,
            sleep_stage: SleepStagePolicy::Snap,
            sentinel: -1.0,
        }
    }
}

impl AlignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_spline_points < QuadraticSpline::MIN_KNOTS {
            return Err(ConfigError::ValidationError(format!(
                "align.min_spline_points must be at least {}, got {}",
                QuadraticSpline::MIN_KNOTS,
                self.min_spline_points
            )));
        }
        if !self.sentinel.is_finite() {
            return Err(ConfigError::ValidationError(
                "align.sentinel must be a finite number".into(),
            ));
        }
        Ok(())
    }
}

/// Align three series of one day with the default configuration.
pub fn align(oxygen: &Series, sleep: &Series, heart_rate: &Series) -> AlignedTable {
    align_with_config(oxygen, sleep, heart_rate, &AlignConfig::default())
}

/// Align three series of one day on a common one-minute grid.
///
/// The grid runs from the earliest to the latest minute seen in any series,
/// inclusive. All inputs empty yields an empty table.
pub fn align_with_config(
    oxygen: &Series,
    sleep: &Series,
    heart_rate: &Series,
    cfg: &AlignConfig,
) -> AlignedTable {
    let Some((origin, len)) = grid([oxygen, sleep, heart_rate]) else {
        return AlignedTable::default();
    };

    let oxygen_col = fill_column(bucket_by_minute(oxygen, origin, len), cfg, oxygen.kind);
    let heart_col = fill_column(
        bucket_by_minute(heart_rate, origin, len),
        cfg,
        heart_rate.kind,
    );
    let mut sleep_col = fill_column(bucket_by_minute(sleep, origin, len), cfg, sleep.kind);
    if cfg.sleep_stage == SleepStagePolicy::Snap {
        snap_to_codes(&mut sleep_col, &observed_codes(sleep));
    }

    let rows: Vec<AlignedRow> = (0..len)
        .map(|i| AlignedRow {
            timestamp: origin + Duration::minutes(i as i64),
            oxygen_saturation: oxygen_col[i],
            sleep_stage: sleep_col[i],
            heart_rate: heart_col[i],
        })
        .collect();
    let table = AlignedTable { rows };
    debug_assert!(table
        .rows
        .windows(2)
        .all(|w| w[0].timestamp < w[1].timestamp));
    table
}

/// First minute and number of minutes covered by the union of all series.
fn grid(series: [&Series; 3]) -> Option<(NaiveDateTime, usize)> {
    let spans: Vec<_> = series.iter().filter_map(|s| s.span()).collect();
    let start = spans.iter().map(|(first, _)| *first).min()?;
    let end = spans.iter().map(|(_, last)| *last).max()?;
    let origin = floor_minute(start);
    let len = (floor_minute(end) - origin).num_minutes() as usize + 1;
    Some((origin, len))
}

fn fill_column(
    mut column: Vec<Option<f64>>,
    cfg: &AlignConfig,
    kind: SignalKind,
) -> Vec<Option<f64>> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = column
        .iter()
        .enumerate()
        .filter_map(|(i, value)| value.map(|v| (i as f64, v)))
        .unzip();
    if xs.len() < cfg.min_spline_points {
        debug!(
            "{}: {} known minute(s), leaving gaps empty",
            kind.column_name(),
            xs.len()
        );
        return column;
    }
    let Some(spline) = QuadraticSpline::fit(&xs, &ys) else {
        return column;
    };
    let (first, last) = (xs[0], xs[xs.len() - 1]);
    let (first_value, last_value) = (ys[0], ys[ys.len() - 1]);
    let mut filled = 0usize;
    for (i, slot) in column.iter_mut().enumerate() {
        if slot.is_some() {
            continue;
        }
        let x = i as f64;
        *slot = if x > first && x < last {
            Some(spline.eval(x))
        } else {
            match cfg.boundary {
                BoundaryFill::Extrapolate => Some(spline.eval(x)),
                BoundaryFill::Hold if x < first => Some(first_value),
                BoundaryFill::Hold => Some(last_value),
                BoundaryFill::Leave => None,
            }
        };
        if slot.is_some() {
            filled += 1;
        }
    }
    debug!(
        "{}: interpolated {} minute(s) from {} known",
        kind.column_name(),
        filled,
        xs.len()
    );
    column
}

/// Distinct integer codes present in the raw series, ascending.
fn observed_codes(series: &Series) -> Vec<f64> {
    let mut codes: Vec<f64> = series
        .values()
        .filter(|v| v.is_finite())
        .map(f64::round)
        .collect();
    codes.sort_by(|a, b| a.total_cmp(b));
    codes.dedup();
    codes
}

fn snap_to_codes(column: &mut [Option<f64>], codes: &[f64]) {
    if codes.is_empty() {
        return;
    }
    for value in column.iter_mut().flatten() {
        let mut best = codes[0];
        for &code in &codes[1..] {
            if (code - *value).abs() < (best - *value).abs() {
                best = code;
            }
        }
        *value = best;
    }
}
