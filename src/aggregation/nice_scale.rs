//! "Nice number" scales for price histograms.
//!
//! Steps are always {1, 2, 5, 10} × 10^n so bucket edges land on values a
//! shopper can read at a glance (0–50, 50–100, ...).

use crate::error::{BridgeError, Result};
use serde::Serialize;

pub const DEFAULT_MAX_BUCKETS: usize = 5;

/// Half-open range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NiceRange {
    pub min: f64,
    pub max: f64,
}

/// Axis bounds and tick step for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NiceAxis {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Nice number near `value`.
///
/// With `round == false` the result is the smallest nice number not below
/// `value` (bucket widths). With `round == true` it is the nearest one, using
/// the 1.5 / 3 / 7 thresholds (axis ticks). The two are not interchangeable.
pub fn nice_number(value: f64, round: bool) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BridgeError::InvalidArgument(format!(
            "nice number needs a positive finite value, got {}",
            value
        )));
    }

    let exponent = value.log10().floor();
    let magnitude = 10f64.powi(exponent as i32);
    let fraction = value / magnitude;

    let nice = if round {
        if fraction < 1.5 {
            1.0
        } else if fraction < 3.0 {
            2.0
        } else if fraction < 7.0 {
            5.0
        } else {
            10.0
        }
    } else if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };

    Ok(nice * magnitude)
}

/// Split the span of `values` into at most about `max_buckets` consecutive
/// ranges of one nice width.
///
/// Empty input and a zero span (every value equal) yield no buckets.
pub fn buckets(values: &[f64], max_buckets: usize) -> Result<Vec<NiceRange>> {
    if max_buckets == 0 {
        return Err(BridgeError::InvalidArgument(
            "max bucket count must be greater than zero".to_string(),
        ));
    }
    let Some((min, max)) = bounds(values) else {
        return Ok(Vec::new());
    };
    let span = max - min;
    if span == 0.0 {
        return Ok(Vec::new());
    }

    let step = nice_number(span / max_buckets as f64, false)?;
    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;

    // Count steps instead of accumulating floats so a step like 0.2 cannot
    // drift into an extra bucket.
    let count = ((end - start) / step).round() as usize;
    Ok((0..count)
        .map(|i| NiceRange {
            min: start + i as f64 * step,
            max: start + (i + 1) as f64 * step,
        })
        .collect())
}

/// Axis covering `[min, max]` with roughly `max_ticks` ticks.
pub fn nice_range(min: f64, max: f64, max_ticks: usize) -> Result<NiceAxis> {
    if max_ticks < 2 {
        return Err(BridgeError::InvalidArgument(format!(
            "an axis needs at least two ticks, got {}",
            max_ticks
        )));
    }
    if max <= min {
        return Err(BridgeError::InvalidArgument(format!(
            "empty axis range [{}, {}]",
            min, max
        )));
    }
    let range = nice_number(max - min, false)?;
    let step = nice_number(range / (max_ticks - 1) as f64, true)?;
    Ok(NiceAxis {
        min: (min / step).floor() * step,
        max: (max / step).ceil() * step,
        step,
    })
}

fn bounds(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied().filter(|v| v.is_finite());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
