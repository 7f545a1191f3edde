//! # Seasonal
//!
//! $$
//! y_t = T_t + S_{t \bmod p} + R_t,\qquad
//! T_t = \frac{1}{p}\Big(\tfrac12 y_{t-p/2} + \sum_{|j|<p/2} y_{t+j} + \tfrac12 y_{t+p/2}\Big)
//! $$
//!
//! Calendar-month averages and the classical additive decomposition of a
//! level series. Both work on the finite observations only, in date order.

use std::collections::BTreeMap;

use chrono::Datelike;
use chrono::Month;
use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;

use super::types::MonthlyMean;
use crate::error::RiskError;
use crate::error::RiskResult;

/// Mean level per calendar month across all years, rounded half to even.
pub fn monthly_means(observations: &[(NaiveDate, f64)]) -> Vec<MonthlyMean> {
  let mut buckets: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
  for (date, value) in observations.iter().filter(|(_, v)| v.is_finite()) {
    let slot = buckets.entry(date.month()).or_insert((0.0, 0));
    slot.0 += value;
    slot.1 += 1;
  }

  buckets
    .into_iter()
    .filter_map(|(month, (sum, count))| {
      let month = Month::try_from(month as u8).ok()?;
      Some(MonthlyMean {
        month,
        label: month.name()[..3].to_string(),
        value: (sum / count as f64).round_ties_even() as i64,
      })
    })
    .collect()
}

/// Additive decomposition of a level series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonalDecomposition {
  pub period: usize,
  pub dates: Vec<NaiveDate>,
  pub observed: Vec<f64>,
  /// Centred moving average; undefined for the first and last `period / 2` points.
  pub trend: Vec<Option<f64>>,
  /// Zero-mean periodic component.
  pub seasonal: Vec<f64>,
  pub residual: Vec<Option<f64>>,
}

/// Dispersion of the trend and seasonal components relative to the mean level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeasonalityProfile {
  pub trend_strength: f64,
  pub seasonal_strength: f64,
}

fn moving_average_weights(period: usize) -> Vec<f64> {
  let p = period as f64;
  if period % 2 == 0 {
    let mut w = vec![1.0 / p; period + 1];
    w[0] = 0.5 / p;
    w[period] = 0.5 / p;
    w
  } else {
    vec![1.0 / p; period]
  }
}

fn centred_trend(y: &[f64], period: usize) -> Vec<Option<f64>> {
  let weights = moving_average_weights(period);
  let half = weights.len() / 2;

  (0..y.len())
    .map(|t| {
      if t < half || t + half >= y.len() {
        return None;
      }
      let window = &y[t - half..=t + half];
      Some(window.iter().zip(weights.iter()).map(|(v, w)| v * w).sum())
    })
    .collect()
}

/// Classical additive decomposition with seasonal `period`. Needs two full
/// cycles of observations.
pub fn decompose(
  observations: &[(NaiveDate, f64)],
  period: usize,
) -> RiskResult<SeasonalDecomposition> {
  if period < 2 {
    return Err(RiskError::InvalidConfig {
      reason: format!("seasonal period must be at least 2, got {period}"),
    });
  }
  let (dates, observed): (Vec<NaiveDate>, Vec<f64>) = observations
    .iter()
    .copied()
    .filter(|(_, v)| v.is_finite())
    .unzip();
  if observed.len() < 2 * period {
    return Err(RiskError::InsufficientData {
      operation: "seasonal decomposition",
      required: 2 * period,
      actual: observed.len(),
    });
  }

  let trend = centred_trend(&observed, period);
  let detrended: Vec<Option<f64>> = observed
    .iter()
    .zip(trend.iter())
    .map(|(y, t)| t.map(|t| y - t))
    .collect();

  let mut phase_means: Vec<f64> = (0..period)
    .map(|phase| {
      detrended
        .iter()
        .skip(phase)
        .step_by(period)
        .flatten()
        .mean()
    })
    .collect();
  let centre = phase_means.iter().mean();
  phase_means.iter_mut().for_each(|m| *m -= centre);

  let seasonal: Vec<f64> = (0..observed.len()).map(|t| phase_means[t % period]).collect();
  let residual = detrended
    .iter()
    .zip(seasonal.iter())
    .map(|(d, s)| d.map(|d| d - s))
    .collect();

  Ok(SeasonalDecomposition {
    period,
    dates,
    observed,
    trend,
    seasonal,
    residual,
  })
}

impl SeasonalDecomposition {
  /// Sample standard deviation of the defined trend and of the seasonal
  /// component, each divided by the mean observed level.
  pub fn profile(&self) -> SeasonalityProfile {
    let level = self.observed.iter().mean();
    let trend_std = self.trend.iter().flatten().std_dev();

    SeasonalityProfile {
      trend_strength: trend_std / level,
      seasonal_strength: self.seasonal.iter().std_dev() / level,
    }
  }
}
