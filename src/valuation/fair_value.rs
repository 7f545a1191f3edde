//! Price-to-rent ratio of one asset against its own history.

use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Band width in standard deviations.
pub const BAND_SIGMAS: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FairValuePoint {
  pub date: NaiveDate,
  pub price: f64,
  pub rent: f64,
  pub ratio: f64,
  /// Reference ratio: the full-history mean, or the trailing-window mean.
  pub mean: Option<f64>,
  pub upper: Option<f64>,
  pub lower: Option<f64>,
}

impl FairValuePoint {
  /// Distance of the ratio from its reference, in standard deviations.
  pub fn deviation(&self) -> Option<f64> {
    let (mean, upper) = (self.mean?, self.upper?);
    let sigma = (upper - mean) / BAND_SIGMAS;
    (sigma > 0.0).then(|| (self.ratio - mean) / sigma)
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FairValueSeries {
  pub asset: String,
  /// Trailing window in periods; `None` for full-history bands.
  pub window: Option<usize>,
  pub points: Vec<FairValuePoint>,
}

impl FairValueSeries {
  pub fn latest(&self) -> Option<&FairValuePoint> {
    self.points.last()
  }
}

fn bands(sample: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>) {
  if sample.is_empty() {
    return (None, None, None);
  }
  let mean = sample.iter().mean();
  if sample.len() < 2 {
    return (Some(mean), None, None);
  }
  let std = sample.iter().std_dev();
  (
    Some(mean),
    Some(mean + BAND_SIGMAS * std),
    Some(mean - BAND_SIGMAS * std),
  )
}

/// Ratio series over date-aligned `(date, price, rent)` rows with mean ± 2σ
/// bands. A window of `Some(w)` uses the trailing `w` ratios and leaves the
/// first `w - 1` points without bands; `None` or `Some(0)` uses the full
/// history.
pub fn fair_value_bands(
  asset: &str,
  rows: &[(NaiveDate, f64, f64)],
  window: Option<usize>,
) -> FairValueSeries {
  let rows: Vec<(NaiveDate, f64, f64, f64)> = rows
    .iter()
    .map(|&(date, price, rent)| (date, price, rent, price / rent))
    .filter(|(_, _, _, ratio)| ratio.is_finite())
    .collect();
  let ratios: Vec<f64> = rows.iter().map(|r| r.3).collect();
  let window = window.filter(|&w| w > 0);

  let full = bands(&ratios);
  let points = rows
    .iter()
    .enumerate()
    .map(|(t, &(date, price, rent, ratio))| {
      let (mean, upper, lower) = match window {
        None => full,
        Some(w) if t + 1 < w => (None, None, None),
        Some(w) => bands(&ratios[t + 1 - w..=t]),
      };
      FairValuePoint {
        date,
        price,
        rent,
        ratio,
        mean,
        upper,
        lower,
      }
    })
    .collect();

  FairValueSeries {
    asset: asset.to_string(),
    window,
    points,
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::frame::test_support::month_starts;

  fn rows(ratios: &[f64]) -> Vec<(NaiveDate, f64, f64)> {
    month_starts(2015, 1, ratios.len())
      .into_iter()
      .zip(ratios.iter())
      .map(|(d, r)| (d, r * 1_000.0, 1_000.0))
      .collect()
  }

  #[test]
  fn historical_bands_are_constant() {
    let series = fair_value_bands("X", &rows(&[10.0, 12.0, 14.0, 16.0]), None);
    let std = [10.0f64, 12.0, 14.0, 16.0].iter().std_dev();

    for p in &series.points {
      assert_abs_diff_eq!(p.mean.unwrap(), 13.0, epsilon = 1e-12);
      assert_abs_diff_eq!(p.upper.unwrap(), 13.0 + 2.0 * std, epsilon = 1e-12);
      assert_abs_diff_eq!(p.lower.unwrap(), 13.0 - 2.0 * std, epsilon = 1e-12);
    }
    let latest = series.latest().unwrap();
    assert_abs_diff_eq!(latest.deviation().unwrap(), 3.0 / std, epsilon = 1e-12);
  }

  #[test]
  fn rolling_bands_start_after_window_fills() {
    let series = fair_value_bands("X", &rows(&[10.0, 12.0, 14.0, 20.0, 20.0]), Some(3));

    assert_eq!(series.window, Some(3));
    assert_eq!(series.points[0].mean, None);
    assert_eq!(series.points[1].upper, None);
    assert_abs_diff_eq!(series.points[2].mean.unwrap(), 12.0, epsilon = 1e-12);
    assert_abs_diff_eq!(series.points[4].mean.unwrap(), 18.0, epsilon = 1e-12);
  }

  #[test]
  fn zero_window_means_full_history() {
    let series = fair_value_bands("X", &rows(&[1.0, 2.0, 3.0]), Some(0));
    assert_eq!(series.window, None);
    assert_abs_diff_eq!(series.points[0].mean.unwrap(), 2.0, epsilon = 1e-12);
  }

  #[test]
  fn zero_rent_periods_are_skipped() {
    let mut input = rows(&[10.0, 11.0, 12.0]);
    input[1].2 = 0.0;
    let series = fair_value_bands("X", &input, None);

    assert_eq!(series.points.len(), 2);
    assert_abs_diff_eq!(series.points[0].mean.unwrap(), 11.0, epsilon = 1e-12);
  }
}
