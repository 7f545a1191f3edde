//! Benchmark (market-average) series.

use chrono::NaiveDate;

use super::pct_change;
use super::table::ensure_increasing;
use crate::error::RiskError;
use crate::error::RiskResult;

/// Market-wide level series on its own date axis.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkSeries {
  dates: Vec<NaiveDate>,
  values: Vec<f64>,
}

impl BenchmarkSeries {
  pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> RiskResult<Self> {
    if dates.len() != values.len() {
      return Err(RiskError::invalid_table(format!(
        "benchmark has {} dates and {} values",
        dates.len(),
        values.len()
      )));
    }
    ensure_increasing(&dates, "benchmark")?;
    Ok(Self { dates, values })
  }

  pub fn from_pairs<I>(points: I) -> RiskResult<Self>
  where
    I: IntoIterator<Item = (NaiveDate, f64)>,
  {
    let (dates, values) = points.into_iter().unzip();
    Self::new(dates, values)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn values(&self) -> &[f64] {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Percentage changes keyed by the later date; undefined changes are dropped.
  pub fn returns(&self) -> Vec<(NaiveDate, f64)> {
    self
      .values
      .windows(2)
      .zip(self.dates.iter().skip(1))
      .filter_map(|(w, date)| pct_change(w[0], w[1]).map(|r| (*date, r)))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::test_support::month_starts;

  #[test]
  fn returns_drop_first_and_undefined_periods() {
    let series =
      BenchmarkSeries::new(month_starts(2021, 1, 4), vec![100.0, 0.0, 50.0, 55.0]).unwrap();
    let returns = series.returns();

    assert_eq!(returns.len(), 2);
    assert_eq!(returns[0].0, month_starts(2021, 2, 1)[0]);
    assert!((returns[0].1 + 1.0).abs() < 1e-12);
    assert!((returns[1].1 - 0.1).abs() < 1e-12);
  }

  #[test]
  fn rejects_mismatched_lengths() {
    let err = BenchmarkSeries::new(month_starts(2021, 1, 2), vec![1.0]).unwrap_err();
    assert!(matches!(err, RiskError::InvalidTable { .. }));
  }
}
