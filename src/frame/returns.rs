//! Period-over-period return table.

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView1;
use serde::Serialize;

use super::index::AssetIndex;
use super::pct_change;
use super::table::AssetTable;
use crate::error::RiskResult;

/// Percentage returns derived from an [`AssetTable`]. Row `t` holds the change
/// from `t` to `t + 1` of the source table and is keyed by the later date.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReturnsTable {
  dates: Vec<NaiveDate>,
  assets: AssetIndex,
  values: Array2<Option<f64>>,
}

impl ReturnsTable {
  pub fn from_levels(table: &AssetTable) -> Self {
    let levels = table.values();
    let n_rows = table.n_periods().saturating_sub(1);
    let values = Array2::from_shape_fn((n_rows, table.n_assets()), |(t, j)| {
      pct_change(levels[[t, j]], levels[[t + 1, j]])
    });

    Self {
      dates: table.dates().iter().skip(1).copied().collect(),
      assets: table.assets().clone(),
      values,
    }
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn assets(&self) -> &AssetIndex {
    &self.assets
  }

  pub fn values(&self) -> &Array2<Option<f64>> {
    &self.values
  }

  pub fn n_periods(&self) -> usize {
    self.dates.len()
  }

  pub(crate) fn column_at(&self, pos: usize) -> ArrayView1<'_, Option<f64>> {
    self.values.column(pos)
  }

  /// Defined `(date, return)` pairs of `name`.
  pub fn observations(&self, name: &str) -> RiskResult<Vec<(NaiveDate, f64)>> {
    let pos = self.assets.require(name)?;
    Ok(self.observations_at(pos))
  }

  pub(crate) fn observations_at(&self, pos: usize) -> Vec<(NaiveDate, f64)> {
    self
      .dates
      .iter()
      .zip(self.values.column(pos).iter())
      .filter_map(|(d, r)| r.map(|r| (*d, r)))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::test_support::month_starts;

  #[test]
  fn has_one_row_fewer_than_levels() {
    for n in [1usize, 2, 7] {
      let levels: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
      let table = AssetTable::from_columns(month_starts(2019, 3, n), [("A", levels)]).unwrap();
      assert_eq!(ReturnsTable::from_levels(&table).n_periods(), n - 1);
    }
  }

  #[test]
  fn computes_simple_returns_keyed_by_later_date() {
    let dates = month_starts(2019, 1, 3);
    let table = AssetTable::from_columns(
      dates.clone(),
      [("A", vec![100.0, 110.0, 121.0]), ("B", vec![100.0, f64::NAN, 100.0])],
    )
    .unwrap();
    let returns = ReturnsTable::from_levels(&table);

    assert_eq!(returns.dates(), &dates[1..]);
    for (_, r) in returns.observations("A").unwrap() {
      assert!((r - 0.1).abs() < 1e-12);
    }
    assert!(returns.observations("B").unwrap().is_empty());
  }
}
