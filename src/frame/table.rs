//! Date × asset level table.

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;

use super::index::AssetIndex;
use super::selector::AssetSelector;
use crate::error::RiskError;
use crate::error::RiskResult;

/// Levels (prices or rents) for a set of assets over a shared, strictly
/// increasing date axis. Non-finite cells are missing observations.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetTable {
  dates: Vec<NaiveDate>,
  assets: AssetIndex,
  values: Array2<f64>,
}

impl AssetTable {
  /// Build a table from a `dates.len() × assets.len()` value matrix.
  pub fn new<I, S>(dates: Vec<NaiveDate>, assets: I, values: Array2<f64>) -> RiskResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let assets = AssetIndex::new(assets)?;
    ensure_increasing(&dates, "asset table")?;
    if values.dim() != (dates.len(), assets.len()) {
      return Err(RiskError::invalid_table(format!(
        "value matrix is {:?}, expected ({}, {})",
        values.dim(),
        dates.len(),
        assets.len()
      )));
    }
    Ok(Self {
      dates,
      assets,
      values,
    })
  }

  /// Build a table from named columns that all share `dates`.
  pub fn from_columns<I, S>(dates: Vec<NaiveDate>, columns: I) -> RiskResult<Self>
  where
    I: IntoIterator<Item = (S, Vec<f64>)>,
    S: Into<String>,
  {
    let (names, columns): (Vec<String>, Vec<Vec<f64>>) = columns
      .into_iter()
      .map(|(name, col)| (name.into(), col))
      .unzip();

    if let Some((name, col)) = names
      .iter()
      .zip(columns.iter())
      .find(|(_, col)| col.len() != dates.len())
    {
      return Err(RiskError::invalid_table(format!(
        "column '{name}' has {} values for {} dates",
        col.len(),
        dates.len()
      )));
    }

    let values = Array2::from_shape_fn((dates.len(), columns.len()), |(t, j)| columns[j][t]);
    Self::new(dates, names, values)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn assets(&self) -> &AssetIndex {
    &self.assets
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn n_periods(&self) -> usize {
    self.dates.len()
  }

  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }

  /// Full column for `name`, missing cells included.
  pub fn column(&self, name: &str) -> RiskResult<ArrayView1<'_, f64>> {
    let pos = self.assets.require(name)?;
    Ok(self.values.column(pos))
  }

  /// Finite `(date, value)` observations of `name`.
  pub fn observations(&self, name: &str) -> RiskResult<Vec<(NaiveDate, f64)>> {
    let column = self.column(name)?;
    Ok(
      self
        .dates
        .iter()
        .zip(column.iter())
        .filter(|(_, v)| v.is_finite())
        .map(|(d, v)| (*d, *v))
        .collect(),
    )
  }

  /// Resolve a positional row, negative indices counting from the end.
  pub fn row_position(&self, index: isize) -> RiskResult<usize> {
    let len = self.dates.len();
    let pos = if index < 0 {
      len.checked_sub(index.unsigned_abs())
    } else {
      Some(index as usize).filter(|&p| p < len)
    };
    pos.ok_or(RiskError::IndexOutOfRange { index, len })
  }

  /// Row position of `date`.
  pub fn date_position(&self, date: NaiveDate) -> RiskResult<usize> {
    self
      .dates
      .binary_search(&date)
      .map_err(|_| RiskError::DateNotFound { date })
  }

  /// Sub-table holding the selected columns.
  pub fn select(&self, selector: &AssetSelector) -> RiskResult<Self> {
    let positions = selector.resolve(&self.assets)?;
    Ok(Self {
      dates: self.dates.clone(),
      assets: self.assets.take(&positions),
      values: self.values.select(Axis(1), &positions),
    })
  }
}

pub(crate) fn ensure_increasing(dates: &[NaiveDate], what: &str) -> RiskResult<()> {
  match dates.windows(2).find(|w| w[0] >= w[1]) {
    Some(w) => Err(RiskError::invalid_table(format!(
      "{what} dates must be strictly increasing ({} then {})",
      w[0], w[1]
    ))),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::test_support::month_starts;

  fn table() -> AssetTable {
    AssetTable::from_columns(
      month_starts(2020, 1, 3),
      [
        ("A", vec![100.0, 110.0, 121.0]),
        ("B", vec![100.0, f64::NAN, 100.0]),
        ("C", vec![50.0, 55.0, 60.0]),
      ],
    )
    .unwrap()
  }

  #[test]
  fn columns_must_match_date_axis() {
    let err = AssetTable::from_columns(month_starts(2020, 1, 3), [("A", vec![1.0, 2.0])]);
    assert!(matches!(err, Err(RiskError::InvalidTable { .. })));
  }

  #[test]
  fn dates_must_increase() {
    let mut dates = month_starts(2020, 1, 3);
    dates.swap(0, 1);
    let err = AssetTable::from_columns(dates, [("A", vec![1.0, 2.0, 3.0])]);
    assert!(matches!(err, Err(RiskError::InvalidTable { .. })));
  }

  #[test]
  fn observations_skip_missing_cells() {
    let obs = table().observations("B").unwrap();
    assert_eq!(obs.len(), 2);
    assert!(matches!(
      table().observations("Z"),
      Err(RiskError::AssetNotFound { .. })
    ));
  }

  #[test]
  fn negative_row_positions_count_from_the_end() {
    let t = table();
    assert_eq!(t.row_position(-1).unwrap(), 2);
    assert_eq!(t.row_position(0).unwrap(), 0);
    assert!(matches!(
      t.row_position(3),
      Err(RiskError::IndexOutOfRange { .. })
    ));
    assert!(matches!(
      t.row_position(-4),
      Err(RiskError::IndexOutOfRange { .. })
    ));
  }

  #[test]
  fn select_keeps_requested_order() {
    let t = table().select(&AssetSelector::named(["C", "A"])).unwrap();
    assert_eq!(t.assets().names(), &["C".to_string(), "A".to_string()]);
    assert_eq!(t.column("C").unwrap()[2], 60.0);
    assert_eq!(t.n_periods(), 3);
  }
}
