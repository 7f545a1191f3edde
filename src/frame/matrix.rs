//! Square asset × asset matrix.

use ndarray::Array2;
use serde::Serialize;

use super::index::AssetIndex;
use crate::error::RiskResult;

/// Asset × asset matrix keyed by name on both axes. `None` marks an undefined
/// cell (too few overlapping observations, zero variance, ...).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetMatrix {
  assets: AssetIndex,
  values: Array2<Option<f64>>,
}

impl AssetMatrix {
  pub(crate) fn new(assets: AssetIndex, values: Array2<Option<f64>>) -> Self {
    debug_assert_eq!(values.dim(), (assets.len(), assets.len()));
    Self { assets, values }
  }

  pub fn assets(&self) -> &AssetIndex {
    &self.assets
  }

  pub fn values(&self) -> &Array2<Option<f64>> {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.assets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }

  /// Cell for the `(row, col)` asset pair.
  pub fn get(&self, row: &str, col: &str) -> RiskResult<Option<f64>> {
    let i = self.assets.require(row)?;
    let j = self.assets.require(col)?;
    Ok(self.values[[i, j]])
  }

  pub(crate) fn at(&self, i: usize, j: usize) -> Option<f64> {
    self.values[[i, j]]
  }

  pub fn diagonal(&self) -> Vec<Option<f64>> {
    self.values.diag().to_vec()
  }

  /// Apply `f` to every defined cell.
  pub fn map_defined(&self, f: impl Fn(f64) -> f64) -> Self {
    Self {
      assets: self.assets.clone(),
      values: self.values.mapv(|cell| cell.map(&f)),
    }
  }

  /// Row-major copy with undefined cells replaced by `fill`.
  pub fn dense_rows(&self, fill: f64) -> Vec<Vec<f64>> {
    self
      .values
      .rows()
      .into_iter()
      .map(|row| row.iter().map(|cell| cell.unwrap_or(fill)).collect())
      .collect()
  }

  pub fn is_symmetric(&self) -> bool {
    let n = self.len();
    (0..n).all(|i| (i + 1..n).all(|j| self.values[[i, j]] == self.values[[j, i]]))
  }
}
