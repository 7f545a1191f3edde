//! Column selection for engine construction.

use std::collections::HashSet;

use super::index::AssetIndex;
use crate::error::RiskError;
use crate::error::RiskResult;

/// Which columns of an [`super::AssetTable`] form the engine's universe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSelector {
  /// Explicit asset names, in the order they should appear.
  Named(Vec<String>),
  /// The first `k` columns of the table.
  First(usize),
}

impl AssetSelector {
  pub fn named<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::Named(names.into_iter().map(Into::into).collect())
  }

  /// Column positions picked from `assets`.
  pub(crate) fn resolve(&self, assets: &AssetIndex) -> RiskResult<Vec<usize>> {
    match self {
      Self::First(k) => {
        if *k > assets.len() {
          return Err(RiskError::invalid_selection(format!(
            "requested the first {k} columns of a table with {}",
            assets.len()
          )));
        }
        Ok((0..*k).collect())
      }
      Self::Named(names) => {
        let mut seen = HashSet::with_capacity(names.len());
        names
          .iter()
          .map(|name| {
            if !seen.insert(name.as_str()) {
              return Err(RiskError::invalid_selection(format!(
                "asset '{name}' selected twice"
              )));
            }
            assets
              .position(name)
              .ok_or_else(|| RiskError::invalid_selection(format!("unknown asset '{name}'")))
          })
          .collect()
      }
    }
  }
}

impl From<usize> for AssetSelector {
  fn from(k: usize) -> Self {
    Self::First(k)
  }
}

impl From<Vec<String>> for AssetSelector {
  fn from(names: Vec<String>) -> Self {
    Self::Named(names)
  }
}

impl From<&[&str]> for AssetSelector {
  fn from(names: &[&str]) -> Self {
    Self::named(names.iter().copied())
  }
}
