//! Asset axis and per-asset vectors keyed by it.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

use crate::error::RiskError;
use crate::error::RiskResult;

/// Ordered, duplicate-free asset names with constant-time lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetIndex {
  names: Vec<String>,
  lookup: HashMap<String, usize>,
}

impl AssetIndex {
  /// Build an index, rejecting repeated names.
  pub fn new<I, S>(names: I) -> RiskResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    let mut lookup = HashMap::with_capacity(names.len());
    for (pos, name) in names.iter().enumerate() {
      if lookup.insert(name.clone(), pos).is_some() {
        return Err(RiskError::invalid_table(format!("duplicate asset name '{name}'")));
      }
    }
    Ok(Self { names, lookup })
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn contains(&self, name: &str) -> bool {
    self.lookup.contains_key(name)
  }

  /// Column position of `name`, if present.
  pub fn position(&self, name: &str) -> Option<usize> {
    self.lookup.get(name).copied()
  }

  /// Column position of `name`, or [`RiskError::AssetNotFound`].
  pub fn require(&self, name: &str) -> RiskResult<usize> {
    self.position(name).ok_or_else(|| RiskError::asset_not_found(name))
  }

  /// Sub-index made of the given positions, in that order.
  pub(crate) fn take(&self, positions: &[usize]) -> Self {
    let names: Vec<String> = positions.iter().map(|&i| self.names[i].clone()).collect();
    let lookup = names
      .iter()
      .enumerate()
      .map(|(pos, name)| (name.clone(), pos))
      .collect();
    Self { names, lookup }
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }
}

impl Serialize for AssetIndex {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.names.serialize(serializer)
  }
}

/// One value per asset, in index order.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetVector<T> {
  assets: AssetIndex,
  values: Vec<T>,
}

impl<T> AssetVector<T> {
  pub(crate) fn new(assets: AssetIndex, values: Vec<T>) -> Self {
    debug_assert_eq!(assets.len(), values.len());
    Self { assets, values }
  }

  pub fn assets(&self) -> &AssetIndex {
    &self.assets
  }

  pub fn values(&self) -> &[T] {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Value for `name`, or [`RiskError::AssetNotFound`].
  pub fn get(&self, name: &str) -> RiskResult<&T> {
    let pos = self.assets.require(name)?;
    Ok(&self.values[pos])
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
    self.assets.iter().zip(self.values.iter())
  }
}

impl<T: Serialize> Serialize for AssetVector<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.values.len()))?;
    for (name, value) in self.iter() {
      map.serialize_entry(name, value)?;
    }
    map.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_duplicate_names() {
    let err = AssetIndex::new(["Austin (TX)", "Boise (ID)", "Austin (TX)"]).unwrap_err();
    assert!(matches!(err, RiskError::InvalidTable { .. }));
  }

  #[test]
  fn vector_lookup_reports_missing_asset() {
    let assets = AssetIndex::new(["A", "B"]).unwrap();
    let v = AssetVector::new(assets, vec![Some(1.0), None]);

    assert_eq!(*v.get("A").unwrap(), Some(1.0));
    assert_eq!(*v.get("B").unwrap(), None);
    assert!(matches!(v.get("C"), Err(RiskError::AssetNotFound { .. })));
  }

  #[test]
  fn vector_serializes_as_name_keyed_map() {
    let assets = AssetIndex::new(["A", "B"]).unwrap();
    let v = AssetVector::new(assets, vec![Some(0.5), None]);
    let json = serde_json::to_string(&v).unwrap();
    assert_eq!(json, r#"{"A":0.5,"B":null}"#);
  }
}
