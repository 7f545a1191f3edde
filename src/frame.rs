//! # Frame
//!
//! $$
//! X \in \mathbb R^{T \times N},\quad r_{t,i} = \frac{X_{t,i}}{X_{t-1,i}} - 1
//! $$
//!
//! Keyed tables: rows are keyed by date, columns by asset name. Alignment
//! between tables is always done by key.

pub mod index;
pub mod matrix;
pub mod provider;
pub mod returns;
pub mod selector;
pub mod series;
pub mod table;

pub use index::AssetIndex;
pub use index::AssetVector;
pub use matrix::AssetMatrix;
pub use provider::AssetTableProvider;
pub use provider::InMemoryProvider;
pub use returns::ReturnsTable;
pub use selector::AssetSelector;
pub use series::BenchmarkSeries;
pub use table::AssetTable;

/// Period-over-period percentage change, undefined when either side is
/// missing or the previous value is zero.
pub(crate) fn pct_change(prev: f64, curr: f64) -> Option<f64> {
  if !prev.is_finite() || !curr.is_finite() || prev == 0.0 {
    return None;
  }
  let r = curr / prev - 1.0;
  r.is_finite().then_some(r)
}
