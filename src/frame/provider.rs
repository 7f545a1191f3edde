//! Boundary to the dataset loader.
//!
//! Reading, reshaping and interpolating source files happens outside this
//! crate; loaders hand over a clean [`AssetTable`] and [`BenchmarkSeries`]
//! through [`AssetTableProvider`].

use super::series::BenchmarkSeries;
use super::table::AssetTable;

/// Source of a cleaned asset table and its benchmark.
pub trait AssetTableProvider {
  /// Dense, date-ordered level table.
  fn load_asset_table(&self) -> anyhow::Result<AssetTable>;
  /// Market-average series used as the regression benchmark.
  fn load_benchmark(&self) -> anyhow::Result<BenchmarkSeries>;
}

/// Provider over tables that are already in memory.
#[derive(Clone, Debug)]
pub struct InMemoryProvider {
  table: AssetTable,
  benchmark: BenchmarkSeries,
}

impl InMemoryProvider {
  pub fn new(table: AssetTable, benchmark: BenchmarkSeries) -> Self {
    Self { table, benchmark }
  }
}

impl AssetTableProvider for InMemoryProvider {
  fn load_asset_table(&self) -> anyhow::Result<AssetTable> {
    Ok(self.table.clone())
  }

  fn load_benchmark(&self) -> anyhow::Result<BenchmarkSeries> {
    Ok(self.benchmark.clone())
  }
}
