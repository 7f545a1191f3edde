//! # Valuation
//!
//! $$
//! P_i = a + b\,R_i + u_i,\qquad z_i = \frac{u_i - \bar u}{s_u}
//! $$
//!
//! Price against rent: co-movement of their returns, cross-sectional
//! mispricing at one date, and each asset's price/rent ratio against its own
//! history. Built on two [`RiskEngine`]s, one over rents and one over prices.

pub mod cross_section;
pub mod fair_value;

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

pub use cross_section::value_cross_section;
pub use cross_section::CrossSectionalValuation;
pub use cross_section::ValuationRow;
pub use fair_value::fair_value_bands;
pub use fair_value::FairValuePoint;
pub use fair_value::FairValueSeries;

use crate::error::RiskError;
use crate::error::RiskResult;
use crate::frame::AssetIndex;
use crate::frame::AssetVector;
use crate::risk::dispersion::pearson;
use crate::risk::RiskEngine;

/// Row of the latest valuation whose price tracks its rent closely enough.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Opportunity {
  pub asset: String,
  pub z_score: Option<f64>,
  pub correlation: f64,
  pub price: f64,
  pub rent: f64,
}

/// Owned snapshot of the valuation tables.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValuationOutputs {
  pub price_rent_correlation: AssetVector<Option<f64>>,
  pub latest_valuation: CrossSectionalValuation,
}

/// Ascending by value, undefined entries last.
pub(crate) fn by_defined_ascending(a: Option<f64>, b: Option<f64>) -> Ordering {
  match (a, b) {
    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

/// Price/rent analytics over the assets both engines cover.
#[derive(Debug)]
pub struct MarketValuation<'a> {
  rent: &'a RiskEngine,
  price: &'a RiskEngine,
  price_rent_correlation: AssetVector<Option<f64>>,
}

impl<'a> MarketValuation<'a> {
  pub fn new(rent: &'a RiskEngine, price: &'a RiskEngine) -> RiskResult<Self> {
    let common: Vec<&str> = price
      .assets()
      .iter()
      .filter(|name| rent.assets().contains(name))
      .collect();
    let assets = AssetIndex::new(common.iter().copied())?;

    let correlations = common
      .iter()
      .map(|name| -> RiskResult<Option<f64>> {
        let rents: HashMap<NaiveDate, f64> =
          rent.returns().observations(name)?.into_iter().collect();
        let (p, r): (Vec<f64>, Vec<f64>) = price
          .returns()
          .observations(name)?
          .into_iter()
          .filter_map(|(date, p)| rents.get(&date).map(|r| (p, *r)))
          .unzip();
        Ok(pearson(&p, &r))
      })
      .collect::<RiskResult<Vec<_>>>()?;

    Ok(Self {
      rent,
      price,
      price_rent_correlation: AssetVector::new(assets, correlations),
    })
  }

  /// Pearson correlation of price returns with rent returns, by date.
  pub fn price_rent_correlation(&self) -> &AssetVector<Option<f64>> {
    &self.price_rent_correlation
  }

  /// Regress price on rent across assets at price-table row `row` (negative
  /// counts from the end). The rent table must hold the same date.
  pub fn cross_sectional_valuation(&self, row: isize) -> RiskResult<CrossSectionalValuation> {
    let prices = self.price.data();
    let rents = self.rent.data();
    let price_row = prices.row_position(row)?;
    let date = prices.dates()[price_row];
    let rent_row = rents.date_position(date)?;

    let mut quotes = Vec::new();
    for name in self.price_rent_correlation.assets().iter() {
      let price = prices.column(name)?[price_row];
      let rent = rents.column(name)?[rent_row];
      if price.is_finite() && rent.is_finite() {
        quotes.push((name.to_string(), price, rent));
      }
    }

    value_cross_section(date, &quotes)
  }

  /// Price/rent ratio of `asset` with historical (`None`) or trailing-window
  /// bands.
  pub fn historical_fair_value(
    &self,
    asset: &str,
    window: Option<usize>,
  ) -> RiskResult<FairValueSeries> {
    if !self.rent.assets().contains(asset) {
      return Err(RiskError::asset_not_found(asset));
    }
    let rents: HashMap<NaiveDate, f64> =
      self.rent.data().observations(asset)?.into_iter().collect();
    let rows: Vec<(NaiveDate, f64, f64)> = self
      .price
      .data()
      .observations(asset)?
      .into_iter()
      .filter_map(|(date, price)| rents.get(&date).map(|rent| (date, price, *rent)))
      .collect();

    Ok(fair_value_bands(asset, &rows, window))
  }

  /// Latest valuation rows whose price/rent correlation exceeds `threshold`,
  /// cheapest first.
  pub fn scan_for_opportunities(&self, threshold: f64) -> RiskResult<Vec<Opportunity>> {
    let valuation = self.cross_sectional_valuation(-1)?;
    Ok(self.opportunities_in(&valuation, threshold))
  }

  /// [`Self::scan_for_opportunities`] over an already computed valuation.
  pub fn opportunities_in(
    &self,
    valuation: &CrossSectionalValuation,
    threshold: f64,
  ) -> Vec<Opportunity> {
    // Rows arrive sorted by z-score.
    valuation
      .rows
      .iter()
      .filter_map(|row| {
        let correlation = (*self.price_rent_correlation.get(&row.asset).ok()?)?;
        (correlation > threshold).then(|| Opportunity {
          asset: row.asset.clone(),
          z_score: row.z_score,
          correlation,
          price: row.price,
          rent: row.rent,
        })
      })
      .collect()
  }

  /// Correlations and the latest cross-sectional valuation.
  pub fn to_outputs(&self) -> RiskResult<ValuationOutputs> {
    Ok(ValuationOutputs {
      price_rent_correlation: self.price_rent_correlation.clone(),
      latest_valuation: self.cross_sectional_valuation(-1)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::frame::test_support::month_starts;
  use crate::frame::AssetSelector;
  use crate::frame::AssetTable;
  use crate::frame::BenchmarkSeries;
  use crate::risk::build_engine;

  const N: usize = 30;

  fn path(base: f64, growth: f64, wiggle: f64, freq: f64) -> Vec<f64> {
    (0..N)
      .map(|t| base * (1.0 + growth).powi(t as i32) * (1.0 + wiggle * (t as f64 * freq).sin()))
      .collect()
  }

  fn engines() -> (RiskEngine, RiskEngine) {
    let dates = month_starts(2020, 1, N);
    let rents = AssetTable::from_columns(
      dates.clone(),
      [
        ("Austin", path(1_500.0, 0.004, 0.01, 0.8)),
        ("Boston", path(2_500.0, 0.003, 0.02, 1.3)),
        ("Chicago", path(1_800.0, 0.002, 0.015, 0.5)),
        ("Rentonly", path(900.0, 0.001, 0.01, 0.9)),
      ],
    )
    .unwrap();
    let prices = AssetTable::from_columns(
      dates.clone(),
      [
        // Austin prices follow its rents; Boston moves on its own.
        ("Austin", path(300_000.0, 0.004, 0.01, 0.8)),
        ("Boston", path(900_000.0, 0.003, 0.02, 2.9)),
        ("Chicago", path(250_000.0, 0.002, 0.015, 0.5)),
        ("Priceonly", path(500_000.0, 0.001, 0.01, 0.9)),
      ],
    )
    .unwrap();
    let bench = BenchmarkSeries::new(dates, path(100.0, 0.003, 0.01, 0.7)).unwrap();

    (
      build_engine(&rents, &AssetSelector::First(4), bench.clone(), 0.0).unwrap(),
      build_engine(&prices, &AssetSelector::First(4), bench, 0.0).unwrap(),
    )
  }

  #[test]
  fn correlation_covers_common_assets_in_price_order() {
    let (rent, price) = engines();
    let valuation = MarketValuation::new(&rent, &price).unwrap();
    let corr = valuation.price_rent_correlation();

    assert_eq!(corr.assets().names(), ["Austin", "Boston", "Chicago"]);
    assert_abs_diff_eq!(corr.get("Austin").unwrap().unwrap(), 1.0, epsilon = 1e-9);
    assert!(corr.get("Boston").unwrap().unwrap() < 0.9);
  }

  #[test]
  fn cross_section_uses_requested_row() {
    let (rent, price) = engines();
    let valuation = MarketValuation::new(&rent, &price).unwrap();

    let latest = valuation.cross_sectional_valuation(-1).unwrap();
    assert_eq!(latest.date, *price.data().dates().last().unwrap());
    assert_eq!(latest.rows.len(), 3);

    let first = valuation.cross_sectional_valuation(0).unwrap();
    assert_eq!(first.date, price.data().dates()[0]);

    let err = valuation.cross_sectional_valuation(N as isize).unwrap_err();
    assert!(matches!(err, RiskError::IndexOutOfRange { .. }));
  }

  #[test]
  fn fair_value_requires_both_tables() {
    let (rent, price) = engines();
    let valuation = MarketValuation::new(&rent, &price).unwrap();

    let series = valuation.historical_fair_value("Austin", None).unwrap();
    assert_eq!(series.points.len(), N);
    assert_abs_diff_eq!(series.points[0].ratio, 200.0, epsilon = 1e-9);

    for missing in ["Rentonly", "Priceonly", "Nowhere"] {
      let err = valuation.historical_fair_value(missing, Some(12)).unwrap_err();
      assert!(matches!(err, RiskError::AssetNotFound { .. }));
    }
  }

  #[test]
  fn scan_filters_on_correlation_and_keeps_z_order() {
    let (rent, price) = engines();
    let valuation = MarketValuation::new(&rent, &price).unwrap();
    let opportunities = valuation.scan_for_opportunities(0.5).unwrap();

    let names: Vec<&str> = opportunities.iter().map(|o| o.asset.as_str()).collect();
    assert!(names.contains(&"Austin"));
    assert!(names.contains(&"Chicago"));
    assert!(opportunities.iter().all(|o| o.correlation > 0.5));
    for pair in opportunities.windows(2) {
      assert!(pair[0].z_score <= pair[1].z_score);
    }

    assert!(valuation.scan_for_opportunities(1.5).unwrap().is_empty());
  }

  #[test]
  fn rent_table_missing_the_date_is_reported() {
    let (rent, _) = engines();
    let dates = month_starts(2018, 1, N);
    let prices = AssetTable::from_columns(
      dates.clone(),
      [
        ("Austin", path(300_000.0, 0.004, 0.01, 0.8)),
        ("Boston", path(900_000.0, 0.003, 0.02, 2.9)),
      ],
    )
    .unwrap();
    let bench = BenchmarkSeries::new(dates, path(100.0, 0.003, 0.01, 0.7)).unwrap();
    let price = build_engine(&prices, &AssetSelector::First(2), bench, 0.0).unwrap();
    let valuation = MarketValuation::new(&rent, &price).unwrap();

    let err = valuation.cross_sectional_valuation(0).unwrap_err();
    assert!(matches!(err, RiskError::DateNotFound { .. }));
  }
}
