//! Price-on-rent regression across assets at one date.

use chrono::NaiveDate;
use serde::Serialize;
use statrs::statistics::Statistics;

use super::by_defined_ascending;
use crate::error::RiskError;
use crate::error::RiskResult;
use crate::risk::dispersion::sample_mean;
use crate::risk::market_model::ols_line;

/// One asset's price against the price its rent implies.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValuationRow {
  pub asset: String,
  pub price: f64,
  pub rent: f64,
  pub predicted_price: f64,
  /// `price - predicted_price`.
  pub mispricing: f64,
  /// Standardised mispricing; `None` when mispricing has no dispersion.
  pub z_score: Option<f64>,
}

/// Cross-sectional fit `price = intercept + slope * rent` and its residuals,
/// cheapest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CrossSectionalValuation {
  pub date: NaiveDate,
  pub intercept: f64,
  pub slope: f64,
  pub rows: Vec<ValuationRow>,
}

impl CrossSectionalValuation {
  pub fn get(&self, asset: &str) -> Option<&ValuationRow> {
    self.rows.iter().find(|r| r.asset == asset)
  }
}

/// Fit price on rent over `(asset, price, rent)` quotes and score each
/// asset's residual. A flat rent cross-section predicts the mean price.
pub fn value_cross_section(
  date: NaiveDate,
  quotes: &[(String, f64, f64)],
) -> RiskResult<CrossSectionalValuation> {
  if quotes.len() < 2 {
    return Err(RiskError::InsufficientData {
      operation: "cross-sectional valuation",
      required: 2,
      actual: quotes.len(),
    });
  }

  let rents: Vec<f64> = quotes.iter().map(|(_, _, r)| *r).collect();
  let prices: Vec<f64> = quotes.iter().map(|(_, p, _)| *p).collect();
  let (intercept, slope) = ols_line(&rents, &prices).unwrap_or((sample_mean(&prices), 0.0));

  let mispricing: Vec<f64> = quotes
    .iter()
    .map(|(_, price, rent)| price - (intercept + slope * rent))
    .collect();
  let centre = mispricing.iter().mean();
  let spread = mispricing.iter().std_dev();

  let mut rows: Vec<ValuationRow> = quotes
    .iter()
    .zip(mispricing.iter())
    .map(|((asset, price, rent), m)| ValuationRow {
      asset: asset.clone(),
      price: *price,
      rent: *rent,
      predicted_price: price - m,
      mispricing: *m,
      z_score: (spread > 0.0 && spread.is_finite()).then(|| (m - centre) / spread),
    })
    .collect();
  rows.sort_by(|a, b| by_defined_ascending(a.z_score, b.z_score));

  Ok(CrossSectionalValuation {
    date,
    intercept,
    slope,
    rows,
  })
}
