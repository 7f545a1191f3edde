//! # Market Model
//!
//! $$
//! r_{t,i} = \alpha_i + \beta_i\, r_{t,m} + \varepsilon_{t,i},\qquad
//! \mathbb E[r_i] = r_f + \beta_i(\bar r_m - r_f) + \alpha_i
//! $$
//!
//! Per-asset OLS against the benchmark, joined on date, and the CAPM-style
//! expected return built from it. The intercept is added on top of the CAPM
//! term, so assets with a persistent positive drift rank higher.

use std::collections::HashMap;

use chrono::NaiveDate;
use linreg::linear_regression;
use tracing::debug;

use super::dispersion::sample_mean;
use super::types::AlphaBeta;
use crate::frame::AssetVector;
use crate::frame::ReturnsTable;

/// Intercept and slope of `y` on `x`; `None` with fewer than two points, a flat
/// regressor or non-finite coefficients.
pub(crate) fn ols_line(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
  if x.len() < 2 || x.len() != y.len() || x.windows(2).all(|w| w[0] == w[1]) {
    return None;
  }
  let (slope, intercept): (f64, f64) = linear_regression(x, y).ok()?;
  (slope.is_finite() && intercept.is_finite()).then_some((intercept, slope))
}

/// Regress every asset's returns on the benchmark returns sharing its dates.
pub fn estimate_alpha_beta(
  returns: &ReturnsTable,
  benchmark_returns: &[(NaiveDate, f64)],
) -> AssetVector<AlphaBeta> {
  let market: HashMap<NaiveDate, f64> = benchmark_returns.iter().copied().collect();

  let rows = (0..returns.assets().len())
    .map(|pos| {
      let (x, y): (Vec<f64>, Vec<f64>) = returns
        .observations_at(pos)
        .into_iter()
        .filter_map(|(date, r)| market.get(&date).map(|m| (*m, r)))
        .unzip();

      match ols_line(&x, &y) {
        Some((alpha, beta)) => AlphaBeta {
          alpha: Some(alpha),
          beta: Some(beta),
        },
        None => {
          debug!(
            asset = %returns.assets().names()[pos],
            overlap = x.len(),
            "market regression undefined"
          );
          AlphaBeta::missing()
        }
      }
    })
    .collect();

  AssetVector::new(returns.assets().clone(), rows)
}

/// Mean benchmark return over every available period.
pub fn mean_market_return(benchmark_returns: &[(NaiveDate, f64)]) -> Option<f64> {
  if benchmark_returns.is_empty() {
    return None;
  }
  let r: Vec<f64> = benchmark_returns.iter().map(|(_, r)| *r).collect();
  Some(sample_mean(&r))
}

/// `rf + beta * (mean_market - rf) + alpha` per asset.
pub fn expected_returns(
  alpha_beta: &AssetVector<AlphaBeta>,
  mean_market: Option<f64>,
  risk_free_rate: f64,
) -> AssetVector<Option<f64>> {
  let values = alpha_beta
    .values()
    .iter()
    .map(|ab| {
      let (alpha, beta, market) = (ab.alpha?, ab.beta?, mean_market?);
      Some(risk_free_rate + beta * (market - risk_free_rate) + alpha)
    })
    .collect();
  AssetVector::new(alpha_beta.assets().clone(), values)
}
