//! # Risk Types
//!
//! $$
//! \sigma_p = \sqrt{\mathbf w^\top \Sigma \mathbf w},\qquad \mu_p = \mathbf w^\top \mu
//! $$
//!
//! Result containers returned by [`super::RiskEngine`] queries.

use chrono::Month;
use serde::Serialize;

use crate::frame::AssetMatrix;
use crate::frame::AssetVector;
use crate::frame::ReturnsTable;

/// Intercept and slope of an asset's returns regressed on benchmark returns.
/// Both are `None` when the regression is undefined for that asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AlphaBeta {
  pub alpha: Option<f64>,
  pub beta: Option<f64>,
}

impl AlphaBeta {
  pub(crate) fn missing() -> Self {
    Self::default()
  }

  pub fn is_defined(&self) -> bool {
    self.alpha.is_some() && self.beta.is_some()
  }
}

/// One entry of a dominance ranking, scores on a 0-100 scale.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedAsset {
  pub name: String,
  /// Scaled volatility; `None` only for a reference asset without a volatility.
  pub risk_score: Option<f64>,
  /// Scaled expected return; `None` only for a reference asset without one.
  pub return_score: Option<f64>,
}

/// A converged point of the efficient frontier.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrontierPoint {
  /// Portfolio volatility at the optimum.
  pub volatility: f64,
  /// Target expected return the point was solved for.
  pub expected_return: f64,
  /// Optimal weights, ordered like [`super::RiskEngine::frontier_universe`].
  pub weights: Vec<f64>,
}

/// Converged frontier points in increasing target-return order.
pub type FrontierCurve = Vec<FrontierPoint>;

/// A (volatility, expected return) pair for a single asset or the benchmark.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskReturnPoint {
  pub name: String,
  pub volatility: f64,
  pub expected_return: f64,
}

/// Rounded mean level of one calendar month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyMean {
  pub month: Month,
  /// Three-letter English abbreviation ("Jan".."Dec").
  pub label: String,
  pub value: i64,
}

/// One asset on the correlation map: its k-means cluster over distance rows
/// and its first two principal-component coordinates of correlation rows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusteredAsset {
  pub name: String,
  pub cluster: usize,
  pub pc1: f64,
  pub pc2: f64,
}

/// Assets grouped by co-movement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReturnClusters {
  pub assets: Vec<ClusteredAsset>,
  /// Variance share of the first and second components.
  pub explained_variance_ratio: [f64; 2],
}

/// An asset's seasonality features and the cluster they fall in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonalCluster {
  pub name: String,
  pub trend_strength: f64,
  pub seasonal_strength: f64,
  pub cluster: usize,
}

/// Owned snapshot of every table derived at engine construction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskOutputs {
  pub returns: ReturnsTable,
  pub correlation: AssetMatrix,
  pub distance: AssetMatrix,
  pub covariance: AssetMatrix,
  pub alpha_beta: AssetVector<AlphaBeta>,
  pub expected_returns: AssetVector<Option<f64>>,
}
