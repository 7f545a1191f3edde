//! # Risk Engine
//!
//! $$
//! (X, m) \mapsto \big(r,\ \rho,\ 1-\rho,\ \Sigma,\ (\alpha_i, \beta_i),\ \mathbb E[r_i]\big)
//! $$
//!
//! Entry point that derives every table once from an asset table and a
//! benchmark, then answers read-only queries against them.

use std::sync::OnceLock;

use chrono::NaiveDate;
use statrs::statistics::Statistics;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::cluster::kmeans;
use super::cluster::principal_components;
use super::dispersion::correlation_matrix;
use super::dispersion::covariance_matrix;
use super::dispersion::distance_matrix;
use super::frontier::MeanVarianceProblem;
use super::market_model::estimate_alpha_beta;
use super::market_model::expected_returns;
use super::market_model::mean_market_return;
use super::ranking;
use super::seasonal;
use super::seasonal::SeasonalDecomposition;
use super::seasonal::SeasonalityProfile;
use super::types::AlphaBeta;
use super::types::ClusteredAsset;
use super::types::FrontierCurve;
use super::types::MonthlyMean;
use super::types::RankedAsset;
use super::types::ReturnClusters;
use super::types::RiskOutputs;
use super::types::RiskReturnPoint;
use super::types::SeasonalCluster;
use crate::config::EngineConfig;
use crate::error::RiskResult;
use crate::frame::AssetIndex;
use crate::frame::AssetMatrix;
use crate::frame::AssetSelector;
use crate::frame::AssetTable;
use crate::frame::AssetTableProvider;
use crate::frame::AssetVector;
use crate::frame::BenchmarkSeries;
use crate::frame::ReturnsTable;
use crate::stats::stationarity::adf_test;
use crate::stats::stationarity::ADFConfig;
use crate::stats::stationarity::ADFResult;

/// Name reported by [`RiskEngine::market_point`].
pub const MARKET_LABEL: &str = "Market";

/// Risk analytics over a fixed selection of assets and one benchmark.
///
/// Every derived table is computed in [`RiskEngine::new`] and never mutated.
/// The only interior state is the frontier cache, written at most once.
#[derive(Clone, Debug)]
pub struct RiskEngine {
  config: EngineConfig,
  data: AssetTable,
  benchmark: BenchmarkSeries,
  benchmark_returns: Vec<(NaiveDate, f64)>,
  returns: ReturnsTable,
  correlation: AssetMatrix,
  distance: AssetMatrix,
  covariance: AssetMatrix,
  alpha_beta: AssetVector<AlphaBeta>,
  expected_returns: AssetVector<Option<f64>>,
  volatilities: AssetVector<Option<f64>>,
  frontier: OnceLock<FrontierCurve>,
}

/// Build an engine with default settings and the given risk-free rate.
pub fn build_engine(
  table: &AssetTable,
  selector: &AssetSelector,
  benchmark: BenchmarkSeries,
  risk_free_rate: f64,
) -> RiskResult<RiskEngine> {
  RiskEngine::new(
    table,
    selector,
    benchmark,
    EngineConfig::with_risk_free_rate(risk_free_rate),
  )
}

impl RiskEngine {
  /// Select the assets and derive returns, dispersion and market-model tables.
  pub fn new(
    table: &AssetTable,
    selector: &AssetSelector,
    benchmark: BenchmarkSeries,
    config: EngineConfig,
  ) -> RiskResult<Self> {
    config.validate()?;
    let data = table.select(selector)?;

    let returns = ReturnsTable::from_levels(&data);
    let correlation = correlation_matrix(&returns);
    let distance = distance_matrix(&correlation);
    let covariance = covariance_matrix(&returns);

    let benchmark_returns = benchmark.returns();
    let alpha_beta = estimate_alpha_beta(&returns, &benchmark_returns);
    let expected_returns = expected_returns(
      &alpha_beta,
      mean_market_return(&benchmark_returns),
      config.risk_free_rate,
    );
    let volatilities = AssetVector::new(
      data.assets().clone(),
      covariance
        .diagonal()
        .into_iter()
        .map(|var| var.map(|v| v.max(0.0).sqrt()))
        .collect(),
    );

    info!(
      assets = data.n_assets(),
      periods = data.n_periods(),
      benchmark_periods = benchmark.len(),
      regressions = alpha_beta.values().iter().filter(|ab| ab.is_defined()).count(),
      risk_free_rate = config.risk_free_rate,
      "risk engine built"
    );

    Ok(Self {
      config,
      data,
      benchmark,
      benchmark_returns,
      returns,
      correlation,
      distance,
      covariance,
      alpha_beta,
      expected_returns,
      volatilities,
      frontier: OnceLock::new(),
    })
  }

  /// Load the table and benchmark from `provider`, then build the engine.
  pub fn from_provider<P>(
    provider: &P,
    selector: &AssetSelector,
    config: EngineConfig,
  ) -> RiskResult<Self>
  where
    P: AssetTableProvider + ?Sized,
  {
    let table = provider.load_asset_table()?;
    let benchmark = provider.load_benchmark()?;
    Self::new(&table, selector, benchmark, config)
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Selected asset levels.
  pub fn data(&self) -> &AssetTable {
    &self.data
  }

  pub fn assets(&self) -> &AssetIndex {
    self.data.assets()
  }

  pub fn benchmark(&self) -> &BenchmarkSeries {
    &self.benchmark
  }

  /// Benchmark returns keyed by the later date of each period.
  pub fn benchmark_returns(&self) -> &[(NaiveDate, f64)] {
    &self.benchmark_returns
  }

  pub fn returns(&self) -> &ReturnsTable {
    &self.returns
  }

  pub fn correlation(&self) -> &AssetMatrix {
    &self.correlation
  }

  pub fn distance(&self) -> &AssetMatrix {
    &self.distance
  }

  pub fn covariance(&self) -> &AssetMatrix {
    &self.covariance
  }

  pub fn alpha_beta(&self) -> &AssetVector<AlphaBeta> {
    &self.alpha_beta
  }

  pub fn expected_returns(&self) -> &AssetVector<Option<f64>> {
    &self.expected_returns
  }

  /// Square root of each asset's return variance.
  pub fn volatilities(&self) -> &AssetVector<Option<f64>> {
    &self.volatilities
  }

  /// `reference` followed by up to `top_n` assets that dominate it.
  pub fn rank_dominators(&self, reference: &str, top_n: usize) -> RiskResult<Vec<RankedAsset>> {
    ranking::rank_dominators(&self.volatilities, &self.expected_returns, reference, top_n)
  }

  /// [`Self::rank_dominators`] with the configured `default_top_n`.
  pub fn rank_dominators_default(&self, reference: &str) -> RiskResult<Vec<RankedAsset>> {
    self.rank_dominators(reference, self.config.default_top_n)
  }

  /// Calendar-month averages of an asset's levels.
  pub fn monthly_means(&self, asset: &str) -> RiskResult<Vec<MonthlyMean>> {
    Ok(seasonal::monthly_means(&self.data.observations(asset)?))
  }

  /// Positions of the assets eligible for the frontier: defined expected
  /// return and defined variance.
  fn frontier_positions(&self) -> Vec<usize> {
    (0..self.assets().len())
      .filter(|&i| {
        self.expected_returns.values()[i].is_some() && self.covariance.at(i, i).is_some()
      })
      .collect()
  }

  /// Assets taking part in the frontier, in the order of
  /// [`crate::risk::FrontierPoint::weights`].
  pub fn frontier_universe(&self) -> Vec<String> {
    self
      .frontier_positions()
      .into_iter()
      .map(|i| self.assets().names()[i].clone())
      .collect()
  }

  fn frontier_problem(&self) -> MeanVarianceProblem {
    let positions = self.frontier_positions();
    let mu = positions
      .iter()
      .filter_map(|&i| self.expected_returns.values()[i])
      .collect();
    // Pairs without enough overlap contribute no co-movement.
    let cov = positions
      .iter()
      .map(|&i| {
        positions
          .iter()
          .map(|&j| self.covariance.at(i, j).unwrap_or(0.0))
          .collect()
      })
      .collect();
    MeanVarianceProblem::new(mu, cov)
  }

  /// Minimum-volatility portfolios for `n_points` evenly spaced target
  /// returns. Targets the solver cannot meet are left out.
  pub fn compute_frontier(&self, n_points: usize) -> FrontierCurve {
    let curve = self.frontier_problem().frontier(
      n_points,
      self.config.frontier_epsilon,
      &self.config.solver,
    );

    if curve.is_empty() {
      warn!(
        n_points,
        universe = self.frontier_positions().len(),
        "efficient frontier is empty"
      );
    } else {
      info!(n_points, converged = curve.len(), "efficient frontier computed");
    }

    // Only the first curve is kept.
    let _ = self.frontier.set(curve.clone());
    curve
  }

  /// [`Self::compute_frontier`] with the configured `default_frontier_points`.
  pub fn compute_frontier_default(&self) -> FrontierCurve {
    self.compute_frontier(self.config.default_frontier_points)
  }

  /// First curve produced by [`Self::compute_frontier`], if any.
  pub fn cached_frontier(&self) -> Option<&FrontierCurve> {
    self.frontier.get()
  }

  /// (volatility, expected return) of every asset where both are defined.
  pub fn asset_points(&self) -> Vec<RiskReturnPoint> {
    self
      .assets()
      .iter()
      .zip(self.volatilities.values())
      .zip(self.expected_returns.values())
      .filter_map(|((name, vol), er)| {
        Some(RiskReturnPoint {
          name: name.to_string(),
          volatility: (*vol)?,
          expected_return: (*er)?,
        })
      })
      .collect()
  }

  /// Sample standard deviation and mean of the benchmark's returns.
  pub fn market_point(&self) -> Option<RiskReturnPoint> {
    if self.benchmark_returns.len() < 2 {
      return None;
    }
    let r: Vec<f64> = self.benchmark_returns.iter().map(|(_, r)| *r).collect();
    Some(RiskReturnPoint {
      name: MARKET_LABEL.to_string(),
      volatility: r.iter().std_dev(),
      expected_return: r.iter().mean(),
    })
  }

  /// Additive decomposition of an asset's levels.
  pub fn seasonal_decomposition(
    &self,
    asset: &str,
    period: usize,
  ) -> RiskResult<SeasonalDecomposition> {
    seasonal::decompose(&self.data.observations(asset)?, period)
  }

  /// Trend and seasonal strength of an asset's levels.
  pub fn seasonality_profile(&self, asset: &str, period: usize) -> RiskResult<SeasonalityProfile> {
    Ok(self.seasonal_decomposition(asset, period)?.profile())
  }

  /// Trend and seasonal strength of every asset, grouped into `n_clusters`
  /// by k-means on the two strengths.
  pub fn seasonality_profiles(
    &self,
    period: usize,
    n_clusters: usize,
  ) -> RiskResult<Vec<SeasonalCluster>> {
    let profiles = self
      .assets()
      .iter()
      .map(|name| -> RiskResult<(String, SeasonalityProfile)> {
        Ok((name.to_string(), self.seasonality_profile(name, period)?))
      })
      .collect::<RiskResult<Vec<_>>>()?;
    let features: Vec<Vec<f64>> = profiles
      .iter()
      .map(|(_, p)| vec![p.trend_strength, p.seasonal_strength])
      .collect();
    let fit = kmeans(&features, n_clusters, &self.config.clustering)?;
    debug!(period, n_clusters, inertia = fit.inertia, "seasonal clusters fitted");

    Ok(
      profiles
        .into_iter()
        .zip(fit.labels)
        .map(|((name, p), cluster)| SeasonalCluster {
          name,
          trend_strength: p.trend_strength,
          seasonal_strength: p.seasonal_strength,
          cluster,
        })
        .collect(),
    )
  }

  /// K-means clusters over rows of the distance matrix, placed on the first
  /// two principal components of the correlation matrix. Undefined cells
  /// count as uncorrelated.
  pub fn cluster_returns(&self, n_clusters: usize) -> RiskResult<ReturnClusters> {
    let fit = kmeans(
      &self.distance.dense_rows(1.0),
      n_clusters,
      &self.config.clustering,
    )?;
    let pca = principal_components(&self.correlation.dense_rows(0.0), 2)?;
    debug!(n_clusters, inertia = fit.inertia, "return clusters fitted");

    let assets = self
      .assets()
      .iter()
      .zip(fit.labels)
      .zip(&pca.coordinates)
      .map(|((name, cluster), pc)| ClusteredAsset {
        name: name.to_string(),
        cluster,
        pc1: pc[0],
        pc2: pc[1],
      })
      .collect();

    Ok(ReturnClusters {
      assets,
      explained_variance_ratio: [pca.explained_variance_ratio[0], pca.explained_variance_ratio[1]],
    })
  }

  /// [`Self::cluster_returns`] with the configured `default_clusters`.
  pub fn cluster_returns_default(&self) -> RiskResult<ReturnClusters> {
    self.cluster_returns(self.config.clustering.default_clusters)
  }

  /// Augmented Dickey-Fuller test on an asset's levels.
  pub fn stationarity(&self, asset: &str) -> RiskResult<ADFResult> {
    let levels: Vec<f64> = self
      .data
      .observations(asset)?
      .into_iter()
      .map(|(_, v)| v)
      .collect();
    adf_test(&levels, ADFConfig::default())
  }

  /// Owned copy of every derived table.
  pub fn to_outputs(&self) -> RiskOutputs {
    RiskOutputs {
      returns: self.returns.clone(),
      correlation: self.correlation.clone(),
      distance: self.distance.clone(),
      covariance: self.covariance.clone(),
      alpha_beta: self.alpha_beta.clone(),
      expected_returns: self.expected_returns.clone(),
    }
  }
}
