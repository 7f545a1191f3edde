//! # Engine Configuration
//!
//! $$
//! \mathbb E[r_i] = r_f + \beta_i(\bar r_m - r_f) + \alpha_i
//! $$
//!
//! Runtime knobs for [`crate::risk::RiskEngine`]. Every field has a default, so a
//! TOML document only needs to name what it overrides.

use serde::Deserialize;
use serde::Serialize;

use crate::error::RiskError;
use crate::error::RiskResult;

/// Settings for the constrained minimum-variance solver used by the frontier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
  /// Augmented-Lagrangian multiplier updates per target.
  pub max_outer_iters: u64,
  /// L-BFGS iterations per inner solve.
  pub max_inner_iters: u64,
  /// Allowed violation of the target-return constraint, relative to the
  /// expected-return range of the universe.
  pub tolerance: f64,
  /// Starting quadratic penalty on the return constraint.
  pub initial_penalty: f64,
  /// Number of correction pairs kept by L-BFGS.
  pub lbfgs_memory: usize,
}

impl Default for SolverConfig {
  fn default() -> Self {
    Self {
      max_outer_iters: 50,
      max_inner_iters: 1000,
      tolerance: 1e-6,
      initial_penalty: 10.0,
      lbfgs_memory: 7,
    }
  }
}

/// Settings for the seeded k-means used to group assets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
  /// Clusters formed by [`crate::risk::RiskEngine::cluster_returns_default`].
  pub default_clusters: usize,
  /// Independent k-means++ starts; the lowest-inertia fit wins.
  pub n_init: usize,
  /// Lloyd iterations per start.
  pub max_iters: usize,
  /// Centroid movement, relative to the mean feature variance, that ends a start.
  pub tolerance: f64,
  /// Seed of the initialisation generator.
  pub seed: u64,
}

impl Default for ClusterConfig {
  fn default() -> Self {
    Self {
      default_clusters: 5,
      n_init: 10,
      max_iters: 300,
      tolerance: 1e-4,
      seed: 0,
    }
  }
}

/// Runtime configuration for [`crate::risk::RiskEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Risk-free rate per period, in the same units as the returns.
  pub risk_free_rate: f64,
  /// Gap kept below the largest expected return when laying out frontier targets.
  pub frontier_epsilon: f64,
  /// Dominators reported by [`crate::risk::RiskEngine::rank_dominators_default`].
  pub default_top_n: usize,
  /// Targets swept by [`crate::risk::RiskEngine::compute_frontier_default`].
  pub default_frontier_points: usize,
  /// Frontier solver settings.
  pub solver: SolverConfig,
  /// Asset clustering settings.
  pub clustering: ClusterConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      risk_free_rate: 0.0,
      frontier_epsilon: 1e-6,
      default_top_n: 3,
      default_frontier_points: 100,
      solver: SolverConfig::default(),
      clustering: ClusterConfig::default(),
    }
  }
}

impl EngineConfig {
  /// Default configuration with an explicit risk-free rate.
  pub fn with_risk_free_rate(risk_free_rate: f64) -> Self {
    Self {
      risk_free_rate,
      ..Self::default()
    }
  }

  /// Parse and validate a TOML document.
  pub fn from_toml_str(source: &str) -> RiskResult<Self> {
    let config: Self = toml::from_str(source).map_err(|err| RiskError::InvalidConfig {
      reason: err.to_string(),
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Reject values the engine cannot work with.
  pub fn validate(&self) -> RiskResult<()> {
    let fail = |reason: &str| {
      Err(RiskError::InvalidConfig {
        reason: reason.to_string(),
      })
    };

    if !self.risk_free_rate.is_finite() {
      return fail("risk_free_rate must be finite");
    }
    if !(self.frontier_epsilon.is_finite() && self.frontier_epsilon >= 0.0) {
      return fail("frontier_epsilon must be finite and non-negative");
    }
    if !(self.solver.tolerance.is_finite() && self.solver.tolerance > 0.0) {
      return fail("solver.tolerance must be positive");
    }
    if !(self.solver.initial_penalty.is_finite() && self.solver.initial_penalty > 0.0) {
      return fail("solver.initial_penalty must be positive");
    }
    if self.solver.max_outer_iters == 0 || self.solver.max_inner_iters == 0 {
      return fail("solver iteration caps must be at least 1");
    }
    if self.solver.lbfgs_memory == 0 {
      return fail("solver.lbfgs_memory must be at least 1");
    }
    let clustering = &self.clustering;
    if clustering.default_clusters == 0 || clustering.n_init == 0 || clustering.max_iters == 0 {
      return fail("clustering counts must be at least 1");
    }
    if !(clustering.tolerance.is_finite() && clustering.tolerance >= 0.0) {
      return fail("clustering.tolerance must be finite and non-negative");
    }
    Ok(())
  }
}
