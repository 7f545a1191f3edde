//! # Efficient Frontier
//!
//! $$
//! \min_{\mathbf w}\ \sqrt{\mathbf w^\top \Sigma \mathbf w}
//! \quad\text{s.t.}\quad \mathbf 1^\top \mathbf w = 1,\ \mu^\top \mathbf w = r^\*,\ 0 \le w_i \le 1
//! $$
//!
//! Long-only minimum-variance sweep over evenly spaced target returns.
//!
//! Weights are parametrised as `w = softmax(x)`, so the budget and bound
//! constraints hold for every `x`. The target-return equality is enforced with
//! an augmented Lagrangian whose inner problems are solved by L-BFGS, starting
//! from `x = 0` (equal weights). A target whose return constraint is still
//! violated after the outer iterations is dropped.

use std::sync::Arc;

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::Gradient;
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use tracing::debug;

use super::types::FrontierCurve;
use super::types::FrontierPoint;
use crate::config::SolverConfig;

const MAX_PENALTY: f64 = 1e12;

fn dot(a: &[f64], b: &[f64]) -> f64 {
  a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn mat_vec_mul(mat: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
  mat
    .iter()
    .map(|row| row.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
    .collect()
}

fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 {
    vec![1.0 / x.len() as f64; x.len()]
  } else {
    exps.iter().map(|&e| e / sum).collect()
  }
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
  match n {
    0 => Vec::new(),
    1 => vec![start],
    _ => {
      let step = (stop - start) / (n - 1) as f64;
      (0..n)
        .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
        .collect()
    }
  }
}

/// Mean-variance inputs for the assets that take part in the optimisation.
#[derive(Clone, Debug)]
pub struct MeanVarianceProblem {
  mu: Vec<f64>,
  cov: Vec<Vec<f64>>,
}

impl MeanVarianceProblem {
  pub fn new(mu: Vec<f64>, cov: Vec<Vec<f64>>) -> Self {
    debug_assert_eq!(mu.len(), cov.len());
    Self { mu, cov }
  }

  pub fn n_assets(&self) -> usize {
    self.mu.len()
  }

  pub fn portfolio_return(&self, w: &[f64]) -> f64 {
    dot(w, &self.mu)
  }

  pub fn portfolio_variance(&self, w: &[f64]) -> f64 {
    dot(w, &mat_vec_mul(&self.cov, w))
  }

  pub fn portfolio_volatility(&self, w: &[f64]) -> f64 {
    self.portfolio_variance(w).max(0.0).sqrt()
  }

  fn return_range(&self) -> (f64, f64) {
    self
      .mu
      .iter()
      .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &m| (lo.min(m), hi.max(m)))
  }

  /// Minimum-variance weights for `target`, or `None` if the solver does not
  /// meet the return constraint.
  pub fn solve_target(&self, target: f64, solver: &SolverConfig) -> Option<Vec<f64>> {
    let n = self.n_assets();
    if n == 0 {
      return None;
    }

    let (lo, hi) = self.return_range();
    let range = if hi > lo { hi - lo } else { 1.0 };
    let var_scale = (0..n)
      .map(|i| self.cov[i][i])
      .fold(0.0, f64::max);
    let var_scale = if var_scale > 0.0 { var_scale } else { 1.0 };

    let mut cost = AugmentedLagrangian {
      cov: Arc::new(
        self
          .cov
          .iter()
          .map(|row| row.iter().map(|c| c / var_scale).collect())
          .collect(),
      ),
      excess: Arc::new(self.mu.iter().map(|m| (m - target) / range).collect()),
      multiplier: 0.0,
      penalty: solver.initial_penalty,
    };

    let mut x = vec![0.0; n];
    let mut last_violation = f64::INFINITY;

    for outer in 0..solver.max_outer_iters {
      match minimize_inner(cost.clone(), x.clone(), solver) {
        Ok(next) => x = next,
        Err(err) => {
          debug!(target, outer, error = %err, "inner solve failed");
          break;
        }
      }

      let violation = cost.constraint(&softmax(&x));
      if violation.abs() <= solver.tolerance {
        return Some(softmax(&x));
      }

      cost.multiplier += cost.penalty * violation;
      if violation.abs() > 0.25 * last_violation {
        cost.penalty = (cost.penalty * 10.0).min(MAX_PENALTY);
      }
      last_violation = violation.abs();
    }

    let w = softmax(&x);
    (cost.constraint(&w).abs() <= solver.tolerance).then_some(w)
  }

  /// Solve `n_points` targets between the smallest expected return and the
  /// largest one minus `epsilon`, keeping the converged ones.
  pub fn frontier(&self, n_points: usize, epsilon: f64, solver: &SolverConfig) -> FrontierCurve {
    if self.n_assets() == 0 {
      return Vec::new();
    }

    let (lo, hi) = self.return_range();
    linspace(lo, hi - epsilon, n_points)
      .into_iter()
      .filter_map(|target| match self.solve_target(target, solver) {
        Some(weights) => Some(FrontierPoint {
          volatility: self.portfolio_volatility(&weights),
          expected_return: target,
          weights,
        }),
        None => {
          debug!(target, "frontier target did not converge");
          None
        }
      })
      .collect()
  }
}

/// `w'Σw + λ c + ρ/2 c²` with `c = Σ w_i (μ_i - r*) / range`, over `w = softmax(x)`.
#[derive(Clone)]
struct AugmentedLagrangian {
  cov: Arc<Vec<Vec<f64>>>,
  excess: Arc<Vec<f64>>,
  multiplier: f64,
  penalty: f64,
}

impl AugmentedLagrangian {
  fn constraint(&self, w: &[f64]) -> f64 {
    dot(w, &self.excess)
  }
}

impl CostFunction for AugmentedLagrangian {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    let w = softmax(x);
    let port_var = dot(&w, &mat_vec_mul(&self.cov, &w));
    let c = self.constraint(&w);
    Ok(port_var + self.multiplier * c + 0.5 * self.penalty * c * c)
  }
}

impl Gradient for AugmentedLagrangian {
  type Param = Vec<f64>;
  type Gradient = Vec<f64>;

  fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
    let w = softmax(x);
    let c = self.constraint(&w);
    let slope = self.multiplier + self.penalty * c;
    let sigma_w = mat_vec_mul(&self.cov, &w);

    // d/dw, then through the softmax Jacobian: w_i (g_i - w'g).
    let g_w: Vec<f64> = sigma_w
      .iter()
      .zip(self.excess.iter())
      .map(|(s, e)| 2.0 * s + slope * e)
      .collect();
    let mean_g = dot(&w, &g_w);
    Ok(w.iter().zip(g_w.iter()).map(|(wi, gi)| wi * (gi - mean_g)).collect())
  }
}

fn minimize_inner(
  cost: AugmentedLagrangian,
  x0: Vec<f64>,
  solver: &SolverConfig,
) -> Result<Vec<f64>, argmin::core::Error> {
  // A stationary start has no descent direction for the line search.
  let g0 = cost.gradient(&x0)?;
  if dot(&g0, &g0).sqrt() <= f64::EPSILON {
    return Ok(x0);
  }

  let linesearch = MoreThuenteLineSearch::new();
  let lbfgs = LBFGS::new(linesearch, solver.lbfgs_memory);
  let fallback = x0.clone();

  let res = Executor::new(cost, lbfgs)
    .configure(|state| state.param(x0).max_iters(solver.max_inner_iters))
    .run()?;

  Ok(res.state.best_param.unwrap_or(fallback))
}
