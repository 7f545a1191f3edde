use nalgebra::DMatrix;
use nalgebra::DVector;
use serde::Serialize;
use statrs::function::erf::erfc;

use crate::error::RiskError;
use crate::error::RiskResult;

/// Deterministic terms included in the Dickey-Fuller regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeterministicTerm {
  None,
  Constant,
  ConstantTrend,
}

impl DeterministicTerm {
  pub(crate) fn width(self) -> usize {
    match self {
      DeterministicTerm::None => 0,
      DeterministicTerm::Constant => 1,
      DeterministicTerm::ConstantTrend => 2,
    }
  }
}

/// Lag-order selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LagSelection {
  Fixed(usize),
  Aic,
  Bic,
}

/// Asymptotic critical values at the 1%, 5% and 10% levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalValues {
  pub one_percent: f64,
  pub five_percent: f64,
  pub ten_percent: f64,
}

impl CriticalValues {
  pub fn value_at(self, alpha: f64) -> f64 {
    if alpha <= 0.01 {
      self.one_percent
    } else if alpha <= 0.05 {
      self.five_percent
    } else {
      self.ten_percent
    }
  }
}

#[derive(Debug, Clone)]
pub(crate) struct OlsFit {
  pub beta: Vec<f64>,
  pub std_err: Vec<f64>,
  pub sse: f64,
  pub nobs: usize,
  pub k: usize,
}

pub(crate) fn validate_series(y: &[f64], min_n: usize) -> RiskResult<()> {
  if y.len() < min_n {
    return Err(RiskError::InsufficientData {
      operation: "unit-root test",
      required: min_n,
      actual: y.len(),
    });
  }
  if !y.iter().all(|v| v.is_finite()) {
    return Err(RiskError::invalid_table("unit-root test needs finite values"));
  }
  Ok(())
}

pub(crate) fn difference(y: &[f64]) -> Vec<f64> {
  y.windows(2).map(|w| w[1] - w[0]).collect()
}

/// `floor(12 (n / 100)^{1/4})`.
pub(crate) fn schwert_max_lags(n: usize) -> usize {
  if n <= 1 {
    return 0;
  }
  (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

pub(crate) fn adf_critical_values(det: DeterministicTerm) -> CriticalValues {
  match det {
    DeterministicTerm::None => CriticalValues {
      one_percent: -2.58,
      five_percent: -1.95,
      ten_percent: -1.62,
    },
    DeterministicTerm::Constant => CriticalValues {
      one_percent: -3.43,
      five_percent: -2.86,
      ten_percent: -2.57,
    },
    DeterministicTerm::ConstantTrend => CriticalValues {
      one_percent: -3.96,
      five_percent: -3.41,
      ten_percent: -3.13,
    },
  }
}

fn standard_normal_cdf(x: f64) -> f64 {
  0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Polynomial with ascending coefficients.
fn horner(coeffs: &[f64], x: f64) -> f64 {
  coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// MacKinnon (1994) approximate p-value of a single-series ADF statistic.
pub(crate) fn mackinnon_p_value(statistic: f64, det: DeterministicTerm) -> f64 {
  // (tau_min, tau_star, tau_max, small-p polynomial, large-p polynomial)
  let (tau_min, tau_star, tau_max, small, large): (f64, f64, f64, [f64; 3], [f64; 4]) = match det
  {
    DeterministicTerm::None => (
      -19.04,
      -1.04,
      1.51,
      [0.6344, 1.2378, 0.032496],
      [0.4797, 0.93557, -0.06999, 0.033066],
    ),
    DeterministicTerm::Constant => (
      -18.83,
      -1.61,
      2.74,
      [2.1659, 1.4412, 0.038269],
      [1.7339, 0.93202, -0.12745, -0.010368],
    ),
    DeterministicTerm::ConstantTrend => (
      -16.18,
      -2.89,
      0.70,
      [3.2512, 1.6047, 0.049588],
      [2.5261, 0.61654, -0.37956, -0.060285],
    ),
  };

  if statistic.is_nan() {
    return f64::NAN;
  }
  if statistic > tau_max {
    return 1.0;
  }
  if statistic < tau_min {
    return 0.0;
  }
  let z = if statistic <= tau_star {
    horner(&small, statistic)
  } else {
    horner(&large, statistic)
  };
  standard_normal_cdf(z)
}

/// Least squares with classical standard errors; `None` for a singular design.
pub(crate) fn ols(y: &[f64], x: &[Vec<f64>]) -> Option<OlsFit> {
  let n = y.len();
  let k = x.first().map_or(0, Vec::len);
  if n <= k || k == 0 || x.len() != n {
    return None;
  }

  let x_mat = DMatrix::from_fn(n, k, |i, j| x[i][j]);
  let y_vec = DVector::from_column_slice(y);

  let xtx_inv = (x_mat.transpose() * &x_mat).try_inverse()?;
  let beta = &xtx_inv * x_mat.transpose() * &y_vec;
  let residuals = y_vec - &x_mat * &beta;

  let sse = residuals.norm_squared();
  let sigma2 = (sse / (n - k) as f64).max(0.0);
  let std_err = (0..k)
    .map(|i| (xtx_inv[(i, i)] * sigma2).max(0.0).sqrt())
    .collect();

  Some(OlsFit {
    beta: beta.iter().copied().collect(),
    std_err,
    sse,
    nobs: n,
    k,
  })
}

/// Regression of `Δy_t` on deterministics, `y_{t-1}` and `lags` lagged
/// differences, using differences from index `start` on. Returns the
/// response, the design rows and the column of `y_{t-1}`.
fn adf_design(
  y: &[f64],
  lags: usize,
  start: usize,
  det: DeterministicTerm,
) -> (Vec<f64>, Vec<Vec<f64>>, usize) {
  let dy = difference(y);
  let first = start.max(lags);

  let (lhs, rhs) = (first..dy.len())
    .map(|t| {
      let mut row = Vec::with_capacity(det.width() + 1 + lags);
      match det {
        DeterministicTerm::None => {}
        DeterministicTerm::Constant => row.push(1.0),
        DeterministicTerm::ConstantTrend => {
          row.push(1.0);
          row.push((t + 1) as f64);
        }
      }
      // dy[t] = y[t + 1] - y[t], so the lagged level is y[t].
      row.push(y[t]);
      row.extend((1..=lags).map(|i| dy[t - i]));
      (dy[t], row)
    })
    .unzip();

  (lhs, rhs, det.width())
}

pub(crate) struct AdfFit {
  pub statistic: f64,
  pub nobs: usize,
}

pub(crate) fn fit_adf(y: &[f64], lags: usize, det: DeterministicTerm) -> RiskResult<AdfFit> {
  let degenerate = |reason: &str| RiskError::DegenerateSeries {
    operation: "unit-root test",
    reason: reason.to_string(),
  };
  if y.windows(2).all(|w| w[0] == w[1]) {
    return Err(degenerate("the series is constant"));
  }
  let (lhs, rhs, gamma_index) = adf_design(y, lags, 0, det);
  let fit = ols(&lhs, &rhs).ok_or_else(|| degenerate("regression is singular"))?;

  let se = fit.std_err[gamma_index];
  if !(se > 0.0) {
    return Err(degenerate("regression fits the differences exactly"));
  }

  Ok(AdfFit {
    statistic: fit.beta[gamma_index] / se,
    nobs: fit.nobs,
  })
}

fn information_criterion(fit: &OlsFit, selection: LagSelection) -> f64 {
  let n = fit.nobs as f64;
  let penalty = match selection {
    LagSelection::Bic => n.ln(),
    _ => 2.0,
  };
  n * (fit.sse / n).ln() + penalty * fit.k as f64
}

/// Lag minimising the information criterion, every candidate fitted on the
/// sample left after dropping `max_lags` differences.
pub(crate) fn choose_lag(
  y: &[f64],
  det: DeterministicTerm,
  selection: LagSelection,
  max_lags: usize,
) -> usize {
  if let LagSelection::Fixed(p) = selection {
    return p;
  }

  (0..=max_lags)
    .filter_map(|lag| {
      let (lhs, rhs, _) = adf_design(y, lag, max_lags, det);
      let fit = ols(&lhs, &rhs)?;
      let ic = information_criterion(&fit, selection);
      ic.is_finite().then_some((lag, ic))
    })
    .fold((0, f64::INFINITY), |best, (lag, ic)| if ic < best.1 { (lag, ic) } else { best })
    .0
}
