use serde::Serialize;

use super::common::adf_critical_values;
use super::common::choose_lag;
use super::common::fit_adf;
use super::common::mackinnon_p_value;
use super::common::schwert_max_lags;
use super::common::validate_series;
use super::common::CriticalValues;
use super::common::DeterministicTerm;
use super::common::LagSelection;
use crate::error::RiskError;
use crate::error::RiskResult;

/// Shortest series the test accepts.
pub const MIN_OBSERVATIONS: usize = 20;

/// Configuration for the Augmented Dickey-Fuller unit-root test.
#[derive(Debug, Clone, Copy)]
pub struct ADFConfig {
  /// Deterministic terms included in the test regression.
  pub deterministic: DeterministicTerm,
  /// Lag-order selection strategy.
  pub lag_selection: LagSelection,
  /// Maximum lag considered by automatic lag selection.
  pub max_lags: Option<usize>,
  /// Significance level the p-value is compared against.
  pub alpha: f64,
}

impl Default for ADFConfig {
  fn default() -> Self {
    Self {
      deterministic: DeterministicTerm::Constant,
      lag_selection: LagSelection::Aic,
      max_lags: None,
      alpha: 0.05,
    }
  }
}

/// Result of the Augmented Dickey-Fuller test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ADFResult {
  /// t-statistic of the lagged level coefficient.
  pub statistic: f64,
  /// Selected lag order.
  pub used_lags: usize,
  /// Observations in the final regression.
  pub nobs: usize,
  /// MacKinnon approximate p-value of `statistic`.
  pub p_value: f64,
  /// Critical values at 1%, 5%, 10% levels.
  pub critical_values: CriticalValues,
  /// Whether `p_value` is below `alpha`.
  pub reject_unit_root: bool,
}

/// Augmented Dickey-Fuller unit-root test on a finite series.
pub fn adf_test(y: &[f64], cfg: ADFConfig) -> RiskResult<ADFResult> {
  validate_series(y, MIN_OBSERVATIONS)?;
  if !(cfg.alpha > 0.0 && cfg.alpha < 1.0) {
    return Err(RiskError::InvalidConfig {
      reason: format!("ADF significance level {} is outside (0, 1)", cfg.alpha),
    });
  }

  // Keep enough rows for the widest regression.
  let max_possible_lag = (y.len() / 2).saturating_sub(cfg.deterministic.width() + 1);
  let max_lags = cfg
    .max_lags
    .unwrap_or_else(|| schwert_max_lags(y.len()))
    .min(max_possible_lag);

  let used_lags = match cfg.lag_selection {
    LagSelection::Fixed(p) if p > max_possible_lag => {
      return Err(RiskError::InsufficientData {
        operation: "ADF with fixed lag",
        required: 2 * (p + cfg.deterministic.width() + 1),
        actual: y.len(),
      });
    }
    selection => choose_lag(y, cfg.deterministic, selection, max_lags),
  };

  let fit = fit_adf(y, used_lags, cfg.deterministic)?;
  let p_value = mackinnon_p_value(fit.statistic, cfg.deterministic);

  Ok(ADFResult {
    statistic: fit.statistic,
    used_lags,
    nobs: fit.nobs,
    p_value,
    critical_values: adf_critical_values(cfg.deterministic),
    reject_unit_root: p_value < cfg.alpha,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Deterministic uniform noise in [-0.5, 0.5).
  fn noise(n: usize, mut seed: u64) -> Vec<f64> {
    (0..n)
      .map(|_| {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed >> 11) as f64 / (1u64 << 53) as f64 - 0.5
      })
      .collect()
  }

  fn ar1(phi: f64, n: usize) -> Vec<f64> {
    let eps = noise(n, 0x9E37_79B9_7F4A_7C15);
    let mut x = vec![0.0; n];
    for t in 1..n {
      x[t] = phi * x[t - 1] + eps[t];
    }
    x
  }

  #[test]
  fn rejects_unit_root_for_mean_reverting_series() {
    let x = ar1(0.3, 400);
    let res = adf_test(&x, ADFConfig::default()).unwrap();
    assert!(res.reject_unit_root, "expected unit-root rejection, got {res:?}");
    assert!(res.p_value < 0.01);
    assert!(res.statistic < res.critical_values.one_percent);
    assert!(res.used_lags <= schwert_max_lags(400));
  }

  #[test]
  fn keeps_unit_root_for_compounding_growth() {
    let eps = noise(120, 7);
    let x: Vec<f64> = (0..120)
      .map(|t| 100.0 * 1.02f64.powi(t as i32) + eps[t])
      .collect();
    let res = adf_test(&x, ADFConfig::default()).unwrap();
    assert!(!res.reject_unit_root, "expected no rejection, got {res:?}");
    assert!(res.p_value >= 0.05);
  }

  #[test]
  fn fixed_lag_is_used_verbatim() {
    let x = ar1(0.5, 200);
    let cfg = ADFConfig {
      lag_selection: LagSelection::Fixed(2),
      ..ADFConfig::default()
    };
    let res = adf_test(&x, cfg).unwrap();
    assert_eq!(res.used_lags, 2);
    assert_eq!(res.nobs, 200 - 1 - 2);
  }

  #[test]
  fn short_series_fails_with_insufficient_data() {
    let err = adf_test(&[1.0; 10], ADFConfig::default()).unwrap_err();
    assert!(matches!(err, RiskError::InsufficientData { .. }));
  }

  #[test]
  fn constant_series_is_degenerate_not_malformed() {
    let err = adf_test(&[250_000.0; 40], ADFConfig::default()).unwrap_err();
    assert!(matches!(
      err,
      RiskError::DegenerateSeries {
        operation: "unit-root test",
        ..
      }
    ));
  }

  #[test]
  fn invalid_alpha_is_rejected() {
    let cfg = ADFConfig {
      alpha: 1.5,
      ..ADFConfig::default()
    };
    let err = adf_test(&ar1(0.5, 50), cfg).unwrap_err();
    assert!(matches!(err, RiskError::InvalidConfig { .. }));
  }
}
