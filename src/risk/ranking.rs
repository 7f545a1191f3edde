//! # Ranking
//!
//! $$
//! D(x) = \{\, j : \sigma_j \le \sigma_x,\ \mathbb E[r_j] > \mathbb E[r_x] \,\},\qquad
//! s(v) = 100\,\frac{v - v_{\min}}{v_{\max} - v_{\min}}
//! $$
//!
//! Dominating assets of a reference asset and the shared 0-100 scaling used to
//! report them.

use std::cmp::Ordering;

use super::types::RankedAsset;
use crate::error::RiskError;
use crate::error::RiskResult;
use crate::frame::AssetVector;

/// Min-max transform onto `[0, 100]` fitted over the defined values.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MinMaxScale {
  min: f64,
  max: f64,
}

impl MinMaxScale {
  pub(crate) fn fit<'a>(values: impl IntoIterator<Item = &'a Option<f64>>) -> Option<Self> {
    values
      .into_iter()
      .flatten()
      .fold(None, |acc: Option<Self>, &v| match acc {
        None => Some(Self { min: v, max: v }),
        Some(s) => Some(Self {
          min: s.min.min(v),
          max: s.max.max(v),
        }),
      })
  }

  /// Scaled value; a degenerate range maps everything to 0.
  pub(crate) fn scale(&self, v: f64) -> f64 {
    let denom = self.max - self.min;
    if denom == 0.0 {
      0.0
    } else {
      (v - self.min) / denom * 100.0
    }
  }
}

/// Round to two decimals, ties to even.
pub(crate) fn round2(v: f64) -> f64 {
  (v * 100.0).round_ties_even() / 100.0
}

fn score(scale: Option<MinMaxScale>, v: Option<f64>) -> Option<f64> {
  Some(round2(scale?.scale(v?)))
}

/// Reference asset followed by up to `top_n` assets that are no riskier and
/// have a strictly higher expected return, best first. Both vectors must be
/// keyed by the same assets.
pub fn rank_dominators(
  volatilities: &AssetVector<Option<f64>>,
  expected_returns: &AssetVector<Option<f64>>,
  reference: &str,
  top_n: usize,
) -> RiskResult<Vec<RankedAsset>> {
  let assets = volatilities.assets();
  if assets != expected_returns.assets() {
    return Err(RiskError::invalid_table(
      "volatilities and expected returns are keyed by different assets",
    ));
  }
  let pos = assets.require(reference)?;
  let (volatilities, expected_returns) = (volatilities.values(), expected_returns.values());
  let target_risk = volatilities[pos];
  let target_return = expected_returns[pos];

  let risk_scale = MinMaxScale::fit(volatilities);
  let return_scale = MinMaxScale::fit(expected_returns);

  let mut dominators: Vec<(usize, f64, f64)> = match (target_risk, target_return) {
    (Some(max_risk), Some(min_return)) => (0..assets.len())
      .filter_map(|j| {
        let (risk, ret) = (volatilities[j]?, expected_returns[j]?);
        (risk <= max_risk && ret > min_return).then_some((j, risk, ret))
      })
      .collect(),
    _ => Vec::new(),
  };
  // Stable sort keeps column order among equal expected returns.
  dominators.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
  dominators.truncate(top_n);

  let mut out = Vec::with_capacity(dominators.len() + 1);
  out.push(RankedAsset {
    name: reference.to_string(),
    risk_score: score(risk_scale, target_risk),
    return_score: score(return_scale, target_return),
  });
  out.extend(dominators.into_iter().map(|(j, risk, ret)| RankedAsset {
    name: assets.names()[j].clone(),
    risk_score: score(risk_scale, Some(risk)),
    return_score: score(return_scale, Some(ret)),
  }));

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::AssetIndex;

  type Keyed = AssetVector<Option<f64>>;

  fn keyed(assets: &AssetIndex, values: Vec<Option<f64>>) -> Keyed {
    AssetVector::new(assets.clone(), values)
  }

  fn universe() -> (Keyed, Keyed) {
    let assets = AssetIndex::new(["Ref", "Safer", "Best", "Riskier", "Worse", "Unknown"]).unwrap();
    let vols = vec![Some(0.02), Some(0.01), Some(0.02), Some(0.05), Some(0.005), None];
    let rets = vec![Some(0.003), Some(0.004), Some(0.006), Some(0.01), Some(0.001), Some(0.02)];
    (keyed(&assets, vols), keyed(&assets, rets))
  }

  #[test]
  fn reference_first_then_dominators_by_return() {
    let (vols, rets) = universe();
    let ranked = rank_dominators(&vols, &rets, "Ref", 3).unwrap();
    let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();

    assert_eq!(names, vec!["Ref", "Best", "Safer"]);
  }

  #[test]
  fn dominators_respect_risk_and_return_bounds() {
    let (vols, rets) = universe();
    let ranked = rank_dominators(&vols, &rets, "Ref", 10).unwrap();
    let reference = &ranked[0];

    for r in &ranked[1..] {
      assert!(r.risk_score.unwrap() <= reference.risk_score.unwrap());
      assert!(r.return_score.unwrap() > reference.return_score.unwrap());
    }
  }

  #[test]
  fn scores_use_global_min_max() {
    let (vols, rets) = universe();
    let ranked = rank_dominators(&vols, &rets, "Riskier", 3).unwrap();

    assert_eq!(ranked[0].risk_score, Some(100.0));
    // Returns span 0.001..0.02 including the asset without a volatility.
    assert_eq!(ranked[0].return_score, Some(round2((0.01 - 0.001) / 0.019 * 100.0)));
  }

  #[test]
  fn top_n_truncates_and_zero_keeps_reference_only() {
    let (vols, rets) = universe();
    assert_eq!(rank_dominators(&vols, &rets, "Ref", 1).unwrap().len(), 2);
    assert_eq!(rank_dominators(&vols, &rets, "Ref", 0).unwrap().len(), 1);
  }

  #[test]
  fn no_dominators_yields_single_entry() {
    let (vols, rets) = universe();
    let ranked = rank_dominators(&vols, &rets, "Worse", 3).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].risk_score, Some(0.0));
  }

  #[test]
  fn identical_volatilities_scale_to_zero() {
    let assets = AssetIndex::new(["A", "B", "C"]).unwrap();
    let vols = keyed(&assets, vec![Some(0.03); 3]);
    let rets = keyed(&assets, vec![Some(0.001), Some(0.002), Some(0.003)]);
    let ranked = rank_dominators(&vols, &rets, "A", 5).unwrap();

    assert_eq!(ranked.len(), 3);
    assert!(ranked.iter().all(|r| r.risk_score == Some(0.0)));
    assert_eq!(ranked[0].return_score, Some(0.0));
    assert_eq!(ranked[1].return_score, Some(100.0));
  }

  #[test]
  fn reference_without_volatility_has_no_dominators() {
    let (vols, rets) = universe();
    let ranked = rank_dominators(&vols, &rets, "Unknown", 3).unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].risk_score, None);
    assert_eq!(ranked[0].return_score, Some(100.0));
  }

  #[test]
  fn unknown_reference_is_asset_not_found() {
    let (vols, rets) = universe();
    let err = rank_dominators(&vols, &rets, "Nowhere", 3).unwrap_err();
    assert!(matches!(err, RiskError::AssetNotFound { .. }));
  }

  #[test]
  fn vectors_keyed_by_different_assets_are_rejected() {
    let (vols, _) = universe();
    let short = keyed(&AssetIndex::new(["Ref"]).unwrap(), vec![Some(0.003)]);

    let err = rank_dominators(&vols, &short, "Ref", 3).unwrap_err();
    assert!(matches!(err, RiskError::InvalidTable { .. }));
  }
}
