//! # Dispersion
//!
//! $$
//! \rho_{ij} = \frac{\sum_t (r_{t,i}-\bar r_i)(r_{t,j}-\bar r_j)}
//!   {\sqrt{\sum_t (r_{t,i}-\bar r_i)^2 \sum_t (r_{t,j}-\bar r_j)^2}},\qquad
//! d_{ij} = 1-\rho_{ij}
//! $$
//!
//! Correlation, distance and sample covariance over pairwise-complete periods.

use ndarray::Array2;
use ndarray::ArrayView1;

use crate::frame::AssetMatrix;
use crate::frame::ReturnsTable;

pub(crate) fn sample_mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().sum::<f64>() / xs.len() as f64
  }
}

fn is_constant(xs: &[f64]) -> bool {
  xs.windows(2).all(|w| w[0] == w[1])
}

/// Periods where both columns are defined.
fn paired(x: ArrayView1<Option<f64>>, y: ArrayView1<Option<f64>>) -> (Vec<f64>, Vec<f64>) {
  x.iter()
    .zip(y.iter())
    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
    .unzip()
}

/// Pearson correlation; `None` below two observations or with a flat side.
pub(crate) fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
  let n = x.len().min(y.len());
  if n < 2 || is_constant(&x[..n]) || is_constant(&y[..n]) {
    return None;
  }

  let mx = sample_mean(&x[..n]);
  let my = sample_mean(&y[..n]);

  let mut cov = 0.0;
  let mut sx = 0.0;
  let mut sy = 0.0;

  for i in 0..n {
    let dx = x[i] - mx;
    let dy = y[i] - my;
    cov += dx * dy;
    sx += dx * dx;
    sy += dy * dy;
  }

  let denom = (sx * sy).sqrt();
  (denom > 0.0).then(|| (cov / denom).clamp(-1.0, 1.0))
}

/// Sample covariance (n - 1 denominator); `None` below two observations.
pub(crate) fn sample_covariance(x: &[f64], y: &[f64]) -> Option<f64> {
  let n = x.len().min(y.len());
  if n < 2 {
    return None;
  }
  if is_constant(&x[..n]) || is_constant(&y[..n]) {
    return Some(0.0);
  }

  let mx = sample_mean(&x[..n]);
  let my = sample_mean(&y[..n]);
  let acc: f64 = (0..n).map(|i| (x[i] - mx) * (y[i] - my)).sum();
  Some(acc / (n - 1) as f64)
}

fn pairwise_matrix(
  returns: &ReturnsTable,
  cell: impl Fn(&[f64], &[f64]) -> Option<f64>,
) -> AssetMatrix {
  let n = returns.assets().len();
  let mut values = Array2::from_elem((n, n), None);

  for i in 0..n {
    for j in i..n {
      let (x, y) = paired(returns.column_at(i), returns.column_at(j));
      let c = cell(&x, &y);
      values[[i, j]] = c;
      values[[j, i]] = c;
    }
  }

  AssetMatrix::new(returns.assets().clone(), values)
}

/// Pearson correlation matrix; the diagonal is exactly 1.0 wherever defined.
pub fn correlation_matrix(returns: &ReturnsTable) -> AssetMatrix {
  let corr = pairwise_matrix(returns, pearson);
  let mut values = corr.values().clone();
  for i in 0..corr.len() {
    if values[[i, i]].is_some() {
      values[[i, i]] = Some(1.0);
    }
  }
  AssetMatrix::new(corr.assets().clone(), values)
}

/// `1 - correlation`, cell by cell.
pub fn distance_matrix(correlation: &AssetMatrix) -> AssetMatrix {
  correlation.map_defined(|c| 1.0 - c)
}

/// Sample covariance matrix of returns.
pub fn covariance_matrix(returns: &ReturnsTable) -> AssetMatrix {
  pairwise_matrix(returns, sample_covariance)
}
