//! # Clustering
//!
//! $$
//! \min_{c_1,\dots,c_k} \sum_i \min_j \lVert x_i - c_j \rVert^2,\qquad
//! \tfrac{1}{n-1} X_c^\top X_c = V \Lambda V^\top
//! $$
//!
//! Seeded k-means (k-means++ starts, Lloyd iterations, best of several
//! restarts) and a principal-component projection. The engine uses them to
//! group assets by co-movement and by seasonal profile.

use std::cmp::Ordering;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::ClusterConfig;
use crate::error::RiskError;
use crate::error::RiskResult;

/// Hard assignment of every point to one of `k` centroids.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KMeansFit {
  /// Cluster of each input point. Clusters are numbered in order of first
  /// appearance, so the first point is always in cluster 0.
  pub labels: Vec<usize>,
  pub centroids: Vec<Vec<f64>>,
  /// Sum of squared distances from each point to its centroid.
  pub inertia: f64,
}

/// Input rows projected onto their leading principal components.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PcaProjection {
  /// One row per input row, one column per kept component.
  pub coordinates: Vec<Vec<f64>>,
  /// Share of the total variance carried by each kept component, descending.
  pub explained_variance_ratio: Vec<f64>,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
  a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
  centroids
    .iter()
    .map(|c| squared_distance(point, c))
    .enumerate()
    .fold((0, f64::INFINITY), |best, (j, d)| if d < best.1 { (j, d) } else { best })
}

fn check_points(points: &[Vec<f64>], operation: &str) -> RiskResult<usize> {
  let dim = points.first().map_or(0, Vec::len);
  if points
    .iter()
    .any(|p| p.len() != dim || p.iter().any(|v| !v.is_finite()))
  {
    return Err(RiskError::invalid_table(format!(
      "{operation} needs finite points of equal dimension"
    )));
  }
  Ok(dim)
}

fn mean_feature_variance(points: &[Vec<f64>], dim: usize) -> f64 {
  let n = points.len() as f64;
  let total: f64 = (0..dim)
    .map(|j| {
      let mean = points.iter().map(|p| p[j]).sum::<f64>() / n;
      points.iter().map(|p| (p[j] - mean).powi(2)).sum::<f64>() / n
    })
    .sum();
  if dim == 0 {
    0.0
  } else {
    total / dim as f64
  }
}

/// k-means++: each new centroid is drawn with probability proportional to
/// its squared distance from the centroids chosen so far.
fn kmeans_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
  let mut centroids = Vec::with_capacity(k);
  centroids.push(points[rng.gen_range(0..points.len())].clone());
  let mut d2: Vec<f64> = points
    .iter()
    .map(|p| squared_distance(p, &centroids[0]))
    .collect();

  while centroids.len() < k {
    let total: f64 = d2.iter().sum();
    let next = if total > 0.0 {
      let mut u = rng.gen::<f64>() * total;
      d2.iter()
        .position(|&d| {
          u -= d;
          u < 0.0
        })
        .unwrap_or_else(|| d2.iter().rposition(|&d| d > 0.0).unwrap_or(0))
    } else {
      // Every point already sits on a centroid.
      rng.gen_range(0..points.len())
    };

    let centroid = points[next].clone();
    for (d, p) in d2.iter_mut().zip(points) {
      *d = d.min(squared_distance(p, &centroid));
    }
    centroids.push(centroid);
  }

  centroids
}

fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> (Vec<usize>, Vec<f64>) {
  points.iter().map(|p| nearest(p, centroids)).unzip()
}

fn lloyd(
  points: &[Vec<f64>],
  mut centroids: Vec<Vec<f64>>,
  cfg: &ClusterConfig,
  tol: f64,
) -> KMeansFit {
  let k = centroids.len();
  let dim = points[0].len();

  for _ in 0..cfg.max_iters {
    let (labels, mut d2) = assign(points, &centroids);

    let mut sums = vec![vec![0.0; dim]; k];
    let mut counts = vec![0usize; k];
    for (p, &l) in points.iter().zip(&labels) {
      counts[l] += 1;
      for (s, v) in sums[l].iter_mut().zip(p) {
        *s += v;
      }
    }

    let mut updated = Vec::with_capacity(k);
    for (sum, count) in sums.into_iter().zip(counts) {
      if count > 0 {
        updated.push(sum.into_iter().map(|s| s / count as f64).collect());
        continue;
      }
      // Empty cluster: move it onto the point worst served by its centroid.
      let far = d2
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &d)| if d > best.1 { (i, d) } else { best })
        .0;
      d2[far] = f64::NEG_INFINITY;
      updated.push(points[far].clone());
    }

    let shift: f64 = centroids
      .iter()
      .zip(&updated)
      .map(|(a, b)| squared_distance(a, b))
      .sum();
    centroids = updated;
    if shift <= tol {
      break;
    }
  }

  let (labels, d2) = assign(points, &centroids);
  KMeansFit {
    labels,
    centroids,
    inertia: d2.iter().sum(),
  }
}

/// Renumber clusters by first appearance among the labels.
fn relabel(fit: KMeansFit) -> KMeansFit {
  let k = fit.centroids.len();
  let mut map = vec![usize::MAX; k];
  let mut next = 0;
  for j in fit.labels.iter().copied().chain(0..k) {
    if map[j] == usize::MAX {
      map[j] = next;
      next += 1;
    }
  }

  let mut centroids = vec![Vec::new(); k];
  for (j, c) in fit.centroids.into_iter().enumerate() {
    centroids[map[j]] = c;
  }

  KMeansFit {
    labels: fit.labels.into_iter().map(|l| map[l]).collect(),
    centroids,
    inertia: fit.inertia,
  }
}

/// Partition `points` into `k` clusters. Restarts draw from one generator
/// seeded with `cfg.seed`, so equal inputs always give equal labels.
pub fn kmeans(points: &[Vec<f64>], k: usize, cfg: &ClusterConfig) -> RiskResult<KMeansFit> {
  if k == 0 {
    return Err(RiskError::InvalidConfig {
      reason: "k-means needs at least one cluster".to_string(),
    });
  }
  if points.len() < k {
    return Err(RiskError::InsufficientData {
      operation: "k-means clustering",
      required: k,
      actual: points.len(),
    });
  }
  let dim = check_points(points, "k-means")?;

  let tol = cfg.tolerance * mean_feature_variance(points, dim);
  let mut rng = StdRng::seed_from_u64(cfg.seed);

  let mut best = lloyd(points, kmeans_plus_plus(points, k, &mut rng), cfg, tol);
  for _ in 1..cfg.n_init {
    let fit = lloyd(points, kmeans_plus_plus(points, k, &mut rng), cfg, tol);
    if fit.inertia < best.inertia {
      best = fit;
    }
  }

  Ok(relabel(best))
}

/// Project `rows` onto the `n_components` eigenvectors of their sample
/// covariance with the largest eigenvalues. Each component is signed so that
/// its largest-magnitude coordinate is positive.
pub fn principal_components(rows: &[Vec<f64>], n_components: usize) -> RiskResult<PcaProjection> {
  let n = rows.len();
  if n < 2 {
    return Err(RiskError::InsufficientData {
      operation: "principal component analysis",
      required: 2,
      actual: n,
    });
  }
  let dim = check_points(rows, "principal component analysis")?;
  if n_components == 0 || n_components > dim.min(n) {
    return Err(RiskError::InvalidConfig {
      reason: format!(
        "{n_components} components requested from {n} rows of dimension {dim}"
      ),
    });
  }

  let means: Vec<f64> = (0..dim)
    .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n as f64)
    .collect();
  let centred = DMatrix::from_fn(n, dim, |i, j| rows[i][j] - means[j]);
  let cov = centred.transpose() * &centred / (n as f64 - 1.0);
  let eigen = cov.symmetric_eigen();

  let variances: Vec<f64> = eigen.eigenvalues.iter().map(|l| l.max(0.0)).collect();
  let total: f64 = variances.iter().sum();
  let mut order: Vec<usize> = (0..dim).collect();
  order.sort_by(|&a, &b| variances[b].partial_cmp(&variances[a]).unwrap_or(Ordering::Equal));

  let mut coordinates = vec![Vec::with_capacity(n_components); n];
  let mut explained_variance_ratio = Vec::with_capacity(n_components);
  for &c in order.iter().take(n_components) {
    let axis = eigen.eigenvectors.column(c);
    let mut scores: Vec<f64> = (0..n)
      .map(|i| (0..dim).map(|j| centred[(i, j)] * axis[j]).sum())
      .collect();

    let pivot = scores
      .iter()
      .fold(0.0f64, |m, &s| if s.abs() > m.abs() { s } else { m });
    if pivot < 0.0 {
      scores.iter_mut().for_each(|s| *s = -*s);
    }

    for (row, s) in coordinates.iter_mut().zip(scores) {
      row.push(s);
    }
    explained_variance_ratio.push(if total > 0.0 { variances[c] / total } else { 0.0 });
  }

  Ok(PcaProjection {
    coordinates,
    explained_variance_ratio,
  })
}
