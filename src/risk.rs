//! # Risk
//!
//! $$
//! \sigma_i = \sqrt{\Sigma_{ii}},\qquad
//! \mathbb E[r_i] = r_f + \beta_i(\bar r_m - r_f) + \alpha_i
//! $$
//!
//! Dispersion, market-model, ranking, frontier, seasonal and clustering
//! analytics, tied together by [`RiskEngine`].

pub mod cluster;
pub mod dispersion;
pub mod engine;
pub mod frontier;
pub mod market_model;
pub mod ranking;
pub mod seasonal;
pub mod types;

pub use cluster::KMeansFit;
pub use cluster::PcaProjection;
pub use engine::build_engine;
pub use engine::RiskEngine;
pub use engine::MARKET_LABEL;
pub use frontier::MeanVarianceProblem;
pub use seasonal::SeasonalDecomposition;
pub use seasonal::SeasonalityProfile;
pub use types::AlphaBeta;
pub use types::ClusteredAsset;
pub use types::FrontierCurve;
pub use types::FrontierPoint;
pub use types::MonthlyMean;
pub use types::RankedAsset;
pub use types::ReturnClusters;
pub use types::RiskOutputs;
pub use types::RiskReturnPoint;
pub use types::SeasonalCluster;
