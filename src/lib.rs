//! # metro-risk
//!
//! $$
//! \min_{\mathbf w \ge 0,\ \mathbf 1^\top \mathbf w = 1} \mathbf w^\top \Sigma \mathbf w
//! \quad\text{s.t.}\quad \mu^\top \mathbf w = r^\*
//! $$
//!
//! Risk and return analytics for a universe of level series (metro-area home
//! prices or rents) measured against a benchmark series.
//!
//! - [`frame`]: date-keyed asset tables, selectors and derived return tables.
//! - [`risk`]: [`risk::RiskEngine`] with correlation, market-model expected
//!   returns, dominance ranking, efficient frontier and seasonal profiles.
//! - [`valuation`]: price-against-rent analysis over two engines.
//! - [`stats`]: unit-root testing of level series.

pub mod config;
pub mod error;
pub mod frame;
pub mod risk;
pub mod stats;
pub mod valuation;

pub use config::ClusterConfig;
pub use config::EngineConfig;
pub use config::SolverConfig;
pub use error::RiskError;
pub use error::RiskResult;
pub use risk::build_engine;
pub use risk::RiskEngine;
pub use valuation::MarketValuation;
