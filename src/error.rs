//! # Errors
//!
//! Error kinds surfaced by table construction, engine construction and queries.
//! Missing regression results, degenerate scaling and non-converged frontier
//! targets are not errors: they surface as `None` cells or dropped points.

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used across the crate.
pub type RiskResult<T> = Result<T, RiskError>;

/// Errors returned by the risk engine and its collaborators.
#[derive(Error, Debug)]
pub enum RiskError {
  /// The asset selector names an unknown or duplicated asset, or asks for more
  /// columns than the table has.
  #[error("Invalid asset selection: {reason}")]
  InvalidSelection {
    /// Why the selection was rejected.
    reason: String,
  },

  /// A query referenced an asset that is not part of the engine's universe.
  #[error("Asset not found: {name}")]
  AssetNotFound {
    /// The requested asset name.
    name: String,
  },

  /// Input table or series violates its shape or ordering invariants.
  #[error("Invalid table: {reason}")]
  InvalidTable {
    /// The violated invariant.
    reason: String,
  },

  /// A date key was not present on the axis it was looked up on.
  #[error("Date not found: {date}")]
  DateNotFound {
    /// The requested date.
    date: NaiveDate,
  },

  /// A positional row lookup fell outside the table.
  #[error("Row index {index} out of range for {len} rows")]
  IndexOutOfRange {
    /// Requested (possibly negative) index.
    index: isize,
    /// Number of rows available.
    len: usize,
  },

  /// Not enough observations for the requested analysis.
  #[error("{operation} requires at least {required} observations, got {actual}")]
  InsufficientData {
    /// The analysis that was attempted.
    operation: &'static str,
    /// Minimum number of observations.
    required: usize,
    /// Observations available.
    actual: usize,
  },

  /// The data admit no meaningful fit, such as a unit-root regression on a
  /// constant series.
  #[error("Degenerate series for {operation}: {reason}")]
  DegenerateSeries {
    /// The analysis that was attempted.
    operation: &'static str,
    /// Why the fit is undefined.
    reason: String,
  },

  /// Engine configuration could not be parsed or failed validation.
  #[error("Invalid configuration: {reason}")]
  InvalidConfig {
    /// What was wrong with the configuration.
    reason: String,
  },

  /// An external table provider failed to load its data.
  #[error(transparent)]
  Provider(#[from] anyhow::Error),
}

impl RiskError {
  pub(crate) fn asset_not_found(name: impl Into<String>) -> Self {
    Self::AssetNotFound { name: name.into() }
  }

  pub(crate) fn invalid_selection(reason: impl Into<String>) -> Self {
    Self::InvalidSelection {
      reason: reason.into(),
    }
  }

  pub(crate) fn invalid_table(reason: impl Into<String>) -> Self {
    Self::InvalidTable {
      reason: reason.into(),
    }
  }
}
