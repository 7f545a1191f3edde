//! Stationarity and unit-root tests.

mod common;

pub mod adf;

pub use adf::adf_test;
pub use adf::ADFConfig;
pub use adf::ADFResult;
pub use common::CriticalValues;
pub use common::DeterministicTerm;
pub use common::LagSelection;
