//! # Stats
//!
//! $$
//! \Delta y_t = c + \gamma\, y_{t-1} + \sum_{i=1}^{p} \phi_i\, \Delta y_{t-i} + \varepsilon_t
//! $$
//!
pub mod stationarity;
