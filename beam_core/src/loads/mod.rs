//! Load types, beam loads and ASCE 7 load combinations
//!
//! # Overview
//!
//! - [`LoadType`] - The nine ASCE 7 load categories (D, F, L, H, Lr, S, R, W, E)
//! - [`DiscreteLoad`] - One load on the beam (point, moment, uniform, trapezoidal)
//! - [`LoadCombination`] - Factors applied to each load type
//! - [`combination_set`] - Static registry of combination tables by name
//!
//! # Example
//!
//! ```
//! use beam_core::loads::{combination_set, LoadType};
//!
//! let mut values = [0.0; 10];
//! values[LoadType::Dead.slot()] = 20.0;
//! values[LoadType::Live.slot()] = 40.0;
//!
//! let governing = combination_set("asce7-lrfd")
//!     .unwrap()
//!     .iter()
//!     .map(|c| c.factor_table().iter().zip(&values).map(|(f, v)| f * v).sum::<f64>())
//!     .fold(0.0f64, f64::max);
//! assert!((governing - 88.0).abs() < 1e-9);
//! ```

pub mod combinations;
pub mod discrete;
pub mod load_types;

pub use combinations::{
    asce7_asd_combinations, asce7_lrfd_combinations, combination_set, combination_set_names,
    service_combinations, LoadCombination, ASD_SET, LRFD_SET, SERVICE_SET,
};
pub use discrete::{DiscreteLoad, LoadDistribution};
pub use load_types::{LoadTable, LoadType, AGGREGATE_SLOT, NUM_LOAD_SLOTS};
