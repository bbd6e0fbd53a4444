//! # beam_core - Continuous Beam Analysis Engine
//!
//! `beam_core` computes internal shears, moments, reactions and deflections of
//! multi-span beams by the direct stiffness method, then superimposes code
//! load combinations and live-load patterns to find the governing envelopes.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: one call analyzes one beam; nothing persists between runs
//! - **Exact geometry**: positions are rationals until segment splitting is done
//! - **Rich Errors**: structured error types, not just strings
//! - **All or nothing**: invalid input or an unstable structure aborts the analysis
//!
//! ## Quick Start
//!
//! ```rust
//! use beam_core::calculations::{analyze, AnalysisOptions, ContinuousBeamInput};
//! use beam_core::loads::{DiscreteLoad, LoadType};
//!
//! let input = ContinuousBeamInput::from_codes(&["10"], &["p", "p"])
//!     .unwrap()
//!     .with_load(DiscreteLoad::point(LoadType::Dead, 1000.0, "5".parse().unwrap()).untyped());
//!
//! let analysis = analyze(&input, &AnalysisOptions::service()).unwrap();
//! assert!((analysis.envelope.m_max.value - 2500.0).abs() < 1e-9);
//!
//! // Serialize for storage or transmission
//! let json = serde_json::to_string_pretty(&analysis.summary()).unwrap();
//! assert!(json.contains("m_max"));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Model builder, stiffness solver and superposer
//! - [`equations`] - Closed-form fixed-end actions
//! - [`loads`] - Load types, discrete loads and combination tables
//! - [`exact`] - Exact rational positions
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod equations;
pub mod errors;
pub mod exact;
pub mod loads;

// Re-export commonly used types at crate root for convenience
pub use calculations::{analyze, AnalysisJob, AnalysisOptions, ContinuousBeamInput};
pub use errors::{CalcError, CalcResult};
pub use exact::Exact;
