//! # Structural Engineering Equations
//!
//! Closed-form beam formulas used by the stiffness solver. Keeping them in
//! one place makes them easy to check against references and to unit-test
//! without building a model.
//!
//! ## Modules
//!
//! - [`fixed_end`] - Fixed-end shears and moments for point, moment,
//!   uniform, triangular and sign-changing linear loads
//!
//! ## Sign Conventions
//!
//! - **Loads**: Positive downward (gravity direction)
//! - **Applied moments**: Positive counter-clockwise
//! - **End actions**: Forces on the member, positive upward / counter-clockwise
//! - **Internal moment**: Positive causes tension on bottom fiber (sagging)
//! - **Internal shear**: Positive when left side moves up relative to right
//!
//! ## References
//!
//! - Roark's Formulas for Stress and Strain, 8th Edition, Table 8.1
//! - Weaver & Gere, Matrix Analysis of Framed Structures, Appendix B

pub mod fixed_end;

pub use fixed_end::{
    linear_load, point_force, point_moment, snap_to_zero, split_at_zero_crossing,
    triangular_load, uniform_load, Corner, FixedEndActions, LinearLoad, OneOrTwo,
};
