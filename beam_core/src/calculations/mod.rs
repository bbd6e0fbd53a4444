//! # Structural Calculations
//!
//! The continuous beam solver, split by pipeline stage. Each stage reads the
//! previous stage's output and never mutates it:
//!
//! - [`model`] - Immutable beam model built from validated input
//! - [`stiffness`] - Local stiffness, displacement transformation, global assembly
//! - [`banded`] - Banded storage and the LDLᵗ factorization
//! - [`solve`] - Per-load-type fixed-end actions, displacements and reactions
//! - [`superposition`] - Combination × pattern superposition and extreme tracking
//! - [`continuous_beam`] - Input, options and the [`analyze`] entry point
//!
//! All inputs and results are JSON-serializable.

pub mod banded;
pub mod continuous_beam;
pub mod model;
pub mod solve;
pub mod stiffness;
pub mod superposition;

// Re-export commonly used types
pub use continuous_beam::{
    analyze, AnalysisJob, AnalysisOptions, AnalysisSummary, ContinuousBeamAnalysis,
    ContinuousBeamInput, PatternMode, SupportInput,
};
pub use model::{build_model, Fixity, Model};
pub use solve::{solve_load_types, LoadTypeSolution};
pub use superposition::{superpose, Envelope, PatternScheme, SolverState};
