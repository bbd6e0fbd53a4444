//! Discrete Load System
//!
//! Loads applied along a continuous beam: point forces, applied moments,
//! full-length and partial uniform loads, and trapezoidal loads. Every
//! position is measured from the left end of the whole beam and kept as an
//! [`Exact`] rational so the model builder can split segments without
//! floating-point slivers.

use serde::{Deserialize, Serialize};

use super::load_types::{LoadType, AGGREGATE_SLOT};
use crate::errors::{CalcError, CalcResult};
use crate::exact::Exact;

// ============================================================================
// Load Distribution Types
// ============================================================================

/// How a load is distributed along the beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoadDistribution {
    /// Point force at a specific position (positive downward)
    Point {
        /// Distance from the left end of the beam
        position: Exact,
    },

    /// Applied moment at a specific position (positive counter-clockwise)
    Moment {
        /// Distance from the left end of the beam
        position: Exact,
    },

    /// Uniform load over the full beam
    UniformFull,

    /// Uniform load over part of the beam
    UniformPartial {
        /// Start position from the left end
        start: Exact,
        /// End position from the left end
        end: Exact,
    },

    /// Linearly varying load between two positions
    ///
    /// The end intensities are given here; the load's `magnitude` is unused.
    Trapezoidal {
        /// Start position from the left end
        start: Exact,
        /// End position from the left end
        end: Exact,
        /// Intensity at start (positive downward)
        start_magnitude: f64,
        /// Intensity at end (positive downward)
        end_magnitude: f64,
    },
}

impl Default for LoadDistribution {
    fn default() -> Self {
        LoadDistribution::UniformFull
    }
}

impl LoadDistribution {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            LoadDistribution::Point { .. } => "Point",
            LoadDistribution::Moment { .. } => "Moment",
            LoadDistribution::UniformFull => "Uniform",
            LoadDistribution::UniformPartial { .. } => "Partial Uniform",
            LoadDistribution::Trapezoidal { .. } => "Trapezoidal",
        }
    }

    /// Whether this is a concentrated (point force or moment) load
    pub fn is_concentrated(&self) -> bool {
        matches!(self, LoadDistribution::Point { .. } | LoadDistribution::Moment { .. })
    }

    /// Extent `(start, end)` of a distributed load on a beam of the given total length
    pub fn extent(&self, total_length: &Exact) -> Option<(Exact, Exact)> {
        match self {
            LoadDistribution::UniformFull => Some((Exact::zero(), total_length.clone())),
            LoadDistribution::UniformPartial { start, end }
            | LoadDistribution::Trapezoidal { start, end, .. } => Some((start.clone(), end.clone())),
            LoadDistribution::Point { .. } | LoadDistribution::Moment { .. } => None,
        }
    }

    /// Every position the model builder must place on a segment boundary
    pub fn cut_positions(&self, total_length: &Exact) -> Vec<Exact> {
        match self {
            LoadDistribution::Point { position } | LoadDistribution::Moment { position } => {
                vec![position.clone()]
            }
            _ => match self.extent(total_length) {
                Some((start, end)) => vec![start, end],
                None => Vec::new(),
            },
        }
    }
}

// ============================================================================
// Discrete Load
// ============================================================================

/// A single load entry
///
/// # Example
/// ```
/// use beam_core::loads::{DiscreteLoad, LoadType};
///
/// let load = DiscreteLoad::partial_uniform(LoadType::Live, 40.0, "2".parse().unwrap(), "8".parse().unwrap())
///     .with_tributary_width(4.0);
/// assert_eq!(load.intensities(), (160.0, 160.0));
/// assert_eq!(load.slots(), vec![0, 3]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscreteLoad {
    /// Load type (D, F, L, H, Lr, S, R, W, E); `None` only feeds the aggregate slot
    #[serde(default)]
    pub load_type: Option<LoadType>,

    /// How the load is distributed
    #[serde(default)]
    pub distribution: LoadDistribution,

    /// Load magnitude
    /// - Point forces: force
    /// - Moments: force × length
    /// - Uniform loads: force per length
    #[serde(default)]
    pub magnitude: f64,

    /// Tributary width converting an area load into a line load
    #[serde(default)]
    pub tributary_width: Option<f64>,

    /// User note/description for this load
    #[serde(default)]
    pub note: String,
}

impl DiscreteLoad {
    fn with_distribution(load_type: LoadType, distribution: LoadDistribution, magnitude: f64) -> Self {
        Self {
            load_type: Some(load_type),
            distribution,
            magnitude,
            tributary_width: None,
            note: String::new(),
        }
    }

    /// Uniform load over the whole beam
    pub fn uniform(load_type: LoadType, magnitude: f64) -> Self {
        Self::with_distribution(load_type, LoadDistribution::UniformFull, magnitude)
    }

    /// Point force
    pub fn point(load_type: LoadType, magnitude: f64, position: Exact) -> Self {
        Self::with_distribution(load_type, LoadDistribution::Point { position }, magnitude)
    }

    /// Applied moment (counter-clockwise positive)
    pub fn moment(load_type: LoadType, magnitude: f64, position: Exact) -> Self {
        Self::with_distribution(load_type, LoadDistribution::Moment { position }, magnitude)
    }

    /// Uniform load over `[start, end]`
    pub fn partial_uniform(load_type: LoadType, magnitude: f64, start: Exact, end: Exact) -> Self {
        Self::with_distribution(load_type, LoadDistribution::UniformPartial { start, end }, magnitude)
    }

    /// Linearly varying load over `[start, end]`
    pub fn trapezoidal(
        load_type: LoadType,
        start: Exact,
        end: Exact,
        start_magnitude: f64,
        end_magnitude: f64,
    ) -> Self {
        Self::with_distribution(
            load_type,
            LoadDistribution::Trapezoidal {
                start,
                end,
                start_magnitude,
                end_magnitude,
            },
            0.0,
        )
    }

    /// Drop the load type so the load only feeds the aggregate slot
    pub fn untyped(mut self) -> Self {
        self.load_type = None;
        self
    }

    /// Set tributary width and return self (builder pattern)
    pub fn with_tributary_width(mut self, width: f64) -> Self {
        self.tributary_width = Some(width);
        self
    }

    /// Set note and return self (builder pattern)
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Magnitude scaled by the tributary width
    pub fn effective_magnitude(&self) -> f64 {
        self.magnitude * self.tributary_width.unwrap_or(1.0)
    }

    /// Start/end intensities of a distributed load (tributary width applied)
    pub fn intensities(&self) -> (f64, f64) {
        let scale = self.tributary_width.unwrap_or(1.0);
        match &self.distribution {
            LoadDistribution::Trapezoidal {
                start_magnitude,
                end_magnitude,
                ..
            } => (start_magnitude * scale, end_magnitude * scale),
            _ => {
                let w = self.effective_magnitude();
                (w, w)
            }
        }
    }

    /// Load table slots this load contributes to: the aggregate and its own type
    pub fn slots(&self) -> Vec<usize> {
        match self.load_type {
            Some(t) => vec![AGGREGATE_SLOT, t.slot()],
            None => vec![AGGREGATE_SLOT],
        }
    }

    /// Whether the load actually applies anything
    pub fn is_nonzero(&self) -> bool {
        let (w1, w2) = self.intensities();
        match self.distribution {
            LoadDistribution::Trapezoidal { .. } => w1 != 0.0 || w2 != 0.0,
            _ => self.effective_magnitude() != 0.0,
        }
    }

    /// Check positions and magnitudes against a beam of the given total length
    pub fn validate(&self, index: usize, total_length: &Exact) -> CalcResult<()> {
        let field = format!("loads[{}]", index);

        if let Some(width) = self.tributary_width {
            if !(width.is_finite() && width > 0.0) {
                return Err(CalcError::invalid_input(
                    format!("{}.tributary_width", field),
                    width.to_string(),
                    "Tributary width must be positive",
                ));
            }
        }
        let (w1, w2) = self.intensities();
        if !(self.magnitude.is_finite() && w1.is_finite() && w2.is_finite()) {
            return Err(CalcError::invalid_input(
                format!("{}.magnitude", field),
                self.magnitude.to_string(),
                "Magnitude must be finite",
            ));
        }

        let in_range = |x: &Exact| !x.is_negative() && x <= total_length;
        match &self.distribution {
            LoadDistribution::Point { position } | LoadDistribution::Moment { position } => {
                if !in_range(position) {
                    return Err(CalcError::invalid_input(
                        format!("{}.position", field),
                        position.to_string(),
                        format!("Position must lie within the beam (0 to {})", total_length),
                    ));
                }
            }
            LoadDistribution::UniformFull => {}
            LoadDistribution::UniformPartial { start, end }
            | LoadDistribution::Trapezoidal { start, end, .. } => {
                if !in_range(start) || !in_range(end) {
                    return Err(CalcError::invalid_input(
                        format!("{}.extent", field),
                        format!("{}..{}", start, end),
                        format!("Load must lie within the beam (0 to {})", total_length),
                    ));
                }
                if start >= end {
                    return Err(CalcError::invalid_input(
                        format!("{}.extent", field),
                        format!("{}..{}", start, end),
                        "Start must be before end",
                    ));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
