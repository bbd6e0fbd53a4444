//! # Stiffness Assembly
//!
//! Per-span local stiffness, the displacement transformation that maps each
//! span's end displacements onto structure unknowns, and assembly of the
//! global banded stiffness matrix `SM = Σ DTMᵗ · k · DTM`.
//!
//! ## Local Degrees of Freedom
//!
//! Every span carries five local dofs, addressed by name rather than by
//! offset:
//!
//! ```text
//!   spring      translation of the left node seen by its spring
//!   left_shear  translation at the left end       (up positive)
//!   left_moment rotation at the left end          (CCW positive)
//!   right_shear translation at the right end
//!   right_moment rotation at the right end
//! ```
//!
//! The spring row carries the spring of the span's left node. The last node
//! starts no span, so its spring is assembled directly on its translation
//! unknown.

use log::debug;
use serde::{Deserialize, Serialize};

use super::banded::BandedMatrix;
use super::model::{Fixity, Model};
use crate::equations::FixedEndActions;
use crate::errors::CalcResult;

/// Number of local dofs per span
pub const LOCAL_DOFS: usize = 5;

/// Named local degree of freedom of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalDof {
    Spring = 0,
    LeftShear = 1,
    LeftMoment = 2,
    RightShear = 3,
    RightMoment = 4,
}

impl LocalDof {
    pub const ALL: [LocalDof; LOCAL_DOFS] = [
        LocalDof::Spring,
        LocalDof::LeftShear,
        LocalDof::LeftMoment,
        LocalDof::RightShear,
        LocalDof::RightMoment,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// SPAN-END RECORD
// =============================================================================

/// One value per local dof of a span: end actions or end displacements
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpanEnds {
    pub spring: f64,
    pub left_shear: f64,
    pub left_moment: f64,
    pub right_shear: f64,
    pub right_moment: f64,
}

impl SpanEnds {
    pub fn get(&self, dof: LocalDof) -> f64 {
        match dof {
            LocalDof::Spring => self.spring,
            LocalDof::LeftShear => self.left_shear,
            LocalDof::LeftMoment => self.left_moment,
            LocalDof::RightShear => self.right_shear,
            LocalDof::RightMoment => self.right_moment,
        }
    }

    pub fn set(&mut self, dof: LocalDof, value: f64) {
        match dof {
            LocalDof::Spring => self.spring = value,
            LocalDof::LeftShear => self.left_shear = value,
            LocalDof::LeftMoment => self.left_moment = value,
            LocalDof::RightShear => self.right_shear = value,
            LocalDof::RightMoment => self.right_moment = value,
        }
    }

    /// Add `factor × other` in place
    pub fn add_scaled(&mut self, other: &SpanEnds, factor: f64) {
        for dof in LocalDof::ALL {
            self.set(dof, self.get(dof) + factor * other.get(dof));
        }
    }

    /// Replace magnitudes below `tolerance` with exact zero
    pub fn snapped(mut self, tolerance: f64) -> SpanEnds {
        for dof in LocalDof::ALL {
            if self.get(dof).abs() < tolerance {
                self.set(dof, 0.0);
            }
        }
        self
    }
}

impl From<FixedEndActions> for SpanEnds {
    fn from(fea: FixedEndActions) -> Self {
        SpanEnds {
            spring: 0.0,
            left_shear: fea.left_shear,
            left_moment: fea.left_moment,
            right_shear: fea.right_shear,
            right_moment: fea.right_moment,
        }
    }
}

// =============================================================================
// LOCAL STIFFNESS
// =============================================================================

/// 5×5 local stiffness block of one span
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalStiffness {
    k: [[f64; LOCAL_DOFS]; LOCAL_DOFS],
}

impl LocalStiffness {
    pub fn entry(&self, row: LocalDof, col: LocalDof) -> f64 {
        self.k[row.index()][col.index()]
    }

    /// End actions produced by the given end displacements (`k · d`)
    pub fn actions(&self, displacements: &SpanEnds) -> SpanEnds {
        let mut out = SpanEnds::default();
        for row in LocalDof::ALL {
            let value = LocalDof::ALL
                .iter()
                .map(|col| self.entry(row, *col) * displacements.get(*col))
                .sum();
            out.set(row, value);
        }
        out
    }
}

/// Local stiffness of a span of `length` and rigidity `ei`, with the left node's spring
///
/// # Formulas
/// ```text
///          ┌ 12    6L   -12   6L  ┐
/// EI/L³ ·  │ 6L    4L²  -6L   2L² │
///          │ -12  -6L    12  -6L  │
///          └ 6L    2L²  -6L   4L² ┘
/// ```
pub fn local_stiffness(length: f64, ei: f64, left_spring: f64) -> LocalStiffness {
    let l = length;
    let a = 12.0 * ei / (l * l * l);
    let b = 6.0 * ei / (l * l);
    let c = 4.0 * ei / l;
    let d = 2.0 * ei / l;
    LocalStiffness {
        k: [
            [left_spring, 0.0, 0.0, 0.0, 0.0],
            [0.0, a, b, -a, b],
            [0.0, b, c, -b, d],
            [0.0, -a, -b, a, -b],
            [0.0, b, d, -b, c],
        ],
    }
}

// =============================================================================
// DISPLACEMENT TRANSFORMATION
// =============================================================================

/// Structure unknowns at one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeDofs {
    /// Vertical translation
    pub translation: Option<usize>,
    /// Rotation seen by the span ending at this node
    pub rotation_left: Option<usize>,
    /// Rotation seen by the span starting at this node
    pub rotation_right: Option<usize>,
}

impl NodeDofs {
    /// Unknown receiving an applied node moment
    pub fn moment_dof(&self) -> Option<usize> {
        self.rotation_right.or(self.rotation_left)
    }
}

/// Global unknown (or none) of each local dof of a span
pub type SpanDofs = [Option<usize>; LOCAL_DOFS];

/// Mapping from span-end displacements to structure unknowns (DTM)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplacementTransformation {
    pub nodes: Vec<NodeDofs>,
    pub spans: Vec<SpanDofs>,
    pub num_dof: usize,
    pub half_bandwidth: usize,
}

impl DisplacementTransformation {
    /// Number the unknowns node by node, left to right
    ///
    /// # Example
    /// ```
    /// use beam_core::calculations::continuous_beam::{AnalysisOptions, ContinuousBeamInput};
    /// use beam_core::calculations::model::build_model;
    /// use beam_core::calculations::stiffness::{DisplacementTransformation, LocalDof};
    ///
    /// let input = ContinuousBeamInput::from_codes(&["10", "10"], &["f", "h", "p"]).unwrap();
    /// let model = build_model(&input, &AnalysisOptions::default()).unwrap();
    /// let dtm = DisplacementTransformation::from_model(&model);
    ///
    /// assert_eq!(dtm.num_dof, 4);
    /// assert_eq!(dtm.spans[0][LocalDof::LeftShear.index()], None);
    /// assert_eq!(dtm.spans[0][LocalDof::RightMoment.index()], Some(1));
    /// assert_eq!(dtm.spans[1][LocalDof::LeftMoment.index()], Some(2));
    /// ```
    pub fn from_model(model: &Model) -> Self {
        let mut next = 0usize;
        let mut take = || {
            let dof = next;
            next += 1;
            Some(dof)
        };

        let nodes: Vec<NodeDofs> = model
            .nodes
            .iter()
            .map(|node| match node.fixity {
                Fixity::Fixed => NodeDofs::default(),
                Fixity::Pinned => {
                    let r = take();
                    NodeDofs {
                        translation: None,
                        rotation_left: r,
                        rotation_right: r,
                    }
                }
                Fixity::Continuous | Fixity::Spring => {
                    let t = take();
                    let r = take();
                    NodeDofs {
                        translation: t,
                        rotation_left: r,
                        rotation_right: r,
                    }
                }
                Fixity::Hinge => NodeDofs {
                    translation: take(),
                    rotation_left: take(),
                    rotation_right: take(),
                },
                Fixity::ProppedHinge => NodeDofs {
                    translation: None,
                    rotation_left: take(),
                    rotation_right: take(),
                },
            })
            .collect();

        let spans: Vec<SpanDofs> = (0..model.num_spans())
            .map(|i| {
                let (left, right) = (&nodes[i], &nodes[i + 1]);
                let spring = if model.nodes[i].fixity == Fixity::Spring {
                    left.translation
                } else {
                    None
                };
                [
                    spring,
                    left.translation,
                    left.rotation_right,
                    right.translation,
                    right.rotation_left,
                ]
            })
            .collect();

        let half_bandwidth = spans
            .iter()
            .map(|dofs| {
                let mapped: Vec<usize> = dofs.iter().flatten().copied().collect();
                match (mapped.iter().min(), mapped.iter().max()) {
                    (Some(lo), Some(hi)) => hi - lo,
                    _ => 0,
                }
            })
            .max()
            .unwrap_or(0);

        Self {
            nodes,
            spans,
            num_dof: next,
            half_bandwidth,
        }
    }

    /// Local end displacements of span `index` picked from the global vector
    pub fn span_displacements(&self, index: usize, global: &[f64]) -> SpanEnds {
        let mut local = SpanEnds::default();
        for dof in LocalDof::ALL {
            if let Some(g) = self.spans[index][dof.index()] {
                local.set(dof, global[g]);
            }
        }
        local
    }
}

/// Local stiffness of every span of the model
pub fn span_stiffnesses(model: &Model) -> Vec<LocalStiffness> {
    let ei = model.beam.ei();
    model
        .spans
        .iter()
        .enumerate()
        .map(|(i, span)| local_stiffness(span.length, ei, model.nodes[i].spring_constant))
        .collect()
}

/// Assemble the lower triangle of `SM = Σ DTMᵗ · k · DTM`
pub fn assemble_global(
    model: &Model,
    dtm: &DisplacementTransformation,
    stiffnesses: &[LocalStiffness],
) -> CalcResult<BandedMatrix> {
    let mut sm = BandedMatrix::new(dtm.num_dof, dtm.half_bandwidth);

    for (span_dofs, k) in dtm.spans.iter().zip(stiffnesses) {
        for row in LocalDof::ALL {
            let Some(gr) = span_dofs[row.index()] else { continue };
            for col in LocalDof::ALL {
                let Some(gc) = span_dofs[col.index()] else { continue };
                if gr >= gc {
                    sm.add(gr, gc, k.entry(row, col))?;
                }
            }
        }
    }

    // The last node starts no span
    if let (Some(last), Some(dofs)) = (model.nodes.last(), dtm.nodes.last()) {
        if last.fixity == Fixity::Spring {
            if let Some(t) = dofs.translation {
                sm.add(t, t, last.spring_constant)?;
            }
        }
    }

    debug!(
        "assembled stiffness: {} dof, half-bandwidth {}",
        dtm.num_dof, dtm.half_bandwidth
    );
    Ok(sm)
}
