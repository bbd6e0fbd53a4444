//! # Load-Type Solve Loop
//!
//! For every load slot present on the beam: fixed-end actions, the nodal
//! force vector, displacements from the shared LDLᵗ factorization, member
//! end actions and node reactions.
//!
//! Patternable load types (live, roof live, snow) are solved once per span
//! and once per loaded node in isolation when patterning is active, so the
//! superposer can assemble any pattern by summation.
//!
//! ## Reactions
//!
//! - Supported and spring nodes: joint equilibrium,
//!   `R = V_right(span j-1) + V_left(span j) + P_applied`
//! - Fixed nodes also carry `M_R = M_right(span j-1) + M_left(span j) - M_applied`
//! - Continuous and hinge nodes carry no reaction

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::banded::LdltFactorization;
use super::model::Model;
use super::stiffness::{
    assemble_global, span_stiffnesses, DisplacementTransformation, LocalDof, LocalStiffness,
    SpanEnds,
};
use crate::equations::{linear_load, point_force, point_moment, FixedEndActions};
use crate::errors::CalcResult;
use crate::loads::{LoadTable, LoadType, AGGREGATE_SLOT, NUM_LOAD_SLOTS};

/// Member actions smaller than this are reported as exact zero
pub const ACTION_TOLERANCE: f64 = 1e-14;

/// Relative tolerance of the equilibrium self-check
const EQUILIBRIUM_TOLERANCE: f64 = 1e-8;

/// Which loads of a slot a case includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadScope {
    /// Every span and node load
    All,
    /// Loads on one span only
    Span(usize),
    /// Loads applied at one node only
    Node(usize),
}

impl LoadScope {
    fn includes_span(&self, index: usize) -> bool {
        match self {
            LoadScope::All => true,
            LoadScope::Span(k) => *k == index,
            LoadScope::Node(_) => false,
        }
    }

    fn includes_node(&self, index: usize) -> bool {
        match self {
            LoadScope::All => true,
            LoadScope::Node(j) => *j == index,
            LoadScope::Span(_) => false,
        }
    }
}

/// Reaction at one node (force up positive, moment counter-clockwise positive)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reaction {
    pub force: f64,
    pub moment: f64,
}

/// Response of the beam to one load case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCaseResponse {
    /// End actions per span (member action matrix)
    pub member_actions: Vec<SpanEnds>,

    /// End displacements per span
    pub span_displacements: Vec<SpanEnds>,

    /// Structure displacement vector
    pub displacements: Vec<f64>,

    /// Reaction per node
    pub reactions: Vec<Reaction>,
}

impl LoadCaseResponse {
    /// Resultant of the reactions: (upward force, CCW moment about the left end)
    pub fn reaction_resultant(&self, model: &Model) -> (f64, f64) {
        self.reactions
            .iter()
            .zip(&model.nodes)
            .fold((0.0, 0.0), |(f, m), (r, node)| (f + r.force, m + r.force * node.x + r.moment))
    }
}

/// Per-type result: one case, or one case per span and loaded node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeResponse {
    Single(LoadCaseResponse),
    Patterned {
        spans: Vec<LoadCaseResponse>,
        nodes: Vec<Option<LoadCaseResponse>>,
    },
}

impl TypeResponse {
    /// Every load case making up this response
    pub fn cases(&self) -> Vec<&LoadCaseResponse> {
        match self {
            TypeResponse::Single(r) => vec![r],
            TypeResponse::Patterned { spans, nodes } => {
                spans.iter().chain(nodes.iter().flatten()).collect()
            }
        }
    }

    pub fn is_patterned(&self) -> bool {
        matches!(self, TypeResponse::Patterned { .. })
    }
}

/// Reaction accumulators of one node, per load slot
///
/// Unpatterned types store the reaction in both `force` and `force_min`;
/// patterned types store the sums of the positive and of the negative
/// reactions over every isolated case.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeReactions {
    pub force: LoadTable,
    pub moment: LoadTable,
    pub force_min: LoadTable,
    pub moment_min: LoadTable,
}

/// Output of the solve loop for all load types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTypeSolution {
    pub dtm: DisplacementTransformation,

    /// Indexed by load slot; `None` when the slot carries no load
    pub responses: Vec<Option<TypeResponse>>,

    /// Reaction accumulators per node
    pub reactions: Vec<NodeReactions>,

    /// Number of load cases solved
    pub num_cases: usize,
}

impl LoadTypeSolution {
    pub fn response(&self, slot: usize) -> Option<&TypeResponse> {
        self.responses.get(slot).and_then(|r| r.as_ref())
    }
}

// =============================================================================
// SOLVER
// =============================================================================

/// Factored structure, reusable for any load case of one model
pub struct StructureSolver<'a> {
    model: &'a Model,
    dtm: DisplacementTransformation,
    stiffnesses: Vec<LocalStiffness>,
    factorization: LdltFactorization,
}

impl<'a> StructureSolver<'a> {
    /// Assemble and factor the stiffness matrix
    pub fn new(model: &'a Model) -> CalcResult<Self> {
        let dtm = DisplacementTransformation::from_model(model);
        let stiffnesses = span_stiffnesses(model);
        let sm = assemble_global(model, &dtm, &stiffnesses)?;
        let factorization = LdltFactorization::factor(&sm)?;
        Ok(Self {
            model,
            dtm,
            stiffnesses,
            factorization,
        })
    }

    pub fn dtm(&self) -> &DisplacementTransformation {
        &self.dtm
    }

    /// Fixed-end actions of every span for one slot
    pub fn fixed_end_actions(&self, slot: usize, scope: LoadScope) -> Vec<FixedEndActions> {
        self.model
            .spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                if !scope.includes_span(i) {
                    return FixedEndActions::zero();
                }
                let l = span.length;
                span.segments
                    .iter()
                    .map(|seg| {
                        point_force(seg.p[slot], seg.x_left, l)
                            + point_moment(seg.m[slot], seg.x_left, l)
                            + linear_load(seg.w1[slot], seg.w2[slot], seg.x_left, seg.x_right(), l)
                    })
                    .sum()
            })
            .collect()
    }

    /// Nodal force vector: mapped node loads minus `DTMᵗ · FEA`
    pub fn nodal_forces(&self, slot: usize, scope: LoadScope, fea: &[FixedEndActions]) -> Vec<f64> {
        let mut forces = vec![0.0; self.dtm.num_dof];

        for (j, (node, dofs)) in self.model.nodes.iter().zip(&self.dtm.nodes).enumerate() {
            if !scope.includes_node(j) {
                continue;
            }
            if let Some(t) = dofs.translation {
                forces[t] -= node.p[slot];
            }
            if let Some(r) = dofs.moment_dof() {
                forces[r] += node.m[slot];
            }
        }

        for (span_dofs, actions) in self.dtm.spans.iter().zip(fea) {
            let actions = SpanEnds::from(*actions);
            for dof in LocalDof::ALL {
                if let Some(g) = span_dofs[dof.index()] {
                    forces[g] -= actions.get(dof);
                }
            }
        }
        forces
    }

    /// Solve one load case end to end
    pub fn solve_case(&self, slot: usize, scope: LoadScope) -> CalcResult<LoadCaseResponse> {
        let fea = self.fixed_end_actions(slot, scope);
        let forces = self.nodal_forces(slot, scope, &fea);
        let displacements = self.factorization.solve(&forces)?;

        let span_displacements: Vec<SpanEnds> = (0..self.model.num_spans())
            .map(|i| self.dtm.span_displacements(i, &displacements))
            .collect();

        let member_actions: Vec<SpanEnds> = span_displacements
            .iter()
            .zip(&self.stiffnesses)
            .zip(&fea)
            .map(|((d, k), f)| {
                let mut actions = k.actions(d);
                actions.add_scaled(&SpanEnds::from(*f), 1.0);
                actions.snapped(ACTION_TOLERANCE)
            })
            .collect();

        let reactions = self.reactions(slot, scope, &member_actions);
        let response = LoadCaseResponse {
            member_actions,
            span_displacements,
            displacements,
            reactions,
        };

        self.check_equilibrium(slot, scope, &response);
        trace!("solved slot {} {:?}", slot, scope);
        Ok(response)
    }

    fn reactions(&self, slot: usize, scope: LoadScope, actions: &[SpanEnds]) -> Vec<Reaction> {
        let num_spans = self.model.num_spans();
        self.model
            .nodes
            .iter()
            .enumerate()
            .map(|(j, node)| {
                let (p, m) = if scope.includes_node(j) {
                    (node.p[slot], node.m[slot])
                } else {
                    (0.0, 0.0)
                };
                let left = j.checked_sub(1).map(|i| &actions[i]);
                let right = if j < num_spans { Some(&actions[j]) } else { None };

                let force = if node.fixity.has_force_reaction() {
                    left.map_or(0.0, |a| a.right_shear) + right.map_or(0.0, |a| a.left_shear) + p
                } else {
                    0.0
                };
                let moment = if node.fixity.restrains_rotation() {
                    left.map_or(0.0, |a| a.right_moment) + right.map_or(0.0, |a| a.left_moment) - m
                } else {
                    0.0
                };
                Reaction { force, moment }
            })
            .collect()
    }

    fn check_equilibrium(&self, slot: usize, scope: LoadScope, response: &LoadCaseResponse) {
        let (applied_force, applied_moment) = applied_resultant(self.model, slot, scope);
        let (reaction_force, reaction_moment) = response.reaction_resultant(self.model);
        let force_residual = reaction_force - applied_force;
        let moment_residual = reaction_moment + applied_moment;

        let scale = applied_force.abs().max(1.0);
        let moment_scale = (applied_force.abs() * self.model.total_length()).max(applied_moment.abs()).max(1.0);
        if force_residual.abs() > EQUILIBRIUM_TOLERANCE * scale
            || moment_residual.abs() > EQUILIBRIUM_TOLERANCE * moment_scale
        {
            warn!(
                "equilibrium residual for slot {} {:?}: force {:.3e}, moment {:.3e}",
                slot, scope, force_residual, moment_residual
            );
        }
    }
}

/// Resultant of the applied loads of one case:
/// (total downward force, CCW moment about the left end of the beam)
pub fn applied_resultant(model: &Model, slot: usize, scope: LoadScope) -> (f64, f64) {
    let mut force = 0.0;
    let mut moment = 0.0;

    for (j, node) in model.nodes.iter().enumerate() {
        if scope.includes_node(j) {
            force += node.p[slot];
            moment += node.m[slot] - node.p[slot] * node.x;
        }
    }

    for (i, span) in model.spans.iter().enumerate() {
        if !scope.includes_span(i) {
            continue;
        }
        let x0 = model.span_start(i);
        for seg in &span.segments {
            let x = x0 + seg.x_left;
            let (w1, w2, ls) = (seg.w1[slot], seg.w2[slot], seg.length);
            let resultant = 0.5 * (w1 + w2) * ls;
            let first_moment = ls * ls * (w1 + 2.0 * w2) / 6.0;
            force += seg.p[slot] + resultant;
            moment += seg.m[slot] - seg.p[slot] * x - (resultant * x + first_moment);
        }
    }
    (force, moment)
}

fn is_patternable_slot(slot: usize) -> bool {
    slot != AGGREGATE_SLOT && LoadType::from_slot(slot).map_or(false, |t| t.is_patternable())
}

/// Solve every present load slot.
///
/// # Errors
///
/// `CalculationFailed` when the structure is unstable.
pub fn solve_load_types(model: &Model) -> CalcResult<LoadTypeSolution> {
    let solver = StructureSolver::new(model)?;
    let patterning = model.beam.pattern_scheme.is_patterned();

    let mut responses = Vec::with_capacity(NUM_LOAD_SLOTS);
    let mut reactions = vec![NodeReactions::default(); model.num_nodes()];
    let mut num_cases = 0;

    for slot in 0..NUM_LOAD_SLOTS {
        if !model.beam.present[slot] {
            responses.push(None);
            continue;
        }

        let response = if patterning && is_patternable_slot(slot) {
            let spans = (0..model.num_spans())
                .map(|k| solver.solve_case(slot, LoadScope::Span(k)))
                .collect::<CalcResult<Vec<_>>>()?;
            let nodes = model
                .nodes
                .iter()
                .enumerate()
                .map(|(j, node)| {
                    if node.is_loaded(slot) {
                        solver.solve_case(slot, LoadScope::Node(j)).map(Some)
                    } else {
                        Ok(None)
                    }
                })
                .collect::<CalcResult<Vec<_>>>()?;
            TypeResponse::Patterned { spans, nodes }
        } else {
            TypeResponse::Single(solver.solve_case(slot, LoadScope::All)?)
        };

        accumulate_reactions(&response, slot, &mut reactions);
        num_cases += response.cases().len();
        responses.push(Some(response));
    }

    debug!("solved {} load cases over {} dof", num_cases, solver.dtm().num_dof);
    Ok(LoadTypeSolution {
        dtm: solver.dtm,
        responses,
        reactions,
        num_cases,
    })
}

fn accumulate_reactions(response: &TypeResponse, slot: usize, reactions: &mut [NodeReactions]) {
    match response {
        TypeResponse::Single(case) => {
            for (acc, r) in reactions.iter_mut().zip(&case.reactions) {
                acc.force[slot] = r.force;
                acc.force_min[slot] = r.force;
                acc.moment[slot] = r.moment;
                acc.moment_min[slot] = r.moment;
            }
        }
        TypeResponse::Patterned { .. } => {
            for case in response.cases() {
                for (acc, r) in reactions.iter_mut().zip(&case.reactions) {
                    acc.force[slot] += r.force.max(0.0);
                    acc.force_min[slot] += r.force.min(0.0);
                    acc.moment[slot] += r.moment.max(0.0);
                    acc.moment_min[slot] += r.moment.min(0.0);
                }
            }
        }
    }
}
