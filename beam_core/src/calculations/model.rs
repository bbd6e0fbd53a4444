//! # Beam Model
//!
//! The immutable description of one beam that every later stage reads:
//! nodes with their fixity and node loads, spans, and the segments each span
//! is divided into so that every load discontinuity sits on a segment
//! boundary.
//!
//! ## Notation
//!
//! - N spans creates N+1 nodes (support locations)
//! - Nodes are numbered 0 to N (left to right)
//! - Spans are numbered 0 to N-1 (left to right)
//! - Segment positions are measured from the left end of their span
//!
//! ```text
//! Node 0        Node 1              Node 2
//!   ▣──────┬──────△──────┬─────┬──────△
//!    seg 0   seg 1   seg 0  seg 1 seg 2
//!   └──── Span 0 ───┘└───── Span 1 ────┘
//! ```
//!
//! ## Exact Splitting
//!
//! [`build_model`] works on [`Exact`] rational positions: a load location is
//! compared against node and segment boundaries exactly, so a load placed on
//! a node never creates a zero-length sliver. Segment lengths are converted
//! to `f64` only after all splitting is finished.

use log::debug;
use serde::{Deserialize, Serialize};

use super::continuous_beam::{AnalysisOptions, ContinuousBeamInput};
use super::superposition::PatternScheme;
use crate::errors::{CalcError, CalcResult};
use crate::exact::Exact;
use crate::loads::{
    combination_set, DiscreteLoad, LoadDistribution, LoadTable, LoadType, NUM_LOAD_SLOTS,
    SERVICE_SET,
};

// =============================================================================
// FIXITY
// =============================================================================

/// Support condition at a node
///
/// The fixity alone decides how many displacement unknowns a node adds to
/// the structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fixity {
    /// No support; the beam runs through (a free end when exterior)
    ///
    /// - Unknowns: translation + rotation
    Continuous,

    /// Clamped support
    ///
    /// - Unknowns: none
    /// - Reactions: force and moment
    Fixed,

    /// Pinned/roller support
    ///
    /// - Unknowns: rotation
    /// - Reactions: force
    Pinned,

    /// Unsupported internal hinge
    ///
    /// - Unknowns: translation + left rotation + right rotation
    Hinge,

    /// Internal hinge sitting on a support
    ///
    /// - Unknowns: left rotation + right rotation
    /// - Reactions: force
    ProppedHinge,

    /// Elastic (spring) support
    ///
    /// - Unknowns: translation + rotation
    /// - Reactions: spring force `-k·δ`
    Spring,
}

impl Fixity {
    pub const ALL: [Fixity; 6] = [
        Fixity::Continuous,
        Fixity::Fixed,
        Fixity::Pinned,
        Fixity::Hinge,
        Fixity::ProppedHinge,
        Fixity::Spring,
    ];

    /// Parse a fixity code (case-insensitive)
    ///
    /// # Example
    /// ```
    /// use beam_core::calculations::model::Fixity;
    ///
    /// assert_eq!(Fixity::from_code("PH"), Some(Fixity::ProppedHinge));
    /// assert_eq!(Fixity::from_code("pinned"), Some(Fixity::Pinned));
    /// assert_eq!(Fixity::from_code("q"), None);
    /// ```
    pub fn from_code(code: &str) -> Option<Fixity> {
        match code.trim().to_ascii_lowercase().as_str() {
            "c" | "continuous" => Some(Fixity::Continuous),
            "f" | "fixed" => Some(Fixity::Fixed),
            "p" | "pinned" => Some(Fixity::Pinned),
            "h" | "hinge" => Some(Fixity::Hinge),
            "ph" | "propped-hinge" => Some(Fixity::ProppedHinge),
            "s" | "spring" => Some(Fixity::Spring),
            _ => None,
        }
    }

    /// Short code
    pub fn code(&self) -> &'static str {
        match self {
            Fixity::Continuous => "c",
            Fixity::Fixed => "f",
            Fixity::Pinned => "p",
            Fixity::Hinge => "h",
            Fixity::ProppedHinge => "ph",
            Fixity::Spring => "s",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Fixity::Continuous => "Continuous",
            Fixity::Fixed => "Fixed",
            Fixity::Pinned => "Pinned",
            Fixity::Hinge => "Hinge",
            Fixity::ProppedHinge => "Propped Hinge",
            Fixity::Spring => "Spring",
        }
    }

    /// Displacement unknowns contributed by a node of this fixity
    pub fn num_dof(&self) -> usize {
        match self {
            Fixity::Fixed => 0,
            Fixity::Pinned => 1,
            Fixity::Hinge => 3,
            Fixity::Continuous | Fixity::ProppedHinge | Fixity::Spring => 2,
        }
    }

    /// Returns true if this support restrains vertical displacement
    pub fn restrains_translation(&self) -> bool {
        matches!(self, Fixity::Fixed | Fixity::Pinned | Fixity::ProppedHinge)
    }

    /// Returns true if this support restrains rotation
    pub fn restrains_rotation(&self) -> bool {
        matches!(self, Fixity::Fixed)
    }

    /// Whether a vertical reaction develops at this node
    pub fn has_force_reaction(&self) -> bool {
        self.restrains_translation() || matches!(self, Fixity::Spring)
    }

    /// Whether the adjoining spans rotate independently at this node
    pub fn releases_moment(&self) -> bool {
        matches!(self, Fixity::Hinge | Fixity::ProppedHinge)
    }
}

impl std::fmt::Display for Fixity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// MODEL RECORDS
// =============================================================================

/// A support location between (or at the ends of) spans
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub fixity: Fixity,

    /// Spring stiffness (force per length); zero unless the fixity is `Spring`
    pub spring_constant: f64,

    /// Distance from the left end of the beam
    pub x: f64,

    /// Applied point force per load slot (positive downward)
    pub p: LoadTable,

    /// Applied moment per load slot (positive counter-clockwise)
    pub m: LoadTable,
}

impl Node {
    /// Whether any node load exists in the given slot
    pub fn is_loaded(&self, slot: usize) -> bool {
        self.p[slot] != 0.0 || self.m[slot] != 0.0
    }
}

/// A piece of a span with linearly varying load and concentrated loads at its left end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub length: f64,

    /// Distance of the segment's left end from the span's left end
    pub x_left: f64,

    /// Point force at the left end, per slot (positive downward)
    pub p: LoadTable,

    /// Applied moment at the left end, per slot (positive counter-clockwise)
    pub m: LoadTable,

    /// Distributed intensity at the left end, per slot (positive downward)
    pub w1: LoadTable,

    /// Distributed intensity at the right end, per slot
    pub w2: LoadTable,
}

impl Segment {
    /// Distance of the segment's right end from the span's left end
    pub fn x_right(&self) -> f64 {
        self.x_left + self.length
    }

    /// Whether the segment carries any load in the given slot
    pub fn is_loaded(&self, slot: usize) -> bool {
        self.p[slot] != 0.0 || self.m[slot] != 0.0 || self.w1[slot] != 0.0 || self.w2[slot] != 0.0
    }
}

/// One span between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub length: f64,
    pub segments: Vec<Segment>,
}

impl Span {
    /// Whether any segment carries load in the given slot
    pub fn is_loaded(&self, slot: usize) -> bool {
        self.segments.iter().any(|s| s.is_loaded(slot))
    }
}

/// Beam-wide constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beam {
    /// Elastic modulus (1.0 together with `i == 1.0` means "not given")
    pub e: f64,

    /// Moment of inertia
    pub i: f64,

    /// Which load slots carry any load
    pub present: [bool; NUM_LOAD_SLOTS],

    /// Total structure displacement unknowns
    pub num_dof: usize,

    /// How patternable loads are placed span by span
    pub pattern_scheme: PatternScheme,

    /// Number of live-load patterns
    pub num_patterns: usize,

    /// Combination set the superposer runs
    pub combination_set: String,
}

impl Beam {
    /// Flexural rigidity
    pub fn ei(&self) -> f64 {
        self.e * self.i
    }

    /// Deflections are only computed when real section properties were given
    pub fn deflection_enabled(&self) -> bool {
        !(self.e == 1.0 && self.i == 1.0)
    }

    /// Whether any live, roof live or snow load is present
    pub fn has_patternable_load(&self) -> bool {
        LoadType::PATTERNABLE.iter().any(|t| self.present[t.slot()])
    }

    /// Whether the service set (aggregate slot only) is being run
    pub fn is_service(&self) -> bool {
        self.combination_set == SERVICE_SET
    }
}

/// A fully built beam model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub beam: Beam,
    pub nodes: Vec<Node>,
    pub spans: Vec<Span>,
}

impl Model {
    pub fn num_spans(&self) -> usize {
        self.spans.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Total length of all spans
    pub fn total_length(&self) -> f64 {
        self.nodes.last().map(|n| n.x).unwrap_or(0.0)
    }

    /// Distance of span `index`'s left end from the left end of the beam
    pub fn span_start(&self, index: usize) -> f64 {
        self.nodes[index].x
    }

    pub fn num_segments(&self) -> usize {
        self.spans.iter().map(|s| s.segments.len()).sum()
    }
}

// =============================================================================
// MODEL BUILDER
// =============================================================================

#[derive(Debug, Clone)]
struct DraftSegment {
    start: Exact,
    end: Exact,
    p: LoadTable,
    m: LoadTable,
    w1: LoadTable,
    w2: LoadTable,
}

impl DraftSegment {
    fn empty(start: Exact, end: Exact) -> Self {
        Self {
            start,
            end,
            p: [0.0; NUM_LOAD_SLOTS],
            m: [0.0; NUM_LOAD_SLOTS],
            w1: [0.0; NUM_LOAD_SLOTS],
            w2: [0.0; NUM_LOAD_SLOTS],
        }
    }

    /// Cut at `at`, keeping `[start, at]` and returning `[at, end]`.
    ///
    /// Intensities are interpolated at the cut; the right piece starts with
    /// no concentrated load.
    fn split(&mut self, at: Exact) -> DraftSegment {
        let t = at
            .fraction_between(&self.start, &self.end)
            .map(|t| t.to_f64())
            .unwrap_or(0.0);
        let mut right = DraftSegment::empty(at.clone(), self.end.clone());
        for slot in 0..NUM_LOAD_SLOTS {
            let w_cut = self.w1[slot] + (self.w2[slot] - self.w1[slot]) * t;
            right.w1[slot] = w_cut;
            right.w2[slot] = self.w2[slot];
            self.w2[slot] = w_cut;
        }
        self.end = at;
        right
    }
}

#[derive(Debug, Clone)]
struct DraftSpan {
    start: Exact,
    end: Exact,
    segments: Vec<DraftSegment>,
}

struct ModelDraft {
    node_x: Vec<Exact>,
    node_p: Vec<LoadTable>,
    node_m: Vec<LoadTable>,
    spans: Vec<DraftSpan>,
}

impl ModelDraft {
    fn new(lengths: &[Exact]) -> Self {
        let mut node_x = Vec::with_capacity(lengths.len() + 1);
        let mut x = Exact::zero();
        node_x.push(x.clone());
        let mut spans = Vec::with_capacity(lengths.len());
        for length in lengths {
            let end = &x + length;
            spans.push(DraftSpan {
                start: x.clone(),
                end: end.clone(),
                segments: vec![DraftSegment::empty(x, end.clone())],
            });
            node_x.push(end.clone());
            x = end;
        }
        let n = node_x.len();
        Self {
            node_x,
            node_p: vec![[0.0; NUM_LOAD_SLOTS]; n],
            node_m: vec![[0.0; NUM_LOAD_SLOTS]; n],
            spans,
        }
    }

    fn total_length(&self) -> Exact {
        self.node_x.last().cloned().unwrap_or_default()
    }

    fn node_at(&self, x: &Exact) -> Option<usize> {
        self.node_x.iter().position(|n| n == x)
    }

    /// Place a segment boundary at `x` unless one is already there
    fn split_at(&mut self, x: &Exact) {
        if self.node_at(x).is_some() {
            return;
        }
        let Some(span) = self.spans.iter_mut().find(|s| &s.start < x && x < &s.end) else {
            return;
        };
        if let Some(index) = span.segments.iter().position(|s| &s.start < x && x < &s.end) {
            let right = span.segments[index].split(x.clone());
            span.segments.insert(index + 1, right);
        }
    }

    fn segment_starting_at(&mut self, x: &Exact) -> Option<&mut DraftSegment> {
        self.spans
            .iter_mut()
            .flat_map(|s| s.segments.iter_mut())
            .find(|s| &s.start == x)
    }

    fn add_concentrated(&mut self, slots: &[usize], x: &Exact, force: f64, moment: f64) -> CalcResult<()> {
        if let Some(j) = self.node_at(x) {
            for &slot in slots {
                self.node_p[j][slot] += force;
                self.node_m[j][slot] += moment;
            }
            return Ok(());
        }
        let segment = self
            .segment_starting_at(x)
            .ok_or_else(|| CalcError::internal(format!("no segment boundary at {}", x)))?;
        for &slot in slots {
            segment.p[slot] += force;
            segment.m[slot] += moment;
        }
        Ok(())
    }

    fn add_distributed(&mut self, slots: &[usize], start: &Exact, end: &Exact, w_start: f64, w_end: f64) {
        let intensity = |x: &Exact| {
            let t = x.fraction_between(start, end).map(|t| t.to_f64()).unwrap_or(0.0);
            w_start + (w_end - w_start) * t
        };
        for segment in self.spans.iter_mut().flat_map(|s| s.segments.iter_mut()) {
            if &segment.start >= start && &segment.end <= end {
                let w1 = intensity(&segment.start);
                let w2 = intensity(&segment.end);
                for &slot in slots {
                    segment.w1[slot] += w1;
                    segment.w2[slot] += w2;
                }
            }
        }
    }

    fn add_load(&mut self, load: &DiscreteLoad) -> CalcResult<()> {
        let total_length = self.total_length();
        for x in load.distribution.cut_positions(&total_length) {
            self.split_at(&x);
        }
        let slots = load.slots();
        match &load.distribution {
            LoadDistribution::Point { position } => {
                self.add_concentrated(&slots, position, load.effective_magnitude(), 0.0)
            }
            LoadDistribution::Moment { position } => {
                self.add_concentrated(&slots, position, 0.0, load.effective_magnitude())
            }
            distribution => {
                if let Some((start, end)) = distribution.extent(&total_length) {
                    let (w_start, w_end) = load.intensities();
                    self.add_distributed(&slots, &start, &end, w_start, w_end);
                }
                Ok(())
            }
        }
    }
}

fn parse_supports(input: &ContinuousBeamInput) -> CalcResult<Vec<(Fixity, f64)>> {
    let last = input.supports.len() - 1;
    input
        .supports
        .iter()
        .enumerate()
        .map(|(j, support)| {
            let field = format!("supports[{}]", j);
            let fixity = Fixity::from_code(&support.code).ok_or_else(|| {
                CalcError::invalid_input(&field, &support.code, "Unrecognized fixity code")
            })?;

            if fixity.releases_moment() && (j == 0 || j == last) {
                return Err(CalcError::invalid_input(
                    &field,
                    &support.code,
                    "A hinge must be at an interior node",
                ));
            }

            let spring_constant = if fixity == Fixity::Spring {
                let k = support
                    .spring_constant
                    .ok_or_else(|| CalcError::missing_field(format!("{}.spring_constant", field)))?;
                if !(k.is_finite() && k > 0.0) {
                    return Err(CalcError::invalid_input(
                        format!("{}.spring_constant", field),
                        k.to_string(),
                        "Spring constant must be positive",
                    ));
                }
                k
            } else {
                0.0
            };
            Ok((fixity, spring_constant))
        })
        .collect()
}

fn section_properties(input: &ContinuousBeamInput) -> CalcResult<(f64, f64)> {
    let check = |field: &str, value: f64| -> CalcResult<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(CalcError::invalid_input(field, value.to_string(), "Must be positive"))
        }
    };
    match (input.e, input.i) {
        (Some(e), Some(i)) => Ok((check("e", e)?, check("i", i)?)),
        (None, None) => Ok((1.0, 1.0)),
        (Some(_), None) => Err(CalcError::missing_field("i")),
        (None, Some(_)) => Err(CalcError::missing_field("e")),
    }
}

/// Build a [`Model`] from validated beam input.
///
/// All input problems are reported here, before any matrix work starts.
///
/// # Errors
///
/// - No spans, or a support count other than spans + 1
/// - Unrecognized fixity code, or a hinge at an exterior node
/// - Spring support without a positive spring constant
/// - Non-positive span length, E or I
/// - A load outside the beam, or a distributed load with start >= end
/// - An untyped load when the combination set is not `service`
/// - An unknown combination set
///
/// # Example
/// ```
/// use beam_core::calculations::continuous_beam::{AnalysisOptions, ContinuousBeamInput};
/// use beam_core::calculations::model::build_model;
/// use beam_core::loads::{DiscreteLoad, LoadType};
///
/// let input = ContinuousBeamInput::from_codes(&["4.3", "5.8"], &["p", "p", "p"])
///     .unwrap()
///     .with_load(DiscreteLoad::point(LoadType::Live, 1000.0, "10.1".parse().unwrap()));
/// let model = build_model(&input, &AnalysisOptions::default()).unwrap();
///
/// // The load lands exactly on the last node, so no segment is split
/// assert_eq!(model.num_segments(), 2);
/// assert_eq!(model.nodes[2].p[LoadType::Live.slot()], 1000.0);
/// ```
pub fn build_model(input: &ContinuousBeamInput, options: &AnalysisOptions) -> CalcResult<Model> {
    if input.spans.is_empty() {
        return Err(CalcError::invalid_input("spans", "0", "At least one span is required"));
    }
    let expected_supports = input.spans.len() + 1;
    if input.supports.len() != expected_supports {
        return Err(CalcError::invalid_input(
            "supports",
            input.supports.len().to_string(),
            format!("Expected {} supports for {} spans", expected_supports, input.spans.len()),
        ));
    }
    for (i, length) in input.spans.iter().enumerate() {
        if !length.is_positive() {
            return Err(CalcError::invalid_input(
                format!("spans[{}]", i),
                length.to_string(),
                "Span length must be positive",
            ));
        }
    }

    let supports = parse_supports(input)?;
    let (e, i) = section_properties(input)?;
    combination_set(&options.combination_set)?;
    let is_service = options.combination_set == SERVICE_SET;

    let mut draft = ModelDraft::new(&input.spans);
    let total_length = draft.total_length();
    let mut present = [false; NUM_LOAD_SLOTS];

    for (index, load) in input.loads.iter().enumerate() {
        load.validate(index, &total_length)?;
        if load.load_type.is_none() && !is_service {
            return Err(CalcError::missing_field(format!("loads[{}].load_type", index)));
        }
        if !load.is_nonzero() {
            continue;
        }
        for slot in load.slots() {
            present[slot] = true;
        }
        draft.add_load(load)?;
    }

    let nodes: Vec<Node> = supports
        .iter()
        .enumerate()
        .map(|(j, (fixity, spring_constant))| Node {
            fixity: *fixity,
            spring_constant: *spring_constant,
            x: draft.node_x[j].to_f64(),
            p: draft.node_p[j],
            m: draft.node_m[j],
        })
        .collect();

    let spans: Vec<Span> = draft
        .spans
        .iter()
        .map(|span| Span {
            length: (&span.end - &span.start).to_f64(),
            segments: span
                .segments
                .iter()
                .map(|s| Segment {
                    length: (&s.end - &s.start).to_f64(),
                    x_left: (&s.start - &span.start).to_f64(),
                    p: s.p,
                    m: s.m,
                    w1: s.w1,
                    w2: s.w2,
                })
                .collect(),
        })
        .collect();

    let num_dof = nodes.iter().map(|n| n.fixity.num_dof()).sum();
    let has_patternable = !is_service && LoadType::PATTERNABLE.iter().any(|t| present[t.slot()]);
    let pattern_scheme = PatternScheme::resolve(options.patterning, has_patternable);
    let num_patterns = pattern_scheme.num_patterns(spans.len());

    let model = Model {
        beam: Beam {
            e,
            i,
            present,
            num_dof,
            pattern_scheme,
            num_patterns,
            combination_set: options.combination_set.clone(),
        },
        nodes,
        spans,
    };

    debug!(
        "built model: {} spans, {} segments, {} dof, {:?} patterning ({} patterns)",
        model.num_spans(),
        model.num_segments(),
        model.beam.num_dof,
        model.beam.pattern_scheme,
        model.beam.num_patterns
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::continuous_beam::{PatternMode, SupportInput};

    fn ex(s: &str) -> Exact {
        s.parse().unwrap()
    }

    fn two_span() -> ContinuousBeamInput {
        ContinuousBeamInput::from_codes(&["10", "12"], &["p", "p", "p"]).unwrap()
    }

    fn build(input: &ContinuousBeamInput) -> CalcResult<Model> {
        build_model(input, &AnalysisOptions::default())
    }

    #[test]
    fn test_fixity_codes() {
        for fixity in Fixity::ALL {
            assert_eq!(Fixity::from_code(fixity.code()), Some(fixity));
        }
        assert_eq!(Fixity::from_code("Propped-Hinge"), Some(Fixity::ProppedHinge));
        assert_eq!(Fixity::from_code(" S "), Some(Fixity::Spring));
    }

    #[test]
    fn test_fixity_dof_counts() {
        assert_eq!(Fixity::Fixed.num_dof(), 0);
        assert_eq!(Fixity::Pinned.num_dof(), 1);
        assert_eq!(Fixity::Hinge.num_dof(), 3);
        assert_eq!(Fixity::Continuous.num_dof(), 2);
        assert_eq!(Fixity::ProppedHinge.num_dof(), 2);
        assert_eq!(Fixity::Spring.num_dof(), 2);
    }

    #[test]
    fn test_node_positions_and_dof() {
        let model = build(&two_span()).unwrap();
        assert_eq!(model.num_nodes(), 3);
        assert_eq!(model.nodes[1].x, 10.0);
        assert_eq!(model.total_length(), 22.0);
        assert_eq!(model.beam.num_dof, 3);
        assert!(!model.beam.deflection_enabled());
    }

    #[test]
    fn test_validation_no_spans() {
        let input = ContinuousBeamInput::from_codes(&[], &["p"]).unwrap();
        let err = build(&input).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_validation_wrong_support_count() {
        let input = ContinuousBeamInput::from_codes(&["10"], &["p", "p", "p"]).unwrap();
        assert!(build(&input).is_err());
    }

    #[test]
    fn test_validation_unknown_fixity() {
        let input = ContinuousBeamInput::from_codes(&["10"], &["p", "x"]).unwrap();
        let err = build(&input).unwrap_err();
        assert!(err.to_string().contains("supports[1]"));
    }

    #[test]
    fn test_validation_spring_needs_constant() {
        let mut input = ContinuousBeamInput::from_codes(&["10"], &["f", "s"]).unwrap();
        assert_eq!(build(&input).unwrap_err().error_code(), "MISSING_FIELD");

        input.supports[1] = SupportInput::spring(-5.0);
        assert_eq!(build(&input).unwrap_err().error_code(), "INVALID_INPUT");

        input.supports[1] = SupportInput::spring(500.0);
        let model = build(&input).unwrap();
        assert_eq!(model.nodes[1].spring_constant, 500.0);
    }

    #[test]
    fn test_validation_exterior_hinge() {
        let input = ContinuousBeamInput::from_codes(&["10", "10"], &["h", "p", "p"]).unwrap();
        assert!(build(&input).is_err());

        let input = ContinuousBeamInput::from_codes(&["10", "10"], &["f", "h", "p"]).unwrap();
        assert_eq!(build(&input).unwrap().beam.num_dof, 4);
    }

    #[test]
    fn test_validation_untyped_load() {
        let input = two_span().with_load(DiscreteLoad::uniform(LoadType::Dead, 10.0).untyped());
        let err = build(&input).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");

        let service = AnalysisOptions::service();
        let model = build_model(&input, &service).unwrap();
        assert!(model.beam.present[0]);
        assert!(!model.beam.present[LoadType::Dead.slot()]);
    }

    #[test]
    fn test_validation_section_properties() {
        let mut input = two_span();
        input.e = Some(29000.0);
        assert_eq!(build(&input).unwrap_err().error_code(), "MISSING_FIELD");
        input.i = Some(-1.0);
        assert_eq!(build(&input).unwrap_err().error_code(), "INVALID_INPUT");
        input.i = Some(100.0);
        assert!(build(&input).unwrap().beam.deflection_enabled());
    }

    #[test]
    fn test_point_load_splits_segment() {
        let input = two_span().with_load(DiscreteLoad::point(LoadType::Live, 500.0, ex("4")));
        let model = build(&input).unwrap();
        let span = &model.spans[0];
        assert_eq!(span.segments.len(), 2);
        assert_eq!(span.segments[0].length, 4.0);
        assert_eq!(span.segments[1].x_left, 4.0);
        assert_eq!(span.segments[1].p[LoadType::Live.slot()], 500.0);
        assert_eq!(span.segments[1].p[0], 500.0);
        assert_eq!(span.segments[0].p[0], 0.0);
    }

    #[test]
    fn test_load_on_node_does_not_split() {
        let input = two_span()
            .with_load(DiscreteLoad::point(LoadType::Dead, 300.0, ex("10")))
            .with_load(DiscreteLoad::moment(LoadType::Dead, 50.0, ex("0")));
        let model = build(&input).unwrap();
        assert_eq!(model.num_segments(), 2);
        assert_eq!(model.nodes[1].p[LoadType::Dead.slot()], 300.0);
        assert_eq!(model.nodes[0].m[LoadType::Dead.slot()], 50.0);
    }

    #[test]
    fn test_exact_positions_avoid_slivers() {
        let input = ContinuousBeamInput::from_codes(&["0.1", "0.2"], &["p", "p", "p"])
            .unwrap()
            .with_load(DiscreteLoad::point(LoadType::Dead, 1.0, ex("0.3")))
            .with_load(DiscreteLoad::partial_uniform(LoadType::Dead, 5.0, ex("0.1"), ex("0.3")));
        let model = build(&input).unwrap();
        assert_eq!(model.num_segments(), 2);
        assert_eq!(model.nodes[2].p[LoadType::Dead.slot()], 1.0);
        assert_eq!(model.spans[1].segments[0].w1[LoadType::Dead.slot()], 5.0);
        assert_eq!(model.spans[0].segments[0].w1[LoadType::Dead.slot()], 0.0);
    }

    #[test]
    fn test_split_interpolates_existing_load() {
        // Trapezoid 0 → 100 over the first span, then a point load at 2.5 splits it
        let input = two_span()
            .with_load(DiscreteLoad::trapezoidal(LoadType::Snow, ex("0"), ex("10"), 0.0, 100.0))
            .with_load(DiscreteLoad::point(LoadType::Snow, 10.0, ex("2.5")));
        let model = build(&input).unwrap();
        let segs = &model.spans[0].segments;
        let s = LoadType::Snow.slot();
        assert_eq!(segs.len(), 2);
        assert!((segs[0].w2[s] - 25.0).abs() < 1e-12);
        assert!((segs[1].w1[s] - 25.0).abs() < 1e-12);
        assert_eq!(segs[1].w2[s], 100.0);
        assert_eq!(segs[1].p[s], 10.0);
    }

    #[test]
    fn test_distributed_load_across_node() {
        let input = two_span().with_load(DiscreteLoad::trapezoidal(
            LoadType::Dead,
            ex("5"),
            ex("15"),
            10.0,
            30.0,
        ));
        let model = build(&input).unwrap();
        let d = LoadType::Dead.slot();
        let first = &model.spans[0].segments[1];
        assert_eq!(first.x_left, 5.0);
        assert_eq!((first.w1[d], first.w2[d]), (10.0, 20.0));
        let second = &model.spans[1].segments[0];
        assert_eq!((second.w1[d], second.w2[d]), (20.0, 30.0));
        assert_eq!(model.spans[1].segments[1].w1[d], 0.0);
    }

    #[test]
    fn test_segments_are_contiguous() {
        let input = two_span()
            .with_load(DiscreteLoad::point(LoadType::Live, 1.0, ex("37/3")))
            .with_load(DiscreteLoad::partial_uniform(LoadType::Live, 1.0, ex("1.25"), ex("16")));
        let model = build(&input).unwrap();
        for span in &model.spans {
            let mut x = 0.0;
            for seg in &span.segments {
                assert!((seg.x_left - x).abs() < 1e-12);
                assert!(seg.length > 0.0);
                x = seg.x_right();
            }
            assert!((x - span.length).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pattern_count_follows_loads() {
        let dead_only = two_span().with_load(DiscreteLoad::uniform(LoadType::Dead, 10.0));
        assert_eq!(build(&dead_only).unwrap().beam.num_patterns, 1);

        let with_live = dead_only.clone().with_load(DiscreteLoad::uniform(LoadType::Live, 10.0));
        assert_eq!(build(&with_live).unwrap().beam.num_patterns, 3);

        let options = AnalysisOptions::default().with_patterning(PatternMode::None);
        assert_eq!(build_model(&with_live, &options).unwrap().beam.num_patterns, 1);
    }
}
