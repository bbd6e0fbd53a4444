//! # Pattern / Combination Superposer
//!
//! Scales the per-load-type responses by each applicable combination's load
//! factors, once per live-load pattern, and tracks the governing shear,
//! moment, deflection and reaction extremes.
//!
//! ## Comberns
//!
//! One pass of the superposition loop is a (combination, pattern) pair,
//! numbered `combern = combination × num_patterns + pattern`. Combination 0
//! is the unit-factor deflection pass; combinations `1..=N` are the rows of
//! the active set that apply to the loads present.
//!
//! ## Segment Functions
//!
//! Within a segment of length `ls`, with `x` measured from its left end:
//!
//! ```text
//! w(x) = w1f + slope·x
//! V(x) = V1 - w1f·x - slope·x²/2
//! M(x) = M1 + V1·x - w1f·x²/2 - slope·x³/6
//! ```
//!
//! Moment extremes sit where `V(x) = 0`, shear extremes where `w(x) = 0`.

use log::debug;
use serde::{Deserialize, Serialize};

use super::continuous_beam::PatternMode;
use super::model::{Model, Span};
use super::solve::{LoadCaseResponse, LoadTypeSolution, Reaction, TypeResponse};
use super::stiffness::SpanEnds;
use crate::errors::CalcResult;
use crate::loads::{combination_set, LoadTable, LoadType, AGGREGATE_SLOT, NUM_LOAD_SLOTS};

/// Above this many spans full patterning falls back to checkerboard
pub const MAX_FULL_PATTERN_SPANS: usize = 7;

/// Shear tracker updates must exceed this magnitude
pub const SHEAR_NOISE_FLOOR: f64 = 0.01;

/// Moment tracker updates must exceed this fraction of the global moment range
pub const MOMENT_NOISE_FRACTION: f64 = 0.05;

/// Name given to combination 0
pub const DEFLECTION_PASS: &str = "Deflection";

const ROOT_ITERATIONS: usize = 60;
const INTERIOR_MARGIN: f64 = 1e-9;

// =============================================================================
// PATTERNS
// =============================================================================

/// How patternable loads are distributed over the spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternScheme {
    /// Every span loaded at once
    Single,
    /// All spans, then even spans, then odd spans
    Checkerboard,
    /// Every non-empty subset of spans
    Full,
}

impl PatternScheme {
    /// Scheme for a beam given the requested mode and whether any
    /// patternable load is present
    pub fn resolve(mode: PatternMode, has_patternable_load: bool) -> Self {
        if !has_patternable_load {
            return PatternScheme::Single;
        }
        match mode {
            PatternMode::None => PatternScheme::Single,
            PatternMode::Checkerboard => PatternScheme::Checkerboard,
            PatternMode::Full => PatternScheme::Full,
        }
    }

    pub fn is_patterned(&self) -> bool {
        !matches!(self, PatternScheme::Single)
    }

    /// Number of patterns for a beam of `num_spans` spans
    ///
    /// A single span has only the loaded pattern. Checkerboard adds the
    /// even-span and odd-span layouts to it; full patterning takes every
    /// non-empty subset of spans.
    ///
    /// # Example
    /// ```
    /// use beam_core::calculations::superposition::PatternScheme;
    ///
    /// assert_eq!(PatternScheme::Single.num_patterns(4), 1);
    /// assert_eq!(PatternScheme::Checkerboard.num_patterns(1), 1);
    /// assert_eq!(PatternScheme::Checkerboard.num_patterns(4), 3);
    /// assert_eq!(PatternScheme::Full.num_patterns(4), 15);
    /// assert_eq!(PatternScheme::Full.num_patterns(9), 3);
    /// ```
    pub fn num_patterns(&self, num_spans: usize) -> usize {
        match self {
            PatternScheme::Single => 1,
            _ if num_spans <= 1 => 1,
            PatternScheme::Full if num_spans <= MAX_FULL_PATTERN_SPANS => (1 << num_spans) - 1,
            _ => 3,
        }
    }

    /// Whether span `span` carries patterned load in pattern `pattern`
    ///
    /// Full pattern `p` loads the spans whose bits are set in `p + 1`.
    /// Checkerboard pattern 0 loads every span, 1 the even spans, 2 the odd.
    pub fn span_loaded(&self, pattern: usize, span: usize, num_spans: usize) -> bool {
        match self {
            PatternScheme::Single => true,
            PatternScheme::Full if num_spans <= MAX_FULL_PATTERN_SPANS => ((pattern + 1) >> span) & 1 == 1,
            _ => pattern == 0 || span % 2 == (pattern - 1) % 2,
        }
    }
}

/// Share of a patterned load applied to a span or node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Full,
    Half,
    None,
}

impl Placement {
    pub fn factor(self) -> f64 {
        match self {
            Placement::Full => 1.0,
            Placement::Half => 0.5,
            Placement::None => 0.0,
        }
    }
}

/// Which spans one pattern loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternLayout {
    loaded: Vec<bool>,
}

impl PatternLayout {
    pub fn new(scheme: PatternScheme, pattern: usize, num_spans: usize) -> Self {
        Self {
            loaded: (0..num_spans)
                .map(|k| scheme.span_loaded(pattern, k, num_spans))
                .collect(),
        }
    }

    pub fn loaded_spans(&self) -> Vec<usize> {
        self.loaded
            .iter()
            .enumerate()
            .filter(|(_, loaded)| **loaded)
            .map(|(k, _)| k)
            .collect()
    }

    fn is_loaded(&self, span: Option<usize>) -> bool {
        span.and_then(|k| self.loaded.get(k)).copied().unwrap_or(false)
    }

    /// Placement on a span; `half_adjacent` loads neighbours of loaded spans at half
    pub fn span_placement(&self, span: usize, half_adjacent: bool) -> Placement {
        if self.is_loaded(Some(span)) {
            Placement::Full
        } else if half_adjacent
            && (self.is_loaded(span.checked_sub(1)) || self.is_loaded(Some(span + 1)))
        {
            Placement::Half
        } else {
            Placement::None
        }
    }

    /// Placement on a node: the strongest placement of its adjoining spans
    pub fn node_placement(&self, node: usize, half_adjacent: bool) -> Placement {
        let adjoining = [node.checked_sub(1), Some(node).filter(|j| *j < self.loaded.len())];
        let placements: Vec<Placement> = adjoining
            .iter()
            .flatten()
            .map(|k| self.span_placement(*k, half_adjacent))
            .collect();
        if placements.contains(&Placement::Full) {
            Placement::Full
        } else if placements.contains(&Placement::Half) {
            Placement::Half
        } else {
            Placement::None
        }
    }
}

fn half_adjacent(slot: usize) -> bool {
    LoadType::from_slot(slot).map_or(false, |t| t.has_half_adjacent_loading())
}

// =============================================================================
// FACTORED RESPONSE
// =============================================================================

/// Factored sum of the per-type responses for one combern
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactoredResponse {
    pub member_actions: Vec<SpanEnds>,
    pub span_displacements: Vec<SpanEnds>,
    pub reactions: Vec<Reaction>,
}

impl FactoredResponse {
    fn zero(num_spans: usize, num_nodes: usize) -> Self {
        Self {
            member_actions: vec![SpanEnds::default(); num_spans],
            span_displacements: vec![SpanEnds::default(); num_spans],
            reactions: vec![Reaction::default(); num_nodes],
        }
    }

    fn add(&mut self, case: &LoadCaseResponse, weight: f64) {
        for (acc, a) in self.member_actions.iter_mut().zip(&case.member_actions) {
            acc.add_scaled(a, weight);
        }
        for (acc, d) in self.span_displacements.iter_mut().zip(&case.span_displacements) {
            acc.add_scaled(d, weight);
        }
        for (acc, r) in self.reactions.iter_mut().zip(&case.reactions) {
            acc.force += weight * r.force;
            acc.moment += weight * r.moment;
        }
    }
}

/// Sum `factor × response` over every slot, placing patterned cases per `layout`
pub fn factored_response(
    model: &Model,
    solution: &LoadTypeSolution,
    factors: &LoadTable,
    layout: &PatternLayout,
) -> FactoredResponse {
    let mut out = FactoredResponse::zero(model.num_spans(), model.num_nodes());
    for (slot, factor) in factors.iter().enumerate() {
        if *factor == 0.0 {
            continue;
        }
        let Some(response) = solution.response(slot) else { continue };
        match response {
            TypeResponse::Single(case) => out.add(case, *factor),
            TypeResponse::Patterned { spans, nodes } => {
                let half = half_adjacent(slot);
                for (k, case) in spans.iter().enumerate() {
                    let weight = layout.span_placement(k, half).factor();
                    if weight != 0.0 {
                        out.add(case, factor * weight);
                    }
                }
                for (j, case) in nodes.iter().enumerate() {
                    let Some(case) = case else { continue };
                    let weight = layout.node_placement(j, half).factor();
                    if weight != 0.0 {
                        out.add(case, factor * weight);
                    }
                }
            }
        }
    }
    out
}

/// Effective per-slot weights of the segment loads on one span
fn span_weights(
    solution: &LoadTypeSolution,
    factors: &LoadTable,
    layout: &PatternLayout,
    span: usize,
) -> LoadTable {
    let mut weights = *factors;
    for (slot, weight) in weights.iter_mut().enumerate() {
        if solution.response(slot).map_or(false, TypeResponse::is_patterned) {
            *weight *= layout.span_placement(span, half_adjacent(slot)).factor();
        }
    }
    weights
}

fn weighted(values: &LoadTable, weights: &LoadTable) -> f64 {
    values.iter().zip(weights).map(|(v, w)| v * w).sum()
}

// =============================================================================
// SEGMENT FUNCTIONS
// =============================================================================

/// Which way an extreme runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Max,
    Min,
}

impl Sense {
    fn beats(self, candidate: f64, current: f64) -> bool {
        match self {
            Sense::Max => candidate > current,
            Sense::Min => candidate < current,
        }
    }
}

/// Factored load and left-end actions of a segment for one combern
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentActions {
    /// Distributed intensity at the left end (positive downward)
    pub w1f: f64,
    /// Change of intensity per unit length
    pub slope: f64,
    /// Shear just right of the left end
    pub v1: f64,
    /// Moment just right of the left end
    pub m1: f64,
}

impl SegmentActions {
    pub fn shear_at(&self, x: f64) -> f64 {
        self.v1 - self.w1f * x - self.slope * x * x / 2.0
    }

    pub fn moment_at(&self, x: f64) -> f64 {
        self.m1 + self.v1 * x - self.w1f * x * x / 2.0 - self.slope * x * x * x / 6.0
    }

    /// Rotation relative to the left end, given the left-end rotation
    pub fn rotation_at(&self, theta1: f64, ei: f64, x: f64) -> f64 {
        let x2 = x * x;
        theta1
            + (self.m1 * x + self.v1 * x2 / 2.0 - self.w1f * x2 * x / 6.0 - self.slope * x2 * x2 / 24.0)
                / ei
    }

    /// Deflection given the left-end deflection and rotation
    pub fn deflection_at(&self, y1: f64, theta1: f64, ei: f64, x: f64) -> f64 {
        let x2 = x * x;
        let x3 = x2 * x;
        y1 + theta1 * x
            + (self.m1 * x2 / 2.0 + self.v1 * x3 / 6.0
                - self.w1f * x2 * x2 / 24.0
                - self.slope * x3 * x2 / 120.0)
                / ei
    }

    /// Interior points where the shear vanishes (moment is stationary)
    pub fn zero_shear_points(&self, length: f64) -> Vec<f64> {
        let a = -self.slope / 2.0;
        let b = -self.w1f;
        let c = self.v1;
        let roots = if a == 0.0 {
            if b == 0.0 {
                Vec::new()
            } else {
                vec![-c / b]
            }
        } else {
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                Vec::new()
            } else {
                let q = -0.5 * (b + b.signum() * disc.sqrt());
                let mut r = vec![q / a];
                if q != 0.0 {
                    r.push(c / q);
                }
                r
            }
        };
        roots.into_iter().filter(|x| is_interior(*x, length)).collect()
    }

    /// Interior point where the distributed load vanishes (shear is stationary)
    pub fn zero_load_point(&self, length: f64) -> Option<f64> {
        if self.slope == 0.0 {
            return None;
        }
        Some(-self.w1f / self.slope).filter(|x| is_interior(*x, length))
    }

    /// Interior moment extreme for `sense`, else the value at mid-length
    pub fn mid_moment(&self, length: f64, sense: Sense) -> (f64, f64) {
        self.zero_shear_points(length)
            .into_iter()
            .map(|x| (x, self.moment_at(x)))
            .reduce(|best, c| if sense.beats(c.1, best.1) { c } else { best })
            .unwrap_or_else(|| (length / 2.0, self.moment_at(length / 2.0)))
    }

    /// Interior shear extreme, else the value at mid-length
    pub fn mid_shear(&self, length: f64) -> (f64, f64) {
        let x = self.zero_load_point(length).unwrap_or(length / 2.0);
        (x, self.shear_at(x))
    }

    /// Interior points where the moment vanishes.
    ///
    /// The moment is monotonic between zero-shear points, so each piece
    /// holds at most one root.
    fn zero_moment_points(&self, length: f64) -> Vec<f64> {
        monotone_roots(|x| self.moment_at(x), self.zero_shear_points(length), length)
    }

    /// Interior points where the rotation vanishes; the rotation is
    /// monotonic between zero-moment points
    fn zero_rotation_points(&self, theta1: f64, ei: f64, length: f64) -> Vec<f64> {
        monotone_roots(
            |x| self.rotation_at(theta1, ei, x),
            self.zero_moment_points(length),
            length,
        )
    }
}

fn is_interior(x: f64, length: f64) -> bool {
    x.is_finite() && x > INTERIOR_MARGIN * length && x < (1.0 - INTERIOR_MARGIN) * length
}

/// Interior roots of `f` on `[0, length]`, where `breaks` cut the interval
/// into pieces on which `f` is monotonic
fn monotone_roots(f: impl Fn(f64) -> f64, mut breaks: Vec<f64>, length: f64) -> Vec<f64> {
    breaks.push(0.0);
    breaks.push(length);
    breaks.sort_by(f64::total_cmp);

    let mut roots = Vec::new();
    for piece in breaks.windows(2) {
        let (mut lo, mut hi) = (piece[0], piece[1]);
        let (f_lo, f_hi) = (f(lo), f(hi));
        if f_lo == 0.0 {
            roots.push(lo);
            continue;
        }
        if f_hi == 0.0 || f_lo * f_hi > 0.0 {
            continue;
        }
        let rising = f_hi > f_lo;
        for _ in 0..ROOT_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            if (f(mid) < 0.0) == rising {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        roots.push(0.5 * (lo + hi));
    }
    roots.retain(|x| is_interior(*x, length));
    roots
}

/// Segment functions of one span for one combern, walked left to right
fn walk_span(span: &Span, actions: &SpanEnds, weights: &LoadTable) -> Vec<SegmentActions> {
    let mut v = actions.left_shear;
    let mut m = -actions.left_moment;
    span.segments
        .iter()
        .map(|seg| {
            v -= weighted(&seg.p, weights);
            m -= weighted(&seg.m, weights);
            let w1f = weighted(&seg.w1, weights);
            let w2f = weighted(&seg.w2, weights);
            let segment = SegmentActions {
                w1f,
                slope: (w2f - w1f) / seg.length,
                v1: v,
                m1: m,
            };
            v = segment.shear_at(seg.length);
            m = segment.moment_at(seg.length);
            segment
        })
        .collect()
}

// =============================================================================
// TRACKERS
// =============================================================================

/// A running extreme and the combern that produced it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extreme {
    pub value: f64,
    pub combination: Option<usize>,
    /// Position within the segment (interior extremes only)
    pub x: Option<f64>,
}

impl Extreme {
    /// Record `value` if it strictly beats the running value and its
    /// magnitude clears `floor`
    pub fn offer(&mut self, sense: Sense, value: f64, floor: f64, combination: usize, x: Option<f64>) -> bool {
        if value.abs() > floor && sense.beats(value, self.value) {
            *self = Extreme {
                value,
                combination: Some(combination),
                x,
            };
            true
        } else {
            false
        }
    }
}

/// Extremes at the left end, interior and right end of a segment
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tracker {
    pub left: Extreme,
    pub mid: Extreme,
    pub right: Extreme,
}

impl Tracker {
    fn offer(&mut self, sense: Sense, left: f64, mid: (f64, f64), right: f64, floor: f64, combern: usize) {
        self.left.offer(sense, left, floor, combern, None);
        self.mid.offer(sense, mid.1, floor, combern, Some(mid.0));
        self.right.offer(sense, right, floor, combern, None);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentExtremes {
    pub v_max: Tracker,
    pub v_min: Tracker,
    pub m_max: Tracker,
    pub m_min: Tracker,
    /// Deflection extremes; `combination` holds the pattern index
    pub deflection_max: Extreme,
    pub deflection_min: Extreme,
}

impl SegmentExtremes {
    fn update(&mut self, length: f64, a: &SegmentActions, combern: usize, moment_floor: f64) {
        let (v_left, v_right) = (a.v1, a.shear_at(length));
        let (m_left, m_right) = (a.m1, a.moment_at(length));
        let v_mid = a.mid_shear(length);

        self.v_max.offer(Sense::Max, v_left, v_mid, v_right, SHEAR_NOISE_FLOOR, combern);
        self.v_min.offer(Sense::Min, v_left, v_mid, v_right, SHEAR_NOISE_FLOOR, combern);
        self.m_max.offer(
            Sense::Max,
            m_left,
            a.mid_moment(length, Sense::Max),
            m_right,
            moment_floor,
            combern,
        );
        self.m_min.offer(
            Sense::Min,
            m_left,
            a.mid_moment(length, Sense::Min),
            m_right,
            moment_floor,
            combern,
        );
    }
}

/// Per-combern scratch and the trackers of one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentState {
    pub actions: Vec<SegmentActions>,
    pub extremes: SegmentExtremes,
}

/// Mutable superposition state, kept apart from the immutable [`Model`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverState {
    pub num_patterns: usize,
    pub num_comberns: usize,
    /// Indexed `[span][segment]`
    pub segments: Vec<Vec<SegmentState>>,
}

impl SolverState {
    /// Preallocate scratch for every combern of every segment
    pub fn new(model: &Model, num_patterns: usize, num_comberns: usize) -> Self {
        let segments = model
            .spans
            .iter()
            .map(|span| {
                span.segments
                    .iter()
                    .map(|_| SegmentState {
                        actions: vec![SegmentActions::default(); num_comberns],
                        extremes: SegmentExtremes::default(),
                    })
                    .collect()
            })
            .collect();
        Self {
            num_patterns,
            num_comberns,
            segments,
        }
    }

    pub fn segment(&self, span: usize, segment: usize) -> &SegmentState {
        &self.segments[span][segment]
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// A beam-wide extreme with its location
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalExtreme {
    pub value: f64,
    pub combination: Option<usize>,
    pub span: usize,
    /// Distance from the left end of the beam
    pub x: f64,
}

impl GlobalExtreme {
    fn offer(&mut self, sense: Sense, value: f64, combination: usize, span: usize, x: f64) {
        if sense.beats(value, self.value) {
            *self = GlobalExtreme {
                value,
                combination: Some(combination),
                span,
                x,
            };
        }
    }
}

/// Factored reaction extremes at one node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReactionEnvelope {
    pub node: usize,
    pub x: f64,
    pub force_max: Extreme,
    pub force_min: Extreme,
    pub moment_max: Extreme,
    pub moment_min: Extreme,
}

/// What one combern is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombernInfo {
    pub index: usize,
    pub combination: String,
    pub equation: String,
    pub pattern: usize,
    pub loaded_spans: Vec<usize>,
}

/// Governing results over all comberns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub v_max: GlobalExtreme,
    pub v_min: GlobalExtreme,
    pub m_max: GlobalExtreme,
    pub m_min: GlobalExtreme,
    pub deflection_max: Option<GlobalExtreme>,
    pub deflection_min: Option<GlobalExtreme>,
    pub deflection_max_pattern: Option<usize>,
    pub deflection_min_pattern: Option<usize>,
    /// Applicable code combinations (excluding the deflection pass)
    pub num_combinations: usize,
    pub num_patterns: usize,
    pub comberns: Vec<CombernInfo>,
    pub reactions: Vec<ReactionEnvelope>,
}

impl Envelope {
    fn new(model: &Model, num_combinations: usize, num_patterns: usize) -> Self {
        let deflection = model.beam.deflection_enabled().then(GlobalExtreme::default);
        Self {
            v_max: GlobalExtreme::default(),
            v_min: GlobalExtreme::default(),
            m_max: GlobalExtreme::default(),
            m_min: GlobalExtreme::default(),
            deflection_max: deflection,
            deflection_min: deflection,
            deflection_max_pattern: None,
            deflection_min_pattern: None,
            num_combinations,
            num_patterns,
            comberns: Vec::new(),
            reactions: model
                .nodes
                .iter()
                .enumerate()
                .map(|(j, node)| ReactionEnvelope {
                    node: j,
                    x: node.x,
                    ..Default::default()
                })
                .collect(),
        }
    }

    /// Descriptor of a combern index
    pub fn combern(&self, index: usize) -> Option<&CombernInfo> {
        self.comberns.iter().find(|c| c.index == index)
    }

    fn track_actions(&mut self, model: &Model, state: &SolverState, combern: usize) {
        for (i, span) in model.spans.iter().enumerate() {
            let x0 = model.span_start(i);
            for (seg, seg_state) in span.segments.iter().zip(&state.segments[i]) {
                let a = &seg_state.actions[combern];
                let ls = seg.length;
                let at = |x: f64| x0 + seg.x_left + x;

                let mut shears = vec![(0.0, a.v1), (ls, a.shear_at(ls))];
                shears.extend(a.zero_load_point(ls).map(|x| (x, a.shear_at(x))));
                let mut moments = vec![(0.0, a.m1), (ls, a.moment_at(ls))];
                moments.extend(a.zero_shear_points(ls).into_iter().map(|x| (x, a.moment_at(x))));

                for (x, v) in shears {
                    self.v_max.offer(Sense::Max, v, combern, i, at(x));
                    self.v_min.offer(Sense::Min, v, combern, i, at(x));
                }
                for (x, m) in moments {
                    self.m_max.offer(Sense::Max, m, combern, i, at(x));
                    self.m_min.offer(Sense::Min, m, combern, i, at(x));
                }
            }
        }
    }

    fn track_reactions(&mut self, model: &Model, response: &FactoredResponse, combern: usize) {
        for ((env, node), r) in self.reactions.iter_mut().zip(&model.nodes).zip(&response.reactions) {
            if node.fixity.has_force_reaction() {
                env.force_max.offer(Sense::Max, r.force, 0.0, combern, None);
                env.force_min.offer(Sense::Min, r.force, 0.0, combern, None);
            }
            if node.fixity.restrains_rotation() {
                env.moment_max.offer(Sense::Max, r.moment, 0.0, combern, None);
                env.moment_min.offer(Sense::Min, r.moment, 0.0, combern, None);
            }
        }
    }

    fn track_deflection(
        &mut self,
        model: &Model,
        state: &mut SolverState,
        response: &FactoredResponse,
        combern: usize,
        pattern: usize,
    ) {
        let ei = model.beam.ei();
        for (i, span) in model.spans.iter().enumerate() {
            let x0 = model.span_start(i);
            let ends = &response.span_displacements[i];
            let (mut y1, mut theta1) = (ends.left_shear, ends.left_moment);

            for (seg, seg_state) in span.segments.iter().zip(state.segments[i].iter_mut()) {
                let a = seg_state.actions[combern];
                let ls = seg.length;
                let mut points = vec![0.0, ls];
                points.extend(a.zero_rotation_points(theta1, ei, ls));

                for x in points {
                    let y = a.deflection_at(y1, theta1, ei, x);
                    let extremes = &mut seg_state.extremes;
                    extremes.deflection_max.offer(Sense::Max, y, 0.0, pattern, Some(x));
                    extremes.deflection_min.offer(Sense::Min, y, 0.0, pattern, Some(x));
                    let at = x0 + seg.x_left + x;
                    if let Some(max) = self.deflection_max.as_mut() {
                        if Sense::Max.beats(y, max.value) {
                            max.offer(Sense::Max, y, combern, i, at);
                            self.deflection_max_pattern = Some(pattern);
                        }
                    }
                    if let Some(min) = self.deflection_min.as_mut() {
                        if Sense::Min.beats(y, min.value) {
                            min.offer(Sense::Min, y, combern, i, at);
                            self.deflection_min_pattern = Some(pattern);
                        }
                    }
                }

                let next_y = a.deflection_at(y1, theta1, ei, ls);
                theta1 = a.rotation_at(theta1, ei, ls);
                y1 = next_y;
            }
        }
    }
}

// =============================================================================
// SUPERPOSITION
// =============================================================================

#[derive(Debug, Clone)]
struct CombinationRow {
    name: String,
    equation: String,
    factors: LoadTable,
}

/// Rows of the active set that apply to the loads present
fn combination_rows(model: &Model) -> CalcResult<Vec<CombinationRow>> {
    if model.beam.is_service() {
        let mut factors = [0.0; NUM_LOAD_SLOTS];
        factors[AGGREGATE_SLOT] = 1.0;
        return Ok(vec![CombinationRow {
            name: "Service".to_string(),
            equation: "sum of all loads".to_string(),
            factors,
        }]);
    }

    let rows = combination_set(&model.beam.combination_set)?
        .iter()
        .filter(|combo| {
            let applies = combo.applies_to(&model.beam.present);
            if !applies {
                debug!("skipping combination {} ({})", combo.name, combo.equation);
            }
            applies
        })
        .map(|combo| CombinationRow {
            name: combo.name.clone(),
            equation: combo.equation.clone(),
            factors: combo.factor_table(),
        })
        .collect();
    Ok(rows)
}

/// Unit factors over the loads the combination rows read
fn deflection_row(model: &Model) -> CombinationRow {
    let mut factors = [0.0; NUM_LOAD_SLOTS];
    if model.beam.is_service() {
        factors[AGGREGATE_SLOT] = 1.0;
    } else {
        for load_type in LoadType::ALL {
            factors[load_type.slot()] = 1.0;
        }
    }
    CombinationRow {
        name: DEFLECTION_PASS.to_string(),
        equation: "unit factors".to_string(),
        factors,
    }
}

/// Run every combern over the solved load types.
///
/// # Errors
///
/// `InvalidInput` when the model names an unknown combination set.
pub fn superpose(model: &Model, solution: &LoadTypeSolution) -> CalcResult<(SolverState, Envelope)> {
    let rows = combination_rows(model)?;
    let num_patterns = model.beam.num_patterns;
    let num_comberns = (rows.len() + 1) * num_patterns;
    let layouts: Vec<PatternLayout> = (0..num_patterns)
        .map(|p| PatternLayout::new(model.beam.pattern_scheme, p, model.num_spans()))
        .collect();

    let mut state = SolverState::new(model, num_patterns, num_comberns);
    let mut envelope = Envelope::new(model, rows.len(), num_patterns);

    let deflection = deflection_row(model);
    let mut passes: Vec<(usize, &CombinationRow)> = Vec::with_capacity(rows.len() + 1);
    if model.beam.deflection_enabled() {
        passes.push((0, &deflection));
    }
    passes.extend(rows.iter().enumerate().map(|(i, row)| (i + 1, row)));

    // Factored actions, global ranges, reactions and deflections
    for (c, row) in &passes {
        for (p, layout) in layouts.iter().enumerate() {
            let combern = c * num_patterns + p;
            let response = factored_response(model, solution, &row.factors, layout);

            for (i, span) in model.spans.iter().enumerate() {
                let weights = span_weights(solution, &row.factors, layout, i);
                let walked = walk_span(span, &response.member_actions[i], &weights);
                for (seg_state, actions) in state.segments[i].iter_mut().zip(walked) {
                    seg_state.actions[combern] = actions;
                }
            }

            if *c == 0 {
                envelope.track_deflection(model, &mut state, &response, combern, p);
            } else {
                envelope.track_actions(model, &state, combern);
                envelope.track_reactions(model, &response, combern);
            }

            envelope.comberns.push(CombernInfo {
                index: combern,
                combination: row.name.clone(),
                equation: row.equation.clone(),
                pattern: p,
                loaded_spans: layout.loaded_spans(),
            });
        }
    }

    // Segment trackers against the noise floors
    let moment_floor = MOMENT_NOISE_FRACTION * (envelope.m_max.value - envelope.m_min.value);
    for c in 1..=rows.len() {
        for p in 0..num_patterns {
            let combern = c * num_patterns + p;
            for (span, span_state) in model.spans.iter().zip(state.segments.iter_mut()) {
                for (seg, seg_state) in span.segments.iter().zip(span_state.iter_mut()) {
                    let actions = seg_state.actions[combern];
                    seg_state.extremes.update(seg.length, &actions, combern, moment_floor);
                }
            }
        }
    }

    debug!(
        "superposed {} combinations × {} patterns ({} comberns)",
        rows.len(),
        num_patterns,
        num_comberns
    );
    Ok((state, envelope))
}
