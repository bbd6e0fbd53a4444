//! # Fixed-End Actions
//!
//! End shears and moments of a span whose both ends are clamped, for the load
//! shapes a beam segment can carry. Every formula is the work-equivalent
//! projection of the load onto the cubic Hermite shape functions
//!
//! ```text
//! N1 = 1 - 3ξ² + 2ξ³        N2 = L(ξ - 2ξ² + ξ³)
//! N3 = 3ξ² - 2ξ³            N4 = L(-ξ² + ξ³)          ξ = x / L
//! ```
//!
//! so that point, uniform and triangular results superimpose exactly.
//!
//! ## Sign Conventions
//!
//! - Loads and point forces: positive downward
//! - Applied moments: positive counter-clockwise
//! - End actions: the forces the supports exert on the member,
//!   shears positive upward, moments positive counter-clockwise
//!
//! A fixed-fixed span under downward uniform `w` therefore has
//! `left_shear = right_shear = wL/2`, `left_moment = wL²/12` and
//! `right_moment = -wL²/12`.

use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// Intensities smaller than this are treated as exactly zero
pub const ZERO_LOAD_TOLERANCE: f64 = 1e-9;

/// Snap a load magnitude to zero when it is below [`ZERO_LOAD_TOLERANCE`]
pub fn snap_to_zero(w: f64) -> f64 {
    if w.abs() < ZERO_LOAD_TOLERANCE {
        0.0
    } else {
        w
    }
}

// =============================================================================
// END ACTION RECORD
// =============================================================================

/// End shears and moments of one span
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FixedEndActions {
    pub left_shear: f64,
    pub left_moment: f64,
    pub right_shear: f64,
    pub right_moment: f64,
}

impl FixedEndActions {
    pub fn new(left_shear: f64, left_moment: f64, right_shear: f64, right_moment: f64) -> Self {
        Self {
            left_shear,
            left_moment,
            right_shear,
            right_moment,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    fn from_shape_weights(n: [f64; 4]) -> Self {
        Self::new(n[0], n[1], n[2], n[3])
    }
}

impl Add for FixedEndActions {
    type Output = FixedEndActions;
    fn add(self, rhs: FixedEndActions) -> FixedEndActions {
        FixedEndActions::new(
            self.left_shear + rhs.left_shear,
            self.left_moment + rhs.left_moment,
            self.right_shear + rhs.right_shear,
            self.right_moment + rhs.right_moment,
        )
    }
}

impl AddAssign for FixedEndActions {
    fn add_assign(&mut self, rhs: FixedEndActions) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for FixedEndActions {
    type Output = FixedEndActions;
    fn mul(self, k: f64) -> FixedEndActions {
        FixedEndActions::new(
            self.left_shear * k,
            self.left_moment * k,
            self.right_shear * k,
            self.right_moment * k,
        )
    }
}

impl std::iter::Sum for FixedEndActions {
    fn sum<I: Iterator<Item = FixedEndActions>>(iter: I) -> FixedEndActions {
        iter.fold(FixedEndActions::zero(), |acc, x| acc + x)
    }
}

// =============================================================================
// SHAPE FUNCTIONS
// =============================================================================

/// Hermite shape functions N1..N4 at `x` on a span of length `l`
fn shape(x: f64, l: f64) -> [f64; 4] {
    let xi = x / l;
    let xi2 = xi * xi;
    let xi3 = xi2 * xi;
    [
        1.0 - 3.0 * xi2 + 2.0 * xi3,
        l * (xi - 2.0 * xi2 + xi3),
        3.0 * xi2 - 2.0 * xi3,
        l * (-xi2 + xi3),
    ]
}

/// Slopes dN/dx of the shape functions
fn shape_slope(x: f64, l: f64) -> [f64; 4] {
    let xi = x / l;
    let xi2 = xi * xi;
    [
        (-6.0 * xi + 6.0 * xi2) / l,
        1.0 - 4.0 * xi + 3.0 * xi2,
        (6.0 * xi - 6.0 * xi2) / l,
        -2.0 * xi + 3.0 * xi2,
    ]
}

/// Antiderivatives ∫N dx evaluated at `x`
fn shape_integral(x: f64, l: f64) -> [f64; 4] {
    let l2 = l * l;
    let l3 = l2 * l;
    let x2 = x * x;
    let x3 = x2 * x;
    let x4 = x3 * x;
    [
        x - x3 / l2 + x4 / (2.0 * l3),
        x2 / 2.0 - 2.0 * x3 / (3.0 * l) + x4 / (4.0 * l2),
        x3 / l2 - x4 / (2.0 * l3),
        -x3 / (3.0 * l) + x4 / (4.0 * l2),
    ]
}

/// Antiderivatives ∫x·N dx evaluated at `x`
fn shape_first_moment(x: f64, l: f64) -> [f64; 4] {
    let l2 = l * l;
    let l3 = l2 * l;
    let x2 = x * x;
    let x3 = x2 * x;
    let x4 = x3 * x;
    let x5 = x4 * x;
    [
        x2 / 2.0 - 3.0 * x4 / (4.0 * l2) + 2.0 * x5 / (5.0 * l3),
        x3 / 3.0 - x4 / (2.0 * l) + x5 / (5.0 * l2),
        3.0 * x4 / (4.0 * l2) - 2.0 * x5 / (5.0 * l3),
        -x4 / (4.0 * l) + x5 / (5.0 * l2),
    ]
}

fn difference(hi: [f64; 4], lo: [f64; 4]) -> [f64; 4] {
    [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2], hi[3] - lo[3]]
}

// =============================================================================
// CONCENTRATED LOADS
// =============================================================================

/// Fixed-end actions for a downward point force `p` at distance `a` from the left end
///
/// ```text
///        P
///   ▣────↓────────▣
///    ←a→ ←── b ──→
/// ```
///
/// # Formulas
/// - V1 = Pb²(3a + b)/L³, M1 = Pab²/L²
/// - V2 = Pa²(a + 3b)/L³, M2 = -Pa²b/L²
pub fn point_force(p: f64, a: f64, l: f64) -> FixedEndActions {
    if p == 0.0 {
        return FixedEndActions::zero();
    }
    let n = shape(a, l);
    FixedEndActions::from_shape_weights([p * n[0], p * n[1], p * n[2], p * n[3]])
}

/// Fixed-end actions for a counter-clockwise applied moment `m0` at distance `a`
///
/// # Formulas
/// - V1 = 6M0·ab/L³, V2 = -6M0·ab/L³
/// - M1 = M0·b(2a - b)/L², M2 = M0·a(2b - a)/L²
pub fn point_moment(m0: f64, a: f64, l: f64) -> FixedEndActions {
    if m0 == 0.0 {
        return FixedEndActions::zero();
    }
    let dn = shape_slope(a, l);
    FixedEndActions::from_shape_weights([-m0 * dn[0], -m0 * dn[1], -m0 * dn[2], -m0 * dn[3]])
}

// =============================================================================
// DISTRIBUTED LOADS
// =============================================================================

/// Uniform downward load `w` over `[a, b]`
pub fn uniform_load(w: f64, a: f64, b: f64, l: f64) -> FixedEndActions {
    if w == 0.0 || b <= a {
        return FixedEndActions::zero();
    }
    let d = difference(shape_integral(b, l), shape_integral(a, l));
    FixedEndActions::from_shape_weights([w * d[0], w * d[1], w * d[2], w * d[3]])
}

/// Which end of a triangular load carries the peak intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    Left,
    Right,
}

/// Triangular load over `[a, b]`, zero at one end and `w` at the `corner` end
pub fn triangular_load(w: f64, a: f64, b: f64, l: f64, corner: Corner) -> FixedEndActions {
    if w == 0.0 || b <= a {
        return FixedEndActions::zero();
    }
    let di = difference(shape_integral(b, l), shape_integral(a, l));
    let dj = difference(shape_first_moment(b, l), shape_first_moment(a, l));
    let k = w / (b - a);
    let weights = match corner {
        // w(x) = w(x - a)/(b - a)
        Corner::Right => [
            k * (dj[0] - a * di[0]),
            k * (dj[1] - a * di[1]),
            k * (dj[2] - a * di[2]),
            k * (dj[3] - a * di[3]),
        ],
        // w(x) = w(b - x)/(b - a)
        Corner::Left => [
            k * (b * di[0] - dj[0]),
            k * (b * di[1] - dj[1]),
            k * (b * di[2] - dj[2]),
            k * (b * di[3] - dj[3]),
        ],
    };
    FixedEndActions::from_shape_weights(weights)
}

/// A linearly varying load between two positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearLoad {
    pub start: f64,
    pub end: f64,
    pub w_start: f64,
    pub w_end: f64,
}

impl LinearLoad {
    pub fn new(start: f64, end: f64, w_start: f64, w_end: f64) -> Self {
        Self {
            start,
            end,
            w_start,
            w_end,
        }
    }

    /// Same load moved `offset` to the right
    pub fn shifted(self, offset: f64) -> Self {
        Self::new(self.start + offset, self.end + offset, self.w_start, self.w_end)
    }
}

/// One value, or two
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OneOrTwo<T> {
    One(T),
    Two(T, T),
}

impl<T> IntoIterator for OneOrTwo<T> {
    type Item = T;
    type IntoIter = std::iter::Chain<std::iter::Once<T>, std::option::IntoIter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            OneOrTwo::One(a) => std::iter::once(a).chain(None),
            OneOrTwo::Two(a, b) => std::iter::once(a).chain(Some(b)),
        }
    }
}

/// Split a linear load over `[0, length]` at its zero crossing.
///
/// Loads whose (snapped) end intensities share a sign, or that have a zero
/// end, come back whole. Opposite signs give two true triangles meeting at
/// `x0 = length·w1/(w1 - w2)`.
///
/// # Example
/// ```
/// use beam_core::equations::fixed_end::{split_at_zero_crossing, OneOrTwo};
///
/// match split_at_zero_crossing(10.0, -30.0, 8.0) {
///     OneOrTwo::Two(left, right) => {
///         assert_eq!(left.end, 2.0);
///         assert_eq!(right.start, 2.0);
///         assert_eq!(left.w_end, 0.0);
///     }
///     OneOrTwo::One(_) => unreachable!(),
/// }
/// ```
pub fn split_at_zero_crossing(w1: f64, w2: f64, length: f64) -> OneOrTwo<LinearLoad> {
    let w1 = snap_to_zero(w1);
    let w2 = snap_to_zero(w2);
    if w1 * w2 >= 0.0 {
        return OneOrTwo::One(LinearLoad::new(0.0, length, w1, w2));
    }
    let x0 = length * w1 / (w1 - w2);
    OneOrTwo::Two(
        LinearLoad::new(0.0, x0, w1, 0.0),
        LinearLoad::new(x0, length, 0.0, w2),
    )
}

/// Fixed-end actions of a linear load `w1 → w2` over `[a, b]` on a span of length `l`.
///
/// Same-sign ends decompose into a uniform load of the smaller magnitude plus
/// a triangle whose corner sits at the larger end; a sign change is split at
/// the zero crossing first.
pub fn linear_load(w1: f64, w2: f64, a: f64, b: f64, l: f64) -> FixedEndActions {
    if b <= a {
        return FixedEndActions::zero();
    }
    match split_at_zero_crossing(w1, w2, b - a) {
        OneOrTwo::One(piece) => same_sign_load(piece.shifted(a), l),
        OneOrTwo::Two(left, right) => {
            same_sign_load(left.shifted(a), l) + same_sign_load(right.shifted(a), l)
        }
    }
}

fn same_sign_load(load: LinearLoad, l: f64) -> FixedEndActions {
    let (a, b) = (load.start, load.end);
    let (w1, w2) = (load.w_start, load.w_end);
    if w1 == 0.0 && w2 == 0.0 {
        return FixedEndActions::zero();
    }
    if w1 == w2 {
        return uniform_load(w1, a, b, l);
    }
    if w1.abs() < w2.abs() {
        uniform_load(w1, a, b, l) + triangular_load(w2 - w1, a, b, l, Corner::Right)
    } else {
        uniform_load(w2, a, b, l) + triangular_load(w1 - w2, a, b, l, Corner::Left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON * b.abs().max(1.0)
    }

    fn assert_actions(actual: FixedEndActions, expected: FixedEndActions) {
        assert!(approx_eq(actual.left_shear, expected.left_shear), "V1 = {} (expected {})", actual.left_shear, expected.left_shear);
        assert!(approx_eq(actual.left_moment, expected.left_moment), "M1 = {} (expected {})", actual.left_moment, expected.left_moment);
        assert!(approx_eq(actual.right_shear, expected.right_shear), "V2 = {} (expected {})", actual.right_shear, expected.right_shear);
        assert!(approx_eq(actual.right_moment, expected.right_moment), "M2 = {} (expected {})", actual.right_moment, expected.right_moment);
    }

    #[test]
    fn test_point_force_midspan() {
        // P = 1000 at midspan of 10: V = 500, M = PL/8 = 1250
        let fea = point_force(1000.0, 5.0, 10.0);
        assert_actions(fea, FixedEndActions::new(500.0, 1250.0, 500.0, -1250.0));
    }

    #[test]
    fn test_point_force_asymmetric() {
        // a = 3, b = 7, L = 10
        let (p, a, b, l) = (1000.0, 3.0, 7.0, 10.0);
        let fea = point_force(p, a, l);
        let expected = FixedEndActions::new(
            p * b * b * (3.0 * a + b) / l.powi(3),
            p * a * b * b / (l * l),
            p * a * a * (a + 3.0 * b) / l.powi(3),
            -p * a * a * b / (l * l),
        );
        assert_actions(fea, expected);
    }

    #[test]
    fn test_point_moment_closed_form() {
        let (m0, a, l) = (600.0, 4.0, 10.0);
        let b = l - a;
        let fea = point_moment(m0, a, l);
        let expected = FixedEndActions::new(
            6.0 * m0 * a * b / l.powi(3),
            m0 * b * (2.0 * a - b) / (l * l),
            -6.0 * m0 * a * b / l.powi(3),
            m0 * a * (2.0 * b - a) / (l * l),
        );
        assert_actions(fea, expected);

        // Moment equilibrium about the left end
        let residual = m0 + fea.left_moment + fea.right_moment + fea.right_shear * l;
        assert!(residual.abs() < 1e-9);
    }

    #[test]
    fn test_uniform_full_span() {
        let (w, l) = (100.0, 12.0);
        let fea = uniform_load(w, 0.0, l, l);
        assert_actions(
            fea,
            FixedEndActions::new(w * l / 2.0, w * l * l / 12.0, w * l / 2.0, -w * l * l / 12.0),
        );
    }

    #[test]
    fn test_partial_uniform_superposes() {
        let (w, l) = (80.0, 10.0);
        let whole = uniform_load(w, 2.0, 9.0, l);
        let parts = uniform_load(w, 2.0, 5.5, l) + uniform_load(w, 5.5, 9.0, l);
        assert_actions(parts, whole);
        assert!(approx_eq(whole.left_shear + whole.right_shear, w * 7.0));
    }

    #[test]
    fn test_triangle_full_span() {
        // Peak at right: V1 = 3wL/20, V2 = 7wL/20, M1 = wL²/30, M2 = -wL²/20
        let (w, l) = (60.0, 9.0);
        let fea = triangular_load(w, 0.0, l, l, Corner::Right);
        assert_actions(
            fea,
            FixedEndActions::new(
                3.0 * w * l / 20.0,
                w * l * l / 30.0,
                7.0 * w * l / 20.0,
                -w * l * l / 20.0,
            ),
        );
    }

    #[test]
    fn test_triangle_corner_is_mirror() {
        let (w, l) = (60.0, 9.0);
        let right = triangular_load(w, 0.0, l, l, Corner::Right);
        let left = triangular_load(w, 0.0, l, l, Corner::Left);
        assert_actions(
            left,
            FixedEndActions::new(right.right_shear, -right.right_moment, right.left_shear, -right.left_moment),
        );
    }

    #[test]
    fn test_trapezoid_is_uniform_plus_triangle() {
        let l = 10.0;
        let trap = linear_load(20.0, 50.0, 1.0, 7.0, l);
        let parts = uniform_load(20.0, 1.0, 7.0, l) + triangular_load(30.0, 1.0, 7.0, l, Corner::Right);
        assert_actions(trap, parts);
        assert!(approx_eq(trap.left_shear + trap.right_shear, 35.0 * 6.0));
    }

    #[test]
    fn test_snap_small_magnitudes() {
        assert_eq!(snap_to_zero(5e-10), 0.0);
        assert_eq!(snap_to_zero(-5e-10), 0.0);
        assert_eq!(snap_to_zero(2e-9), 2e-9);
        // A near-zero end is a triangle, not a sign change
        assert!(matches!(split_at_zero_crossing(-1e-12, 40.0, 5.0), OneOrTwo::One(_)));
    }

    #[test]
    fn test_split_same_sign_is_whole() {
        assert_eq!(
            split_at_zero_crossing(10.0, 30.0, 4.0),
            OneOrTwo::One(LinearLoad::new(0.0, 4.0, 10.0, 30.0))
        );
    }

    #[test]
    fn test_split_opposite_signs() {
        let pieces: Vec<LinearLoad> = split_at_zero_crossing(-20.0, 60.0, 8.0).into_iter().collect();
        assert_eq!(pieces.len(), 2);
        assert!(approx_eq(pieces[0].end, 2.0));
        assert_eq!(pieces[0].w_end, 0.0);
        assert_eq!(pieces[1].w_start, 0.0);
        assert_eq!((pieces[1].start, pieces[1].end, pieces[1].w_end), (2.0, 8.0, 60.0));
    }

    #[test]
    fn test_sign_change_matches_direct_integration() {
        // Direct projection of w(x) = w1 + (w2 - w1)x/L onto the shape functions
        let (w1, w2, l) = (-40.0, 80.0, 12.0);
        let di = difference(shape_integral(l, l), shape_integral(0.0, l));
        let dj = difference(shape_first_moment(l, l), shape_first_moment(0.0, l));
        let s = (w2 - w1) / l;
        let expected = FixedEndActions::new(
            w1 * di[0] + s * dj[0],
            w1 * di[1] + s * dj[1],
            w1 * di[2] + s * dj[2],
            w1 * di[3] + s * dj[3],
        );
        assert_actions(linear_load(w1, w2, 0.0, l, l), expected);
    }
}
