//! # Banded LDLᵗ Solver
//!
//! Symmetric banded storage and an LDLᵗ factorization restricted to the
//! band. A beam's stiffness matrix only couples the unknowns of neighbouring
//! nodes, so storage is `O(n·b)` and factoring is `O(n·b²)` for half-bandwidth
//! `b`. The factorization is computed once and reused for every load case.
//!
//! ## Storage
//!
//! Only the lower triangle is kept, row by row, indexed by
//! `(row, band_offset)` where `band_offset = row - col` runs `0..=b`.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Pivots smaller than this fraction of the largest diagonal entry mean a mechanism
const PIVOT_TOLERANCE: f64 = 1e-11;

/// Symmetric matrix stored as its lower band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandedMatrix {
    n: usize,
    half_bandwidth: usize,
    data: Vec<f64>,
}

impl BandedMatrix {
    /// Zero matrix of order `n`
    pub fn new(n: usize, half_bandwidth: usize) -> Self {
        Self {
            n,
            half_bandwidth,
            data: vec![0.0; n * (half_bandwidth + 1)],
        }
    }

    pub fn order(&self) -> usize {
        self.n
    }

    pub fn half_bandwidth(&self) -> usize {
        self.half_bandwidth
    }

    fn slot(&self, row: usize, offset: usize) -> usize {
        row * (self.half_bandwidth + 1) + offset
    }

    /// Stored value at `(row, band_offset)`
    pub fn band(&self, row: usize, offset: usize) -> f64 {
        self.data[self.slot(row, offset)]
    }

    /// Entry `(row, col)`, using symmetry; zero outside the band
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (r, c) = if row >= col { (row, col) } else { (col, row) };
        if r >= self.n || r - c > self.half_bandwidth {
            0.0
        } else {
            self.band(r, r - c)
        }
    }

    /// Add `value` to the lower-triangle entry `(row, col)`
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> CalcResult<()> {
        if row >= self.n || col > row || row - col > self.half_bandwidth {
            return Err(CalcError::internal(format!(
                "entry ({}, {}) outside the lower band of a {}×{} matrix with half-bandwidth {}",
                row, col, self.n, self.n, self.half_bandwidth
            )));
        }
        let index = self.slot(row, row - col);
        self.data[index] += value;
        Ok(())
    }

    /// Dense product `A·x` (used to check solutions)
    pub fn multiply(&self, x: &[f64]) -> Vec<f64> {
        (0..self.n)
            .map(|i| {
                let lo = i.saturating_sub(self.half_bandwidth);
                let hi = (i + self.half_bandwidth).min(self.n.saturating_sub(1));
                (lo..=hi).map(|j| self.get(i, j) * x[j]).sum()
            })
            .collect()
    }
}

/// `A = L·D·Lᵗ` with unit lower-triangular `L` stored in band form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdltFactorization {
    lower: BandedMatrix,
    diagonal: Vec<f64>,
}

impl LdltFactorization {
    /// Factor a symmetric positive-definite banded matrix.
    ///
    /// # Errors
    ///
    /// `CalculationFailed` when a pivot vanishes: the structure is a
    /// mechanism (too few supports, or hinges in a row).
    ///
    /// # Example
    /// ```
    /// use beam_core::calculations::banded::{BandedMatrix, LdltFactorization};
    ///
    /// let mut a = BandedMatrix::new(2, 1);
    /// a.add(0, 0, 4.0).unwrap();
    /// a.add(1, 0, 2.0).unwrap();
    /// a.add(1, 1, 3.0).unwrap();
    ///
    /// let ldlt = LdltFactorization::factor(&a).unwrap();
    /// let x = ldlt.solve(&[8.0, 7.0]).unwrap();
    /// assert!((x[0] - 1.25).abs() < 1e-12);
    /// assert!((x[1] - 1.5).abs() < 1e-12);
    /// ```
    pub fn factor(a: &BandedMatrix) -> CalcResult<Self> {
        let n = a.order();
        let b = a.half_bandwidth();
        let mut lower = BandedMatrix::new(n, b);
        let mut diagonal = vec![0.0; n];

        let scale = (0..n).map(|i| a.band(i, 0).abs()).fold(0.0f64, f64::max);
        let tolerance = PIVOT_TOLERANCE * scale;

        for j in 0..n {
            let lo = j.saturating_sub(b);
            let mut d = a.band(j, 0);
            for k in lo..j {
                let l = lower.band(j, j - k);
                d -= l * l * diagonal[k];
            }
            if !d.is_finite() || d <= tolerance {
                return Err(CalcError::calculation_failed(
                    "stiffness factorization",
                    format!("structure is unstable (pivot {} at unknown {})", d, j),
                ));
            }
            diagonal[j] = d;

            for i in (j + 1)..=(j + b).min(n - 1) {
                let lo_i = i.saturating_sub(b);
                let mut s = a.get(i, j);
                for k in lo_i.max(lo)..j {
                    s -= lower.band(i, i - k) * lower.band(j, j - k) * diagonal[k];
                }
                let index = lower.slot(i, i - j);
                lower.data[index] = s / d;
            }
        }

        Ok(Self { lower, diagonal })
    }

    pub fn order(&self) -> usize {
        self.diagonal.len()
    }

    /// Pivots `D` of the factorization
    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    /// Solve `A·x = rhs` by forward substitution, diagonal scaling and back substitution
    pub fn solve(&self, rhs: &[f64]) -> CalcResult<Vec<f64>> {
        let n = self.order();
        if rhs.len() != n {
            return Err(CalcError::internal(format!(
                "right-hand side has {} entries, expected {}",
                rhs.len(),
                n
            )));
        }
        match n {
            0 => return Ok(Vec::new()),
            1 => return Ok(vec![rhs[0] / self.diagonal[0]]),
            _ => {}
        }
        let b = self.lower.half_bandwidth();

        // L·y = rhs
        let mut x = rhs.to_vec();
        for i in 0..n {
            let lo = i.saturating_sub(b);
            let mut s = x[i];
            for k in lo..i {
                s -= self.lower.band(i, i - k) * x[k];
            }
            x[i] = s;
        }

        // D·z = y
        for (xi, d) in x.iter_mut().zip(&self.diagonal) {
            *xi /= d;
        }

        // Lᵗ·x = z
        for i in (0..n).rev() {
            let hi = (i + b).min(n - 1);
            let mut s = x[i];
            for k in (i + 1)..=hi {
                s -= self.lower.band(k, k - i) * x[k];
            }
            x[i] = s;
        }

        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tridiagonal SPD matrix 2, -1 with a stiffened corner
    fn tridiagonal(n: usize) -> BandedMatrix {
        let mut a = BandedMatrix::new(n, 1);
        for i in 0..n {
            a.add(i, i, if i == 0 { 3.0 } else { 2.0 }).unwrap();
            if i > 0 {
                a.add(i, i - 1, -1.0).unwrap();
            }
        }
        a
    }

    #[test]
    fn test_band_storage() {
        let mut a = BandedMatrix::new(3, 1);
        a.add(1, 0, 2.5).unwrap();
        a.add(1, 0, 0.5).unwrap();
        assert_eq!(a.get(1, 0), 3.0);
        assert_eq!(a.get(0, 1), 3.0);
        assert_eq!(a.get(2, 0), 0.0);
        assert!(a.add(2, 0, 1.0).is_err());
        assert!(a.add(0, 1, 1.0).is_err());
    }

    #[test]
    fn test_solve_recovers_known_solution() {
        let a = tridiagonal(6);
        let expected = vec![1.0, -2.0, 0.5, 3.0, 0.0, -1.5];
        let rhs = a.multiply(&expected);
        let x = LdltFactorization::factor(&a).unwrap().solve(&rhs).unwrap();
        for (xi, ei) in x.iter().zip(&expected) {
            assert!((xi - ei).abs() < 1e-12, "{} vs {}", xi, ei);
        }
    }

    #[test]
    fn test_wider_band() {
        // Pentadiagonal SPD
        let n = 7;
        let mut a = BandedMatrix::new(n, 2);
        for i in 0..n {
            a.add(i, i, 6.0).unwrap();
            if i >= 1 {
                a.add(i, i - 1, -2.0).unwrap();
            }
            if i >= 2 {
                a.add(i, i - 2, 0.5).unwrap();
            }
        }
        let expected: Vec<f64> = (0..n).map(|i| (i as f64) * 0.7 - 1.0).collect();
        let rhs = a.multiply(&expected);
        let x = LdltFactorization::factor(&a).unwrap().solve(&rhs).unwrap();
        for (xi, ei) in x.iter().zip(&expected) {
            assert!((xi - ei).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_rhs_gives_zero() {
        let a = tridiagonal(5);
        let x = LdltFactorization::factor(&a).unwrap().solve(&[0.0; 5]).unwrap();
        assert!(x.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_degenerate_orders() {
        let empty = LdltFactorization::factor(&BandedMatrix::new(0, 0)).unwrap();
        assert!(empty.solve(&[]).unwrap().is_empty());

        let mut one = BandedMatrix::new(1, 0);
        one.add(0, 0, 4.0).unwrap();
        let x = LdltFactorization::factor(&one).unwrap().solve(&[2.0]).unwrap();
        assert_eq!(x, vec![0.5]);
    }

    #[test]
    fn test_singular_matrix_is_unstable() {
        let mut a = BandedMatrix::new(2, 1);
        a.add(0, 0, 1.0).unwrap();
        a.add(1, 0, -1.0).unwrap();
        a.add(1, 1, 1.0).unwrap();
        let err = LdltFactorization::factor(&a).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
        assert!(err.to_string().contains("unstable"));
    }

    #[test]
    fn test_rhs_length_mismatch() {
        let ldlt = LdltFactorization::factor(&tridiagonal(3)).unwrap();
        assert!(ldlt.solve(&[1.0, 2.0]).is_err());
    }
}
