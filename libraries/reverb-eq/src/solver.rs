//! Dense linear system solver
//!
//! Gaussian elimination with partial pivoting over a small, pre-sized
//! square matrix. The correction loop fills the matrix with decibel-domain
//! filter responses, which can span a wide range of magnitudes, hence the
//! row pivoting.
//!
//! Storage is allocated once in [`LinearSystem::new`]; [`LinearSystem::solve`]
//! works in place and never allocates.

use crate::error::{EqError, Result};

/// Largest absolute pivot still treated as zero
pub const PIVOT_EPSILON: f64 = 1e-12;

/// Square `dim × dim` system `B · x = rhs`, stored row-major
#[derive(Debug, Clone)]
pub struct LinearSystem {
    dim: usize,
    data: Vec<f64>,
}

impl LinearSystem {
    /// Create a zeroed system of the given dimension
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    /// Matrix dimension
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Get entry `B[row][col]`
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.dim + col]
    }

    /// Set entry `B[row][col]`
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.dim + col] = value;
    }

    /// Mutable view of one matrix row
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.dim;
        &mut self.data[start..start + self.dim]
    }

    /// Solve `B · x = rhs`, writing `x` into `rhs`
    ///
    /// The matrix is destroyed (left in upper-triangular form) and must be
    /// refilled before the next solve.
    ///
    /// # Errors
    /// Returns `EqError::SingularSystem` if a pivot column has no entry
    /// larger than [`PIVOT_EPSILON`] or the solution is not finite. `rhs`
    /// is partially overwritten in that case.
    pub fn solve(&mut self, rhs: &mut [f64]) -> Result<()> {
        let n = self.dim;
        debug_assert_eq!(rhs.len(), n, "right-hand side must match system dimension");

        // Forward elimination with partial pivoting
        for col in 0..n {
            let mut max_row = col;
            let mut max_val = self.get(col, col).abs();
            for row in (col + 1)..n {
                let val = self.get(row, col).abs();
                if val > max_val {
                    max_val = val;
                    max_row = row;
                }
            }

            if max_val.is_nan() || max_val <= PIVOT_EPSILON {
                return Err(EqError::SingularSystem { column: col });
            }

            if max_row != col {
                for j in 0..n {
                    self.data.swap(col * n + j, max_row * n + j);
                }
                rhs.swap(col, max_row);
            }

            let pivot = self.get(col, col);
            for row in (col + 1)..n {
                let factor = self.get(row, col) / pivot;
                if factor == 0.0 {
                    continue;
                }
                for j in col..n {
                    let value = self.get(row, j) - factor * self.get(col, j);
                    self.set(row, j, value);
                }
                rhs[row] -= factor * rhs[col];
            }
        }

        // Back substitution
        for i in (0..n).rev() {
            let tail: f64 = ((i + 1)..n).map(|j| self.get(i, j) * rhs[j]).sum();
            let x = (rhs[i] - tail) / self.get(i, i);
            if !x.is_finite() {
                return Err(EqError::SingularSystem { column: i });
            }
            rhs[i] = x;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn system(rows: &[&[f64]]) -> LinearSystem {
        let mut sys = LinearSystem::new(rows.len());
        for (i, row) in rows.iter().enumerate() {
            sys.row_mut(i).copy_from_slice(row);
        }
        sys
    }

    #[test]
    fn solves_diagonal_system() {
        let mut sys = system(&[&[2.0, 0.0], &[0.0, 4.0]]);
        let mut rhs = [6.0, 2.0];
        sys.solve(&mut rhs).unwrap();
        assert!((rhs[0] - 3.0).abs() < EPSILON);
        assert!((rhs[1] - 0.5).abs() < EPSILON);
    }

    #[test]
    fn solves_one_by_one() {
        let mut sys = system(&[&[2.0]]);
        let mut rhs = [6.020_599_913_279_624];
        sys.solve(&mut rhs).unwrap();
        assert!((rhs[0] - 3.010_299_956_639_812).abs() < EPSILON);
    }

    #[test]
    fn pivots_on_zero_diagonal() {
        // Without row exchange the first pivot would be zero
        let mut sys = system(&[&[0.0, 1.0, 1.0], &[2.0, 1.0, -1.0], &[1.0, -1.0, 2.0]]);
        // x = (1, 2, 3)
        let mut rhs = [5.0, 1.0, 5.0];
        sys.solve(&mut rhs).unwrap();
        assert!((rhs[0] - 1.0).abs() < 1e-10);
        assert!((rhs[1] - 2.0).abs() < 1e-10);
        assert!((rhs[2] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn partial_pivoting_handles_tiny_leading_entry() {
        // Naive elimination on 1e-17 loses the answer entirely
        let mut sys = system(&[&[1e-17, 1.0], &[1.0, 1.0]]);
        let mut rhs = [1.0, 2.0];
        sys.solve(&mut rhs).unwrap();
        assert!((rhs[0] - 1.0).abs() < 1e-9);
        assert!((rhs[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn singular_matrix_reports_column() {
        let mut sys = system(&[&[1.0, 2.0], &[2.0, 4.0]]);
        let mut rhs = [1.0, 2.0];
        let err = sys.solve(&mut rhs).unwrap_err();
        assert_eq!(err, EqError::SingularSystem { column: 1 });
    }

    #[test]
    fn zero_column_is_singular() {
        let mut sys = system(&[&[0.0, 1.0], &[0.0, 3.0]]);
        let mut rhs = [1.0, 1.0];
        assert_eq!(
            sys.solve(&mut rhs).unwrap_err(),
            EqError::SingularSystem { column: 0 }
        );
    }

    #[test]
    fn nan_entries_are_singular() {
        let mut sys = system(&[&[f64::NAN]]);
        let mut rhs = [1.0];
        assert!(sys.solve(&mut rhs).is_err());
    }

    #[test]
    fn accessors_round_trip() {
        let mut sys = LinearSystem::new(3);
        assert_eq!(sys.dim(), 3);
        sys.set(2, 1, 7.5);
        assert_eq!(sys.get(2, 1), 7.5);
        assert_eq!(sys.row_mut(2), &mut [0.0, 7.5, 0.0]);
    }
}
