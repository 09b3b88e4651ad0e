//! Direct tridiagonal solver used by the implicit vertical stage.
//!
//! The solve backend is a strategy trait so that the numerical algorithm
//! of the implicit stage stays identical regardless of which direct
//! solver backs it. The default is the Thomas algorithm, adequate for
//! the diagonally dominant acoustic systems this crate constructs.

use thiserror::Error;

/// A tridiagonal system with a (near-)zero pivot.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("singular tridiagonal system: zero pivot at row {row}")]
pub struct SingularSystem {
    /// Zero-based row of the failed pivot.
    pub row: usize,
}

/// Strategy interface for the per-column direct solve.
///
/// Bands are given as slices of equal length n, the system dimension.
/// `sub[k-1]` is the sub-diagonal entry of row k and `sup[k]` the
/// super-diagonal entry of row k; the last entry of `sub` and `sup` is
/// unused. All four slices are clobbered; on success `rhs` holds the
/// solution.
pub trait TridiagonalSolver: Send + Sync {
    fn solve(
        &self,
        sub: &mut [f64],
        diag: &mut [f64],
        sup: &mut [f64],
        rhs: &mut [f64],
    ) -> Result<(), SingularSystem>;
}

/// Thomas algorithm (tridiagonal Gaussian elimination without pivoting).
#[derive(Clone, Copy, Debug)]
pub struct ThomasSolver {
    /// Smallest pivot magnitude accepted before the system is declared
    /// singular.
    pub pivot_tolerance: f64,
}

impl Default for ThomasSolver {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1e-14,
        }
    }
}

impl TridiagonalSolver for ThomasSolver {
    fn solve(
        &self,
        sub: &mut [f64],
        diag: &mut [f64],
        sup: &mut [f64],
        rhs: &mut [f64],
    ) -> Result<(), SingularSystem> {
        let n = diag.len();
        assert_eq!(rhs.len(), n);
        assert!(sub.len() >= n - 1 && sup.len() >= n - 1);

        // Forward elimination
        for k in 1..n {
            let pivot = diag[k - 1];
            if pivot.abs() <= self.pivot_tolerance {
                return Err(SingularSystem { row: k - 1 });
            }
            let m = sub[k - 1] / pivot;
            diag[k] -= m * sup[k - 1];
            rhs[k] -= m * rhs[k - 1];
        }
        if diag[n - 1].abs() <= self.pivot_tolerance {
            return Err(SingularSystem { row: n - 1 });
        }

        // Back substitution
        rhs[n - 1] /= diag[n - 1];
        for k in (0..n - 1).rev() {
            rhs[k] = (rhs[k] - sup[k] * rhs[k + 1]) / diag[k];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_system() {
        let solver = ThomasSolver::default();
        let mut sub = [0.0; 5];
        let mut diag = [1.0; 5];
        let mut sup = [0.0; 5];
        let mut rhs = [3.0, -1.0, 0.5, 2.0, 7.0];
        let expected = rhs;

        solver
            .solve(&mut sub, &mut diag, &mut sup, &mut rhs)
            .unwrap();
        for (x, e) in rhs.iter().zip(&expected) {
            assert!((x - e).abs() < 1e-14);
        }
    }

    #[test]
    fn test_known_solution() {
        // [ 2 -1  0] [1]   [ 0]
        // [-1  2 -1] [2] = [ 0]
        // [ 0 -1  2] [3]   [ 4]
        let solver = ThomasSolver::default();
        let mut sub = [-1.0, -1.0, 0.0];
        let mut diag = [2.0, 2.0, 2.0];
        let mut sup = [-1.0, -1.0, 0.0];
        let mut rhs = [0.0, 0.0, 4.0];

        solver
            .solve(&mut sub, &mut diag, &mut sup, &mut rhs)
            .unwrap();
        let expected = [1.0, 2.0, 3.0];
        for (x, e) in rhs.iter().zip(&expected) {
            assert!((x - e).abs() < 1e-12, "{} vs {}", x, e);
        }
    }

    #[test]
    fn test_singular_system_is_reported() {
        let solver = ThomasSolver::default();
        let mut sub = [0.0, 0.0, 0.0];
        let mut diag = [1.0, 0.0, 1.0];
        let mut sup = [0.0, 0.0, 0.0];
        let mut rhs = [1.0, 1.0, 1.0];

        let err = solver
            .solve(&mut sub, &mut diag, &mut sup, &mut rhs)
            .unwrap_err();
        assert_eq!(err, SingularSystem { row: 1 });
    }

    #[test]
    fn test_boundary_identity_rows_like_acoustic_system() {
        // Shape of the acoustic system: identity rows at both ends with
        // zero right-hand side pin the boundary values at zero.
        let solver = ThomasSolver::default();
        let mut sub = [0.0, -0.1, -0.1, 0.0, 0.0];
        let mut diag = [1.0, 1.2, 1.2, 1.2, 1.0];
        let mut sup = [0.0, -0.1, -0.1, 0.0, 0.0];
        let mut rhs = [0.0, 1.0, 1.0, 1.0, 0.0];

        solver
            .solve(&mut sub, &mut diag, &mut sup, &mut rhs)
            .unwrap();
        assert!(rhs[0].abs() < 1e-14);
        assert!(rhs[4].abs() < 1e-14);
        for &x in &rhs[1..4] {
            assert!(x > 0.0 && x < 1.0);
        }
    }
}
