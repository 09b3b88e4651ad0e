//! Vandermonde matrix for nodal-modal transformations.
//!
//! V[i,j] = φ_j(x_i) with φ_j the normalized Legendre polynomial
//! sqrt((2j+1)/2) P_j, so that the modal mass matrix is the identity.
//! The derivative operator used by the horizontal stages is assembled
//! from V, V⁻¹ and the derivative Vandermonde Vr (see
//! [`crate::operators::HorizontalBasis`]).

use faer::{Mat, linalg::solvers::Solve};

use super::gll::legendre_and_derivative;

/// Vandermonde matrix, its inverse, and the derivative Vandermonde.
#[derive(Clone)]
pub struct Vandermonde {
    /// V[i,j] = φ_j(x_i)
    pub v: Mat<f64>,
    /// V⁻¹
    pub v_inv: Mat<f64>,
    /// Vr[i,j] = φ'_j(x_i)
    pub vr: Mat<f64>,
    /// Polynomial degree
    pub degree: usize,
}

impl Vandermonde {
    /// Build the Vandermonde matrices for the given degree and node set.
    pub fn new(degree: usize, nodes: &[f64]) -> Self {
        let n = degree + 1;
        assert_eq!(nodes.len(), n, "need degree+1 nodes");

        let mut v = Mat::zeros(n, n);
        let mut vr = Mat::zeros(n, n);

        for (i, &x) in nodes.iter().enumerate() {
            for j in 0..n {
                let norm = ((2 * j + 1) as f64 / 2.0).sqrt();
                let (p, dp) = legendre_and_derivative(j, x);
                v[(i, j)] = norm * p;
                vr[(i, j)] = norm * dp;
            }
        }

        // Invert via LU, solving V x = e_j column by column.
        let lu = v.as_ref().full_piv_lu();
        let mut v_inv = Mat::zeros(n, n);
        for j in 0..n {
            let mut rhs = Mat::zeros(n, 1);
            rhs[(j, 0)] = 1.0;
            let col = lu.solve(&rhs);
            for i in 0..n {
                v_inv[(i, j)] = col[(i, 0)];
            }
        }

        Self {
            v,
            v_inv,
            vr,
            degree,
        }
    }
}
