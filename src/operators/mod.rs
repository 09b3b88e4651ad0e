//! Collocation derivative and stiffness operators for one element edge.
//!
//! The horizontal discretization is a tensor product of 1D GLL
//! collocation bases. Both operators are dense N×N matrices applied as
//! small matrix multiplies over the N points along each axis:
//!
//! - `dx[(i, s)]`: strong-form derivative, (du/dα)_i = Σ_s dx[(i,s)] u_s
//! - `stiffness[(i, s)] = (w_s / w_i) dx[(s, i)]`: weak-form (integrated
//!   by parts) derivative, used for flux divergences as
//!   (div F)_i ≈ -Σ_s stiffness[(i,s)] F_s. The dropped element-boundary
//!   term is reconciled across elements by Direct Stiffness Summation.
//!
//! Nodes and operators are expressed on the unit reference element
//! [0, 1], so kernels only scale derivatives by the inverse physical
//! element width.

use faer::Mat;

use crate::basis::{Vandermonde, gauss_lobatto_nodes, gauss_lobatto_weights};

/// 1D GLL collocation basis for one horizontal direction.
#[derive(Clone)]
pub struct HorizontalBasis {
    /// Collocation points per element edge (the horizontal order).
    pub n_nodes: usize,
    /// GLL nodes mapped to [0, 1].
    pub nodes: Vec<f64>,
    /// Quadrature weights on [0, 1].
    pub weights: Vec<f64>,
    /// Strong-form derivative matrix on [0, 1].
    pub dx: Mat<f64>,
    /// Weak-form (stiffness) derivative matrix on [0, 1].
    pub stiffness: Mat<f64>,
}

impl HorizontalBasis {
    /// Build the basis for `n_nodes` collocation points per element edge.
    ///
    /// # Panics
    /// Panics if `n_nodes < 2`; a spectral element needs at least the two
    /// endpoint nodes.
    pub fn new(n_nodes: usize) -> Self {
        assert!(n_nodes >= 2, "horizontal order must be at least 2");
        let degree = n_nodes - 1;

        let ref_nodes = gauss_lobatto_nodes(degree);
        let ref_weights = gauss_lobatto_weights(degree, &ref_nodes);
        let vander = Vandermonde::new(degree, &ref_nodes);

        // Dr = Vr V^-1 on [-1, 1]; the factor 2 maps it to [0, 1].
        let mut dx = Mat::zeros(n_nodes, n_nodes);
        for i in 0..n_nodes {
            for j in 0..n_nodes {
                let mut sum = 0.0;
                for k in 0..n_nodes {
                    sum += vander.vr[(i, k)] * vander.v_inv[(k, j)];
                }
                dx[(i, j)] = 2.0 * sum;
            }
        }

        let mut stiffness = Mat::zeros(n_nodes, n_nodes);
        for i in 0..n_nodes {
            for s in 0..n_nodes {
                stiffness[(i, s)] = (ref_weights[s] / ref_weights[i]) * dx[(s, i)];
            }
        }

        let nodes = ref_nodes.iter().map(|&x| 0.5 * (x + 1.0)).collect();
        let weights = ref_weights.iter().map(|&w| 0.5 * w).collect();

        Self {
            n_nodes,
            nodes,
            weights,
            dx,
            stiffness,
        }
    }
}
