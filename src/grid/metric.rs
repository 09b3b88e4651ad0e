//! Precomputed metric terms for one patch.
//!
//! All arrays are produced once by the grid and are read-only to the
//! dynamics; a stage call holds an immutable borrow for its whole
//! duration, so the caller guarantees no concurrent mutation.

use crate::field::{Field2, Field3, Field4};

/// Metric terms of the curvilinear, terrain-following coordinate system.
///
/// 2D metric-tensor arrays carry their two components in the trailing
/// axis: e.g. `cov_metric_2d_a[(i, j, 0)]` is g_{αα} and
/// `cov_metric_2d_a[(i, j, 1)]` is g_{αβ}. The radial-derivative arrays
/// `deriv_r_*` carry the component (α, β) in the leading axis.
#[derive(Clone, Debug)]
pub struct MetricTerms {
    /// 2D (horizontal) Jacobian.
    pub jacobian_2d: Field2,
    /// 3D Jacobian on model levels.
    pub jacobian_node: Field3,
    /// 3D Jacobian on model interfaces.
    pub jacobian_redge: Field3,
    /// Covariant 2D metric, alpha row (g_{αα}, g_{αβ}).
    pub cov_metric_2d_a: Field3,
    /// Covariant 2D metric, beta row (g_{βα}, g_{ββ}).
    pub cov_metric_2d_b: Field3,
    /// Contravariant 2D metric, alpha row (g^{αα}, g^{αβ}).
    pub contra_metric_2d_a: Field3,
    /// Contravariant 2D metric, beta row (g^{βα}, g^{ββ}).
    pub contra_metric_2d_b: Field3,
    /// Radial derivative of the terrain-following coordinate on levels,
    /// (∂z/∂α, ∂z/∂β) in the leading axis.
    pub deriv_r_node: Field4,
    /// Radial derivative on interfaces.
    pub deriv_r_redge: Field4,
    /// Height of model levels.
    pub z_node: Field3,
    /// Height of model interfaces.
    pub z_redge: Field3,
    /// Coriolis parameter.
    pub coriolis_f: Field2,
    /// Quadrature volume associated with each node (used as the mass
    /// weight of the tracer positivity filter).
    pub element_area_node: Field3,
}

impl MetricTerms {
    /// Flat Cartesian metric for a patch of (ni, nj) nodes and
    /// `n_levels` layers of uniform thickness `dz`.
    ///
    /// Jacobians are one, the metric tensor is the identity, there is no
    /// terrain (zero radial derivatives) and no rotation. `node_area`
    /// gives the horizontal quadrature area of each node.
    pub fn cartesian(
        ni: usize,
        nj: usize,
        n_levels: usize,
        dz: f64,
        node_area: impl Fn(usize, usize) -> f64,
    ) -> Self {
        let mut jacobian_2d = Field2::zeros(ni, nj);
        jacobian_2d.fill(1.0);
        let mut jacobian_node = Field3::zeros(ni, nj, n_levels);
        jacobian_node.fill(1.0);
        let mut jacobian_redge = Field3::zeros(ni, nj, n_levels + 1);
        jacobian_redge.fill(1.0);

        let mut cov_metric_2d_a = Field3::zeros(ni, nj, 2);
        let mut cov_metric_2d_b = Field3::zeros(ni, nj, 2);
        let mut contra_metric_2d_a = Field3::zeros(ni, nj, 2);
        let mut contra_metric_2d_b = Field3::zeros(ni, nj, 2);

        let mut z_node = Field3::zeros(ni, nj, n_levels);
        let mut z_redge = Field3::zeros(ni, nj, n_levels + 1);
        let mut element_area_node = Field3::zeros(ni, nj, n_levels);

        for i in 0..ni {
            for j in 0..nj {
                cov_metric_2d_a[(i, j, 0)] = 1.0;
                cov_metric_2d_b[(i, j, 1)] = 1.0;
                contra_metric_2d_a[(i, j, 0)] = 1.0;
                contra_metric_2d_b[(i, j, 1)] = 1.0;

                for k in 0..n_levels {
                    z_node[(i, j, k)] = (k as f64 + 0.5) * dz;
                    element_area_node[(i, j, k)] = node_area(i, j) * dz;
                }
                for k in 0..=n_levels {
                    z_redge[(i, j, k)] = k as f64 * dz;
                }
            }
        }

        Self {
            jacobian_2d,
            jacobian_node,
            jacobian_redge,
            cov_metric_2d_a,
            cov_metric_2d_b,
            contra_metric_2d_a,
            contra_metric_2d_b,
            deriv_r_node: Field4::zeros(2, ni, nj, n_levels),
            deriv_r_redge: Field4::zeros(2, ni, nj, n_levels + 1),
            z_node,
            z_redge,
            coriolis_f: Field2::zeros(ni, nj),
            element_area_node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_metric_is_identity() {
        let m = MetricTerms::cartesian(4, 4, 3, 100.0, |_, _| 1.0);
        assert_eq!(m.jacobian_2d[(2, 3)], 1.0);
        assert_eq!(m.jacobian_node[(1, 1, 2)], 1.0);
        assert_eq!(m.contra_metric_2d_a[(0, 0, 0)], 1.0);
        assert_eq!(m.contra_metric_2d_a[(0, 0, 1)], 0.0);
        assert_eq!(m.deriv_r_node[(0, 2, 2, 1)], 0.0);
        // Interface heights bracket level heights
        assert!((m.z_redge[(0, 0, 1)] - 100.0).abs() < 1e-12);
        assert!((m.z_node[(0, 0, 1)] - 150.0).abs() < 1e-12);
    }
}
