//! Reusable per-element scratch buffers.
//!
//! Allocated once from the horizontal order and vertical-level count,
//! never resized. Interface-located arrays carry L+1 rows; the boundary
//! rows k = 0 and k = L of the S-dot momentum fluxes are written by no
//! stage and must stay zero, which makes the one-sided vertical
//! differences at the domain top and bottom come out right. A workspace
//! belongs to exactly one dynamics instance and is not reentrant.

use crate::field::Field3;

/// Scratch buffers shared by all stages of one dynamics instance.
pub struct Workspace {
    /// Contravariant alpha velocity on levels.
    pub con_ua: Field3,
    /// Contravariant beta velocity on levels.
    pub con_ub: Field3,
    /// Covariant alpha velocity on levels.
    pub cov_ua: Field3,
    /// Covariant beta velocity on levels.
    pub cov_ub: Field3,
    /// Specific 2D kinetic energy on levels.
    pub kinetic_energy: Field3,
    /// Interface-to-level averaged vertical momentum flux.
    pub sdot_w_node: Field3,
    /// Alpha mass flux on levels.
    pub alpha_mass_flux: Field3,
    /// Beta mass flux on levels.
    pub beta_mass_flux: Field3,
    /// Alpha rhotheta flux on levels.
    pub alpha_pressure_flux: Field3,
    /// Beta rhotheta flux on levels.
    pub beta_pressure_flux: Field3,
    /// Thermodynamic derivative dp/d(rhotheta) on levels.
    pub dp_drhotheta: Field3,
    /// S-dot weighted alpha momentum on interfaces.
    pub sdot_ua_redge: Field3,
    /// S-dot weighted beta momentum on interfaces.
    pub sdot_ub_redge: Field3,
    /// Alpha flux of vertical momentum on interfaces.
    pub alpha_vertical_momentum_flux_redge: Field3,
    /// Beta flux of vertical momentum on interfaces.
    pub beta_vertical_momentum_flux_redge: Field3,
    /// Scalar-diffusion input buffer (sized for interfaces).
    pub buffer_state: Field3,
    /// Jacobian-weighted alpha gradient accumulator.
    pub j_gradient_a: Field3,
    /// Jacobian-weighted beta gradient accumulator.
    pub j_gradient_b: Field3,
    /// Tridiagonal sub-diagonal band per column.
    pub band_sub: Field3,
    /// Tridiagonal main-diagonal band per column.
    pub band_diag: Field3,
    /// Tridiagonal super-diagonal band per column.
    pub band_sup: Field3,
    /// Tridiagonal right-hand side; holds the solution after a solve.
    pub band_rhs: Field3,
    /// Per-column solve status, row-major over the element.
    pub solve_status: Vec<i32>,
}

impl Workspace {
    /// Allocate all scratch buffers for `n_nodes` collocation points per
    /// element edge and `n_levels` model levels.
    pub fn new(n_nodes: usize, n_levels: usize) -> Self {
        let node = || Field3::zeros(n_nodes, n_nodes, n_levels);
        let redge = || Field3::zeros(n_nodes, n_nodes, n_levels + 1);

        Self {
            con_ua: node(),
            con_ub: node(),
            cov_ua: node(),
            cov_ub: node(),
            kinetic_energy: node(),
            sdot_w_node: node(),
            alpha_mass_flux: node(),
            beta_mass_flux: node(),
            alpha_pressure_flux: node(),
            beta_pressure_flux: node(),
            dp_drhotheta: node(),
            sdot_ua_redge: redge(),
            sdot_ub_redge: redge(),
            alpha_vertical_momentum_flux_redge: redge(),
            beta_vertical_momentum_flux_redge: redge(),
            buffer_state: redge(),
            j_gradient_a: redge(),
            j_gradient_b: redge(),
            band_sub: redge(),
            band_diag: redge(),
            band_sup: redge(),
            band_rhs: redge(),
            solve_status: vec![0; n_nodes * n_nodes],
        }
    }
}
