//! A rectangular patch of spectral elements and its state buffers.
//!
//! Each element stores its own copy of every collocation node, including
//! the nodes on shared element edges; duplicated edge values are
//! reconciled by Direct Stiffness Summation after each stage. All state
//! lives in named buffer slots owned by the patch, and stages address
//! them through [`StateSlot`] identifiers rather than holding views.

use crate::equations::EquationSetVariant;
use crate::field::{Field3, Field4};
use crate::operators::HorizontalBasis;
use crate::types::{STATE_COMPONENTS, STATE_SLOTS, StateSlot, UIX, VIX};

use super::metric::MetricTerms;

/// Logical extent of a patch.
#[derive(Clone, Copy, Debug)]
pub struct PatchBox {
    /// Number of spectral elements in the alpha direction.
    pub element_count_a: usize,
    /// Number of spectral elements in the beta direction.
    pub element_count_b: usize,
    /// Physical element width in alpha.
    pub delta_a: f64,
    /// Physical element width in beta.
    pub delta_b: f64,
}

impl PatchBox {
    /// Total collocation nodes in alpha (edge nodes stored per element).
    #[inline]
    pub fn node_count_a(&self, n_nodes: usize) -> usize {
        self.element_count_a * n_nodes
    }

    /// Total collocation nodes in beta.
    #[inline]
    pub fn node_count_b(&self, n_nodes: usize) -> usize {
        self.element_count_b * n_nodes
    }
}

/// One patch: metric terms plus every state buffer the stages touch.
///
/// Buffer arrays are separate public fields so that a stage can borrow,
/// say, the update-slot state mutably while reading the metric and the
/// reference state, without interior mutability or unsafe views.
pub struct GridPatch {
    pub patch_box: PatchBox,
    pub metric: MetricTerms,
    /// Prognostic state on model levels, one [`Field4`] per slot.
    pub state_node: [Field4; STATE_SLOTS],
    /// Prognostic state on model interfaces, one per slot.
    pub state_redge: [Field4; STATE_SLOTS],
    /// Tracer mass fields on model levels, one per slot.
    pub tracers: [Field4; STATE_SLOTS],
    /// Reference state on levels (not addressable as a slot).
    pub reference_node: Field4,
    /// Reference state on interfaces.
    pub reference_redge: Field4,
    /// Diagnosed pressure on levels.
    pub pressure: Field3,
    /// Rayleigh relaxation rate on levels.
    pub rayleigh_node: Field3,
    /// Rayleigh relaxation rate on interfaces.
    pub rayleigh_redge: Field3,
    /// Relative vorticity diagnostic on levels.
    pub vorticity: Field3,
    /// Horizontal divergence diagnostic on levels.
    pub divergence: Field3,
}

impl GridPatch {
    /// Allocate a patch with all buffers zeroed.
    pub fn new(
        patch_box: PatchBox,
        n_nodes: usize,
        n_levels: usize,
        n_tracers: usize,
        metric: MetricTerms,
    ) -> Self {
        let ni = patch_box.node_count_a(n_nodes);
        let nj = patch_box.node_count_b(n_nodes);

        let node = || Field4::zeros(STATE_COMPONENTS, ni, nj, n_levels);
        let redge = || Field4::zeros(STATE_COMPONENTS, ni, nj, n_levels + 1);
        let tracer = || Field4::zeros(n_tracers, ni, nj, n_levels);

        Self {
            patch_box,
            metric,
            state_node: [node(), node(), node()],
            state_redge: [redge(), redge(), redge()],
            tracers: [tracer(), tracer(), tracer()],
            reference_node: node(),
            reference_redge: redge(),
            pressure: Field3::zeros(ni, nj, n_levels),
            rayleigh_node: Field3::zeros(ni, nj, n_levels),
            rayleigh_redge: Field3::zeros(ni, nj, n_levels + 1),
            vorticity: Field3::zeros(ni, nj, n_levels),
            divergence: Field3::zeros(ni, nj, n_levels),
        }
    }

    /// Diagnose relative vorticity and horizontal divergence on levels
    /// from the momentum in `momentum_slot` and the density-like
    /// component `density_index` of `density_slot`.
    ///
    /// Divergence is formed in flux form, (1/J)(∂_α(J u^α) + ∂_β(J u^β));
    /// vorticity from the covariant velocity, (1/J)(∂_α u_β − ∂_β u_α).
    /// Both use the strong-form derivative; edge duplicates are left to a
    /// later continuity pass.
    pub fn compute_curl_and_div(
        &mut self,
        momentum_slot: StateSlot,
        density_slot: StateSlot,
        equation_set: EquationSetVariant,
        basis: &HorizontalBasis,
    ) {
        let n = basis.n_nodes;
        let ni = self.patch_box.node_count_a(n);
        let nj = self.patch_box.node_count_b(n);
        let nl = self.pressure.nk();
        let density_index = equation_set.density_index();

        let momentum = &self.state_node[momentum_slot.index()];
        let density = &self.state_node[density_slot.index()];

        // Contravariant velocity, flux-form velocity and covariant
        // velocity, precomputed over the whole patch.
        let mut flux_a = Field3::zeros(ni, nj, nl);
        let mut flux_b = Field3::zeros(ni, nj, nl);
        let mut cov_ua = Field3::zeros(ni, nj, nl);
        let mut cov_ub = Field3::zeros(ni, nj, nl);

        for i in 0..ni {
            for j in 0..nj {
                let jac = self.metric.jacobian_2d[(i, j)];
                let g_aa = self.metric.cov_metric_2d_a[(i, j, 0)];
                let g_ab = self.metric.cov_metric_2d_a[(i, j, 1)];
                let g_ba = self.metric.cov_metric_2d_b[(i, j, 0)];
                let g_bb = self.metric.cov_metric_2d_b[(i, j, 1)];

                for k in 0..nl {
                    let rho = density[(density_index, i, j, k)];
                    let ua = momentum[(UIX, i, j, k)] / rho;
                    let ub = momentum[(VIX, i, j, k)] / rho;

                    flux_a[(i, j, k)] = jac * ua;
                    flux_b[(i, j, k)] = jac * ub;
                    cov_ua[(i, j, k)] = g_aa * ua + g_ab * ub;
                    cov_ub[(i, j, k)] = g_ba * ua + g_bb * ub;
                }
            }
        }

        let inv_da = 1.0 / self.patch_box.delta_a;
        let inv_db = 1.0 / self.patch_box.delta_b;

        for ea in 0..self.patch_box.element_count_a {
            for eb in 0..self.patch_box.element_count_b {
                for p in 0..n {
                    for q in 0..n {
                        let i = ea * n + p;
                        let j = eb * n + q;
                        let inv_jac = 1.0 / self.metric.jacobian_2d[(i, j)];

                        for k in 0..nl {
                            let mut div = 0.0;
                            let mut vort = 0.0;
                            for s in 0..n {
                                let is = ea * n + s;
                                let js = eb * n + s;
                                div += basis.dx[(p, s)] * flux_a[(is, j, k)] * inv_da
                                    + basis.dx[(q, s)] * flux_b[(i, js, k)] * inv_db;
                                vort += basis.dx[(p, s)] * cov_ub[(is, j, k)] * inv_da
                                    - basis.dx[(q, s)] * cov_ua[(i, js, k)] * inv_db;
                            }
                            self.divergence[(i, j, k)] = inv_jac * div;
                            self.vorticity[(i, j, k)] = inv_jac * vort;
                        }
                    }
                }
            }
        }
    }
}

/// Borrow two distinct slots of the same buffer family mutably.
///
/// # Panics
/// Panics if `a` and `b` name the same slot; aliasing must be rejected by
/// the caller before any state mutation.
pub fn slot_pair_mut(
    buffers: &mut [Field4; STATE_SLOTS],
    a: StateSlot,
    b: StateSlot,
) -> (&mut Field4, &mut Field4) {
    let (ia, ib) = (a.index(), b.index());
    assert_ne!(ia, ib, "slot_pair_mut requires distinct slots");
    if ia < ib {
        let (lo, hi) = buffers.split_at_mut(ib);
        (&mut lo[ia], &mut hi[0])
    } else {
        let (lo, hi) = buffers.split_at_mut(ia);
        (&mut hi[0], &mut lo[ib])
    }
}
