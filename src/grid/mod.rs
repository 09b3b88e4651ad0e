//! Spectral-element grid: patches, state-buffer bookkeeping, and the
//! continuity (Direct Stiffness Summation) pass.
//!
//! The grid owns every state buffer. Dynamics stages receive `&mut`
//! access for the duration of one call and address buffers by
//! [`StateSlot`]; nothing in the crate retains a long-lived view into
//! grid storage.

pub mod metric;
pub mod patch;

pub use metric::MetricTerms;
pub use patch::{GridPatch, PatchBox, slot_pair_mut};

use crate::equations::{EquationSetVariant, PhysicalConstants};
use crate::field::Field4;
use crate::operators::HorizontalBasis;
use crate::types::{FieldKind, PIX, STATE_COMPONENTS, StateSlot, VarLocation, WIX};

/// The spectral-element grid handle passed to every dynamics stage.
pub struct SpectralGrid {
    /// Collocation nodes per element edge (the horizontal order).
    pub n_nodes: usize,
    /// Number of model levels.
    pub n_levels: usize,
    /// Number of tracer fields.
    pub n_tracers: usize,
    /// 1D collocation basis shared by both horizontal directions.
    pub basis: HorizontalBasis,
    /// Physical constants of the equation of state.
    pub constants: PhysicalConstants,
    /// Equation-set variant being integrated.
    pub equation_set: EquationSetVariant,
    /// Horizontal reference length used to normalize the local
    /// hyperdiffusion scaling.
    pub reference_length: f64,
    /// The patches of this rank. Single-rank runs hold exactly one.
    pub patches: Vec<GridPatch>,
}

impl SpectralGrid {
    /// Build a single doubly-periodic patch with a flat Cartesian metric
    /// of extent `extent_a` × `extent_b` × `extent_z`.
    pub fn uniform_cartesian(
        n_nodes: usize,
        element_count_a: usize,
        element_count_b: usize,
        n_levels: usize,
        n_tracers: usize,
        extent_a: f64,
        extent_b: f64,
        extent_z: f64,
        equation_set: EquationSetVariant,
    ) -> Self {
        let basis = HorizontalBasis::new(n_nodes);
        let patch_box = PatchBox {
            element_count_a,
            element_count_b,
            delta_a: extent_a / element_count_a as f64,
            delta_b: extent_b / element_count_b as f64,
        };

        let ni = patch_box.node_count_a(n_nodes);
        let nj = patch_box.node_count_b(n_nodes);
        let dz = extent_z / n_levels as f64;

        let weights = basis.weights.clone();
        let (da, db) = (patch_box.delta_a, patch_box.delta_b);
        let metric = MetricTerms::cartesian(ni, nj, n_levels, dz, move |i, j| {
            weights[i % n_nodes] * da * weights[j % n_nodes] * db
        });

        let patch = GridPatch::new(patch_box, n_nodes, n_levels, n_tracers, metric);

        Self {
            n_nodes,
            n_levels,
            n_tracers,
            basis,
            constants: PhysicalConstants::default(),
            equation_set,
            reference_length: extent_a / element_count_a as f64,
            patches: vec![patch],
        }
    }

    /// Vertical placement of a state component.
    #[inline]
    pub fn var_location(&self, component: usize) -> VarLocation {
        if component == WIX {
            VarLocation::REdge
        } else {
            VarLocation::Node
        }
    }

    /// Diagnose pressure on model levels from the rhotheta component of
    /// `slot`, writing each patch's pressure buffer.
    pub fn compute_pressure(&mut self, slot: StateSlot) {
        let constants = self.constants;
        let n = self.n_nodes;
        let nl = self.n_levels;
        for patch in &mut self.patches {
            let ni = patch.patch_box.node_count_a(n);
            let nj = patch.patch_box.node_count_b(n);
            let state = &patch.state_node[slot.index()];
            for i in 0..ni {
                for j in 0..nj {
                    for k in 0..nl {
                        patch.pressure[(i, j, k)] =
                            constants.pressure_from_rhotheta(state[(PIX, i, j, k)]);
                    }
                }
            }
        }
    }

    /// Copy one buffer slot into another.
    pub fn copy_state(&mut self, from: StateSlot, to: StateSlot, kind: FieldKind) {
        if from == to {
            return;
        }
        for patch in &mut self.patches {
            match kind {
                FieldKind::State => {
                    let (src, dst) = slot_pair_mut(&mut patch.state_node, from, to);
                    dst.copy_from(src);
                    let (src, dst) = slot_pair_mut(&mut patch.state_redge, from, to);
                    dst.copy_from(src);
                }
                FieldKind::Tracers => {
                    let (src, dst) = slot_pair_mut(&mut patch.tracers, from, to);
                    dst.copy_from(src);
                }
            }
        }
    }

    /// Zero one buffer slot.
    pub fn zero_state(&mut self, slot: StateSlot, kind: FieldKind) {
        for patch in &mut self.patches {
            match kind {
                FieldKind::State => {
                    patch.state_node[slot.index()].fill(0.0);
                    patch.state_redge[slot.index()].fill(0.0);
                }
                FieldKind::Tracers => {
                    patch.tracers[slot.index()].fill(0.0);
                }
            }
        }
    }

    /// Direct Stiffness Summation: average the duplicated collocation
    /// values on shared element edges, restoring C0 continuity after a
    /// stage has written element-local tendencies.
    ///
    /// Each state component is reconciled at its own vertical placement.
    /// Patch boundaries wrap periodically.
    pub fn apply_dss(&mut self, slot: StateSlot, kind: FieldKind) {
        let n = self.n_nodes;
        for patch in &mut self.patches {
            let pb = patch.patch_box;
            match kind {
                FieldKind::State => {
                    for c in 0..STATE_COMPONENTS {
                        let buffer = if c == WIX {
                            &mut patch.state_redge[slot.index()]
                        } else {
                            &mut patch.state_node[slot.index()]
                        };
                        dss_component(buffer, c, n, pb);
                    }
                }
                FieldKind::Tracers => {
                    let buffer = &mut patch.tracers[slot.index()];
                    for c in 0..buffer.nc() {
                        dss_component(buffer, c, n, pb);
                    }
                }
            }
        }
    }

    /// Diagnose vorticity and divergence on every patch.
    ///
    /// Values at shared element edges are element-local; downstream weak
    /// derivatives tolerate the discontinuity.
    pub fn compute_curl_and_div(&mut self, momentum_slot: StateSlot, density_slot: StateSlot) {
        let equation_set = self.equation_set;
        let basis = self.basis.clone();
        for patch in &mut self.patches {
            patch.compute_curl_and_div(momentum_slot, density_slot, equation_set, &basis);
        }
    }
}

/// Average duplicated edge values of one component of a 4D buffer.
fn dss_component(f: &mut Field4, c: usize, n_nodes: usize, pb: PatchBox) {
    let ni = pb.node_count_a(n_nodes);
    let nj = pb.node_count_b(n_nodes);
    let nk = f.nk();

    // Alpha-direction edges, periodic wrap included.
    for ea in 0..pb.element_count_a {
        let i_left = ea * n_nodes + (n_nodes - 1);
        let i_right = ((ea + 1) % pb.element_count_a) * n_nodes;
        for j in 0..nj {
            for k in 0..nk {
                let avg = 0.5 * (f[(c, i_left, j, k)] + f[(c, i_right, j, k)]);
                f[(c, i_left, j, k)] = avg;
                f[(c, i_right, j, k)] = avg;
            }
        }
    }

    // Beta-direction edges.
    for eb in 0..pb.element_count_b {
        let j_left = eb * n_nodes + (n_nodes - 1);
        let j_right = ((eb + 1) % pb.element_count_b) * n_nodes;
        for i in 0..ni {
            for k in 0..nk {
                let avg = 0.5 * (f[(c, i, j_left, k)] + f[(c, i, j_right, k)]);
                f[(c, i, j_left, k)] = avg;
                f[(c, i, j_right, k)] = avg;
            }
        }
    }
}
