//! Rayleigh damping (sponge-layer) stage.
//!
//! Relaxes selected components toward the reference profile wherever the
//! damping-rate field is nonzero. The relaxation is subcycled into a
//! fixed number of backward-Euler sub-updates so that large rates remain
//! stable at coarse step sizes: after one call the damped value equals
//! w^N v + (1 - w^N) v_ref with w = 1 / (1 + Δt r / N).

use crate::grid::SpectralGrid;
use crate::types::{STATE_COMPONENTS, StateSlot, VarLocation};

/// Number of backward-Euler sub-updates per call.
pub const RAYLEIGH_SUBCYCLES: usize = 10;

/// Relax the update slot toward the reference state inside sponge
/// regions.
pub fn apply_rayleigh_friction(grid: &mut SpectralGrid, update: StateSlot, dt: f64) {
    let n = grid.n_nodes;
    let nl = grid.n_levels;
    let components = grid.equation_set.rayleigh_components(STATE_COMPONENTS);
    let subcycle_dt = dt / RAYLEIGH_SUBCYCLES as f64;

    // Components split by vertical placement
    let node_components: Vec<usize> = components
        .iter()
        .copied()
        .filter(|&c| grid.var_location(c) == VarLocation::Node)
        .collect();
    let redge_components: Vec<usize> = components
        .iter()
        .copied()
        .filter(|&c| grid.var_location(c) == VarLocation::REdge)
        .collect();

    for patch in &mut grid.patches {
        let pb = patch.patch_box;
        let ni = pb.node_count_a(n);
        let nj = pb.node_count_b(n);

        let reference_node = &patch.reference_node;
        let reference_redge = &patch.reference_redge;
        let rayleigh_node = &patch.rayleigh_node;
        let rayleigh_redge = &patch.rayleigh_redge;
        let update_node = &mut patch.state_node[update.index()];
        let update_redge = &mut patch.state_redge[update.index()];

        for i in 0..ni {
            for j in 0..nj {
                for k in 0..nl {
                    let rate = rayleigh_node[(i, j, k)];
                    if rate == 0.0 {
                        continue;
                    }
                    let w = 1.0 / (1.0 + subcycle_dt * rate);
                    for &c in &node_components {
                        for _ in 0..RAYLEIGH_SUBCYCLES {
                            update_node[(c, i, j, k)] = w * update_node[(c, i, j, k)]
                                + (1.0 - w) * reference_node[(c, i, j, k)];
                        }
                    }
                }

                for k in 0..=nl {
                    let rate = rayleigh_redge[(i, j, k)];
                    if rate == 0.0 {
                        continue;
                    }
                    let w = 1.0 / (1.0 + subcycle_dt * rate);
                    for &c in &redge_components {
                        for _ in 0..RAYLEIGH_SUBCYCLES {
                            update_redge[(c, i, j, k)] = w * update_redge[(c, i, j, k)]
                                + (1.0 - w) * reference_redge[(c, i, j, k)];
                        }
                    }
                }
            }
        }
    }
}
