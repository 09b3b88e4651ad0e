//! Scalar and vector hyperdiffusion operators.
//!
//! The scalar operator is a discrete Laplacian: a spectral gradient
//! transformed to contravariant form and weighted by the Jacobian,
//! followed by a weak-form divergence. The vector operator damps the
//! divergence and vorticity of the horizontal velocity independently
//! and maps the result back to momentum tendencies. Both accumulate
//! `-Δt·ν·(...)` into the update slot, so a second-order application
//! passes the physical Δt and a fourth-order composition passes unit
//! coefficients on the first pass and a negated Δt on the second.

use crate::error::DynamicsError;
use crate::field::{Field3, Field4};
use crate::grid::{MetricTerms, PatchBox, SpectralGrid, slot_pair_mut};
use crate::operators::HorizontalBasis;
use crate::types::{PIX, STATE_COMPONENTS, StateSlot, UIX, VIX, WIX};

use super::workspace::Workspace;

/// Exponent of the local element-size scaling of ν.
const LOCAL_NU_EXPONENT: f64 = 3.2;

fn local_nu(nu: f64, scale_locally: bool, delta_a: f64, reference_length: f64) -> f64 {
    if scale_locally && reference_length != 0.0 {
        nu * (delta_a / reference_length).powf(LOCAL_NU_EXPONENT)
    } else {
        nu
    }
}

/// Apply the scalar diffusion operator to state scalars and tracers.
///
/// With `component` set, only that state component is diffused and
/// tracers are skipped; otherwise every thermodynamic component (all but
/// the horizontal momenta) and every tracer is processed. When
/// `remove_ref_state` is set the reference profile is subtracted from
/// state fields before the gradient is taken.
#[allow(clippy::too_many_arguments)]
pub fn apply_scalar_hyperdiffusion(
    grid: &mut SpectralGrid,
    ws: &mut Workspace,
    initial: StateSlot,
    update: StateSlot,
    dt: f64,
    nu: f64,
    scale_nu_locally: bool,
    component: Option<usize>,
    remove_ref_state: bool,
) -> Result<(), DynamicsError> {
    if initial == update {
        return Err(DynamicsError::Precondition {
            a: initial,
            b: update,
        });
    }
    if let Some(c) = component {
        if c >= STATE_COMPONENTS {
            return Err(DynamicsError::config(format!(
                "invalid targeted component index {c}"
            )));
        }
    }

    let n = grid.n_nodes;
    let nl = grid.n_levels;
    let n_tracers = grid.n_tracers;
    let reference_length = grid.reference_length;
    let basis = &grid.basis;

    // Thermodynamic state components only; momenta are handled by the
    // vector operator.
    let (component_start, component_end) = match component {
        Some(c) => (c, c + 1),
        None => (PIX, STATE_COMPONENTS),
    };

    for patch in &mut grid.patches {
        let pb = patch.patch_box;
        let nu_local = local_nu(nu, scale_nu_locally, pb.delta_a, reference_length);

        let metric = &patch.metric;
        let reference_node = &patch.reference_node;
        let reference_redge = &patch.reference_redge;
        let (init_node, upd_node) = slot_pair_mut(&mut patch.state_node, initial, update);
        let (init_redge, upd_redge) = slot_pair_mut(&mut patch.state_redge, initial, update);
        let (init_tracer, upd_tracer) = slot_pair_mut(&mut patch.tracers, initial, update);

        for c in component_start..component_end {
            let on_redge = c == WIX;
            if on_redge {
                diffuse_component(
                    ws,
                    basis,
                    metric,
                    &metric.jacobian_redge,
                    pb,
                    n,
                    nl + 1,
                    init_redge,
                    upd_redge,
                    remove_ref_state.then_some(reference_redge),
                    c,
                    dt,
                    nu_local,
                );
            } else {
                diffuse_component(
                    ws,
                    basis,
                    metric,
                    &metric.jacobian_node,
                    pb,
                    n,
                    nl,
                    init_node,
                    upd_node,
                    remove_ref_state.then_some(reference_node),
                    c,
                    dt,
                    nu_local,
                );
            }
        }

        if component.is_none() {
            for c in 0..n_tracers {
                diffuse_component(
                    ws,
                    basis,
                    metric,
                    &metric.jacobian_node,
                    pb,
                    n,
                    nl,
                    init_tracer,
                    upd_tracer,
                    None,
                    c,
                    dt,
                    nu_local,
                );
            }
        }
    }

    Ok(())
}

/// Laplacian of one component over every element of a patch.
#[allow(clippy::too_many_arguments)]
fn diffuse_component(
    ws: &mut Workspace,
    basis: &HorizontalBasis,
    metric: &MetricTerms,
    jacobian: &Field3,
    pb: PatchBox,
    n: usize,
    nk: usize,
    init: &Field4,
    upd: &mut Field4,
    reference: Option<&Field4>,
    c: usize,
    dt: f64,
    nu: f64,
) {
    let inv_da = 1.0 / pb.delta_a;
    let inv_db = 1.0 / pb.delta_b;

    for ea in 0..pb.element_count_a {
        for eb in 0..pb.element_count_b {
            let ia0 = ea * n;
            let ib0 = eb * n;

            for i in 0..n {
                for j in 0..n {
                    let (ia, ib) = (ia0 + i, ib0 + j);
                    for k in 0..nk {
                        let mut psi = init[(c, ia, ib, k)];
                        if let Some(reference) = reference {
                            psi -= reference[(c, ia, ib, k)];
                        }
                        ws.buffer_state[(i, j, k)] = psi;
                    }
                }
            }

            // Jacobian-weighted contravariant gradient
            for i in 0..n {
                for j in 0..n {
                    let (ia, ib) = (ia0 + i, ib0 + j);
                    for k in 0..nk {
                        let mut da_psi = 0.0;
                        let mut db_psi = 0.0;
                        for s in 0..n {
                            da_psi += ws.buffer_state[(s, j, k)] * basis.dx[(i, s)];
                            db_psi += ws.buffer_state[(i, s, k)] * basis.dx[(j, s)];
                        }
                        da_psi *= inv_da;
                        db_psi *= inv_db;

                        ws.j_gradient_a[(i, j, k)] = jacobian[(ia, ib, k)]
                            * (metric.contra_metric_2d_a[(ia, ib, 0)] * da_psi
                                + metric.contra_metric_2d_a[(ia, ib, 1)] * db_psi);
                        ws.j_gradient_b[(i, j, k)] = jacobian[(ia, ib, k)]
                            * (metric.contra_metric_2d_b[(ia, ib, 0)] * da_psi
                                + metric.contra_metric_2d_b[(ia, ib, 1)] * db_psi);
                    }
                }
            }

            // Weak-form divergence of the gradient flux
            for i in 0..n {
                for j in 0..n {
                    let (ia, ib) = (ia0 + i, ib0 + j);
                    for k in 0..nk {
                        let inv_jacobian = 1.0 / jacobian[(ia, ib, k)];

                        let mut update_a = 0.0;
                        let mut update_b = 0.0;
                        for s in 0..n {
                            update_a += ws.j_gradient_a[(s, j, k)] * basis.stiffness[(i, s)];
                            update_b += ws.j_gradient_b[(i, s, k)] * basis.stiffness[(j, s)];
                        }
                        update_a *= inv_da;
                        update_b *= inv_db;

                        upd[(c, ia, ib, k)] -= dt * inv_jacobian * nu * (update_a + update_b);
                    }
                }
            }
        }
    }
}

/// Apply divergence/vorticity damping to the horizontal momentum.
///
/// The velocity decomposed is the one in `working`; the density scaling
/// comes from `initial`. The two may alias (second-order diffusion
/// decomposes the initial state directly), but `update` must be distinct
/// from both.
#[allow(clippy::too_many_arguments)]
pub fn apply_vector_hyperdiffusion(
    grid: &mut SpectralGrid,
    initial: StateSlot,
    working: StateSlot,
    update: StateSlot,
    dt: f64,
    nu_div: f64,
    nu_vort: f64,
    scale_nu_locally: bool,
) -> Result<(), DynamicsError> {
    if update == initial {
        return Err(DynamicsError::Precondition {
            a: update,
            b: initial,
        });
    }
    if update == working {
        return Err(DynamicsError::Precondition {
            a: update,
            b: working,
        });
    }

    let n = grid.n_nodes;
    let nl = grid.n_levels;
    let reference_length = grid.reference_length;
    let density_index = grid.equation_set.density_index();

    grid.compute_curl_and_div(working, initial);

    let basis = &grid.basis;
    for patch in &mut grid.patches {
        let pb = patch.patch_box;
        let inv_da = 1.0 / pb.delta_a;
        let inv_db = 1.0 / pb.delta_b;

        let nu_div_local = local_nu(nu_div, scale_nu_locally, pb.delta_a, reference_length);
        let nu_vort_local = local_nu(nu_vort, scale_nu_locally, pb.delta_a, reference_length);

        let metric = &patch.metric;
        let curl = &patch.vorticity;
        let div = &patch.divergence;
        let (init_node, upd_node) = slot_pair_mut(&mut patch.state_node, initial, update);

        for ea in 0..pb.element_count_a {
            for eb in 0..pb.element_count_b {
                let ia0 = ea * n;
                let ib0 = eb * n;

                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);
                        for k in 0..nl {
                            let mut da_div = 0.0;
                            let mut db_div = 0.0;
                            let mut da_curl = 0.0;
                            let mut db_curl = 0.0;

                            for s in 0..n {
                                da_div -= basis.stiffness[(i, s)] * div[(ia0 + s, ib, k)];
                                db_div -= basis.stiffness[(j, s)] * div[(ia, ib0 + s, k)];
                                da_curl -= basis.stiffness[(i, s)] * curl[(ia0 + s, ib, k)];
                                db_curl -= basis.stiffness[(j, s)] * curl[(ia, ib0 + s, k)];
                            }
                            da_div *= inv_da;
                            db_div *= inv_db;
                            da_curl *= inv_da;
                            db_curl *= inv_db;

                            let jacobian_2d = metric.jacobian_2d[(ia, ib)];

                            let update_cov_ua = nu_div_local * da_div
                                - nu_vort_local
                                    * jacobian_2d
                                    * (metric.contra_metric_2d_b[(ia, ib, 0)] * da_curl
                                        + metric.contra_metric_2d_b[(ia, ib, 1)] * db_curl);
                            let update_cov_ub = nu_div_local * db_div
                                + nu_vort_local
                                    * jacobian_2d
                                    * (metric.contra_metric_2d_a[(ia, ib, 0)] * da_curl
                                        + metric.contra_metric_2d_a[(ia, ib, 1)] * db_curl);

                            let update_con_ua = metric.contra_metric_2d_a[(ia, ib, 0)]
                                * update_cov_ua
                                + metric.contra_metric_2d_a[(ia, ib, 1)] * update_cov_ub;
                            let update_con_ub = metric.contra_metric_2d_b[(ia, ib, 0)]
                                * update_cov_ua
                                + metric.contra_metric_2d_b[(ia, ib, 1)] * update_cov_ub;

                            let rho = init_node[(density_index, ia, ib, k)];

                            upd_node[(UIX, ia, ib, k)] -= dt * rho * update_con_ua;
                            upd_node[(VIX, ia, ib, k)] -= dt * rho * update_con_ub;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
