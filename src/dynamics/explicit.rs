//! Explicit horizontal tendency stage.
//!
//! Accumulates into the update slot the horizontal flux-divergence,
//! pressure-gradient, kinetic-energy and vorticity contributions to the
//! momentum, density, and rhotheta equations on levels, and the flux of
//! vertical momentum on interfaces. As a side effect the interface
//! values of density, momentum and potential temperature in the initial
//! slot are refreshed by level-to-interface averaging; the interface
//! rhotheta slot holds theta, not rhotheta, after this stage.
//!
//! No continuity enforcement happens here; the outer driver reconciles
//! element edges once per sub-step.

use crate::error::DynamicsError;
use crate::grid::{SpectralGrid, slot_pair_mut};
use crate::types::{PIX, RIX, StateSlot, UIX, VIX, WIX};

use super::workspace::Workspace;

/// Accumulate explicit horizontal tendencies over Δt into `update`.
pub fn step_explicit(
    grid: &mut SpectralGrid,
    ws: &mut Workspace,
    initial: StateSlot,
    update: StateSlot,
    dt: f64,
) -> Result<(), DynamicsError> {
    if initial == update {
        return Err(DynamicsError::Precondition {
            a: initial,
            b: update,
        });
    }

    let n = grid.n_nodes;
    let nl = grid.n_levels;

    grid.compute_pressure(initial);

    let basis = &grid.basis;
    for patch in &mut grid.patches {
        let pb = patch.patch_box;
        let inv_da = 1.0 / pb.delta_a;
        let inv_db = 1.0 / pb.delta_b;

        let metric = &patch.metric;
        let pressure = &patch.pressure;
        let (init_node, upd_node) = slot_pair_mut(&mut patch.state_node, initial, update);
        let (init_redge, upd_redge) = slot_pair_mut(&mut patch.state_redge, initial, update);

        for ea in 0..pb.element_count_a {
            for eb in 0..pb.element_count_b {
                let ia0 = ea * n;
                let ib0 = eb * n;

                // Interpolate to interfaces and form S-dot fluxes. The
                // boundary rows k = 0 and k = L of the S-dot scratch
                // arrays stay zero (rigid bottom and top).
                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);
                        for k in 1..nl {
                            let rho_redge = 0.5
                                * (init_node[(RIX, ia, ib, k - 1)] + init_node[(RIX, ia, ib, k)]);
                            init_redge[(RIX, ia, ib, k)] = rho_redge;
                            let inv_rho_redge = 1.0 / rho_redge;

                            init_redge[(UIX, ia, ib, k)] = 0.5
                                * (init_node[(UIX, ia, ib, k - 1)] + init_node[(UIX, ia, ib, k)]);
                            init_redge[(VIX, ia, ib, k)] = 0.5
                                * (init_node[(VIX, ia, ib, k - 1)] + init_node[(VIX, ia, ib, k)]);

                            // Theta, not rhotheta, on interfaces
                            init_redge[(PIX, ia, ib, k)] = inv_rho_redge
                                * 0.5
                                * (init_node[(PIX, ia, ib, k - 1)] + init_node[(PIX, ia, ib, k)]);

                            let sdot_redge = init_redge[(WIX, ia, ib, k)]
                                - init_redge[(UIX, ia, ib, k)] * metric.deriv_r_redge[(0, ia, ib, k)]
                                - init_redge[(VIX, ia, ib, k)] * metric.deriv_r_redge[(1, ia, ib, k)];
                            let sdot_inv_rho = sdot_redge * inv_rho_redge;

                            ws.sdot_ua_redge[(i, j, k)] =
                                sdot_inv_rho * init_redge[(UIX, ia, ib, k)];
                            ws.sdot_ub_redge[(i, j, k)] =
                                sdot_inv_rho * init_redge[(VIX, ia, ib, k)];

                            let vertical_momentum_base_flux = metric.jacobian_redge[(ia, ib, k)]
                                * init_redge[(WIX, ia, ib, k)]
                                * inv_rho_redge;

                            ws.alpha_vertical_momentum_flux_redge[(i, j, k)] =
                                vertical_momentum_base_flux * init_redge[(UIX, ia, ib, k)];
                            ws.beta_vertical_momentum_flux_redge[(i, j, k)] =
                                vertical_momentum_base_flux * init_redge[(VIX, ia, ib, k)];
                        }
                    }
                }

                // Auxiliary quantities on levels
                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);
                        for k in 0..nl {
                            let rho_ua = init_node[(UIX, ia, ib, k)];
                            let rho_ub = init_node[(VIX, ia, ib, k)];
                            let inv_rho = 1.0 / init_node[(RIX, ia, ib, k)];

                            ws.con_ua[(i, j, k)] = inv_rho * rho_ua;
                            ws.con_ub[(i, j, k)] = inv_rho * rho_ub;

                            ws.cov_ua[(i, j, k)] = metric.cov_metric_2d_a[(ia, ib, 0)]
                                * ws.con_ua[(i, j, k)]
                                + metric.cov_metric_2d_a[(ia, ib, 1)] * ws.con_ub[(i, j, k)];
                            ws.cov_ub[(i, j, k)] = metric.cov_metric_2d_b[(ia, ib, 0)]
                                * ws.con_ua[(i, j, k)]
                                + metric.cov_metric_2d_b[(ia, ib, 1)] * ws.con_ub[(i, j, k)];

                            ws.alpha_mass_flux[(i, j, k)] =
                                metric.jacobian_node[(ia, ib, k)] * rho_ua;
                            ws.beta_mass_flux[(i, j, k)] =
                                metric.jacobian_node[(ia, ib, k)] * rho_ub;

                            ws.alpha_pressure_flux[(i, j, k)] = ws.alpha_mass_flux[(i, j, k)]
                                * init_node[(PIX, ia, ib, k)]
                                * inv_rho;
                            ws.beta_pressure_flux[(i, j, k)] = ws.beta_mass_flux[(i, j, k)]
                                * init_node[(PIX, ia, ib, k)]
                                * inv_rho;

                            ws.kinetic_energy[(i, j, k)] = 0.5
                                * (ws.cov_ua[(i, j, k)] * ws.con_ua[(i, j, k)]
                                    + ws.cov_ub[(i, j, k)] * ws.con_ub[(i, j, k)]);

                            ws.sdot_w_node[(i, j, k)] = 0.5
                                * (init_redge[(WIX, ia, ib, k)] + init_redge[(WIX, ia, ib, k + 1)])
                                - metric.deriv_r_node[(0, ia, ib, k)] * rho_ua
                                - metric.deriv_r_node[(1, ia, ib, k)] * rho_ub;
                        }
                    }
                }

                // Nodal updates
                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);
                        for k in 0..nl {
                            let mut da_p = 0.0;
                            let mut db_p = 0.0;
                            let mut da_mass_flux = 0.0;
                            let mut db_mass_flux = 0.0;
                            let mut da_pressure_flux = 0.0;
                            let mut db_pressure_flux = 0.0;
                            let mut da_ke = 0.0;
                            let mut db_ke = 0.0;
                            let mut da_cov_ub = 0.0;
                            let mut db_cov_ua = 0.0;

                            for s in 0..n {
                                da_mass_flux -=
                                    ws.alpha_mass_flux[(s, j, k)] * basis.stiffness[(i, s)];
                                da_pressure_flux -=
                                    ws.alpha_pressure_flux[(s, j, k)] * basis.stiffness[(i, s)];
                                da_p += pressure[(ia0 + s, ib, k)] * basis.dx[(i, s)];
                                da_ke += ws.kinetic_energy[(s, j, k)] * basis.dx[(i, s)];
                                da_cov_ub += ws.cov_ub[(s, j, k)] * basis.dx[(i, s)];

                                db_mass_flux -=
                                    ws.beta_mass_flux[(i, s, k)] * basis.stiffness[(j, s)];
                                db_pressure_flux -=
                                    ws.beta_pressure_flux[(i, s, k)] * basis.stiffness[(j, s)];
                                db_p += pressure[(ia, ib0 + s, k)] * basis.dx[(j, s)];
                                db_ke += ws.kinetic_energy[(i, s, k)] * basis.dx[(j, s)];
                                db_cov_ua += ws.cov_ua[(i, s, k)] * basis.dx[(j, s)];
                            }

                            da_p *= inv_da;
                            db_p *= inv_db;
                            da_mass_flux *= inv_da;
                            db_mass_flux *= inv_db;
                            da_pressure_flux *= inv_da;
                            db_pressure_flux *= inv_db;
                            da_ke *= inv_da;
                            db_ke *= inv_db;
                            da_cov_ub *= inv_da;
                            db_cov_ua *= inv_db;

                            // Pressure gradient along coordinate surfaces
                            // to gradient along z surfaces
                            let dz_p = if k == 0 {
                                (pressure[(ia, ib, k + 1)] - pressure[(ia, ib, k)])
                                    / (metric.z_node[(ia, ib, k + 1)] - metric.z_node[(ia, ib, k)])
                            } else if k == nl - 1 {
                                (pressure[(ia, ib, k)] - pressure[(ia, ib, k - 1)])
                                    / (metric.z_node[(ia, ib, k)] - metric.z_node[(ia, ib, k - 1)])
                            } else {
                                (pressure[(ia, ib, k + 1)] - pressure[(ia, ib, k - 1)])
                                    / (metric.z_node[(ia, ib, k + 1)]
                                        - metric.z_node[(ia, ib, k - 1)])
                            };

                            da_p -= metric.deriv_r_node[(0, ia, ib, k)] * dz_p;
                            db_p -= metric.deriv_r_node[(1, ia, ib, k)] * dz_p;

                            let con_da_p = metric.contra_metric_2d_a[(ia, ib, 0)] * da_p
                                + metric.contra_metric_2d_a[(ia, ib, 1)] * db_p;
                            let con_db_p = metric.contra_metric_2d_b[(ia, ib, 0)] * da_p
                                + metric.contra_metric_2d_b[(ia, ib, 1)] * db_p;

                            let con_da_ke = metric.contra_metric_2d_a[(ia, ib, 0)] * da_ke
                                + metric.contra_metric_2d_a[(ia, ib, 1)] * db_ke;
                            let con_db_ke = metric.contra_metric_2d_b[(ia, ib, 0)] * da_ke
                                + metric.contra_metric_2d_b[(ia, ib, 1)] * db_ke;

                            let inv_jacobian = 1.0 / metric.jacobian_node[(ia, ib, k)];
                            let inv_jacobian_2d = 1.0 / metric.jacobian_2d[(ia, ib)];
                            let inv_dz = 1.0
                                / (metric.z_redge[(ia, ib, k + 1)] - metric.z_redge[(ia, ib, k)]);

                            let total_horiz_flux_div =
                                inv_jacobian * (da_mass_flux + db_mass_flux);

                            let dz_alpha_momentum_flux = inv_dz
                                * (ws.sdot_ua_redge[(i, j, k + 1)] - ws.sdot_ua_redge[(i, j, k)]);
                            let dz_beta_momentum_flux = inv_dz
                                * (ws.sdot_ub_redge[(i, j, k + 1)] - ws.sdot_ub_redge[(i, j, k)]);

                            let abs_vorticity = metric.coriolis_f[(ia, ib)]
                                + inv_jacobian_2d * (da_cov_ub - db_cov_ua);
                            let vorticity_alpha =
                                -abs_vorticity * inv_jacobian_2d * ws.cov_ub[(i, j, k)];
                            let vorticity_beta =
                                abs_vorticity * inv_jacobian_2d * ws.cov_ua[(i, j, k)];

                            let rho = init_node[(RIX, ia, ib, k)];

                            upd_node[(UIX, ia, ib, k)] += dt
                                * (-con_da_p
                                    - rho * (con_da_ke + vorticity_alpha)
                                    - total_horiz_flux_div * ws.con_ua[(i, j, k)]
                                    - dz_alpha_momentum_flux);

                            upd_node[(VIX, ia, ib, k)] += dt
                                * (-con_db_p
                                    - rho * (con_db_ke + vorticity_beta)
                                    - total_horiz_flux_div * ws.con_ub[(i, j, k)]
                                    - dz_beta_momentum_flux);

                            upd_node[(RIX, ia, ib, k)] += -dt * total_horiz_flux_div;

                            upd_node[(PIX, ia, ib, k)] +=
                                -dt * inv_jacobian * (da_pressure_flux + db_pressure_flux);
                        }
                    }
                }

                // Interface updates: flux of vertical momentum
                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);
                        for k in 1..nl {
                            let inv_jacobian_redge = 1.0 / metric.jacobian_redge[(ia, ib, k)];

                            let mut da_vertical_momentum_flux = 0.0;
                            let mut db_vertical_momentum_flux = 0.0;
                            for s in 0..n {
                                da_vertical_momentum_flux -= ws
                                    .alpha_vertical_momentum_flux_redge[(s, j, k)]
                                    * basis.stiffness[(i, s)];
                                db_vertical_momentum_flux -= ws
                                    .beta_vertical_momentum_flux_redge[(i, s, k)]
                                    * basis.stiffness[(j, s)];
                            }
                            da_vertical_momentum_flux *= inv_da;
                            db_vertical_momentum_flux *= inv_db;

                            let inv_dz_hat = 1.0
                                / (metric.z_node[(ia, ib, k)] - metric.z_node[(ia, ib, k - 1)]);
                            let dz_vertical_momentum_flux = inv_dz_hat
                                * (ws.sdot_w_node[(i, j, k)] - ws.sdot_w_node[(i, j, k - 1)]);

                            upd_redge[(WIX, ia, ib, k)] += -dt
                                * (inv_jacobian_redge
                                    * (da_vertical_momentum_flux + db_vertical_momentum_flux)
                                    + dz_vertical_momentum_flux);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
