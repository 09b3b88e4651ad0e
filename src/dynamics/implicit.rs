//! Implicit vertical (acoustic) solver.
//!
//! Solves, independently per column, a backward-in-time linearization of
//! the vertical momentum equation coupling buoyancy and the vertical
//! pressure-gradient restoring force, then propagates the solved
//! vertical-momentum profile into density and rhotheta through vertical
//! flux divergences. Boundary rows are identity with zero right-hand
//! side, so both the bottom and top interface solve to zero; the bottom
//! interface is additionally hard-reset after the update.

use crate::error::DynamicsError;
use crate::grid::{SpectralGrid, slot_pair_mut};
use crate::types::{FieldKind, PIX, RIX, StateSlot, WIX};

use super::tridiagonal::TridiagonalSolver;
use super::workspace::Workspace;

/// Advance the acoustic terms implicitly over Δt into `update`.
pub fn step_implicit(
    grid: &mut SpectralGrid,
    ws: &mut Workspace,
    solver: &dyn TridiagonalSolver,
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
    let constants = grid.constants;
    let g = constants.g;
    let dt2 = dt * dt;

    for patch in &mut grid.patches {
        let pb = patch.patch_box;
        let metric = &patch.metric;
        let pressure = &mut patch.pressure;
        let (init_node, upd_node) = slot_pair_mut(&mut patch.state_node, initial, update);
        let (init_redge, upd_redge) = slot_pair_mut(&mut patch.state_redge, initial, update);

        for ea in 0..pb.element_count_a {
            for eb in 0..pb.element_count_b {
                let ia0 = ea * n;
                let ib0 = eb * n;

                // Pressure and its thermodynamic derivative on levels
                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);
                        for k in 0..nl {
                            let rhotheta = init_node[(PIX, ia, ib, k)];
                            let p = constants.pressure_from_rhotheta(rhotheta);
                            pressure[(ia, ib, k)] = p;
                            ws.dp_drhotheta[(i, j, k)] =
                                constants.d_pressure_d_rhotheta(p, rhotheta);
                        }
                    }
                }

                // Interface density and theta
                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);
                        for k in 1..nl {
                            let rho_redge = 0.5
                                * (init_node[(RIX, ia, ib, k)] + init_node[(RIX, ia, ib, k - 1)]);
                            init_redge[(RIX, ia, ib, k)] = rho_redge;
                            init_redge[(PIX, ia, ib, k)] = 0.5 / rho_redge
                                * (init_node[(PIX, ia, ib, k)] + init_node[(PIX, ia, ib, k - 1)]);
                        }
                    }
                }

                // Band construction: identity boundary rows pin the
                // bottom and top interface momentum at zero.
                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);

                        ws.band_sub[(i, j, nl - 1)] = 0.0;
                        ws.band_diag[(i, j, 0)] = 1.0;
                        ws.band_diag[(i, j, nl)] = 1.0;
                        ws.band_sup[(i, j, 0)] = 0.0;
                        ws.band_rhs[(i, j, 0)] = 0.0;
                        ws.band_rhs[(i, j, nl)] = 0.0;

                        for k in 1..nl {
                            let inv_dz_k = 1.0
                                / (metric.z_redge[(ia, ib, k + 1)] - metric.z_redge[(ia, ib, k)]);
                            let inv_dz_km = 1.0
                                / (metric.z_redge[(ia, ib, k)] - metric.z_redge[(ia, ib, k - 1)]);
                            let inv_dz_hat = 1.0
                                / (metric.z_node[(ia, ib, k)] - metric.z_node[(ia, ib, k - 1)]);

                            // Interface P slot holds theta here. The
                            // entries multiplying the pinned boundary
                            // interfaces are immaterial to the solution.
                            ws.band_sub[(i, j, k - 1)] = -dt2
                                * inv_dz_km
                                * (inv_dz_hat
                                    * ws.dp_drhotheta[(i, j, k - 1)]
                                    * init_redge[(PIX, ia, ib, k - 1)]
                                    - 0.5 * g);

                            ws.band_diag[(i, j, k)] = 1.0
                                + dt2
                                    * (inv_dz_hat
                                        * init_redge[(PIX, ia, ib, k)]
                                        * (ws.dp_drhotheta[(i, j, k)] * inv_dz_k
                                            + ws.dp_drhotheta[(i, j, k - 1)] * inv_dz_km)
                                        + 0.5 * g * (inv_dz_k - inv_dz_km));

                            ws.band_sup[(i, j, k)] = -dt2
                                * inv_dz_k
                                * (inv_dz_hat
                                    * ws.dp_drhotheta[(i, j, k)]
                                    * init_redge[(PIX, ia, ib, k + 1)]
                                    + 0.5 * g);

                            let dz_pressure = inv_dz_hat
                                * (pressure[(ia, ib, k)] - pressure[(ia, ib, k - 1)]);
                            let buoyancy = g * init_redge[(RIX, ia, ib, k)];

                            ws.band_rhs[(i, j, k)] = init_redge[(WIX, ia, ib, k)]
                                - dt * (dz_pressure + buoyancy);
                        }
                    }
                }

                // Solve every column, then check statuses
                for i in 0..n {
                    for j in 0..n {
                        let status = match solver.solve(
                            ws.band_sub.column_mut(i, j),
                            ws.band_diag.column_mut(i, j),
                            ws.band_sup.column_mut(i, j),
                            ws.band_rhs.column_mut(i, j),
                        ) {
                            Ok(()) => 0,
                            Err(singular) => singular.row as i32 + 1,
                        };
                        ws.solve_status[i * n + j] = status;
                    }
                }
                for i in 0..n {
                    for j in 0..n {
                        let status = ws.solve_status[i * n + j];
                        if status != 0 {
                            tracing::error!(
                                element_a = ea,
                                element_b = eb,
                                i,
                                j,
                                status,
                                "tridiagonal solve failed"
                            );
                            return Err(DynamicsError::NumericalFailure {
                                element_a: ea,
                                element_b: eb,
                                i,
                                j,
                                status,
                            });
                        }
                    }
                }

                // Propagate the solved momentum into W, density and
                // rhotheta
                for i in 0..n {
                    for j in 0..n {
                        let (ia, ib) = (ia0 + i, ib0 + j);
                        for k in 0..nl {
                            let inv_dz = 1.0
                                / (metric.z_redge[(ia, ib, k + 1)] - metric.z_redge[(ia, ib, k)]);

                            upd_redge[(WIX, ia, ib, k)] +=
                                ws.band_rhs[(i, j, k)] - init_redge[(WIX, ia, ib, k)];

                            let dz_mass_flux =
                                inv_dz * (ws.band_rhs[(i, j, k + 1)] - ws.band_rhs[(i, j, k)]);
                            upd_node[(RIX, ia, ib, k)] += -dt * dz_mass_flux;

                            let dz_pressure_flux = inv_dz
                                * (ws.band_rhs[(i, j, k + 1)] * init_redge[(PIX, ia, ib, k + 1)]
                                    - ws.band_rhs[(i, j, k)] * init_redge[(PIX, ia, ib, k)]);
                            upd_node[(PIX, ia, ib, k)] += -dt * dz_pressure_flux;
                        }
                    }
                }

                // Rigid bottom
                for i in 0..n {
                    for j in 0..n {
                        upd_redge[(WIX, ia0 + i, ib0 + j, 0)] = 0.0;
                    }
                }
            }
        }
    }

    grid.apply_dss(update, FieldKind::State);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::tridiagonal::{SingularSystem, ThomasSolver};
    use crate::equations::EquationSetVariant;
    use crate::types::FieldKind;

    /// Backend that declares every column singular.
    struct FailingSolver;

    impl TridiagonalSolver for FailingSolver {
        fn solve(
            &self,
            _sub: &mut [f64],
            _diag: &mut [f64],
            _sup: &mut [f64],
            _rhs: &mut [f64],
        ) -> Result<(), SingularSystem> {
            Err(SingularSystem { row: 3 })
        }
    }

    fn hydrostatic_grid(nl: usize) -> SpectralGrid {
        let mut grid = SpectralGrid::uniform_cartesian(
            4,
            1,
            1,
            nl,
            0,
            1000.0,
            1000.0,
            nl as f64 * 100.0,
            EquationSetVariant::NonhydrostaticPrimitive,
        );

        // Discretely hydrostatic column: choose rhotheta so that the
        // vertical pressure difference balances gravity on the interface
        // density, making the implicit right-hand side vanish.
        let constants = grid.constants;
        let ni = grid.patches[0].patch_box.node_count_a(4);
        let nj = grid.patches[0].patch_box.node_count_b(4);

        let mut p = vec![0.0; nl];
        let mut rho = vec![0.0; nl];
        p[0] = 9.0e4;
        rho[0] = 1.0;
        for k in 1..nl {
            rho[k] = rho[k - 1];
            // Solve p[k] such that (p[k] - p[k-1]) / dz = -g * rho_redge
            let dz = 100.0;
            let rho_redge = 0.5 * (rho[k] + rho[k - 1]);
            p[k] = p[k - 1] - dz * constants.g * rho_redge;
        }

        let state = &mut grid.patches[0].state_node[0];
        for i in 0..ni {
            for j in 0..nj {
                for k in 0..nl {
                    state[(RIX, i, j, k)] = rho[k];
                    state[(PIX, i, j, k)] = constants.rhotheta_from_pressure(p[k]);
                }
            }
        }
        grid
    }

    #[test]
    fn test_aliased_slots_rejected() {
        let mut grid = hydrostatic_grid(4);
        let mut ws = Workspace::new(4, 4);
        let solver = ThomasSolver::default();
        let err = step_implicit(
            &mut grid,
            &mut ws,
            &solver,
            StateSlot::Update,
            StateSlot::Update,
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, DynamicsError::Precondition { .. }));
    }

    #[test]
    fn test_hydrostatic_column_stays_at_rest() {
        let nl = 6;
        let mut grid = hydrostatic_grid(nl);
        let mut ws = Workspace::new(4, nl);
        let solver = ThomasSolver::default();

        // Update slot starts as a copy of the initial state.
        grid.copy_state(StateSlot::Initial, StateSlot::Update, FieldKind::State);

        step_implicit(
            &mut grid,
            &mut ws,
            &solver,
            StateSlot::Initial,
            StateSlot::Update,
            2.0,
        )
        .unwrap();

        let ni = grid.patches[0].patch_box.node_count_a(4);
        for i in 0..ni {
            for k in 0..=nl {
                let w = grid.patches[0].state_redge[1][(WIX, i, 3, k)];
                assert!(w.abs() < 1e-8, "w = {} at interface {}", w, k);
            }
            for k in 0..nl {
                let dr = grid.patches[0].state_node[1][(RIX, i, 3, k)]
                    - grid.patches[0].state_node[0][(RIX, i, 3, k)];
                assert!(dr.abs() < 1e-10, "density drift {} at level {}", dr, k);
            }
        }
    }

    #[test]
    fn test_singular_column_aborts_the_stage() {
        let mut grid = hydrostatic_grid(4);
        let mut ws = Workspace::new(4, 4);
        grid.copy_state(StateSlot::Initial, StateSlot::Update, FieldKind::State);

        let err = step_implicit(
            &mut grid,
            &mut ws,
            &FailingSolver,
            StateSlot::Initial,
            StateSlot::Update,
            1.0,
        )
        .unwrap_err();

        // The first column of the first element fails; the status carries
        // the one-based row of the bad pivot.
        match err {
            DynamicsError::NumericalFailure {
                element_a,
                element_b,
                i,
                j,
                status,
            } => {
                assert_eq!((element_a, element_b, i, j), (0, 0, 0, 0));
                assert_eq!(status, 4);
            }
            other => panic!("expected a numerical failure, got {:?}", other),
        }
    }

    #[test]
    fn test_bottom_boundary_is_rigid() {
        let nl = 5;
        let mut grid = hydrostatic_grid(nl);
        let mut ws = Workspace::new(4, nl);
        let solver = ThomasSolver::default();

        // Perturb the column so the solve produces nonzero interior W.
        let ni = grid.patches[0].patch_box.node_count_a(4);
        for i in 0..ni {
            for k in 0..nl {
                grid.patches[0].state_node[0][(PIX, i, 2, k)] *= 1.01;
            }
        }
        grid.copy_state(StateSlot::Initial, StateSlot::Update, FieldKind::State);

        step_implicit(
            &mut grid,
            &mut ws,
            &solver,
            StateSlot::Initial,
            StateSlot::Update,
            1.0,
        )
        .unwrap();

        for i in 0..ni {
            assert_eq!(grid.patches[0].state_redge[1][(WIX, i, 2, 0)], 0.0);
        }
    }
}
