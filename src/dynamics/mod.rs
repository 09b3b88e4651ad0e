//! HEVI (horizontally-explicit, vertically-implicit) dynamics core.
//!
//! [`HeviDynamics`] owns the scratch workspace and the tridiagonal solve
//! backend, and sequences the stages. The outer time-integration driver
//! calls [`HeviDynamics::step_explicit`] and
//! [`HeviDynamics::step_implicit`] once per sub-step, and
//! [`HeviDynamics::step_after_subcycle`] once per full step to apply
//! diffusion, the tracer positivity filter, and the Rayleigh sponge.
//!
//! One instance serves one grid; a single instance must not run two
//! stages concurrently.

pub mod config;
pub mod explicit;
pub mod filter;
pub mod hyperdiffusion;
pub mod implicit;
pub mod rayleigh;
pub mod tridiagonal;
pub mod workspace;

pub use config::DynamicsConfig;
pub use tridiagonal::{SingularSystem, ThomasSolver, TridiagonalSolver};
pub use workspace::Workspace;

use crate::error::DynamicsError;
use crate::grid::SpectralGrid;
use crate::types::{FieldKind, StateSlot};

/// The HEVI time-integration core.
pub struct HeviDynamics {
    config: DynamicsConfig,
    workspace: Workspace,
    tridiagonal: Box<dyn TridiagonalSolver>,
}

impl HeviDynamics {
    /// Build the core for a given grid, validating the configuration
    /// before any buffers are allocated.
    pub fn new(config: DynamicsConfig, grid: &SpectralGrid) -> Result<Self, DynamicsError> {
        config.validate()?;
        if config.horizontal_order != grid.n_nodes {
            return Err(DynamicsError::config(format!(
                "horizontal order {} does not match grid order {}",
                config.horizontal_order, grid.n_nodes
            )));
        }
        Ok(Self {
            config,
            workspace: Workspace::new(grid.n_nodes, grid.n_levels),
            tridiagonal: Box::new(ThomasSolver::default()),
        })
    }

    /// Replace the tridiagonal solve backend.
    pub fn with_tridiagonal_solver(mut self, solver: Box<dyn TridiagonalSolver>) -> Self {
        self.tridiagonal = solver;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    /// Accumulate explicit horizontal tendencies over Δt into `update`.
    pub fn step_explicit(
        &mut self,
        grid: &mut SpectralGrid,
        initial: StateSlot,
        update: StateSlot,
        dt: f64,
    ) -> Result<(), DynamicsError> {
        explicit::step_explicit(grid, &mut self.workspace, initial, update, dt)
    }

    /// Solve the implicit vertical (acoustic) system over Δt into
    /// `update`.
    pub fn step_implicit(
        &mut self,
        grid: &mut SpectralGrid,
        initial: StateSlot,
        update: StateSlot,
        dt: f64,
    ) -> Result<(), DynamicsError> {
        implicit::step_implicit(
            grid,
            &mut self.workspace,
            self.tridiagonal.as_ref(),
            initial,
            update,
            dt,
        )
    }

    /// Apply diffusion, the tracer positivity filter, and (when
    /// configured) Rayleigh damping at the end of a full step.
    ///
    /// `update` ends as `initial` plus the diffusive increments;
    /// `working` is scratch for the fourth-order composition. All three
    /// slots must be pairwise distinct.
    pub fn step_after_subcycle(
        &mut self,
        grid: &mut SpectralGrid,
        initial: StateSlot,
        update: StateSlot,
        working: StateSlot,
        dt: f64,
    ) -> Result<(), DynamicsError> {
        if initial == working {
            return Err(DynamicsError::Precondition {
                a: initial,
                b: working,
            });
        }
        if update == working {
            return Err(DynamicsError::Precondition {
                a: update,
                b: working,
            });
        }
        if initial == update {
            return Err(DynamicsError::Precondition {
                a: initial,
                b: update,
            });
        }

        let config = self.config;
        tracing::debug!(
            order = config.hyperdiffusion_order,
            dt,
            "applying end-of-step stabilization"
        );

        grid.copy_state(initial, update, FieldKind::State);
        grid.copy_state(initial, update, FieldKind::Tracers);

        let no_diffusion =
            config.nu_scalar == 0.0 && config.nu_div == 0.0 && config.nu_vort == 0.0;

        if no_diffusion || config.hyperdiffusion_order == 0 {
            // Plain copy

        } else if config.hyperdiffusion_order == 2 {
            hyperdiffusion::apply_scalar_hyperdiffusion(
                grid,
                &mut self.workspace,
                initial,
                update,
                dt,
                config.nu_scalar,
                false,
                None,
                false,
            )?;
            hyperdiffusion::apply_vector_hyperdiffusion(
                grid,
                initial,
                initial,
                update,
                -dt,
                config.nu_div,
                config.nu_vort,
                false,
            )?;

            filter::filter_negative_tracers(grid, update);

            grid.apply_dss(update, FieldKind::State);
            grid.apply_dss(update, FieldKind::Tracers);

        } else {
            // Fourth order: an undamped Laplacian into the working slot,
            // reconciled across elements, then the damped Laplacian of
            // that result into the update slot.
            grid.zero_state(working, FieldKind::State);
            grid.zero_state(working, FieldKind::Tracers);

            hyperdiffusion::apply_scalar_hyperdiffusion(
                grid,
                &mut self.workspace,
                initial,
                working,
                1.0,
                1.0,
                false,
                None,
                false,
            )?;
            hyperdiffusion::apply_vector_hyperdiffusion(
                grid, initial, initial, working, 1.0, 1.0, 1.0, false,
            )?;

            grid.apply_dss(working, FieldKind::State);
            grid.apply_dss(working, FieldKind::Tracers);

            hyperdiffusion::apply_scalar_hyperdiffusion(
                grid,
                &mut self.workspace,
                working,
                update,
                -dt,
                config.nu_scalar,
                true,
                None,
                false,
            )?;
            hyperdiffusion::apply_vector_hyperdiffusion(
                grid,
                initial,
                working,
                update,
                -dt,
                config.nu_div,
                config.nu_vort,
                true,
            )?;

            filter::filter_negative_tracers(grid, update);

            grid.apply_dss(update, FieldKind::State);
            grid.apply_dss(update, FieldKind::Tracers);
        }

        if self.config.apply_rayleigh {
            rayleigh::apply_rayleigh_friction(grid, update, dt);
        }

        Ok(())
    }
}
