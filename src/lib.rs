//! # hevi-rs
//!
//! Time-integration core for a compressible, nonhydrostatic atmospheric
//! solver on horizontally spectral-element, vertically layered meshes.
//!
//! The crate implements the horizontally-explicit / vertically-implicit
//! (HEVI) splitting together with its stabilization machinery:
//! - Explicit horizontal flux and vorticity tendencies on model levels
//!   and interfaces
//! - An implicit vertical acoustic solve via per-column tridiagonal systems
//! - Scalar and vector hyperdiffusion (2nd and 4th order)
//! - A mass-conserving tracer positivity filter
//! - A subcycled Rayleigh damping sponge layer
//!
//! The spectral mesh itself is a narrow collaborator: [`grid::SpectralGrid`]
//! carries element geometry, metric terms, basis matrices, and the named
//! state buffer slots the dynamics operate on. Everything heavier (mesh
//! generation, domain decomposition, physics parameterizations, output)
//! lives outside this crate.

pub mod basis;
pub mod dynamics;
pub mod equations;
pub mod error;
pub mod field;
pub mod grid;
pub mod operators;
pub mod types;

// Re-export main types for convenience
pub use dynamics::{DynamicsConfig, HeviDynamics, ThomasSolver, TridiagonalSolver};
pub use equations::{EquationSetVariant, PhysicalConstants};
pub use error::DynamicsError;
pub use field::{Field2, Field3, Field4};
pub use grid::{GridPatch, MetricTerms, PatchBox, SpectralGrid};
pub use operators::HorizontalBasis;
pub use types::{FieldKind, StateSlot, VarLocation};
