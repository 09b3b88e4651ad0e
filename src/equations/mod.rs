//! Physical constants, the ideal-gas equation of state, and the
//! equation-set variant tag.
//!
//! Pressure is diagnosed from potential-temperature density by
//! p = p₀ (R_d ρθ / p₀)^γ with γ = c_p / c_v; its thermodynamic
//! derivative ∂p/∂(ρθ) = γ p / ρθ enters the implicit acoustic solve.

use crate::types::{PIX, RIX, UIX, VIX, WIX};

/// Physical constants of the dry atmosphere.
#[derive(Clone, Copy, Debug)]
pub struct PhysicalConstants {
    /// Gravitational acceleration (m s⁻²)
    pub g: f64,
    /// Gas constant of dry air (J kg⁻¹ K⁻¹)
    pub rd: f64,
    /// Specific heat at constant pressure (J kg⁻¹ K⁻¹)
    pub cp: f64,
    /// Specific heat at constant volume (J kg⁻¹ K⁻¹)
    pub cv: f64,
    /// Reference surface pressure (Pa)
    pub p0: f64,
    /// Planetary rotation rate (s⁻¹)
    pub omega: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            g: 9.80616,
            rd: 287.0,
            cp: 1004.5,
            cv: 717.5,
            p0: 1.0e5,
            omega: 7.29212e-5,
        }
    }
}

impl PhysicalConstants {
    /// Ratio of specific heats γ = c_p / c_v.
    #[inline(always)]
    pub fn gamma(&self) -> f64 {
        self.cp / self.cv
    }

    /// Diagnose pressure from potential-temperature density.
    #[inline(always)]
    pub fn pressure_from_rhotheta(&self, rhotheta: f64) -> f64 {
        self.p0 * (self.rd * rhotheta / self.p0).powf(self.gamma())
    }

    /// Invert the equation of state: ρθ from pressure.
    #[inline(always)]
    pub fn rhotheta_from_pressure(&self, pressure: f64) -> f64 {
        self.p0 / self.rd * (pressure / self.p0).powf(1.0 / self.gamma())
    }

    /// Thermodynamic derivative ∂p/∂(ρθ) = γ p / ρθ.
    ///
    /// `pressure` must be the value diagnosed from the same `rhotheta`.
    #[inline(always)]
    pub fn d_pressure_d_rhotheta(&self, pressure: f64, rhotheta: f64) -> f64 {
        pressure * self.gamma() / rhotheta
    }
}

/// Equation-set variant being integrated.
///
/// The tag selects which components the Rayleigh sponge relaxes and
/// where the vector-diffusion stage finds the density-like component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EquationSetVariant {
    /// 3D nonhydrostatic primitive equations.
    NonhydrostaticPrimitive,
    /// 2D Cartesian (x-z slice) nonhydrostatic primitive equations.
    NonhydrostaticPrimitiveXZ,
    /// Shallow-water equations (height in the P slot).
    ShallowWater,
}

impl EquationSetVariant {
    /// Index of the density-like component for this equation set.
    #[inline]
    pub fn density_index(self) -> usize {
        match self {
            EquationSetVariant::ShallowWater => PIX,
            _ => RIX,
        }
    }

    /// Components relaxed by the Rayleigh sponge.
    ///
    /// Nonhydrostatic primitive variants exclude the density slot (and,
    /// in the x-z slice case, the unused beta momentum); other equation
    /// sets damp every component.
    pub fn rayleigh_components(self, n_components: usize) -> Vec<usize> {
        match self {
            EquationSetVariant::NonhydrostaticPrimitive => vec![UIX, VIX, PIX, WIX],
            EquationSetVariant::NonhydrostaticPrimitiveXZ => vec![UIX, PIX, WIX],
            EquationSetVariant::ShallowWater => (0..n_components).collect(),
        }
    }
}
