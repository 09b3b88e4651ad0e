//! Configuration of the HEVI dynamics core.

use crate::error::DynamicsError;

/// Configuration read once at construction.
#[derive(Clone, Copy, Debug)]
pub struct DynamicsConfig {
    /// Collocation nodes per element edge; must match the grid.
    pub horizontal_order: usize,
    /// Hyperdiffusion order: 0 (off), 2 (Laplacian) or 4 (biharmonic).
    pub hyperdiffusion_order: usize,
    /// Scalar diffusion coefficient.
    pub nu_scalar: f64,
    /// Divergence-damping coefficient.
    pub nu_div: f64,
    /// Vorticity-damping coefficient.
    pub nu_vort: f64,
    /// Optional divergence damping applied inside the explicit sub-step
    /// by the outer driver; zero disables it.
    pub instep_nu_div: f64,
    /// Whether the Rayleigh sponge runs at the end of each full step.
    pub apply_rayleigh: bool,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            horizontal_order: 4,
            hyperdiffusion_order: 4,
            nu_scalar: 0.0,
            nu_div: 0.0,
            nu_vort: 0.0,
            instep_nu_div: 0.0,
            apply_rayleigh: false,
        }
    }
}

impl DynamicsConfig {
    /// Validate the configuration before any state is touched.
    pub fn validate(&self) -> Result<(), DynamicsError> {
        if self.horizontal_order < 2 {
            return Err(DynamicsError::config(format!(
                "horizontal order must be at least 2, got {}",
                self.horizontal_order
            )));
        }
        match self.hyperdiffusion_order {
            0 | 2 | 4 => {}
            order => {
                return Err(DynamicsError::config(format!(
                    "invalid hyperdiffusion order {order}, expected 0, 2 or 4"
                )));
            }
        }
        for (name, nu) in [
            ("nu_scalar", self.nu_scalar),
            ("nu_div", self.nu_div),
            ("nu_vort", self.nu_vort),
            ("instep_nu_div", self.instep_nu_div),
        ] {
            if !nu.is_finite() || nu < 0.0 {
                return Err(DynamicsError::config(format!(
                    "{name} must be finite and non-negative, got {nu}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(DynamicsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_hyperdiffusion_order() {
        let config = DynamicsConfig {
            hyperdiffusion_order: 3,
            ..DynamicsConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("order 3"));
    }

    #[test]
    fn test_rejects_negative_coefficient() {
        let config = DynamicsConfig {
            nu_div: -1.0,
            ..DynamicsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_horizontal_order() {
        let config = DynamicsConfig {
            horizontal_order: 1,
            ..DynamicsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
