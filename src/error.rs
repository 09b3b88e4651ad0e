//! Error types for the dynamics core.
//!
//! All failures are synchronous and fatal to the current step: nothing in
//! this crate retries internally, and no partial state is trustworthy
//! after an error. The caller owns step-level retry or abort policy.

use thiserror::Error;

use crate::types::StateSlot;

/// Error type for the HEVI dynamics core.
#[derive(Debug, Error)]
pub enum DynamicsError {
    /// Invalid configuration detected before any state mutation.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// Two state buffer slots that must be distinct alias each other.
    #[error("state buffers must be distinct: {a:?} aliases {b:?}")]
    Precondition { a: StateSlot, b: StateSlot },

    /// The vertical tridiagonal solve failed for a column.
    ///
    /// A non-zero status signals a structurally singular or severely
    /// ill-conditioned system; the step must be aborted.
    #[error(
        "tridiagonal solve failed in element ({element_a}, {element_b}), \
         column ({i}, {j}): status {status}"
    )]
    NumericalFailure {
        element_a: usize,
        element_b: usize,
        i: usize,
        j: usize,
        status: i32,
    },
}

impl DynamicsError {
    /// Convenience constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        DynamicsError::Configuration {
            reason: reason.into(),
        }
    }
}
