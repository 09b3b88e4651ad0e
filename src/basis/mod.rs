//! Legendre basis utilities for the horizontal spectral discretization.
//!
//! Provides Legendre polynomial evaluation, Gauss-Lobatto-Legendre (GLL)
//! collocation nodes and quadrature weights, and the Vandermonde matrix
//! used to assemble the collocation derivative operator.

mod gll;
mod vandermonde;

pub use gll::{
    gauss_lobatto_nodes, gauss_lobatto_weights, legendre, legendre_and_derivative,
    legendre_derivative,
};
pub use vandermonde::Vandermonde;
