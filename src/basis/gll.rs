//! Legendre polynomials and Gauss-Lobatto-Legendre collocation points.
//!
//! The N+1 GLL nodes for polynomial degree N are the roots of
//! (1-x²)P'_N(x), which include the endpoints x = ±1. Endpoint nodes are
//! what make the element-boundary continuity (Direct Stiffness Summation)
//! of a continuous spectral-element method possible, and they render the
//! mass matrix diagonal.

use std::f64::consts::PI;

/// Evaluate Legendre polynomial P_n(x) by three-term recurrence.
///
/// P_0 = 1, P_1 = x, (n+1) P_{n+1} = (2n+1) x P_n - n P_{n-1}.
pub fn legendre(n: usize, x: f64) -> f64 {
    if n == 0 {
        return 1.0;
    }
    if n == 1 {
        return x;
    }

    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }
    p_curr
}

/// Evaluate the derivative P'_n(x).
///
/// Away from the endpoints this uses
/// P'_n(x) = n (x P_n - P_{n-1}) / (x² - 1); at x = ±1 the closed forms
/// P'_n(1) = n(n+1)/2 and P'_n(-1) = (-1)^{n+1} n(n+1)/2 apply.
pub fn legendre_derivative(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).1
}

/// Evaluate P_n(x) and P'_n(x) from a single recurrence pass.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    if n == 1 {
        return (x, 1.0);
    }

    let mut p_prev = 1.0;
    let mut p_curr = x;
    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }

    let dp = if (x - 1.0).abs() < 1e-14 {
        (n * (n + 1)) as f64 / 2.0
    } else if (x + 1.0).abs() < 1e-14 {
        let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
        sign * (n * (n + 1)) as f64 / 2.0
    } else {
        n as f64 * (x * p_curr - p_prev) / (x * x - 1.0)
    };

    (p_curr, dp)
}

/// Compute the N+1 GLL nodes in [-1, 1] for polynomial degree N.
///
/// Interior nodes are found by Newton iteration on P'_N starting from
/// Chebyshev-Lobatto positions; the endpoints are exact.
pub fn gauss_lobatto_nodes(degree: usize) -> Vec<f64> {
    let n = degree;
    if n == 0 {
        return vec![0.0];
    }
    if n == 1 {
        return vec![-1.0, 1.0];
    }

    let mut nodes: Vec<f64> = (0..=n)
        .map(|j| -(PI * j as f64 / n as f64).cos())
        .collect();
    nodes[0] = -1.0;
    nodes[n] = 1.0;

    // Newton on L(x) = (1-x²)P'_N(x), whose derivative reduces to
    // L'(x) = -N(N+1) P_N(x).
    for node in nodes.iter_mut().take(n).skip(1) {
        let mut x = *node;
        for _ in 0..100 {
            let (p, dp) = legendre_and_derivative(n, x);
            let update = (1.0 - x * x) * dp / (n as f64 * (n + 1) as f64 * p);
            x += update;
            if update.abs() < 1e-15 {
                break;
            }
        }
        *node = x;
    }

    nodes
}

/// Compute the GLL quadrature weights w_j = 2 / (N(N+1) P_N(x_j)²).
pub fn gauss_lobatto_weights(degree: usize, nodes: &[f64]) -> Vec<f64> {
    let n = degree;
    if n == 0 {
        return vec![2.0];
    }

    let denom = (n * (n + 1)) as f64;
    nodes
        .iter()
        .map(|&x| {
            let p = legendre(n, x);
            2.0 / (denom * p * p)
        })
        .collect()
}
