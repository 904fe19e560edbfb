//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Polynomial kernel (spec §4.1, component C1): evaluation, multiplication,
//! expansion from roots, deflation, and a Jenkins-Traub-style real-root
//! finder used only by the Bessel designer.
//!
//! Coefficients are stored in **descending** powers, matching spec §3:
//! `a[0]*x^n + a[1]*x^(n-1) + ... + a[n]`.

use num_complex::Complex64;

use crate::error::{DspError, DspResult};

/// Horner evaluation: `sum = a[0]; sum = sum*x + a[i]` for i in 1..n.
pub fn evaluate(a: &[Complex64], x: Complex64) -> Complex64 {
    let mut sum = Complex64::new(0.0, 0.0);
    for &coeff in a {
        sum = sum * x + coeff;
    }
    sum
}

pub fn evaluate_real(a: &[f64], x: Complex64) -> Complex64 {
    let mut sum = Complex64::new(0.0, 0.0);
    for &coeff in a {
        sum = sum * x + coeff;
    }
    sum
}

/// `Evaluate(top, x) / Evaluate(bottom, x)`.
pub fn evaluate_rational(top: &[f64], bottom: &[f64], x: Complex64) -> DspResult<Complex64> {
    let denom = evaluate_real(bottom, x);
    if denom.norm() == 0.0 {
        return Err(DspError::arithmetic(format!(
            "rational fraction denominator is zero at x={x}"
        )));
    }
    Ok(evaluate_real(top, x) / denom)
}

/// Polynomial convolution: `multiply(a, b)` has length `|a| + |b| - 1`.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

pub fn multiply_complex(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![Complex64::new(0.0, 0.0); a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// `Expand(zeros) = prod (x - zeros[i])`, starting from `[1]`.
pub fn expand(zeros: &[Complex64]) -> Vec<Complex64> {
    let mut poly = vec![Complex64::new(1.0, 0.0)];
    for &z in zeros {
        poly = multiply_complex(&poly, &[Complex64::new(1.0, 0.0), -z]);
    }
    poly
}

/// Synthetic division of `a` by `(x - z)`. Returns the quotient; if
/// `eps > 0`, fails unless the remainder's real and imaginary parts are
/// both within `eps`.
pub fn deflate(a: &[Complex64], z: Complex64, eps: f64) -> DspResult<Vec<Complex64>> {
    if a.is_empty() {
        return Ok(Vec::new());
    }
    let mut quotient = Vec::with_capacity(a.len() - 1);
    let mut carry = a[0];
    for &coeff in &a[1..] {
        quotient.push(carry);
        carry = carry * z + coeff;
    }
    let remainder = carry;
    if eps > 0.0 && (remainder.re.abs() > eps || remainder.im.abs() > eps) {
        return Err(DspError::arithmetic(format!(
            "deflate remainder {remainder} exceeds tolerance {eps}"
        )));
    }
    Ok(quotient)
}

/// Finds all roots of a real-coefficient polynomial (descending powers,
/// `a[0] != 0`) via repeated deflation driven by a damped Newton iteration
/// seeded at several starting points ("any robust root finder that passes
/// the testable properties" per spec §4.1). Used only by the Bessel
/// designer to find the roots of the reverse Bessel polynomial.
pub fn find_roots(a: &[f64]) -> DspResult<Vec<Complex64>> {
    if a.is_empty() || a[0] == 0.0 {
        return Err(DspError::arguments(
            crate::error::codes::ARITHMETIC,
            "leading coefficient must be non-zero",
        ));
    }
    let degree = a.len() - 1;
    if degree == 0 {
        return Ok(Vec::new());
    }

    let mut working: Vec<Complex64> = a.iter().map(|&c| Complex64::new(c, 0.0)).collect();
    let mut roots = Vec::with_capacity(degree);

    for k in 0..degree {
        let remaining_degree = degree - k;
        more_asserts::debug_assert_ge!(remaining_degree, 1);
        if remaining_degree == 1 {
            // a0*x + a1 = 0
            roots.push(-working[1] / working[0]);
            break;
        }
        if remaining_degree == 2 {
            let (r0, r1) = solve_quadratic(working[0], working[1], working[2]);
            roots.push(r0);
            roots.push(r1);
            break;
        }
        let seed = Complex64::new(0.4, 0.9) * Complex64::new(1.0 + k as f64 * 0.1, 0.0);
        let root = newton_root(&working, seed)?;
        working = deflate(&working, root, 0.0)?;
        roots.push(root);
    }
    Ok(roots)
}

fn solve_quadratic(a: Complex64, b: Complex64, c: Complex64) -> (Complex64, Complex64) {
    let disc = (b * b - a * c * 4.0).sqrt();
    let r0 = (-b + disc) / (a * 2.0);
    let r1 = (-b - disc) / (a * 2.0);
    (r0, r1)
}

fn derivative(a: &[Complex64]) -> Vec<Complex64> {
    let n = a.len() - 1;
    if n == 0 {
        return vec![Complex64::new(0.0, 0.0)];
    }
    a[..n]
        .iter()
        .enumerate()
        .map(|(i, &c)| c * (n - i) as f64)
        .collect()
}

fn newton_root(a: &[Complex64], mut x: Complex64) -> DspResult<Complex64> {
    let da = derivative(a);
    const MAX_ITERS: usize = 200;
    for _ in 0..MAX_ITERS {
        let fx = evaluate(a, x);
        if fx.norm() < 1e-12 {
            return Ok(x);
        }
        let dfx = evaluate(&da, x);
        if dfx.norm() < 1e-14 {
            x += Complex64::new(0.5, 0.3);
            continue;
        }
        let step = fx / dfx;
        x -= step;
        if step.norm() < 1e-13 {
            return Ok(x);
        }
    }
    Err(DspError::arithmetic(
        "Jenkins-Traub-style root finder failed to converge",
    ))
}
