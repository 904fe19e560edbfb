//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Small math helpers shared by the polynomial kernel and the filter
//! designers (spec §4.1 numerical policy, §3 complex-number rule).

use num_complex::Complex64;

use crate::error::{DspError, DspResult};

/// `|imaginary| <= max(1e-10, 1e-10 * |real|)` is treated as zero.
pub const IMAG_NEGLECT_ABS: f64 = 1e-10;

/// `e^{jx}`.
pub fn expj(x: f64) -> Complex64 {
    Complex64::new(x.cos(), x.sin())
}

pub fn clip<T: num_traits::Float>(value: T, lo: T, hi: T) -> T {
    value.max(lo).min(hi)
}

pub fn square(value: f64) -> f64 {
    value * value
}

/// `asinh(x) = ln(x + sqrt(x^2 + 1))`.
pub fn asinh(x: f64) -> f64 {
    x.asinh()
}

/// Extracts the real part of `z`, failing with `Arithmetic` if the
/// imaginary part is not negligible per spec §3/§4.1.
pub fn real_part_or_fail(z: Complex64) -> DspResult<f64> {
    let tolerance = IMAG_NEGLECT_ABS.max(IMAG_NEGLECT_ABS * z.re.abs());
    if z.im.abs() > tolerance {
        return Err(DspError::arithmetic(format!(
            "expected a real value but got {z} (imaginary part exceeds tolerance {tolerance})"
        )));
    }
    Ok(z.re)
}

/// True if `roots` is closed under complex conjugation within tolerance:
/// for every non-real root there is a matching conjugate in the set.
pub fn is_closed_under_conjugation(roots: &[Complex64]) -> bool {
    let tol = 1e-9;
    let mut unmatched: Vec<Complex64> = Vec::new();
    'outer: for &r in roots {
        if r.im.abs() <= tol {
            continue;
        }
        for (i, u) in unmatched.iter().enumerate() {
            if (u.re - r.re).abs() <= tol && (u.im + r.im).abs() <= tol {
                unmatched.remove(i);
                continue 'outer;
            }
        }
        unmatched.push(r);
    }
    unmatched.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_part_passes_when_imag_negligible() {
        let z = Complex64::new(3.0, 1e-12);
        assert_eq!(real_part_or_fail(z).unwrap(), 3.0);
    }

    #[test]
    fn real_part_fails_when_imag_significant() {
        let z = Complex64::new(3.0, 0.5);
        assert!(real_part_or_fail(z).is_err());
    }

    #[test]
    fn conjugate_closure_detects_unmatched_pole() {
        let closed = vec![Complex64::new(1.0, 2.0), Complex64::new(1.0, -2.0)];
        assert!(is_closed_under_conjugation(&closed));
        let open = vec![Complex64::new(1.0, 2.0)];
        assert!(!is_closed_under_conjugation(&open));
    }
}
