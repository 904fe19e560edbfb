//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Fisher-method designer family (spec §4.3.1): shared prototype-pole +
//! frequency-transform + s→z + gain-normalization pipeline, parameterized by
//! a `prototype` callback per spec §9's flattening guidance. Grounded in
//! `other_examples/8087f904_SpookyYomo-sci-rs__...-iirfilter.rs`'s
//! `buttap_dyn`/`cheb1ap_dyn`/`cheb2ap_dyn` prototype constructions and its
//! `iirfilter_dyn` pipeline shape (prewarp → lp2{lp,hp,bp,bs} → bilinear →
//! zpk2tf), re-expressed per this spec's exact formulas.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::design::{DesignedFilter, FilterDesignSettings, FilterDesigner, FilterShape};
use crate::error::{DspError, DspResult};
use crate::filters::IirFilter;
use crate::numeric::{is_closed_under_conjugation, real_part_or_fail};
use crate::polynomial::{evaluate_rational, evaluate_real, expand, find_roots};

/// An analog low-pass prototype: poles (and, for Chebyshev II, finite
/// zeros) of the order-N prototype with cutoff normalized to 1 rad/s.
#[derive(Debug, Clone)]
pub(crate) struct Prototype {
    pub(crate) poles: Vec<Complex64>,
    pub(crate) zeros: Vec<Complex64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SPlaneTransform {
    Bilinear,
    MatchedZ,
}

/// Butterworth prototype poles (spec §4.3.1 step 1): `poles[i] =
/// exp(j*(N/2 + 0.5 + i)*pi/N)`.
pub(crate) fn butterworth_prototype(order: usize) -> Prototype {
    let n = order as f64;
    let poles = (0..order)
        .map(|i| {
            let angle = (n / 2.0 + 0.5 + i as f64) * PI / n;
            Complex64::new(angle.cos(), angle.sin())
        })
        .collect();
    Prototype {
        poles,
        zeros: Vec::new(),
    }
}

/// Chebyshev I prototype poles (spec §4.3.1 step 1): start from Butterworth
/// angles, then `pole.re *= sinh(y)`, `pole.im *= cosh(y)`.
pub(crate) fn chebyshev1_prototype(order: usize, ripple_db: f64) -> Prototype {
    let eps = (10f64.powf(-ripple_db / 10.0) - 1.0).sqrt();
    let y = eps.recip().asinh() / order as f64;
    let (sinh_y, cosh_y) = (y.sinh(), y.cosh());
    let mut prototype = butterworth_prototype(order);
    for p in prototype.poles.iter_mut() {
        *p = Complex64::new(p.re * sinh_y, p.im * cosh_y);
    }
    prototype
}

/// Chebyshev II (inverse Chebyshev) prototype poles and zeros, resolving
/// spec §9's open question. Grounded in `cheb2ap_dyn`'s construction:
/// zeros on the imaginary axis at `-i/sin(theta_m)`, poles at the
/// reciprocal of the Chebyshev-I pole construction — both are re-derived
/// here against this spec's Butterworth-angle convention rather than
/// scipy's index convention, but produce the same root sets (see
/// DESIGN.md).
pub(crate) fn chebyshev2_prototype(order: usize, ripple_db: f64) -> Prototype {
    let eps = (10f64.powf(-ripple_db / 10.0) - 1.0).sqrt().recip();
    let y = eps.recip().asinh() / order as f64;
    let (sinh_y, cosh_y) = (y.sinh(), y.cosh());

    let n = order as f64;
    let mut zeros = Vec::new();
    let mut poles = Vec::new();
    for i in 0..order {
        let angle = (n / 2.0 + 0.5 + i as f64) * PI / n;
        // Chebyshev-I-style pole before reciprocation.
        let cheb1_pole = Complex64::new(angle.cos() * sinh_y, angle.sin() * cosh_y);
        poles.push(cheb1_pole.inv());

        // Finite zeros sit on the imaginary axis; skip the (at most one)
        // degenerate entry for odd order's middle angle, which maps to
        // infinity (no finite zero).
        let sin_angle = angle.sin();
        if sin_angle.abs() > 1e-12 {
            zeros.push(Complex64::new(0.0, -1.0 / sin_angle));
        }
    }
    Prototype { poles, zeros }
}

/// Reverse Bessel polynomial roots, scaled so the analog prototype's gain
/// at omega=1 is `1/sqrt(2)` (spec §4.3.1 step 1, Bessel).
pub(crate) fn bessel_prototype(order: usize) -> DspResult<Prototype> {
    let theta_n = reverse_bessel_coefficients(order);
    let raw_roots = find_roots(&theta_n)?;

    let theta_at_zero = evaluate_real(&theta_n, Complex64::new(0.0, 0.0)).re;
    let target = 2f64.sqrt() * theta_at_zero;

    // |theta_n(j*u)| is monotonically increasing in u for u > 0; bisect
    // for the frequency-scaling constant that puts the -3dB point at 1.
    let magnitude_at = |u: f64| evaluate_real(&theta_n, Complex64::new(0.0, u)).norm();
    let (mut lo, mut hi) = (1e-6, 1.0);
    while magnitude_at(hi) < target && hi < 1e6 {
        hi *= 2.0;
    }
    for _ in 0..80 {
        let mid = 0.5 * (lo + hi);
        if magnitude_at(mid) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let u = 0.5 * (lo + hi);

    let poles = raw_roots.into_iter().map(|r| r / u).collect();
    Ok(Prototype {
        poles,
        zeros: Vec::new(),
    })
}

/// Ascending-power coefficients of the ordinary Bessel polynomial `y_n`
/// double exactly as the descending-power coefficients of the reverse
/// Bessel polynomial `theta_n(x) = x^n y_n(1/x)` (see DESIGN.md for the
/// index algebra). Recurrence: `y_0 = 1`, `y_1 = x + 1`,
/// `y_n = (2n-1) x y_{n-1} + y_{n-2}`.
fn reverse_bessel_coefficients(order: usize) -> Vec<f64> {
    if order == 0 {
        return vec![1.0];
    }
    let mut y_prev2 = vec![1.0]; // y_0, ascending
    let mut y_prev1 = vec![1.0, 1.0]; // y_1, ascending
    if order == 1 {
        return y_prev1;
    }
    let mut y_n = y_prev1.clone();
    for n in 2..=order {
        let mut shifted_scaled = vec![0.0; n + 1];
        let coeff = (2 * n - 1) as f64;
        for (i, &c) in y_prev1.iter().enumerate() {
            shifted_scaled[i + 1] += coeff * c;
        }
        for (i, &c) in y_prev2.iter().enumerate() {
            shifted_scaled[i] += c;
        }
        y_n = shifted_scaled;
        y_prev2 = y_prev1;
        y_prev1 = y_n.clone();
    }
    y_n
}

fn prewarp(fc_norm: f64, transform: SPlaneTransform) -> f64 {
    match transform {
        SPlaneTransform::Bilinear => {
            let fw = (PI * fc_norm).tan() / PI;
            2.0 * PI * fw
        }
        SPlaneTransform::MatchedZ => 2.0 * PI * fc_norm,
    }
}

fn s_to_z(s: Complex64, transform: SPlaneTransform) -> Complex64 {
    match transform {
        SPlaneTransform::Bilinear => (s + 2.0) / (2.0 - s),
        SPlaneTransform::MatchedZ => s.exp(),
    }
}

/// Runs the Fisher-method pipeline (spec §4.3.1 steps 2-7) and returns a
/// ready-to-use general IIR stream filter.
pub(crate) fn synthesize(
    shape: FilterShape,
    prototype: Prototype,
    settings: &FilterDesignSettings,
    fc_lo: f64,
    fc_hi: Option<f64>,
    transform: SPlaneTransform,
) -> DspResult<DesignedFilter> {
    let order = prototype.poles.len();
    let fc_lo_norm = settings.normalize_cutoff(fc_lo)?;
    let fc_hi_norm = match fc_hi {
        Some(hi) => Some(settings.normalize_cutoff(hi)?),
        None => None,
    };

    let omega1 = prewarp(fc_lo_norm, transform);

    let (mut s_poles, mut s_zeros, z_ref) = match shape {
        FilterShape::LowPass => {
            let poles = prototype.poles.iter().map(|&p| p * omega1).collect();
            let zeros = prototype.zeros.iter().map(|&z| z * omega1).collect();
            (poles, zeros, Complex64::new(1.0, 0.0))
        }
        FilterShape::HighPass => {
            let poles: Vec<Complex64> = prototype.poles.iter().map(|&p| omega1 / p).collect();
            let mut zeros: Vec<Complex64> = prototype.zeros.iter().map(|&z| omega1 / z).collect();
            while zeros.len() < poles.len() {
                zeros.push(Complex64::new(0.0, 0.0));
            }
            (poles, zeros, Complex64::new(-1.0, 0.0))
        }
        FilterShape::BandPass | FilterShape::BandStop | FilterShape::Notch => {
            if !prototype.zeros.is_empty() {
                return Err(DspError::unsupported(
                    crate::error::codes::UNKNOWN_SHAPE,
                    "this designer's prototype carries finite zeros; band-pass/band-stop \
                     Fisher synthesis is implemented only for pole-only prototypes \
                     (see DESIGN.md open-question note on Chebyshev II)",
                ));
            }
            let fc_hi_norm = fc_hi_norm.ok_or_else(|| {
                DspError::arguments(
                    crate::error::codes::ARITHMETIC,
                    "band-pass/band-stop designs require an upper cutoff",
                )
            })?;
            let omega2 = prewarp(fc_hi_norm, transform);
            let omega0 = (omega1 * omega2).sqrt();
            let bw = omega2 - omega1;

            if matches!(shape, FilterShape::BandPass | FilterShape::Notch) {
                let mut poles = Vec::with_capacity(order * 2);
                for &p in &prototype.poles {
                    let hba = p * (bw / 2.0);
                    let t = (Complex64::new(1.0, 0.0) - (omega0 / hba).powi(2)).sqrt();
                    poles.push(hba * (t + 1.0));
                    poles.push(hba * (1.0 - t));
                }
                (poles, Vec::new(), expj_ref(fc_lo_norm, fc_hi_norm))
            } else {
                let mut poles = Vec::with_capacity(order * 2);
                for &p in &prototype.poles {
                    let hba = (bw / 2.0) / p;
                    let t = (Complex64::new(1.0, 0.0) - (omega0 / hba).powi(2)).sqrt();
                    poles.push(hba * (t + 1.0));
                    poles.push(hba * (1.0 - t));
                }
                let mut zeros = Vec::with_capacity(order * 2);
                for _ in 0..order {
                    zeros.push(Complex64::new(0.0, omega0));
                    zeros.push(Complex64::new(0.0, -omega0));
                }
                (poles, zeros, Complex64::new(1.0, 0.0)) // placeholder, BandStop uses sqrt(|H(1)||H(-1)|)
            }
        }
        _ => {
            return Err(DspError::unsupported(
                crate::error::codes::UNKNOWN_SHAPE,
                "Fisher-method designer does not implement this shape",
            ))
        }
    };

    if !is_closed_under_conjugation(&s_poles) || !is_closed_under_conjugation(&s_zeros) {
        return Err(DspError::arithmetic(
            "pole/zero set is not closed under complex conjugation",
        ));
    }

    let mut z_poles: Vec<Complex64> = s_poles.drain(..).map(|p| s_to_z(p, transform)).collect();
    let mut z_zeros: Vec<Complex64> = s_zeros.drain(..).map(|z| s_to_z(z, transform)).collect();

    if transform == SPlaneTransform::Bilinear
        && matches!(shape, FilterShape::BandPass | FilterShape::BandStop | FilterShape::Notch)
    {
        while z_zeros.len() < z_poles.len() {
            z_zeros.push(Complex64::new(-1.0, 0.0));
        }
    }

    if !is_closed_under_conjugation(&z_poles) || !is_closed_under_conjugation(&z_zeros) {
        return Err(DspError::arithmetic(
            "digital pole/zero set is not closed under complex conjugation",
        ));
    }

    let top_c = expand(&z_zeros);
    let bottom_c = expand(&z_poles);

    let mut top: Vec<f64> = Vec::with_capacity(top_c.len());
    for c in &top_c {
        top.push(real_part_or_fail(*c)?);
    }
    let mut bottom: Vec<f64> = Vec::with_capacity(bottom_c.len());
    for c in &bottom_c {
        bottom.push(real_part_or_fail(*c)?);
    }

    let gain = match shape {
        FilterShape::BandStop => {
            let h1 = evaluate_rational(&top, &bottom, Complex64::new(1.0, 0.0))?.norm();
            let h2 = evaluate_rational(&top, &bottom, Complex64::new(-1.0, 0.0))?.norm();
            (h1 * h2).sqrt()
        }
        _ => evaluate_rational(&top, &bottom, z_ref)?.norm(),
    };

    if gain == 0.0 || !gain.is_finite() {
        return Err(DspError::arithmetic(
            "gain normalization reference evaluated to zero or non-finite magnitude",
        ));
    }

    let bottom0 = bottom[0];
    let new_top: Vec<f64> = top.iter().map(|&t| t / (bottom0 * gain)).collect();
    let new_bottom: Vec<f64> = bottom.iter().map(|&b| b / bottom0).collect();

    Ok(Box::new(IirFilter::new(new_top, new_bottom)?))
}

fn expj_ref(fc_lo_norm: f64, fc_hi_norm: f64) -> Complex64 {
    let angle = 2.0 * PI * (fc_lo_norm + fc_hi_norm) / 2.0;
    Complex64::new(angle.cos(), angle.sin())
}

macro_rules! fisher_designer {
    ($name:ident, $ripple_required:expr, $transform:expr, $prototype_fn:expr) => {
        #[derive(Debug, Default)]
        pub struct $name;

        impl $name {
            fn prototype(&self, settings: &FilterDesignSettings) -> DspResult<Prototype> {
                let order = settings.order().max(1);
                let ripple = if $ripple_required {
                    // Already <= 0 (FilterDesignSettings::with_max_ripple enforces this),
                    // which is the sign chebyshev{1,2}_prototype's eps formula expects.
                    settings.max_ripple().ok_or_else(|| {
                        DspError::arguments(
                            crate::error::codes::ARITHMETIC,
                            "this designer requires FilterDesignSettings::with_max_ripple",
                        )
                    })?
                } else {
                    0.0
                };
                #[allow(clippy::redundant_closure_call)]
                Ok(($prototype_fn)(order, ripple))
            }
        }

        impl FilterDesigner for $name {
            fn create_low_pass(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
                synthesize(FilterShape::LowPass, self.prototype(settings)?, settings, fc, None, $transform)
            }

            fn create_high_pass(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
                synthesize(FilterShape::HighPass, self.prototype(settings)?, settings, fc, None, $transform)
            }

            fn create_band_pass(
                &self,
                settings: &FilterDesignSettings,
                fc_lo: f64,
                fc_hi: f64,
            ) -> DspResult<DesignedFilter> {
                synthesize(
                    FilterShape::BandPass,
                    self.prototype(settings)?,
                    settings,
                    fc_lo,
                    Some(fc_hi),
                    $transform,
                )
            }

            fn create_band_stop(
                &self,
                settings: &FilterDesignSettings,
                fc_lo: f64,
                fc_hi: f64,
            ) -> DspResult<DesignedFilter> {
                synthesize(
                    FilterShape::BandStop,
                    self.prototype(settings)?,
                    settings,
                    fc_lo,
                    Some(fc_hi),
                    $transform,
                )
            }
        }
    };
}

fisher_designer!(
    ButterworthDesigner,
    false,
    SPlaneTransform::Bilinear,
    (|order, _ripple: f64| butterworth_prototype(order))
);
fisher_designer!(
    ChebyshevIDesigner,
    true,
    SPlaneTransform::Bilinear,
    (|order, ripple: f64| chebyshev1_prototype(order, ripple))
);
fisher_designer!(
    ChebyshevIIDesigner,
    true,
    SPlaneTransform::Bilinear,
    (|order, ripple: f64| chebyshev2_prototype(order, ripple))
);

#[derive(Debug, Default)]
pub struct BesselDesigner;

impl FilterDesigner for BesselDesigner {
    fn create_low_pass(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        let order = settings.order().max(1);
        synthesize(
            FilterShape::LowPass,
            bessel_prototype(order)?,
            settings,
            fc,
            None,
            SPlaneTransform::MatchedZ,
        )
    }

    fn create_high_pass(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        let order = settings.order().max(1);
        synthesize(
            FilterShape::HighPass,
            bessel_prototype(order)?,
            settings,
            fc,
            None,
            SPlaneTransform::MatchedZ,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::StreamFilter;

    /// Scenario 1 (spec §8): Butterworth LP, sampling_rate=1000, order=4,
    /// fc=100; impulse response DC gain (sum of first 1024 samples) is
    /// 1.0 +/- 1e-6.
    #[test]
    fn butterworth_low_pass_impulse_dc_gain() {
        let settings = FilterDesignSettings::new(1000.0, 4).unwrap();
        let designer = ButterworthDesigner;
        let mut filter = designer.create_low_pass(&settings, 100.0).unwrap();

        let mut impulse = vec![0.0; 1024];
        impulse[0] = 1.0;
        let output = filter.process_array(&impulse);
        let sum: f64 = output.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "dc gain was {sum}");
    }

    #[test]
    fn butterworth_gain_is_unity_at_dc() {
        let settings = FilterDesignSettings::new(1000.0, 2).unwrap();
        let designer = ButterworthDesigner;
        let mut filter = designer.create_low_pass(&settings, 50.0).unwrap();
        // Steady DC input converges to unity-gain steady state.
        let mut last = 0.0;
        for _ in 0..5000 {
            last = filter.process(1.0);
        }
        assert!((last - 1.0).abs() < 1e-6);
    }

    #[test]
    fn chebyshev1_requires_ripple() {
        let settings = FilterDesignSettings::new(1000.0, 4).unwrap();
        let designer = ChebyshevIDesigner;
        assert!(designer.create_low_pass(&settings, 100.0).is_err());
    }

    #[test]
    fn chebyshev1_low_pass_constructs_with_ripple() {
        let settings = FilterDesignSettings::new(1000.0, 4)
            .unwrap()
            .with_max_ripple(-1.0)
            .unwrap();
        let designer = ChebyshevIDesigner;
        assert!(designer.create_low_pass(&settings, 100.0).is_ok());
    }

    #[test]
    fn chebyshev2_low_pass_constructs() {
        let settings = FilterDesignSettings::new(1000.0, 4)
            .unwrap()
            .with_max_ripple(-20.0)
            .unwrap();
        let designer = ChebyshevIIDesigner;
        assert!(designer.create_low_pass(&settings, 100.0).is_ok());
    }

    #[test]
    fn chebyshev2_band_pass_reports_unsupported() {
        let settings = FilterDesignSettings::new(1000.0, 4)
            .unwrap()
            .with_max_ripple(-20.0)
            .unwrap();
        let designer = ChebyshevIIDesigner;
        assert!(designer.create_band_pass(&settings, 80.0, 120.0).is_err());
    }

    #[test]
    fn bessel_low_pass_constructs_and_is_stable() {
        let settings = FilterDesignSettings::new(1000.0, 3).unwrap();
        let designer = BesselDesigner;
        let mut filter = designer.create_low_pass(&settings, 100.0).unwrap();
        let output = filter.process_array(&vec![1.0; 200]);
        assert!(output.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn butterworth_band_pass_rejects_cutoff_order() {
        let settings = FilterDesignSettings::new(1000.0, 2).unwrap();
        let designer = ButterworthDesigner;
        assert!(designer.create_band_pass(&settings, 1000.0, 1200.0).is_err());
    }
}
