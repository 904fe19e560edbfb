//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! RBJ biquad cookbook designer (spec §4.3.2). Coefficients are lifted
//! nearly verbatim from the teacher's `BiQuadFilter::rbj_*_coefficients`
//! (effects/filter.rs), generalized from the teacher's single-f32-field
//! per-shape struct into the spec's `(fc, sampling_rate, Q, gain_dB)`
//! factory contract, and wired into a cascade of `order` identical biquads
//! when `order > 1`.

use std::f64::consts::PI;

use crate::design::{DesignedFilter, FilterDesignSettings, FilterDesigner};
use crate::error::{DspError, DspResult};
use crate::filters::{BiquadFilter, FilterCascade};

#[derive(Debug, Default)]
pub struct RbjDesigner;

struct Intermediates {
    w0cos: f64,
    w0sin: f64,
    alpha: f64,
}

fn intermediates_q(sampling_rate: f64, fc: f64, q: f64) -> Intermediates {
    let w0 = 2.0 * PI * fc / sampling_rate;
    let w0cos = w0.cos();
    let w0sin = w0.sin();
    let alpha = w0sin / (2.0 * q);
    Intermediates { w0cos, w0sin, alpha }
}

fn intermediates_bandwidth(sampling_rate: f64, fc_lo: f64, fc_hi: f64) -> (f64, Intermediates) {
    let fc = (fc_lo * fc_hi).sqrt();
    let q = fc / (fc_hi - fc_lo);
    (fc, intermediates_q(sampling_rate, fc, q))
}

fn quality_or_default(settings: &FilterDesignSettings) -> DspResult<f64> {
    settings.quality().ok_or_else(|| {
        DspError::arguments(
            crate::error::codes::ARITHMETIC,
            "RBJ designer requires FilterDesignSettings::with_quality",
        )
    })
}

fn repeat_as_cascade(
    settings: &FilterDesignSettings,
    b: [f64; 3],
    a: [f64; 3],
) -> DspResult<DesignedFilter> {
    let order = settings.order().max(1);
    let mut stages: Vec<Box<dyn crate::filters::StreamFilter + Send>> = Vec::with_capacity(order);
    for _ in 0..order {
        stages.push(Box::new(BiquadFilter::new(b, a)?));
    }
    if stages.len() == 1 {
        Ok(stages.into_iter().next().unwrap())
    } else {
        Ok(Box::new(FilterCascade::new(stages)))
    }
}

impl FilterDesigner for RbjDesigner {
    fn create_low_pass(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc)?;
        let q = quality_or_default(settings)?;
        let i = intermediates_q(settings.sampling_rate(), fc, q);
        repeat_as_cascade(
            settings,
            [
                (1.0 - i.w0cos) / 2.0,
                1.0 - i.w0cos,
                (1.0 - i.w0cos) / 2.0,
            ],
            [1.0 + i.alpha, -2.0 * i.w0cos, 1.0 - i.alpha],
        )
    }

    fn create_high_pass(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc)?;
        let q = quality_or_default(settings)?;
        let i = intermediates_q(settings.sampling_rate(), fc, q);
        repeat_as_cascade(
            settings,
            [
                (1.0 + i.w0cos) / 2.0,
                -(1.0 + i.w0cos),
                (1.0 + i.w0cos) / 2.0,
            ],
            [1.0 + i.alpha, -2.0 * i.w0cos, 1.0 - i.alpha],
        )
    }

    /// Derives `fc = sqrt(fc_lo*fc_hi)`, `Q = fc/(fc_hi - fc_lo)` (spec §4.3.2).
    fn create_band_pass(
        &self,
        settings: &FilterDesignSettings,
        fc_lo: f64,
        fc_hi: f64,
    ) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc_lo)?;
        settings.normalize_cutoff(fc_hi)?;
        let (_fc, i) = intermediates_bandwidth(settings.sampling_rate(), fc_lo, fc_hi);
        repeat_as_cascade(
            settings,
            [i.alpha, 0.0, -i.alpha],
            [1.0 + i.alpha, -2.0 * i.w0cos, 1.0 - i.alpha],
        )
    }

    fn create_band_stop(
        &self,
        settings: &FilterDesignSettings,
        fc_lo: f64,
        fc_hi: f64,
    ) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc_lo)?;
        settings.normalize_cutoff(fc_hi)?;
        let (_fc, i) = intermediates_bandwidth(settings.sampling_rate(), fc_lo, fc_hi);
        repeat_as_cascade(
            settings,
            [1.0, -2.0 * i.w0cos, 1.0],
            [1.0 + i.alpha, -2.0 * i.w0cos, 1.0 - i.alpha],
        )
    }

    /// Overrides the shared two-frequency default so an explicit
    /// `with_quality` (spec §8 scenario 2) drives the notch directly,
    /// instead of being discarded in favor of a synthetic bandwidth-derived
    /// Q (spec §4.3.2).
    fn create_notch(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc)?;
        let q = quality_or_default(settings)?;
        let i = intermediates_q(settings.sampling_rate(), fc, q);
        repeat_as_cascade(
            settings,
            [1.0, -2.0 * i.w0cos, 1.0],
            [1.0 + i.alpha, -2.0 * i.w0cos, 1.0 - i.alpha],
        )
    }

    fn create_all_pass(&self, settings: &FilterDesignSettings) -> DspResult<DesignedFilter> {
        // All-pass has no single characteristic frequency argument in the
        // shared trait; RBJ all-pass needs an fc, so callers reach it via
        // create_notch-style helpers is inappropriate here — require the
        // quality and use the designer's own constructor that takes fc.
        let _ = quality_or_default(settings)?;
        Err(DspError::unsupported(
            crate::error::codes::UNKNOWN_SHAPE,
            "RBJ all-pass requires a cutoff; use RbjDesigner::all_pass_at(settings, fc)",
        ))
    }

    fn create_low_shelf(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc)?;
        let gain_db = settings.gain().unwrap_or(0.0);
        let a = 10f64.powf(gain_db / 40.0);
        let (w0cos, alpha) = shelving_intermediates(settings.sampling_rate(), fc, a, 1.0);
        repeat_as_cascade(
            settings,
            [
                a * ((a + 1.0) - (a - 1.0) * w0cos + 2.0 * a.sqrt() * alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * w0cos),
                a * ((a + 1.0) - (a - 1.0) * w0cos - 2.0 * a.sqrt() * alpha),
            ],
            [
                (a + 1.0) + (a - 1.0) * w0cos + 2.0 * a.sqrt() * alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * w0cos),
                (a + 1.0) + (a - 1.0) * w0cos - 2.0 * a.sqrt() * alpha,
            ],
        )
    }

    fn create_high_shelf(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc)?;
        let gain_db = settings.gain().unwrap_or(0.0);
        let a = 10f64.powf(gain_db / 40.0);
        let (w0cos, alpha) = shelving_intermediates(settings.sampling_rate(), fc, a, 1.0);
        repeat_as_cascade(
            settings,
            [
                a * ((a + 1.0) + (a - 1.0) * w0cos + 2.0 * a.sqrt() * alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * w0cos),
                a * ((a + 1.0) + (a - 1.0) * w0cos - 2.0 * a.sqrt() * alpha),
            ],
            [
                (a + 1.0) - (a - 1.0) * w0cos + 2.0 * a.sqrt() * alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * w0cos),
                (a + 1.0) - (a - 1.0) * w0cos - 2.0 * a.sqrt() * alpha,
            ],
        )
    }

    fn create_peak(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc)?;
        let gain_db = settings.gain().unwrap_or(0.0);
        let q = quality_or_default(settings)?;
        let i = intermediates_q(settings.sampling_rate(), fc, q);
        let a = 10f64.powf(gain_db / 40.0);
        repeat_as_cascade(
            settings,
            [1.0 + i.alpha * a, -2.0 * i.w0cos, 1.0 - i.alpha * a],
            [1.0 + i.alpha / a, -2.0 * i.w0cos, 1.0 - i.alpha / a],
        )
    }
}

impl RbjDesigner {
    /// RBJ all-pass (takes an explicit `fc`, unlike the shared
    /// `FilterDesigner::create_all_pass` which has no frequency argument).
    pub fn all_pass_at(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        settings.normalize_cutoff(fc)?;
        let q = quality_or_default(settings)?;
        let i = intermediates_q(settings.sampling_rate(), fc, q);
        repeat_as_cascade(
            settings,
            [1.0 - i.alpha, -2.0 * i.w0cos, 1.0 + i.alpha],
            [1.0 + i.alpha, -2.0 * i.w0cos, 1.0 - i.alpha],
        )
    }
}

fn shelving_intermediates(sampling_rate: f64, fc: f64, a: f64, s: f64) -> (f64, f64) {
    let w0 = 2.0 * PI * fc / sampling_rate;
    let w0cos = w0.cos();
    let w0sin = w0.sin();
    let alpha = w0sin / 2.0 * ((a + 1.0 / a) * (1.0 / s - 1.0) + 2.0).sqrt();
    (w0cos, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::StreamFilter;

    /// Scenario 2 (spec §8): RBJ notch at 50Hz suppresses 50Hz far more
    /// than it suppresses the 120Hz component.
    #[test]
    fn notch_suppresses_target_frequency() {
        let settings = FilterDesignSettings::new(1000.0, 1)
            .unwrap()
            .with_quality(10.0)
            .unwrap();
        let designer = RbjDesigner;
        let mut filter = designer.create_notch(&settings, 50.0).unwrap();

        let n = 4096;
        let mut energy_50 = 0.0;
        let mut energy_120 = 0.0;
        for t in 0..n {
            let t = t as f64;
            let x = (2.0 * PI * 50.0 * t / 1000.0).sin() + (2.0 * PI * 120.0 * t / 1000.0).sin();
            let y = filter.process(x);
            // crude single-bin Goertzel-style energy accumulation via
            // correlation against the two probe tones.
            let ref50 = (2.0 * PI * 50.0 * t / 1000.0).sin();
            let ref120 = (2.0 * PI * 120.0 * t / 1000.0).sin();
            energy_50 += y * ref50;
            energy_120 += y * ref120;
        }
        assert!(energy_50.abs() < 0.01 * energy_120.abs());
    }

    #[test]
    fn low_pass_rejects_cutoff_without_quality() {
        let settings = FilterDesignSettings::new(1000.0, 1).unwrap();
        let designer = RbjDesigner;
        assert!(designer.create_low_pass(&settings, 100.0).is_err());
    }

    #[test]
    fn order_greater_than_one_cascades_identical_biquads() {
        let settings = FilterDesignSettings::new(1000.0, 3)
            .unwrap()
            .with_quality(0.707)
            .unwrap();
        let designer = RbjDesigner;
        let filter = designer.create_low_pass(&settings, 100.0).unwrap();
        // A cascade of 3 should produce a different (steeper) response than
        // a single biquad; we simply assert it constructs without error and
        // is usable.
        let mut filter = filter;
        let _ = filter.process(1.0);
    }
}
