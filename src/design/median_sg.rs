//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Non-frequency-domain designers (spec §4.3.3): median and Savitzky-Golay.
//! Neither takes a cutoff frequency; both are reached through
//! `FilterDesigner::create_other`.

use crate::design::{DesignedFilter, FilterDesignSettings, FilterDesigner};
use crate::error::{DspError, DspResult};
use crate::filters::MedianFilter;

/// Wires `FilterDesignSettings.window_size` (falling back to `order()` when
/// set, else 2) straight into [`MedianFilter`] (spec §4.3.3).
#[derive(Debug, Default)]
pub struct MedianDesigner;

impl FilterDesigner for MedianDesigner {
    fn create_other(&self, settings: &FilterDesignSettings) -> DspResult<DesignedFilter> {
        let window = settings
            .window_size()
            .unwrap_or_else(|| if settings.order() > 0 { settings.order() } else { 2 });
        Ok(Box::new(MedianFilter::new(window)?))
    }
}

/// Savitzky-Golay smoothing, quadratic polynomial order, built from the
/// closed-form Vandermonde least-squares convolution coefficients (spec §9
/// open question, resolved per SPEC_FULL.md: implement rather than punt).
#[derive(Debug, Default)]
pub struct SavitzkyGolayDesigner;

impl FilterDesigner for SavitzkyGolayDesigner {
    fn create_other(&self, settings: &FilterDesignSettings) -> DspResult<DesignedFilter> {
        let window = settings.window_size().ok_or_else(|| {
            DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "Savitzky-Golay designer requires FilterDesignSettings::with_window_size",
            )
        })?;
        if window % 2 == 0 || window < 3 {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "Savitzky-Golay window_size must be odd and >= 3",
            ));
        }
        let coefficients = quadratic_sg_coefficients(window)?;
        Ok(Box::new(crate::filters::IirFilter::new(coefficients, vec![1.0])?))
    }
}

/// Closed-form quadratic (degree-2) Savitzky-Golay smoothing coefficients
/// for a symmetric window of `half = (window-1)/2` samples on each side,
/// derived by solving the normal equations of the Vandermonde design matrix
/// `[1, i, i^2]` (i = -half..=half) for the value at i=0. Grounded in the
/// standard closed-form `c_i = (3*(3*half^2 + 3*half - 1 - 5*i^2)) /
/// ((2*half+3)*(2*half+1)*(2*half-1))` (Savitzky & Golay / Gorry 1990).
fn quadratic_sg_coefficients(window: usize) -> DspResult<Vec<f64>> {
    let half = (window - 1) / 2;
    let h = half as f64;
    let denom = (2.0 * h + 3.0) * (2.0 * h + 1.0) * (2.0 * h - 1.0);
    if denom.abs() < 1e-12 {
        return Err(DspError::arithmetic(
            "Savitzky-Golay window too small for a quadratic fit",
        ));
    }
    let coefficients: Vec<f64> = (0..window)
        .map(|k| {
            let i = k as f64 - h;
            3.0 * (3.0 * h * h + 3.0 * h - 1.0 - 5.0 * i * i) / denom
        })
        .collect();
    Ok(coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::StreamFilter;

    #[test]
    fn median_designer_defaults_to_order_when_window_unset() {
        let settings = FilterDesignSettings::new(1000.0, 5).unwrap();
        let designer = MedianDesigner;
        let mut filter = designer.create_other(&settings).unwrap();
        let _ = filter.process_array(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn savitzky_golay_requires_window_size() {
        let settings = FilterDesignSettings::new(1000.0, 0).unwrap();
        let designer = SavitzkyGolayDesigner;
        assert!(designer.create_other(&settings).is_err());
    }

    #[test]
    fn savitzky_golay_coefficients_sum_to_one() {
        let coefficients = quadratic_sg_coefficients(5).unwrap();
        let sum: f64 = coefficients.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn savitzky_golay_smooths_noisy_step_without_dc_bias() {
        let settings = FilterDesignSettings::new(1000.0, 0)
            .unwrap()
            .with_window_size(5)
            .unwrap();
        let designer = SavitzkyGolayDesigner;
        let mut filter = designer.create_other(&settings).unwrap();
        let output = filter.process_array(&[2.0; 20]);
        assert!((output[19] - 2.0).abs() < 1e-9);
    }
}
