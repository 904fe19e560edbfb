//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Filter designer framework (spec §4.3, component C4): an abstract
//! `FilterDesigner` capability exposing factory operations by shape,
//! implemented by the Fisher-method family (Butterworth/Chebyshev/Bessel),
//! the RBJ biquad cookbook, and the median/Savitzky-Golay designers.
//!
//! Design note: the teacher's deep `AbstractDesigner -> Fisher ->
//! Butterworth/Chebyshev/Bessel` inheritance chain (per spec §9 redesign
//! guidance) is flattened here into one trait plus free functions that take
//! a `prototype_poles` callback, rather than a class hierarchy.

mod fisher;
mod median_sg;
mod rbj;

pub use fisher::{BesselDesigner, ButterworthDesigner, ChebyshevIDesigner, ChebyshevIIDesigner};
pub use median_sg::{MedianDesigner, SavitzkyGolayDesigner};
pub use rbj::RbjDesigner;

use crate::error::{DspError, DspResult};
use crate::filters::StreamFilter;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Tagged shape variant (spec §3 `FilterShape`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "kebab_case")]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum FilterShape {
    AllPass,
    LowPass,
    HighPass,
    BandStop,
    BandPass,
    LowShelf,
    HighShelf,
    Notch,
    Peak,
    Other,
}

/// Base settings shared by every designer (spec §3 `FilterDesignSettings`).
/// Shape-specific extensions are modeled as additional optional fields
/// rather than separate types, since every designer only reads the fields
/// relevant to it and validates at property-set time (spec §3).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct FilterDesignSettings {
    sampling_rate: f64,
    order: usize,
    max_ripple: Option<f64>,
    quality: Option<f64>,
    gain: Option<f64>,
    window_size: Option<usize>,
}

impl FilterDesignSettings {
    pub fn new(sampling_rate: f64, order: usize) -> DspResult<Self> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "sampling_rate must be finite and > 0",
            ));
        }
        Ok(Self {
            sampling_rate,
            order,
            max_ripple: None,
            quality: None,
            gain: None,
            window_size: None,
        })
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// `ChebyshevSettings.max_ripple ∈ (-∞, 0]`.
    pub fn with_max_ripple(mut self, max_ripple: f64) -> DspResult<Self> {
        if !(max_ripple.is_finite() && max_ripple <= 0.0) {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "max_ripple must be finite and <= 0",
            ));
        }
        self.max_ripple = Some(max_ripple);
        Ok(self)
    }

    pub fn max_ripple(&self) -> Option<f64> {
        self.max_ripple
    }

    /// `RbjSettings.quality > 0`. (spec §3 gives the illustrative range
    /// `(0,1]`, but spec §8 scenario 2 exercises an RBJ notch at `Q = 10`;
    /// a numbered testable scenario outranks an illustrative range, so this
    /// only enforces positivity and finiteness — see DESIGN.md.)
    pub fn with_quality(mut self, quality: f64) -> DspResult<Self> {
        if !(quality.is_finite() && quality > 0.0) {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "quality must be finite and > 0",
            ));
        }
        self.quality = Some(quality);
        Ok(self)
    }

    pub fn quality(&self) -> Option<f64> {
        self.quality
    }

    pub fn with_gain(mut self, gain: f64) -> DspResult<Self> {
        if !gain.is_finite() {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "gain must be finite",
            ));
        }
        self.gain = Some(gain);
        Ok(self)
    }

    pub fn gain(&self) -> Option<f64> {
        self.gain
    }

    pub fn with_window_size(mut self, window_size: usize) -> DspResult<Self> {
        if window_size == 0 {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "window_size must be > 0",
            ));
        }
        self.window_size = Some(window_size);
        Ok(self)
    }

    pub fn window_size(&self) -> Option<usize> {
        self.window_size
    }

    /// `fc/samplingRate` must lie in `(0, 0.5)` (spec §4.3).
    pub fn normalize_cutoff(&self, fc_hz: f64) -> DspResult<f64> {
        let normalized = fc_hz / self.sampling_rate;
        if !(normalized > 0.0 && normalized < 0.5) {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                format!(
                    "normalized cutoff {normalized} is out of band (0, 0.5); fc={fc_hz}, sampling_rate={}",
                    self.sampling_rate
                ),
            ));
        }
        Ok(normalized)
    }
}

pub type DesignedFilter = Box<dyn StreamFilter + Send>;

/// Abstract contract: a designer exposes factory operations by shape
/// (spec §4.3). Default methods fail with `Unsupported`; a default
/// `create_band_pass` may be synthesized by cascading high-pass + low-pass
/// when both are available.
pub trait FilterDesigner {
    fn create_low_pass(&self, _settings: &FilterDesignSettings, _fc: f64) -> DspResult<DesignedFilter> {
        Err(unsupported("create_low_pass"))
    }

    fn create_high_pass(&self, _settings: &FilterDesignSettings, _fc: f64) -> DspResult<DesignedFilter> {
        Err(unsupported("create_high_pass"))
    }

    fn create_band_pass(
        &self,
        settings: &FilterDesignSettings,
        fc_lo: f64,
        fc_hi: f64,
    ) -> DspResult<DesignedFilter> {
        let hp = self.create_high_pass(settings, fc_lo);
        let lp = self.create_low_pass(settings, fc_hi);
        match (hp, lp) {
            (Ok(hp), Ok(lp)) => Ok(Box::new(crate::filters::FilterCascade::new(vec![hp, lp]))),
            _ => Err(unsupported("create_band_pass")),
        }
    }

    fn create_band_stop(
        &self,
        _settings: &FilterDesignSettings,
        _fc_lo: f64,
        _fc_hi: f64,
    ) -> DspResult<DesignedFilter> {
        Err(unsupported("create_band_stop"))
    }

    /// Narrow band-stop.
    fn create_notch(&self, settings: &FilterDesignSettings, fc: f64) -> DspResult<DesignedFilter> {
        let bandwidth = fc * 0.05;
        self.create_band_stop(settings, fc - bandwidth / 2.0, fc + bandwidth / 2.0)
    }

    fn create_all_pass(&self, _settings: &FilterDesignSettings) -> DspResult<DesignedFilter> {
        Err(unsupported("create_all_pass"))
    }

    fn create_low_shelf(&self, _settings: &FilterDesignSettings, _fc: f64) -> DspResult<DesignedFilter> {
        Err(unsupported("create_low_shelf"))
    }

    fn create_high_shelf(&self, _settings: &FilterDesignSettings, _fc: f64) -> DspResult<DesignedFilter> {
        Err(unsupported("create_high_shelf"))
    }

    fn create_peak(&self, _settings: &FilterDesignSettings, _fc: f64) -> DspResult<DesignedFilter> {
        Err(unsupported("create_peak"))
    }

    /// Designer-specific (median, Savitzky-Golay, ...).
    fn create_other(&self, _settings: &FilterDesignSettings) -> DspResult<DesignedFilter> {
        Err(unsupported("create_other"))
    }
}

fn unsupported(op: &str) -> DspError {
    DspError::unsupported(crate::error::codes::UNKNOWN_SHAPE, format!("{op} is not supported by this designer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_reject_out_of_band_sampling_rate() {
        assert!(FilterDesignSettings::new(0.0, 4).is_err());
        assert!(FilterDesignSettings::new(f64::NAN, 4).is_err());
    }

    /// Scenario 5 (spec §8): normalizing fc = samplingRate must fail.
    #[test]
    fn designer_rejects_out_of_band_cutoff() {
        let settings = FilterDesignSettings::new(1000.0, 4).unwrap();
        assert!(settings.normalize_cutoff(1000.0).is_err());
    }

    #[test]
    fn chebyshev_ripple_must_be_non_positive() {
        let settings = FilterDesignSettings::new(1000.0, 4).unwrap();
        assert!(settings.with_max_ripple(0.5).is_err());
        assert!(settings.with_max_ripple(-1.0).is_ok());
    }
}
