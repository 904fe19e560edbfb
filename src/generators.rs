//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Waveform and noise generators (spec §4.4, component C5). Grounded in the
//! teacher's `Oscillator` (oscillators.rs) for the precomputed-waveform
//! shape, generalized from a live-computed f32 audio oscillator to the
//! spec's one-second precomputed f64 buffer.

use std::f64::consts::PI;

use rand_core::RngCore;

use crate::error::{DspError, DspResult};

/// Holds a non-empty sequence; `next()` returns the current element and
/// advances, wrapping at the end (spec §4.4).
#[derive(Debug, Clone)]
pub struct PeriodicGenerator {
    sequence: Vec<f64>,
    index: usize,
}

impl PeriodicGenerator {
    pub fn new(sequence: Vec<f64>) -> DspResult<Self> {
        if sequence.is_empty() {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "periodic generator sequence must be non-empty",
            ));
        }
        Ok(Self { sequence, index: 0 })
    }

    pub fn next(&mut self) -> f64 {
        let value = self.sequence[self.index];
        self.index = (self.index + 1) % self.sequence.len();
        value
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn sequence(&self) -> &[f64] {
        &self.sequence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "kebab_case")]
pub enum WaveformShape {
    Dc,
    Sine,
    Impulse,
}

/// On construction, builds a one-second precomputed sequence of length
/// `int(sampling_rate)` (length 1 for DC) and wraps it in a
/// [`PeriodicGenerator`] (spec §4.4).
#[derive(Debug, Clone)]
pub struct WaveformGenerator {
    generator: PeriodicGenerator,
}

const MAX_SAMPLING_RATE: f64 = (i32::MAX) as f64;

impl WaveformGenerator {
    pub fn new(
        shape: WaveformShape,
        sampling_rate: f64,
        frequency: f64,
        amplitude: f64,
        offset: f64,
        phase: f64,
    ) -> DspResult<Self> {
        if !(sampling_rate > 0.0 && sampling_rate <= MAX_SAMPLING_RATE) {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "sampling_rate must be in (0, 2^31-1]",
            ));
        }
        if !(frequency >= 0.0 && frequency.is_finite()) {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "frequency must be finite and >= 0",
            ));
        }
        if !(0.0..=2.0 * PI).contains(&phase) {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "phase must be in [0, 2*pi]",
            ));
        }

        let sequence = match shape {
            WaveformShape::Dc => vec![amplitude + offset],
            WaveformShape::Sine => {
                let n = sampling_rate as usize;
                (0..n)
                    .map(|i| offset + amplitude * (phase + i as f64 * 2.0 * PI * frequency / sampling_rate).sin())
                    .collect()
            }
            WaveformShape::Impulse => {
                let n = sampling_rate as usize;
                let mut sequence = vec![offset; n];
                let spike_index = ((phase / (2.0 * PI)) * sampling_rate).round() as usize;
                if let Some(slot) = sequence.get_mut(spike_index.min(n.saturating_sub(1))) {
                    *slot = amplitude;
                }
                sequence
            }
        };

        Ok(Self {
            generator: PeriodicGenerator::new(sequence)?,
        })
    }

    pub fn next(&mut self) -> f64 {
        self.generator.next()
    }

    pub fn reset(&mut self) {
        self.generator.reset();
    }

    pub fn sequence(&self) -> &[f64] {
        self.generator.sequence()
    }
}

/// `next() ∈ [0,1]`, backed by a pluggable [`RngCore`] (spec §4.4). `reset`
/// is a no-op since a PRNG stream has no rewindable notion of "start".
#[derive(Debug)]
pub struct UniformRandomGenerator<R: RngCore> {
    rng: R,
}

impl<R: RngCore> UniformRandomGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn next(&mut self) -> f64 {
        (self.rng.next_u32() as f64) / (u32::MAX as f64)
    }

    pub fn reset(&mut self) {}
}

/// Marsaglia-polar Gaussian generator (spec §4.4): draws `(v1, v2)` uniform
/// in `[-1, 1]`, accepts when `r = v1^2 + v2^2` falls in `(0, 1)`, else
/// redraws.
#[derive(Debug)]
pub struct GaussianGenerator<R: RngCore> {
    rng: R,
    mean: f64,
    std: f64,
}

impl<R: RngCore> GaussianGenerator<R> {
    pub fn new(rng: R, mean: f64, std: f64) -> DspResult<Self> {
        if !mean.is_finite() {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "mean must be finite",
            ));
        }
        if !(std.is_finite() && std >= 0.0) {
            return Err(DspError::arguments(
                crate::error::codes::ARITHMETIC,
                "std must be finite and >= 0",
            ));
        }
        Ok(Self { rng, mean, std })
    }

    fn uniform_signed(&mut self) -> f64 {
        2.0 * ((self.rng.next_u32() as f64) / (u32::MAX as f64)) - 1.0
    }

    pub fn next(&mut self) -> f64 {
        loop {
            let v1 = self.uniform_signed();
            let v2 = self.uniform_signed();
            let r = v1 * v1 + v2 * v2;
            if r > 0.0 && r < 1.0 {
                let x = v1 * (-2.0 * r.ln() / r).sqrt();
                return self.mean + self.std * x;
            }
        }
    }

    pub fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_xorshift::XorShiftRng;
    use rand_core::SeedableRng;

    #[test]
    fn periodic_generator_wraps_and_resets() {
        let mut g = PeriodicGenerator::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(g.next(), 1.0);
        assert_eq!(g.next(), 2.0);
        assert_eq!(g.next(), 3.0);
        assert_eq!(g.next(), 1.0);
        g.reset();
        assert_eq!(g.next(), 1.0);
    }

    #[test]
    fn periodic_generator_rejects_empty_sequence() {
        assert!(PeriodicGenerator::new(Vec::new()).is_err());
    }

    #[test]
    fn dc_waveform_has_length_one() {
        let g = WaveformGenerator::new(WaveformShape::Dc, 1000.0, 0.0, 2.0, 0.5, 0.0).unwrap();
        assert_eq!(g.sequence(), &[2.5]);
    }

    #[test]
    fn sine_waveform_has_sampling_rate_length() {
        let g = WaveformGenerator::new(WaveformShape::Sine, 1000.0, 50.0, 1.0, 0.0, 0.0).unwrap();
        assert_eq!(g.sequence().len(), 1000);
    }

    #[test]
    fn impulse_waveform_spikes_at_expected_index() {
        let g = WaveformGenerator::new(WaveformShape::Impulse, 1000.0, 0.0, 3.0, 0.0, 0.0).unwrap();
        assert_eq!(g.sequence()[0], 3.0);
        assert!(g.sequence()[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn waveform_rejects_out_of_range_phase() {
        assert!(WaveformGenerator::new(WaveformShape::Sine, 1000.0, 10.0, 1.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn uniform_generator_stays_in_unit_interval() {
        let rng = XorShiftRng::seed_from_u64(42);
        let mut g = UniformRandomGenerator::new(rng);
        for _ in 0..1000 {
            let v = g.next();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn gaussian_generator_rejects_invalid_std() {
        let rng = XorShiftRng::seed_from_u64(1);
        assert!(GaussianGenerator::new(rng, 0.0, -1.0).is_err());
    }

    #[test]
    fn gaussian_generator_produces_finite_samples() {
        let rng = XorShiftRng::seed_from_u64(7);
        let mut g = GaussianGenerator::new(rng, 0.0, 1.0).unwrap();
        for _ in 0..1000 {
            assert!(g.next().is_finite());
        }
    }
}
