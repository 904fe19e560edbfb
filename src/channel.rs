//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Physical channel and sealable channel collection (spec §3, §4.8,
//! component C9). Grounded in `other_examples`'s device/channel modeling
//! (`nicompiler_backend`'s `device.rs`, `soapysdr`'s `device.rs`) for the
//! (id, name, sampling_rate, range) shape, expressed in this crate's
//! `Sealable` idiom.

use crate::error::{codes, DspError, DspResult};
use crate::sealable::Sealable;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// `min < max`, both finite (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> DspResult<Self> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(DspError::arguments(
                codes::ARITHMETIC,
                "range requires finite min < max",
            ));
        }
        Ok(Self { min, max })
    }
}

/// (id, name, sampling_rate ≥ 0, range). Sealable: once sealed, any
/// mutation fails with `InvalidOperation` (spec §3).
#[derive(Debug, Clone)]
pub struct PhysicalChannel {
    id: u32,
    name: String,
    sampling_rate: f64,
    range: Range,
    sealed: bool,
}

impl PhysicalChannel {
    pub fn new(id: u32, name: impl Into<String>, sampling_rate: f64, range: Range) -> DspResult<Self> {
        if !(sampling_rate.is_finite() && sampling_rate >= 0.0) {
            return Err(DspError::arguments(
                codes::ARITHMETIC,
                "channel sampling_rate must be finite and >= 0",
            ));
        }
        Ok(Self {
            id,
            name: name.into(),
            sampling_rate,
            range,
            sealed: false,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn set_sampling_rate(&mut self, sampling_rate: f64) -> DspResult<()> {
        self.throw_if_sealed()?;
        if !(sampling_rate.is_finite() && sampling_rate >= 0.0) {
            return Err(DspError::arguments(
                codes::ARITHMETIC,
                "channel sampling_rate must be finite and >= 0",
            ));
        }
        self.sampling_rate = sampling_rate;
        Ok(())
    }

    pub fn set_range(&mut self, range: Range) -> DspResult<()> {
        self.throw_if_sealed()?;
        self.range = range;
        Ok(())
    }
}

impl Sealable for PhysicalChannel {
    fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn seal(&mut self) {
        self.sealed = true;
    }

    fn deep_clone(&self) -> Self {
        Self {
            sealed: false,
            ..self.clone()
        }
    }
}

/// Ordered set of channels; uniqueness of id and name is checked at device
/// setup (spec §3, §4.6); sealing propagates to every member.
#[derive(Debug, Clone, Default)]
pub struct ChannelCollection {
    channels: Vec<PhysicalChannel>,
    sealed: bool,
}

impl ChannelCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, channel: PhysicalChannel) -> DspResult<()> {
        self.throw_if_sealed()?;
        self.channels.push(channel);
        Ok(())
    }

    pub fn channels(&self) -> &[PhysicalChannel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Non-empty, identical sampling rates unless `allow_multifrequency`,
    /// no zero rates unless `allow_sampling_on_value_change`, unique ids
    /// and unique names (spec §4.6 `setup()` validation).
    pub fn validate(
        &self,
        allow_multifrequency: bool,
        allow_sampling_on_value_change: bool,
    ) -> DspResult<()> {
        if self.channels.is_empty() {
            return Err(DspError::state(
                codes::INVALID_STATE,
                "channel collection must be non-empty before device setup",
            ));
        }

        if !allow_sampling_on_value_change && self.channels.iter().any(|c| c.sampling_rate == 0.0) {
            return Err(DspError::state(
                codes::INVALID_STATE,
                "zero sampling_rate requires the SamplingOnValueChange feature",
            ));
        }

        if !allow_multifrequency {
            let first = self.channels[0].sampling_rate;
            if self.channels.iter().any(|c| c.sampling_rate != first) {
                return Err(DspError::state(
                    codes::INVALID_STATE,
                    "mixed sampling rates require the Multifrequency feature",
                ));
            }
        }

        let mut ids = std::collections::HashSet::new();
        let mut names = std::collections::HashSet::new();
        for c in &self.channels {
            if !ids.insert(c.id()) {
                return Err(DspError::state(
                    codes::INVALID_STATE,
                    format!("duplicate channel id {}", c.id()),
                ));
            }
            if !names.insert(c.name().to_string()) {
                return Err(DspError::state(
                    codes::INVALID_STATE,
                    format!("duplicate channel name {}", c.name()),
                ));
            }
        }
        Ok(())
    }
}

impl Sealable for ChannelCollection {
    fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn seal(&mut self) {
        self.sealed = true;
        for channel in self.channels.iter_mut() {
            channel.seal();
        }
    }

    fn deep_clone(&self) -> Self {
        Self {
            channels: self.channels.iter().map(Sealable::deep_clone).collect(),
            sealed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: u32, name: &str, rate: f64) -> PhysicalChannel {
        PhysicalChannel::new(id, name, rate, Range::new(-1.0, 1.0).unwrap()).unwrap()
    }

    #[test]
    fn range_requires_min_less_than_max() {
        assert!(Range::new(1.0, 1.0).is_err());
        assert!(Range::new(1.0, -1.0).is_err());
    }

    #[test]
    fn mutation_fails_once_channel_is_sealed() {
        let mut c = channel(1, "C1", 1000.0);
        c.seal();
        assert!(c.set_sampling_rate(500.0).is_err());
    }

    #[test]
    fn seal_propagates_to_children() {
        let mut collection = ChannelCollection::new();
        collection.push(channel(1, "C1", 1000.0)).unwrap();
        collection.seal();
        assert!(collection.channels()[0].is_sealed());
        assert!(collection.push(channel(2, "C2", 1000.0)).is_err());
    }

    #[test]
    fn validate_rejects_empty_collection() {
        let collection = ChannelCollection::new();
        assert!(collection.validate(false, false).is_err());
    }

    #[test]
    fn validate_rejects_duplicate_ids_and_names() {
        let mut collection = ChannelCollection::new();
        collection.push(channel(1, "C1", 1000.0)).unwrap();
        collection.push(channel(1, "C2", 1000.0)).unwrap();
        assert!(collection.validate(false, false).is_err());

        let mut collection2 = ChannelCollection::new();
        collection2.push(channel(1, "C1", 1000.0)).unwrap();
        collection2.push(channel(2, "C1", 1000.0)).unwrap();
        assert!(collection2.validate(false, false).is_err());
    }

    #[test]
    fn validate_rejects_mixed_rates_without_multifrequency() {
        let mut collection = ChannelCollection::new();
        collection.push(channel(1, "C1", 1000.0)).unwrap();
        collection.push(channel(2, "C2", 500.0)).unwrap();
        assert!(collection.validate(false, false).is_err());
        assert!(collection.validate(true, false).is_ok());
    }

    #[test]
    fn deep_clone_is_unsealed_even_when_source_sealed() {
        let mut collection = ChannelCollection::new();
        collection.push(channel(1, "C1", 1000.0)).unwrap();
        collection.seal();
        let cloned = collection.deep_clone();
        assert!(!cloned.is_sealed());
        assert!(!cloned.channels()[0].is_sealed());
    }
}
