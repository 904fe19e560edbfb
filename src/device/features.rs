//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Feature dispatch registry (spec §4.7, component C8). The spec describes
//! reflection over method names like `is_feature_{canonical}_available`;
//! per spec §9's guidance ("Rust/C++ implementations realize this as a
//! static registry built at device-type construction time; dynamic
//! reflection is not required"), this is a `FxHashMap`-backed registry of
//! closures keyed by canonical name, built once per device type.

use std::any::Any;

use convert_case::{Case, Casing};
use rustc_hash::FxHashMap;

use crate::error::{codes, DspError, DspResult};

/// A (associated-device-type, display-name) pair; two features are equal
/// iff their canonical-alphanumeric US-ASCII display names compare
/// case-insensitive (spec §4.7).
#[derive(Debug, Clone)]
pub struct Feature {
    device_type: &'static str,
    display_name: String,
}

impl Feature {
    pub fn new(device_type: &'static str, display_name: impl Into<String>) -> Self {
        Self {
            device_type,
            display_name: display_name.into(),
        }
    }

    pub fn device_type(&self) -> &'static str {
        self.device_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Canonical-alphanumeric US-ASCII, lowercased, no separators.
    pub fn canonical(&self) -> String {
        canonicalize(&self.display_name)
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

fn canonicalize(name: &str) -> String {
    let ascii_alphanumeric: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    ascii_alphanumeric.to_case(Case::Flat)
}

type Predicate<D> = Box<dyn Fn(&D) -> bool + Send + Sync>;
type Action<D> = Box<dyn Fn(&mut D, Option<&dyn Any>) -> bool + Send + Sync>;

struct Handlers<D> {
    is_available: Predicate<D>,
    is_enabled: Option<Predicate<D>>,
    perform: Option<Action<D>>,
}

/// Per-device-type registry of feature handlers, resolved by canonical
/// name (spec §4.7).
pub struct FeatureCollection<D> {
    device_type: &'static str,
    handlers: FxHashMap<String, Handlers<D>>,
}

impl<D> FeatureCollection<D> {
    pub fn new(device_type: &'static str) -> Self {
        Self {
            device_type,
            handlers: FxHashMap::default(),
        }
    }

    /// Registers `is_feature_{canonical}_available` (required),
    /// `is_feature_{canonical}_enabled` (optional — falls back to
    /// `is_available` when absent), and `perform_{canonical}` (optional —
    /// absence makes `perform` return `false`).
    pub fn register(
        &mut self,
        display_name: impl Into<String>,
        is_available: impl Fn(&D) -> bool + Send + Sync + 'static,
        is_enabled: Option<Box<dyn Fn(&D) -> bool + Send + Sync>>,
        perform: Option<Action<D>>,
    ) {
        let canonical = canonicalize(&display_name.into());
        self.handlers.insert(
            canonical,
            Handlers {
                is_available: Box::new(is_available),
                is_enabled,
                perform,
            },
        );
    }

    fn check_type(&self, feature: &Feature) -> DspResult<()> {
        if feature.device_type() != self.device_type {
            return Err(DspError::arguments(
                codes::ARITHMETIC,
                format!(
                    "feature '{}' belongs to device type '{}', not '{}'",
                    feature.display_name(),
                    feature.device_type(),
                    self.device_type
                ),
            ));
        }
        Ok(())
    }

    pub fn is_available(&self, device: &D, feature: &Feature) -> DspResult<bool> {
        self.check_type(feature)?;
        Ok(self
            .handlers
            .get(&feature.canonical())
            .map(|h| (h.is_available)(device))
            .unwrap_or(false))
    }

    pub fn is_enabled(&self, device: &D, feature: &Feature) -> DspResult<bool> {
        self.check_type(feature)?;
        Ok(match self.handlers.get(&feature.canonical()) {
            Some(h) => match &h.is_enabled {
                Some(f) => f(device),
                None => (h.is_available)(device),
            },
            None => false,
        })
    }

    pub fn is_available_and_enabled(&self, device: &D, feature: &Feature) -> DspResult<bool> {
        Ok(self.is_available(device, feature)? && self.is_enabled(device, feature)?)
    }

    pub fn perform(&self, device: &mut D, feature: &Feature, param: Option<&dyn Any>) -> DspResult<bool> {
        self.check_type(feature)?;
        Ok(match self.handlers.get(&feature.canonical()) {
            Some(Handlers { perform: Some(f), .. }) => f(device, param),
            _ => false,
        })
    }
}
