//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! An online DSP filter engine and acquisition-device lifecycle core for
//! biological signal streams (EEG/ECG and similar). See `DESIGN.md` for the
//! grounding ledger and `SPEC_FULL.md` for the requirements this crate
//! implements.
//!
//! The filter engine (stream filters + designer framework) is the
//! standalone, reusable half; the device lifecycle core is built on top of
//! it but has no dependency in the other direction — a consumer that only
//! needs filtering never has to touch `device`.

pub mod channel;
pub mod clock;
pub mod design;
pub mod device;
pub mod error;
pub mod filters;
pub mod generators;
pub mod numeric;
pub mod observer;
pub mod polynomial;
pub mod sealable;

pub use design::{
    BesselDesigner, ButterworthDesigner, ChebyshevIDesigner, ChebyshevIIDesigner, DesignedFilter,
    FilterDesignSettings, FilterDesigner, FilterShape, MedianDesigner, RbjDesigner, SavitzkyGolayDesigner,
};
pub use error::{Class, DspError, DspResult, Exception, Severity};
pub use filters::{BiquadFilter, FilterCascade, IirFilter, MedianFilter, NullFilter, StreamFilter};
