//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Structured error model shared across the filter engine and the
//! acquisition-device core. See spec §4.9 / §7.

use std::fmt;

use thiserror::Error;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// How bad is it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

/// What kind of thing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Class {
    Generic,
    Internal,
    Arguments,
    State,
    Unsupported,
    Device,
    Communication,
}
impl Class {
    /// Device and Communication classes, plus Generic, may be worth a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Class::Generic | Class::Communication)
    }
}

/// A single structured failure: severity, class, a numeric code local to
/// `class`, and a human-readable message.
#[derive(Debug, Clone, Error)]
#[error("[{severity:?}/{class:?}:{code}] {message}")]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DspError {
    pub severity: Severity,
    pub class: Class,
    pub code: u16,
    pub message: String,
}

impl DspError {
    pub fn new(severity: Severity, class: Class, code: u16, message: impl Into<String>) -> Self {
        Self {
            severity,
            class,
            code,
            message: message.into(),
        }
    }

    pub fn arguments(code: u16, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Class::Arguments, code, message)
    }

    pub fn state(code: u16, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Class::State, code, message)
    }

    pub fn unsupported(code: u16, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Class::Unsupported, code, message)
    }

    pub fn internal(code: u16, message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, Class::Internal, code, message)
    }

    pub fn generic(code: u16, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Class::Generic, code, message)
    }

    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Class::Generic, codes::ARITHMETIC, message)
    }

    /// `HResult = 0xA0000000 | ((class & 0x7FF) << 16) | code` (spec §4.9).
    pub fn hresult(&self) -> u32 {
        let class_bits = (self.class_ordinal() & 0x7FF) << 16;
        0xA000_0000 | class_bits | self.code as u32
    }

    pub fn is_retryable(&self) -> bool {
        self.class.is_retryable()
    }

    fn class_ordinal(&self) -> u32 {
        match self.class {
            Class::Generic => 0,
            Class::Internal => 1,
            Class::Arguments => 2,
            Class::State => 3,
            Class::Unsupported => 4,
            Class::Device => 5,
            Class::Communication => 6,
        }
    }
}

/// Well-known codes reused across modules. Not exhaustive — call sites may
/// also mint ad hoc codes local to their class.
pub mod codes {
    pub const ARITHMETIC: u16 = 1;
    pub const LIMIT_REACHED: u16 = 2;
    pub const INVALID_OPERATION: u16 = 3;
    pub const CANNOT_CHANGE_STATE: u16 = 4;
    pub const INVALID_STATE: u16 = 5;
    pub const ACQUISITION_MODE: u16 = 6;
    pub const UNKNOWN_SHAPE: u16 = 7;
}

/// An aggregation of one or more [`DspError`]s. Always non-empty.
#[derive(Debug, Clone)]
pub struct Exception {
    errors: Vec<DspError>,
}

impl Exception {
    /// Panics if `errors` is empty: an exception with no errors is a
    /// programming mistake at the call site, not a recoverable condition.
    pub fn new(errors: Vec<DspError>) -> Self {
        assert!(!errors.is_empty(), "Exception requires at least one error");
        Self { errors }
    }

    pub fn single(error: DspError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn errors(&self) -> &[DspError] {
        &self.errors
    }

    pub fn first(&self) -> &DspError {
        &self.errors[0]
    }

    pub fn is_retryable(&self) -> bool {
        self.errors.iter().all(|e| e.is_retryable())
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Exception {}

impl From<DspError> for Exception {
    fn from(e: DspError) -> Self {
        Exception::single(e)
    }
}

pub type DspResult<T> = Result<T, DspError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hresult_encodes_class_and_code() {
        let e = DspError::new(Severity::Error, Class::Arguments, 42, "bad cutoff");
        assert_eq!(e.hresult(), 0xA000_0000 | (2 << 16) | 42);
    }

    #[test]
    fn retryable_classes() {
        assert!(Class::Generic.is_retryable());
        assert!(Class::Communication.is_retryable());
        assert!(!Class::Arguments.is_retryable());
        assert!(!Class::State.is_retryable());
    }

    #[test]
    fn exception_message_is_first_error_concatenated_form_is_all() {
        let e1 = DspError::arguments(1, "first");
        let e2 = DspError::state(2, "second");
        let ex = Exception::new(vec![e1.clone(), e2.clone()]);
        assert_eq!(ex.first().message, "first");
        let rendered = ex.to_string();
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second"));
    }
}
