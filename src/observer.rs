//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Telemetry seam (spec §1: "the telemetry/counter storage [is] treated as
//! an `Observer` interface emitting counters" and is explicitly out of
//! scope as an external collaborator). Grounded in the shape of the
//! teacher's `DipstickWrapper` (metrics.rs) — named counters/markers and
//! timers — but deliberately stops at the trait seam rather than wiring in
//! a concrete metrics backend, since the spec places the backend itself
//! outside this crate's scope.

/// Sink for counters and timing observations emitted by the filter engine
/// and the acquisition-device core. Call sites should treat failures to
/// observe as non-fatal: an `Observer` must never make a caller's
/// operation fail.
pub trait Observer {
    fn count(&self, name: &str, value: u64);
    fn observe_duration(&self, name: &str, millis: f64);
}

/// The default, always-available `Observer`: discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn count(&self, _name: &str, _value: u64) {}
    fn observe_duration(&self, _name: &str, _millis: f64) {}
}

/// Forwards every observation to the `log` facade at debug level, useful
/// in tests and small standalone tools that have no real metrics backend
/// wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl Observer for LoggingObserver {
    fn count(&self, name: &str, value: u64) {
        log::debug!("counter {name} += {value}");
    }

    fn observe_duration(&self, name: &str, millis: f64) {
        log::debug!("timer {name} = {millis}ms");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_observer_accepts_any_observation_without_panicking() {
        let observer = NullObserver;
        observer.count("samples_processed", 42);
        observer.observe_duration("design_latency", 1.5);
    }
}
