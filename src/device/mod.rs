//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Acquisition-device lifecycle core (spec §4.6-§4.7, components C7+C8).
//! Grounded in `other_examples`'s `nicompiler_backend`/`soapysdr` device
//! modules for the connect/disconnect/setup shape, re-expressed as a state
//! machine generic over a small `DeviceHardware` trait that the actual
//! (out-of-scope, per spec §1) transport layer implements.

mod features;
mod state;

pub use features::{Feature, FeatureCollection};
pub use state::{ConnectionState, Mode};

use std::time::{Duration, Instant};

use crate::channel::ChannelCollection;
use crate::error::{codes, Class, DspError, DspResult};
use crate::sealable::Sealable;

/// (driver_id, timestamp, samples: jagged 2-D — outer index = channel)
/// (spec §3).
#[derive(Debug, Clone)]
pub struct SamplePacket {
    pub driver_id: String,
    pub timestamp: Instant,
    pub samples: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub enum DeviceEvent {
    StateChanged(ConnectionState),
    Ready,
    ModeChanged(Mode),
    Data(SamplePacket),
    Ohmeter(Vec<f64>),
}

/// The hardware-specific transport seam (spec §1 places device-specific
/// transport code out of scope; this trait is the boundary a concrete
/// driver implements).
pub trait DeviceHardware {
    fn connect_core(&mut self) -> DspResult<()>;
    fn disconnect_core(&mut self) -> DspResult<()>;
    fn setup_core(&mut self, channels: &ChannelCollection) -> DspResult<()>;
    fn change_acquisition_mode(&mut self, mode: Mode) -> DspResult<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Acquisition device state machine + owned channel/feature configuration
/// (spec §3 `Acquisition device state`, §4.6, §4.7).
pub struct AcquisitionDevice<H: DeviceHardware> {
    hardware: H,
    connection: ConnectionState,
    is_configured: bool,
    mode: Mode,
    can_output_data: bool,
    channels: ChannelCollection,
    features: FeatureCollection<H>,
    retry_policy: RetryPolicy,
    on_event: Option<Box<dyn FnMut(&DeviceEvent) + Send>>,
    device_type: &'static str,
    hardware_id: Option<String>,
    driver_id: String,
}

impl<H: DeviceHardware> AcquisitionDevice<H> {
    pub fn new(device_type: &'static str, driver_id: impl Into<String>, hardware: H) -> Self {
        Self {
            hardware,
            connection: ConnectionState::Disconnected,
            is_configured: false,
            mode: Mode::Idle,
            can_output_data: false,
            channels: ChannelCollection::new(),
            features: FeatureCollection::new(device_type),
            retry_policy: RetryPolicy::default(),
            on_event: None,
            device_type,
            hardware_id: None,
            driver_id: driver_id.into(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn on_event(mut self, callback: impl FnMut(&DeviceEvent) + Send + 'static) -> Self {
        self.on_event = Some(Box::new(callback));
        self
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_configured(&self) -> bool {
        self.is_configured
    }

    pub fn can_output_data(&self) -> bool {
        self.can_output_data
    }

    pub fn channels_mut(&mut self) -> &mut ChannelCollection {
        &mut self.channels
    }

    pub fn features_mut(&mut self) -> &mut FeatureCollection<H> {
        &mut self.features
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    fn emit(&mut self, event: DeviceEvent) {
        if let Some(cb) = self.on_event.as_mut() {
            cb(&event);
        }
    }

    fn set_connection(&mut self, next: ConnectionState) {
        self.connection = next;
        self.emit(DeviceEvent::StateChanged(next));
    }

    /// Spec §4.6 `connect()`. On success, dispatches the `Firmware Update`
    /// feature if this device advertises it as available and enabled.
    pub fn connect(&mut self) -> DspResult<()> {
        match self.connection {
            ConnectionState::Connecting | ConnectionState::Connected => return Ok(()),
            ConnectionState::Disconnected | ConnectionState::Error => {}
            ConnectionState::Disconnecting => {
                return Err(DspError::state(
                    codes::CANNOT_CHANGE_STATE,
                    "cannot connect while disconnecting",
                ))
            }
        }

        self.set_connection(ConnectionState::Connecting);

        let mut last_error = None;
        for attempt in 0..self.retry_policy.attempts {
            match self.hardware.connect_core() {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => {
                    if !e.is_retryable() || attempt + 1 == self.retry_policy.attempts {
                        last_error = Some(e);
                        break;
                    }
                    last_error = Some(e);
                    std::thread::sleep(self.retry_policy.delay);
                }
            }
        }

        if let Some(error) = last_error {
            self.set_connection(ConnectionState::Error);
            return Err(error);
        }

        self.set_connection(ConnectionState::Connected);

        let firmware_update = Feature::new(self.device_type, "Firmware Update");
        if self.features.is_available_and_enabled(&self.hardware, &firmware_update)? {
            self.features.perform(&mut self.hardware, &firmware_update, None)?;
        }

        self.emit(DeviceEvent::Ready);
        Ok(())
    }

    /// Spec §4.6 `disconnect()`.
    pub fn disconnect(&mut self) -> DspResult<()> {
        match self.connection {
            ConnectionState::Disconnecting | ConnectionState::Disconnected => return Ok(()),
            ConnectionState::Connected => {}
            _ => {
                return Err(DspError::state(
                    codes::CANNOT_CHANGE_STATE,
                    "disconnect is only legal from Connected",
                ))
            }
        }

        self.set_connection(ConnectionState::Disconnecting);
        let result = self.hardware.disconnect_core();
        self.set_connection(ConnectionState::Disconnected);
        result
    }

    pub fn reconnect(&mut self) -> DspResult<()> {
        self.disconnect()?;
        self.connect()
    }

    /// Spec §4.6 `setup()`: legal only when Connected and not yet
    /// configured; validates the sealed channel collection.
    pub fn setup(&mut self, allow_multifrequency: bool, allow_sampling_on_value_change: bool) -> DspResult<()> {
        if self.connection != ConnectionState::Connected {
            return Err(DspError::state(codes::INVALID_STATE, "setup requires Connected"));
        }
        if self.is_configured {
            return Err(DspError::state(codes::INVALID_STATE, "device is already configured"));
        }

        self.channels.validate(allow_multifrequency, allow_sampling_on_value_change)?;
        if !self.channels.is_sealed() {
            self.channels.seal();
        }
        self.hardware.setup_core(&self.channels)?;
        self.is_configured = true;
        self.emit(DeviceEvent::Ready);
        Ok(())
    }

    /// Spec §4.6 `mode` assignment: legal only when Connected and
    /// configured; suspends output, dispatches the mode-change feature,
    /// then resumes output. `Ohmeter`/`Calibration` require a registered
    /// `Feature` of the same name to be available-and-enabled on this
    /// device's `FeatureCollection`.
    pub fn set_mode(&mut self, new_mode: Mode) -> DspResult<()> {
        if self.connection != ConnectionState::Connected || !self.is_configured {
            return Err(DspError::state(
                codes::INVALID_STATE,
                "mode may only be assigned when Connected and configured",
            ));
        }
        if matches!(new_mode, Mode::Ohmeter | Mode::Calibration) {
            let feature_name = match new_mode {
                Mode::Ohmeter => "Ohmeter",
                Mode::Calibration => "Calibration",
                _ => unreachable!(),
            };
            let feature = Feature::new(self.device_type, feature_name);
            if !self.features.is_available_and_enabled(&self.hardware, &feature)? {
                return Err(DspError::unsupported(
                    codes::ACQUISITION_MODE,
                    format!("{new_mode:?} mode requires the corresponding feature"),
                ));
            }
        }

        self.can_output_data = false;
        let result = self.hardware.change_acquisition_mode(new_mode);
        if result.is_ok() {
            self.mode = new_mode;
            self.can_output_data = !matches!(new_mode, Mode::Idle);
            self.emit(DeviceEvent::ModeChanged(new_mode));
        }
        result
    }

    pub fn device_type(&self) -> &'static str {
        self.device_type
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    pub fn hardware_id(&self) -> Option<&str> {
        self.hardware_id.as_deref()
    }

    pub fn set_hardware_id(&mut self, hardware_id: impl Into<String>) {
        self.hardware_id = Some(hardware_id.into());
    }
}

/// Classifies `error` as the retryable `HardwareException` spec §4.6/§4.9
/// describe: a `Class::Communication` failure surfaced by `connect_core`.
pub fn hardware_exception(code: u16, message: impl Into<String>) -> DspError {
    DspError::new(crate::error::Severity::Error, Class::Communication, code, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyHardware {
        failures_before_success: u32,
        attempts: Arc<AtomicU32>,
        firmware_updates: Arc<AtomicU32>,
    }

    impl DeviceHardware for FlakyHardware {
        fn connect_core(&mut self) -> DspResult<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures_before_success {
                Err(hardware_exception(1, "transient link failure"))
            } else {
                Ok(())
            }
        }

        fn disconnect_core(&mut self) -> DspResult<()> {
            Ok(())
        }

        fn setup_core(&mut self, _channels: &ChannelCollection) -> DspResult<()> {
            Ok(())
        }

        fn change_acquisition_mode(&mut self, _mode: Mode) -> DspResult<()> {
            Ok(())
        }
    }

    fn device(failures: u32) -> AcquisitionDevice<FlakyHardware> {
        AcquisitionDevice::new(
            "toy",
            "driver-1",
            FlakyHardware {
                failures_before_success: failures,
                attempts: Arc::new(AtomicU32::new(0)),
                firmware_updates: Arc::new(AtomicU32::new(0)),
            },
        )
        .with_retry_policy(RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(1),
        })
    }

    #[test]
    fn connect_retries_then_succeeds() {
        let mut d = device(2);
        assert!(d.connect().is_ok());
        assert_eq!(d.connection(), ConnectionState::Connected);
    }

    #[test]
    fn connect_exhausts_retries_and_enters_error() {
        let mut d = device(10);
        assert!(d.connect().is_err());
        assert_eq!(d.connection(), ConnectionState::Error);
    }

    #[test]
    fn connect_is_a_no_op_when_already_connected() {
        let mut d = device(0);
        d.connect().unwrap();
        assert!(d.connect().is_ok());
    }

    #[test]
    fn setup_requires_connected_and_not_already_configured() {
        let mut d = device(0);
        assert!(d.setup(false, false).is_err());
        d.connect().unwrap();
        d.channels_mut()
            .push(crate::channel::PhysicalChannel::new(1, "C1", 1000.0, crate::channel::Range::new(-1.0, 1.0).unwrap()).unwrap())
            .unwrap();
        assert!(d.setup(false, false).is_ok());
        assert!(d.setup(false, false).is_err());
    }

    #[test]
    fn mode_requires_connected_and_configured() {
        let mut d = device(0);
        assert!(d.set_mode(Mode::Data).is_err());
        d.connect().unwrap();
        d.channels_mut()
            .push(crate::channel::PhysicalChannel::new(1, "C1", 1000.0, crate::channel::Range::new(-1.0, 1.0).unwrap()).unwrap())
            .unwrap();
        d.setup(false, false).unwrap();
        assert!(d.set_mode(Mode::Data).is_ok());
        assert!(d.can_output_data());
        assert!(d.set_mode(Mode::Idle).is_ok());
        assert!(!d.can_output_data());
    }

    #[test]
    fn ohmeter_mode_rejected_without_feature() {
        let mut d = device(0);
        d.connect().unwrap();
        d.channels_mut()
            .push(crate::channel::PhysicalChannel::new(1, "C1", 1000.0, crate::channel::Range::new(-1.0, 1.0).unwrap()).unwrap())
            .unwrap();
        d.setup(false, false).unwrap();
        assert!(d.set_mode(Mode::Ohmeter).is_err());
    }

    #[test]
    fn ohmeter_mode_succeeds_when_feature_registered_and_enabled() {
        let mut d = device(0);
        d.features_mut().register(
            "Ohmeter",
            |_h: &FlakyHardware| true,
            Some(Box::new(|_h: &FlakyHardware| true)),
            None,
        );
        d.connect().unwrap();
        d.channels_mut()
            .push(crate::channel::PhysicalChannel::new(1, "C1", 1000.0, crate::channel::Range::new(-1.0, 1.0).unwrap()).unwrap())
            .unwrap();
        d.setup(false, false).unwrap();
        assert!(d.set_mode(Mode::Ohmeter).is_ok());
    }

    /// Scenario 6 (spec §8): a device advertising Firmware Update as
    /// available and enabled has it dispatched exactly once by `connect()`.
    #[test]
    fn connect_dispatches_firmware_update_when_available_and_enabled() {
        let mut d = device(0);
        d.features_mut().register(
            "Firmware Update",
            |_h: &FlakyHardware| true,
            Some(Box::new(|_h: &FlakyHardware| true)),
            Some(Box::new(|h: &mut FlakyHardware, _param| {
                h.firmware_updates.fetch_add(1, Ordering::SeqCst);
                true
            })),
        );
        let counter = d.hardware().firmware_updates.clone();
        d.connect().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn connect_does_not_dispatch_firmware_update_when_unregistered() {
        let mut d = device(0);
        let counter = d.hardware().firmware_updates.clone();
        d.connect().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
