//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Connection and acquisition-mode states (spec §3, §4.6).

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// `Disconnected -> Connecting -> {Connected | Error}`;
/// `Connected -> Disconnecting -> Disconnected`; `Error -> Connecting`
/// is permitted (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Mode {
    Idle,
    Data,
    Ohmeter,
    Calibration,
}
