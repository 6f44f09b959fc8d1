// ── Core error types ──
//
// What callers of the coordinator see. Radio and GATT failures from
// neoblue-api are wrapped with the device address so a log line or CLI
// message is actionable on its own.

use std::time::Duration;

use neoblue_api::DeviceAddress;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Command not attempted ────────────────────────────────────────
    /// No radio reference could be resolved, or the device is known to be
    /// out of range. Nothing was sent.
    #[error("Device {address} is unavailable")]
    DeviceUnavailable { address: DeviceAddress },

    #[error("Position {value} is out of range (expected 0-100)")]
    InvalidPosition { value: u16 },

    #[error("No coordinator registered for {address}")]
    UnknownDevice { address: DeviceAddress },

    #[error("Coordinator for {address} has been shut down")]
    CoordinatorClosed { address: DeviceAddress },

    // ── Command attempted ────────────────────────────────────────────
    #[error("Connecting to {address} timed out after {timeout:?}")]
    ConnectTimeout {
        address: DeviceAddress,
        timeout: Duration,
    },

    #[error("Command to {address} timed out after {timeout:?}")]
    CommandTimeout {
        address: DeviceAddress,
        timeout: Duration,
    },

    #[error("Transport error talking to {address}: {message}")]
    Transport {
        address: DeviceAddress,
        message: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Attach `address` to a transport-layer failure.
    pub(crate) fn transport(address: &DeviceAddress, err: &neoblue_api::Error) -> Self {
        match err {
            neoblue_api::Error::InvalidPosition { value } => Self::InvalidPosition { value: *value },
            other => Self::Transport {
                address: address.clone(),
                message: other.to_string(),
            },
        }
    }

    /// True when nothing reached the radio.
    pub fn is_not_attempted(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable { .. }
                | Self::InvalidPosition { .. }
                | Self::UnknownDevice { .. }
                | Self::CoordinatorClosed { .. }
                | Self::Config { .. }
        )
    }
}
