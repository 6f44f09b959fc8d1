//! CLI error types with miette diagnostics.
//!
//! Maps core, config, and payload failures into user-facing errors with
//! actionable help text and stable exit codes.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use neoblue_api::DecodeError;
use neoblue_config::ConfigError;
use neoblue_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const UNAVAILABLE: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Payload ──────────────────────────────────────────────────────
    #[error("'{input}' is not a hex payload: {reason}")]
    #[diagnostic(
        code(neoblue::invalid_hex),
        help("Pass the manufacturer data bytes as hex, e.g. 55320A4B21 or 55:32:0A:4B:21")
    )]
    InvalidHex { input: String, reason: String },

    #[error("{0}")]
    #[diagnostic(
        code(neoblue::malformed_payload),
        help(
            "A status payload is five bytes: battery, current position,\n\
             target position, limit range, flags. Percentages stop at 100."
        )
    )]
    MalformedPayload(#[from] DecodeError),

    // ── Devices ──────────────────────────────────────────────────────
    #[error("No device named '{name}' in configuration")]
    #[diagnostic(
        code(neoblue::device_not_found),
        help("Run: neoblue devices list\nAdd one with: neoblue config add-device <NAME> <ADDRESS>")
    )]
    DeviceNotFound { name: String },

    #[error("Device {address} is not visible to the radio")]
    #[diagnostic(
        code(neoblue::device_unavailable),
        help("Move the adapter closer to the blind or check that it is powered.")
    )]
    DeviceUnavailable { address: String },

    #[error("{stage} to {address} timed out after {timeout:?}")]
    #[diagnostic(
        code(neoblue::timeout),
        help("Raise connect_timeout or command_timeout in the config file.")
    )]
    Timeout {
        stage: &'static str,
        address: String,
        timeout: Duration,
    },

    #[error("Talking to {address} failed: {message}")]
    #[diagnostic(code(neoblue::transport))]
    Transport { address: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(neoblue::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Could not load configuration: {message}")]
    #[diagnostic(
        code(neoblue::config),
        help("Check the file printed by: neoblue config path")
    )]
    Config { message: String },

    // ── Output ───────────────────────────────────────────────────────
    #[error("Could not render {format} output: {message}")]
    #[diagnostic(code(neoblue::render))]
    Render {
        format: &'static str,
        message: String,
    },

    #[error(transparent)]
    #[diagnostic(code(neoblue::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidHex { .. } | Self::MalformedPayload(_) | Self::Validation { .. } => {
                exit_code::USAGE
            }
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::DeviceUnavailable { .. } | Self::Transport { .. } => exit_code::UNAVAILABLE,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Config { .. } | Self::Render { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceUnavailable { address } => Self::DeviceUnavailable {
                address: address.to_string(),
            },
            CoreError::InvalidPosition { value } => Self::Validation {
                field: "position".into(),
                reason: format!("{value} is outside 0-100"),
            },
            CoreError::UnknownDevice { address } => Self::DeviceNotFound {
                name: address.to_string(),
            },
            CoreError::ConnectTimeout { address, timeout } => Self::Timeout {
                stage: "Connecting",
                address: address.to_string(),
                timeout,
            },
            CoreError::CommandTimeout { address, timeout } => Self::Timeout {
                stage: "Command",
                address: address.to_string(),
                timeout,
            },
            CoreError::Transport { address, message } => Self::Transport {
                address: address.to_string(),
                message,
            },
            CoreError::CoordinatorClosed { address } => Self::Transport {
                address: address.to_string(),
                message: "coordinator has been shut down".into(),
            },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownDevice { name } => Self::DeviceNotFound { name },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use neoblue_api::DeviceAddress;

    use super::*;

    #[test]
    fn timeouts_keep_their_stage() {
        let err = CliError::from(CoreError::ConnectTimeout {
            address: DeviceAddress::new("C4:BE:84:00:11:22"),
            timeout: Duration::from_secs(15),
        });
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            err.to_string(),
            "Connecting to C4:BE:84:00:11:22 timed out after 15s"
        );
    }

    #[test]
    fn unavailable_device_exit_code() {
        let err = CliError::from(CoreError::DeviceUnavailable {
            address: DeviceAddress::new("C4:BE:84:00:11:22"),
        });
        assert_eq!(err.exit_code(), exit_code::UNAVAILABLE);
    }

    #[test]
    fn unknown_config_device_is_not_found() {
        let err = CliError::from(ConfigError::UnknownDevice {
            name: "kitchen".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }
}
