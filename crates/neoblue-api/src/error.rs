use thiserror::Error;

use crate::status::STATUS_PAYLOAD_LENGTH;

/// Top-level error type for the `neoblue-api` crate.
///
/// Covers every failure the radio stack or the GATT transport can report.
/// `neoblue-core` attaches the device address and maps these into the
/// coordinator's error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Link establishment failed (peer refused, out of range, stack busy).
    #[error("Connection failed: {reason}")]
    Connect { reason: String },

    /// A GATT read/write on an established link failed.
    #[error("GATT operation failed: {reason}")]
    Gatt { reason: String },

    /// The link dropped before or during the operation.
    #[error("Link is not connected")]
    NotConnected,

    /// The local adapter is missing, powered off, or misbehaving.
    #[error("Bluetooth adapter error: {0}")]
    Adapter(String),

    // ── Commands ────────────────────────────────────────────────────
    /// A move target outside 0..=100.
    #[error("Invalid position {value} (expected 0-100)")]
    InvalidPosition { value: u16 },

    // ── OS ──────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to turn a manufacturer payload into a status record.
///
/// Decoding is all-or-nothing: any of these means no field of the payload
/// was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Status payload too short: {len} bytes (expected {expected})")]
    PayloadTooShort { len: usize, expected: usize },

    /// A byte that must hold a percentage carried a larger value.
    #[error("Malformed status payload: {field} = {value} exceeds 100")]
    OutOfRange { field: &'static str, value: u8 },
}

impl DecodeError {
    pub(crate) fn too_short(len: usize) -> Self {
        Self::PayloadTooShort {
            len,
            expected: STATUS_PAYLOAD_LENGTH,
        }
    }
}
