// neoblue-api: Wire protocol and radio/transport seams for NeoSmart Blue motorized blinds.

pub mod address;
pub mod advertisement;
pub mod command;
pub mod error;
pub mod radio;
pub mod status;
pub mod transport;

#[cfg(feature = "sim")]
pub mod sim;

// ── Primary re-exports ──────────────────────────────────────────────
pub use address::DeviceAddress;
pub use advertisement::RawAdvertisement;
pub use command::{Command, Position};
pub use error::{DecodeError, Error};
pub use radio::{RadioReference, RadioStack};
pub use status::{
    NEOSMART_MANUFACTURER_ID, PROTOCOL_VERSION, STATUS_PAYLOAD_LENGTH, StatusFlags, StatusPayload,
};
pub use transport::{ConnectionHandle, Transport};
