// ── GATT transport seam ──
//
// Link lifecycle against one device. Implementations wrap the platform's
// GATT client; the coordinator never holds a link outside one scoped
// command.

use std::time::Duration;

use async_trait::async_trait;

use crate::address::DeviceAddress;
use crate::command::Command;
use crate::error::Error;
use crate::radio::RadioReference;

/// An established link to one device.
///
/// Not `Clone`: [`Transport::disconnect`] consumes it, so a released handle
/// cannot be written to again.
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionHandle {
    address: DeviceAddress,
    link_id: u64,
}

impl ConnectionHandle {
    /// Transports mint handles; `link_id` only needs to be unique per
    /// transport instance.
    pub fn new(address: DeviceAddress, link_id: u64) -> Self {
        Self { address, link_id }
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn link_id(&self) -> u64 {
        self.link_id
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open an authenticated link. `timeout` is advisory for the platform
    /// stack; callers enforce it independently.
    async fn connect(
        &self,
        reference: &RadioReference,
        timeout: Duration,
    ) -> Result<ConnectionHandle, Error>;

    /// Tear the link down. Best-effort; callers log failures and move on.
    async fn disconnect(&self, handle: ConnectionHandle) -> Result<(), Error>;

    /// Encode and write one command to the motor characteristic.
    async fn write_command(&self, handle: &ConnectionHandle, command: &Command)
    -> Result<(), Error>;
}
