// ── Radio stack seam ──
//
// Passive lookups against whatever owns the Bluetooth adapter (BlueZ,
// CoreBluetooth, an ESPHome proxy...). Every lookup answers from what the
// stack already knows; none of them may block on the radio.

use crate::address::DeviceAddress;
use crate::advertisement::RawAdvertisement;

/// A handle the transport can open a link against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioReference {
    pub address: DeviceAddress,
    /// `false` for references only good for passive observation.
    pub connectable: bool,
    pub rssi: Option<i16>,
    pub name: Option<String>,
}

impl RadioReference {
    pub fn new(address: impl Into<DeviceAddress>, connectable: bool) -> Self {
        Self {
            address: address.into(),
            connectable,
            rssi: None,
            name: None,
        }
    }

    #[must_use]
    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }
}

/// Device lookups offered by the host radio stack.
pub trait RadioStack: Send + Sync {
    /// A currently connectable reference for `address`.
    fn connectable_device(&self, address: &DeviceAddress) -> Option<RadioReference>;

    /// A reference for a device that is visible but not advertising as
    /// connectable.
    fn non_connectable_device(&self, address: &DeviceAddress) -> Option<RadioReference>;

    /// The most recent advertisement the stack kept for `address`.
    fn last_advertisement(&self, address: &DeviceAddress) -> Option<RawAdvertisement>;

    /// Whether `address` is observable at all, connectable or not.
    fn is_present(&self, address: &DeviceAddress) -> bool;
}
