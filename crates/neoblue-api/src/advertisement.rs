// ── Observed broadcasts ──
//
// What the radio stack hands us per advertisement event. Consumed once by
// the listener; the radio stack may keep the most recent one per address
// for later lookup.

use std::collections::BTreeMap;

use tokio::time::Instant;

use crate::address::DeviceAddress;
use crate::radio::RadioReference;
use crate::status::NEOSMART_MANUFACTURER_ID;

/// Local-name prefixes used by NeoSmart Blue motors.
const NAME_PREFIXES: [&str; 2] = ["NEO-", "NMB-"];

/// A single advertisement frame as delivered by the radio stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAdvertisement {
    pub address: DeviceAddress,
    /// Signal strength in dBm, when the stack reported one.
    pub rssi: Option<i16>,
    /// Manufacturer identifier -> raw bytes. Several vendors may share a frame.
    pub manufacturer_data: BTreeMap<u16, Vec<u8>>,
    pub local_name: Option<String>,
    pub connectable: bool,
    pub observed_at: Instant,
}

impl RawAdvertisement {
    /// A frame observed now with no payload attached.
    pub fn new(address: impl Into<DeviceAddress>) -> Self {
        Self {
            address: address.into(),
            rssi: None,
            manufacturer_data: BTreeMap::new(),
            local_name: None,
            connectable: true,
            observed_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    #[must_use]
    pub fn with_manufacturer_data(mut self, id: u16, bytes: impl Into<Vec<u8>>) -> Self {
        self.manufacturer_data.insert(id, bytes.into());
        self
    }

    #[must_use]
    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn non_connectable(mut self) -> Self {
        self.connectable = false;
        self
    }

    #[must_use]
    pub fn observed_at(mut self, at: Instant) -> Self {
        self.observed_at = at;
        self
    }

    /// Bytes published under `manufacturer_id`, if any.
    pub fn payload_for(&self, manufacturer_id: u16) -> Option<&[u8]> {
        self.manufacturer_data
            .get(&manufacturer_id)
            .map(Vec::as_slice)
    }

    /// Whether this frame looks like it came from a NeoSmart Blue motor.
    pub fn is_neosmart_device(&self) -> bool {
        let named = self
            .local_name
            .as_deref()
            .is_some_and(|name| NAME_PREFIXES.iter().any(|p| name.starts_with(p)));
        named
            || self
                .manufacturer_data
                .contains_key(&NEOSMART_MANUFACTURER_ID)
    }

    /// Rebuild a radio reference from this frame, for resolving a device the
    /// stack no longer lists but heard recently.
    pub fn to_reference(&self) -> RadioReference {
        RadioReference {
            address: self.address.clone(),
            connectable: self.connectable,
            rssi: self.rssi,
            name: self.local_name.clone(),
        }
    }
}
