// ── In-memory radio and transport ──
//
// A scripted stand-in for the host Bluetooth stack. `SimRadio` answers the
// `RadioStack` lookups from a table the test controls; `SimTransport`
// records every connect/write/disconnect in order so callers can assert
// exclusivity and teardown.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::address::DeviceAddress;
use crate::advertisement::RawAdvertisement;
use crate::command::Command;
use crate::error::Error;
use crate::radio::{RadioReference, RadioStack};
use crate::transport::{ConnectionHandle, Transport};

// ── Radio ───────────────────────────────────────────────────────────

/// How a simulated device currently appears to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Connectable,
    NonConnectable,
    /// Out of range. The last advertisement (if any) is still remembered.
    Gone,
}

#[derive(Debug, Clone)]
struct SimDevice {
    visibility: Visibility,
    rssi: Option<i16>,
    name: Option<String>,
    last_advertisement: Option<RawAdvertisement>,
}

#[derive(Debug, Default)]
pub struct SimRadio {
    devices: Mutex<HashMap<DeviceAddress, SimDevice>>,
}

impl SimRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how `address` appears, creating the device if needed.
    pub fn set_visibility(&self, address: &DeviceAddress, visibility: Visibility) {
        let mut devices = self.devices.lock();
        devices
            .entry(address.clone())
            .and_modify(|d| d.visibility = visibility)
            .or_insert_with(|| SimDevice {
                visibility,
                rssi: None,
                name: None,
                last_advertisement: None,
            });
    }

    /// Record a broadcast: the device becomes visible with the frame's
    /// connectability and signal, and the frame becomes its last advertisement.
    pub fn advertise(&self, adv: &RawAdvertisement) {
        let visibility = if adv.connectable {
            Visibility::Connectable
        } else {
            Visibility::NonConnectable
        };
        let mut devices = self.devices.lock();
        devices.insert(
            adv.address.clone(),
            SimDevice {
                visibility,
                rssi: adv.rssi,
                name: adv.local_name.clone(),
                last_advertisement: Some(adv.clone()),
            },
        );
    }

    /// Remember `adv` as the last advertisement without changing visibility.
    pub fn store_advertisement(&self, adv: RawAdvertisement) {
        let mut devices = self.devices.lock();
        let device = devices
            .entry(adv.address.clone())
            .or_insert_with(|| SimDevice {
                visibility: Visibility::Gone,
                rssi: None,
                name: None,
                last_advertisement: None,
            });
        device.last_advertisement = Some(adv);
    }

    /// Drop the device entirely, including its advertisement history.
    pub fn forget(&self, address: &DeviceAddress) {
        self.devices.lock().remove(address);
    }

    fn reference(&self, address: &DeviceAddress, wanted: Visibility) -> Option<RadioReference> {
        let devices = self.devices.lock();
        let device = devices.get(address)?;
        (device.visibility == wanted).then(|| RadioReference {
            address: address.clone(),
            connectable: wanted == Visibility::Connectable,
            rssi: device.rssi,
            name: device.name.clone(),
        })
    }
}

impl RadioStack for SimRadio {
    fn connectable_device(&self, address: &DeviceAddress) -> Option<RadioReference> {
        self.reference(address, Visibility::Connectable)
    }

    fn non_connectable_device(&self, address: &DeviceAddress) -> Option<RadioReference> {
        self.reference(address, Visibility::NonConnectable)
    }

    fn last_advertisement(&self, address: &DeviceAddress) -> Option<RawAdvertisement> {
        self.devices
            .lock()
            .get(address)
            .and_then(|d| d.last_advertisement.clone())
    }

    fn is_present(&self, address: &DeviceAddress) -> bool {
        self.devices
            .lock()
            .get(address)
            .is_some_and(|d| d.visibility != Visibility::Gone)
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// One entry in the transport log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connect {
        address: DeviceAddress,
        link_id: u64,
        connectable: bool,
    },
    Write {
        address: DeviceAddress,
        link_id: u64,
        command: Command,
    },
    Disconnect {
        address: DeviceAddress,
        link_id: u64,
    },
}

impl TransportEvent {
    pub fn address(&self) -> &DeviceAddress {
        match self {
            Self::Connect { address, .. }
            | Self::Write { address, .. }
            | Self::Disconnect { address, .. } => address,
        }
    }
}

#[derive(Debug, Default)]
struct TransportState {
    events: Vec<TransportEvent>,
    connect_attempts: usize,
    next_link_id: u64,
    open_links: HashSet<u64>,
    max_concurrent: HashMap<DeviceAddress, usize>,
    connect_delay: Duration,
    write_delay: Duration,
    connect_failure: Option<String>,
    write_failure: Option<String>,
    disconnect_failure: Option<String>,
}

impl TransportState {
    fn open_for(&self, address: &DeviceAddress) -> usize {
        self.events
            .iter()
            .filter_map(|e| match e {
                TransportEvent::Connect {
                    address: a,
                    link_id,
                    ..
                } if a == address && self.open_links.contains(link_id) => Some(()),
                _ => None,
            })
            .count()
    }
}

#[derive(Debug, Default)]
pub struct SimTransport {
    state: Mutex<TransportState>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long each connect takes before it completes.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state.lock().connect_delay = delay;
    }

    /// How long each write takes before it completes.
    pub fn set_write_delay(&self, delay: Duration) {
        self.state.lock().write_delay = delay;
    }

    /// Make every subsequent connect fail with `reason` (`None` to clear).
    pub fn set_connect_failure(&self, reason: Option<&str>) {
        self.state.lock().connect_failure = reason.map(str::to_owned);
    }

    pub fn set_write_failure(&self, reason: Option<&str>) {
        self.state.lock().write_failure = reason.map(str::to_owned);
    }

    pub fn set_disconnect_failure(&self, reason: Option<&str>) {
        self.state.lock().disconnect_failure = reason.map(str::to_owned);
    }

    /// Snapshot of the transport log, in call order.
    pub fn events(&self) -> Vec<TransportEvent> {
        self.state.lock().events.clone()
    }

    /// Every call to `connect`, including ones that failed or were abandoned.
    pub fn connect_attempts(&self) -> usize {
        self.state.lock().connect_attempts
    }

    pub fn connect_count(&self) -> usize {
        self.count(|e| matches!(e, TransportEvent::Connect { .. }))
    }

    pub fn disconnect_count(&self) -> usize {
        self.count(|e| matches!(e, TransportEvent::Disconnect { .. }))
    }

    /// Commands that reached the device, in order.
    pub fn written_commands(&self) -> Vec<Command> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                TransportEvent::Write { command, .. } => Some(*command),
                _ => None,
            })
            .collect()
    }

    /// Links currently open across all addresses.
    pub fn open_links(&self) -> usize {
        self.state.lock().open_links.len()
    }

    /// Highest number of simultaneously open links seen for `address`.
    pub fn max_concurrent_links(&self, address: &DeviceAddress) -> usize {
        self.state
            .lock()
            .max_concurrent
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    fn count(&self, pred: impl Fn(&TransportEvent) -> bool) -> usize {
        self.state.lock().events.iter().filter(|e| pred(e)).count()
    }
}

#[async_trait]
impl Transport for SimTransport {
    async fn connect(
        &self,
        reference: &RadioReference,
        _timeout: Duration,
    ) -> Result<ConnectionHandle, Error> {
        let delay = {
            let mut state = self.state.lock();
            state.connect_attempts += 1;
            state.connect_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if let Some(reason) = state.connect_failure.clone() {
            return Err(Error::Connect { reason });
        }

        state.next_link_id += 1;
        let link_id = state.next_link_id;
        state.open_links.insert(link_id);
        state.events.push(TransportEvent::Connect {
            address: reference.address.clone(),
            link_id,
            connectable: reference.connectable,
        });

        let open = state.open_for(&reference.address);
        let max = state
            .max_concurrent
            .entry(reference.address.clone())
            .or_insert(0);
        *max = (*max).max(open);

        debug!(address = %reference.address, link_id, "sim: connected");
        Ok(ConnectionHandle::new(reference.address.clone(), link_id))
    }

    async fn disconnect(&self, handle: ConnectionHandle) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.open_links.remove(&handle.link_id());
        state.events.push(TransportEvent::Disconnect {
            address: handle.address().clone(),
            link_id: handle.link_id(),
        });
        debug!(address = %handle.address(), link_id = handle.link_id(), "sim: disconnected");

        match state.disconnect_failure.clone() {
            Some(reason) => Err(Error::Gatt { reason }),
            None => Ok(()),
        }
    }

    async fn write_command(
        &self,
        handle: &ConnectionHandle,
        command: &Command,
    ) -> Result<(), Error> {
        let delay = {
            let state = self.state.lock();
            if !state.open_links.contains(&handle.link_id()) {
                return Err(Error::NotConnected);
            }
            state.write_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if let Some(reason) = state.write_failure.clone() {
            return Err(Error::Gatt { reason });
        }
        state.events.push(TransportEvent::Write {
            address: handle.address().clone(),
            link_id: handle.link_id(),
            command: *command,
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::Position;

    fn addr() -> DeviceAddress {
        DeviceAddress::new("C4:BE:84:00:11:22")
    }

    #[test]
    fn radio_lookups_follow_visibility() {
        let radio = SimRadio::new();
        let a = addr();
        assert!(!radio.is_present(&a));

        radio.set_visibility(&a, Visibility::NonConnectable);
        assert!(radio.is_present(&a));
        assert!(radio.connectable_device(&a).is_none());
        assert!(!radio.non_connectable_device(&a).unwrap().connectable);

        radio.set_visibility(&a, Visibility::Connectable);
        assert!(radio.connectable_device(&a).unwrap().connectable);
        assert!(radio.non_connectable_device(&a).is_none());

        radio.set_visibility(&a, Visibility::Gone);
        assert!(!radio.is_present(&a));
    }

    #[test]
    fn advertisement_survives_going_out_of_range() {
        let radio = SimRadio::new();
        let a = addr();
        let adv = RawAdvertisement::new(a.clone()).with_rssi(-70);
        radio.advertise(&adv);
        radio.set_visibility(&a, Visibility::Gone);

        assert_eq!(radio.last_advertisement(&a).unwrap().rssi, Some(-70));
        radio.forget(&a);
        assert!(radio.last_advertisement(&a).is_none());
    }

    #[tokio::test]
    async fn transport_logs_lifecycle() {
        let transport = SimTransport::new();
        let reference = RadioReference::new(addr(), true);

        let handle = transport
            .connect(&reference, Duration::from_secs(1))
            .await
            .unwrap();
        transport
            .write_command(&handle, &Command::move_to(Position::CLOSED))
            .await
            .unwrap();
        let link_id = handle.link_id();
        transport.disconnect(handle).await.unwrap();

        assert_eq!(
            transport.events(),
            vec![
                TransportEvent::Connect {
                    address: addr(),
                    link_id,
                    connectable: true
                },
                TransportEvent::Write {
                    address: addr(),
                    link_id,
                    command: Command::move_to(Position::CLOSED)
                },
                TransportEvent::Disconnect {
                    address: addr(),
                    link_id
                },
            ]
        );
        assert_eq!(transport.open_links(), 0);
        assert_eq!(transport.max_concurrent_links(&addr()), 1);
    }

    #[tokio::test]
    async fn write_after_disconnect_is_rejected() {
        let transport = SimTransport::new();
        let reference = RadioReference::new(addr(), true);
        let handle = transport
            .connect(&reference, Duration::from_secs(1))
            .await
            .unwrap();
        let stale = ConnectionHandle::new(addr(), handle.link_id());
        transport.disconnect(handle).await.unwrap();

        let err = transport
            .write_command(&stale, &Command::Stop)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn injected_failures_surface() {
        let transport = SimTransport::new();
        let reference = RadioReference::new(addr(), true);

        transport.set_connect_failure(Some("out of range"));
        let err = transport
            .connect(&reference, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connect { .. }));
        assert_eq!(transport.connect_attempts(), 1);
        assert_eq!(transport.connect_count(), 0);

        transport.set_connect_failure(None);
        transport.set_disconnect_failure(Some("adapter reset"));
        let handle = transport
            .connect(&reference, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(transport.disconnect(handle).await.is_err());
        assert_eq!(transport.disconnect_count(), 1);
        assert_eq!(transport.open_links(), 0);
    }
}
