// ── Device registry ──
//
// Owns the coordinators for every configured blind and the link gates they
// share. Devices are added when an accessory is set up and removed on
// teardown; there is no other global state.

use std::sync::Arc;

use dashmap::DashMap;
use neoblue_api::{DeviceAddress, RadioStack, RawAdvertisement, Transport};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::CoordinatorConfig;
use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::listener::ListenOutcome;
use crate::supervisor::LinkGates;

/// Coordinators for every managed blind plus the link gates they share.
///
/// Link exclusivity only spans coordinators built from the same
/// [`LinkGates`]. Run one registry per process (or per radio adapter), or
/// build coordinators by hand with a clone of [`gates`](Self::gates).
pub struct DeviceRegistry {
    radio: Arc<dyn RadioStack>,
    transport: Arc<dyn Transport>,
    gates: LinkGates,
    config: CoordinatorConfig,
    coordinators: DashMap<DeviceAddress, Coordinator>,
}

impl DeviceRegistry {
    pub fn new(
        radio: Arc<dyn RadioStack>,
        transport: Arc<dyn Transport>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            radio,
            transport,
            gates: LinkGates::new(),
            config,
            coordinators: DashMap::new(),
        }
    }

    pub fn gates(&self) -> &LinkGates {
        &self.gates
    }

    /// Coordinator for `address`, creating it on first registration.
    pub fn register(&self, address: impl Into<DeviceAddress>) -> Coordinator {
        let address = address.into();
        if let Some(existing) = self.coordinators.get(&address) {
            return existing.clone();
        }
        self.coordinators
            .entry(address.clone())
            .or_insert_with(|| {
                Coordinator::new(
                    address,
                    Arc::clone(&self.radio),
                    Arc::clone(&self.transport),
                    self.gates.clone(),
                    self.config.clone(),
                )
            })
            .clone()
    }

    pub fn get(&self, address: &DeviceAddress) -> Option<Coordinator> {
        self.coordinators.get(address).map(|c| c.clone())
    }

    /// Remove and shut down the coordinator for `address`.
    pub fn remove(&self, address: &DeviceAddress) -> Option<Coordinator> {
        let (_, coordinator) = self.coordinators.remove(address)?;
        coordinator.shutdown();
        if !self.gates.forget(address) {
            debug!(%address, "link gate still in use, kept");
        }
        info!(%address, "device removed");
        Some(coordinator)
    }

    pub fn addresses(&self) -> Vec<DeviceAddress> {
        let mut addrs: Vec<_> = self.coordinators.iter().map(|e| e.key().clone()).collect();
        addrs.sort();
        addrs
    }

    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinators.is_empty()
    }

    // ── Routing ──────────────────────────────────────────────────

    /// Hand `adv` to its coordinator. `None` for unregistered devices.
    pub fn handle_advertisement(&self, adv: &RawAdvertisement) -> Option<ListenOutcome> {
        let Some(coordinator) = self.get(&adv.address) else {
            trace!(address = %adv.address, "advertisement for unregistered device");
            return None;
        };
        Some(coordinator.handle_advertisement(adv))
    }

    fn require(&self, address: &DeviceAddress) -> Result<Coordinator, CoreError> {
        self.get(address).ok_or_else(|| CoreError::UnknownDevice {
            address: address.clone(),
        })
    }

    /// Move the blind at `address` to a device-native position.
    pub async fn move_to(&self, address: &DeviceAddress, position: u8) -> Result<(), CoreError> {
        self.require(address)?.move_to(position).await
    }

    pub async fn stop(&self, address: &DeviceAddress) -> Result<(), CoreError> {
        self.require(address)?.stop().await
    }

    /// Drain `rx` in arrival order until it closes or `cancel` fires.
    ///
    /// Each advertisement is fully merged before the next is read, so merges
    /// for one address follow radio order.
    pub async fn run_ingestion(
        &self,
        mut rx: mpsc::Receiver<RawAdvertisement>,
        cancel: CancellationToken,
    ) {
        debug!("advertisement ingestion started");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                adv = rx.recv() => {
                    let Some(adv) = adv else { break };
                    self.handle_advertisement(&adv);
                }
            }
        }
        debug!("advertisement ingestion stopped");
    }

    /// Shut down and drop every coordinator.
    pub fn shutdown_all(&self) {
        for address in self.addresses() {
            self.remove(&address);
        }
    }
}
