// ── Per-device coordinator ──
//
// Facade over one blind: passive status from advertisements, and
// connection-scoped commands. Status is never polled; a link is only
// opened to send a command.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use neoblue_api::{
    Command, DeviceAddress, Position, RadioStack, RawAdvertisement, StatusPayload, Transport,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::CoordinatorConfig;
use crate::dispatch::CommandDispatcher;
use crate::error::CoreError;
use crate::listener::{AdvertisementListener, IgnoreReason, ListenOutcome};
use crate::model::{CoverState, StatusRecord};
use crate::store::{DevicePhase, StateCache};
use crate::stream::StatusStream;
use crate::supervisor::{ConnectionSupervisor, LinkGates};

/// Coordinates status and commands for a single blind.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    address: DeviceAddress,
    config: CoordinatorConfig,
    radio: Arc<dyn RadioStack>,
    cache: StateCache,
    listener: AdvertisementListener,
    dispatcher: CommandDispatcher,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Create a coordinator for `address`.
    ///
    /// The record is seeded with placeholder defaults (signal strength from
    /// the radio if it can see the device) and then primed from the radio's
    /// last stored advertisement when that is recent enough.
    pub fn new(
        address: DeviceAddress,
        radio: Arc<dyn RadioStack>,
        transport: Arc<dyn Transport>,
        gates: LinkGates,
        config: CoordinatorConfig,
    ) -> Self {
        let seed_rssi = radio
            .connectable_device(&address)
            .or_else(|| radio.non_connectable_device(&address))
            .and_then(|r| r.rssi)
            .unwrap_or(config.fallback_rssi);

        let supervisor = Arc::new(ConnectionSupervisor::new(
            Arc::clone(&radio),
            Arc::clone(&transport),
            gates,
            &config,
        ));
        let dispatcher =
            CommandDispatcher::new(Arc::clone(&radio), transport, supervisor, &config);

        let coordinator = Self {
            inner: Arc::new(CoordinatorInner {
                cache: StateCache::new(StatusRecord::seed(seed_rssi)),
                listener: AdvertisementListener::new(&config),
                address,
                config,
                radio,
                dispatcher,
                cancel: CancellationToken::new(),
            }),
        };

        info!(address = %coordinator.address(), seed_rssi, "coordinator created");
        coordinator.prime();
        coordinator
    }

    fn prime(&self) {
        let address = self.address();
        match self.inner.radio.last_advertisement(address) {
            Some(adv) if adv.observed_at.elapsed() <= self.inner.config.advertisement_recency => {
                let outcome = self.inner.listener.handle(&self.inner.cache, &adv);
                info!(%address, updated = outcome.is_update(), "primed from recent advertisement");
            }
            Some(_) => debug!(%address, "stored advertisement too old to prime from"),
            None => debug!(%address, "no stored advertisement on startup"),
        }
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.inner.address
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Advertisements ───────────────────────────────────────────

    /// Feed one advertisement for this device through the listener.
    pub fn handle_advertisement(&self, adv: &RawAdvertisement) -> ListenOutcome {
        if self.is_closed() {
            return ListenOutcome::Ignored(IgnoreReason::Closed);
        }
        if adv.address != self.inner.address {
            debug!(address = %self.address(), other = %adv.address, "advertisement for another device");
            return ListenOutcome::Ignored(IgnoreReason::NotOurs);
        }
        self.inner.listener.handle(&self.inner.cache, adv)
    }

    /// Decode the radio's last stored advertisement without changing state.
    pub fn latest_advertisement_status(&self) -> Option<StatusPayload> {
        let adv = self.inner.radio.last_advertisement(self.address())?;
        self.inner.listener.decode(&adv)?.ok()
    }

    /// Re-apply the radio's last stored advertisement.
    pub fn refresh_from_last_advertisement(&self) -> ListenOutcome {
        match self.inner.radio.last_advertisement(self.address()) {
            Some(adv) => self.handle_advertisement(&adv),
            None => {
                debug!(address = %self.address(), "no stored advertisement to refresh from");
                ListenOutcome::Ignored(IgnoreReason::NoAdvertisement)
            }
        }
    }

    // ── Status ───────────────────────────────────────────────────

    pub fn status(&self) -> Arc<StatusRecord> {
        self.inner.cache.current()
    }

    pub fn cover_state(&self) -> CoverState {
        CoverState::from(&*self.status())
    }

    pub fn subscribe(&self) -> StatusStream {
        StatusStream::new(self.inner.cache.subscribe())
    }

    pub fn phase(&self) -> DevicePhase {
        self.inner.cache.phase()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner.cache.last_update()
    }

    /// Observable at all, connectable or not.
    pub fn is_advertising(&self) -> bool {
        self.inner.radio.is_present(self.address())
    }

    pub fn is_connectable(&self) -> bool {
        self.inner.radio.connectable_device(self.address()).is_some()
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Send `command` over a dedicated link. Returns once the link is closed.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        if self.is_closed() {
            return Err(CoreError::CoordinatorClosed {
                address: self.address().clone(),
            });
        }
        self.inner.dispatcher.send(self.address(), command).await
    }

    /// Move to a device-native position (0 = open, 100 = closed).
    pub async fn move_to(&self, position: u8) -> Result<(), CoreError> {
        let target = Position::try_from(position).map_err(|_| CoreError::InvalidPosition {
            value: u16::from(position),
        })?;
        self.execute(Command::move_to(target)).await
    }

    pub async fn stop(&self) -> Result<(), CoreError> {
        self.execute(Command::Stop).await
    }

    pub async fn open(&self) -> Result<(), CoreError> {
        self.execute(Command::move_to(Position::OPEN)).await
    }

    pub async fn close(&self) -> Result<(), CoreError> {
        self.execute(Command::move_to(Position::CLOSED)).await
    }

    /// Move to a user-facing position (0 = closed, 100 = open).
    pub async fn set_cover_position(&self, position: u8) -> Result<(), CoreError> {
        let user = Position::try_from(position).map_err(|_| CoreError::InvalidPosition {
            value: u16::from(position),
        })?;
        self.execute(Command::move_to(user.inverted())).await
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Stop accepting advertisements and commands. Idempotent.
    pub fn shutdown(&self) {
        if !self.inner.cancel.is_cancelled() {
            self.inner.cancel.cancel();
            info!(address = %self.address(), "coordinator shut down");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Resolves once [`shutdown`](Self::shutdown) has been called.
    pub async fn closed(&self) {
        self.inner.cancel.cancelled().await;
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("address", self.address())
            .field("phase", &self.phase())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
