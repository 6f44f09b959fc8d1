// ── Connection supervision ──
//
// Resolves a radio reference for a device and runs one piece of work over
// a freshly opened link, holding the per-address gate for the whole scope.
// The link is always torn down before the gate is released, even when the
// caller stops waiting: once the gate is taken the scope runs on its own
// task.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use neoblue_api::{ConnectionHandle, DeviceAddress, RadioReference, RadioStack, Transport};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::config::CoordinatorConfig;
use crate::error::CoreError;

// ── LinkGates ───────────────────────────────────────────────────────

/// Process-wide, per-address mutual exclusion for link ownership.
///
/// Cheap to clone; all clones share the same gates. Waiters are served in
/// FIFO order (tokio's `Mutex` is fair) and the wait itself is unbounded.
#[derive(Clone, Default)]
pub struct LinkGates {
    gates: Arc<DashMap<DeviceAddress, Arc<Mutex<()>>>>,
}

impl LinkGates {
    pub fn new() -> Self {
        Self::default()
    }

    fn gate(&self, address: &DeviceAddress) -> Arc<Mutex<()>> {
        Arc::clone(self.gates.entry(address.clone()).or_default().value())
    }

    /// Wait for exclusive link ownership of `address`.
    pub async fn acquire(&self, address: &DeviceAddress) -> OwnedMutexGuard<()> {
        self.gate(address).lock_owned().await
    }

    /// Whether some scope currently owns the link for `address`.
    pub fn is_held(&self, address: &DeviceAddress) -> bool {
        self.gates
            .get(address)
            .is_some_and(|gate| gate.try_lock().is_err())
    }

    /// Drop the gate for `address` if nobody holds or waits on it.
    ///
    /// Returns whether an entry was removed. A gate still in use stays, so
    /// an in-flight scope and any later one keep sharing it.
    pub fn forget(&self, address: &DeviceAddress) -> bool {
        self.gates
            .remove_if(address, |_, gate| Arc::strong_count(gate) == 1)
            .is_some()
    }

    /// Number of addresses with a gate.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

// ── ConnectionSupervisor ────────────────────────────────────────────

/// Work run against an open link. Borrowing the handle keeps it from
/// escaping the scope.
pub type LinkWork<'a, T> = BoxFuture<'a, Result<T, CoreError>>;

pub struct ConnectionSupervisor {
    radio: Arc<dyn RadioStack>,
    transport: Arc<dyn Transport>,
    gates: LinkGates,
    connect_timeout: Duration,
    recency: Duration,
}

impl ConnectionSupervisor {
    pub fn new(
        radio: Arc<dyn RadioStack>,
        transport: Arc<dyn Transport>,
        gates: LinkGates,
        config: &CoordinatorConfig,
    ) -> Self {
        Self {
            radio,
            transport,
            gates,
            connect_timeout: config.connect_timeout,
            recency: config.advertisement_recency,
        }
    }

    pub fn gates(&self) -> &LinkGates {
        &self.gates
    }

    /// Find something the transport can connect to, in priority order:
    /// connectable reference, non-connectable reference, then a reference
    /// rebuilt from an advertisement heard within the recency window.
    pub fn resolve(&self, address: &DeviceAddress) -> Result<RadioReference, CoreError> {
        if let Some(reference) = self.radio.connectable_device(address) {
            return Ok(reference);
        }

        if let Some(reference) = self.radio.non_connectable_device(address) {
            debug!(%address, "no connectable reference, trying non-connectable one");
            return Ok(reference);
        }

        if let Some(adv) = self.radio.last_advertisement(address) {
            let age = adv.observed_at.elapsed();
            if age <= self.recency {
                debug!(%address, age_secs = age.as_secs(), "resolved from last advertisement");
                return Ok(adv.to_reference());
            }
            debug!(%address, age_secs = age.as_secs(), "last advertisement too old");
        }

        Err(CoreError::DeviceUnavailable {
            address: address.clone(),
        })
    }

    /// Open a link to `address`, run `work` over it, and close it.
    ///
    /// Resolution happens before the gate is taken, so an unresolvable
    /// device never queues. Connect is bounded by the configured timeout.
    /// Disconnect runs on every path once connected; its failures are
    /// logged and dropped.
    ///
    /// Dropping the returned future while it waits for the gate abandons
    /// the command. Dropping it later does not: connect, `work` and
    /// disconnect finish on a spawned task that keeps the gate until the
    /// link is down.
    pub async fn with_connection<T, F>(
        &self,
        address: &DeviceAddress,
        work: F,
    ) -> Result<T, CoreError>
    where
        T: Send + 'static,
        F: for<'a> FnOnce(&'a ConnectionHandle) -> LinkWork<'a, T> + Send + 'static,
    {
        let reference = self.resolve(address)?;

        let gate = self.gates.acquire(address).await;
        debug!(%address, connectable = reference.connectable, "link gate acquired");

        let scope = tokio::spawn(run_scope(
            Arc::clone(&self.transport),
            address.clone(),
            reference,
            self.connect_timeout,
            gate,
            work,
        ));

        match scope.await {
            Ok(result) => result,
            Err(e) => Err(CoreError::Transport {
                address: address.clone(),
                message: format!("link task ended abnormally: {e}"),
            }),
        }
    }
}

/// One link lifetime. Owns the gate so it is released only after the
/// disconnect has completed.
async fn run_scope<T, F>(
    transport: Arc<dyn Transport>,
    address: DeviceAddress,
    reference: RadioReference,
    connect_timeout: Duration,
    gate: OwnedMutexGuard<()>,
    work: F,
) -> Result<T, CoreError>
where
    F: for<'a> FnOnce(&'a ConnectionHandle) -> LinkWork<'a, T>,
{
    let handle = match tokio::time::timeout(
        connect_timeout,
        transport.connect(&reference, connect_timeout),
    )
    .await
    {
        Ok(Ok(handle)) => handle,
        Ok(Err(e)) => return Err(CoreError::transport(&address, &e)),
        Err(_) => {
            return Err(CoreError::ConnectTimeout {
                address,
                timeout: connect_timeout,
            });
        }
    };
    debug!(%address, link_id = handle.link_id(), "connected");

    let result = work(&handle).await;

    let link_id = handle.link_id();
    match transport.disconnect(handle).await {
        Ok(()) => debug!(%address, link_id, "disconnected"),
        Err(e) => warn!(%address, link_id, error = %e, "error during disconnect"),
    }

    drop(gate);
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use neoblue_api::RawAdvertisement;
    use neoblue_api::sim::{SimRadio, SimTransport, TransportEvent, Visibility};

    use super::*;

    fn addr() -> DeviceAddress {
        DeviceAddress::new("C4:BE:84:00:11:22")
    }

    fn setup() -> (Arc<SimRadio>, Arc<SimTransport>, ConnectionSupervisor) {
        let radio = Arc::new(SimRadio::new());
        let transport = Arc::new(SimTransport::new());
        let supervisor = ConnectionSupervisor::new(
            radio.clone(),
            transport.clone(),
            LinkGates::new(),
            &CoordinatorConfig::default(),
        );
        (radio, transport, supervisor)
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_prefers_connectable() {
        let (radio, _, supervisor) = setup();
        radio.advertise(&RawAdvertisement::new(addr()).with_rssi(-50));
        assert!(supervisor.resolve(&addr()).unwrap().connectable);

        radio.set_visibility(&addr(), Visibility::NonConnectable);
        assert!(!supervisor.resolve(&addr()).unwrap().connectable);
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_falls_back_to_recent_advertisement() {
        let (radio, _, supervisor) = setup();
        radio.advertise(&RawAdvertisement::new(addr()).with_rssi(-77));
        radio.set_visibility(&addr(), Visibility::Gone);

        let reference = supervisor.resolve(&addr()).unwrap();
        assert_eq!(reference.rssi, Some(-77));

        tokio::time::advance(Duration::from_secs(196)).await;
        assert!(matches!(
            supervisor.resolve(&addr()),
            Err(CoreError::DeviceUnavailable { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unresolvable_device_never_touches_transport() {
        let (_, transport, supervisor) = setup();
        let err = supervisor
            .with_connection(&addr(), |_| Box::pin(async { Ok(()) }))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DeviceUnavailable { .. }));
        assert_eq!(transport.connect_attempts(), 0);
        assert!(!supervisor.gates().is_held(&addr()));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_work_still_disconnects() {
        let (radio, transport, supervisor) = setup();
        radio.set_visibility(&addr(), Visibility::Connectable);

        let err = supervisor
            .with_connection(&addr(), |_| {
                Box::pin(async {
                    Err::<(), _>(CoreError::Transport {
                        address: addr(),
                        message: "boom".into(),
                    })
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Transport { .. }));
        let events = transport.events();
        assert!(matches!(events.last(), Some(TransportEvent::Disconnect { .. })));
        assert_eq!(transport.open_links(), 0);
        assert!(!supervisor.gates().is_held(&addr()));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_timeout_releases_gate() {
        let (radio, transport, supervisor) = setup();
        radio.set_visibility(&addr(), Visibility::Connectable);
        transport.set_connect_delay(Duration::from_secs(60));

        let err = supervisor
            .with_connection(&addr(), |_| Box::pin(async { Ok(()) }))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::ConnectTimeout { timeout, .. } if timeout == Duration::from_secs(15)
        ));
        assert_eq!(transport.connect_attempts(), 1);
        assert_eq!(transport.open_links(), 0);
        assert!(!supervisor.gates().is_held(&addr()));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_failure_is_swallowed() {
        let (radio, transport, supervisor) = setup();
        radio.set_visibility(&addr(), Visibility::Connectable);
        transport.set_disconnect_failure(Some("adapter reset"));

        let value = supervisor
            .with_connection(&addr(), |handle| {
                let id = handle.link_id();
                Box::pin(async move { Ok(id) })
            })
            .await
            .unwrap();

        assert_eq!(value, 1);
        assert_eq!(transport.disconnect_count(), 1);
    }
}
