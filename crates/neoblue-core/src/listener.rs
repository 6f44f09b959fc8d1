// ── Advertisement ingestion ──
//
// Called for every frame the radio stack hears from a device of interest.
// Runs to completion without suspending: select our manufacturer data,
// decode, merge, publish. Frames are handled in arrival order.

use std::sync::Arc;

use neoblue_api::{DecodeError, RawAdvertisement, StatusPayload};
use tracing::{debug, trace, warn};

use crate::config::CoordinatorConfig;
use crate::model::{StatusRecord, StatusUpdate};
use crate::store::StateCache;

/// What one advertisement did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    /// A payload was decoded; the full merged record was published.
    Updated(Arc<StatusRecord>),
    /// No usable payload, but the frame's signal strength was published.
    SignalRefreshed(Arc<StatusRecord>),
    /// Nothing changed.
    Ignored(IgnoreReason),
}

impl ListenOutcome {
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The frame carried no data under our manufacturer id.
    NotOurs,
    /// Our payload was present but unusable.
    Undecodable(DecodeError),
    /// A manual refresh found no stored advertisement.
    NoAdvertisement,
    /// The coordinator has been shut down.
    Closed,
}

pub struct AdvertisementListener {
    manufacturer_id: u16,
    surface_signal_only: bool,
}

impl AdvertisementListener {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            manufacturer_id: config.manufacturer_id,
            surface_signal_only: config.surface_signal_only,
        }
    }

    /// Decode the status payload of `adv` without touching any state.
    pub fn decode(&self, adv: &RawAdvertisement) -> Option<Result<StatusPayload, DecodeError>> {
        adv.payload_for(self.manufacturer_id)
            .map(StatusPayload::decode)
    }

    pub fn handle(&self, cache: &StateCache, adv: &RawAdvertisement) -> ListenOutcome {
        let address = &adv.address;

        let Some(payload) = adv.payload_for(self.manufacturer_id) else {
            trace!(
                %address,
                ids = ?adv.manufacturer_data.keys().collect::<Vec<_>>(),
                "no status payload in advertisement"
            );
            return ListenOutcome::Ignored(IgnoreReason::NotOurs);
        };

        match StatusPayload::decode(payload) {
            Ok(status) => {
                let record = cache.apply(&StatusUpdate::from(status), adv.rssi);
                debug!(
                    %address,
                    payload = %hex::encode_upper(payload),
                    rssi = adv.rssi,
                    battery = record.battery_level,
                    position = record.current_position,
                    "status updated from advertisement"
                );
                ListenOutcome::Updated(record)
            }
            Err(e) => {
                warn!(
                    %address,
                    payload = %hex::encode_upper(payload),
                    error = %e,
                    "unusable status payload"
                );
                self.signal_only(cache, adv, e)
            }
        }
    }

    fn signal_only(
        &self,
        cache: &StateCache,
        adv: &RawAdvertisement,
        error: DecodeError,
    ) -> ListenOutcome {
        if self.surface_signal_only {
            if let Some(record) = adv.rssi.and_then(|rssi| cache.record_signal(rssi)) {
                return ListenOutcome::SignalRefreshed(record);
            }
        }
        ListenOutcome::Ignored(IgnoreReason::Undecodable(error))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use neoblue_api::NEOSMART_MANUFACTURER_ID;

    use super::*;
    use crate::store::DevicePhase;

    fn frame(bytes: &[u8], rssi: i16) -> RawAdvertisement {
        RawAdvertisement::new("C4:BE:84:00:11:22")
            .with_rssi(rssi)
            .with_manufacturer_data(NEOSMART_MANUFACTURER_ID, bytes.to_vec())
    }

    #[test]
    fn foreign_frames_are_a_no_op() {
        let listener = AdvertisementListener::new(&CoordinatorConfig::default());
        let cache = StateCache::new(StatusRecord::seed(-60));
        let adv = RawAdvertisement::new("C4:BE:84:00:11:22")
            .with_rssi(-40)
            .with_manufacturer_data(0x004C, vec![85, 50, 10, 75, 0x21]);

        assert_eq!(
            listener.handle(&cache, &adv),
            ListenOutcome::Ignored(IgnoreReason::NotOurs)
        );
        assert_eq!(*cache.current(), StatusRecord::seed(-60));
    }

    #[test]
    fn decoded_frame_updates_and_publishes() {
        let listener = AdvertisementListener::new(&CoordinatorConfig::default());
        let cache = StateCache::new(StatusRecord::seed(-60));
        let mut rx = cache.subscribe();

        let outcome = listener.handle(&cache, &frame(&[85, 50, 10, 75, 0x21], -48));

        assert!(outcome.is_update());
        assert!(rx.has_changed().unwrap());
        let published = rx.borrow_and_update().clone();
        assert_eq!(published.battery_level, 85);
        assert_eq!(published.signal_strength, -48);
        assert!(published.motor_running && published.charging);
        assert_eq!(cache.phase(), DevicePhase::Updated);
    }

    #[test]
    fn short_frame_only_refreshes_signal() {
        let listener = AdvertisementListener::new(&CoordinatorConfig::default());
        let cache = StateCache::new(StatusRecord::seed(-60));

        let outcome = listener.handle(&cache, &frame(&[85, 50, 10], -66));

        let ListenOutcome::SignalRefreshed(record) = outcome else {
            panic!("expected signal refresh, got {outcome:?}");
        };
        assert_eq!(
            *record,
            StatusRecord {
                signal_strength: -66,
                ..StatusRecord::seed(-60)
            }
        );
        assert_eq!(cache.phase(), DevicePhase::Seeded);
    }

    #[test]
    fn short_frame_with_signal_surfacing_off() {
        let config = CoordinatorConfig {
            surface_signal_only: false,
            ..CoordinatorConfig::default()
        };
        let listener = AdvertisementListener::new(&config);
        let cache = StateCache::new(StatusRecord::seed(-60));

        let outcome = listener.handle(&cache, &frame(&[1, 2, 3], -66));

        assert!(matches!(
            outcome,
            ListenOutcome::Ignored(IgnoreReason::Undecodable(DecodeError::PayloadTooShort {
                len: 3,
                ..
            }))
        ));
        assert_eq!(*cache.current(), StatusRecord::seed(-60));
    }

    #[test]
    fn decode_is_read_only() {
        let listener = AdvertisementListener::new(&CoordinatorConfig::default());
        let status = listener
            .decode(&frame(&[85, 50, 10, 75, 0x21], -48))
            .unwrap()
            .unwrap();
        assert_eq!(status.battery_level, 85);
        assert!(listener.decode(&RawAdvertisement::new("AA:BB")).is_none());
    }
}
