#![allow(clippy::unwrap_used)]
// Advertisement ingestion: seeding, merging, publishing, and queue order.

use std::sync::Arc;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use neoblue_api::sim::{SimRadio, SimTransport};
use neoblue_api::{DeviceAddress, NEOSMART_MANUFACTURER_ID, RawAdvertisement};
use neoblue_core::{
    CoordinatorConfig, DevicePhase, DeviceRegistry, IgnoreReason, ListenOutcome, StatusRecord,
};

// ── Helpers ─────────────────────────────────────────────────────────

const BLIND: &str = "C4:BE:84:00:11:22";

fn frame(address: &str, bytes: &[u8], rssi: i16) -> RawAdvertisement {
    RawAdvertisement::new(address)
        .with_rssi(rssi)
        .with_local_name("NEO-1122")
        .with_manufacturer_data(NEOSMART_MANUFACTURER_ID, bytes.to_vec())
}

fn registry() -> DeviceRegistry {
    DeviceRegistry::new(
        Arc::new(SimRadio::new()),
        Arc::new(SimTransport::new()),
        CoordinatorConfig::default(),
    )
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_short_payload_keeps_seed_defaults() {
    let registry = registry();
    let coordinator = registry.register(BLIND);

    let outcome = registry
        .handle_advertisement(&frame(BLIND, &[85, 50, 10], -70))
        .unwrap();

    assert!(!outcome.is_update());
    let status = coordinator.status();
    assert_eq!(
        *status,
        StatusRecord {
            signal_strength: status.signal_strength,
            ..StatusRecord::seed(-60)
        }
    );
    assert_eq!(status.battery_level, 0);
    assert_eq!(status.current_position, 50);
    assert_eq!(status.target_position, 50);
    assert_eq!(coordinator.phase(), DevicePhase::Seeded);
    assert!(coordinator.last_update().is_none());
}

#[tokio::test]
async fn test_battery_drop_updates_only_battery() {
    let registry = registry();
    let coordinator = registry.register(BLIND);

    registry.handle_advertisement(&frame(BLIND, &[40, 25, 25, 90, 0x0C], -62));
    let before = *coordinator.status();
    registry.handle_advertisement(&frame(BLIND, &[38, 25, 25, 90, 0x0C], -62));
    let after = *coordinator.status();

    assert_eq!(after.battery_level, 38);
    assert_eq!(
        StatusRecord {
            battery_level: 40,
            ..after
        },
        before
    );
}

#[tokio::test]
async fn test_repeated_payload_is_idempotent() {
    let registry = registry();
    let coordinator = registry.register(BLIND);
    let adv = frame(BLIND, &[85, 50, 10, 75, 0x21], -55);

    registry.handle_advertisement(&adv);
    let once = *coordinator.status();
    registry.handle_advertisement(&adv);

    assert_eq!(*coordinator.status(), once);
}

#[tokio::test]
async fn test_reference_capture_publishes_full_record() {
    let registry = registry();
    let coordinator = registry.register(BLIND);
    let mut stream = coordinator.subscribe();

    registry.handle_advertisement(&frame(BLIND, &[85, 50, 10, 75, 0x21], -51));

    let published = stream.changed().await.unwrap();
    assert_eq!(
        *published,
        StatusRecord {
            battery_level: 85,
            current_position: 50,
            target_position: 10,
            signal_strength: -51,
            motor_running: true,
            motor_direction_down: false,
            up_limit_set: false,
            down_limit_set: false,
            touch_control: false,
            charging: true,
            channel_setting_mode: false,
            reverse_rotation: false,
            limit_range_size: 75,
        }
    );

    let cover = coordinator.cover_state();
    assert_eq!(cover.position, 50);
    assert_eq!(cover.target_position, 90);
    assert!(cover.is_closing());
}

#[tokio::test]
async fn test_unregistered_and_foreign_frames() {
    let registry = registry();
    let coordinator = registry.register(BLIND);

    assert!(
        registry
            .handle_advertisement(&frame("11:22:33:44:55:66", &[1, 2, 3, 4, 5], -40))
            .is_none()
    );

    let apple = RawAdvertisement::new(BLIND)
        .with_rssi(-40)
        .with_manufacturer_data(0x004C, vec![85, 50, 10, 75, 0x21]);
    assert_eq!(
        registry.handle_advertisement(&apple),
        Some(ListenOutcome::Ignored(IgnoreReason::NotOurs))
    );
    assert_eq!(coordinator.phase(), DevicePhase::Seeded);
}

// ── Ingestion queue ─────────────────────────────────────────────────

#[tokio::test]
async fn test_ingestion_preserves_arrival_order() {
    let registry = Arc::new(registry());
    let coordinator = registry.register(BLIND);
    let stream = coordinator.subscribe().into_stream();

    let (tx, rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let task = {
        let registry = Arc::clone(&registry);
        let cancel = cancel.clone();
        tokio::spawn(async move { registry.run_ingestion(rx, cancel).await })
    };

    for battery in (51..=60u8).rev() {
        tx.send(frame(BLIND, &[battery, 0, 0, 0, 0], -60))
            .await
            .unwrap();
    }
    drop(tx);
    task.await.unwrap();

    assert_eq!(coordinator.status().battery_level, 51);
    assert_eq!(coordinator.phase(), DevicePhase::Updated);

    // The stream yields the latest value first, then nothing more once the
    // coordinator is gone.
    registry.shutdown_all();
    drop(coordinator);
    let seen: Vec<_> = stream.map(|r| r.battery_level).collect().await;
    assert_eq!(seen, vec![51]);
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_ingestion_stops_on_cancel() {
    let registry = Arc::new(registry());
    let (tx, rx) = mpsc::channel::<RawAdvertisement>(8);
    let cancel = CancellationToken::new();
    let task = {
        let registry = Arc::clone(&registry);
        let cancel = cancel.clone();
        tokio::spawn(async move { registry.run_ingestion(rx, cancel).await })
    };

    cancel.cancel();
    task.await.unwrap();
    assert!(tx.is_closed());
}

#[tokio::test]
async fn test_removed_device_ignores_late_frames() {
    let registry = registry();
    let coordinator = registry.register(BLIND);
    registry.remove(&DeviceAddress::new(BLIND));

    assert!(
        registry
            .handle_advertisement(&frame(BLIND, &[85, 50, 10, 75, 0x21], -50))
            .is_none()
    );
    assert_eq!(
        coordinator.handle_advertisement(&frame(BLIND, &[85, 50, 10, 75, 0x21], -50)),
        ListenOutcome::Ignored(IgnoreReason::Closed)
    );
}
