// ── Last-known-good status per device ──
//
// One cache per coordinator. Holds the merged record in a `watch` channel
// so subscribers always see the full record, never a diff. All mutation is
// synchronous and bounded; nothing in here awaits.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use tokio::sync::watch;

use crate::model::{StatusRecord, StatusUpdate};

/// Where a device's record is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DevicePhase {
    /// Only placeholder defaults so far.
    Seeded,
    /// At least one payload has been merged.
    Updated,
}

/// Fold one observation into the previous record.
///
/// Every field `update` carries replaces the previous value; every field it
/// omits is kept. `rssi`, when present, always replaces `signal_strength`.
pub fn merge(previous: &StatusRecord, update: &StatusUpdate, rssi: Option<i16>) -> StatusRecord {
    StatusRecord {
        battery_level: update.battery_level.unwrap_or(previous.battery_level),
        current_position: update.current_position.unwrap_or(previous.current_position),
        target_position: update.target_position.unwrap_or(previous.target_position),
        signal_strength: rssi.unwrap_or(previous.signal_strength),
        motor_running: update.motor_running.unwrap_or(previous.motor_running),
        motor_direction_down: update
            .motor_direction_down
            .unwrap_or(previous.motor_direction_down),
        up_limit_set: update.up_limit_set.unwrap_or(previous.up_limit_set),
        down_limit_set: update.down_limit_set.unwrap_or(previous.down_limit_set),
        touch_control: update.touch_control.unwrap_or(previous.touch_control),
        charging: update.charging.unwrap_or(previous.charging),
        channel_setting_mode: update
            .channel_setting_mode
            .unwrap_or(previous.channel_setting_mode),
        reverse_rotation: update.reverse_rotation.unwrap_or(previous.reverse_rotation),
        limit_range_size: update.limit_range_size.unwrap_or(previous.limit_range_size),
    }
}

pub struct StateCache {
    record: watch::Sender<Arc<StatusRecord>>,
    /// Number of successful payload merges. 0 while seeded.
    version: watch::Sender<u64>,
    last_update: watch::Sender<Option<DateTime<Utc>>>,
}

impl StateCache {
    pub fn new(seed: StatusRecord) -> Self {
        let (record, _) = watch::channel(Arc::new(seed));
        let (version, _) = watch::channel(0u64);
        let (last_update, _) = watch::channel(None);
        Self {
            record,
            version,
            last_update,
        }
    }

    pub fn current(&self) -> Arc<StatusRecord> {
        self.record.borrow().clone()
    }

    pub fn phase(&self) -> DevicePhase {
        if *self.version.borrow() == 0 {
            DevicePhase::Seeded
        } else {
            DevicePhase::Updated
        }
    }

    pub fn merge_count(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StatusRecord>> {
        self.record.subscribe()
    }

    /// Merge a decoded payload and publish the full result.
    ///
    /// The read of the previous record and the write of the merged one
    /// happen under the channel's lock, so concurrent callers never lose
    /// each other's fields.
    pub fn apply(&self, update: &StatusUpdate, rssi: Option<i16>) -> Arc<StatusRecord> {
        let mut merged = None;
        self.record.send_modify(|current| {
            *current = Arc::new(merge(current, update, rssi));
            merged = Some(Arc::clone(current));
        });
        let merged = merged.unwrap_or_else(|| self.current());
        self.version.send_modify(|v| *v += 1);
        self.last_update.send_replace(Some(Utc::now()));
        merged
    }

    /// Refresh only the signal strength. Publishes (and returns the record)
    /// only when the value actually changed; the phase is untouched.
    pub fn record_signal(&self, rssi: i16) -> Option<Arc<StatusRecord>> {
        let changed = self.record.send_if_modified(|current| {
            if current.signal_strength == rssi {
                return false;
            }
            *current = Arc::new(merge(current, &StatusUpdate::signal_only(), Some(rssi)));
            true
        });
        changed.then(|| self.current())
    }
}
