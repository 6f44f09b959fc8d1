// ── Device status ──

use neoblue_api::StatusPayload;
use serde::{Deserialize, Serialize};

/// Seed value for both position fields before the first decode.
pub const SEED_POSITION: u8 = 50;

/// Last-known-good state of one blind.
///
/// Positions use the device-native encoding (0 = fully open, 100 = fully
/// closed). See [`CoverState`](super::CoverState) for the user-facing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct StatusRecord {
    pub battery_level: u8,
    pub current_position: u8,
    pub target_position: u8,
    /// dBm, from the most recent observation.
    pub signal_strength: i16,
    pub motor_running: bool,
    pub motor_direction_down: bool,
    pub up_limit_set: bool,
    pub down_limit_set: bool,
    pub touch_control: bool,
    pub charging: bool,
    pub channel_setting_mode: bool,
    pub reverse_rotation: bool,
    pub limit_range_size: u8,
}

impl StatusRecord {
    /// Placeholder state for a device nothing has been decoded for yet.
    pub fn seed(signal_strength: i16) -> Self {
        Self {
            battery_level: 0,
            current_position: SEED_POSITION,
            target_position: SEED_POSITION,
            signal_strength,
            motor_running: false,
            motor_direction_down: false,
            up_limit_set: false,
            down_limit_set: false,
            touch_control: false,
            charging: false,
            channel_setting_mode: false,
            reverse_rotation: false,
            limit_range_size: 0,
        }
    }
}

/// Fields carried by one observation. `None` means "not reported this time";
/// the previous value is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct StatusUpdate {
    pub battery_level: Option<u8>,
    pub current_position: Option<u8>,
    pub target_position: Option<u8>,
    pub motor_running: Option<bool>,
    pub motor_direction_down: Option<bool>,
    pub up_limit_set: Option<bool>,
    pub down_limit_set: Option<bool>,
    pub touch_control: Option<bool>,
    pub charging: Option<bool>,
    pub channel_setting_mode: Option<bool>,
    pub reverse_rotation: Option<bool>,
    pub limit_range_size: Option<u8>,
}

impl StatusUpdate {
    /// An observation with radio metadata only.
    pub fn signal_only() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<StatusPayload> for StatusUpdate {
    fn from(p: StatusPayload) -> Self {
        let flags = p.flags;
        Self {
            battery_level: Some(p.battery_level),
            current_position: Some(p.current_position),
            target_position: Some(p.target_position),
            motor_running: Some(flags.motor_running()),
            motor_direction_down: Some(flags.motor_direction_down()),
            up_limit_set: Some(flags.up_limit_set()),
            down_limit_set: Some(flags.down_limit_set()),
            touch_control: Some(flags.touch_control()),
            charging: Some(flags.charging()),
            channel_setting_mode: Some(flags.channel_setting_mode()),
            reverse_rotation: Some(flags.reverse_rotation()),
            limit_range_size: Some(p.limit_range_size),
        }
    }
}
