// ── Cover view ──
//
// The user-facing reading of a status record. Users think 100 = open; the
// motor reports 100 = closed, so positions are inverted here and only here.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::status::StatusRecord;

/// User-facing position of a fully open blind.
pub const FULLY_OPEN: u8 = 100;
/// User-facing position of a fully closed blind.
pub const FULLY_CLOSED: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CoverMotion {
    Opening,
    Closing,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverState {
    /// 0 = closed, 100 = open.
    pub position: u8,
    pub target_position: u8,
    pub motion: CoverMotion,
    pub battery_level: u8,
}

impl CoverState {
    pub fn is_closed(&self) -> bool {
        self.position == FULLY_CLOSED
    }

    pub fn is_opening(&self) -> bool {
        self.motion == CoverMotion::Opening
    }

    pub fn is_closing(&self) -> bool {
        self.motion == CoverMotion::Closing
    }
}

impl From<&StatusRecord> for CoverState {
    fn from(r: &StatusRecord) -> Self {
        // The motor's "down" flag is what the device reports while the
        // blind travels toward the open end.
        let motion = match (r.motor_running, r.motor_direction_down) {
            (false, _) => CoverMotion::Idle,
            (true, true) => CoverMotion::Opening,
            (true, false) => CoverMotion::Closing,
        };
        Self {
            position: to_user(r.current_position),
            target_position: to_user(r.target_position),
            motion,
            battery_level: r.battery_level,
        }
    }
}

/// Device-native position to user-facing position. Also the inverse.
pub fn to_user(device_position: u8) -> u8 {
    100u8.saturating_sub(device_position.min(100))
}
