// ── Status payload codec ──
//
// The blind broadcasts its state as a fixed 5-byte record under the
// vendor manufacturer id. Protocol version 1 layout:
//
//   byte 0  battery level, percent (0-100)
//   byte 1  current position, device-native percent (0 = open, 100 = closed)
//   byte 2  target position, same encoding
//   byte 3  limit range size (raw, unscaled)
//   byte 4  flags, LSB first:
//             bit 0  motor running
//             bit 1  motor direction down
//             bit 2  up limit set
//             bit 3  down limit set
//             bit 4  touch control active
//             bit 5  charging
//             bit 6  channel setting mode
//             bit 7  reverse rotation
//
// Decoding is pure: no I/O, no state.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Bluetooth SIG company identifier carried by NeoSmart Blue broadcasts.
pub const NEOSMART_MANUFACTURER_ID: u16 = 2407;

/// Bytes of manufacturer data that make up one status record.
pub const STATUS_PAYLOAD_LENGTH: usize = 5;

/// Wire layout version implemented by [`StatusPayload::decode`].
pub const PROTOCOL_VERSION: u8 = 1;

const MAX_PERCENT: u8 = 100;

/// Boolean flags packed into the trailing status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusFlags(u8);

impl StatusFlags {
    pub const MOTOR_RUNNING: u8 = 1 << 0;
    pub const MOTOR_DIRECTION_DOWN: u8 = 1 << 1;
    pub const UP_LIMIT_SET: u8 = 1 << 2;
    pub const DOWN_LIMIT_SET: u8 = 1 << 3;
    pub const TOUCH_CONTROL: u8 = 1 << 4;
    pub const CHARGING: u8 = 1 << 5;
    pub const CHANNEL_SETTING_MODE: u8 = 1 << 6;
    pub const REVERSE_ROTATION: u8 = 1 << 7;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    pub const fn motor_running(self) -> bool {
        self.contains(Self::MOTOR_RUNNING)
    }

    pub const fn motor_direction_down(self) -> bool {
        self.contains(Self::MOTOR_DIRECTION_DOWN)
    }

    pub const fn up_limit_set(self) -> bool {
        self.contains(Self::UP_LIMIT_SET)
    }

    pub const fn down_limit_set(self) -> bool {
        self.contains(Self::DOWN_LIMIT_SET)
    }

    pub const fn touch_control(self) -> bool {
        self.contains(Self::TOUCH_CONTROL)
    }

    pub const fn charging(self) -> bool {
        self.contains(Self::CHARGING)
    }

    pub const fn channel_setting_mode(self) -> bool {
        self.contains(Self::CHANNEL_SETTING_MODE)
    }

    pub const fn reverse_rotation(self) -> bool {
        self.contains(Self::REVERSE_ROTATION)
    }
}

/// One decoded status broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusPayload {
    pub battery_level: u8,
    pub current_position: u8,
    pub target_position: u8,
    pub limit_range_size: u8,
    pub flags: StatusFlags,
}

impl StatusPayload {
    /// Decode the first [`STATUS_PAYLOAD_LENGTH`] bytes of `payload`.
    ///
    /// Trailing bytes beyond the record are ignored; shorter input is
    /// [`DecodeError::PayloadTooShort`]. Percent fields above 100 reject the
    /// whole record.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let Some(&[battery, current, target, range, flags]) = payload.first_chunk() else {
            return Err(DecodeError::too_short(payload.len()));
        };

        Ok(Self {
            battery_level: percent("battery_level", battery)?,
            current_position: percent("current_position", current)?,
            target_position: percent("target_position", target)?,
            limit_range_size: range,
            flags: StatusFlags::from_bits(flags),
        })
    }

    /// Encode back into the broadcast layout.
    pub fn to_bytes(&self) -> [u8; STATUS_PAYLOAD_LENGTH] {
        [
            self.battery_level,
            self.current_position,
            self.target_position,
            self.limit_range_size,
            self.flags.bits(),
        ]
    }
}

fn percent(field: &'static str, value: u8) -> Result<u8, DecodeError> {
    if value > MAX_PERCENT {
        return Err(DecodeError::OutOfRange { field, value });
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_capture() {
        let status = StatusPayload::decode(&[85, 50, 10, 75, 0x21]).unwrap();

        assert_eq!(status.battery_level, 85);
        assert_eq!(status.current_position, 50);
        assert_eq!(status.target_position, 10);
        assert_eq!(status.limit_range_size, 75);

        // 0x21 = motor running (bit 0) + charging (bit 5), nothing else.
        assert!(status.flags.motor_running());
        assert!(status.flags.charging());
        assert!(!status.flags.motor_direction_down());
        assert!(!status.flags.up_limit_set());
        assert!(!status.flags.down_limit_set());
        assert!(!status.flags.touch_control());
        assert!(!status.flags.channel_setting_mode());
        assert!(!status.flags.reverse_rotation());
    }

    #[test]
    fn each_flag_bit_maps_to_one_field() {
        let cases: [(u8, fn(StatusFlags) -> bool); 8] = [
            (0x01, StatusFlags::motor_running),
            (0x02, StatusFlags::motor_direction_down),
            (0x04, StatusFlags::up_limit_set),
            (0x08, StatusFlags::down_limit_set),
            (0x10, StatusFlags::touch_control),
            (0x20, StatusFlags::charging),
            (0x40, StatusFlags::channel_setting_mode),
            (0x80, StatusFlags::reverse_rotation),
        ];

        for (bit, accessor) in cases {
            for (other, other_accessor) in cases {
                let flags = StatusFlags::from_bits(bit);
                assert_eq!(
                    other_accessor(flags),
                    bit == other,
                    "bit {bit:#04x} leaked into accessor for {other:#04x}"
                );
            }
            assert!(accessor(StatusFlags::from_bits(0xFF)));
        }
    }

    #[test]
    fn short_payloads_are_rejected() {
        for len in 0..STATUS_PAYLOAD_LENGTH {
            let payload = vec![0u8; len];
            assert_eq!(
                StatusPayload::decode(&payload),
                Err(DecodeError::PayloadTooShort {
                    len,
                    expected: STATUS_PAYLOAD_LENGTH
                })
            );
        }
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let status = StatusPayload::decode(&[40, 0, 100, 12, 0x00, 0xDE, 0xAD]).unwrap();
        assert_eq!(status.battery_level, 40);
        assert_eq!(status.target_position, 100);
    }

    #[test]
    fn out_of_range_percent_rejects_whole_record() {
        assert_eq!(
            StatusPayload::decode(&[101, 50, 50, 0, 0]),
            Err(DecodeError::OutOfRange {
                field: "battery_level",
                value: 101
            })
        );
        assert_eq!(
            StatusPayload::decode(&[50, 50, 0xFF, 0, 0]),
            Err(DecodeError::OutOfRange {
                field: "target_position",
                value: 0xFF
            })
        );
    }

    #[test]
    fn limit_range_is_unbounded() {
        let status = StatusPayload::decode(&[0, 0, 0, 0xFF, 0]).unwrap();
        assert_eq!(status.limit_range_size, 0xFF);
    }

    #[test]
    fn decode_is_deterministic() {
        let payload = [12, 99, 3, 200, 0b1010_0110];
        let first = StatusPayload::decode(&payload).unwrap();
        for _ in 0..16 {
            assert_eq!(StatusPayload::decode(&payload).unwrap(), first);
        }
        assert_eq!(first.to_bytes(), payload);
    }
}
