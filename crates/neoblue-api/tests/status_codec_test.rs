#![allow(clippy::unwrap_used)]
// Status payload decoding against captured broadcasts.

use pretty_assertions::assert_eq;

use neoblue_api::{
    DecodeError, NEOSMART_MANUFACTURER_ID, RawAdvertisement, STATUS_PAYLOAD_LENGTH, StatusPayload,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// (bytes, battery, current, target, range, flag bits)
const CAPTURES: &[([u8; 5], u8, u8, u8, u8, u8)] = &[
    ([85, 50, 10, 75, 0x21], 85, 50, 10, 75, 0x21),
    // Idle, fully open, both limits programmed.
    ([100, 0, 0, 120, 0x0C], 100, 0, 0, 120, 0x0C),
    // Closing on battery.
    ([62, 35, 100, 120, 0x0F], 62, 35, 100, 120, 0x0F),
    // Pairing button held, reversed motor.
    ([9, 100, 100, 0, 0xC0], 9, 100, 100, 0, 0xC0),
];

// ── Captured payloads ───────────────────────────────────────────────

#[test]
fn test_captured_payloads_decode() {
    for (bytes, battery, current, target, range, flags) in CAPTURES {
        let status = StatusPayload::decode(bytes).unwrap();
        assert_eq!(status.battery_level, *battery);
        assert_eq!(status.current_position, *current);
        assert_eq!(status.target_position, *target);
        assert_eq!(status.limit_range_size, *range);
        assert_eq!(status.flags.bits(), *flags);
        assert_eq!(&status.to_bytes(), bytes);
    }
}

#[test]
fn test_closing_capture_flags() {
    let status = StatusPayload::decode(&[62, 35, 100, 120, 0x0F]).unwrap();
    assert!(status.flags.motor_running());
    assert!(status.flags.motor_direction_down());
    assert!(status.flags.up_limit_set());
    assert!(status.flags.down_limit_set());
    assert!(!status.flags.charging());
}

#[test]
fn test_payload_from_mixed_vendor_frame() {
    let adv = RawAdvertisement::new("C4:BE:84:00:11:22")
        .with_rssi(-58)
        .with_manufacturer_data(0x004C, vec![0x10, 0x05, 0x01])
        .with_manufacturer_data(NEOSMART_MANUFACTURER_ID, vec![85, 50, 10, 75, 0x21, 0x00]);

    let payload = adv.payload_for(NEOSMART_MANUFACTURER_ID).unwrap();
    let status = StatusPayload::decode(payload).unwrap();
    assert_eq!(status.battery_level, 85);
}

// ── Rejections ──────────────────────────────────────────────────────

#[test]
fn test_three_byte_payload_is_too_short() {
    assert_eq!(
        StatusPayload::decode(&[85, 50, 10]),
        Err(DecodeError::PayloadTooShort {
            len: 3,
            expected: STATUS_PAYLOAD_LENGTH,
        })
    );
}

#[test]
fn test_out_of_range_position() {
    let err = StatusPayload::decode(&[50, 180, 10, 0, 0]).unwrap_err();
    assert_eq!(
        err,
        DecodeError::OutOfRange {
            field: "current_position",
            value: 180,
        }
    );
    assert_eq!(
        err.to_string(),
        "Malformed status payload: current_position = 180 exceeds 100"
    );
}
