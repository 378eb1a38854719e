//! Integration tests for the relay-core public API.
//!
//! These tests type barcodes key by key through the key table and a device's
//! scan buffer, then check the records built from the results.

use std::collections::BTreeMap;

use relay_core::{DeviceIdentity, DeviceStatus, HeartbeatRecord, KeyMapper, Scan, ScanBuffer};

const KEY_LEFTSHIFT: u16 = 42;
const KEY_ENTER: u16 = 28;

/// evdev codes for the digits of `text`.
fn digit_keys(text: &str) -> Vec<u16> {
    text.chars()
        .map(|c| match c {
            '0' => 11,
            d => d.to_digit(10).expect("decimal digit") as u16 + 1,
        })
        .collect()
}

/// Feeds `codes` into a fresh buffer for `identity`, collecting every scan.
fn type_keys(identity: &DeviceIdentity, codes: &[u16]) -> (Vec<String>, ScanBuffer) {
    let mut buffer = ScanBuffer::new(identity.boundary().clone());
    let scans = codes
        .iter()
        .filter_map(|&code| buffer.push(KeyMapper::key_to_text(code)))
        .collect();
    (scans, buffer)
}

// ── Scan assembly ─────────────────────────────────────────────────────────────

#[test]
fn test_enter_terminated_scans_are_split_on_newline() {
    // Arrange
    let identity = DeviceIdentity::new("scanner-a", 0x05e0, 0x1200, r"^.*\n$").unwrap();
    let mut codes = digit_keys("4006381333931");
    codes.push(KEY_ENTER);
    codes.push(KEY_LEFTSHIFT);
    codes.extend(digit_keys("42"));
    codes.push(KEY_ENTER);

    // Act
    let (scans, buffer) = type_keys(&identity, &codes);

    // Assert
    assert_eq!(scans, vec!["4006381333931\n", "42\n"]);
    assert!(buffer.is_empty());
}

#[test]
fn test_fixed_length_pattern_completes_without_terminator() {
    // Arrange
    let identity = DeviceIdentity::new("scanner-b", 0x05e0, 0x1201, r"^\d{8}$").unwrap();
    let codes = digit_keys("1234567890");

    // Act
    let (scans, buffer) = type_keys(&identity, &codes);

    // Assert
    assert_eq!(scans, vec!["12345678"]);
    assert_eq!(buffer.as_str(), "90");
}

#[test]
fn test_unanchored_pattern_matches_anywhere_in_buffer() {
    // Arrange
    let identity = DeviceIdentity::new("scanner-c", 0x05e0, 0x1202, r"\n").unwrap();
    let mut codes = digit_keys("77");
    codes.push(KEY_ENTER);

    // Act
    let (scans, _) = type_keys(&identity, &codes);

    // Assert
    assert_eq!(scans, vec!["77\n"]);
}

// ── Records ───────────────────────────────────────────────────────────────────

#[test]
fn test_scan_record_fields_follow_stream_layout() {
    // Arrange
    let scan = Scan {
        device_id: "scanner-a".to_string(),
        content: "42\n".to_string(),
        timestamp: 1_700_000_000,
    };

    // Act
    let record = scan.to_record("relay-01");

    // Assert
    let fields: Vec<(&str, &str)> = record.iter().collect();
    assert_eq!(
        fields,
        vec![
            ("relay", "relay-01"),
            ("device", "scanner-a"),
            ("code", "42\n"),
            ("ts", "1700000000"),
        ]
    );
}

#[test]
fn test_heartbeat_record_carries_device_json() {
    // Arrange
    let mut devices = BTreeMap::new();
    devices.insert(
        "scanner-a".to_string(),
        DeviceStatus {
            connected: true,
            scans: 12,
            last_scan_ts: Some(1_700_000_050),
        },
    );
    let heartbeat = HeartbeatRecord {
        relay_id: "relay-01".to_string(),
        uptime_secs: 600,
        devices,
        timestamp: 1_700_000_060,
    };

    // Act
    let record = heartbeat.to_record();

    // Assert
    let json = r#"{"scanner-a":{"connected":true,"scans":12,"last_scan_ts":1700000050}}"#;
    assert_eq!(record.get("devices"), Some(json));
    assert_eq!(record.get("uptime"), Some("600"));
    assert_eq!(record.len(), 4);
}
