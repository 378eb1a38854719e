//! Liveness telemetry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::protocol::record::SinkRecord;

/// Snapshot of one device reader, published by the reader itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Whether the reader currently holds a captured device.
    pub connected: bool,
    /// Scans handed off to the sender since startup.
    pub scans: u64,
    /// Timestamp of the most recent scan, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan_ts: Option<i64>,
}

/// One heartbeat emission.  Rebuilt from scratch on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatRecord {
    pub relay_id: String,
    pub uptime_secs: u64,
    /// Device id → status, ordered by id for stable output.
    pub devices: BTreeMap<String, DeviceStatus>,
    pub timestamp: i64,
}

impl HeartbeatRecord {
    /// Builds the record appended to the heartbeat stream.
    ///
    /// Fields, in order: `relay`, `uptime`, `devices` (JSON object), `ts`.
    pub fn to_record(&self) -> SinkRecord {
        // Serializing a map of plain structs with string keys cannot fail.
        let devices = serde_json::to_string(&self.devices).unwrap_or_else(|_| "{}".to_string());
        SinkRecord::new()
            .with_field("relay", &self.relay_id)
            .with_field("uptime", self.uptime_secs.to_string())
            .with_field("devices", devices)
            .with_field("ts", self.timestamp.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fields_and_device_json() {
        // Arrange
        let mut devices = BTreeMap::new();
        devices.insert(
            "scanner-b".to_string(),
            DeviceStatus {
                connected: false,
                scans: 0,
                last_scan_ts: None,
            },
        );
        devices.insert(
            "scanner-a".to_string(),
            DeviceStatus {
                connected: true,
                scans: 3,
                last_scan_ts: Some(1_700_000_100),
            },
        );
        let hb = HeartbeatRecord {
            relay_id: "relay-01".to_string(),
            uptime_secs: 42,
            devices,
            timestamp: 1_700_000_200,
        };

        // Act
        let record = hb.to_record();

        // Assert
        assert_eq!(record.get("relay"), Some("relay-01"));
        assert_eq!(record.get("uptime"), Some("42"));
        assert_eq!(record.get("ts"), Some("1700000200"));
        assert_eq!(
            record.get("devices"),
            Some(
                r#"{"scanner-a":{"connected":true,"scans":3,"last_scan_ts":1700000100},"scanner-b":{"connected":false,"scans":0}}"#
            )
        );
    }

    #[test]
    fn test_empty_device_map_serializes_as_empty_object() {
        let hb = HeartbeatRecord {
            relay_id: "r".to_string(),
            uptime_secs: 0,
            devices: BTreeMap::new(),
            timestamp: 0,
        };
        assert_eq!(hb.to_record().get("devices"), Some("{}"));
    }

    #[test]
    fn test_device_status_round_trips_through_json() {
        let status = DeviceStatus {
            connected: true,
            scans: 7,
            last_scan_ts: Some(5),
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: DeviceStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, back);
    }
}
