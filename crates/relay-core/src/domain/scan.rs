//! Scan records and the boundary-detecting character buffer.
//!
//! # How boundary detection works
//!
//! A scanner delivers a barcode one keystroke at a time and nothing on the
//! wire marks where one barcode ends.  Each device is therefore configured
//! with a *boundary pattern*.  After every appended keystroke the **whole**
//! accumulated buffer is tested against the pattern; the first time it
//! matches, the buffer content becomes a [`Scan`] and the buffer is emptied.
//!
//! ```text
//! pattern ^.*\n$     keys: 1 2 3 Enter
//!
//! "1"    no match
//! "12"   no match
//! "123"  no match
//! "123\n" match  → Scan { content: "123\n" }, buffer = ""
//! ```
//!
//! The test is an unanchored search, so patterns must be anchored to the
//! intended completion point (typically `$` after a terminator).  Testing is
//! O(buffer length) per keystroke, which is fine for barcode-sized input.

use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;

use crate::protocol::record::SinkRecord;

/// Seconds since the Unix epoch, or 0 if the system clock is before 1970.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// One complete barcode read.
///
/// A scan is created once by a device reader and consumed once by the sender.
/// Delivery retries reuse the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    /// Logical id of the device that produced the scan.
    pub device_id: String,
    /// Accumulated text up to and including the boundary match.
    pub content: String,
    /// Emission time, seconds since the Unix epoch.
    pub timestamp: i64,
}

impl Scan {
    /// Creates a scan stamped with the current time.
    pub fn now(device_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            content: content.into(),
            timestamp: unix_timestamp(),
        }
    }

    /// Builds the record appended to the scan stream.
    ///
    /// Fields, in order: `relay`, `device`, `code`, `ts`.
    pub fn to_record(&self, relay_id: &str) -> SinkRecord {
        SinkRecord::new()
            .with_field("relay", relay_id)
            .with_field("device", &self.device_id)
            .with_field("code", &self.content)
            .with_field("ts", self.timestamp.to_string())
    }

    /// Content with line terminators escaped, for single-line log output.
    pub fn printable_content(&self) -> String {
        self.content.escape_debug().to_string()
    }
}

/// Per-device character buffer that emits content on a boundary match.
///
/// The buffer is only ever emptied by a successful [`push`](Self::push) match
/// or an explicit [`clear`](Self::clear) on device loss.
#[derive(Debug, Clone)]
pub struct ScanBuffer {
    boundary: Regex,
    buffer: String,
}

impl ScanBuffer {
    /// Creates an empty buffer that completes scans on `boundary`.
    pub fn new(boundary: Regex) -> Self {
        Self {
            boundary,
            buffer: String::new(),
        }
    }

    /// Appends `text` and tests the accumulated buffer against the boundary.
    ///
    /// Returns the completed scan content on a match, leaving the buffer empty.
    /// An empty `text` (e.g. from a modifier key) still triggers a test.
    pub fn push(&mut self, text: &str) -> Option<String> {
        self.buffer.push_str(text);
        if self.boundary.is_match(&self.buffer) {
            Some(std::mem::take(&mut self.buffer))
        } else {
            None
        }
    }

    /// Discards any partial content.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Current buffer content.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Length of the buffered content in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
