//! # relay-core
//!
//! Shared library for Barcode Relay containing the scan domain types, the
//! key code translation table, and the record type used by message sinks.
//!
//! This crate is used by the relay agent and by its tests and benchmarks.
//! It has zero dependencies on OS APIs, async runtimes, or network sockets.
//!
//! # Architecture overview
//!
//! Barcode Relay turns keystroke-emulating barcode scanners into a stream of
//! discrete scan records.  A scanner "types" a barcode one key at a time; the
//! relay reassembles those keystrokes into complete scans and appends each
//! one to a downstream stream store.
//!
//! - **`keymap`** – Translates a device key code into the text it contributes
//!   to a scan (`2` → `"1"`, `28` → `"\n"`, Shift → `""`).
//!
//! - **`domain`** – Pure types: the configured [`DeviceIdentity`], the
//!   [`ScanBuffer`] that detects scan boundaries, the emitted [`Scan`], and
//!   the telemetry carried by a [`HeartbeatRecord`].
//!
//! - **`protocol`** – How records leave the relay: the ordered
//!   [`SinkRecord`] field map that sinks write as stream entries.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::device::{DeviceIdentity, DomainError};
pub use domain::heartbeat::{DeviceStatus, HeartbeatRecord};
pub use domain::scan::{unix_timestamp, Scan, ScanBuffer};
pub use keymap::KeyMapper;
pub use protocol::record::SinkRecord;
