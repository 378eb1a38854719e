//! Application layer: the concurrent scan pipeline.
//!
//! Everything here is written against the capability traits in
//! [`capabilities`]; no module in this layer opens a device, a socket, or a
//! file.  Concrete sources and sinks are injected by the binary (or by tests).
//!
//! # Sub-modules
//!
//! - **`capabilities`**  – The `KeystrokeSource`, `DeviceLocator` and
//!   `MessageSink` traits plus their error types.
//!
//! - **`dispatch`**      – The rendezvous handoff from many device readers to
//!   the single sender.  A reader's hand-off completes only when the sender
//!   has taken the scan, which is what bounds memory when delivery stalls.
//!
//! - **`device_reader`** – One task per configured scanner: locate, grab,
//!   buffer keystrokes, emit scans; survives unplug/replug indefinitely.
//!
//! - **`sender`**        – Drains the dispatch path and delivers every scan at
//!   least once, retrying the same scan with a fixed backoff.
//!
//! - **`heartbeat`**     – Best-effort periodic liveness records.
//!
//! - **`lifecycle`**     – Starts the tasks in dependency order and runs the
//!   loss-free shutdown: cancel, join readers, close dispatch, drain sender.

pub mod capabilities;
pub mod device_reader;
pub mod dispatch;
pub mod heartbeat;
pub mod lifecycle;
pub mod sender;
