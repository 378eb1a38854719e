//! Capability traits the pipeline is written against.
//!
//! The production implementations live in `infrastructure`: evdev devices on
//! Linux and a Redis Streams sink.  Tests inject scripted sources and
//! recording sinks through the same traits.

use async_trait::async_trait;
use relay_core::SinkRecord;
use thiserror::Error;

/// Error type for keystroke source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No device with the requested vendor/product is attached.
    #[error("device {vendor_id:04x}:{product_id:04x} not found")]
    NotFound { vendor_id: u16, product_id: u16 },

    /// The device exists but another process holds an exclusive grab.
    #[error("device is busy: {0}")]
    Busy(String),

    /// The device went away while it was being read.
    #[error("device disconnected")]
    Disconnected,

    /// There is no keystroke source implementation for this OS.
    #[error("keystroke capture is not supported on {0}")]
    UnsupportedPlatform(&'static str),

    /// Any other OS-level failure.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for message sink operations.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The target could not be reached.
    #[error("could not connect to {target}: {reason}")]
    Connect { target: String, reason: String },

    /// The connection failed mid-request.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request did not complete within the configured timeout.
    #[error("sink request timed out")]
    Timeout,

    /// The target answered with an error.
    #[error("sink rejected the record: {0}")]
    Rejected(String),

    /// The target answered with something that is not a valid reply.
    #[error("sink protocol error: {0}")]
    Protocol(String),
}

/// A keystroke-capable input device found by [`DeviceLocator::list_devices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// OS path or handle name (e.g. `/dev/input/event3`).
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Human-readable device name as reported by the driver.
    pub name: String,
}

/// One opened keystroke device.
#[async_trait]
pub trait KeystrokeSource: Send {
    /// Takes exclusive capture so keystrokes stop reaching other consumers.
    async fn grab(&mut self) -> Result<(), SourceError>;

    /// Waits a bounded time for the next key-down.
    ///
    /// Returns `Ok(Some(code))` for a key-down, `Ok(None)` if nothing arrived
    /// within the poll window, and `Err(SourceError::Disconnected)` once the
    /// device is gone.
    async fn next_key(&mut self) -> Result<Option<u16>, SourceError>;
}

/// Resolves configured vendor/product pairs to open keystroke sources.
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    /// Opens the first attached device matching `vendor_id:product_id`.
    async fn locate(
        &self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Box<dyn KeystrokeSource>, SourceError>;

    /// Lists every attached device that can produce keystrokes.
    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, SourceError>;
}

/// An append-only target for scan and heartbeat records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Appends `record` to `stream`, reporting success only once the target
    /// has accepted it.
    async fn append(&self, stream: &str, record: &SinkRecord) -> Result<(), SinkError>;

    /// Short description of the target for log lines.
    fn describe(&self) -> String;
}
