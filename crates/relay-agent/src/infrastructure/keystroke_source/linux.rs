//! Linux evdev keystroke source.
//!
//! Scanners are found by enumerating the evdev nodes under `/dev/input` and
//! matching the vendor/product pair each one reports.  Once opened, the device
//! is grabbed so its keystrokes are delivered to this process only.
//!
//! # Reading
//!
//! Each [`KeystrokeSource::next_key`] call waits at most 250 ms on the
//! device's async event stream.  Only `EV_KEY` events with value 1 (key down)
//! are returned; key-up, autorepeat, `EV_SYN` and `EV_MSC` events are skipped.
//! An unplugged device fails its read with `ENODEV` and is reported as
//! [`SourceError::Disconnected`].
//!
//! Reading evdev nodes usually needs root or membership of the `input` group.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use evdev::{Device, EventStream, EventType, InputEvent};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::application::capabilities::{
    DeviceDescriptor, DeviceLocator, KeystrokeSource, SourceError,
};

/// Upper bound on a single `next_key` wait, so disconnects and cancellation
/// are noticed promptly.
const READ_TIMEOUT: Duration = Duration::from_millis(250);

const KEY_DOWN: i32 = 1;

// ── Locator ───────────────────────────────────────────────────────────────────

/// Finds scanners among the evdev nodes in `/dev/input`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvdevLocator;

#[async_trait]
impl DeviceLocator for EvdevLocator {
    async fn locate(
        &self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Box<dyn KeystrokeSource>, SourceError> {
        let found = blocking(move || {
            keyboards().into_iter().find(|(_, device)| {
                let id = device.input_id();
                id.vendor() == vendor_id && id.product() == product_id
            })
        })
        .await?;

        match found {
            Some((path, device)) => {
                debug!("matched {vendor_id:04x}:{product_id:04x} at {}", path.display());
                Ok(Box::new(EvdevSource {
                    path,
                    device: Some(device),
                    events: None,
                }))
            }
            None => Err(SourceError::NotFound {
                vendor_id,
                product_id,
            }),
        }
    }

    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, SourceError> {
        blocking(|| {
            keyboards()
                .iter()
                .map(|(path, device)| describe(path, device))
                .collect()
        })
        .await
    }
}

/// Key-capable evdev nodes, sorted by path.
fn keyboards() -> Vec<(PathBuf, Device)> {
    let mut devices: Vec<(PathBuf, Device)> = evdev::enumerate()
        .filter(|(_, device)| device.supported_events().contains(EventType::KEY))
        .collect();
    devices.sort_by(|a, b| a.0.cmp(&b.0));
    devices
}

fn describe(path: &Path, device: &Device) -> DeviceDescriptor {
    let id = device.input_id();
    DeviceDescriptor {
        path: path.display().to_string(),
        vendor_id: id.vendor(),
        product_id: id.product(),
        name: device.name().unwrap_or("unknown").to_string(),
    }
}

// ── Source ────────────────────────────────────────────────────────────────────

/// An opened evdev node.  The grab is released when the device is closed.
///
/// The device becomes an event stream on first read; the stream registers
/// with the tokio reactor, so it is only built inside the runtime.
pub struct EvdevSource {
    path: PathBuf,
    device: Option<Device>,
    events: Option<EventStream>,
}

impl EvdevSource {
    fn events(&mut self) -> Result<&mut EventStream, SourceError> {
        if self.events.is_none() {
            let device = self.device.take().ok_or(SourceError::Disconnected)?;
            self.events = Some(device.into_event_stream().map_err(read_error)?);
        }
        self.events.as_mut().ok_or(SourceError::Disconnected)
    }
}

#[async_trait]
impl KeystrokeSource for EvdevSource {
    async fn grab(&mut self) -> Result<(), SourceError> {
        // Readers grab once, right after locating, before any read.
        if let Some(device) = self.device.as_mut() {
            device.grab().map_err(|e| grab_error(&self.path, e))?;
        }
        Ok(())
    }

    async fn next_key(&mut self) -> Result<Option<u16>, SourceError> {
        let deadline = Instant::now() + READ_TIMEOUT;
        let events = self.events()?;
        loop {
            let event = match timeout_at(deadline, events.next_event()).await {
                Ok(event) => event.map_err(read_error)?,
                Err(_) => return Ok(None),
            };
            if let Some(code) = key_down(&event) {
                return Ok(Some(code));
            }
        }
    }
}

/// The key code of `event` if it is a key press.
fn key_down(event: &InputEvent) -> Option<u16> {
    (event.event_type() == EventType::KEY && event.value() == KEY_DOWN).then(|| event.code())
}

fn grab_error(path: &Path, err: io::Error) -> SourceError {
    match err.raw_os_error() {
        Some(libc::EBUSY) => SourceError::Busy(path.display().to_string()),
        Some(libc::ENODEV) => SourceError::Disconnected,
        _ => SourceError::Io(err),
    }
}

fn read_error(err: io::Error) -> SourceError {
    match err.raw_os_error() {
        Some(libc::ENODEV) => SourceError::Disconnected,
        _ => SourceError::Io(err),
    }
}

/// Runs `f` on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, SourceError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SourceError::Io(io::Error::new(io::ErrorKind::Other, e)))
}
