//! DeviceReader: turns one scanner's keystrokes into scans.
//!
//! Each configured device gets its own reader task.  The reader owns its
//! device handle and character buffer outright; the only things it shares
//! are the dispatch path (to hand scans off) and a `watch` channel it alone
//! writes (so the heartbeat can report device status).
//!
//! # State machine
//!
//! ```text
//!             locate ok                 grab ok
//! Searching ───────────▶ Grabbing ───────────────▶ Capturing ──┐
//!    ▲   │ not found / busy   │ grab failed           │  │ key  │
//!    │   └─ wait interval ◀───┘                        │  └──────┘
//!    └──────────────── device lost (buffer cleared) ──┘
//! ```
//!
//! Acquisition and capture failures are never fatal; the reader waits one
//! polling interval and goes back to `Searching` for as long as the process
//! runs.
//!
//! # Cancellation
//!
//! The token is checked, with priority, around every locate, grab, key read
//! and polling wait.  It is *not* checked while a completed scan is being
//! handed off: once a scan has matched its boundary it always reaches the
//! sender.  A partial buffer is dropped on cancellation.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{DeviceIdentity, DeviceStatus, KeyMapper, Scan, ScanBuffer};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::application::capabilities::{DeviceLocator, KeystrokeSource};
use crate::application::dispatch::DispatchSender;

/// Delay between acquisition attempts when no settings are given.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(1000);

/// Tunables for a [`DeviceReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSettings {
    /// Wait between failed locate/grab attempts.
    pub polling_interval: Duration,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
        }
    }
}

/// What a reader did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderReport {
    /// Scans handed off to (and taken by) the sender.
    pub scans_emitted: u64,
    /// Number of times the device was successfully captured.
    pub sessions: u64,
}

enum ReaderState {
    Searching,
    Grabbing(Box<dyn KeystrokeSource>),
    Capturing(Box<dyn KeystrokeSource>),
}

/// Reads one configured scanner until cancelled.
pub struct DeviceReader {
    identity: DeviceIdentity,
    locator: Arc<dyn DeviceLocator>,
    settings: ReaderSettings,
    status: watch::Sender<DeviceStatus>,
}

impl DeviceReader {
    /// Creates a reader for `identity`.  Nothing happens until [`run`](Self::run).
    pub fn new(
        identity: DeviceIdentity,
        locator: Arc<dyn DeviceLocator>,
        settings: ReaderSettings,
    ) -> Self {
        let (status, _) = watch::channel(DeviceStatus::default());
        Self {
            identity,
            locator,
            settings,
            status,
        }
    }

    /// A live view of this reader's device status.
    pub fn status(&self) -> watch::Receiver<DeviceStatus> {
        self.status.subscribe()
    }

    /// Runs the reader until `cancel` fires or the dispatch path closes.
    pub async fn run(self, dispatch: DispatchSender, cancel: CancellationToken) -> ReaderReport {
        let span = info_span!("reader", device = %self.identity.id());
        self.read_loop(dispatch, cancel).instrument(span).await
    }

    async fn read_loop(self, dispatch: DispatchSender, cancel: CancellationToken) -> ReaderReport {
        let mut buffer = ScanBuffer::new(self.identity.boundary().clone());
        let mut report = ReaderReport::default();
        let mut state = ReaderState::Searching;
        let (vendor_id, product_id) = (self.identity.vendor_id(), self.identity.product_id());

        info!("searching for {vendor_id:04x}:{product_id:04x}");

        loop {
            state = match state {
                ReaderState::Searching => {
                    let located = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        located = self.locator.locate(vendor_id, product_id) => Some(located),
                    };
                    let Some(located) = located else { break };

                    match located {
                        Ok(source) => ReaderState::Grabbing(source),
                        Err(e) => {
                            debug!("device not available: {e}");
                            if !self.pause(&cancel).await {
                                break;
                            }
                            ReaderState::Searching
                        }
                    }
                }

                ReaderState::Grabbing(mut source) => {
                    let grabbed = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        grabbed = source.grab() => Some(grabbed),
                    };
                    let Some(grabbed) = grabbed else { break };

                    match grabbed {
                        Ok(()) => {
                            report.sessions += 1;
                            self.status.send_modify(|s| s.connected = true);
                            info!("device captured");
                            ReaderState::Capturing(source)
                        }
                        Err(e) => {
                            warn!("could not capture device: {e}");
                            drop(source);
                            if !self.pause(&cancel).await {
                                break;
                            }
                            ReaderState::Searching
                        }
                    }
                }

                ReaderState::Capturing(mut source) => {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        next = source.next_key() => Some(next),
                    };
                    let Some(next) = next else { break };

                    match next {
                        Ok(Some(code)) => {
                            if let Some(content) = buffer.push(KeyMapper::key_to_text(code)) {
                                let scan = Scan::now(self.identity.id(), content);
                                let timestamp = scan.timestamp;
                                info!(code = %scan.printable_content(), "scan complete");

                                if dispatch.hand_off(scan).await.is_err() {
                                    warn!("dispatch path closed; reader stopping");
                                    break;
                                }
                                report.scans_emitted += 1;
                                self.status.send_modify(|s| {
                                    s.scans += 1;
                                    s.last_scan_ts = Some(timestamp);
                                });
                            }
                            ReaderState::Capturing(source)
                        }
                        Ok(None) => ReaderState::Capturing(source),
                        Err(e) => {
                            warn!(
                                discarded = buffer.len(),
                                "device lost: {e}; searching again"
                            );
                            buffer.clear();
                            self.status.send_modify(|s| s.connected = false);
                            drop(source);
                            ReaderState::Searching
                        }
                    }
                }
            };
        }

        if !buffer.is_empty() {
            debug!(discarded = buffer.len(), "dropping partial scan on shutdown");
        }
        self.status.send_modify(|s| s.connected = false);
        info!(
            scans = report.scans_emitted,
            sessions = report.sessions,
            "reader stopped"
        );
        report
    }

    /// Waits one polling interval.  Returns `false` if cancelled first.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.settings.polling_interval) => true,
        }
    }
}
