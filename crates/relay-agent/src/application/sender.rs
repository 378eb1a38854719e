//! ScanSender: at-least-once delivery of every scan on the dispatch path.
//!
//! The sender holds at most one scan at a time.  A scan is retried with a
//! fixed backoff until the sink accepts it; only then is the next one taken.
//! Since a reader cannot emit again until its previous scan is taken, this
//! keeps per-device order end to end.
//!
//! The sender has no cancellation input.  It stops when the dispatch path is
//! closed and empty, which the lifecycle coordinator arranges only after
//! every reader has exited.
//!
//! Duplicates are possible: if the sink stores a record but the
//! acknowledgement is lost, the retry appends it again.

use std::sync::Arc;
use std::time::Duration;

use relay_core::Scan;
use tracing::{info, info_span, warn, Instrument};

use crate::application::capabilities::MessageSink;
use crate::application::dispatch::DispatchReceiver;

/// Backoff between delivery attempts when no settings are given.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(5000);

/// Tunables for a [`ScanSender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderSettings {
    /// Wait after a failed delivery before retrying the same scan.
    pub retry_interval: Duration,
}

impl Default for SenderSettings {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// What the sender did before the dispatch path closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderReport {
    pub delivered: u64,
    pub failed_attempts: u64,
}

enum SenderState {
    AwaitingScan,
    Delivering { scan: Scan, attempt: u32 },
}

/// Delivers scans from the dispatch path to a [`MessageSink`].
pub struct ScanSender {
    relay_id: String,
    stream: String,
    sink: Arc<dyn MessageSink>,
    settings: SenderSettings,
}

impl ScanSender {
    pub fn new(
        relay_id: impl Into<String>,
        stream: impl Into<String>,
        sink: Arc<dyn MessageSink>,
        settings: SenderSettings,
    ) -> Self {
        Self {
            relay_id: relay_id.into(),
            stream: stream.into(),
            sink,
            settings,
        }
    }

    /// Drains `receiver` until it is closed and empty.
    pub async fn run(self, receiver: DispatchReceiver) -> SenderReport {
        let span = info_span!("sender", sink = %self.sink.describe());
        self.deliver_loop(receiver).instrument(span).await
    }

    async fn deliver_loop(self, mut receiver: DispatchReceiver) -> SenderReport {
        let mut report = SenderReport::default();
        let mut state = SenderState::AwaitingScan;

        loop {
            state = match state {
                SenderState::AwaitingScan => match receiver.take().await {
                    Some(scan) => SenderState::Delivering { scan, attempt: 1 },
                    None => break,
                },

                SenderState::Delivering { scan, attempt } => {
                    let record = scan.to_record(&self.relay_id);
                    match self.sink.append(&self.stream, &record).await {
                        Ok(()) => {
                            report.delivered += 1;
                            info!(
                                device = %scan.device_id,
                                code = %scan.printable_content(),
                                attempt,
                                "scan delivered"
                            );
                            SenderState::AwaitingScan
                        }
                        Err(e) => {
                            report.failed_attempts += 1;
                            warn!(
                                device = %scan.device_id,
                                attempt,
                                "delivery failed: {e}; retrying in {:?}",
                                self.settings.retry_interval
                            );
                            tokio::time::sleep(self.settings.retry_interval).await;
                            SenderState::Delivering {
                                scan,
                                attempt: attempt + 1,
                            }
                        }
                    }
                }
            };
        }

        info!(
            delivered = report.delivered,
            failed_attempts = report.failed_attempts,
            "dispatch path closed; sender stopped"
        );
        report
    }
}
