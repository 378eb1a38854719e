//! Heartbeat: periodic, best-effort liveness records.
//!
//! Runs independently of the scan pipeline.  Every tick builds a fresh
//! [`HeartbeatRecord`] (uptime plus a snapshot of each reader's status) and
//! appends it once.  A failed append is logged and forgotten; the next tick
//! carries on as usual.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use relay_core::{unix_timestamp, DeviceStatus, HeartbeatRecord};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::application::capabilities::MessageSink;

/// Smallest interval accepted; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What the heartbeat did before it was cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatReport {
    pub sent: u64,
    pub failed: u64,
}

/// Periodic liveness emitter.
pub struct Heartbeat {
    relay_id: String,
    stream: String,
    sink: Arc<dyn MessageSink>,
    interval: Duration,
    started_at: Instant,
    devices: Vec<(String, watch::Receiver<DeviceStatus>)>,
}

impl Heartbeat {
    pub fn new(
        relay_id: impl Into<String>,
        stream: impl Into<String>,
        sink: Arc<dyn MessageSink>,
        interval: Duration,
        started_at: Instant,
        devices: Vec<(String, watch::Receiver<DeviceStatus>)>,
    ) -> Self {
        Self {
            relay_id: relay_id.into(),
            stream: stream.into(),
            sink,
            interval: interval.max(MIN_INTERVAL),
            started_at,
            devices,
        }
    }

    /// Builds the record for the current instant.
    pub fn snapshot(&self) -> HeartbeatRecord {
        let devices: BTreeMap<String, DeviceStatus> = self
            .devices
            .iter()
            .map(|(id, status)| (id.clone(), *status.borrow()))
            .collect();
        HeartbeatRecord {
            relay_id: self.relay_id.clone(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            devices,
            timestamp: unix_timestamp(),
        }
    }

    /// Emits one record per interval until `cancel` fires.
    ///
    /// The first record is sent one full interval after the call.
    pub async fn run(self, cancel: CancellationToken) -> HeartbeatReport {
        let span = info_span!("heartbeat", sink = %self.sink.describe());
        self.tick_loop(cancel).instrument(span).await
    }

    async fn tick_loop(self, cancel: CancellationToken) -> HeartbeatReport {
        let mut report = HeartbeatReport::default();
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.interval, "heartbeat started");

        loop {
            let ticked = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = ticker.tick() => true,
            };
            if !ticked {
                break;
            }

            let record = self.snapshot();
            match self.sink.append(&self.stream, &record.to_record()).await {
                Ok(()) => {
                    report.sent += 1;
                    debug!(uptime = record.uptime_secs, "heartbeat sent");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("heartbeat delivery failed: {e}");
                }
            }
        }

        info!(sent = report.sent, failed = report.failed, "heartbeat stopped");
        report
    }
}
