//! Lifecycle coordinator: ordered startup and loss-free shutdown.
//!
//! # Startup
//!
//! ```text
//! Relay::start(plan)
//!  ├─ DeviceReader × N   (one task each, sharing one dispatch path)
//!  ├─ ScanSender         (single consumer of the dispatch path)
//!  └─ Heartbeat          (optional, independent)
//! ```
//!
//! # Shutdown
//!
//! The order below is what guarantees that no completed scan is lost:
//!
//! 1. Cancel the shared token (readers and heartbeat observe it).
//! 2. Join every reader.  A reader blocked in a hand-off finishes it first.
//! 3. Drop the coordinator's own [`DispatchSender`]; with every reader gone
//!    the dispatch path is now closed.
//! 4. Await the sender, which drains what is left and then stops.
//! 5. Await the heartbeat.
//!
//! Closing the path before step 2 completes could strand a scan that a
//! reader had already matched, so the steps are never reordered.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{DeviceIdentity, DeviceStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::capabilities::{DeviceLocator, MessageSink};
use crate::application::device_reader::{DeviceReader, ReaderReport, ReaderSettings};
use crate::application::dispatch::{scan_dispatch, DispatchSender};
use crate::application::heartbeat::{Heartbeat, HeartbeatReport};
use crate::application::sender::{ScanSender, SenderReport, SenderSettings};

/// Heartbeat part of a [`RelayPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatPlan {
    pub stream: String,
    pub interval: Duration,
}

/// Everything the coordinator needs to start the pipeline.
#[derive(Debug, Clone)]
pub struct RelayPlan {
    pub relay_id: String,
    pub devices: Vec<DeviceIdentity>,
    pub reader: ReaderSettings,
    pub sender: SenderSettings,
    /// Stream that scans are appended to.
    pub scan_stream: String,
    pub heartbeat: Option<HeartbeatPlan>,
}

/// Totals collected during shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Scans handed off by all readers together.
    pub scans_emitted: u64,
    pub scans_delivered: u64,
    pub heartbeats_sent: u64,
    pub heartbeats_failed: u64,
}

/// Entry point for starting the pipeline.
pub struct Relay;

impl Relay {
    /// Starts readers, then the sender, then the heartbeat (if planned).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        plan: RelayPlan,
        locator: Arc<dyn DeviceLocator>,
        scan_sink: Arc<dyn MessageSink>,
        heartbeat_sink: Option<Arc<dyn MessageSink>>,
    ) -> RunningRelay {
        let started_at = Instant::now();
        let cancel = CancellationToken::new();
        let (dispatch, receiver) = scan_dispatch();

        let mut readers = Vec::with_capacity(plan.devices.len());
        let mut statuses = Vec::with_capacity(plan.devices.len());
        for identity in plan.devices {
            let id = identity.id().to_string();
            let reader = DeviceReader::new(identity, Arc::clone(&locator), plan.reader);
            statuses.push((id.clone(), reader.status()));
            let handle = tokio::spawn(reader.run(dispatch.clone(), cancel.clone()));
            readers.push((id, handle));
        }
        info!(readers = readers.len(), "device readers started");

        let sender = ScanSender::new(
            plan.relay_id.clone(),
            plan.scan_stream,
            scan_sink,
            plan.sender,
        );
        let sender = tokio::spawn(sender.run(receiver));

        let heartbeat = match (plan.heartbeat, heartbeat_sink) {
            (Some(hb), Some(sink)) => {
                let heartbeat = Heartbeat::new(
                    plan.relay_id.clone(),
                    hb.stream,
                    sink,
                    hb.interval,
                    started_at,
                    statuses.clone(),
                );
                Some(tokio::spawn(heartbeat.run(cancel.clone())))
            }
            (Some(_), None) => {
                warn!("heartbeat configured without a sink; not starting it");
                None
            }
            (None, _) => None,
        };

        info!(relay = %plan.relay_id, "relay running");

        RunningRelay {
            cancel,
            dispatch,
            readers,
            sender,
            heartbeat,
            statuses,
        }
    }
}

/// Handle to a started pipeline.
pub struct RunningRelay {
    cancel: CancellationToken,
    dispatch: DispatchSender,
    readers: Vec<(String, JoinHandle<ReaderReport>)>,
    sender: JoinHandle<SenderReport>,
    heartbeat: Option<JoinHandle<HeartbeatReport>>,
    statuses: Vec<(String, watch::Receiver<DeviceStatus>)>,
}

impl RunningRelay {
    /// The process-wide cancellation token shared by readers and heartbeat.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Live status of each reader, keyed by device id.
    pub fn device_statuses(&self) -> &[(String, watch::Receiver<DeviceStatus>)] {
        &self.statuses
    }

    /// Runs the shutdown protocol and returns the pipeline totals.
    ///
    /// Resolves only after the sender has delivered every scan a reader
    /// emitted.  If the sink stays unreachable this waits indefinitely.
    pub async fn shutdown(self) -> ShutdownReport {
        let RunningRelay {
            cancel,
            dispatch,
            readers,
            sender,
            heartbeat,
            ..
        } = self;
        let mut report = ShutdownReport::default();

        info!("shutdown: cancelling readers");
        cancel.cancel();

        for (device, handle) in readers {
            match handle.await {
                Ok(r) => report.scans_emitted += r.scans_emitted,
                Err(e) => error!(device = %device, "reader task failed: {e}"),
            }
        }

        // Last sender handle: the path closes here.
        drop(dispatch);
        info!(
            emitted = report.scans_emitted,
            "shutdown: readers stopped, draining sender"
        );

        match sender.await {
            Ok(r) => report.scans_delivered = r.delivered,
            Err(e) => error!("sender task failed: {e}"),
        }

        if let Some(handle) = heartbeat {
            match handle.await {
                Ok(r) => {
                    report.heartbeats_sent = r.sent;
                    report.heartbeats_failed = r.failed;
                }
                Err(e) => error!("heartbeat task failed: {e}"),
            }
        }

        info!(
            emitted = report.scans_emitted,
            delivered = report.scans_delivered,
            "shutdown complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use relay_core::SinkRecord;

    use crate::application::capabilities::SinkError;
    use crate::infrastructure::keystroke_source::mock::{ScriptStep, ScriptedLocator};

    const KEY_1: u16 = 2;
    const KEY_ENTER: u16 = 28;

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<(String, SinkRecord)>>,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn append(&self, stream: &str, record: &SinkRecord) -> Result<(), SinkError> {
            self.records
                .lock()
                .unwrap()
                .push((stream.to_string(), record.clone()));
            Ok(())
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn plan(devices: Vec<DeviceIdentity>, heartbeat: Option<HeartbeatPlan>) -> RelayPlan {
        RelayPlan {
            relay_id: "relay-01".to_string(),
            devices,
            reader: ReaderSettings {
                polling_interval: Duration::from_millis(5),
            },
            sender: SenderSettings {
                retry_interval: Duration::from_millis(5),
            },
            scan_stream: "scans".to_string(),
            heartbeat,
        }
    }

    fn identity(id: &str, pid: u16) -> DeviceIdentity {
        DeviceIdentity::new(id, 0x05e0, pid, r"^.*\n$").expect("valid identity")
    }

    #[tokio::test]
    async fn test_start_and_shutdown_delivers_emitted_scan() {
        // Arrange
        let locator = Arc::new(ScriptedLocator::new());
        locator.push_session(vec![ScriptStep::Key(KEY_1), ScriptStep::Key(KEY_ENTER)]);
        let sink = Arc::new(RecordingSink::default());
        let relay = Relay::start(
            plan(vec![identity("scanner-a", 0x1200)], None),
            locator,
            Arc::clone(&sink) as Arc<dyn MessageSink>,
            None,
        );
        let mut status = relay.device_statuses()[0].1.clone();
        status
            .wait_for(|s| s.scans == 1)
            .await
            .expect("status channel open");

        // Act
        let report = relay.shutdown().await;

        // Assert
        assert_eq!(report.scans_emitted, 1);
        assert_eq!(report.scans_delivered, 1);
        let records = sink.records.lock().unwrap();
        assert_eq!(records[0].0, "scans");
        assert_eq!(records[0].1.get("code"), Some("1\n"));
        assert_eq!(records[0].1.get("relay"), Some("relay-01"));
    }

    #[tokio::test]
    async fn test_shutdown_with_no_scans_reports_zero() {
        // Arrange
        let locator = Arc::new(ScriptedLocator::new());
        let sink = Arc::new(RecordingSink::default());
        let relay = Relay::start(
            plan(vec![identity("scanner-a", 0x1200), identity("scanner-b", 0x1201)], None),
            locator,
            sink,
            None,
        );

        // Act
        let report = relay.shutdown().await;

        // Assert
        assert_eq!(report, ShutdownReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_runs_on_its_own_sink_until_shutdown() {
        // Arrange
        let locator = Arc::new(ScriptedLocator::new());
        let scan_sink = Arc::new(RecordingSink::default());
        let heartbeat_sink = Arc::new(RecordingSink::default());
        let relay = Relay::start(
            plan(
                vec![identity("scanner-a", 0x1200)],
                Some(HeartbeatPlan {
                    stream: "heartbeats".to_string(),
                    interval: Duration::from_secs(1),
                }),
            ),
            locator,
            Arc::clone(&scan_sink) as Arc<dyn MessageSink>,
            Some(Arc::clone(&heartbeat_sink) as Arc<dyn MessageSink>),
        );

        // Act
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let report = relay.shutdown().await;

        // Assert
        assert_eq!(report.heartbeats_sent, 2);
        assert_eq!(report.heartbeats_failed, 0);
        let beats = heartbeat_sink.records.lock().unwrap();
        assert!(beats.iter().all(|(stream, _)| stream == "heartbeats"));
        assert!(scan_sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_token_is_shared_with_tasks() {
        // Arrange
        let locator = Arc::new(ScriptedLocator::new());
        let relay = Relay::start(
            plan(vec![identity("scanner-a", 0x1200)], None),
            locator,
            Arc::new(RecordingSink::default()),
            None,
        );
        let token = relay.cancellation_token();

        // Act
        let report = relay.shutdown().await;

        // Assert
        assert!(token.is_cancelled());
        assert_eq!(report.scans_delivered, 0);
    }
}
