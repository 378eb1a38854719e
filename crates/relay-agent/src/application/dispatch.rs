//! Rendezvous handoff from the device readers to the sender.
//!
//! # Why not a plain channel?
//!
//! A buffered channel would let readers run ahead of a stalled sink and pile
//! scans up in memory.  Here a hand-off completes only once the sender has
//! *taken* the scan, so a stuck delivery stalls every reader instead.
//!
//! tokio has no zero-capacity channel, so the rendezvous is built from a
//! one-slot `mpsc` carrying the scan together with a `oneshot` acknowledgement:
//!
//! ```text
//! reader                         sender
//!   hand_off(scan)
//!     ├─ mpsc.send(Handoff) ──▶    take()
//!     │                              ├─ mpsc.recv()
//!     └─ await ack  ◀──────────────  └─ ack.send(())
//! ```
//!
//! The path closes when every [`DispatchSender`] has been dropped.

use relay_core::Scan;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// The receiving side went away before the scan was taken.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("dispatch path is closed")]
pub struct DispatchClosed;

struct Handoff {
    scan: Scan,
    accepted: oneshot::Sender<()>,
}

/// Creates a connected sender/receiver pair.
pub fn scan_dispatch() -> (DispatchSender, DispatchReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (DispatchSender { tx }, DispatchReceiver { rx })
}

/// Reader side of the dispatch path.  One clone per reader.
#[derive(Clone)]
pub struct DispatchSender {
    tx: mpsc::Sender<Handoff>,
}

impl DispatchSender {
    /// Hands `scan` to the sender, resolving only once it has been taken.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchClosed`] if the receiver was dropped.
    pub async fn hand_off(&self, scan: Scan) -> Result<(), DispatchClosed> {
        let (accepted, ack) = oneshot::channel();
        self.tx
            .send(Handoff { scan, accepted })
            .await
            .map_err(|_| DispatchClosed)?;
        ack.await.map_err(|_| DispatchClosed)
    }
}

/// Sender side of the dispatch path.
pub struct DispatchReceiver {
    rx: mpsc::Receiver<Handoff>,
}

impl DispatchReceiver {
    /// Takes the next scan, releasing the reader that handed it off.
    ///
    /// Returns `None` once every [`DispatchSender`] is dropped and nothing is
    /// left on the path.
    pub async fn take(&mut self) -> Option<Scan> {
        let Handoff { scan, accepted } = self.rx.recv().await?;
        // The reader is still awaiting this; it only stops waiting by being
        // dropped, in which case there is no one to release.
        let _ = accepted.send(());
        Some(scan)
    }
}
