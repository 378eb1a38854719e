//! Scripted keystroke sources for testing.
//!
//! Lets tests play back exact key sequences, idle gaps, and unplug events
//! without real hardware.  Each call to [`ScriptedLocator::locate`] consumes
//! one queued *session* (one plug-in of the device).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::capabilities::{
    DeviceDescriptor, DeviceLocator, KeystrokeSource, SourceError,
};

/// How long an idle step (or an exhausted script) waits before reporting
/// "no key".
const IDLE_WINDOW: Duration = Duration::from_millis(1);

/// One scripted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    /// A key-down with this code.
    Key(u16),
    /// One empty poll window.
    Idle,
    /// Sleep before moving on to the next step.
    Delay(Duration),
    /// The device is unplugged; every later read fails too.
    Disconnect,
}

/// A [`DeviceLocator`] that hands out queued scripted sessions.
#[derive(Default)]
pub struct ScriptedLocator {
    sessions: Mutex<VecDeque<Vec<ScriptStep>>>,
    devices: Mutex<Vec<DeviceDescriptor>>,
    failing_locates: AtomicU32,
    failing_grabs: AtomicU32,
    locate_calls: AtomicUsize,
}

impl ScriptedLocator {
    /// Creates a locator with no sessions queued; `locate` reports not-found.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a session.  Sessions are handed out in FIFO order.
    pub fn push_session(&self, steps: Vec<ScriptStep>) {
        lock(&self.sessions).push_back(steps);
    }

    /// Adds an entry to what [`DeviceLocator::list_devices`] reports.
    pub fn add_device(&self, descriptor: DeviceDescriptor) {
        lock(&self.devices).push(descriptor);
    }

    /// Makes the next `n` locate calls fail with [`SourceError::Busy`]
    /// without consuming a session.
    pub fn fail_next_locates(&self, n: u32) {
        self.failing_locates.store(n, Ordering::SeqCst);
    }

    /// Makes the sources returned by the next `n` successful locates fail
    /// their grab.
    pub fn fail_next_grabs(&self, n: u32) {
        self.failing_grabs.store(n, Ordering::SeqCst);
    }

    /// Number of `locate` calls so far.
    pub fn locate_calls(&self) -> usize {
        self.locate_calls.load(Ordering::SeqCst)
    }

    /// Number of sessions still queued.
    pub fn pending_sessions(&self) -> usize {
        lock(&self.sessions).len()
    }
}

#[async_trait]
impl DeviceLocator for ScriptedLocator {
    async fn locate(
        &self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<Box<dyn KeystrokeSource>, SourceError> {
        self.locate_calls.fetch_add(1, Ordering::SeqCst);

        if take_one(&self.failing_locates) {
            return Err(SourceError::Busy("scripted locate failure".to_string()));
        }

        let steps = lock(&self.sessions)
            .pop_front()
            .ok_or(SourceError::NotFound {
                vendor_id,
                product_id,
            })?;

        Ok(Box::new(ScriptedSource {
            steps: steps.into(),
            fail_grab: take_one(&self.failing_grabs),
            disconnected: false,
        }))
    }

    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, SourceError> {
        Ok(lock(&self.devices).clone())
    }
}

/// One scripted device session.
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
    fail_grab: bool,
    disconnected: bool,
}

impl ScriptedSource {
    /// A stand-alone source that plays `steps` and grabs successfully.
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: steps.into(),
            fail_grab: false,
            disconnected: false,
        }
    }
}

#[async_trait]
impl KeystrokeSource for ScriptedSource {
    async fn grab(&mut self) -> Result<(), SourceError> {
        if self.fail_grab {
            return Err(SourceError::Busy("scripted grab failure".to_string()));
        }
        Ok(())
    }

    async fn next_key(&mut self) -> Result<Option<u16>, SourceError> {
        loop {
            if self.disconnected {
                return Err(SourceError::Disconnected);
            }
            match self.steps.pop_front() {
                Some(ScriptStep::Key(code)) => return Ok(Some(code)),
                Some(ScriptStep::Delay(d)) => tokio::time::sleep(d).await,
                Some(ScriptStep::Disconnect) => self.disconnected = true,
                Some(ScriptStep::Idle) | None => {
                    tokio::time::sleep(IDLE_WINDOW).await;
                    return Ok(None);
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decrements `counter` if it is positive; returns whether it did.
fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
