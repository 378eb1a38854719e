//! Keystroke source infrastructure.
//!
//! On Linux, scanners are read straight from their evdev nodes under
//! `/dev/input` through the `evdev` crate and grabbed, so scanned text never
//! reaches the console or a desktop session.  Windows and macOS builds fall
//! back to [`UnsupportedLocator`].
//!
//! # Testability
//!
//! The `DeviceLocator` / `KeystrokeSource` traits let tests drive the device
//! readers with [`mock::ScriptedLocator`] instead of real hardware.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::capabilities::{
    DeviceDescriptor, DeviceLocator, KeystrokeSource, SourceError,
};

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

/// Locator for platforms without a keystroke source implementation.
///
/// Every call fails with [`SourceError::UnsupportedPlatform`]; readers treat
/// that like an absent device and keep polling.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedLocator;

#[async_trait]
impl DeviceLocator for UnsupportedLocator {
    async fn locate(
        &self,
        _vendor_id: u16,
        _product_id: u16,
    ) -> Result<Box<dyn KeystrokeSource>, SourceError> {
        Err(SourceError::UnsupportedPlatform(std::env::consts::OS))
    }

    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, SourceError> {
        Err(SourceError::UnsupportedPlatform(std::env::consts::OS))
    }
}

/// Returns the locator for the platform this binary was built for.
pub fn platform_locator() -> Arc<dyn DeviceLocator> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(linux::EvdevLocator)
    }

    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(UnsupportedLocator)
    }
}
