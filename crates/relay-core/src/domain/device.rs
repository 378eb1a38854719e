//! Configured device identity.

use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Error type for domain construction.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The boundary pattern of a device is not a valid regular expression.
    #[error("invalid boundary pattern for device {device}: {source}")]
    InvalidPattern {
        device: String,
        #[source]
        source: regex::Error,
    },
    /// A device was configured with an empty logical name.
    #[error("device id must not be empty")]
    EmptyDeviceId,
}

/// The identity of one configured physical scanner.
///
/// Immutable once built; one per `[[devices]]` entry in the configuration.
#[derive(Clone)]
pub struct DeviceIdentity {
    id: String,
    vendor_id: u16,
    product_id: u16,
    boundary: Regex,
}

impl DeviceIdentity {
    /// Builds an identity, compiling `pattern` as the scan boundary.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPattern`] if `pattern` does not compile and
    /// [`DomainError::EmptyDeviceId`] if `id` is blank.
    pub fn new(
        id: impl Into<String>,
        vendor_id: u16,
        product_id: u16,
        pattern: &str,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::EmptyDeviceId);
        }
        let boundary = Regex::new(pattern).map_err(|source| DomainError::InvalidPattern {
            device: id.clone(),
            source,
        })?;
        Ok(Self {
            id,
            vendor_id,
            product_id,
            boundary,
        })
    }

    /// Logical device name used in scan records and logs.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// USB vendor identifier.
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    /// USB product identifier.
    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// The compiled boundary pattern.
    pub fn boundary(&self) -> &Regex {
        &self.boundary
    }
}

impl fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceIdentity")
            .field("id", &self.id)
            .field("vendor_id", &format_args!("{:04x}", self.vendor_id))
            .field("product_id", &format_args!("{:04x}", self.product_id))
            .field("boundary", &self.boundary.as_str())
            .finish()
    }
}
