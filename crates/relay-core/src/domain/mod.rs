//! Domain entities for Barcode Relay.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: nothing here touches a device, a socket, or a clock other
//! than the wall-clock timestamp attached to a scan.
//!
//! - [`device`] – the immutable identity of one configured scanner.
//! - [`scan`] – the character buffer with boundary detection, and the scan it
//!   produces.
//! - [`heartbeat`] – per-device status and the liveness record built from it.

pub mod device;
pub mod heartbeat;
pub mod scan;
