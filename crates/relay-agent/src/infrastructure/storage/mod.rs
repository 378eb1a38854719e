//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML file named on the command line,
//! validates it, and turns it into the `RelayPlan` the lifecycle coordinator
//! consumes.

pub mod config;
