//! barcode-relay entry point.
//!
//! Reads keystrokes from USB barcode scanners, rebuilds each barcode from its
//! keystrokes, and appends it to a Redis stream.
//!
//! # Usage
//!
//! ```text
//! barcode-relay [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Configuration file [default: config/config.toml]
//!   --list            Print the attached keystroke devices and exit
//! ```
//!
//! The config path can also be set with `BARCODE_RELAY_CONFIG`.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config() → RelayConfig::plan()
//!  └─ Relay::start()
//!       ├─ DeviceReader × N  (evdev sources)
//!       ├─ ScanSender        (target sink)
//!       └─ Heartbeat         (optional heartbeat sink)
//!  └─ Ctrl-C → RunningRelay::shutdown()
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use relay_agent::application::lifecycle::Relay;
use relay_agent::infrastructure::keystroke_source::platform_locator;
use relay_agent::infrastructure::sink::build_sink;
use relay_agent::infrastructure::storage::config::load_config;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Barcode scanner keystroke relay.
#[derive(Debug, Parser)]
#[command(
    name = "barcode-relay",
    about = "Relays barcode scanner keystrokes into a Redis stream",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        long,
        default_value = "config/config.toml",
        env = "BARCODE_RELAY_CONFIG"
    )]
    config: PathBuf,

    /// List the attached keystroke devices (path, vendor:product, name) and exit.
    #[arg(long)]
    list: bool,
}

/// Initialises `tracing`.  `RUST_LOG` wins over the configured level.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn list_devices() -> anyhow::Result<()> {
    let devices = platform_locator()
        .list_devices()
        .await
        .context("failed to enumerate input devices")?;

    if devices.is_empty() {
        println!("no keystroke devices found (reading /dev/input usually needs root or the input group)");
    }
    for device in devices {
        println!(
            "{}\t{:04x}:{:04x}\t{}",
            device.path, device.vendor_id, device.product_id, device.name
        );
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list {
        init_logging("warn");
        return list_devices().await;
    }

    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    init_logging(&config.log_level);

    let plan = config.plan().context("invalid configuration")?;
    info!(
        relay = %plan.relay_id,
        devices = plan.devices.len(),
        "barcode-relay starting"
    );

    #[cfg(not(target_os = "linux"))]
    warn!("no keystroke source for this platform; readers will idle");

    let scan_sink = build_sink(&config.target.sink);
    let heartbeat_sink = config.heartbeat.as_ref().map(|hb| build_sink(&hb.sink));
    info!(target_sink = %scan_sink.describe(), "delivering to {}", plan.scan_stream);

    let relay = Relay::start(plan, platform_locator(), scan_sink, heartbeat_sink);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;
    info!("interrupt received; draining pending scans (Ctrl+C again to abandon them)");

    tokio::select! {
        report = relay.shutdown() => {
            if report.scans_delivered < report.scans_emitted {
                warn!(
                    emitted = report.scans_emitted,
                    delivered = report.scans_delivered,
                    "some scans were not confirmed delivered"
                );
            }
            info!(
                emitted = report.scans_emitted,
                delivered = report.scans_delivered,
                heartbeats = report.heartbeats_sent,
                "barcode-relay stopped"
            );
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            error!("second interrupt: exiting with undelivered scans; they are lost");
            anyhow::bail!("shutdown interrupted before all scans were delivered")
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_run_mode_with_default_config() {
        // Arrange / Act
        let cli = Cli::parse_from(["barcode-relay"]);

        // Assert
        assert!(!cli.list);
        assert_eq!(cli.config, PathBuf::from("config/config.toml"));
    }

    #[test]
    fn test_cli_accepts_list_and_config_path() {
        // Arrange / Act
        let cli = Cli::parse_from(["barcode-relay", "--list", "--config", "/etc/relay.toml"]);

        // Assert
        assert!(cli.list);
        assert_eq!(cli.config, PathBuf::from("/etc/relay.toml"));
    }
}
