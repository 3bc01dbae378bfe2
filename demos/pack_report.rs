//! Pack Report Example
//!
//! Reads every standard command from an emulated pack and prints the
//! result, first formatted and then as JSON.
//!
//! Usage:
//!   cargo run --example pack_report                  # Default pack
//!   cargo run --example pack_report -- pack.json     # Custom pack
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example pack_report

use log::{error, info};
use open_smart_battery::{BatteryConfig, HostBus, Result, SmartBattery};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => BatteryConfig::from_file(&path)?,
        None => BatteryConfig::default(),
    };
    info!("Emulating {} {}", config.manufacturer_name, config.device_name);

    let mut host = HostBus::new(SmartBattery::new(config)?);

    info!("=== Pack Report ===");
    if let Err(e) = host.print_pack_report() {
        error!("Failed to generate pack report: {}", e);
        return Err(e);
    }

    info!("=== JSON Export ===");
    let report = host.pack_report()?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
