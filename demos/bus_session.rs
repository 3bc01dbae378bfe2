//! Bus Session Example
//!
//! Runs a pack the way firmware would: bus callbacks and a supervisory task
//! share one battery, while a host thread issues commands against it.
//! - Optional pack configuration from a JSON file
//! - Word, block and write transactions
//! - Challenge/response authentication
//! - Alarm mode set by the host and cleared by the supervisor
//!
//! Usage:
//!   cargo run --example bus_session                  # Default pack
//!   cargo run --example bus_session -- pack.json     # Custom pack
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example bus_session

use log::{error, info};
use open_smart_battery::auth::Challenge;
use open_smart_battery::constants::commands;
use open_smart_battery::registers::mode_bits;
use open_smart_battery::{BatteryConfig, HostBus, PowerState, Result, SharedBattery, SmartBattery};
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading pack configuration from {}", path);
            BatteryConfig::from_file(&path)?
        }
        None => BatteryConfig::default(),
    };

    let battery = SharedBattery::new(SmartBattery::new(config)?);

    thread::scope(|scope| -> Result<()> {
        scope.spawn(|| battery.supervise_for(Duration::from_secs(2)));

        let mut host = HostBus::new(&battery);

        info!("=== Identity ===");
        info!("Manufacturer: {}", host.read_string(commands::MANUFACTURER_NAME)?);
        info!("Device: {}", host.read_string(commands::DEVICE_NAME)?);
        info!("Chemistry: {}", host.read_string(commands::DEVICE_CHEMISTRY)?);
        info!("Serial: {}", host.read_word(commands::SERIAL_NUMBER)?);

        info!("=== Discharge ===");
        battery.with(|pack| pack.set_power_state(PowerState::Discharging));
        info!("Current: {} mA", host.read_signed_word(commands::CURRENT)?);

        info!("=== Authentication ===");
        let challenge: Challenge = core::array::from_fn(|i| (i as u8).wrapping_mul(37));
        let digest = host.authenticate(&challenge)?;
        info!("Digest: {:02x?}", digest);

        info!("=== Unimplemented command ===");
        match host.read_word(0x1D) {
            Ok(value) => error!("Unexpected reply: {:#06x}", value),
            Err(e) => info!("No reply, as expected: {}", e),
        }

        info!("=== Alarm mode ===");
        host.write_word(commands::BATTERY_MODE, mode_bits::ALARM_MODE);
        info!("BatteryMode: {:#06x}", host.read_word(commands::BATTERY_MODE)?);
        Ok(())
    })?;

    let alarm_mode = battery.with(|pack| pack.mode().alarm_mode);
    info!("Alarm mode after session: {} (clears 30 s after set)", alarm_mode);
    info!("=== Session Complete ===");

    Ok(())
}
