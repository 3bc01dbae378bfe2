//! Command dispatcher: turns a command code into a reply payload.
//!
//! Handlers are pure functions of the pack state passed in through
//! [`HandlerContext`]. Multi-byte numbers are little-endian on the wire.
//! A code without a handler yields `None`, which the transaction layer
//! turns into an empty frame.

use crate::auth;
use crate::command::Command;
use crate::config::BatteryConfig;
use crate::constants::{placeholders, CHALLENGE_LEN, REPLY_CAPACITY};
use crate::registers::{BatteryMode, BatteryStatus};
use crate::sensors::SensorSource;
use crate::types::{PowerState, Reply};
use log::{debug, warn};

/// State visible to command handlers.
pub struct HandlerContext<'a> {
    pub config: &'a BatteryConfig,
    pub mode: &'a BatteryMode,
    pub status: &'a BatteryStatus,
    pub power_state: PowerState,
    pub sensors: &'a dyn SensorSource,
}

/// Build the reply for `code`. `data` holds the bytes the host wrote after
/// the command code.
pub fn dispatch(ctx: &HandlerContext<'_>, code: u8, data: &[u8]) -> Option<Reply> {
    let command = Command::from_code(code)?;
    let config = ctx.config;

    let reply = match command {
        Command::ManufacturerAccess => word(0x0000),
        Command::RemainingCapacityAlarm => word(placeholders::REMAINING_CAPACITY_ALARM),
        Command::RemainingTimeAlarm => word(placeholders::REMAINING_TIME_ALARM),
        Command::BatteryMode => word(ctx.mode.to_word()),
        Command::AtRate => word(0),
        Command::AtRateTimeToFull => word(0),
        Command::AtRateTimeToEmpty => word(placeholders::AT_RATE_TIME_TO_EMPTY),
        Command::AtRateOk => word(placeholders::AT_RATE_OK),
        Command::Temperature => word(ctx.sensors.temperature()),
        Command::Voltage => word(ctx.sensors.pack_voltage()),
        Command::Current | Command::AverageCurrent => signed_word(present_current(ctx)),
        Command::MaxError => word(0),
        Command::RelativeStateOfCharge | Command::AbsoluteStateOfCharge => {
            word(placeholders::STATE_OF_CHARGE)
        }
        Command::RemainingCapacity | Command::FullChargeCapacity => {
            word(config.full_charge_capacity())
        }
        Command::RunTimeToEmpty | Command::AverageTimeToEmpty => {
            word(placeholders::TIME_TO_EMPTY)
        }
        Command::AverageTimeToFull => word(placeholders::TIME_TO_FULL),
        Command::ChargingCurrent => word(if charge_requested(ctx) {
            config.charge_current
        } else {
            0
        }),
        Command::ChargingVoltage => word(if charge_requested(ctx) {
            config.charge_voltage
        } else {
            0
        }),
        Command::BatteryStatus => word(ctx.status.to_word()),
        Command::CycleCount => word(config.cycle_count),
        Command::DesignCapacity => word(config.design_capacity()),
        Command::DesignVoltage => word(config.design_voltage),
        Command::SpecificationInfo => word(config.specification_info),
        Command::ManufactureDate => word(config.packed_manufacture_date()),
        Command::SerialNumber => word(config.serial_number),
        Command::ManufacturerName => block(config.manufacturer_name.as_bytes()),
        Command::DeviceName => block(config.device_name.as_bytes()),
        Command::DeviceChemistry => block(config.device_chemistry.as_bytes()),
        Command::ManufacturerData => block(&placeholders::MANUFACTURER_DATA),
        Command::Authenticate => block(&authenticate(config, data)),
        Command::Vendor30 => block(&placeholders::VENDOR_30),
        Command::Vendor35 => block(&placeholders::VENDOR_35),
        Command::Vendor37 => block(&placeholders::VENDOR_37),
        Command::Vendor3B => block(&placeholders::VENDOR_3B),
        Command::CellVoltage(index) => word(ctx.sensors.cell_voltage(index)),
        Command::AuthKeyWord(index) => {
            if !config.auth_key_readback {
                debug!("Key read-back disabled, ignoring {:#04x}", code);
                return None;
            }
            block(&auth::key_word(&config.auth_key, index)?)
        }
    };

    Some(reply)
}

/// Current through the pack: one cell's capacity in the direction of flow
fn present_current(ctx: &HandlerContext<'_>) -> i16 {
    let magnitude = ctx.config.max_discharge_rate().min(i16::MAX as u16) as i16;
    match ctx.power_state {
        PowerState::Charging => magnitude,
        PowerState::Discharging => -magnitude,
        PowerState::Idling => 0,
    }
}

fn charge_requested(ctx: &HandlerContext<'_>) -> bool {
    ctx.status.can_charge() && ctx.power_state == PowerState::Charging
}

fn authenticate(config: &BatteryConfig, data: &[u8]) -> auth::Response {
    let mut challenge = [0u8; CHALLENGE_LEN];
    let available = data.len().min(CHALLENGE_LEN);
    if available < CHALLENGE_LEN {
        warn!(
            "Authentication challenge is {} bytes, padding to {}",
            available, CHALLENGE_LEN
        );
    }
    challenge[..available].copy_from_slice(&data[..available]);
    auth::authenticate(&config.auth_key, &challenge)
}

fn word(value: u16) -> Reply {
    block(&value.to_le_bytes())
}

fn signed_word(value: i16) -> Reply {
    block(&value.to_le_bytes())
}

fn block(bytes: &[u8]) -> Reply {
    let mut reply = Reply::new();
    let take = bytes.len().min(REPLY_CAPACITY);
    reply.extend_from_slice(&bytes[..take]).ok();
    reply
}
