//! Bit-packed BatteryMode (0x03) and BatteryStatus (0x16) registers.
//!
//! Both registers are 16-bit words sent low byte first. Reserved bits are
//! never set.

use crate::config::BatteryConfig;
use crate::error::SbsError;

/// Split a word into `(high, low)` bytes
pub fn split_word(value: u16) -> (u8, u8) {
    ((value >> 8) as u8, (value & 0xFF) as u8)
}

/// Reassemble a word from `(high, low)` bytes
pub fn join_word(high: u8, low: u8) -> u16 {
    (high as u16) << 8 | low as u16
}

/// BatteryMode bit positions.
pub mod mode_bits {
    pub const INTERNAL_CHARGE_CONTROLLER: u16 = 1 << 0;
    pub const PRIMARY_BATTERY_SUPPORT: u16 = 1 << 1;
    pub const CONDITION_FLAG: u16 = 1 << 7;
    pub const CHARGE_CONTROLLER_ENABLED: u16 = 1 << 8;
    pub const PRIMARY_BATTERY: u16 = 1 << 9;
    pub const ALARM_MODE: u16 = 1 << 13;
    pub const CHARGER_MODE: u16 = 1 << 14;
    pub const CAPACITY_MODE: u16 = 1 << 15;

    /// Bits 2-6 and 10-12
    pub const RESERVED: u16 = 0b0001_1100_0111_1100;

    /// Bits the host may write
    pub const WRITABLE: u16 =
        CHARGE_CONTROLLER_ENABLED | PRIMARY_BATTERY | ALARM_MODE | CHARGER_MODE | CAPACITY_MODE;
}

/// BatteryStatus bit positions.
pub mod status_bits {
    pub const ERROR_CODE: u16 = 0x000F;
    pub const FULLY_DISCHARGED: u16 = 1 << 4;
    pub const FULLY_CHARGED: u16 = 1 << 5;
    pub const DISCHARGING: u16 = 1 << 6;
    pub const INITIALIZED: u16 = 1 << 7;
    pub const REMAINING_TIME_ALARM: u16 = 1 << 8;
    pub const REMAINING_CAPACITY_ALARM: u16 = 1 << 9;
    pub const TERMINATE_DISCHARGE_ALARM: u16 = 1 << 11;
    pub const OVER_TEMP_ALARM: u16 = 1 << 12;
    pub const TERMINATE_CHARGE_ALARM: u16 = 1 << 14;
    pub const OVER_CHARGED_ALARM: u16 = 1 << 15;

    /// Bits 10 and 13
    pub const RESERVED: u16 = (1 << 10) | (1 << 13);
}

/// Capacity and operating mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatteryMode {
    /// R/O: pack has its own charge controller (not just a protection circuit)
    pub internal_charge_controller: bool,
    /// R/O: pack can act as primary battery in a multi-battery system
    pub primary_battery_support: bool,
    /// R/O: pack requests a conditioning cycle
    pub condition_flag: bool,
    /// R/W: internal charge controller enabled
    pub charge_controller_enabled: bool,
    /// R/W: this pack is the sole battery in use
    pub primary_battery: bool,
    /// R/W: host handles alarms itself; cleared by the pack after 30 s
    pub alarm_mode: bool,
    /// R/W: host polls ChargingCurrent/ChargingVoltage
    pub charger_mode: bool,
    /// R/W: report capacity in 10 mW units instead of mA
    pub capacity_mode: bool,
}

impl BatteryMode {
    /// Power-on flags for a pack
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            internal_charge_controller: config.has_internal_charge_controller,
            primary_battery_support: config.has_multi_battery_support,
            condition_flag: config.request_conditioning_cycle,
            ..Self::default()
        }
    }

    /// Pack the flags into a word
    pub fn to_word(&self) -> u16 {
        use mode_bits::*;

        let flags = [
            (self.internal_charge_controller, INTERNAL_CHARGE_CONTROLLER),
            (self.primary_battery_support, PRIMARY_BATTERY_SUPPORT),
            (self.condition_flag, CONDITION_FLAG),
            (self.charge_controller_enabled, CHARGE_CONTROLLER_ENABLED),
            (self.primary_battery, PRIMARY_BATTERY),
            (self.alarm_mode, ALARM_MODE),
            (self.charger_mode, CHARGER_MODE),
            (self.capacity_mode, CAPACITY_MODE),
        ];
        flags
            .iter()
            .filter(|(set, _)| *set)
            .fold(0, |word, (_, bit)| word | bit)
    }

    /// `(high, low)` bytes of the packed word
    pub fn to_bytes(&self) -> (u8, u8) {
        split_word(self.to_word())
    }

    /// Apply a host write. Read-only and reserved bits are ignored.
    pub fn apply_host_write(&mut self, word: u16) {
        use mode_bits::*;

        let word = word & WRITABLE;
        self.charge_controller_enabled = word & CHARGE_CONTROLLER_ENABLED != 0;
        self.primary_battery = word & PRIMARY_BATTERY != 0;
        self.alarm_mode = word & ALARM_MODE != 0;
        self.charger_mode = word & CHARGER_MODE != 0;
        self.capacity_mode = word & CAPACITY_MODE != 0;
    }
}

/// 4-bit error code reported in BatteryStatus bits 0-3.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCode {
    #[default]
    Ok = 0b0000,
    Busy = 0b0001,
    ReservedCommand = 0b0010,
    UnsupportedCommand = 0b0011,
    AccessDenied = 0b0100,
    OverflowUnderflow = 0b0101,
    BadSize = 0b0110,
    UnknownError = 0b0111,
}

impl TryFrom<u8> for ErrorCode {
    type Error = SbsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Ok),
            1 => Ok(ErrorCode::Busy),
            2 => Ok(ErrorCode::ReservedCommand),
            3 => Ok(ErrorCode::UnsupportedCommand),
            4 => Ok(ErrorCode::AccessDenied),
            5 => Ok(ErrorCode::OverflowUnderflow),
            6 => Ok(ErrorCode::BadSize),
            7 => Ok(ErrorCode::UnknownError),
            other => Err(SbsError::InvalidErrorCode(other)),
        }
    }
}

/// Status and alarm flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub error_code: ErrorCode,

    /// Battery is empty; stop discharging
    pub fully_discharged: bool,
    /// Battery is full; stop charging
    pub fully_charged: bool,
    /// Battery is discharging, possibly only self-discharge
    pub discharging: bool,
    /// Capacity measurements can be trusted
    pub initialized: bool,

    /// AverageTimeToEmpty() < RemainingTimeAlarm()
    pub remaining_time_alarm: bool,
    /// RemainingCapacity() < RemainingCapacityAlarm()
    pub remaining_capacity_alarm: bool,
    /// Stop discharge as soon as possible
    pub terminate_discharge_alarm: bool,
    /// Temperature exceeded limit; stop charging
    pub over_temp_alarm: bool,
    /// Charging must stop temporarily
    pub terminate_charge_alarm: bool,
    /// Charge is complete
    pub over_charged_alarm: bool,
}

impl Default for BatteryStatus {
    fn default() -> Self {
        Self {
            error_code: ErrorCode::Ok,
            fully_discharged: false,
            fully_charged: true,
            discharging: false,
            initialized: true,
            remaining_time_alarm: false,
            remaining_capacity_alarm: false,
            terminate_discharge_alarm: false,
            over_temp_alarm: false,
            terminate_charge_alarm: false,
            over_charged_alarm: false,
        }
    }
}

impl BatteryStatus {
    /// Charging is allowed only while no stop-charge condition is flagged
    pub fn can_charge(&self) -> bool {
        !(self.fully_charged
            || self.over_temp_alarm
            || self.terminate_charge_alarm
            || self.over_charged_alarm)
    }

    // TerminateDischargeAlarm does not block discharge
    pub fn can_discharge(&self) -> bool {
        !(self.fully_discharged || self.over_temp_alarm)
    }

    pub fn to_word(&self) -> u16 {
        use status_bits::*;

        let flags = [
            (self.fully_discharged, FULLY_DISCHARGED),
            (self.fully_charged, FULLY_CHARGED),
            (self.discharging, DISCHARGING),
            (self.initialized, INITIALIZED),
            (self.remaining_time_alarm, REMAINING_TIME_ALARM),
            (self.remaining_capacity_alarm, REMAINING_CAPACITY_ALARM),
            (self.terminate_discharge_alarm, TERMINATE_DISCHARGE_ALARM),
            (self.over_temp_alarm, OVER_TEMP_ALARM),
            (self.terminate_charge_alarm, TERMINATE_CHARGE_ALARM),
            (self.over_charged_alarm, OVER_CHARGED_ALARM),
        ];
        flags
            .iter()
            .filter(|(set, _)| *set)
            .fold(self.error_code as u16 & ERROR_CODE, |word, (_, bit)| {
                word | bit
            })
    }

    pub fn to_bytes(&self) -> (u8, u8) {
        split_word(self.to_word())
    }
}
