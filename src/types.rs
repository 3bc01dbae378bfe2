use crate::constants::{MAX_FRAME_LEN, REPLY_CAPACITY};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Payload produced by one command handler
pub type Reply = heapless::Vec<u8, REPLY_CAPACITY>;

/// Bytes sent to the host for one read transaction
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Direction of current flow through the pack
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    Charging = 0,
    Discharging = 1,
    #[default]
    Idling = 2,
}

/// Progress of the current bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    /// No write in flight
    #[default]
    Idle,
    /// Host write in progress
    Receiving,
}

/// Everything a host learns from one pass over the standard commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackReport {
    pub timestamp: DateTime<Utc>,
    pub manufacturer_name: String,
    pub device_name: String,
    pub device_chemistry: String,
    pub serial_number: u16,
    pub manufacture_date: Option<NaiveDate>,
    pub battery_mode: u16,
    pub battery_status: u16,
    /// °C
    pub temperature: f64,
    /// mV
    pub voltage: u16,
    /// mA, negative while discharging
    pub current: i16,
    /// mA, negative while discharging
    pub average_current: i16,
    /// %
    pub relative_state_of_charge: u16,
    /// mAh
    pub remaining_capacity: u16,
    /// mAh
    pub full_charge_capacity: u16,
    /// mAh
    pub design_capacity: u16,
    /// mV
    pub design_voltage: u16,
    pub cycle_count: u16,
    /// mA
    pub charging_current: u16,
    /// mV
    pub charging_voltage: u16,
    /// mV per cell, cells 1-4
    pub cell_voltages: [u16; 4],
}

/// Unpack an SBS ManufactureDate word
pub fn unpack_date(word: u16) -> Option<NaiveDate> {
    let year = 1980 + (word >> 9) as i32;
    let month = ((word >> 5) & 0x0F) as u32;
    let day = (word & 0x1F) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Convert 0.1 K to °C, rounded to 2 decimal places
pub fn decikelvin_to_celsius(value: u16) -> f64 {
    let celsius = value as f64 / 10.0 - 273.15;
    (celsius * 100.0).round() / 100.0
}
