//! Static pack configuration.
//!
//! Everything the pack reports that does not come from a sensor lives here:
//! identity strings, cell arrangement, nominal voltages and capacities, and
//! the authentication key. Derived values are computed on demand.

use crate::constants::{AUTH_KEY_LEN, REPLY_CAPACITY};
use crate::error::{Result, SbsError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 16-byte authentication secret
pub type AuthKey = [u8; AUTH_KEY_LEN];

/// Pack description served over the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// ManufacturerName (0x20)
    pub manufacturer_name: String,
    /// DeviceName (0x21)
    pub device_name: String,
    /// DeviceChemistry (0x22)
    pub device_chemistry: String,
    /// SerialNumber (0x1C)
    pub serial_number: u16,
    /// ManufactureDate (0x1B)
    pub manufacture_date: NaiveDate,
    /// SpecificationInfo (0x1A): SBS version 1.1 with PEC, no scaling
    pub specification_info: u16,
    /// CycleCount (0x17)
    pub cycle_count: u16,

    /// mV: voltage at which the pack is charged
    pub charge_voltage: u16,
    /// mA: current requested while charging
    pub charge_current: u16,
    /// mV: nominal pack voltage
    pub design_voltage: u16,
    /// mV: maximum voltage of one cell
    pub max_cell_voltage: u16,
    /// mV: minimum voltage of one cell
    pub min_cell_voltage: u16,

    /// Cells in series (sets the voltage)
    pub cells_in_series: u8,
    /// Cells in parallel (sets the capacity)
    pub cells_in_parallel: u8,
    /// mAh: capacity of one cell, tolerance already subtracted
    pub cell_capacity: u16,
    /// Percentage of cell life left
    pub cell_wear: u8,

    /// Pack controls charge voltage and current itself
    pub has_internal_charge_controller: bool,
    /// Pack has an internal switch for multiple batteries
    pub has_multi_battery_support: bool,
    /// Cells are new and need a conditioning cycle
    pub request_conditioning_cycle: bool,

    pub auth_key: AuthKey,
    /// Answer the raw key read-back commands 0x63-0x66.
    /// Some hosts read the key back before authenticating.
    pub auth_key_readback: bool,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            manufacturer_name: "Panasonic".to_string(),
            device_name: "AS10D51".to_string(),
            device_chemistry: "LION".to_string(),
            serial_number: 64,
            manufacture_date: NaiveDate::from_ymd_opt(2017, 11, 11).expect("valid calendar date"),
            specification_info: 0x0031,
            cycle_count: 5,
            charge_voltage: 12600,
            charge_current: 3150,
            design_voltage: 10800,
            max_cell_voltage: 4200,
            min_cell_voltage: 3500,
            cells_in_series: 3,
            cells_in_parallel: 3,
            cell_capacity: 3200 - 50,
            cell_wear: 98,
            has_internal_charge_controller: true,
            has_multi_battery_support: false,
            request_conditioning_cycle: false,
            auth_key: [
                0x10, 0x32, 0x54, 0x76, 0x98, 0xba, 0xdc, 0xfe, 0xef, 0xcd, 0xab, 0x89, 0x67,
                0x45, 0x23, 0x01,
            ],
            auth_key_readback: true,
        }
    }
}

impl BatteryConfig {
    /// Parse and validate a configuration from JSON. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BatteryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check that every reported value fits its wire representation
    pub fn validate(&self) -> Result<()> {
        let strings = [
            ("manufacturer_name", &self.manufacturer_name),
            ("device_name", &self.device_name),
            ("device_chemistry", &self.device_chemistry),
        ];
        for (field, value) in strings {
            if value.len() > REPLY_CAPACITY {
                return Err(SbsError::StringTooLong {
                    field,
                    length: value.len(),
                });
            }
            if !value.is_ascii() {
                return Err(SbsError::Config(format!("{} must be ASCII", field)));
            }
        }

        if self.cells_in_series == 0 || self.cells_in_parallel == 0 {
            return Err(SbsError::Config("cell counts must be non-zero".to_string()));
        }
        if self.cell_wear > 100 {
            return Err(SbsError::Config(format!(
                "cell wear {}% exceeds 100%",
                self.cell_wear
            )));
        }
        if self.min_cell_voltage > self.max_cell_voltage {
            return Err(SbsError::Config(
                "min cell voltage above max cell voltage".to_string(),
            ));
        }

        let products = [
            ("max pack voltage", self.max_cell_voltage, self.cells_in_series),
            ("design capacity", self.cell_capacity, self.cells_in_parallel),
        ];
        for (what, per_cell, cells) in products {
            if per_cell.checked_mul(cells as u16).is_none() {
                return Err(SbsError::Config(format!("{} overflows 16 bits", what)));
            }
        }

        if self.manufacture_date.year() < 1980 || self.manufacture_date.year() > 1980 + 127 {
            return Err(SbsError::Config(format!(
                "manufacture date {} outside 1980-2107",
                self.manufacture_date
            )));
        }

        Ok(())
    }

    /// mV: fully charged pack voltage
    pub fn max_pack_voltage(&self) -> u16 {
        self.max_cell_voltage
            .saturating_mul(self.cells_in_series as u16)
    }

    /// mV: empty pack voltage
    pub fn min_pack_voltage(&self) -> u16 {
        self.min_cell_voltage
            .saturating_mul(self.cells_in_series as u16)
    }

    /// mA: maximum current one cell can provide (1C)
    pub fn max_discharge_rate(&self) -> u16 {
        self.cell_capacity
    }

    /// mAh: capacity of the pack when new
    pub fn design_capacity(&self) -> u16 {
        self.cell_capacity
            .saturating_mul(self.cells_in_parallel as u16)
    }

    /// mAh: design capacity scaled by cell wear
    pub fn full_charge_capacity(&self) -> u16 {
        (self.design_capacity() as u32 * self.cell_wear as u32 / 100) as u16
    }

    /// ManufactureDate in SBS packing: (year - 1980) * 512 + month * 32 + day
    pub fn packed_manufacture_date(&self) -> u16 {
        let date = self.manufacture_date;
        let years = (date.year() - 1980).clamp(0, 127) as u16;
        years * 512 + date.month() as u16 * 32 + date.day() as u16
    }
}
