//! Mapping from command codes to handlers.
//!
//! Each code the pack answers maps to exactly one [`Command`] variant.
//! Code ranges that share a handler (cell voltages, key read-back) carry
//! the index within their range.

use crate::constants::commands::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ManufacturerAccess,
    RemainingCapacityAlarm,
    RemainingTimeAlarm,
    BatteryMode,
    AtRate,
    AtRateTimeToFull,
    AtRateTimeToEmpty,
    AtRateOk,
    Temperature,
    Voltage,
    Current,
    AverageCurrent,
    MaxError,
    RelativeStateOfCharge,
    AbsoluteStateOfCharge,
    RemainingCapacity,
    FullChargeCapacity,
    RunTimeToEmpty,
    AverageTimeToEmpty,
    AverageTimeToFull,
    ChargingCurrent,
    ChargingVoltage,
    BatteryStatus,
    CycleCount,
    DesignCapacity,
    DesignVoltage,
    SpecificationInfo,
    ManufactureDate,
    SerialNumber,
    ManufacturerName,
    DeviceName,
    DeviceChemistry,
    ManufacturerData,
    Authenticate,
    Vendor30,
    Vendor35,
    Vendor37,
    Vendor3B,
    /// Cell 0-3 (0x3C-0x3F)
    CellVoltage(u8),
    /// Key quarter 0-3 (0x63-0x66)
    AuthKeyWord(u8),
}

impl Command {
    /// Look up the handler for a command code
    pub fn from_code(code: u8) -> Option<Self> {
        let command = match code {
            MANUFACTURER_ACCESS => Command::ManufacturerAccess,
            REMAINING_CAPACITY_ALARM => Command::RemainingCapacityAlarm,
            REMAINING_TIME_ALARM => Command::RemainingTimeAlarm,
            BATTERY_MODE => Command::BatteryMode,
            AT_RATE => Command::AtRate,
            AT_RATE_TIME_TO_FULL => Command::AtRateTimeToFull,
            AT_RATE_TIME_TO_EMPTY => Command::AtRateTimeToEmpty,
            AT_RATE_OK => Command::AtRateOk,
            TEMPERATURE => Command::Temperature,
            VOLTAGE => Command::Voltage,
            CURRENT => Command::Current,
            AVERAGE_CURRENT => Command::AverageCurrent,
            MAX_ERROR => Command::MaxError,
            RELATIVE_STATE_OF_CHARGE => Command::RelativeStateOfCharge,
            ABSOLUTE_STATE_OF_CHARGE => Command::AbsoluteStateOfCharge,
            REMAINING_CAPACITY => Command::RemainingCapacity,
            FULL_CHARGE_CAPACITY => Command::FullChargeCapacity,
            RUN_TIME_TO_EMPTY => Command::RunTimeToEmpty,
            AVERAGE_TIME_TO_EMPTY => Command::AverageTimeToEmpty,
            AVERAGE_TIME_TO_FULL => Command::AverageTimeToFull,
            CHARGING_CURRENT => Command::ChargingCurrent,
            CHARGING_VOLTAGE => Command::ChargingVoltage,
            BATTERY_STATUS => Command::BatteryStatus,
            CYCLE_COUNT => Command::CycleCount,
            DESIGN_CAPACITY => Command::DesignCapacity,
            DESIGN_VOLTAGE => Command::DesignVoltage,
            SPECIFICATION_INFO => Command::SpecificationInfo,
            MANUFACTURE_DATE => Command::ManufactureDate,
            SERIAL_NUMBER => Command::SerialNumber,
            MANUFACTURER_NAME => Command::ManufacturerName,
            DEVICE_NAME => Command::DeviceName,
            DEVICE_CHEMISTRY => Command::DeviceChemistry,
            MANUFACTURER_DATA => Command::ManufacturerData,
            AUTHENTICATE => Command::Authenticate,
            VENDOR_30 => Command::Vendor30,
            VENDOR_35 => Command::Vendor35,
            VENDOR_37 => Command::Vendor37,
            VENDOR_3B => Command::Vendor3B,
            CELL_VOLTAGE_FIRST..=CELL_VOLTAGE_LAST => {
                Command::CellVoltage(code - CELL_VOLTAGE_FIRST)
            }
            AUTH_KEY_FIRST..=AUTH_KEY_LAST => Command::AuthKeyWord(code - AUTH_KEY_FIRST),
            _ => return None,
        };
        Some(command)
    }

    /// Command code on the wire
    pub fn code(&self) -> u8 {
        match *self {
            Command::ManufacturerAccess => MANUFACTURER_ACCESS,
            Command::RemainingCapacityAlarm => REMAINING_CAPACITY_ALARM,
            Command::RemainingTimeAlarm => REMAINING_TIME_ALARM,
            Command::BatteryMode => BATTERY_MODE,
            Command::AtRate => AT_RATE,
            Command::AtRateTimeToFull => AT_RATE_TIME_TO_FULL,
            Command::AtRateTimeToEmpty => AT_RATE_TIME_TO_EMPTY,
            Command::AtRateOk => AT_RATE_OK,
            Command::Temperature => TEMPERATURE,
            Command::Voltage => VOLTAGE,
            Command::Current => CURRENT,
            Command::AverageCurrent => AVERAGE_CURRENT,
            Command::MaxError => MAX_ERROR,
            Command::RelativeStateOfCharge => RELATIVE_STATE_OF_CHARGE,
            Command::AbsoluteStateOfCharge => ABSOLUTE_STATE_OF_CHARGE,
            Command::RemainingCapacity => REMAINING_CAPACITY,
            Command::FullChargeCapacity => FULL_CHARGE_CAPACITY,
            Command::RunTimeToEmpty => RUN_TIME_TO_EMPTY,
            Command::AverageTimeToEmpty => AVERAGE_TIME_TO_EMPTY,
            Command::AverageTimeToFull => AVERAGE_TIME_TO_FULL,
            Command::ChargingCurrent => CHARGING_CURRENT,
            Command::ChargingVoltage => CHARGING_VOLTAGE,
            Command::BatteryStatus => BATTERY_STATUS,
            Command::CycleCount => CYCLE_COUNT,
            Command::DesignCapacity => DESIGN_CAPACITY,
            Command::DesignVoltage => DESIGN_VOLTAGE,
            Command::SpecificationInfo => SPECIFICATION_INFO,
            Command::ManufactureDate => MANUFACTURE_DATE,
            Command::SerialNumber => SERIAL_NUMBER,
            Command::ManufacturerName => MANUFACTURER_NAME,
            Command::DeviceName => DEVICE_NAME,
            Command::DeviceChemistry => DEVICE_CHEMISTRY,
            Command::ManufacturerData => MANUFACTURER_DATA,
            Command::Authenticate => AUTHENTICATE,
            Command::Vendor30 => VENDOR_30,
            Command::Vendor35 => VENDOR_35,
            Command::Vendor37 => VENDOR_37,
            Command::Vendor3B => VENDOR_3B,
            Command::CellVoltage(index) => CELL_VOLTAGE_FIRST + index,
            Command::AuthKeyWord(index) => AUTH_KEY_FIRST + index,
        }
    }

    /// Block replies are prefixed by their length, and the length byte is
    /// part of the checksum.
    pub fn needs_length(&self) -> bool {
        needs_length(self.code())
    }
}

/// Whether replies to `code` carry a length byte
pub fn needs_length(code: u8) -> bool {
    matches!(
        code,
        MANUFACTURER_NAME
            | DEVICE_NAME
            | DEVICE_CHEMISTRY
            | MANUFACTURER_DATA
            | AUTHENTICATE
            | VENDOR_30
            | VENDOR_37
            | CELL_VOLTAGE_FIRST
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=u8::MAX {
            if let Some(command) = Command::from_code(code) {
                assert_eq!(command.code(), code);
            }
        }
    }

    #[test]
    fn ranges_carry_their_index() {
        assert_eq!(Command::from_code(0x3C), Some(Command::CellVoltage(0)));
        assert_eq!(Command::from_code(0x3D), Some(Command::CellVoltage(1)));
        assert_eq!(Command::from_code(0x3F), Some(Command::CellVoltage(3)));
        assert_eq!(Command::from_code(0x63), Some(Command::AuthKeyWord(0)));
        assert_eq!(Command::from_code(0x66), Some(Command::AuthKeyWord(3)));
        assert_eq!(Command::from_code(0x67), None);
    }

    #[test]
    fn unassigned_codes() {
        for code in [0x1D, 0x1E, 0x1F, 0x24, 0x2E, 0x31, 0x36, 0x3A, 0x62, 0xFF] {
            assert_eq!(Command::from_code(code), None, "{:#04x}", code);
        }
    }

    #[test]
    fn needs_length_set() {
        let block: Vec<u8> = (0..=u8::MAX).filter(|&code| needs_length(code)).collect();
        assert_eq!(block, vec![0x20, 0x21, 0x22, 0x23, 0x2F, 0x30, 0x37, 0x3C]);

        assert!(Command::CellVoltage(0).needs_length());
        assert!(!Command::CellVoltage(1).needs_length());
        assert!(!Command::BatteryMode.needs_length());
    }
}
