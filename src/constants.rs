//! Protocol constants for SBS slave communication.
//!
//! This module defines the command codes the emulated pack answers,
//! the framing bytes folded into every checksum, buffer capacities and
//! the supervisory timing parameters.

/// SMBus slave address of a smart battery
pub const SMBUS_ADDRESS: u8 = 0x0B;

/// First framing byte of every reply checksum (address in write direction, 22)
pub const FRAME_WRITE_ADDRESS: u8 = SMBUS_ADDRESS << 1;

/// Second framing byte of every reply checksum (address in read direction, 23)
pub const FRAME_READ_ADDRESS: u8 = (SMBUS_ADDRESS << 1) | 1;

/// Maximum payload a handler may produce
pub const REPLY_CAPACITY: usize = 20;

/// Maximum number of data bytes captured after the command code
pub const COMMAND_DATA_CAPACITY: usize = 20;

/// Largest frame on the wire: length byte, payload, checksum
pub const MAX_FRAME_LEN: usize = REPLY_CAPACITY + 2;

/// Wire-level reply length meaning "no handler, send nothing"
pub const NO_REPLY: u8 = 255;

/// Size of the authentication key in bytes
pub const AUTH_KEY_LEN: usize = 16;

/// Size of an authentication challenge and of its response
pub const CHALLENGE_LEN: usize = 20;

/// Alarm mode is cleared by the pack after this many milliseconds.
/// SBS requires it within 45 s; 30 s leaves margin.
pub const ALARM_MODE_TIMEOUT_MS: u64 = 30_000;

/// Interval between supervisory ticks
pub const SUPERVISORY_INTERVAL_MS: u64 = 5;

/// Standard SBS command codes.
pub mod commands {
    pub const MANUFACTURER_ACCESS: u8 = 0x00;
    pub const REMAINING_CAPACITY_ALARM: u8 = 0x01;
    pub const REMAINING_TIME_ALARM: u8 = 0x02;
    pub const BATTERY_MODE: u8 = 0x03;
    pub const AT_RATE: u8 = 0x04;
    pub const AT_RATE_TIME_TO_FULL: u8 = 0x05;
    pub const AT_RATE_TIME_TO_EMPTY: u8 = 0x06;
    pub const AT_RATE_OK: u8 = 0x07;
    pub const TEMPERATURE: u8 = 0x08;
    pub const VOLTAGE: u8 = 0x09;
    pub const CURRENT: u8 = 0x0A;
    pub const AVERAGE_CURRENT: u8 = 0x0B;
    pub const MAX_ERROR: u8 = 0x0C;
    pub const RELATIVE_STATE_OF_CHARGE: u8 = 0x0D;
    pub const ABSOLUTE_STATE_OF_CHARGE: u8 = 0x0E;
    pub const REMAINING_CAPACITY: u8 = 0x0F;
    pub const FULL_CHARGE_CAPACITY: u8 = 0x10;
    pub const RUN_TIME_TO_EMPTY: u8 = 0x11;
    pub const AVERAGE_TIME_TO_EMPTY: u8 = 0x12;
    pub const AVERAGE_TIME_TO_FULL: u8 = 0x13;
    pub const CHARGING_CURRENT: u8 = 0x14;
    pub const CHARGING_VOLTAGE: u8 = 0x15;
    pub const BATTERY_STATUS: u8 = 0x16;
    pub const CYCLE_COUNT: u8 = 0x17;
    pub const DESIGN_CAPACITY: u8 = 0x18;
    pub const DESIGN_VOLTAGE: u8 = 0x19;
    pub const SPECIFICATION_INFO: u8 = 0x1A;
    pub const MANUFACTURE_DATE: u8 = 0x1B;
    pub const SERIAL_NUMBER: u8 = 0x1C;
    pub const MANUFACTURER_NAME: u8 = 0x20;
    pub const DEVICE_NAME: u8 = 0x21;
    pub const DEVICE_CHEMISTRY: u8 = 0x22;
    pub const MANUFACTURER_DATA: u8 = 0x23;
    pub const AUTHENTICATE: u8 = 0x2F;
    /// Vendor block, meaning unknown
    pub const VENDOR_30: u8 = 0x30;
    /// Vendor word, meaning unknown
    pub const VENDOR_35: u8 = 0x35;
    /// Vendor block, meaning unknown
    pub const VENDOR_37: u8 = 0x37;
    /// Vendor word, meaning unknown
    pub const VENDOR_3B: u8 = 0x3B;
    pub const CELL_VOLTAGE_FIRST: u8 = 0x3C;
    pub const CELL_VOLTAGE_LAST: u8 = 0x3F;
    pub const AUTH_KEY_FIRST: u8 = 0x63;
    pub const AUTH_KEY_LAST: u8 = 0x66;
}

/// Fixed replies for values the pack does not measure yet.
pub mod placeholders {
    /// RemainingCapacityAlarm in mAh
    pub const REMAINING_CAPACITY_ALARM: u16 = 660;
    /// RemainingTimeAlarm in minutes
    pub const REMAINING_TIME_ALARM: u16 = 10;
    /// AtRateTimeToEmpty: 0xFFFF means "not discharging at AtRate"
    pub const AT_RATE_TIME_TO_EMPTY: u16 = 0xFFFF;
    /// AtRateOK: true
    pub const AT_RATE_OK: u16 = 1;
    /// Relative and absolute state of charge in percent
    pub const STATE_OF_CHARGE: u16 = 100;
    /// RunTimeToEmpty and AverageTimeToEmpty in minutes (4 h)
    pub const TIME_TO_EMPTY: u16 = 240;
    /// AverageTimeToFull in minutes (3 h)
    pub const TIME_TO_FULL: u16 = 180;
    /// Cell temperature in 0.1 K (22.15 °C)
    pub const TEMPERATURE: u16 = 2953;

    pub const MANUFACTURER_DATA: [u8; 14] = [
        0x00, 0x00, 0x00, 0x00, 0x00, 0x6e, 0x00, 0xaa, 0x00, 0x02, 0x10, 0x00, 0x00, 0x00,
    ];
    pub const VENDOR_30: [u8; 10] = [112, 156, 191, 25, 132, 74, 151, 0, 11, 0];
    pub const VENDOR_35: [u8; 2] = [64, 0];
    pub const VENDOR_37: [u8; 8] = [4, 0, 61, 94, 97, 1, 64, 1];
    pub const VENDOR_3B: [u8; 2] = [135, 11];
}
