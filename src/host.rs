//! Host side of the bus: issue commands to a [`BusHandler`] and check the
//! replies the way a charger or laptop would.

use crate::auth::{Challenge, Response};
use crate::battery::BusHandler;
use crate::command::needs_length;
use crate::constants::commands;
use crate::crc::frame_checksum;
use crate::error::{Result, SbsError};
use crate::types::{decikelvin_to_celsius, unpack_date, Frame, PackReport};
use chrono::Utc;
use log::{debug, info};

/// Validate a reply frame and return its payload.
///
/// Block commands carry a length byte that must match the payload. The
/// trailing checksum covers both address bytes, the command code, the
/// length byte when present, and the payload.
pub fn decode_reply(command: u8, frame: &[u8]) -> Result<Vec<u8>> {
    let (&checksum, body) = frame.split_last().ok_or(SbsError::EmptyResponse)?;

    let (length, payload) = if needs_length(command) {
        let (&declared, payload) = body.split_first().ok_or_else(|| SbsError::InvalidResponse {
            expected: "length byte".to_string(),
            actual: format!("{:02X?}", frame),
        })?;
        if declared as usize != payload.len() {
            return Err(SbsError::LengthMismatch {
                declared: declared as usize,
                available: payload.len(),
            });
        }
        (Some(declared), payload)
    } else {
        (None, body)
    };

    let expected = frame_checksum(command, length, payload);
    if expected != checksum {
        return Err(SbsError::ChecksumMismatch {
            expected,
            actual: checksum,
        });
    }

    Ok(payload.to_vec())
}

/// Bus master talking to one pack
pub struct HostBus<B> {
    bus: B,
}

impl<B: BusHandler> HostBus<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Write `command` plus `data`, then read the reply frame
    pub fn transact(&mut self, command: u8, data: &[u8]) -> Frame {
        let mut write = Vec::with_capacity(1 + data.len());
        write.push(command);
        write.extend_from_slice(data);

        self.bus.on_write_received(&write);
        let frame = self.bus.on_read_requested();
        debug!("{:#04x} -> {:02X?}", command, &frame[..]);
        frame
    }

    /// Read and validate the payload of `command`
    pub fn read(&mut self, command: u8) -> Result<Vec<u8>> {
        let frame = self.transact(command, &[]);
        decode_reply(command, &frame)
    }

    pub fn read_word(&mut self, command: u8) -> Result<u16> {
        let payload = self.read(command)?;
        match payload[..] {
            [low, high] => Ok(u16::from_le_bytes([low, high])),
            _ => Err(SbsError::InvalidResponse {
                expected: "2 bytes".to_string(),
                actual: format!("{} bytes", payload.len()),
            }),
        }
    }

    pub fn read_signed_word(&mut self, command: u8) -> Result<i16> {
        self.read_word(command).map(|word| word as i16)
    }

    pub fn read_string(&mut self, command: u8) -> Result<String> {
        let payload = self.read(command)?;
        String::from_utf8(payload).map_err(|e| SbsError::InvalidResponse {
            expected: "ASCII string".to_string(),
            actual: format!("{:02X?}", e.as_bytes()),
        })
    }

    /// Write a word register. Writes have no reply.
    pub fn write_word(&mut self, command: u8, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.bus.on_write_received(&[command, low, high]);
    }

    /// Send a challenge and return the pack's digest
    pub fn authenticate(&mut self, challenge: &Challenge) -> Result<Response> {
        let frame = self.transact(commands::AUTHENTICATE, challenge);
        let payload = decode_reply(commands::AUTHENTICATE, &frame)?;
        let len = payload.len();
        payload
            .try_into()
            .map_err(|_| SbsError::InvalidResponse {
                expected: "20-byte digest".to_string(),
                actual: format!("{} bytes", len),
            })
    }

    /// Read every standard command a host uses to describe a pack
    pub fn pack_report(&mut self) -> Result<PackReport> {
        info!("Reading pack");

        let mut cell_voltages = [0u16; 4];
        for (cell, voltage) in cell_voltages.iter_mut().enumerate() {
            *voltage = self.read_word(commands::CELL_VOLTAGE_FIRST + cell as u8)?;
        }

        Ok(PackReport {
            timestamp: Utc::now(),
            manufacturer_name: self.read_string(commands::MANUFACTURER_NAME)?,
            device_name: self.read_string(commands::DEVICE_NAME)?,
            device_chemistry: self.read_string(commands::DEVICE_CHEMISTRY)?,
            serial_number: self.read_word(commands::SERIAL_NUMBER)?,
            manufacture_date: unpack_date(self.read_word(commands::MANUFACTURE_DATE)?),
            battery_mode: self.read_word(commands::BATTERY_MODE)?,
            battery_status: self.read_word(commands::BATTERY_STATUS)?,
            temperature: decikelvin_to_celsius(self.read_word(commands::TEMPERATURE)?),
            voltage: self.read_word(commands::VOLTAGE)?,
            current: self.read_signed_word(commands::CURRENT)?,
            average_current: self.read_signed_word(commands::AVERAGE_CURRENT)?,
            relative_state_of_charge: self.read_word(commands::RELATIVE_STATE_OF_CHARGE)?,
            remaining_capacity: self.read_word(commands::REMAINING_CAPACITY)?,
            full_charge_capacity: self.read_word(commands::FULL_CHARGE_CAPACITY)?,
            design_capacity: self.read_word(commands::DESIGN_CAPACITY)?,
            design_voltage: self.read_word(commands::DESIGN_VOLTAGE)?,
            cycle_count: self.read_word(commands::CYCLE_COUNT)?,
            charging_current: self.read_word(commands::CHARGING_CURRENT)?,
            charging_voltage: self.read_word(commands::CHARGING_VOLTAGE)?,
            cell_voltages,
        })
    }

    /// Print a formatted pack report
    pub fn print_pack_report(&mut self) -> Result<()> {
        let report = self.pack_report()?;

        println!(
            "{} {} [{}]",
            report.manufacturer_name, report.device_name, report.device_chemistry
        );
        println!("Serial: {}", report.serial_number);
        match report.manufacture_date {
            Some(date) => println!("Manufacture date: {}", date.format("%Y-%m-%d")),
            None => println!("Manufacture date: invalid"),
        }
        println!("Cycle count: {}", report.cycle_count);
        println!();
        println!("Battery mode: {:#06x}", report.battery_mode);
        println!("Battery status: {:#06x}", report.battery_status);
        println!("Temperature (deg C): {:.2}", report.temperature);
        println!("Pack voltage: {:.2}V", report.voltage as f64 / 1000.0);
        println!("Cell Voltages (mV): {:?}", report.cell_voltages);
        println!(
            "Current (mA): {} (average {})",
            report.current, report.average_current
        );

        println!("\nCAPACITY:");
        println!("State of charge: {}%", report.relative_state_of_charge);
        println!("Remaining (mAh): {}", report.remaining_capacity);
        println!("Full charge (mAh): {}", report.full_charge_capacity);
        println!("Design (mAh): {}", report.design_capacity);
        println!("Design voltage (mV): {}", report.design_voltage);

        println!("\nCHARGER REQUEST:");
        println!("Charging current (mA): {}", report.charging_current);
        println!("Charging voltage (mV): {}", report.charging_voltage);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::SmartBattery;
    use crate::config::BatteryConfig;
    use crate::types::PowerState;
    use chrono::NaiveDate;

    fn host() -> HostBus<SmartBattery> {
        HostBus::new(SmartBattery::new(BatteryConfig::default()).unwrap())
    }

    #[test]
    fn decode_word_frame() {
        assert_eq!(decode_reply(0x03, &[0x01, 0x00, 0xE2]).unwrap(), vec![0x01, 0x00]);
    }

    #[test]
    fn decode_block_frame() {
        let frame = [4, b'L', b'I', b'O', b'N', 0x31];
        assert_eq!(decode_reply(0x22, &frame).unwrap(), b"LION".to_vec());
    }

    #[test]
    fn decode_rejects_empty_frame() {
        assert!(matches!(decode_reply(0x03, &[]), Err(SbsError::EmptyResponse)));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        match decode_reply(0x03, &[0x01, 0x00, 0xE3]) {
            Err(SbsError::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, 0xE2);
                assert_eq!(actual, 0xE3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_checksum_without_length() {
        // Checksum computed without the length byte folded in
        let frame = [4, b'L', b'I', b'O', b'N', 0xD7];
        assert!(matches!(
            decode_reply(0x22, &frame),
            Err(SbsError::ChecksumMismatch { expected: 0x31, .. })
        ));
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let frame = [5, b'L', b'I', b'O', b'N', 0x31];
        assert!(matches!(
            decode_reply(0x22, &frame),
            Err(SbsError::LengthMismatch {
                declared: 5,
                available: 4
            })
        ));
    }

    #[test]
    fn reads_identity() {
        let mut host = host();
        assert_eq!(host.read_string(commands::MANUFACTURER_NAME).unwrap(), "Panasonic");
        assert_eq!(host.read_string(commands::DEVICE_NAME).unwrap(), "AS10D51");
        assert_eq!(host.read_word(commands::SERIAL_NUMBER).unwrap(), 64);
        assert_eq!(host.read_word(commands::MANUFACTURE_DATE).unwrap(), 0x4B6B);
    }

    #[test]
    fn unimplemented_read_is_empty() {
        let mut host = host();
        assert!(matches!(host.read_word(0x1D), Err(SbsError::EmptyResponse)));
    }

    #[test]
    fn block_read_is_not_a_word() {
        let mut host = host();
        assert!(matches!(
            host.read_word(commands::MANUFACTURER_NAME),
            Err(SbsError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn write_then_read_mode() {
        let mut host = host();
        host.write_word(commands::BATTERY_MODE, 0x0080);
        assert_eq!(host.read_word(commands::BATTERY_MODE).unwrap(), 0x0081);
    }

    #[test]
    fn authenticate_returns_digest() {
        let mut host = host();
        let challenge: Challenge = core::array::from_fn(|i| i as u8);
        let digest = host.authenticate(&challenge).unwrap();
        assert_eq!(
            digest,
            [
                0x4b, 0xf5, 0x7c, 0xe2, 0x69, 0xe3, 0xf0, 0x11, 0xdf, 0x03, 0xc3, 0xc0, 0xab,
                0x2a, 0xc0, 0xd1, 0x9e, 0x1e, 0x5c, 0xae
            ]
        );
    }

    #[test]
    fn report_while_discharging() {
        let mut host = host();
        host.bus_mut().set_power_state(PowerState::Discharging);
        let report = host.pack_report().unwrap();

        assert_eq!(report.manufacturer_name, "Panasonic");
        assert_eq!(report.device_chemistry, "LION");
        assert_eq!(report.manufacture_date, NaiveDate::from_ymd_opt(2017, 11, 11));
        assert_eq!(report.battery_mode, 0x0001);
        assert_eq!(report.temperature, 22.15);
        assert_eq!(report.current, -3150);
        assert_eq!(report.average_current, -3150);
        assert_eq!(report.design_capacity, 9450);
        assert_eq!(report.full_charge_capacity, 9261);
        assert_eq!(report.remaining_capacity, 9261);
        assert_eq!(report.design_voltage, 10800);
        assert_eq!(report.charging_current, 0);
        assert_eq!(report.charging_voltage, 0);
    }
}
