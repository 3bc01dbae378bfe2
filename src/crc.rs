//! Packet error checking for SBS replies.
//!
//! SMBus appends a CRC-8 (x^8 + x^2 + x + 1) to every reply. The checksum
//! covers the slave address in write direction, the command code, the slave
//! address in read direction, the block length for block commands, and
//! finally the payload.
//!
//! The engine below works one bit at a time on an 8-cell shift register,
//! feeding each byte most-significant bit first. Cell `i` of the register is
//! output bit `i`.

use crate::constants::{FRAME_READ_ADDRESS, FRAME_WRITE_ADDRESS};

/// Feedback taps: cells 0, 1 and 2 receive the inverted bit.
const TAPS: u8 = 0b0000_0111;

/// Bit-serial CRC-8 accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc8 {
    register: u8,
}

impl Crc8 {
    /// Start with an all-zero register
    pub const fn new() -> Self {
        Self { register: 0 }
    }

    /// Shift one byte into the register, bit 7 first
    pub fn update(&mut self, byte: u8) {
        for shift in (0..8).rev() {
            let bit = (byte >> shift) & 1;
            let invert = bit ^ (self.register >> 7);

            // Every cell moves up one position; cell 0 takes the inverted bit
            // and cells 1 and 2 are xor-ed with it.
            self.register <<= 1;
            if invert == 1 {
                self.register ^= TAPS;
            }
        }
    }

    /// Shift a sequence of bytes into the register
    pub fn update_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.update(byte);
        }
    }

    /// Current register value
    pub fn finish(&self) -> u8 {
        self.register
    }
}

/// Compute the CRC-8 of a raw byte sequence
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = Crc8::new();
    crc.update_slice(data);
    crc.finish()
}

/// Checksum of a reply frame.
///
/// `length` is `Some` only for block commands; it is folded into the
/// checksum exactly when it is sent on the wire.
pub fn frame_checksum(command: u8, length: Option<u8>, payload: &[u8]) -> u8 {
    let mut crc = Crc8::new();
    crc.update(FRAME_WRITE_ADDRESS);
    crc.update(command);
    crc.update(FRAME_READ_ADDRESS);
    if let Some(length) = length {
        crc.update(length);
    }
    crc.update_slice(payload);
    crc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SMBUS: crc::Crc<u8> = crc::Crc::<u8>::new(&crc::CRC_8_SMBUS);

    #[test]
    fn check_value() {
        assert_eq!(crc8(b"123456789"), 0xF4);
        assert_eq!(crc8(&[]), 0x00);
    }

    #[test]
    fn matches_table_driven_smbus_crc() {
        let samples: [&[u8]; 5] = [
            &[0xB6, 0x27, 0xB7, 0x5B, 0x3C],
            &[0x16, 0x03, 0x17, 0x01, 0x00],
            b"Panasonic",
            &[0xFF; 20],
            &[0x00, 0x80, 0x01, 0x7F],
        ];
        for sample in samples {
            assert_eq!(crc8(sample), SMBUS.checksum(sample), "{:02X?}", sample);
        }
    }

    #[test]
    fn independent_between_calls() {
        let first = frame_checksum(0x09, None, &[0x38, 0x31]);
        let second = frame_checksum(0x09, None, &[0x38, 0x31]);
        assert_eq!(first, second);
    }

    // Reference values produced by the bit-serial algorithm over
    // {0x16, command, 0x17, [length], payload...}
    #[test_case(0x03, None, &[0x01, 0x00], 0xE2; "battery_mode_default")]
    #[test_case(0x16, None, &[0xA0, 0x00], 0xC6; "battery_status_default")]
    #[test_case(0x09, None, &[0x38, 0x31], 0xAD; "voltage_12600")]
    #[test_case(0x0A, None, &[0x4E, 0x0C], 0xF8; "current_charging")]
    #[test_case(0x22, Some(4), b"LION", 0x31; "device_chemistry")]
    #[test_case(0x20, Some(9), b"Panasonic", 0xBC; "manufacturer_name")]
    #[test_case(0x3C, Some(2), &[0x68, 0x10], 0x56; "cell_voltage_block")]
    fn reply_vectors(command: u8, length: Option<u8>, payload: &[u8], expected: u8) {
        assert_eq!(frame_checksum(command, length, payload), expected);
    }

    #[test]
    fn length_byte_is_folded_in() {
        let with_length = frame_checksum(0x22, Some(4), b"LION");
        let without_length = frame_checksum(0x22, None, b"LION");
        assert_eq!(without_length, 0xD7);
        assert_ne!(with_length, without_length);
    }
}
