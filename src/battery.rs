//! The emulated pack: all protocol state plus the transaction controller.
//!
//! A host transaction is a write (command code, then optional data) and,
//! for reads, a request for the reply frame. The bus transport calls
//! [`BusHandler::on_write_received`] and [`BusHandler::on_read_requested`];
//! transports that deliver bytes one at a time can use
//! [`SmartBattery::begin_write`], [`SmartBattery::write_byte`] and
//! [`SmartBattery::end_write`] instead.
//!
//! A read frame is `[length]? payload checksum`. The length byte is sent
//! (and checksummed) only for block commands. Commands without a handler
//! produce no bytes at all.

use crate::clock::{Clock, SystemClock};
use crate::command::needs_length;
use crate::config::BatteryConfig;
use crate::constants::{commands, ALARM_MODE_TIMEOUT_MS, COMMAND_DATA_CAPACITY};
use crate::crc::frame_checksum;
use crate::dispatch::{dispatch, HandlerContext};
use crate::error::Result;
use crate::registers::{BatteryMode, BatteryStatus};
use crate::sensors::{ChargeController, PassiveChargeController, SensorSource, StaticSensors};
use crate::types::{Frame, PowerState, Reply, TransactionState};
use log::{debug, info, trace, warn};

/// Slave side of the two-wire bus.
pub trait BusHandler {
    /// Host finished a write: command code followed by optional data
    fn on_write_received(&mut self, bytes: &[u8]);

    /// Host wants the reply to the last command
    fn on_read_requested(&mut self) -> Frame;
}

/// Smart battery state and protocol engine.
pub struct SmartBattery<S = StaticSensors, C = PassiveChargeController, K = SystemClock> {
    config: BatteryConfig,
    mode: BatteryMode,
    status: BatteryStatus,
    power_state: PowerState,
    sensors: S,
    controller: C,
    clock: K,
    alarm_mode_set_at: u64,

    state: TransactionState,
    command: u8,
    data: [u8; COMMAND_DATA_CAPACITY],
    data_len: usize,
    received: usize,
}

impl SmartBattery {
    /// Create a pack with stub sensors and charge control
    pub fn new(config: BatteryConfig) -> Result<Self> {
        let sensors = StaticSensors::new(&config);
        Self::with_parts(config, sensors, PassiveChargeController, SystemClock::new())
    }
}

impl<S, C, K> SmartBattery<S, C, K>
where
    S: SensorSource,
    C: ChargeController,
    K: Clock,
{
    pub fn with_parts(config: BatteryConfig, sensors: S, controller: C, clock: K) -> Result<Self> {
        config.validate()?;

        let alarm_mode_set_at = clock.now_ms();
        Ok(Self {
            mode: BatteryMode::new(&config),
            status: BatteryStatus::default(),
            power_state: PowerState::Idling,
            config,
            sensors,
            controller,
            clock,
            alarm_mode_set_at,
            state: TransactionState::Idle,
            command: 0,
            data: [0; COMMAND_DATA_CAPACITY],
            data_len: 0,
            received: 0,
        })
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    pub fn mode(&self) -> &BatteryMode {
        &self.mode
    }

    pub fn status(&self) -> &BatteryStatus {
        &self.status
    }

    /// Status flags, for charge logic running outside the supervisory tick
    pub fn status_mut(&mut self) -> &mut BatteryStatus {
        &mut self.status
    }

    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    pub fn set_power_state(&mut self, power_state: PowerState) {
        self.power_state = power_state;
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn transaction_state(&self) -> TransactionState {
        self.state
    }

    /// Most recently written command code
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Data bytes captured with the most recent write
    pub fn command_data(&self) -> &[u8] {
        &self.data[..self.data_len]
    }

    /// Set or clear alarm mode. Setting it (again) restarts the
    /// auto-clear timer.
    pub fn set_alarm_mode(&mut self, enabled: bool) {
        if enabled {
            self.alarm_mode_set_at = self.clock.now_ms();
        }
        self.mode.alarm_mode = enabled;
    }

    /// Start capturing a host write
    pub fn begin_write(&mut self) {
        self.state = TransactionState::Receiving;
        self.data = [0; COMMAND_DATA_CAPACITY];
        self.data_len = 0;
        self.received = 0;
    }

    /// Capture one written byte. The first byte of a write is the command
    /// code; bytes past the data buffer are dropped.
    pub fn write_byte(&mut self, byte: u8) {
        if self.state == TransactionState::Idle {
            self.begin_write();
        }

        if self.received == 0 {
            self.command = byte;
        } else if self.data_len < COMMAND_DATA_CAPACITY {
            self.data[self.data_len] = byte;
            self.data_len += 1;
        }
        self.received += 1;
    }

    /// Host write complete
    pub fn end_write(&mut self) {
        if self.state == TransactionState::Idle {
            return;
        }
        self.state = TransactionState::Idle;

        if self.received == 0 {
            trace!("Empty write");
            return;
        }

        let dropped = self.received - 1 - self.data_len;
        if dropped > 0 {
            warn!(
                "Command {:#04x}: dropped {} data bytes beyond {}-byte buffer",
                self.command, dropped, COMMAND_DATA_CAPACITY
            );
        }
        debug!("Received command: {:#04x}", self.command);

        if self.command == commands::BATTERY_MODE && self.data_len >= 2 {
            let word = u16::from_le_bytes([self.data[0], self.data[1]]);
            self.write_battery_mode(word);
        }
    }

    fn write_battery_mode(&mut self, word: u16) {
        let mut mode = self.mode;
        mode.apply_host_write(word);
        debug!("BatteryMode written: {:#06x}", mode.to_word());

        self.mode = mode;
        if mode.alarm_mode {
            self.alarm_mode_set_at = self.clock.now_ms();
        }
    }

    /// Reply payload for the current command, `None` if unimplemented
    pub fn dispatch(&self) -> Option<Reply> {
        let ctx = HandlerContext {
            config: &self.config,
            mode: &self.mode,
            status: &self.status,
            power_state: self.power_state,
            sensors: &self.sensors,
        };
        dispatch(&ctx, self.command, &self.data[..self.data_len])
    }

    /// Periodic reconciliation: charge logic and the alarm-mode timeout
    pub fn tick(&mut self) {
        trace!("Supervisory tick");

        self.power_state =
            self.controller
                .reconcile(&mut self.status, &self.sensors, self.power_state);

        let elapsed = self.clock.now_ms().saturating_sub(self.alarm_mode_set_at);
        if self.mode.alarm_mode && elapsed > ALARM_MODE_TIMEOUT_MS {
            info!("Alarm mode set {} ms ago, clearing", elapsed);
            self.mode.alarm_mode = false;
        }
    }
}

impl<S, C, K> BusHandler for SmartBattery<S, C, K>
where
    S: SensorSource,
    C: ChargeController,
    K: Clock,
{
    fn on_write_received(&mut self, bytes: &[u8]) {
        self.begin_write();
        for &byte in bytes {
            self.write_byte(byte);
        }
        self.end_write();
    }

    fn on_read_requested(&mut self) -> Frame {
        // Repeated start: the write part ends when the read begins
        self.end_write();

        match self.dispatch() {
            Some(reply) => {
                let frame = encode_frame(self.command, &reply);
                debug!("Reply to {:#04x}: {:02X?}", self.command, &frame[..]);
                frame
            }
            None => {
                warn!("Unimplemented command: {:#04x}", self.command);
                Frame::new()
            }
        }
    }
}

/// Frame a reply payload: optional length byte, payload, checksum
pub fn encode_frame(command: u8, reply: &[u8]) -> Frame {
    let length = needs_length(command).then_some(reply.len() as u8);

    let mut frame = Frame::new();
    if let Some(length) = length {
        frame.push(length).ok();
    }
    frame.extend_from_slice(reply).ok();
    frame.push(frame_checksum(command, length, reply)).ok();
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::registers::mode_bits;
    use std::time::Duration;

    type TestBattery = SmartBattery<StaticSensors, PassiveChargeController, ManualClock>;

    fn battery() -> (TestBattery, ManualClock) {
        let config = BatteryConfig::default();
        let clock = ManualClock::new();
        let sensors = StaticSensors::new(&config);
        let battery =
            SmartBattery::with_parts(config, sensors, PassiveChargeController, clock.clone())
                .unwrap();
        (battery, clock)
    }

    #[test]
    fn word_frame() {
        let (mut battery, _) = battery();
        battery.on_write_received(&[0x03]);
        assert_eq!(&battery.on_read_requested()[..], &[0x01, 0x00, 0xE2]);
    }

    #[test]
    fn block_frame_has_length() {
        let (mut battery, _) = battery();
        battery.on_write_received(&[0x22]);
        assert_eq!(
            &battery.on_read_requested()[..],
            &[0x04, b'L', b'I', b'O', b'N', 0x31]
        );
    }

    #[test]
    fn unimplemented_command_sends_nothing() {
        let (mut battery, _) = battery();
        battery.on_write_received(&[0xFF]);
        assert!(battery.on_read_requested().is_empty());
    }

    #[test]
    fn read_repeats_last_command() {
        let (mut battery, _) = battery();
        battery.on_write_received(&[0x09]);
        let first = battery.on_read_requested();
        let second = battery.on_read_requested();
        assert_eq!(first, second);
        assert_eq!(&first[..], &[0x38, 0x31, 0xAD]);
    }

    #[test]
    fn byte_stream_states() {
        let (mut battery, _) = battery();
        assert_eq!(battery.transaction_state(), TransactionState::Idle);

        battery.begin_write();
        assert_eq!(battery.transaction_state(), TransactionState::Receiving);
        battery.write_byte(0x2F);
        battery.write_byte(0xAA);
        battery.write_byte(0xBB);
        assert_eq!(battery.command(), 0x2F);
        assert_eq!(battery.command_data(), &[0xAA, 0xBB]);

        battery.end_write();
        assert_eq!(battery.transaction_state(), TransactionState::Idle);
    }

    #[test]
    fn new_write_replaces_data() {
        let (mut battery, _) = battery();
        battery.on_write_received(&[0x2F, 1, 2, 3, 4]);
        battery.on_write_received(&[0x2F, 9]);
        assert_eq!(battery.command_data(), &[9]);
    }

    #[test]
    fn overlong_write_is_truncated() {
        let (mut battery, _) = battery();
        let mut write = vec![0x2F];
        write.extend(0..30u8);
        battery.on_write_received(&write);
        assert_eq!(battery.command_data().len(), COMMAND_DATA_CAPACITY);
        assert_eq!(battery.command_data()[19], 19);
    }

    #[test]
    fn read_during_receive_finishes_write() {
        let (mut battery, _) = battery();
        battery.begin_write();
        battery.write_byte(0x16);
        let frame = battery.on_read_requested();
        assert_eq!(battery.transaction_state(), TransactionState::Idle);
        assert_eq!(&frame[..], &[0xA0, 0x00, 0xC6]);
    }

    #[test]
    fn host_writes_battery_mode() {
        let (mut battery, _) = battery();
        let word = mode_bits::CAPACITY_MODE | mode_bits::CHARGER_MODE | mode_bits::CONDITION_FLAG;
        let [low, high] = word.to_le_bytes();
        battery.on_write_received(&[0x03, low, high]);

        assert!(battery.mode().capacity_mode);
        assert!(battery.mode().charger_mode);
        assert!(!battery.mode().condition_flag);
        assert_eq!(battery.mode().to_word(), 0xC001);
    }

    #[test]
    fn alarm_mode_clears_after_timeout() {
        let (mut battery, clock) = battery();
        clock.set_ms(1_000);
        battery.set_alarm_mode(true);

        clock.advance(Duration::from_millis(29_999));
        battery.tick();
        assert!(battery.mode().alarm_mode);

        clock.advance(Duration::from_millis(2));
        battery.tick();
        assert!(!battery.mode().alarm_mode);
    }

    #[test]
    fn alarm_mode_write_restarts_timer() {
        let (mut battery, clock) = battery();
        let [low, high] = mode_bits::ALARM_MODE.to_le_bytes();
        battery.on_write_received(&[0x03, low, high]);
        assert!(battery.mode().alarm_mode);

        clock.advance(Duration::from_secs(20));
        battery.on_write_received(&[0x03, low, high]);
        clock.advance(Duration::from_secs(20));
        battery.tick();
        assert!(battery.mode().alarm_mode);

        clock.advance(Duration::from_secs(11));
        battery.tick();
        assert!(!battery.mode().alarm_mode);
    }

    #[test]
    fn tick_applies_charge_controller() {
        struct OverTemp;
        impl ChargeController for OverTemp {
            fn reconcile(
                &mut self,
                status: &mut BatteryStatus,
                sensors: &dyn SensorSource,
                _power_state: PowerState,
            ) -> PowerState {
                if sensors.temperature() > 3330 {
                    status.over_temp_alarm = true;
                    status.terminate_charge_alarm = true;
                    return PowerState::Idling;
                }
                PowerState::Charging
            }
        }

        let config = BatteryConfig::default();
        let mut sensors = StaticSensors::new(&config);
        sensors.temperature = 3400;
        let mut battery =
            SmartBattery::with_parts(config, sensors, OverTemp, ManualClock::new()).unwrap();
        battery.set_power_state(PowerState::Charging);

        battery.tick();
        assert_eq!(battery.power_state(), PowerState::Idling);
        assert!(battery.status().over_temp_alarm);
        assert!(!battery.status().can_discharge());
    }

    #[test]
    fn rejects_invalid_config() {
        let config = BatteryConfig {
            cells_in_series: 0,
            ..BatteryConfig::default()
        };
        assert!(SmartBattery::new(config).is_err());
    }
}
