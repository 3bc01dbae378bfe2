//! Collaborators the protocol engine calls out to.
//!
//! Analog sampling and charge decisions live outside the protocol engine.
//! The stubs here report the nominal values of a healthy, full pack and
//! never change power state.

use crate::config::BatteryConfig;
use crate::constants::placeholders;
use crate::registers::BatteryStatus;
use crate::types::PowerState;

/// Source of measured pack values.
pub trait SensorSource {
    /// Pack temperature in 0.1 K
    fn temperature(&self) -> u16;

    /// Pack voltage in mV
    fn pack_voltage(&self) -> u16;

    /// Voltage of cell `index` (0-3) in mV
    fn cell_voltage(&self, index: u8) -> u16;
}

/// Charge-control decisions, run from the supervisory task.
pub trait ChargeController {
    /// Reconcile status flags with the latest readings and return the
    /// power state to use until the next tick.
    fn reconcile(
        &mut self,
        status: &mut BatteryStatus,
        sensors: &dyn SensorSource,
        power_state: PowerState,
    ) -> PowerState;
}

/// Sensor stub reporting a full pack at room temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSensors {
    pub temperature: u16,
    pub pack_voltage: u16,
    pub cell_voltage: u16,
}

impl StaticSensors {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            temperature: placeholders::TEMPERATURE,
            pack_voltage: config.max_pack_voltage(),
            cell_voltage: config.max_cell_voltage,
        }
    }
}

impl SensorSource for StaticSensors {
    fn temperature(&self) -> u16 {
        self.temperature
    }

    fn pack_voltage(&self) -> u16 {
        self.pack_voltage
    }

    fn cell_voltage(&self, _index: u8) -> u16 {
        self.cell_voltage
    }
}

/// Charge controller stub: leaves flags and power state untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveChargeController;

impl ChargeController for PassiveChargeController {
    fn reconcile(
        &mut self,
        _status: &mut BatteryStatus,
        _sensors: &dyn SensorSource,
        power_state: PowerState,
    ) -> PowerState {
        power_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_sensors_follow_config() {
        let sensors = StaticSensors::new(&BatteryConfig::default());
        assert_eq!(sensors.temperature(), 2953);
        assert_eq!(sensors.pack_voltage(), 12600);
        assert_eq!(sensors.cell_voltage(0), 4200);
        assert_eq!(sensors.cell_voltage(3), 4200);
    }

    #[test]
    fn passive_controller_keeps_state() {
        let sensors = StaticSensors::new(&BatteryConfig::default());
        let mut status = BatteryStatus::default();
        let mut controller = PassiveChargeController;
        for state in [PowerState::Charging, PowerState::Discharging, PowerState::Idling] {
            assert_eq!(controller.reconcile(&mut status, &sensors, state), state);
        }
        assert_eq!(status, BatteryStatus::default());
    }
}
