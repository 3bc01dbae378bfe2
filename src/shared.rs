//! Interrupt-safe access to a [`SmartBattery`].
//!
//! Bus callbacks arrive from interrupt context while the supervisory task
//! runs from the main loop. Every entry point here holds a critical section
//! for its whole duration, so a callback never observes registers halfway
//! through a reconciliation.

use crate::battery::{BusHandler, SmartBattery};
use crate::clock::{Clock, SystemClock};
use crate::constants::SUPERVISORY_INTERVAL_MS;
use crate::sensors::{ChargeController, PassiveChargeController, SensorSource, StaticSensors};
use crate::types::Frame;
use core::cell::RefCell;
use critical_section::Mutex;
use log::info;
use std::thread;
use std::time::{Duration, Instant};

pub struct SharedBattery<S = StaticSensors, C = PassiveChargeController, K = SystemClock> {
    inner: Mutex<RefCell<SmartBattery<S, C, K>>>,
}

impl<S, C, K> SharedBattery<S, C, K>
where
    S: SensorSource,
    C: ChargeController,
    K: Clock,
{
    pub fn new(battery: SmartBattery<S, C, K>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(battery)),
        }
    }

    /// Run `f` on the pack inside a critical section
    pub fn with<R>(&self, f: impl FnOnce(&mut SmartBattery<S, C, K>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn on_write_received(&self, bytes: &[u8]) {
        self.with(|battery| battery.on_write_received(bytes))
    }

    pub fn on_read_requested(&self) -> Frame {
        self.with(|battery| battery.on_read_requested())
    }

    /// One supervisory pass with bus callbacks held off
    pub fn tick(&self) {
        self.with(|battery| battery.tick())
    }

    /// Run the supervisory task at its fixed cadence for `duration`
    pub fn supervise_for(&self, duration: Duration) {
        info!("Supervising for {} ms", duration.as_millis());
        let interval = Duration::from_millis(SUPERVISORY_INTERVAL_MS);
        let start = Instant::now();
        let mut ticks = 0u64;

        while start.elapsed() < duration {
            self.tick();
            ticks += 1;
            thread::sleep(interval);
        }

        info!(
            "Supervisor stopped after {} ticks ({:.2} s)",
            ticks,
            start.elapsed().as_secs_f64()
        );
    }

    pub fn into_inner(self) -> SmartBattery<S, C, K> {
        self.inner.into_inner().into_inner()
    }
}

impl<S, C, K> BusHandler for SharedBattery<S, C, K>
where
    S: SensorSource,
    C: ChargeController,
    K: Clock,
{
    fn on_write_received(&mut self, bytes: &[u8]) {
        SharedBattery::on_write_received(self, bytes)
    }

    fn on_read_requested(&mut self) -> Frame {
        SharedBattery::on_read_requested(self)
    }
}

impl<S, C, K> BusHandler for &SharedBattery<S, C, K>
where
    S: SensorSource,
    C: ChargeController,
    K: Clock,
{
    fn on_write_received(&mut self, bytes: &[u8]) {
        SharedBattery::on_write_received(*self, bytes)
    }

    fn on_read_requested(&mut self) -> Frame {
        SharedBattery::on_read_requested(*self)
    }
}
