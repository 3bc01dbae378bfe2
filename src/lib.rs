//! # Open Smart Battery
//!
//! A Rust library emulating the slave side of a Smart Battery System (SBS)
//! pack on a two-wire bus. A host (laptop or charger) writes a command code
//! and reads back a framed reply; this library produces those replies from a
//! static pack configuration plus pluggable sensor and charge-control hooks.
//!
//! ## Features
//!
//! - Full SBS standard command table, with CRC-8 checked reply frames
//! - BatteryMode and BatteryStatus registers with host writes honoured
//! - HMAC-SHA1 challenge/response authentication
//! - Interrupt-safe wrapper sharing one pack between bus callbacks and a
//!   supervisory task
//! - Host-side reply decoding and pack reports
//!
//! ## Example
//!
//! ```no_run
//! use open_smart_battery::{BatteryConfig, HostBus, SmartBattery};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let battery = SmartBattery::new(BatteryConfig::default())?;
//!     let mut host = HostBus::new(battery);
//!     let report = host.pack_report()?;
//!     println!("Pack voltage: {:.2}V", report.voltage as f64 / 1000.0);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod battery;
pub mod clock;
pub mod command;
pub mod config;
pub mod constants;
pub mod crc;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod registers;
pub mod sensors;
pub mod shared;
pub mod types;

pub use battery::{encode_frame, BusHandler, SmartBattery};
pub use config::BatteryConfig;
pub use error::{Result, SbsError};
pub use host::{decode_reply, HostBus};
pub use shared::SharedBattery;
pub use types::*;
