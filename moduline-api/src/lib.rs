//! Moduline API - boundary interfaces for the pre-bootloader
//!
//! This crate holds the traits and plain data types through which the
//! bring-up core talks to hardware and to the services that surround it:
//!
//! - **Bus**: register-level two-wire (I2C) transactions
//! - **Gpio**: pin direction and level control
//! - **Mmio**: 32-bit register access, real or simulated
//! - **Delay**: bounded busy-wait delays
//! - **Services**: flash-handler and default-environment registration
//!
//! Everything here is `no_std` and allocation free so the same traits can
//! be implemented by the on-chip-RAM stage and by host-side test doubles.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod delay;
pub mod gpio;
pub mod mmio;
pub mod services;

pub use bus::{BusController, BusError, TwoWireBus};
pub use delay::Delay;
pub use gpio::{Gpio, GpioError, GpioPin, Level};
pub use mmio::RegisterAccess;
pub use services::{BoardServices, BootSource, DefaultEnv, FlashHandler, FlashKind, HandlerFlags};
