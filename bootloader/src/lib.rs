//! Moduline pre-bootloader
//!
//! First code to run on the i.MX8M application cores of the GOcontroll
//! Moduline boards and the Ka-Ro TX8M test carrier. Organized in layers:
//!
//! - **arch / soc / drivers**: relocation, exception level, clocks, pads,
//!   UART, I2C, GPIO, DDR controller and TF-A handoff
//! - **pmic / dram**: power rail programs and one-shot memory training
//! - **gate**: the EL3 bring-up path and the switch to the normal world
//! - **fdt / registry / variant**: hardware description handling, peripheral
//!   lookup by alias, display variant probing and overlay selection
//! - **boards / stage**: per-board descriptors and the normal-world probe

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arch;
pub mod boards;
pub mod config;
pub mod console;
pub mod dram;
pub mod drivers;
pub mod error;
pub mod fdt;
pub mod gate;
pub mod heap;
pub mod pmic;
pub mod registry;
pub mod soc;
pub mod stage;
pub mod state;
pub mod utils;
pub mod variant;

#[cfg(target_arch = "aarch64")]
pub mod entry;

pub use error::{BootError, BringupError, Result};
pub use gate::{ExecutionContext, GateState, PrivilegeGate};
pub use stage::{StageOutput, run_board_stage};
