//! Power Sequencer
//!
//! A PMIC is brought up by replaying a board-specific, order-dependent
//! table of register steps over the two-wire bus. Steps run strictly in
//! table order and the first failure aborts the program; there are no
//! retries.

pub mod bd71837;
pub mod pca9450;

use core::fmt;

use moduline_api::{BusError, TwoWireBus};

/// One step of a power-rail program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RailStep {
    /// Unconditional register write
    Write { reg: u8, value: u8 },
    /// Read `reg`; write `value` under `mask` only if the masked bits differ
    UpdateIfDifferent { reg: u8, mask: u8, value: u8 },
}

impl RailStep {
    pub const fn write(reg: u8, value: u8) -> Self {
        RailStep::Write { reg, value }
    }

    pub const fn update(reg: u8, mask: u8, value: u8) -> Self {
        RailStep::UpdateIfDifferent { reg, mask, value }
    }

    pub const fn reg(&self) -> u8 {
        match self {
            RailStep::Write { reg, .. } | RailStep::UpdateIfDifferent { reg, .. } => *reg,
        }
    }
}

/// PMIC register program selected per board at build time
#[derive(Debug, Clone, Copy)]
pub struct PowerRailProgram {
    pub device: &'static str,
    pub steps: &'static [RailStep],
}

impl PowerRailProgram {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// PMIC on a board: bus address and its program
#[derive(Debug, Clone, Copy)]
pub struct PmicConfig {
    pub addr: u8,
    pub program: &'static PowerRailProgram,
}

/// A step of the program failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceError {
    /// Zero-based index of the failing step
    pub step: usize,
    pub reg: u8,
    pub cause: BusError,
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} (reg {:#04x}): {}", self.step, self.reg, self.cause)
    }
}

/// Run `program` against the PMIC at `addr`
///
/// Returns the number of register writes actually issued.
pub fn configure<B: TwoWireBus + ?Sized>(
    bus: &mut B,
    addr: u8,
    program: &PowerRailProgram,
) -> Result<usize, SequenceError> {
    log::debug!("{}@{:#04x}: {} steps", program.device, addr, program.len());
    let mut writes = 0;

    for (step, rail) in program.steps.iter().enumerate() {
        let fail = |cause| SequenceError { step, reg: rail.reg(), cause };
        match *rail {
            RailStep::Write { reg, value } => {
                bus.write_reg(addr, reg, value).map_err(fail)?;
                writes += 1;
            }
            RailStep::UpdateIfDifferent { reg, mask, value } => {
                let current = bus.read_reg(addr, reg).map_err(fail)?;
                if current & mask != value & mask {
                    bus.write_reg(addr, reg, (current & !mask) | (value & mask)).map_err(fail)?;
                    writes += 1;
                }
            }
        }
    }

    Ok(writes)
}
