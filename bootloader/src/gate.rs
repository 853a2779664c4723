//! Privilege Gate and Firmware Handoff
//!
//! The exception level is read once at entry. At EL3 the image was started
//! by the boot ROM from on-chip RAM: it brings up clocks, power rails and
//! DRAM, then hands over to TF-A, which never returns here. At a lower level
//! TF-A has already re-entered this image from DRAM; bring-up is skipped and
//! the board continues with its hardware description.
//!
//! The secure path is written against capability traits so the ordering can
//! be checked without hardware.

use core::convert::Infallible;
use core::fmt;

use moduline_api::{BusController, Gpio, Level, RegisterAccess};

use crate::arch::ExceptionLevel;
use crate::boards::{BoardDescriptor, BoardId};
use crate::dram::MemoryTraining;
use crate::error::{BringupCause, BringupError, BringupStage};
use crate::pmic;
use crate::soc::imx8m::atf::HandoffError;
use crate::soc::imx8m::ccm::{Ccm, ClockPlan};
use crate::soc::imx8m::iomux::PadControl;
use crate::state::{self, BootPhase};

/// Programs the clock roots and gates of a board
pub trait ClockInit {
    fn early_init(&mut self, plan: &ClockPlan);
}

impl<R: RegisterAccess> ClockInit for Ccm<R> {
    fn early_init(&mut self, plan: &ClockPlan) {
        self.apply(plan);
    }
}

/// Where TF-A was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareImage {
    pub entry: usize,
    pub bl33_entry: usize,
}

/// Loader and entry of the secure-world firmware
pub trait TrustedFirmware {
    fn load(&mut self) -> Result<FirmwareImage, HandoffError>;

    /// Transfer control; there is no way back
    fn start(&mut self, image: FirmwareImage) -> !;
}

/// Gate state, fixed by the exception level at entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Secure,
    Normal,
}

/// Privilege the image was entered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    level: ExceptionLevel,
}

impl ExecutionContext {
    pub const fn new(level: ExceptionLevel) -> Self {
        Self { level }
    }

    /// Read `CurrentEL`
    #[cfg(target_arch = "aarch64")]
    pub fn capture() -> Self {
        Self::new(crate::arch::aarch64::current_el())
    }

    pub fn level(&self) -> ExceptionLevel {
        self.level
    }

    pub fn state(&self) -> GateState {
        if self.level.is_secure_monitor() {
            GateState::Secure
        } else {
            GateState::Normal
        }
    }
}

/// Capabilities the secure path drives, in the order it drives them
pub struct SecureBringup<'a> {
    pub clocks: &'a mut dyn ClockInit,
    pub pads: &'a mut dyn PadControl,
    pub gpio: &'a mut dyn Gpio,
    pub power_bus: &'a mut dyn BusController,
    pub trainer: &'a mut dyn MemoryTraining,
    pub firmware: &'a mut dyn TrustedFirmware,
}

/// What the normal world continues with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub board: BoardId,
    pub dtb: &'static [u8],
}

pub struct PrivilegeGate {
    context: ExecutionContext,
}

impl PrivilegeGate {
    pub fn new(context: ExecutionContext) -> Self {
        Self { context }
    }

    pub fn state(&self) -> GateState {
        self.context.state()
    }

    /// Run the gate for `board`
    ///
    /// In the secure state this only returns on failure; success ends in
    /// the firmware handoff.
    pub fn run(&self, board: &BoardDescriptor, bringup: &mut SecureBringup<'_>) -> Result<Continuation, BringupError> {
        match self.state() {
            GateState::Normal => {
                log::info!("{}: running at EL{}, bring-up already done", board.name, self.context.level().number());
                Ok(Continuation { board: board.id, dtb: board.dtb })
            }
            GateState::Secure => match secure_bringup(board, bringup) {
                Ok(never) => match never {},
                Err(err) => {
                    state::set_error();
                    log::error!("{}", err);
                    Err(err)
                }
            },
        }
    }
}

fn secure_bringup(board: &BoardDescriptor, bringup: &mut SecureBringup<'_>) -> Result<Infallible, BringupError> {
    log::info!("{}: secure bring-up on {}", board.name, board.soc.name());

    bringup.clocks.early_init(board.clocks);
    state::set_phase(BootPhase::ClocksReady);

    if let Some(keep_alive) = &board.keep_alive {
        bringup.pads.setup_pad(&keep_alive.pad);
        bringup
            .gpio
            .set_output(keep_alive.pin, Level::High)
            .map_err(|err| BringupError::new(BringupStage::KeepAlive, BringupCause::Gpio(err)))?;
    }

    bringup
        .power_bus
        .init()
        .map_err(|err| BringupError::new(BringupStage::PowerBus, BringupCause::Bus(err)))?;

    let writes = pmic::configure(bringup.power_bus, board.pmic.addr, board.pmic.program)
        .map_err(|err| BringupError::new(BringupStage::PowerSequence, BringupCause::Sequence(err)))?;
    log::info!("{}: {} rail writes", board.pmic.program.device, writes);
    state::set_phase(BootPhase::RailsReady);

    bringup
        .trainer
        .train(board.dram)
        .map_err(|err| BringupError::new(BringupStage::Memory, BringupCause::Dram(err)))?;
    state::set_phase(BootPhase::DramReady);

    let image = bringup
        .firmware
        .load()
        .map_err(|err| BringupError::new(BringupStage::FirmwareLoad, BringupCause::Handoff(err)))?;
    state::set_phase(BootPhase::Handoff);

    bringup.firmware.start(image)
}

/// Write the line printed before halting on a fatal bring-up error
pub fn report_fatal(err: &BringupError, phase: BootPhase, out: &mut dyn fmt::Write) -> fmt::Result {
    writeln!(out, "FATAL: {} after {}; halting before handoff", err, phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use moduline_api::BusError;

    #[test]
    fn test_only_el3_selects_secure_state() {
        assert_eq!(ExecutionContext::new(ExceptionLevel::El3).state(), GateState::Secure);
        assert_eq!(ExecutionContext::new(ExceptionLevel::El2).state(), GateState::Normal);
        assert_eq!(ExecutionContext::new(ExceptionLevel::El1).state(), GateState::Normal);
    }

    #[test]
    fn test_fatal_report_names_stage_and_cause() {
        let err = BringupError::new(BringupStage::PowerBus, BringupCause::Bus(BusError::Timeout));
        let mut out = String::new();
        report_fatal(&err, BootPhase::ClocksReady, &mut out).unwrap();
        assert!(out.starts_with("FATAL: power bus failed: bus transaction timed out"));
        assert!(out.contains("after ClocksReady (3)"));
        assert!(out.ends_with("halting before handoff\n"));
    }
}
