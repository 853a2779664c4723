//! Bootloader error handling
//!
//! This module defines the error types used throughout the bootloader
//! for consistent error reporting and handling. Leaf modules keep their own
//! small error enums; everything that crosses a stage boundary is folded
//! into [`BootError`].

use core::fmt;

use moduline_api::{BusError, GpioError};

use crate::arch::relocate::RelocError;
use crate::dram::DramError;
use crate::fdt::TreeError;
use crate::pmic::SequenceError;
use crate::registry::ProbeSetupError;
use crate::soc::imx8m::atf::HandoffError;

/// Secure-world bring-up step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringupStage {
    Clocks,
    KeepAlive,
    PowerBus,
    PowerSequence,
    Memory,
    FirmwareLoad,
}

impl BringupStage {
    pub fn name(&self) -> &'static str {
        match self {
            BringupStage::Clocks => "clock tree",
            BringupStage::KeepAlive => "power keep-alive",
            BringupStage::PowerBus => "power bus",
            BringupStage::PowerSequence => "power rail sequence",
            BringupStage::Memory => "memory training",
            BringupStage::FirmwareLoad => "trusted firmware load",
        }
    }
}

/// Underlying reason for a bring-up failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringupCause {
    Bus(BusError),
    Gpio(GpioError),
    Sequence(SequenceError),
    Dram(DramError),
    Handoff(HandoffError),
}

impl fmt::Display for BringupCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BringupCause::Bus(err) => write!(f, "{}", err),
            BringupCause::Gpio(err) => write!(f, "{}", err),
            BringupCause::Sequence(err) => write!(f, "{}", err),
            BringupCause::Dram(err) => write!(f, "{}", err),
            BringupCause::Handoff(err) => write!(f, "{}", err),
        }
    }
}

/// A fatal error on the secure bring-up path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringupError {
    pub stage: BringupStage,
    pub cause: BringupCause,
}

impl BringupError {
    pub const fn new(stage: BringupStage, cause: BringupCause) -> Self {
        Self { stage, cause }
    }
}

impl fmt::Display for BringupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage.name(), self.cause)
    }
}

/// Bootloader error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootError {
    /// Secure-world bring-up failed
    Bringup(BringupError),

    /// Bus transaction outside of bring-up
    Bus(BusError),

    /// GPIO request failed
    Gpio(GpioError),

    /// Hardware description could not be parsed, built or merged
    Tree(TreeError),

    /// A peripheral needed for probing is unavailable
    ProbeSetup(ProbeSetupError),

    /// No compiled-in board matches the hardware description
    NoMatchingBoard,

    /// A second overlay merge was attempted in one boot session
    OverlayAlreadyApplied,

    /// Self relocation failed
    Relocation(RelocError),
}

impl BootError {
    /// Convert to an error code suitable for passing to firmware/OS
    pub fn as_error_code(&self) -> u32 {
        match self {
            BootError::Bringup(err) => match err.stage {
                BringupStage::Clocks => 0x1000,
                BringupStage::KeepAlive => 0x1001,
                BringupStage::PowerBus => 0x1002,
                BringupStage::PowerSequence => 0x1003,
                BringupStage::Memory => 0x1004,
                BringupStage::FirmwareLoad => 0x1005,
            },
            BootError::Bus(err) => 0x2000 + err.as_error_code().unsigned_abs(),
            BootError::Gpio(_) => 0x3000,
            BootError::Tree(_) => 0x4000,
            BootError::ProbeSetup(_) => 0x5000,
            BootError::NoMatchingBoard => 0x6000,
            BootError::OverlayAlreadyApplied => 0x6001,
            BootError::Relocation(_) => 0x7000,
        }
    }

    /// Get a human-readable description of the error
    pub fn description(&self) -> &'static str {
        match self {
            BootError::Bringup(_) => "Secure bring-up failed",
            BootError::Bus(err) => err.description(),
            BootError::Gpio(_) => "GPIO request failed",
            BootError::Tree(_) => "Hardware description error",
            BootError::ProbeSetup(_) => "Probe peripheral unavailable",
            BootError::NoMatchingBoard => "No matching board",
            BootError::OverlayAlreadyApplied => "Overlay already applied in this boot",
            BootError::Relocation(_) => "Self relocation failed",
        }
    }

    /// Everything but a stray bus error halts the boot
    ///
    /// Bus errors while probing a variant never get here; they select the
    /// fallback variant instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BootError::Bus(_))
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BootError: {} (code: {:#x})", self.description(), self.as_error_code())?;
        match self {
            BootError::Bringup(err) => write!(f, ": {}", err),
            BootError::Bus(err) => write!(f, ": {}", err),
            BootError::Gpio(err) => write!(f, ": {}", err),
            BootError::Tree(err) => write!(f, ": {}", err),
            BootError::ProbeSetup(err) => write!(f, ": {}", err),
            BootError::Relocation(err) => write!(f, ": {}", err),
            BootError::NoMatchingBoard | BootError::OverlayAlreadyApplied => Ok(()),
        }
    }
}

impl From<BringupError> for BootError {
    fn from(err: BringupError) -> Self {
        BootError::Bringup(err)
    }
}

impl From<BusError> for BootError {
    fn from(err: BusError) -> Self {
        BootError::Bus(err)
    }
}

impl From<GpioError> for BootError {
    fn from(err: GpioError) -> Self {
        BootError::Gpio(err)
    }
}

impl From<TreeError> for BootError {
    fn from(err: TreeError) -> Self {
        BootError::Tree(err)
    }
}

impl From<ProbeSetupError> for BootError {
    fn from(err: ProbeSetupError) -> Self {
        BootError::ProbeSetup(err)
    }
}

impl From<RelocError> for BootError {
    fn from(err: RelocError) -> Self {
        BootError::Relocation(err)
    }
}

/// Result type for bootloader operations
pub type Result<T> = core::result::Result<T, BootError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn test_bringup_error_display_names_stage() {
        let err = BringupError::new(
            BringupStage::PowerSequence,
            BringupCause::Sequence(SequenceError { step: 2, reg: 0x10, cause: BusError::Nack }),
        );
        let text = format!("{}", err);
        assert!(text.starts_with("power rail sequence failed"));
        assert!(text.contains("step 2"));
    }

    #[test]
    fn test_error_codes_are_distinct_per_stage() {
        let cause = BringupCause::Bus(BusError::Timeout);
        let clocks = BootError::Bringup(BringupError::new(BringupStage::Clocks, cause));
        let memory = BootError::Bringup(BringupError::new(BringupStage::Memory, cause));
        assert_ne!(clocks.as_error_code(), memory.as_error_code());
        assert!(clocks.is_fatal());
    }

    #[test]
    fn test_bus_error_is_not_fatal() {
        let err: BootError = BusError::Nack.into();
        assert!(!err.is_fatal());
        assert_eq!(err.as_error_code(), 0x2006);
    }
}
