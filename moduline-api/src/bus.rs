//! Two-wire bus interface

use core::fmt;

/// Failure of a single two-wire bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The controller has not been configured yet
    NotInitialized,
    /// The addressed device did not acknowledge
    Nack,
    /// The controller did not reach the expected state in time
    Timeout,
    /// Another master won arbitration
    ArbitrationLost,
    /// The bus stayed busy when a start condition was requested
    Busy,
}

impl BusError {
    /// Convert to a negative errno-style code for diagnostics
    pub fn as_error_code(&self) -> i32 {
        match self {
            BusError::NotInitialized => -19,
            BusError::Nack => -6,
            BusError::Timeout => -110,
            BusError::ArbitrationLost => -11,
            BusError::Busy => -16,
        }
    }

    /// Get a human-readable description of the error
    pub fn description(&self) -> &'static str {
        match self {
            BusError::NotInitialized => "bus controller not initialized",
            BusError::Nack => "no acknowledge from device",
            BusError::Timeout => "bus transaction timed out",
            BusError::ArbitrationLost => "bus arbitration lost",
            BusError::Busy => "bus busy",
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_error_code())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BusError {}

/// Register-oriented two-wire bus master
///
/// Exactly one transaction is in flight at a time; the `&mut self`
/// receiver makes the caller the exclusive owner of the bus for its
/// duration.
pub trait TwoWireBus {
    /// Read one register of the device at 7-bit address `addr`
    fn read_reg(&mut self, addr: u8, reg: u8) -> Result<u8, BusError>;

    /// Write one register of the device at 7-bit address `addr`
    fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError>;
}

impl<T: TwoWireBus + ?Sized> TwoWireBus for &mut T {
    fn read_reg(&mut self, addr: u8, reg: u8) -> Result<u8, BusError> {
        (**self).read_reg(addr, reg)
    }

    fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
        (**self).write_reg(addr, reg, value)
    }
}

/// A two-wire master that must be brought up before its first transaction
pub trait BusController: TwoWireBus {
    /// Route pads, open the clock gate and enable the controller
    fn init(&mut self) -> Result<(), BusError>;
}
