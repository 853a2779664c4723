//! GPIO interface

use core::fmt;

/// Output level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// A pin on an i.MX GPIO bank
///
/// Banks are numbered from 1 as in the reference manual (`GPIO4_IO13` is
/// bank 4, index 13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpioPin {
    pub bank: u8,
    pub index: u8,
}

impl GpioPin {
    pub const fn new(bank: u8, index: u8) -> Self {
        Self { bank, index }
    }

    /// Global pin number, `(bank - 1) * 32 + index`
    pub const fn number(&self) -> u32 {
        (self.bank as u32 - 1) * 32 + self.index as u32
    }
}

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}_IO{:02}", self.bank, self.index)
    }
}

/// GPIO request failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The pin's bank is not handled by this controller
    InvalidPin(GpioPin),
    /// The pin is claimed by another user
    Busy(GpioPin),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioError::InvalidPin(pin) => write!(f, "invalid pin {}", pin),
            GpioError::Busy(pin) => write!(f, "pin {} busy", pin),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GpioError {}

/// Pin direction and level control
pub trait Gpio {
    /// Configure `pin` as an output driving `level`
    fn set_output(&mut self, pin: GpioPin, level: Level) -> Result<(), GpioError>;

    /// Configure `pin` as an input
    fn set_input(&mut self, pin: GpioPin) -> Result<(), GpioError>;
}

impl<T: Gpio + ?Sized> Gpio for &mut T {
    fn set_output(&mut self, pin: GpioPin, level: Level) -> Result<(), GpioError> {
        (**self).set_output(pin, level)
    }

    fn set_input(&mut self, pin: GpioPin) -> Result<(), GpioError> {
        (**self).set_input(pin)
    }
}
