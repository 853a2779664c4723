// i.MX GPIO bank controller

use moduline_api::{Gpio, GpioError, GpioPin, Level, RegisterAccess};

const GPIO_DR: usize = 0x00;
const GPIO_GDIR: usize = 0x04;

/// One GPIO bank; requests for pins of other banks are rejected
pub struct ImxGpio<R: RegisterAccess> {
    regs: R,
    bank: u8,
    base: usize,
}

impl<R: RegisterAccess> ImxGpio<R> {
    pub fn new(regs: R, bank: u8, base: usize) -> Self {
        Self { regs, bank, base }
    }

    pub fn bank(&self) -> u8 {
        self.bank
    }

    fn check(&self, pin: GpioPin) -> Result<u32, GpioError> {
        if pin.bank != self.bank || pin.index >= 32 {
            return Err(GpioError::InvalidPin(pin));
        }
        Ok(1 << pin.index)
    }
}

impl<R: RegisterAccess> Gpio for ImxGpio<R> {
    fn set_output(&mut self, pin: GpioPin, level: Level) -> Result<(), GpioError> {
        let mask = self.check(pin)?;
        // Latch the level before switching the direction to avoid a glitch.
        match level {
            Level::High => self.regs.modify32(self.base + GPIO_DR, 0, mask),
            Level::Low => self.regs.modify32(self.base + GPIO_DR, mask, 0),
        }
        self.regs.modify32(self.base + GPIO_GDIR, 0, mask);
        log::debug!("{} output {:?}", pin, level);
        Ok(())
    }

    fn set_input(&mut self, pin: GpioPin) -> Result<(), GpioError> {
        let mask = self.check(pin)?;
        self.regs.modify32(self.base + GPIO_GDIR, mask, 0);
        Ok(())
    }
}
