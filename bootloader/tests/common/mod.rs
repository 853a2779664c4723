//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mockall::mock;
use moduline_api::{
    BoardServices, BootSource, BusController, BusError, DefaultEnv, Delay, FlashHandler, Gpio, GpioError, GpioPin,
    Level, TwoWireBus,
};

mock! {
    pub Bus {}

    impl TwoWireBus for Bus {
        fn read_reg(&mut self, addr: u8, reg: u8) -> Result<u8, BusError>;
        fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError>;
    }

    impl BusController for Bus {
        fn init(&mut self) -> Result<(), BusError>;
    }
}

/// Board services that keep what the probe hands over
#[derive(Default)]
pub struct Services {
    pub handlers: Vec<FlashHandler>,
    pub envs: Vec<DefaultEnv>,
    pub source: Option<BootSource>,
}

impl BoardServices for Services {
    fn register_flash_handler(&mut self, handler: FlashHandler) {
        self.handlers.push(handler);
    }

    fn append_default_env(&mut self, env: DefaultEnv) {
        self.envs.push(env);
    }

    fn boot_source(&self) -> BootSource {
        self.source.unwrap_or(BootSource::Unknown)
    }
}

/// Delay that only adds up what was asked for
#[derive(Default)]
pub struct NoDelay {
    pub total_us: u64,
}

impl Delay for NoDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += us as u64;
    }
}

/// GPIO controller that logs every request
#[derive(Clone, Default)]
pub struct RecordingGpio {
    pub outputs: Arc<Mutex<Vec<(GpioPin, Level)>>>,
    pub fail: Option<GpioError>,
}

impl Gpio for RecordingGpio {
    fn set_output(&mut self, pin: GpioPin, level: Level) -> Result<(), GpioError> {
        if let Some(err) = self.fail {
            return Err(err);
        }
        self.outputs.lock().unwrap().push((pin, level));
        Ok(())
    }

    fn set_input(&mut self, _pin: GpioPin) -> Result<(), GpioError> {
        Ok(())
    }
}

impl RecordingGpio {
    pub fn outputs(&self) -> Vec<(GpioPin, Level)> {
        self.outputs.lock().unwrap().clone()
    }
}

/// Byte-wide register file of a PMIC
///
/// With `vreg_lock` set, voltage registers ignore writes while the lock bit
/// is set in the lock register, the way the BD71837 does.
pub struct PmicModel {
    pub regs: [u8; 256],
    pub vreg_lock: Option<VoltageLock>,
    pub writes: Vec<(u8, u8)>,
}

#[derive(Clone, Copy)]
pub struct VoltageLock {
    pub lock_reg: u8,
    pub lock_bit: u8,
    pub is_voltage_reg: fn(u8) -> bool,
}

impl PmicModel {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            vreg_lock: None,
            writes: Vec::new(),
        }
    }

    pub fn with_lock(lock: VoltageLock, reset_value: u8) -> Self {
        let mut model = Self::new();
        model.regs[lock.lock_reg as usize] = reset_value;
        model.vreg_lock = Some(lock);
        model
    }

    fn ignores(&self, reg: u8) -> bool {
        match self.vreg_lock {
            Some(lock) => (lock.is_voltage_reg)(reg) && self.regs[lock.lock_reg as usize] & lock.lock_bit != 0,
            None => false,
        }
    }
}

impl TwoWireBus for PmicModel {
    fn read_reg(&mut self, _addr: u8, reg: u8) -> Result<u8, BusError> {
        Ok(self.regs[reg as usize])
    }

    fn write_reg(&mut self, _addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.writes.push((reg, value));
        if !self.ignores(reg) {
            self.regs[reg as usize] = value;
        }
        Ok(())
    }
}
