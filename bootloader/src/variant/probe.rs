//! Variant prober
//!
//! One register read on the shared bus tells the two display assemblies
//! apart: only one of them populates a device at the probed address. Any
//! bus failure counts as "not populated"; there is no retry.

use moduline_api::{Delay, TwoWireBus};

use crate::config;

/// Outcome of the probing transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantProbeResult {
    /// The device acknowledged
    Responded,
    /// NACK, timeout, arbitration loss or any other bus error
    Inconclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantProber {
    addr: u8,
    reg: u8,
    settle_ms: u32,
}

impl VariantProber {
    pub const fn new(addr: u8) -> Self {
        Self {
            addr,
            reg: 0x00,
            settle_ms: config::PROBE_SETTLE_MS,
        }
    }

    pub const fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// Wait for the device to come out of reset, then read one register
    pub fn probe<B, D>(&self, bus: &mut B, delay: &mut D) -> VariantProbeResult
    where
        B: TwoWireBus + ?Sized,
        D: Delay + ?Sized,
    {
        delay.delay_ms(self.settle_ms);
        match bus.read_reg(self.addr, self.reg) {
            Ok(value) => {
                log::debug!("probe {:#04x}: reg {:#04x} = {:#04x}", self.addr, self.reg, value);
                VariantProbeResult::Responded
            }
            Err(err) => {
                log::debug!("probe {:#04x}: {}", self.addr, err);
                VariantProbeResult::Inconclusive
            }
        }
    }
}
