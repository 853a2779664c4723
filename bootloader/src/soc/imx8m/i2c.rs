//! i.MX I2C controller, early polled master
//!
//! Enough of the controller for single-register reads and writes to a PMIC
//! or a touch controller. Every wait is bounded; a controller that never
//! finishes a byte reports [`BusError::Timeout`] instead of hanging the
//! boot.

use bitflags::bitflags;
use moduline_api::{BusController, BusError, RegisterAccess, TwoWireBus};

use super::ccm::Ccm;
use super::iomux::{Pad, setup_pad};
use super::{CCM_BASE, IOMUXC_BASE};
use crate::config;

const IADR: usize = 0x00;
const IFDR: usize = 0x04;
const I2CR: usize = 0x08;
const I2SR: usize = 0x0c;
const I2DR: usize = 0x10;

/// 24 MHz root / 240 = 100 kHz
const IFDR_100KHZ: u32 = 0x1f;

bitflags! {
    /// Control register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct I2cr: u32 {
        const IEN = 0x80;
        const IIEN = 0x40;
        const MSTA = 0x20;
        const MTX = 0x10;
        const TXAK = 0x08;
        const RSTA = 0x04;
    }
}

bitflags! {
    /// Status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct I2sr: u32 {
        const ICF = 0x80;
        const IAAS = 0x40;
        const IBB = 0x20;
        const IAL = 0x10;
        const SRW = 0x04;
        const IIF = 0x02;
        const RXAK = 0x01;
    }
}

pub struct ImxI2c<R: RegisterAccess> {
    regs: R,
    base: usize,
    pads: &'static [Pad],
    clock_gate: Option<u32>,
    poll_limit: u32,
    initialized: bool,
}

impl<R: RegisterAccess> ImxI2c<R> {
    pub fn new(regs: R, base: usize) -> Self {
        Self {
            regs,
            base,
            pads: &[],
            clock_gate: None,
            poll_limit: config::BUS_POLL_LIMIT,
            initialized: false,
        }
    }

    /// Pads to route to the controller during `init`
    pub fn with_pads(mut self, pads: &'static [Pad]) -> Self {
        self.pads = pads;
        self
    }

    /// CCGR gate to open during `init`
    pub fn with_clock_gate(mut self, gate: u32) -> Self {
        self.clock_gate = Some(gate);
        self
    }

    pub fn with_poll_limit(mut self, limit: u32) -> Self {
        self.poll_limit = limit;
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn read(&mut self, reg: usize) -> u32 {
        self.regs.read32(self.base + reg) & 0xff
    }

    fn write(&mut self, reg: usize, value: u32) {
        self.regs.write32(self.base + reg, value);
    }

    fn status(&mut self) -> I2sr {
        I2sr::from_bits_truncate(self.read(I2SR))
    }

    fn wait_busy(&mut self, busy: bool) -> Result<(), BusError> {
        for _ in 0..self.poll_limit {
            if self.status().contains(I2sr::IBB) == busy {
                return Ok(());
            }
        }
        Err(if busy { BusError::Timeout } else { BusError::Busy })
    }

    fn wait_transfer(&mut self) -> Result<I2sr, BusError> {
        for _ in 0..self.poll_limit {
            let status = self.status();
            if status.contains(I2sr::IIF) {
                self.write(I2SR, 0);
                return Ok(status);
            }
        }
        Err(BusError::Timeout)
    }

    fn start(&mut self) -> Result<(), BusError> {
        if !self.initialized {
            return Err(BusError::NotInitialized);
        }
        self.wait_busy(false)?;
        self.write(I2SR, 0);
        self.write(I2CR, (I2cr::IEN | I2cr::MSTA | I2cr::MTX).bits());
        self.wait_busy(true)
    }

    fn repeated_start(&mut self) {
        let cr = I2cr::from_bits_truncate(self.read(I2CR));
        self.write(I2CR, (cr | I2cr::RSTA).bits());
    }

    fn send(&mut self, byte: u8) -> Result<(), BusError> {
        self.write(I2DR, byte as u32);
        let status = self.wait_transfer()?;
        if status.contains(I2sr::IAL) {
            return Err(BusError::ArbitrationLost);
        }
        if status.contains(I2sr::RXAK) {
            return Err(BusError::Nack);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.write(I2CR, I2cr::IEN.bits());
        if self.wait_busy(false).is_err() {
            log::debug!("i2c@{:#x}: bus still busy after stop", self.base);
        }
    }

    fn transfer_read(&mut self, addr: u8, reg: u8) -> Result<u8, BusError> {
        self.send(addr << 1)?;
        self.send(reg)?;
        self.repeated_start();
        self.send((addr << 1) | 1)?;

        // Single byte: no acknowledge, switch to receive, dummy read starts it.
        self.write(I2CR, (I2cr::IEN | I2cr::MSTA | I2cr::TXAK).bits());
        let _ = self.read(I2DR);
        self.wait_transfer()?;
        self.stop();
        Ok(self.read(I2DR) as u8)
    }

    fn transfer_write(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.send(addr << 1)?;
        self.send(reg)?;
        self.send(value)
    }
}

impl<R: RegisterAccess> BusController for ImxI2c<R> {
    fn init(&mut self) -> Result<(), BusError> {
        for pad in self.pads {
            setup_pad(&mut self.regs, IOMUXC_BASE, pad);
        }
        if let Some(gate) = self.clock_gate {
            Ccm::new(&mut self.regs, CCM_BASE).enable_gate(gate);
        }

        self.write(IADR, 0);
        self.write(IFDR, IFDR_100KHZ);
        self.write(I2CR, 0);
        self.write(I2SR, 0);
        self.write(I2CR, I2cr::IEN.bits());
        self.initialized = true;
        log::debug!("i2c@{:#x}: initialized", self.base);
        Ok(())
    }
}

impl<R: RegisterAccess> TwoWireBus for ImxI2c<R> {
    fn read_reg(&mut self, addr: u8, reg: u8) -> Result<u8, BusError> {
        self.start()?;
        let result = self.transfer_read(addr, reg);
        if result.is_err() {
            self.stop();
        }
        result
    }

    fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
        self.start()?;
        let result = self.transfer_write(addr, reg, value);
        self.stop();
        result
    }
}
