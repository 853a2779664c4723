// IOMUX pad configuration for the pads the early stage drives

use moduline_api::RegisterAccess;

const MUX_SION: u32 = 1 << 4;

/// Mux, pad-control and daisy-chain setting of one pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pad {
    pub mux_offset: u16,
    pub mux_mode: u8,
    pub sion: bool,
    pub pad_offset: u16,
    pub pad_ctl: Option<u32>,
    pub input: Option<(u16, u8)>,
}

impl Pad {
    pub const fn new(mux_offset: u16, mux_mode: u8, pad_offset: u16) -> Self {
        Self {
            mux_offset,
            mux_mode,
            sion: false,
            pad_offset,
            pad_ctl: None,
            input: None,
        }
    }

    pub const fn sion(mut self) -> Self {
        self.sion = true;
        self
    }

    pub const fn ctl(mut self, pad_ctl: u32) -> Self {
        self.pad_ctl = Some(pad_ctl);
        self
    }

    pub const fn input(mut self, offset: u16, select: u8) -> Self {
        self.input = Some((offset, select));
        self
    }
}

/// Write a pad's mux, optional daisy select and optional pad control
pub fn setup_pad<R: RegisterAccess>(regs: &mut R, iomuxc: usize, pad: &Pad) {
    let mut mux = pad.mux_mode as u32;
    if pad.sion {
        mux |= MUX_SION;
    }
    regs.write32(iomuxc + pad.mux_offset as usize, mux);

    if let Some((offset, select)) = pad.input {
        regs.write32(iomuxc + offset as usize, select as u32);
    }
    if let Some(ctl) = pad.pad_ctl {
        regs.write32(iomuxc + pad.pad_offset as usize, ctl);
    }
}

/// Pad configuration capability
pub trait PadControl {
    fn setup_pad(&mut self, pad: &Pad);
}

/// The IOMUX controller
pub struct Iomuxc<R: RegisterAccess> {
    regs: R,
    base: usize,
}

impl<R: RegisterAccess> Iomuxc<R> {
    pub fn new(regs: R, base: usize) -> Self {
        Self { regs, base }
    }
}

impl<R: RegisterAccess> PadControl for Iomuxc<R> {
    fn setup_pad(&mut self, pad: &Pad) {
        setup_pad(&mut self.regs, self.base, pad);
    }
}

pub mod mx8mp {
    use super::Pad;

    const PAD_CTL_DSE6: u32 = 0x2 << 1;
    const PAD_CTL_PUE: u32 = 1 << 6;
    const PAD_CTL_HYS: u32 = 1 << 7;
    const PAD_CTL_PE: u32 = 1 << 8;

    pub const UART_PAD_CTRL: u32 = PAD_CTL_PUE | PAD_CTL_PE;
    pub const I2C_PAD_CTRL: u32 = PAD_CTL_DSE6 | PAD_CTL_HYS | PAD_CTL_PUE | PAD_CTL_PE;

    pub const UART1_TXD: Pad = Pad::new(0x238, 0, 0x498).ctl(UART_PAD_CTRL);
    pub const UART1_RXD: Pad = Pad::new(0x234, 0, 0x494).ctl(UART_PAD_CTRL).input(0x5e8, 4);
    pub const I2C1_SCL: Pad = Pad::new(0x200, 0, 0x460).sion().ctl(I2C_PAD_CTRL).input(0x5a4, 2);
    pub const I2C1_SDA: Pad = Pad::new(0x204, 0, 0x464).sion().ctl(I2C_PAD_CTRL).input(0x5a8, 2);
    pub const I2C4_SCL: Pad = Pad::new(0x218, 0, 0x478).sion().ctl(I2C_PAD_CTRL).input(0x5c0, 6);
    pub const I2C4_SDA: Pad = Pad::new(0x21c, 0, 0x47c).sion().ctl(I2C_PAD_CTRL).input(0x5c4, 6);
    pub const SAI1_RXD2_GPIO4_IO04: Pad = Pad::new(0x0e0, 5, 0x340);
}

pub mod mx8mm {
    use super::Pad;

    const PAD_CTL_DSE_3P3V_45_OHM: u32 = 0x6;

    pub const UART_PAD_CTRL: u32 = PAD_CTL_DSE_3P3V_45_OHM;

    pub const UART3_TXD: Pad = Pad::new(0x23c, 0, 0x4a4).ctl(UART_PAD_CTRL);
    pub const UART3_RXD: Pad = Pad::new(0x238, 0, 0x4a0).ctl(UART_PAD_CTRL).input(0x504, 2);
    pub const I2C1_SCL: Pad = Pad::new(0x214, 0, 0x47c).sion();
    pub const I2C1_SDA: Pad = Pad::new(0x218, 0, 0x480).sion();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::imx8m::IOMUXC_BASE;
    use crate::utils::SimRegisters;

    #[test]
    fn test_i2c_pad_sets_sion_and_daisy() {
        let mut sim = SimRegisters::new();
        setup_pad(&mut sim, IOMUXC_BASE, &mx8mp::I2C1_SCL);

        assert_eq!(sim.value(IOMUXC_BASE + 0x200), MUX_SION);
        assert_eq!(sim.value(IOMUXC_BASE + 0x5a4), 2);
        assert_eq!(sim.value(IOMUXC_BASE + 0x460), mx8mp::I2C_PAD_CTRL);
    }

    #[test]
    fn test_pad_without_ctl_leaves_pad_register() {
        let mut sim = SimRegisters::new();
        setup_pad(&mut sim, IOMUXC_BASE, &mx8mm::I2C1_SDA);
        assert_eq!(sim.writes().len(), 1);
    }
}
