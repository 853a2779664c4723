//! NXP i.MX8M Mini and Plus
//!
//! Peripheral base addresses are identical on both parts for everything
//! the early stage touches; only the BL31 load address and the pad map
//! differ.

pub mod atf;
pub mod bootsource;
pub mod ccm;
pub mod ddr;
pub mod gpio;
pub mod i2c;
pub mod iomux;

pub const IOMUXC_BASE: usize = 0x3033_0000;
pub const ANATOP_BASE: usize = 0x3036_0000;
pub const CCM_BASE: usize = 0x3038_0000;
pub const SRC_BASE: usize = 0x3039_0000;

pub const GPIO1_BASE: usize = 0x3020_0000;
pub const GPIO_BANK_STRIDE: usize = 0x1_0000;

pub const UART1_BASE: usize = 0x3086_0000;
pub const UART2_BASE: usize = 0x3089_0000;
pub const UART3_BASE: usize = 0x3088_0000;

pub const I2C1_BASE: usize = 0x30a2_0000;
pub const I2C2_BASE: usize = 0x30a3_0000;
pub const I2C3_BASE: usize = 0x30a4_0000;
pub const I2C4_BASE: usize = 0x30a5_0000;

pub const DDRC_BASE: usize = 0x3d40_0000;
pub const DDRPHY_BASE: usize = 0x3c00_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Soc {
    Imx8mm,
    Imx8mp,
}

impl Soc {
    pub const fn name(&self) -> &'static str {
        match self {
            Soc::Imx8mm => "i.MX8MM",
            Soc::Imx8mp => "i.MX8MP",
        }
    }

    /// Where BL31 is linked to run from on-chip RAM
    pub const fn bl31_base(&self) -> usize {
        match self {
            Soc::Imx8mm => 0x0092_0000,
            Soc::Imx8mp => 0x0097_0000,
        }
    }
}

/// Base address of GPIO bank `bank` (numbered from 1)
pub const fn gpio_base(bank: u8) -> usize {
    GPIO1_BASE + (bank as usize - 1) * GPIO_BANK_STRIDE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpio_bank_addresses() {
        assert_eq!(gpio_base(1), 0x3020_0000);
        assert_eq!(gpio_base(4), 0x3023_0000);
    }
}
