// NXP PCA9450 register map and the Moduline Display program

use super::{PowerRailProgram, RailStep};

pub const I2C_ADDR: u8 = 0x25;

pub const DEV_ID: u8 = 0x00;
pub const RESET_CTRL: u8 = 0x08;
pub const BUCK123_DVS: u8 = 0x0c;
pub const BUCK1CTRL: u8 = 0x10;
pub const BUCK1OUT_DVS0: u8 = 0x11;
pub const BUCK1OUT_DVS1: u8 = 0x12;
pub const BUCK2CTRL: u8 = 0x13;
pub const BUCK2OUT_DVS0: u8 = 0x14;
pub const BUCK2OUT_DVS1: u8 = 0x15;
pub const BUCK3CTRL: u8 = 0x16;
pub const BUCK3OUT_DVS0: u8 = 0x17;

/// VDD_SOC, VDD_ARM and VDD_DRAM to 0.95 V before the first DRAM access
pub static MODULINE_DISPLAY: PowerRailProgram = PowerRailProgram {
    device: "pca9450",
    steps: &[
        // BUCKxOUT_DVS0/1 control BUCK123 output
        RailStep::write(BUCK123_DVS, 0x29),
        // VDD_SOC 0.95 V, 0.85 V in suspend
        RailStep::write(BUCK1OUT_DVS0, 0x1c),
        RailStep::write(BUCK1OUT_DVS1, 0x14),
        // VDD_ARM and VDD_DRAM 0.95 V, covers a later switch to overdrive
        RailStep::write(BUCK2OUT_DVS0, 0x1c),
        RailStep::write(BUCK3OUT_DVS0, 0x1c),
        // DVS through PMIC_STBY_REQ, B1_ENMODE on PMIC_ON_REQ
        RailStep::write(BUCK1CTRL, 0x59),
        // WDOG_B triggers a cold reset
        RailStep::write(RESET_CTRL, 0xa1),
    ],
};
