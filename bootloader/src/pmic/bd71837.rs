//! ROHM BD71837 register map and the Ka-Ro TX8M-1610 program
//!
//! Voltage registers are write protected while `REGLOCK.VREG` is set, so the
//! program unlocks first and relocks as its last step.

use super::{PowerRailProgram, RailStep};

pub const I2C_ADDR: u8 = 0x4b;

pub const REV: u8 = 0x00;
pub const PWRONCONFIG1: u8 = 0x04;
pub const BUCK1_CTRL: u8 = 0x05;
pub const BUCK2_CTRL: u8 = 0x06;
pub const BUCK3_CTRL: u8 = 0x07;
pub const BUCK4_CTRL: u8 = 0x08;
pub const NODVS_BUCK1_CTRL: u8 = 0x09;
pub const NODVS_BUCK2_CTRL: u8 = 0x0a;
pub const NODVS_BUCK3_CTRL: u8 = 0x0b;
pub const NODVS_BUCK4_CTRL: u8 = 0x0c;
pub const BUCK1_VOLT_RUN: u8 = 0x0d;
pub const BUCK1_VOLT_IDLE: u8 = 0x0e;
pub const BUCK1_VOLT_SUSP: u8 = 0x0f;
pub const BUCK2_VOLT_RUN: u8 = 0x10;
pub const BUCK2_VOLT_IDLE: u8 = 0x11;
pub const BUCK3_VOLT_RUN: u8 = 0x12;
pub const BUCK4_VOLT_RUN: u8 = 0x13;
pub const NODVS_BUCK1_VOLT: u8 = 0x14;
pub const NODVS_BUCK2_VOLT: u8 = 0x15;
pub const NODVS_BUCK3_VOLT: u8 = 0x16;
pub const NODVS_BUCK4_VOLT: u8 = 0x17;
pub const LDO1_VOLT: u8 = 0x18;
pub const LDO2_VOLT: u8 = 0x19;
pub const LDO3_VOLT: u8 = 0x1a;
pub const LDO4_VOLT: u8 = 0x1b;
pub const LDO5_VOLT: u8 = 0x1c;
pub const LDO6_VOLT: u8 = 0x1d;
pub const REGLOCK: u8 = 0x2f;

pub const REGLOCK_PWRSEQ: u8 = 0x01;
pub const REGLOCK_VREG: u8 = 0x10;

/// Registers ignored while `REGLOCK_VREG` is set
pub const fn is_voltage_reg(reg: u8) -> bool {
    matches!(reg, BUCK1_CTRL..=LDO6_VOLT)
}

pub static KARO_TX8M_1610: PowerRailProgram = PowerRailProgram {
    device: "bd71837",
    steps: &[
        // RESET key long push 10 ms instead of 10 s
        RailStep::write(PWRONCONFIG1, 0x00),
        // unlock
        RailStep::write(REGLOCK, REGLOCK_PWRSEQ),
        RailStep::write(NODVS_BUCK1_CTRL, 0x00),
        RailStep::write(NODVS_BUCK2_CTRL, 0x00),
        RailStep::write(NODVS_BUCK3_CTRL, 0x00),
        // VDD_SOC 0.9 V
        RailStep::write(BUCK1_VOLT_RUN, 0x14),
        // VDD_ARM 0.9 V
        RailStep::write(BUCK2_VOLT_RUN, 0x0f),
        RailStep::write(BUCK2_VOLT_IDLE, 0x0b),
        // VDD_DRAM 0.9 V
        RailStep::write(NODVS_BUCK1_VOLT, 0x02),
        // 3V3
        RailStep::write(NODVS_BUCK2_VOLT, 0x03),
        // 1V8
        RailStep::write(NODVS_BUCK3_VOLT, 0x03),
        // NVCC_DRAM 1.35 V
        RailStep::write(NODVS_BUCK4_VOLT, 0x1e),
        RailStep::write(BUCK1_CTRL, 0xc1),
        RailStep::write(BUCK2_CTRL, 0xc1),
        RailStep::write(NODVS_BUCK1_CTRL, 0x01),
        RailStep::write(NODVS_BUCK2_CTRL, 0x01),
        RailStep::write(NODVS_BUCK3_CTRL, 0x01),
        RailStep::write(NODVS_BUCK4_CTRL, 0x01),
        RailStep::write(LDO1_VOLT, 0x62),
        RailStep::write(LDO2_VOLT, 0x60),
        RailStep::write(LDO3_VOLT, 0x40),
        RailStep::write(LDO4_VOLT, 0x40),
        RailStep::write(LDO6_VOLT, 0x43),
        // relock
        RailStep::write(REGLOCK, REGLOCK_VREG | REGLOCK_PWRSEQ),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_unlocks_before_voltages_and_relocks_last() {
        let steps = KARO_TX8M_1610.steps;
        let unlock = steps.iter().position(|s| s.reg() == REGLOCK).unwrap();
        let first_voltage = steps.iter().position(|s| is_voltage_reg(s.reg())).unwrap();
        assert!(unlock < first_voltage);
        assert_eq!(steps.last(), Some(&RailStep::write(REGLOCK, REGLOCK_VREG | REGLOCK_PWRSEQ)));
    }
}
