//! Ka-Ro TX8M-1610 on the test carrier
//!
//! i.MX8MM with DDR3L and a BD71837 PMIC. The image may come from the
//! on-module eMMC or from the SD slot; whichever one the boot ROM used
//! keeps the environment and is the default update target.

use moduline_api::{BootSource, FlashHandler, FlashKind, HandlerFlags};

use super::tx8m_1610_ddr3::TX8M_1610_DRAM_TIMING;
use super::{BoardContext, BoardDescriptor, BoardId, I2cConfig, UartConfig};
use crate::error::Result;
use crate::pmic::{PmicConfig, bd71837};
use crate::soc::imx8m::ccm::{CCGR_I2C1, CCGR_UART3, IMX8MM_EARLY_CLOCKS, ROOT_UART3};
use crate::soc::imx8m::iomux::mx8mm;
use crate::soc::imx8m::{I2C1_BASE, Soc, UART3_BASE};

/// USDHC instance of the SD slot
const SD_INSTANCE: u8 = 1;

pub(super) const UART: UartConfig = UartConfig {
    base: UART3_BASE,
    pads: &[mx8mm::UART3_TXD, mx8mm::UART3_RXD],
    clock_root: ROOT_UART3,
    clock_gate: CCGR_UART3,
};

pub(super) const POWER_BUS: I2cConfig = I2cConfig {
    alias: "i2c0",
    base: I2C1_BASE,
    pads: &[mx8mm::I2C1_SCL, mx8mm::I2C1_SDA],
    clock_gate: CCGR_I2C1,
};

pub(super) const PMIC: PmicConfig = PmicConfig {
    addr: bd71837::I2C_ADDR,
    program: &bd71837::KARO_TX8M_1610,
};

pub static TX8M_1610_TEST: BoardDescriptor = BoardDescriptor {
    id: BoardId::KaroTx8m1610Test,
    name: "Ka-Ro TX8M-1610 test",
    soc: Soc::Imx8mm,
    entry: "start_karo_tx8m_1610_test",
    compatible: &["karo,tx8m-1610"],
    uart: UART,
    clocks: &IMX8MM_EARLY_CLOCKS,
    keep_alive: None,
    power_bus: POWER_BUS,
    pmic: PMIC,
    dram: &TX8M_1610_DRAM_TIMING,
    dtb: include_bytes!("../../dts/imx8mm-karo-tx8m-1610.dtb"),
    i2c_adapters: &[],
    gpio_banks: &[],
    probe,
};

fn probe(ctx: &mut BoardContext<'_>) -> Result<()> {
    let from_sd = ctx.services.boot_source() == BootSource::Mmc { instance: SD_INSTANCE };

    let (env_path, emmc_flags, sd_flags) = if from_sd {
        ("/chosen/environment-sd", HandlerFlags::empty(), HandlerFlags::DEFAULT)
    } else {
        ("/chosen/environment-emmc", HandlerFlags::DEFAULT, HandlerFlags::empty())
    };
    if !ctx.tree.set_status(env_path, "okay") {
        log::warn!("{}: no such node", env_path);
    }

    ctx.services.register_flash_handler(FlashHandler {
        name: "eMMC",
        device: "/dev/mmc0",
        kind: FlashKind::MmcBootPartition,
        flags: emmc_flags,
    });
    ctx.services.register_flash_handler(FlashHandler {
        name: "SD",
        device: "/dev/mmc1.barebox",
        kind: FlashKind::MmcUserArea,
        flags: sd_flags,
    });
    Ok(())
}
