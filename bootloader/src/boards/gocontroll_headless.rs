//! GOcontroll headless controller
//!
//! Same TX8M-1610 module as the Ka-Ro test board; boots from eMMC only.

use moduline_api::{DefaultEnv, FlashHandler, FlashKind, HandlerFlags};

use super::karo_tx8m_1610::{PMIC, POWER_BUS, UART};
use super::tx8m_1610_ddr3::TX8M_1610_DRAM_TIMING;
use super::{BoardContext, BoardDescriptor, BoardId};
use crate::error::Result;
use crate::soc::imx8m::Soc;
use crate::soc::imx8m::ccm::IMX8MM_EARLY_CLOCKS;

pub static HEADLESS: BoardDescriptor = BoardDescriptor {
    id: BoardId::GocontrollHeadless,
    name: "GOcontroll headless",
    soc: Soc::Imx8mm,
    entry: "start_gocontroll_headless",
    compatible: &["karo,imx8mm-tx8m-1610"],
    uart: UART,
    clocks: &IMX8MM_EARLY_CLOCKS,
    keep_alive: None,
    power_bus: POWER_BUS,
    pmic: PMIC,
    dram: &TX8M_1610_DRAM_TIMING,
    dtb: include_bytes!("../../dts/imx8mm-gocontroll-headless.dtb"),
    i2c_adapters: &[],
    gpio_banks: &[],
    probe,
};

fn probe(ctx: &mut BoardContext<'_>) -> Result<()> {
    ctx.services.register_flash_handler(FlashHandler {
        name: "emmc",
        device: "/dev/mmc0",
        kind: FlashKind::MmcBootPartition,
        flags: HandlerFlags::DEFAULT,
    });
    ctx.services.append_default_env(DefaultEnv::GocontrollHeadless);
    Ok(())
}
