//! GOcontroll Moduline Display 106/107
//!
//! Ka-Ro TX8P-ML81 (i.MX8MP, LPDDR4) on a carrier that latches its own
//! supply through GPIO4_IO04: the pin must be driven high before the PMIC
//! is touched or the board switches off when the button is released.
//!
//! Two panel assemblies share the carrier. Only the AV101 panel populates
//! a touch controller at 0x24 on I2C4, so one register read decides which
//! overlay describes the display.

use moduline_api::{DefaultEnv, FlashHandler, FlashKind, GpioPin, HandlerFlags, Level};

use super::tx8p_ml81_lpddr4::TX8P_ML81_DRAM_TIMING;
use super::{BoardContext, BoardDescriptor, BoardId, GpioBankConfig, I2cConfig, KeepAlive, UartConfig};
use crate::error::Result;
use crate::pmic::{PmicConfig, pca9450};
use crate::registry::{ProbeHandle, ProbeRole};
use crate::soc::imx8m::ccm::{CCGR_I2C1, CCGR_I2C4, CCGR_UART1, IMX8MP_EARLY_CLOCKS, ROOT_UART1};
use crate::soc::imx8m::iomux::mx8mp;
use crate::soc::imx8m::{I2C1_BASE, I2C4_BASE, Soc, UART1_BASE};
use crate::state::{self, BootPhase};
use crate::variant::{DisplayVariant, OverlayFragment, OverlayResolver, OverlayTable, VariantProber};

/// AV101 touch controller
pub const TOUCH_ADDR: u8 = 0x24;
/// Touch controller reset, active low
pub const TOUCH_RESET: GpioPin = GpioPin::new(4, 13);

pub const TOUCH_ROLE: ProbeRole = ProbeRole {
    name: "av101 touchscreen",
    bus_alias: "i2c3",
    gpio_alias: "gpio3",
};

pub static DISPLAY_OVERLAYS: OverlayTable = [
    OverlayFragment {
        variant: DisplayVariant::Av101hdtA10,
        blob: include_bytes!("../../dts/imx8mp-tx8p-ml81-moduline-display-106-av101hdt-a10.dtbo"),
    },
    OverlayFragment {
        variant: DisplayVariant::Av123z7mN17,
        blob: include_bytes!("../../dts/imx8mp-tx8p-ml81-moduline-display-106-av123z7m-n17.dtbo"),
    },
];

const UART: UartConfig = UartConfig {
    base: UART1_BASE,
    pads: &[mx8mp::UART1_TXD, mx8mp::UART1_RXD],
    clock_root: ROOT_UART1,
    clock_gate: CCGR_UART1,
};

const KEEP_ALIVE: KeepAlive = KeepAlive {
    pad: mx8mp::SAI1_RXD2_GPIO4_IO04,
    pin: GpioPin::new(4, 4),
};

const POWER_BUS: I2cConfig = I2cConfig {
    alias: "i2c0",
    base: I2C1_BASE,
    pads: &[mx8mp::I2C1_SCL, mx8mp::I2C1_SDA],
    clock_gate: CCGR_I2C1,
};

const PMIC: PmicConfig = PmicConfig {
    addr: pca9450::I2C_ADDR,
    program: &pca9450::MODULINE_DISPLAY,
};

const TOUCH_BUS: I2cConfig = I2cConfig {
    alias: "i2c3",
    base: I2C4_BASE,
    pads: &[mx8mp::I2C4_SCL, mx8mp::I2C4_SDA],
    clock_gate: CCGR_I2C4,
};

const TOUCH_GPIO: GpioBankConfig = GpioBankConfig { alias: "gpio3", bank: 4 };

pub static DISPLAY_106: BoardDescriptor = BoardDescriptor {
    id: BoardId::GocontrollDisplay106,
    name: "GOcontroll Moduline Display 106",
    soc: Soc::Imx8mp,
    entry: "start_gocontroll_display_106",
    compatible: &["gocontroll,moduline-display-106"],
    uart: UART,
    clocks: &IMX8MP_EARLY_CLOCKS,
    keep_alive: Some(KEEP_ALIVE),
    power_bus: POWER_BUS,
    pmic: PMIC,
    dram: &TX8P_ML81_DRAM_TIMING,
    dtb: include_bytes!("../../dts/imx8mp-tx8p-ml81-moduline-display-106.dtb"),
    i2c_adapters: &[TOUCH_BUS],
    gpio_banks: &[TOUCH_GPIO],
    probe,
};

pub static DISPLAY_107: BoardDescriptor = BoardDescriptor {
    id: BoardId::GocontrollDisplay107,
    name: "GOcontroll Moduline Display 107",
    soc: Soc::Imx8mp,
    entry: "start_gocontroll_display_107",
    compatible: &["gocontroll,moduline-display-107"],
    uart: UART,
    clocks: &IMX8MP_EARLY_CLOCKS,
    keep_alive: Some(KEEP_ALIVE),
    power_bus: POWER_BUS,
    pmic: PMIC,
    dram: &TX8P_ML81_DRAM_TIMING,
    dtb: include_bytes!("../../dts/imx8mp-tx8p-ml81-moduline-display-107.dtb"),
    i2c_adapters: &[TOUCH_BUS],
    gpio_banks: &[TOUCH_GPIO],
    probe,
};

fn probe(ctx: &mut BoardContext<'_>) -> Result<()> {
    ctx.services.register_flash_handler(FlashHandler {
        name: "emmc",
        device: "/dev/mmc0",
        kind: FlashKind::MmcBootPartition,
        flags: HandlerFlags::DEFAULT,
    });
    ctx.services.append_default_env(DefaultEnv::GocontrollDisplay);

    ctx.registry.ensure_probed_by_alias(ctx.tree, TOUCH_ROLE.gpio_alias);
    ctx.registry.ensure_probed_by_alias(ctx.tree, TOUCH_ROLE.bus_alias);
    let ProbeHandle { bus, gpio } = ctx.registry.resolve(&TOUCH_ROLE)?;

    gpio.set_output(TOUCH_RESET, Level::High).map_err(|err| {
        log::error!("{} reset: {}", TOUCH_ROLE.name, err);
        err
    })?;

    let result = VariantProber::new(TOUCH_ADDR).probe(bus, &mut *ctx.delay);
    state::set_phase(BootPhase::VariantProbed);

    OverlayResolver::new(&DISPLAY_OVERLAYS).resolve(result, ctx.tree, ctx.session)?;
    state::set_phase(BootPhase::OverlayApplied);
    Ok(())
}
