//! Board support
//!
//! Every image the workspace can build is described by a static
//! [`BoardDescriptor`]. The secure stage uses the descriptor compiled into
//! its entry point; the normal-world stage picks the descriptor whose
//! compatible list matches the root of the hardware description, the way a
//! driver is bound to a device.

use moduline_api::{BoardServices, Delay, GpioPin, RegisterAccess};

use crate::config;
use crate::dram::MemoryTimingProfile;
use crate::drivers::ImxUart;
use crate::error::Result;
use crate::fdt::DeviceTree;
use crate::pmic::PmicConfig;
use crate::registry::PeripheralRegistry;
use crate::soc::imx8m::ccm::{Ccm, ClockPlan};
use crate::soc::imx8m::iomux::{Iomuxc, Pad, PadControl};
use crate::soc::imx8m::{CCM_BASE, IOMUXC_BASE, Soc};
use crate::variant::BootSession;

#[cfg(feature = "board-gocontroll-display")]
pub mod gocontroll_display;
#[cfg(feature = "board-gocontroll-headless")]
pub mod gocontroll_headless;
#[cfg(feature = "board-karo-tx8m-1610")]
pub mod karo_tx8m_1610;
#[cfg(feature = "board-karo-tx8m-1610")]
pub mod tx8m_1610_ddr3;
#[cfg(feature = "board-gocontroll-display")]
pub mod tx8p_ml81_lpddr4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardId {
    GocontrollDisplay106,
    GocontrollDisplay107,
    KaroTx8m1610Test,
    GocontrollHeadless,
}

/// Debug UART of a board
#[derive(Debug, Clone, Copy)]
pub struct UartConfig {
    pub base: usize,
    pub pads: &'static [Pad],
    pub clock_root: u32,
    pub clock_gate: u32,
}

impl UartConfig {
    /// Route the pads, clock the UART from the oscillator and program 8N1
    pub fn setup<R: RegisterAccess>(&self, regs: &mut R) {
        let mut pads = Iomuxc::new(&mut *regs, IOMUXC_BASE);
        for pad in self.pads {
            pads.setup_pad(pad);
        }
        Ccm::new(&mut *regs, CCM_BASE).setup_uart_clock(self.clock_root, self.clock_gate);
        ImxUart::new(&mut *regs, self.base).setup(config::UART_REF_CLOCK_HZ, config::UART_BAUD);
    }
}

/// I2C controller in front of the PMIC, or one handed to the board probe
#[derive(Debug, Clone, Copy)]
pub struct I2cConfig {
    pub alias: &'static str,
    pub base: usize,
    pub pads: &'static [Pad],
    pub clock_gate: u32,
}

/// GPIO bank made available to the board probe
#[derive(Debug, Clone, Copy)]
pub struct GpioBankConfig {
    pub alias: &'static str,
    pub bank: u8,
}

/// Pin that keeps the board powered once the power button is released
#[derive(Debug, Clone, Copy)]
pub struct KeepAlive {
    pub pad: Pad,
    pub pin: GpioPin,
}

/// What a board probe routine works on
pub struct BoardContext<'a> {
    pub tree: &'a mut DeviceTree,
    pub session: &'a mut BootSession,
    pub services: &'a mut dyn BoardServices,
    pub registry: &'a mut PeripheralRegistry,
    pub delay: &'a mut dyn Delay,
}

pub type ProbeFn = fn(&mut BoardContext<'_>) -> Result<()>;

pub struct BoardDescriptor {
    pub id: BoardId,
    pub name: &'static str,
    pub soc: Soc,
    /// Symbol of the image entry point
    pub entry: &'static str,
    pub compatible: &'static [&'static str],
    pub uart: UartConfig,
    pub clocks: &'static ClockPlan,
    pub keep_alive: Option<KeepAlive>,
    pub power_bus: I2cConfig,
    pub pmic: PmicConfig,
    pub dram: &'static MemoryTimingProfile,
    pub dtb: &'static [u8],
    /// Buses and GPIO banks the probe routine may resolve
    pub i2c_adapters: &'static [I2cConfig],
    pub gpio_banks: &'static [GpioBankConfig],
    pub probe: ProbeFn,
}

impl BoardDescriptor {
    pub fn is_compatible(&self, compatible: &str) -> bool {
        self.compatible.contains(&compatible)
    }
}

/// Boards compiled into this build
pub static BOARDS: &[&BoardDescriptor] = &[
    #[cfg(feature = "board-gocontroll-display")]
    &gocontroll_display::DISPLAY_106,
    #[cfg(feature = "board-gocontroll-display")]
    &gocontroll_display::DISPLAY_107,
    #[cfg(feature = "board-karo-tx8m-1610")]
    &karo_tx8m_1610::TX8M_1610_TEST,
    #[cfg(feature = "board-gocontroll-headless")]
    &gocontroll_headless::HEADLESS,
];

/// First board claiming one of the root compatibles, most specific first
pub fn match_compatible(tree: &DeviceTree) -> Option<&'static BoardDescriptor> {
    tree.compatible()
        .find_map(|compatible| BOARDS.iter().copied().find(|board| board.is_compatible(compatible)))
}
