//! Image entry flow
//!
//! Every board entry lands in [`board_main`] with its descriptor. The same
//! image runs twice: first from on-chip RAM at EL3, where it brings up the
//! hardware and starts TF-A, then from DRAM at EL2 after TF-A re-entered it
//! as BL33, where it probes the board and starts the next stage with the
//! final hardware description.

use alloc::boxed::Box;

use moduline_api::BoardServices;

use crate::arch::aarch64::{self, TimerDelay, boot};
use crate::boards::BoardDescriptor;
use crate::config::{self, BOOT_CONFIG};
use crate::console::{self, ConsoleWriter};
use crate::dram::MemoryTrainer;
use crate::drivers::ImxUart;
use crate::error::BootError;
use crate::fdt::{self, Property};
use crate::gate::{ExecutionContext, PrivilegeGate, SecureBringup, report_fatal};
use crate::registry::PeripheralRegistry;
use crate::soc::imx8m::atf::{ImxTfaLoader, PhysMemory};
use crate::soc::imx8m::ccm::Ccm;
use crate::soc::imx8m::ddr::{Imx8mDdrc, PhyFirmware};
use crate::soc::imx8m::gpio::ImxGpio;
use crate::soc::imx8m::i2c::ImxI2c;
use crate::soc::imx8m::iomux::Iomuxc;
use crate::soc::imx8m::{CCM_BASE, IOMUXC_BASE, gpio_base};
use crate::stage::{self, StageOutput};
use crate::state::{self, BootPhase};
use crate::utils::RawMmio;
use crate::utils::mmio::copy_to_phys;

/// Firmware blobs linked into the image
pub struct ImageBlobs {
    pub bl31: &'static [u8],
    pub ddr_phy: PhyFirmware,
}

fn mmio() -> RawMmio {
    // SAFETY: the MMU is off in both stages; drivers only touch SoC registers
    unsafe { RawMmio::new() }
}

fn uart_putc(base: usize, byte: u8) {
    ImxUart::new(mmio(), base).putc(byte);
}

fn halt_with(err: &BootError) -> ! {
    state::set_error();
    console::diag(format_args!("FATAL: {} after {}", err, state::phase()));
    aarch64::halt()
}

/// Common entry of all board images
///
/// # Safety
/// Must be the first Rust code to run after the entry stub; `board` must
/// describe the hardware the image runs on.
pub unsafe fn board_main(board: &'static BoardDescriptor, services: &mut dyn BoardServices, blobs: &ImageBlobs) -> ! {
    if let Err(err) = unsafe { boot::relocate_to_current_adr() } {
        halt_with(&err.into());
    }
    unsafe { boot::zero_bss() };
    state::set_phase(BootPhase::Relocated);

    // Also below EL3: the image may be entered without a secure pass first.
    board.uart.setup(&mut mmio());
    console::set_putc(uart_putc, board.uart.base);
    console::init_logger(BOOT_CONFIG.log_level);
    state::set_phase(BootPhase::ConsoleReady);
    let context = ExecutionContext::capture();
    let gate = PrivilegeGate::new(context);
    log::info!("{} {} at EL{}", board.name, config::BUILD_VERSION, context.level().number());
    if BOOT_CONFIG.debug_uart {
        log::debug!("image at {:#x}, uart {:#x}", boot::image_base(), board.uart.base);
    }

    let mut clocks = Ccm::new(mmio(), CCM_BASE);
    let mut pads = Iomuxc::new(mmio(), IOMUXC_BASE);
    let gpio_bank = board.keep_alive.map_or(1, |keep_alive| keep_alive.pin.bank);
    let mut gpio = ImxGpio::new(mmio(), gpio_bank, gpio_base(gpio_bank));
    let mut power_bus = ImxI2c::new(mmio(), board.power_bus.base)
        .with_pads(board.power_bus.pads)
        .with_clock_gate(board.power_bus.clock_gate);
    let mut trainer = MemoryTrainer::new(Imx8mDdrc::new(mmio(), blobs.ddr_phy));
    let mut firmware = ImxTfaLoader::new(PhysMemory, board.soc, blobs.bl31, unsafe { boot::image_bytes() });

    let mut bringup = SecureBringup {
        clocks: &mut clocks,
        pads: &mut pads,
        gpio: &mut gpio,
        power_bus: &mut power_bus,
        trainer: &mut trainer,
        firmware: &mut firmware,
    };
    let continuation = match gate.run(board, &mut bringup) {
        Ok(continuation) => continuation,
        Err(err) => {
            let _ = report_fatal(&err, state::phase(), &mut ConsoleWriter);
            aarch64::halt()
        }
    };

    let mut registry = peripheral_registry(board);
    let mut delay = TimerDelay::new();
    match stage::run_board_stage(continuation.dtb, services, &mut registry, &mut delay) {
        Ok(output) => handoff(output),
        Err(err) => halt_with(&err),
    }
}

/// Drivers the board probe may ask for, keyed by alias
fn peripheral_registry(board: &BoardDescriptor) -> PeripheralRegistry {
    let mut registry = PeripheralRegistry::new();
    for adapter in board.i2c_adapters {
        let bus = ImxI2c::new(mmio(), adapter.base)
            .with_pads(adapter.pads)
            .with_clock_gate(adapter.clock_gate);
        registry.register_bus(adapter.alias, Box::new(bus));
    }
    for bank in board.gpio_banks {
        registry.register_gpio(bank.alias, Box::new(ImxGpio::new(mmio(), bank.bank, gpio_base(bank.bank))));
    }
    registry
}

fn handoff(mut output: StageOutput) -> ! {
    if let Some(pattern) = output.session.pattern() {
        let chosen = output.tree.root.child_or_insert("chosen");
        chosen.set_property(Property::string(pattern.key(), pattern.glob()));
    }

    let blob = fdt::flatten(&output.tree);
    if blob.len() > config::FDT_HANDOFF_SIZE {
        log::error!("description of {} bytes does not fit the handoff area", blob.len());
        halt_with(&BootError::Tree(fdt::TreeError::Truncated));
    }
    unsafe { copy_to_phys(config::FDT_HANDOFF_BASE, &blob) };

    state::set_phase(BootPhase::ReadyToJump);
    log::info!(
        "{}: starting next stage at {:#x}, description at {:#x}",
        output.board.name,
        config::NEXT_STAGE_BASE,
        config::FDT_HANDOFF_BASE
    );
    unsafe { aarch64::start_next_stage(config::NEXT_STAGE_BASE, config::FDT_HANDOFF_BASE) }
}
