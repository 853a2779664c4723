//! Moduline pre-bootloader image
//!
//! Each image build enables exactly one `image-*` feature, so the binary
//! carries a single board entry point. It sits in its own `.text.entry.*`
//! section, which the linker script places at offset 0 of the flat image.

#![no_std]
#![no_main]

extern crate alloc;

use core::fmt::Write;
use core::panic::PanicInfo;

use moduline_api::{BoardServices, BootSource, DefaultEnv, FlashHandler};
use moduline_bootloader::arch::aarch64;
use moduline_bootloader::boards::BoardDescriptor;
use moduline_bootloader::config::{HEAP_BASE, HEAP_SIZE};
use moduline_bootloader::console::ConsoleWriter;
use moduline_bootloader::dram::TrainingFirmware;
use moduline_bootloader::entry::{self, ImageBlobs};
use moduline_bootloader::heap::BumpHeap;
use moduline_bootloader::soc::imx8m::bootsource;
use moduline_bootloader::soc::imx8m::ddr::PhyFirmware;
use moduline_bootloader::utils::RawMmio;
use moduline_bootloader::{board_entry, state};

#[global_allocator]
static HEAP: BumpHeap = BumpHeap::new(HEAP_BASE, HEAP_SIZE);

static BL31: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/bl31.bin"));

const fn firmware(imem: &'static [u8], dmem: &'static [u8]) -> Option<TrainingFirmware> {
    if imem.is_empty() || dmem.is_empty() {
        None
    } else {
        Some(TrainingFirmware { imem, dmem })
    }
}

#[cfg(any(feature = "image-gocontroll-display-106", feature = "image-gocontroll-display-107"))]
static LPDDR4_PHY: PhyFirmware = PhyFirmware {
    one_d: firmware(
        include_bytes!(concat!(env!("OUT_DIR"), "/lpddr4_pmu_train_1d_imem.bin")),
        include_bytes!(concat!(env!("OUT_DIR"), "/lpddr4_pmu_train_1d_dmem.bin")),
    ),
    two_d: firmware(
        include_bytes!(concat!(env!("OUT_DIR"), "/lpddr4_pmu_train_2d_imem.bin")),
        include_bytes!(concat!(env!("OUT_DIR"), "/lpddr4_pmu_train_2d_dmem.bin")),
    ),
};

#[cfg(any(feature = "image-karo-tx8m-1610-test", feature = "image-gocontroll-headless"))]
static DDR3_PHY: PhyFirmware = PhyFirmware {
    one_d: firmware(
        include_bytes!(concat!(env!("OUT_DIR"), "/ddr3_imem_1d.bin")),
        include_bytes!(concat!(env!("OUT_DIR"), "/ddr3_dmem_1d.bin")),
    ),
    two_d: None,
};

/// Services of the surrounding boot environment
///
/// Flash handlers and default environments are implemented by the next
/// stage; here they are only announced.
struct ImageServices;

impl BoardServices for ImageServices {
    fn register_flash_handler(&mut self, handler: FlashHandler) {
        log::info!(
            "update handler {} -> {} ({:?}, {:?})",
            handler.name,
            handler.device,
            handler.kind,
            handler.flags
        );
    }

    fn append_default_env(&mut self, env: DefaultEnv) {
        log::info!("default environment {}", env.directory());
    }

    fn boot_source(&self) -> BootSource {
        // SAFETY: SRC is a valid register block with the MMU off
        bootsource::boot_source(&mut unsafe { RawMmio::new() })
    }
}

fn start(board: &'static BoardDescriptor, ddr_phy: PhyFirmware) -> ! {
    let blobs = ImageBlobs { bl31: BL31, ddr_phy };
    unsafe { entry::board_main(board, &mut ImageServices, &blobs) }
}

#[cfg(feature = "image-gocontroll-display-106")]
mod display_106 {
    use super::*;
    use moduline_bootloader::boards::gocontroll_display::DISPLAY_106;

    pub extern "C" fn display_106_main(_r0: usize, _r1: usize, _r2: usize) -> ! {
        start(&DISPLAY_106, LPDDR4_PHY)
    }

    board_entry!(start_gocontroll_display_106 => display_106_main);
}

#[cfg(feature = "image-gocontroll-display-107")]
mod display_107 {
    use super::*;
    use moduline_bootloader::boards::gocontroll_display::DISPLAY_107;

    pub extern "C" fn display_107_main(_r0: usize, _r1: usize, _r2: usize) -> ! {
        start(&DISPLAY_107, LPDDR4_PHY)
    }

    board_entry!(start_gocontroll_display_107 => display_107_main);
}

#[cfg(feature = "image-karo-tx8m-1610-test")]
mod karo {
    use super::*;
    use moduline_bootloader::boards::karo_tx8m_1610::TX8M_1610_TEST;

    pub extern "C" fn karo_test_main(_r0: usize, _r1: usize, _r2: usize) -> ! {
        start(&TX8M_1610_TEST, DDR3_PHY)
    }

    board_entry!(start_karo_tx8m_1610_test => karo_test_main);
}

#[cfg(feature = "image-gocontroll-headless")]
mod headless {
    use super::*;
    use moduline_bootloader::boards::gocontroll_headless::HEADLESS;

    pub extern "C" fn headless_main(_r0: usize, _r1: usize, _r2: usize) -> ! {
        start(&HEADLESS, DDR3_PHY)
    }

    board_entry!(start_gocontroll_headless => headless_main);
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let context = if state::is_error() { "while halting" } else { "after" };
    state::set_error();
    let _ = writeln!(ConsoleWriter, "PANIC {} {}: {}", context, state::phase(), info);
    aarch64::halt()
}
