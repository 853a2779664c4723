// Build-time configuration and memory layout

use log::LevelFilter;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Start of external DRAM on all supported SoCs
pub const DRAM_BASE: usize = 0x4000_0000;

/// Where TF-A returns to in the normal world (BL33)
pub const BL33_BASE: usize = 0x4020_0000;

/// Flattened hardware description handed to the next stage
pub const FDT_HANDOFF_BASE: usize = 0x4300_0000;
pub const FDT_HANDOFF_SIZE: usize = 0x10_0000;

/// Next stage image started once the board stage completes
pub const NEXT_STAGE_BASE: usize = 0x4040_0000;

/// Heap used by the normal-world board stage, DRAM only
pub const HEAP_BASE: usize = 0x4800_0000;
pub const HEAP_SIZE: usize = 0x100_0000;

/// Serial console settings
pub const UART_BAUD: u32 = 115_200;
pub const UART_REF_CLOCK_HZ: u32 = 24_000_000;

/// i.MX8M system counter rate, used if CNTFRQ_EL0 was never programmed
pub const SYSTEM_COUNTER_HZ: u64 = 8_000_000;

/// Polling bounds for hardware handshakes
pub const BUS_POLL_LIMIT: u32 = 100_000;
pub const DDR_POLL_LIMIT: u32 = 10_000_000;
pub const DDR_MAILBOX_LIMIT: u32 = 100_000;

/// Settle time after releasing the touch controller reset
pub const PROBE_SETTLE_MS: u32 = 10;

/// Boot session key carrying the overlay file pattern
pub const OVERLAY_PATTERN_KEY: &str = "of.overlay.pattern";

pub struct BootConfig {
    pub log_level: LevelFilter,
    pub debug_uart: bool,
}

impl BootConfig {
    pub const fn new() -> Self {
        Self {
            log_level: if cfg!(feature = "verbose_logging") {
                LevelFilter::Trace
            } else {
                LevelFilter::Info
            },
            debug_uart: cfg!(feature = "debug_uart"),
        }
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub static BOOT_CONFIG: BootConfig = BootConfig::new();
