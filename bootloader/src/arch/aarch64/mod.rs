//! AArch64 CPU support for the i.MX8M application cores

pub mod boot;

use core::arch::asm;

use aarch64_cpu::asm::barrier;
use aarch64_cpu::registers::{CNTFRQ_EL0, CNTPCT_EL0, CurrentEL, Readable};
use moduline_api::Delay;

use super::ExceptionLevel;
use crate::config;

/// Exception level of the running code
pub fn current_el() -> ExceptionLevel {
    ExceptionLevel::from_current_el(CurrentEL.get())
}

#[inline(always)]
pub fn disable_all_interrupts() {
    unsafe { asm!("msr daifset, #0xf", options(nomem, nostack)) };
}

#[inline(always)]
pub fn memory_barriers() {
    barrier::dsb(barrier::SY);
    barrier::isb(barrier::SY);
}

/// Discard stale instructions after code was written or relocated
pub fn invalidate_icache() {
    unsafe { asm!("ic iallu", options(nostack)) };
    memory_barriers();
}

pub fn halt() -> ! {
    disable_all_interrupts();
    loop {
        aarch64_cpu::asm::wfi();
    }
}

/// Enter TF-A BL31 at `entry`
///
/// BL31 expects to be entered at EL3 with SP_EL2 pointing just below its
/// own image; it returns to BL33 in the normal world.
///
/// # Safety
/// `entry` must hold a complete BL31 image.
pub unsafe fn start_bl31(entry: usize) -> ! {
    memory_barriers();
    unsafe {
        asm!(
            "msr sp_el2, {stack}",
            "br {entry}",
            stack = in(reg) entry - 16,
            entry = in(reg) entry,
            options(noreturn),
        )
    }
}

/// Start a normal-world image with the flattened description in x0
///
/// # Safety
/// `entry` must hold an image that follows the arm64 boot protocol.
pub unsafe fn start_next_stage(entry: usize, fdt: usize) -> ! {
    memory_barriers();
    invalidate_icache();
    unsafe {
        asm!(
            "br {entry}",
            entry = in(reg) entry,
            in("x0") fdt,
            in("x1") 0usize,
            in("x2") 0usize,
            in("x3") 0usize,
            options(noreturn),
        )
    }
}

/// Busy-wait delay on the generic timer
pub struct TimerDelay {
    freq: u64,
}

impl TimerDelay {
    pub fn new() -> Self {
        let freq = match CNTFRQ_EL0.get() {
            0 => config::SYSTEM_COUNTER_HZ,
            freq => freq,
        };
        Self { freq }
    }
}

impl Default for TimerDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl Delay for TimerDelay {
    fn delay_us(&mut self, us: u32) {
        let ticks = self.freq * us as u64 / 1_000_000;
        let start = CNTPCT_EL0.get();
        while CNTPCT_EL0.get().wrapping_sub(start) < ticks {
            core::hint::spin_loop();
        }
    }
}
