//! Image entry and C runtime setup
//!
//! Board entry points are generated with [`board_entry!`](crate::board_entry):
//! a naked stub that enables FP/SIMD at the current level, points SP at the
//! top of the on-chip stack and branches to Rust with x0-x2 untouched.

use core::ptr;

use crate::arch::relocate::{Elf64Rela, RelocError, apply_relocations};

unsafe extern "C" {
    static _text: u8;
    static __image_end: u8;
    static __rel_dyn_start: u8;
    static __rel_dyn_end: u8;
    static __bss_start: u8;
    static __bss_end: u8;
}

/// Patch the image for the address it runs at
///
/// # Safety
/// Must run before anything dereferences an absolute pointer, and only once.
pub unsafe fn relocate_to_current_adr() -> Result<usize, RelocError> {
    unsafe {
        // adrp-based symbol references yield run-time addresses
        let text = &raw const _text as *mut u8;
        let end = &raw const __image_end as *const u8;
        let rel_start = &raw const __rel_dyn_start as *const Elf64Rela;
        let rel_end = &raw const __rel_dyn_end as *const Elf64Rela;

        let image = core::slice::from_raw_parts_mut(text, end.offset_from(text) as usize);
        let relocs = core::slice::from_raw_parts(rel_start, rel_end.offset_from(rel_start) as usize);

        let patched = apply_relocations(image, relocs, text as u64)?;
        super::invalidate_icache();
        Ok(patched)
    }
}

/// Clear `.bss`
///
/// # Safety
/// Must run before any static in `.bss` is used.
pub unsafe fn zero_bss() {
    unsafe {
        let start = &raw const __bss_start as *mut u8;
        let end = &raw const __bss_end as *const u8;
        let size = end.offset_from(start) as usize;

        if size > 0 {
            ptr::write_bytes(start, 0, size);
        }
    }
}

/// Run-time address of the first byte of the image
pub fn image_base() -> usize {
    &raw const _text as usize
}

/// The loaded image, text through relocated data
///
/// # Safety
/// Only valid after relocation; the returned slice aliases running code.
pub unsafe fn image_bytes() -> &'static [u8] {
    unsafe {
        let text = &raw const _text;
        let end = &raw const __image_end;
        core::slice::from_raw_parts(text, end.offset_from(text) as usize)
    }
}

/// Define an image entry point that calls `$main(x0, x1, x2)`
///
/// The stub gets a section of its own, `.text.entry.<name>`, so that it is
/// the only code the linker script can place at offset 0.
#[macro_export]
macro_rules! board_entry {
    ($entry:ident => $main:path) => {
        #[unsafe(naked)]
        #[unsafe(no_mangle)]
        #[unsafe(link_section = concat!(".text.entry.", stringify!($entry)))]
        pub unsafe extern "C" fn $entry() -> ! {
            core::arch::naked_asm!(
                "mrs x9, CurrentEL",
                "cmp x9, #0xc",
                "b.ne 1f",
                "msr cptr_el3, xzr",
                "b 2f",
                "1:",
                "cmp x9, #0x8",
                "b.ne 2f",
                "mov x9, #0x33ff",
                "msr cptr_el2, x9",
                "2:",
                "isb",
                "adrp x9, __stack_top",
                "add x9, x9, :lo12:__stack_top",
                "mov sp, x9",
                "b {main}",
                main = sym $main,
            )
        }
    };
}
