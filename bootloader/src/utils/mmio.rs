// Memory-mapped I/O utilities

use core::ptr::{read_volatile, write_volatile};

use moduline_api::RegisterAccess;

/// Volatile access to the physical address space
///
/// Zero sized: every access carries its absolute address, so drivers can be
/// handed a `RawMmio` and a base address and be tested against a
/// [`SimRegisters`](super::sim::SimRegisters) instead.
#[derive(Debug)]
pub struct RawMmio {
    _private: (),
}

impl RawMmio {
    /// Create a physical address space accessor
    ///
    /// # Safety
    /// - Every address later passed to `read32`/`write32` must be a valid,
    ///   4-byte aligned device register or memory location
    /// - The MMU must be off or map those addresses as device memory
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterAccess for RawMmio {
    fn read32(&mut self, addr: usize) -> u32 {
        unsafe { read_volatile(addr as *const u32) }
    }

    fn write32(&mut self, addr: usize, value: u32) {
        unsafe { write_volatile(addr as *mut u32, value) }
    }
}

/// Copy `data` to physical address `dest` with byte-wise volatile stores
///
/// # Safety
/// `dest..dest + data.len()` must be writable memory that does not overlap
/// the running image.
pub unsafe fn copy_to_phys(dest: usize, data: &[u8]) {
    let dst = dest as *mut u8;
    for (i, byte) in data.iter().enumerate() {
        unsafe { write_volatile(dst.add(i), *byte) };
    }
}
