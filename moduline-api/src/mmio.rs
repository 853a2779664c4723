//! Memory-mapped register access

/// 32-bit register access by physical address
///
/// Implemented with volatile pointer accesses on the target and by a
/// simulated register file in host tests.
pub trait RegisterAccess {
    fn read32(&mut self, addr: usize) -> u32;

    fn write32(&mut self, addr: usize, value: u32);

    /// Read-modify-write: clear `clear` bits, then set `set` bits
    fn modify32(&mut self, addr: usize, clear: u32, set: u32) {
        let value = self.read32(addr);
        self.write32(addr, (value & !clear) | set);
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    fn read32(&mut self, addr: usize) -> u32 {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: usize, value: u32) {
        (**self).write32(addr, value)
    }
}
