//! Boot-time allocator for the normal-world stage
//!
//! A bump allocator over a fixed DRAM window. It only becomes usable after
//! memory training, so the on-chip-RAM path must not allocate. Freed memory
//! is never reused; the stage is short lived and hands everything to the
//! next image.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};

pub struct BumpHeap {
    base: usize,
    size: usize,
    offset: AtomicUsize,
}

impl BumpHeap {
    /// Create an allocator over `base..base + size`
    pub const fn new(base: usize, size: usize) -> Self {
        Self {
            base,
            size,
            offset: AtomicUsize::new(0),
        }
    }

    /// Bytes handed out so far, including alignment padding
    pub fn allocated(&self) -> usize {
        self.offset.load(Ordering::Relaxed)
    }

    /// Remaining free space
    pub fn free(&self) -> usize {
        self.size - self.allocated()
    }

    const fn align_up(value: usize, align: usize) -> usize {
        (value + align - 1) & !(align - 1)
    }
}

unsafe impl GlobalAlloc for BumpHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let mut current = self.offset.load(Ordering::Relaxed);
        loop {
            let start = Self::align_up(self.base + current, layout.align()) - self.base;
            let end = match start.checked_add(layout.size()) {
                Some(end) if end <= self.size => end,
                _ => return ptr::null_mut(),
            };
            match self
                .offset
                .compare_exchange_weak(current, end, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return (self.base + start) as *mut u8,
                Err(observed) => current = observed,
            }
        }
    }

    unsafe fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {}
}
