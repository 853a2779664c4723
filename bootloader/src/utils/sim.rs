//! Simulated register file
//!
//! A sparse map of 32-bit registers used for host-side tests of the early
//! drivers and for dry runs of register programs. Addresses can be
//! *pinned* to a constant value (status registers), given a queue of
//! values returned by successive reads (handshakes), or left as plain
//! storage that reads back the last write.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use hashbrown::HashMap;
use moduline_api::RegisterAccess;

#[derive(Debug, Default)]
pub struct SimRegisters {
    values: HashMap<usize, u32>,
    pinned: HashMap<usize, u32>,
    queued: HashMap<usize, VecDeque<u32>>,
    writes: Vec<(usize, u32)>,
    reads: usize,
}

impl SimRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stored value of `addr` without logging a write
    pub fn preset(&mut self, addr: usize, value: u32) {
        self.values.insert(addr, value);
    }

    /// Make `addr` always read `value`; writes are logged but ignored
    pub fn pin(&mut self, addr: usize, value: u32) {
        self.pinned.insert(addr, value);
    }

    /// Values returned by the next reads of `addr`, in order
    pub fn queue_reads(&mut self, addr: usize, values: &[u32]) {
        self.queued.entry(addr).or_default().extend(values.iter().copied());
    }

    /// Current stored value; pinned and queued values are not consulted
    pub fn value(&self, addr: usize) -> u32 {
        self.values.get(&addr).copied().unwrap_or(0)
    }

    /// Every write in issue order
    pub fn writes(&self) -> &[(usize, u32)] {
        &self.writes
    }

    /// Writes to a single address in issue order
    pub fn writes_to(&self, addr: usize) -> Vec<u32> {
        self.writes.iter().filter(|(a, _)| *a == addr).map(|(_, v)| *v).collect()
    }

    /// Index of the first write to `addr` in the write log
    pub fn first_write_index(&self, addr: usize) -> Option<usize> {
        self.writes.iter().position(|(a, _)| *a == addr)
    }

    pub fn read_count(&self) -> usize {
        self.reads
    }
}

impl RegisterAccess for SimRegisters {
    fn read32(&mut self, addr: usize) -> u32 {
        self.reads += 1;
        if let Some(value) = self.queued.get_mut(&addr).and_then(|queue| queue.pop_front()) {
            return value;
        }
        if let Some(value) = self.pinned.get(&addr) {
            return *value;
        }
        self.value(addr)
    }

    fn write32(&mut self, addr: usize, value: u32) {
        self.writes.push((addr, value));
        if !self.pinned.contains_key(&addr) {
            self.values.insert(addr, value);
        }
    }
}
