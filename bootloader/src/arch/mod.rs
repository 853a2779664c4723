//! Architecture support
//!
//! Exception-level decoding and self relocation are plain data handling and
//! build everywhere. Everything that touches system registers lives in the
//! `aarch64` module and only exists on that target.

#[cfg(target_arch = "aarch64")]
pub mod aarch64;
pub mod relocate;

/// ARMv8 exception level the CPU is executing at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExceptionLevel {
    El0,
    El1,
    El2,
    El3,
}

impl ExceptionLevel {
    /// Decode a raw `CurrentEL` register value (level in bits [3:2])
    pub const fn from_current_el(raw: u64) -> Self {
        match (raw >> 2) & 0b11 {
            0 => ExceptionLevel::El0,
            1 => ExceptionLevel::El1,
            2 => ExceptionLevel::El2,
            _ => ExceptionLevel::El3,
        }
    }

    pub const fn number(&self) -> u8 {
        match self {
            ExceptionLevel::El0 => 0,
            ExceptionLevel::El1 => 1,
            ExceptionLevel::El2 => 2,
            ExceptionLevel::El3 => 3,
        }
    }

    /// Only EL3 runs in the secure monitor state
    pub const fn is_secure_monitor(&self) -> bool {
        matches!(self, ExceptionLevel::El3)
    }
}
