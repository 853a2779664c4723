// Boot phase tracking; the last phase reached is printed with fatal errors

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Start = 0,
    Relocated = 1,
    ConsoleReady = 2,
    ClocksReady = 3,
    RailsReady = 4,
    DramReady = 5,
    Handoff = 6,
    BoardStage = 7,
    VariantProbed = 8,
    OverlayApplied = 9,
    ReadyToJump = 10,
}

impl BootPhase {
    const ALL: [BootPhase; 11] = [
        BootPhase::Start,
        BootPhase::Relocated,
        BootPhase::ConsoleReady,
        BootPhase::ClocksReady,
        BootPhase::RailsReady,
        BootPhase::DramReady,
        BootPhase::Handoff,
        BootPhase::BoardStage,
        BootPhase::VariantProbed,
        BootPhase::OverlayApplied,
        BootPhase::ReadyToJump,
    ];

    fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as u32)
    }
}

pub struct BootState {
    current_phase: AtomicU32,
    failed: AtomicBool,
}

impl BootState {
    pub const fn new() -> Self {
        Self {
            current_phase: AtomicU32::new(BootPhase::Start as u32),
            failed: AtomicBool::new(false),
        }
    }

    pub fn set_phase(&self, phase: BootPhase) {
        self.current_phase.store(phase as u32, Ordering::Release);
    }

    /// Last phase reached; an error does not reset it
    pub fn phase(&self) -> BootPhase {
        BootPhase::from_u32(self.current_phase.load(Ordering::Acquire)).unwrap_or(BootPhase::Start)
    }

    pub fn set_error(&self) {
        self.failed.store(true, Ordering::Release);
    }

    pub fn is_error(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

impl Default for BootState {
    fn default() -> Self {
        Self::new()
    }
}

pub static BOOT_STATE: BootState = BootState::new();

pub fn set_phase(phase: BootPhase) {
    BOOT_STATE.set_phase(phase);
}

pub fn phase() -> BootPhase {
    BOOT_STATE.phase()
}

pub fn set_error() {
    BOOT_STATE.set_error();
}

pub fn is_error() -> bool {
    BOOT_STATE.is_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_keeps_the_last_phase() {
        let state = BootState::new();
        assert_eq!(state.phase(), BootPhase::Start);
        state.set_phase(BootPhase::DramReady);
        assert!(!state.is_error());
        state.set_error();
        assert!(state.is_error());
        assert_eq!(state.phase(), BootPhase::DramReady);
    }

    #[test]
    fn test_phase_numbers_round_trip() {
        for phase in BootPhase::ALL {
            assert_eq!(BootPhase::from_u32(phase as u32), Some(phase));
        }
        assert_eq!(BootPhase::from_u32(11), None);
        assert_eq!(BootPhase::RailsReady.to_string(), "RailsReady (4)");
    }
}
