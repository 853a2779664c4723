//! Memory Trainer
//!
//! A [`MemoryTimingProfile`] describes everything the DDR controller and
//! PHY need: controller register table, PHY configuration, one training
//! message per frequency set point and the PHY init engine (PIE) table.
//! [`MemoryTrainer`] wraps a controller so a profile is consumed at most
//! once per boot.

use core::fmt;

/// Memory technology of a timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DramType {
    Ddr3,
    Ddr4,
    Lpddr4,
}

impl DramType {
    pub const fn name(&self) -> &'static str {
        match self {
            DramType::Ddr3 => "DDR3L",
            DramType::Ddr4 => "DDR4",
            DramType::Lpddr4 => "LPDDR4",
        }
    }
}

/// Register address and value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegPair {
    pub reg: u32,
    pub val: u32,
}

impl RegPair {
    pub const fn new(reg: u32, val: u32) -> Self {
        Self { reg, val }
    }
}

/// PHY training firmware variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingPass {
    OneD,
    TwoD,
}

/// PHY training message block for one frequency set point
#[derive(Debug, Clone, Copy)]
pub struct FspMessage {
    /// Data rate in MT/s
    pub drate: u16,
    pub pass: TrainingPass,
    pub cfg: &'static [RegPair],
}

/// DRAM parameters of one board
#[derive(Debug, Clone, Copy)]
pub struct MemoryTimingProfile {
    pub dram_type: DramType,
    pub ddrc_cfg: &'static [RegPair],
    pub ddrphy_cfg: &'static [RegPair],
    pub fsp_msg: &'static [FspMessage],
    pub ddrphy_pie: &'static [RegPair],
    /// Data rates of the set points, first entry is the boot rate
    pub fsp_table: [u16; 4],
}

impl MemoryTimingProfile {
    pub fn boot_rate(&self) -> u16 {
        self.fsp_table[0]
    }
}

/// PHY training firmware images, 16-bit words little endian
#[derive(Debug, Clone, Copy)]
pub struct TrainingFirmware {
    pub imem: &'static [u8],
    pub dmem: &'static [u8],
}

/// Handshake the DDR subsystem did not complete in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DramWait {
    PllLock,
    DfiInit,
    SwDone,
    NormalMode,
    Mailbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DramError {
    /// Training was already attempted in this boot
    AlreadyTrained,
    /// The DRAM PLL has no setting for this data rate
    UnsupportedRate(u16),
    /// No training message for a set point
    EmptyProfile,
    /// No firmware provided for a training pass
    MissingFirmware(TrainingPass),
    Timeout(DramWait),
    /// The PHY reported a training failure
    TrainingFailed { fsp: usize },
    /// The PHY kept sending progress messages
    MailboxOverflow { fsp: usize },
}

impl fmt::Display for DramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DramError::AlreadyTrained => write!(f, "memory already trained"),
            DramError::UnsupportedRate(rate) => write!(f, "unsupported data rate {} MT/s", rate),
            DramError::EmptyProfile => write!(f, "timing profile has no training messages"),
            DramError::MissingFirmware(pass) => write!(f, "no {:?} training firmware", pass),
            DramError::Timeout(wait) => write!(f, "timeout waiting for {:?}", wait),
            DramError::TrainingFailed { fsp } => write!(f, "training failed at set point {}", fsp),
            DramError::MailboxOverflow { fsp } => write!(f, "no training result at set point {}", fsp),
        }
    }
}

/// A DDR controller that can be brought up from a profile
pub trait DramController {
    fn init_and_train(&mut self, profile: &MemoryTimingProfile) -> Result<(), DramError>;
}

/// One-shot training capability used by the privilege gate
pub trait MemoryTraining {
    fn train(&mut self, profile: &MemoryTimingProfile) -> Result<(), DramError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Untrained,
    Trained,
    Failed,
}

/// Guards a controller so training runs at most once
pub struct MemoryTrainer<C: DramController> {
    controller: C,
    state: TrainerState,
}

impl<C: DramController> MemoryTrainer<C> {
    pub fn new(controller: C) -> Self {
        Self {
            controller,
            state: TrainerState::Untrained,
        }
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }
}

impl<C: DramController> MemoryTraining for MemoryTrainer<C> {
    fn train(&mut self, profile: &MemoryTimingProfile) -> Result<(), DramError> {
        if self.state != TrainerState::Untrained {
            log::error!("memory training requested twice");
            return Err(DramError::AlreadyTrained);
        }

        log::info!("training {} at {} MT/s", profile.dram_type.name(), profile.boot_rate());
        // Any outcome consumes the profile; a failed controller is not retried.
        self.state = TrainerState::Failed;
        self.controller.init_and_train(profile)?;
        self.state = TrainerState::Trained;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingController {
        calls: usize,
        result: Result<(), DramError>,
    }

    impl DramController for CountingController {
        fn init_and_train(&mut self, _profile: &MemoryTimingProfile) -> Result<(), DramError> {
            self.calls += 1;
            self.result
        }
    }

    static PROFILE: MemoryTimingProfile = MemoryTimingProfile {
        dram_type: DramType::Ddr3,
        ddrc_cfg: &[],
        ddrphy_cfg: &[],
        fsp_msg: &[],
        ddrphy_pie: &[],
        fsp_table: [1600, 0, 0, 0],
    };

    #[test]
    fn test_second_training_is_rejected() {
        let mut trainer = MemoryTrainer::new(CountingController { calls: 0, result: Ok(()) });
        assert_eq!(trainer.train(&PROFILE), Ok(()));
        assert_eq!(trainer.state(), TrainerState::Trained);
        assert_eq!(trainer.train(&PROFILE), Err(DramError::AlreadyTrained));
        assert_eq!(trainer.controller().calls, 1);
    }

    #[test]
    fn test_failed_training_is_not_repeated() {
        let failure = Err(DramError::TrainingFailed { fsp: 0 });
        let mut trainer = MemoryTrainer::new(CountingController { calls: 0, result: failure });
        assert_eq!(trainer.train(&PROFILE), failure);
        assert_eq!(trainer.state(), TrainerState::Failed);
        assert_eq!(trainer.train(&PROFILE), Err(DramError::AlreadyTrained));
        assert_eq!(trainer.controller().calls, 1);
    }
}
