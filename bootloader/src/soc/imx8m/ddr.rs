//! i.MX8M DDR controller (uMCTL2) and Synopsys DDR PHY bring-up
//!
//! Sequence: hold the controller in reset, lock the DRAM PLL for the boot
//! data rate, load the controller table, release the core, train the PHY
//! once per frequency set point through the message mailbox, load the PIE
//! image and wait until the controller reports normal operating mode.

use moduline_api::RegisterAccess;

use super::{ANATOP_BASE, DDRC_BASE, DDRPHY_BASE, SRC_BASE};
use crate::config;
use crate::dram::{DramController, DramError, DramWait, MemoryTimingProfile, TrainingFirmware, TrainingPass};

const SRC_DDRC_RCR: usize = SRC_BASE + 0x1000;

const DRAM_PLL_GEN_CTRL: usize = ANATOP_BASE + 0x50;
const DRAM_PLL_FDIV_CTL0: usize = ANATOP_BASE + 0x54;
const PLL_RST: u32 = 1 << 9;
const PLL_LOCK: u32 = 1 << 31;

const DDRC_STAT: usize = DDRC_BASE + 0x004;
const DDRC_PWRCTL: usize = DDRC_BASE + 0x030;
const DDRC_RFSHCTL3: usize = DDRC_BASE + 0x060;
const DDRC_DFIMISC: usize = DDRC_BASE + 0x1b0;
const DDRC_DFISTAT: usize = DDRC_BASE + 0x1bc;
const DDRC_DBG1: usize = DDRC_BASE + 0x304;
const DDRC_SWCTL: usize = DDRC_BASE + 0x320;
const DDRC_SWSTAT: usize = DDRC_BASE + 0x324;

const DFIMISC_INIT_COMPLETE_EN: u32 = 1 << 0;
const DFIMISC_INIT_START: u32 = 1 << 5;
const STAT_OPERATING_MODE_MASK: u32 = 0x3;
const STAT_NORMAL: u32 = 0x1;

// PHY register numbers, addressed as DDRPHY_BASE + 4 * reg
const PHY_MICRO_CONT_MUX_SEL: u32 = 0xd0000;
const PHY_UCT_SHADOW_REGS: u32 = 0xd0004;
const PHY_DCT_WRITE_PROT: u32 = 0xd0031;
const PHY_UCT_WRITE_ONLY_SHADOW: u32 = 0xd0032;
const PHY_MICRO_RESET: u32 = 0xd0099;
const PHY_IMEM_BASE: u32 = 0x50000;
const PHY_DMEM_BASE: u32 = 0x54000;

const UCT_WRITE_PROT_SHADOW: u32 = 1 << 0;
const MAIL_TRAINING_PASSED: u32 = 0x07;
const MAIL_TRAINING_FAILED: u32 = 0xff;

/// DRAM PLL FDIV_CTL0 for a data rate; PLL runs at a quarter of it
pub const fn dram_pll_fdiv(drate: u16) -> Option<u32> {
    // (mdiv << 12) | (pdiv << 4) | sdiv from the 24 MHz reference
    match drate {
        4000 => Some((250 << 12) | (3 << 4) | 1),
        3200 => Some((300 << 12) | (9 << 4)),
        2400 => Some((300 << 12) | (3 << 4) | 2),
        1600 => Some((300 << 12) | (9 << 4) | 1),
        _ => None,
    }
}

/// Firmware images per training pass
#[derive(Debug, Clone, Copy, Default)]
pub struct PhyFirmware {
    pub one_d: Option<TrainingFirmware>,
    pub two_d: Option<TrainingFirmware>,
}

pub struct Imx8mDdrc<R: RegisterAccess> {
    regs: R,
    firmware: PhyFirmware,
    poll_limit: u32,
    mailbox_limit: u32,
}

impl<R: RegisterAccess> Imx8mDdrc<R> {
    pub fn new(regs: R, firmware: PhyFirmware) -> Self {
        Self {
            regs,
            firmware,
            poll_limit: config::DDR_POLL_LIMIT,
            mailbox_limit: config::DDR_MAILBOX_LIMIT,
        }
    }

    pub fn with_poll_limit(mut self, limit: u32) -> Self {
        self.poll_limit = limit;
        self
    }

    pub const fn phy_addr(reg: u32) -> usize {
        DDRPHY_BASE + 4 * reg as usize
    }

    fn phy_write(&mut self, reg: u32, value: u32) {
        self.regs.write32(Self::phy_addr(reg), value);
    }

    fn phy_read(&mut self, reg: u32) -> u32 {
        self.regs.read32(Self::phy_addr(reg))
    }

    fn wait(&mut self, addr: usize, mask: u32, expect: u32, what: DramWait) -> Result<(), DramError> {
        for _ in 0..self.poll_limit {
            if self.regs.read32(addr) & mask == expect {
                return Ok(());
            }
        }
        Err(DramError::Timeout(what))
    }

    fn dram_pll_init(&mut self, drate: u16) -> Result<(), DramError> {
        let fdiv = dram_pll_fdiv(drate).ok_or(DramError::UnsupportedRate(drate))?;
        self.regs.modify32(DRAM_PLL_GEN_CTRL, PLL_RST, 0);
        self.regs.write32(DRAM_PLL_FDIV_CTL0, fdiv);
        self.regs.modify32(DRAM_PLL_GEN_CTRL, 0, PLL_RST);
        self.wait(DRAM_PLL_GEN_CTRL, PLL_LOCK, PLL_LOCK, DramWait::PllLock)
    }

    fn load_words(&mut self, base: u32, image: &[u8]) {
        for (i, word) in image.chunks(2).enumerate() {
            let value = match word {
                [lo, hi] => u16::from_le_bytes([*lo, *hi]),
                [lo] => *lo as u16,
                _ => 0,
            };
            self.phy_write(base + i as u32, value as u32);
        }
    }

    fn load_training_firmware(&mut self, pass: TrainingPass) -> Result<(), DramError> {
        let image = match pass {
            TrainingPass::OneD => self.firmware.one_d,
            TrainingPass::TwoD => self.firmware.two_d,
        }
        .ok_or(DramError::MissingFirmware(pass))?;

        self.phy_write(PHY_MICRO_CONT_MUX_SEL, 0x0);
        self.load_words(PHY_IMEM_BASE, image.imem);
        self.load_words(PHY_DMEM_BASE, image.dmem);
        self.phy_write(PHY_MICRO_CONT_MUX_SEL, 0x1);
        Ok(())
    }

    fn get_mail(&mut self) -> Result<u32, DramError> {
        let shadow = Self::phy_addr(PHY_UCT_SHADOW_REGS);
        self.wait(shadow, UCT_WRITE_PROT_SHADOW, 0, DramWait::Mailbox)?;
        let mail = self.phy_read(PHY_UCT_WRITE_ONLY_SHADOW);
        self.phy_write(PHY_DCT_WRITE_PROT, 0);
        self.wait(shadow, UCT_WRITE_PROT_SHADOW, UCT_WRITE_PROT_SHADOW, DramWait::Mailbox)?;
        self.phy_write(PHY_DCT_WRITE_PROT, 1);
        Ok(mail)
    }

    fn wait_training_complete(&mut self, fsp: usize) -> Result<(), DramError> {
        for _ in 0..self.mailbox_limit {
            match self.get_mail()? {
                MAIL_TRAINING_PASSED => return Ok(()),
                MAIL_TRAINING_FAILED => return Err(DramError::TrainingFailed { fsp }),
                progress => log::trace!("ddrphy: fsp{} mail {:#x}", fsp, progress),
            }
        }
        Err(DramError::MailboxOverflow { fsp })
    }

    fn train_phy(&mut self, profile: &MemoryTimingProfile) -> Result<(), DramError> {
        if profile.fsp_msg.is_empty() {
            return Err(DramError::EmptyProfile);
        }

        for pair in profile.ddrphy_cfg {
            self.phy_write(pair.reg, pair.val);
        }

        for (fsp, msg) in profile.fsp_msg.iter().enumerate() {
            log::debug!("ddrphy: fsp{} {} MT/s {:?}", fsp, msg.drate, msg.pass);
            self.load_training_firmware(msg.pass)?;

            self.phy_write(PHY_MICRO_CONT_MUX_SEL, 0x0);
            for pair in msg.cfg {
                self.phy_write(pair.reg, pair.val);
            }
            self.phy_write(PHY_MICRO_CONT_MUX_SEL, 0x1);

            self.phy_write(PHY_MICRO_RESET, 0x9);
            self.phy_write(PHY_MICRO_RESET, 0x1);
            self.phy_write(PHY_MICRO_RESET, 0x0);

            self.wait_training_complete(fsp)?;

            self.phy_write(PHY_MICRO_RESET, 0x1);
        }

        self.phy_write(PHY_MICRO_CONT_MUX_SEL, 0x0);
        for pair in profile.ddrphy_pie {
            self.phy_write(pair.reg, pair.val);
        }
        self.phy_write(PHY_MICRO_CONT_MUX_SEL, 0x1);
        Ok(())
    }
}

impl<R: RegisterAccess> DramController for Imx8mDdrc<R> {
    fn init_and_train(&mut self, profile: &MemoryTimingProfile) -> Result<(), DramError> {
        // Hold controller and PHY in reset, then bring up the PLL.
        self.regs.write32(SRC_DDRC_RCR, 0x8f00_001f);
        self.regs.write32(SRC_DDRC_RCR, 0x8f00_000f);
        self.dram_pll_init(profile.boot_rate())?;
        self.regs.write32(SRC_DDRC_RCR, 0x8f00_0006);

        for pair in profile.ddrc_cfg {
            self.regs.write32(pair.reg as usize, pair.val);
        }

        // Release the core reset; the PHY stays under software control.
        self.regs.write32(SRC_DDRC_RCR, 0x8f00_0004);
        self.regs.write32(SRC_DDRC_RCR, 0x8f00_0000);
        self.regs.write32(DDRC_DBG1, 0x0);
        self.regs.write32(DDRC_PWRCTL, 0xa8);
        self.regs.write32(DDRC_SWCTL, 0x0);

        self.train_phy(profile)?;

        self.regs.write32(DDRC_SWCTL, 0x0);
        self.regs.write32(DDRC_DFIMISC, DFIMISC_INIT_START);
        self.wait(DDRC_DFISTAT, 0x1, 0x1, DramWait::DfiInit)?;
        self.regs.write32(DDRC_DFIMISC, 0x0);
        self.regs.write32(DDRC_SWCTL, 0x1);
        self.wait(DDRC_SWSTAT, 0x1, 0x1, DramWait::SwDone)?;

        self.wait(DDRC_STAT, STAT_OPERATING_MODE_MASK, STAT_NORMAL, DramWait::NormalMode)?;

        self.regs.write32(DDRC_SWCTL, 0x0);
        self.regs.write32(DDRC_PWRCTL, 0x88);
        self.regs.write32(DDRC_RFSHCTL3, 0x0);
        self.regs.write32(DDRC_DFIMISC, DFIMISC_INIT_COMPLETE_EN);
        self.regs.write32(DDRC_SWCTL, 0x1);
        self.wait(DDRC_SWSTAT, 0x1, 0x1, DramWait::SwDone)?;

        log::info!("{} ready", profile.dram_type.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dram::{DramType, FspMessage, RegPair};
    use crate::utils::SimRegisters;

    const IMEM: [u8; 4] = [0x34, 0x12, 0x78, 0x56];
    const DMEM: [u8; 3] = [0xaa, 0xbb, 0xcc];

    const FW: PhyFirmware = PhyFirmware {
        one_d: Some(TrainingFirmware { imem: &IMEM, dmem: &DMEM }),
        two_d: None,
    };

    const PROFILE: MemoryTimingProfile = MemoryTimingProfile {
        dram_type: DramType::Ddr3,
        ddrc_cfg: &[RegPair::new(0x3d40_0000, 0x0104_0001), RegPair::new(0x3d40_0064, 0x0061_0090)],
        ddrphy_cfg: &[RegPair::new(0x1005f, 0x3ff)],
        fsp_msg: &[
            FspMessage { drate: 1600, pass: TrainingPass::OneD, cfg: &[RegPair::new(0x54008, 0x0)] },
            FspMessage { drate: 1600, pass: TrainingPass::OneD, cfg: &[RegPair::new(0x54009, 0x1)] },
        ],
        ddrphy_pie: &[RegPair::new(0x90000, 0x10)],
        fsp_table: [1600, 0, 0, 0],
    };

    fn healthy_subsystem(mails: &[u32]) -> SimRegisters {
        let mut sim = SimRegisters::new();
        sim.pin(DRAM_PLL_GEN_CTRL, PLL_LOCK);
        sim.pin(DDRC_DFISTAT, 1);
        sim.pin(DDRC_SWSTAT, 1);
        sim.pin(DDRC_STAT, STAT_NORMAL);
        let shadow = Imx8mDdrc::<SimRegisters>::phy_addr(PHY_UCT_SHADOW_REGS);
        for _ in mails {
            sim.queue_reads(shadow, &[0, 1]);
        }
        sim.queue_reads(Imx8mDdrc::<SimRegisters>::phy_addr(PHY_UCT_WRITE_ONLY_SHADOW), mails);
        sim
    }

    #[test]
    fn test_training_runs_each_set_point() {
        let mut sim = healthy_subsystem(&[0x07, 0x02, 0x07]);
        let mut ddrc = Imx8mDdrc::new(&mut sim, FW).with_poll_limit(4);
        assert_eq!(ddrc.init_and_train(&PROFILE), Ok(()));
        drop(ddrc);

        let micro_reset = Imx8mDdrc::<SimRegisters>::phy_addr(PHY_MICRO_RESET);
        assert_eq!(sim.writes_to(micro_reset), [0x9, 0x1, 0x0, 0x1, 0x9, 0x1, 0x0, 0x1]);
        assert_eq!(sim.value(DRAM_PLL_FDIV_CTL0), dram_pll_fdiv(1600).unwrap());
        assert_eq!(sim.value(0x3d40_0064), 0x0061_0090);
        // firmware words land in PHY instruction memory
        assert_eq!(sim.value(Imx8mDdrc::<SimRegisters>::phy_addr(PHY_IMEM_BASE + 1)), 0x5678);
        assert_eq!(sim.value(Imx8mDdrc::<SimRegisters>::phy_addr(PHY_DMEM_BASE + 1)), 0xcc);
        assert_eq!(sim.value(DDRC_DFIMISC), DFIMISC_INIT_COMPLETE_EN);
    }

    #[test]
    fn test_failed_mail_stops_training() {
        let mut sim = healthy_subsystem(&[0xff]);
        let mut ddrc = Imx8mDdrc::new(&mut sim, FW).with_poll_limit(4);
        assert_eq!(ddrc.init_and_train(&PROFILE), Err(DramError::TrainingFailed { fsp: 0 }));
        drop(ddrc);

        let pie = Imx8mDdrc::<SimRegisters>::phy_addr(0x90000);
        assert!(sim.writes_to(pie).is_empty());
    }

    #[test]
    fn test_unknown_rate_rejected_before_controller_table() {
        const ODD: MemoryTimingProfile = MemoryTimingProfile { fsp_table: [1234, 0, 0, 0], ..PROFILE };
        let mut sim = healthy_subsystem(&[]);
        let mut ddrc = Imx8mDdrc::new(&mut sim, FW);
        assert_eq!(ddrc.init_and_train(&ODD), Err(DramError::UnsupportedRate(1234)));
        drop(ddrc);
        assert!(sim.writes_to(0x3d40_0064).is_empty());
    }

    #[test]
    fn test_pll_without_lock_times_out() {
        let mut sim = SimRegisters::new();
        let mut ddrc = Imx8mDdrc::new(&mut sim, FW).with_poll_limit(4);
        assert_eq!(ddrc.init_and_train(&PROFILE), Err(DramError::Timeout(DramWait::PllLock)));
    }

    #[test]
    fn test_missing_firmware_reported() {
        let mut sim = healthy_subsystem(&[0x07]);
        let mut ddrc = Imx8mDdrc::new(&mut sim, PhyFirmware::default()).with_poll_limit(4);
        assert_eq!(
            ddrc.init_and_train(&PROFILE),
            Err(DramError::MissingFirmware(TrainingPass::OneD))
        );
    }
}
