//! Clock Control Module
//!
//! Only the two register families the early stage needs: clock root
//! targets (mux and dividers) and CCGR clock gates. Gates of the affected
//! peripherals are closed while their roots change.

use moduline_api::RegisterAccess;

const CCGR_OFFSET: usize = 0x4000;
const CCGR_STRIDE: usize = 0x10;
const CCGR_SET: usize = 0x4;
const CCGR_CLR: usize = 0x8;
const CCGR_ALWAYS_ON: u32 = 0x3;

const TARGET_ROOT_OFFSET: usize = 0x8000;
const TARGET_ROOT_STRIDE: usize = 0x80;
const TARGET_ROOT_ENABLE: u32 = 1 << 28;

// Clock root slices
pub const ROOT_ARM_A53: u32 = 0;
pub const ROOT_NOC: u32 = 26;
pub const ROOT_DRAM_ALT: u32 = 64;
pub const ROOT_DRAM_APB: u32 = 65;
pub const ROOT_I2C1: u32 = 90;
pub const ROOT_UART1: u32 = 94;
pub const ROOT_UART3: u32 = 96;

// Clock gates
pub const CCGR_DDR1: u32 = 5;
pub const CCGR_GPIO4: u32 = 14;
pub const CCGR_I2C1: u32 = 23;
pub const CCGR_I2C4: u32 = 26;
pub const CCGR_UART1: u32 = 73;
pub const CCGR_UART3: u32 = 75;

/// One clock root target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootSetting {
    pub root: u32,
    pub mux: u32,
    pub pre_div: u32,
    pub post_div: u32,
}

impl RootSetting {
    pub const fn new(root: u32, mux: u32) -> Self {
        Self { root, mux, pre_div: 1, post_div: 1 }
    }

    pub const fn with_post_div(mut self, post_div: u32) -> Self {
        self.post_div = post_div;
        self
    }

    /// TARGET_ROOT register value
    pub const fn target_value(&self) -> u32 {
        TARGET_ROOT_ENABLE
            | ((self.mux & 0x7) << 24)
            | (((self.pre_div - 1) & 0x7) << 16)
            | ((self.post_div - 1) & 0x3f)
    }
}

/// Clock roots and gates a board needs before bring-up
#[derive(Debug, Clone, Copy)]
pub struct ClockPlan {
    pub roots: &'static [RootSetting],
    pub gates: &'static [u32],
}

/// i.MX8MP: A53 on SYS_PLL1 while ARM PLL is untouched, bus and DRAM
/// roots for training, I2C1 for the PMIC
pub static IMX8MP_EARLY_CLOCKS: ClockPlan = ClockPlan {
    roots: &[
        RootSetting::new(ROOT_ARM_A53, 2),
        RootSetting::new(ROOT_NOC, 2),
        RootSetting::new(ROOT_DRAM_ALT, 1),
        RootSetting::new(ROOT_DRAM_APB, 4).with_post_div(4),
        RootSetting::new(ROOT_I2C1, 0),
    ],
    gates: &[CCGR_I2C1, CCGR_DDR1, CCGR_GPIO4],
};

/// i.MX8MM: same roots, no GPIO keep-alive
pub static IMX8MM_EARLY_CLOCKS: ClockPlan = ClockPlan {
    roots: &[
        RootSetting::new(ROOT_ARM_A53, 2),
        RootSetting::new(ROOT_NOC, 2),
        RootSetting::new(ROOT_DRAM_ALT, 1),
        RootSetting::new(ROOT_DRAM_APB, 4).with_post_div(4),
        RootSetting::new(ROOT_I2C1, 0),
    ],
    gates: &[CCGR_I2C1, CCGR_DDR1],
};

pub struct Ccm<R: RegisterAccess> {
    regs: R,
    base: usize,
}

impl<R: RegisterAccess> Ccm<R> {
    pub fn new(regs: R, base: usize) -> Self {
        Self { regs, base }
    }

    pub fn target_root_addr(&self, root: u32) -> usize {
        self.base + TARGET_ROOT_OFFSET + root as usize * TARGET_ROOT_STRIDE
    }

    pub fn ccgr_addr(&self, gate: u32) -> usize {
        self.base + CCGR_OFFSET + gate as usize * CCGR_STRIDE
    }

    pub fn set_root(&mut self, setting: &RootSetting) {
        let addr = self.target_root_addr(setting.root);
        self.regs.write32(addr, setting.target_value());
    }

    pub fn enable_gate(&mut self, gate: u32) {
        let addr = self.ccgr_addr(gate) + CCGR_SET;
        self.regs.write32(addr, CCGR_ALWAYS_ON);
    }

    pub fn disable_gate(&mut self, gate: u32) {
        let addr = self.ccgr_addr(gate) + CCGR_CLR;
        self.regs.write32(addr, CCGR_ALWAYS_ON);
    }

    /// Program a clock plan: gates closed, roots set, gates opened
    pub fn apply(&mut self, plan: &ClockPlan) {
        for gate in plan.gates {
            self.disable_gate(*gate);
        }
        for root in plan.roots {
            log::trace!("clock root {} -> {:#010x}", root.root, root.target_value());
            self.set_root(root);
        }
        for gate in plan.gates {
            self.enable_gate(*gate);
        }
    }

    /// Run a UART from the 24 MHz oscillator
    pub fn setup_uart_clock(&mut self, root: u32, gate: u32) {
        self.disable_gate(gate);
        self.set_root(&RootSetting::new(root, 0));
        self.enable_gate(gate);
    }
}
