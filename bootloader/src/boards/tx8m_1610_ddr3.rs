// DDR3L timing for the Ka-Ro TX8M-1610 module, 1600 MT/s single set point.
// Generated with the NXP DDR tool; edit the tool input, not this table.

use crate::dram::{DramType, FspMessage, MemoryTimingProfile, RegPair, TrainingPass};

static DDRC_CFG: [RegPair; 30] = [
    RegPair::new(0x3d40_0304, 0x0000_0001),
    RegPair::new(0x3d40_0030, 0x0000_0001),
    RegPair::new(0x3d40_0000, 0x0104_0001),
    RegPair::new(0x3d40_0064, 0x0061_0090),
    RegPair::new(0x3d40_00d0, 0xc003_061c),
    RegPair::new(0x3d40_00d4, 0x009e_0000),
    RegPair::new(0x3d40_00dc, 0x1d70_0004),
    RegPair::new(0x3d40_00e0, 0x0000_0008),
    RegPair::new(0x3d40_00f4, 0x0000_0639),
    RegPair::new(0x3d40_0100, 0x0c0e_0610),
    RegPair::new(0x3d40_0104, 0x0003_0314),
    RegPair::new(0x3d40_0108, 0x0305_0509),
    RegPair::new(0x3d40_010c, 0x0000_4009),
    RegPair::new(0x3d40_0110, 0x0604_0408),
    RegPair::new(0x3d40_0114, 0x0202_0406),
    RegPair::new(0x3d40_0120, 0x0000_0909),
    RegPair::new(0x3d40_0180, 0x4000_0010),
    RegPair::new(0x3d40_0184, 0x0000_00c3),
    RegPair::new(0x3d40_0190, 0x0382_8202),
    RegPair::new(0x3d40_0194, 0x0002_0303),
    RegPair::new(0x3d40_01b0, 0x0000_0041),
    RegPair::new(0x3d40_0200, 0x0000_0016),
    RegPair::new(0x3d40_0204, 0x0008_0808),
    RegPair::new(0x3d40_0208, 0x0000_0000),
    RegPair::new(0x3d40_020c, 0x0000_0000),
    RegPair::new(0x3d40_0210, 0x0000_1f1f),
    RegPair::new(0x3d40_0214, 0x0707_0707),
    RegPair::new(0x3d40_0218, 0x0f07_0707),
    RegPair::new(0x3d40_0244, 0x0000_0000),
    RegPair::new(0x3d40_0490, 0x0000_0001),
];

static DDRPHY_CFG: [RegPair; 12] = [
    RegPair::new(0x1005f, 0x3ff),
    RegPair::new(0x1015f, 0x3ff),
    RegPair::new(0x1105f, 0x3ff),
    RegPair::new(0x1115f, 0x3ff),
    RegPair::new(0x55, 0x3ff),
    RegPair::new(0x1055, 0x3ff),
    RegPair::new(0x2055, 0x3ff),
    RegPair::new(0x3055, 0x3ff),
    RegPair::new(0x200c5, 0xa),
    RegPair::new(0x2002e, 0x2),
    RegPair::new(0x20024, 0x8),
    RegPair::new(0x2003a, 0x0),
];

static FSP0_1D: [RegPair; 10] = [
    RegPair::new(0xd0000, 0x0),
    RegPair::new(0x54003, 0x640),
    RegPair::new(0x54004, 0x2),
    RegPair::new(0x54005, 0x2228),
    RegPair::new(0x54006, 0x23b),
    RegPair::new(0x54008, 0x1f),
    RegPair::new(0x5400b, 0x2),
    RegPair::new(0x5400d, 0x100),
    RegPair::new(0x54012, 0x110),
    RegPair::new(0x5402f, 0x1d70),
];

static FSP_MSG: [FspMessage; 1] = [FspMessage { drate: 1600, pass: TrainingPass::OneD, cfg: &FSP0_1D }];

static DDRPHY_PIE: [RegPair; 10] = [
    RegPair::new(0xd0000, 0x0),
    RegPair::new(0x90000, 0x10),
    RegPair::new(0x90001, 0x400),
    RegPair::new(0x90002, 0x10e),
    RegPair::new(0x90003, 0x0),
    RegPair::new(0x90004, 0x0),
    RegPair::new(0x90005, 0x8),
    RegPair::new(0x2005b, 0x7529),
    RegPair::new(0x2005c, 0x0),
    RegPair::new(0xd0000, 0x1),
];

pub static TX8M_1610_DRAM_TIMING: MemoryTimingProfile = MemoryTimingProfile {
    dram_type: DramType::Ddr3,
    ddrc_cfg: &DDRC_CFG,
    ddrphy_cfg: &DDRPHY_CFG,
    fsp_msg: &FSP_MSG,
    ddrphy_pie: &DDRPHY_PIE,
    fsp_table: [1600, 0, 0, 0],
};
