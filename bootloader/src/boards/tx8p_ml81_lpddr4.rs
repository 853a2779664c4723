// LPDDR4 timing for the Ka-Ro TX8P-ML81 module, 4000 MT/s boot set point.
// Generated with the NXP DDR tool; edit the tool input, not this table.

use crate::dram::{DramType, FspMessage, MemoryTimingProfile, RegPair, TrainingPass};

static DDRC_CFG: [RegPair; 40] = [
    RegPair::new(0x3d40_0304, 0x0000_0001),
    RegPair::new(0x3d40_0030, 0x0000_0001),
    RegPair::new(0x3d40_0000, 0xa308_0020),
    RegPair::new(0x3d40_0020, 0x0000_1323),
    RegPair::new(0x3d40_0024, 0x1e84_8000),
    RegPair::new(0x3d40_0064, 0x007a_017c),
    RegPair::new(0x3d40_0070, 0x0702_7f90),
    RegPair::new(0x3d40_0074, 0x0000_0790),
    RegPair::new(0x3d40_00d0, 0xc003_0495),
    RegPair::new(0x3d40_00d4, 0x0077_0000),
    RegPair::new(0x3d40_00dc, 0x00c5_0072),
    RegPair::new(0x3d40_00e0, 0x0033_0000),
    RegPair::new(0x3d40_00e8, 0x0066_0048),
    RegPair::new(0x3d40_00ec, 0x0016_0048),
    RegPair::new(0x3d40_0100, 0x2028_222a),
    RegPair::new(0x3d40_0104, 0x0008_083f),
    RegPair::new(0x3d40_0108, 0x0e12_1214),
    RegPair::new(0x3d40_010c, 0x00f0_f000),
    RegPair::new(0x3d40_0110, 0x1408_0816),
    RegPair::new(0x3d40_0114, 0x0210_0d0d),
    RegPair::new(0x3d40_0118, 0x0a05_000c),
    RegPair::new(0x3d40_011c, 0x0000_0402),
    RegPair::new(0x3d40_0130, 0x0002_0610),
    RegPair::new(0x3d40_0134, 0x0c10_0002),
    RegPair::new(0x3d40_0138, 0x0000_0181),
    RegPair::new(0x3d40_0144, 0x00a0_0050),
    RegPair::new(0x3d40_0180, 0xc3e8_0018),
    RegPair::new(0x3d40_0184, 0x0200_0070),
    RegPair::new(0x3d40_0190, 0x0397_820a),
    RegPair::new(0x3d40_0194, 0x0008_0303),
    RegPair::new(0x3d40_01b4, 0x0000_170a),
    RegPair::new(0x3d40_01b0, 0x0000_0005),
    RegPair::new(0x3d40_01a0, 0xe040_0018),
    RegPair::new(0x3d40_01a4, 0x00df_00e4),
    RegPair::new(0x3d40_01a8, 0x8000_0000),
    RegPair::new(0x3d40_0200, 0x0000_001f),
    RegPair::new(0x3d40_0204, 0x0008_0808),
    RegPair::new(0x3d40_0214, 0x0707_0707),
    RegPair::new(0x3d40_0218, 0x0707_0707),
    RegPair::new(0x3d40_0400, 0x0000_0100),
];

static DDRPHY_CFG: [RegPair; 16] = [
    RegPair::new(0x100a0, 0x0),
    RegPair::new(0x100a1, 0x1),
    RegPair::new(0x100a2, 0x2),
    RegPair::new(0x100a3, 0x3),
    RegPair::new(0x100a4, 0x4),
    RegPair::new(0x100a5, 0x5),
    RegPair::new(0x100a6, 0x6),
    RegPair::new(0x100a7, 0x7),
    RegPair::new(0x1005f, 0x1ff),
    RegPair::new(0x1015f, 0x1ff),
    RegPair::new(0x1105f, 0x1ff),
    RegPair::new(0x1115f, 0x1ff),
    RegPair::new(0x55, 0x1ff),
    RegPair::new(0x1055, 0x1ff),
    RegPair::new(0x2055, 0x1ff),
    RegPair::new(0x20110, 0x2),
];

static FSP0_1D: [RegPair; 12] = [
    RegPair::new(0xd0000, 0x0),
    RegPair::new(0x54003, 0xfa0),
    RegPair::new(0x54004, 0x2),
    RegPair::new(0x54005, 0x2228),
    RegPair::new(0x54006, 0x14),
    RegPair::new(0x54008, 0x131f),
    RegPair::new(0x54009, 0xc8),
    RegPair::new(0x5400b, 0x2),
    RegPair::new(0x5400f, 0x100),
    RegPair::new(0x54012, 0x310),
    RegPair::new(0x54019, 0x2dd4),
    RegPair::new(0x5401a, 0x33),
];

static FSP1_1D: [RegPair; 6] = [
    RegPair::new(0xd0000, 0x0),
    RegPair::new(0x54002, 0x101),
    RegPair::new(0x54003, 0x190),
    RegPair::new(0x54004, 0x2),
    RegPair::new(0x54008, 0x121f),
    RegPair::new(0x54019, 0x84),
];

static FSP2_1D: [RegPair; 6] = [
    RegPair::new(0xd0000, 0x0),
    RegPair::new(0x54002, 0x102),
    RegPair::new(0x54003, 0x64),
    RegPair::new(0x54004, 0x2),
    RegPair::new(0x54008, 0x121f),
    RegPair::new(0x54019, 0x84),
];

static FSP0_2D: [RegPair; 8] = [
    RegPair::new(0xd0000, 0x0),
    RegPair::new(0x54003, 0xfa0),
    RegPair::new(0x54004, 0x2),
    RegPair::new(0x54005, 0x2228),
    RegPair::new(0x54006, 0x14),
    RegPair::new(0x54008, 0x61),
    RegPair::new(0x5400d, 0x100),
    RegPair::new(0x54019, 0x2dd4),
];

static FSP_MSG: [FspMessage; 4] = [
    FspMessage { drate: 4000, pass: TrainingPass::OneD, cfg: &FSP0_1D },
    FspMessage { drate: 400, pass: TrainingPass::OneD, cfg: &FSP1_1D },
    FspMessage { drate: 100, pass: TrainingPass::OneD, cfg: &FSP2_1D },
    FspMessage { drate: 4000, pass: TrainingPass::TwoD, cfg: &FSP0_2D },
];

static DDRPHY_PIE: [RegPair; 12] = [
    RegPair::new(0xd0000, 0x0),
    RegPair::new(0x90000, 0x10),
    RegPair::new(0x90001, 0x400),
    RegPair::new(0x90002, 0x10e),
    RegPair::new(0x90003, 0x0),
    RegPair::new(0x90004, 0x0),
    RegPair::new(0x90005, 0x8),
    RegPair::new(0x90029, 0xb),
    RegPair::new(0x9002a, 0x480),
    RegPair::new(0x9002b, 0x109),
    RegPair::new(0x2005b, 0x7529),
    RegPair::new(0xd0000, 0x1),
];

pub static TX8P_ML81_DRAM_TIMING: MemoryTimingProfile = MemoryTimingProfile {
    dram_type: DramType::Lpddr4,
    ddrc_cfg: &DDRC_CFG,
    ddrphy_cfg: &DDRPHY_CFG,
    fsp_msg: &FSP_MSG,
    ddrphy_pie: &DDRPHY_PIE,
    fsp_table: [4000, 400, 100, 0],
};
