// Boot source decoding from the SRC boot mode register

use moduline_api::{BootSource, RegisterAccess};

use super::SRC_BASE;

const SRC_SBMR1: usize = SRC_BASE + 0x58;

/// Decode BOOT_CFG[14:12] (device class) and BOOT_CFG[11:10] (instance)
pub fn decode_sbmr1(sbmr1: u32) -> BootSource {
    let instance = ((sbmr1 >> 10) & 0x3) as u8;
    match (sbmr1 >> 12) & 0x7 {
        0b001 | 0b010 => BootSource::Mmc { instance },
        0b100 => BootSource::Spi,
        0b110 => BootSource::Serial,
        _ => BootSource::Unknown,
    }
}

pub fn boot_source<R: RegisterAccess>(regs: &mut R) -> BootSource {
    decode_sbmr1(regs.read32(SRC_SBMR1))
}
