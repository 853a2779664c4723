//! TF-A (BL31) handoff
//!
//! BL31 is copied to its link address in on-chip RAM and the running image
//! is copied to the BL33 address in DRAM. BL31 then re-enters the image in
//! the normal world at EL2.

use core::fmt;

use super::Soc;
use crate::config;
use crate::gate::{FirmwareImage, TrustedFirmware};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffError {
    /// No BL31 image was linked into this build
    MissingFirmware,
    /// The image to copy is empty
    EmptyImage,
}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffError::MissingFirmware => write!(f, "no BL31 image"),
            HandoffError::EmptyImage => write!(f, "empty BL33 image"),
        }
    }
}

/// Destination memory for the handoff copies
pub trait LoadTarget {
    fn copy_to(&mut self, dest: usize, data: &[u8]);
}

pub struct ImxTfaLoader<M: LoadTarget> {
    memory: M,
    soc: Soc,
    bl31: &'static [u8],
    bl33: &'static [u8],
}

impl<M: LoadTarget> ImxTfaLoader<M> {
    pub fn new(memory: M, soc: Soc, bl31: &'static [u8], bl33: &'static [u8]) -> Self {
        Self { memory, soc, bl31, bl33 }
    }

    /// Place BL31 and BL33 where TF-A expects them
    pub fn load_images(&mut self) -> Result<FirmwareImage, HandoffError> {
        if self.bl31.is_empty() {
            return Err(HandoffError::MissingFirmware);
        }
        if self.bl33.is_empty() {
            return Err(HandoffError::EmptyImage);
        }

        let entry = self.soc.bl31_base();
        log::info!(
            "loading BL31 ({} bytes) to {:#x}, BL33 ({} bytes) to {:#x}",
            self.bl31.len(),
            entry,
            self.bl33.len(),
            config::BL33_BASE
        );
        self.memory.copy_to(config::BL33_BASE, self.bl33);
        self.memory.copy_to(entry, self.bl31);

        Ok(FirmwareImage {
            entry,
            bl33_entry: config::BL33_BASE,
        })
    }
}

impl<M: LoadTarget> TrustedFirmware for ImxTfaLoader<M> {
    fn load(&mut self) -> Result<FirmwareImage, HandoffError> {
        self.load_images()
    }

    #[cfg(target_arch = "aarch64")]
    fn start(&mut self, image: FirmwareImage) -> ! {
        log::info!("starting BL31 at {:#x}", image.entry);
        unsafe { crate::arch::aarch64::start_bl31(image.entry) }
    }

    #[cfg(not(target_arch = "aarch64"))]
    fn start(&mut self, image: FirmwareImage) -> ! {
        panic!("BL31 at {:#x} can only be entered on aarch64", image.entry)
    }
}

/// Physical memory, written with volatile byte stores
#[cfg(target_arch = "aarch64")]
pub struct PhysMemory;

#[cfg(target_arch = "aarch64")]
impl LoadTarget for PhysMemory {
    fn copy_to(&mut self, dest: usize, data: &[u8]) {
        unsafe { crate::utils::mmio::copy_to_phys(dest, data) };
    }
}
