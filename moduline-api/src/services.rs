//! Services provided to board code by the surrounding boot environment
//!
//! Update-handler registration and default-environment handling are
//! implemented elsewhere; board code only hands over names, device paths
//! and flags.

bitflags::bitflags! {
    /// Flags for a flash update handler
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HandlerFlags: u32 {
        /// Use this handler when no target is named explicitly
        const DEFAULT = 1 << 0;
    }
}

/// How a flash handler writes its image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    /// eMMC hardware boot partitions
    MmcBootPartition,
    /// Fixed offset in the user area of an MMC device
    MmcUserArea,
}

/// A flash update target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashHandler {
    pub name: &'static str,
    pub device: &'static str,
    pub kind: FlashKind,
    pub flags: HandlerFlags,
}

/// Default environment bundles compiled into the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultEnv {
    GocontrollDisplay,
    GocontrollHeadless,
}

impl DefaultEnv {
    pub fn directory(&self) -> &'static str {
        match self {
            DefaultEnv::GocontrollDisplay => "defaultenv-gocontroll-display",
            DefaultEnv::GocontrollHeadless => "defaultenv-gocontroll-headless",
        }
    }
}

/// Device the boot ROM loaded this image from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSource {
    Mmc { instance: u8 },
    Spi,
    Serial,
    Unknown,
}

/// Board-facing services of the boot environment
pub trait BoardServices {
    fn register_flash_handler(&mut self, handler: FlashHandler);

    fn append_default_env(&mut self, env: DefaultEnv);

    fn boot_source(&self) -> BootSource;
}
