//! Display variant detection
//!
//! The Moduline Display ships with one of two panels on the same board.
//! [`VariantProber`] asks the bus whether the AV101 touch controller is
//! there, [`OverlayResolver`] merges the matching hardware description
//! fragment and leaves the overlay file pattern in the [`BootSession`].

pub mod probe;
pub mod resolver;
pub mod session;

pub use probe::{VariantProbeResult, VariantProber};
pub use resolver::OverlayResolver;
pub use session::{BootSession, BootSessionPattern};

/// Panel assemblies of the display family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayVariant {
    /// 10.1" AV101HDT-A10, touch controller answers at 0x24
    Av101hdtA10,
    /// 12.3" AV123Z7M-N17
    Av123z7mN17,
}

impl DisplayVariant {
    pub const COUNT: usize = 2;

    pub fn from_probe(result: VariantProbeResult) -> Self {
        match result {
            VariantProbeResult::Responded => DisplayVariant::Av101hdtA10,
            VariantProbeResult::Inconclusive => DisplayVariant::Av123z7mN17,
        }
    }

    pub const fn index(&self) -> usize {
        match self {
            DisplayVariant::Av101hdtA10 => 0,
            DisplayVariant::Av123z7mN17 => 1,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            DisplayVariant::Av101hdtA10 => "av101hdt-a10",
            DisplayVariant::Av123z7mN17 => "av123z7m-n17",
        }
    }

    /// Overlay file glob for the downstream loader
    pub const fn pattern(&self) -> &'static str {
        match self {
            DisplayVariant::Av101hdtA10 => "*av101*.dtbo",
            DisplayVariant::Av123z7mN17 => "*av123*.dtbo",
        }
    }
}

/// A precompiled fragment, borrowed until merged
#[derive(Debug, Clone, Copy)]
pub struct OverlayFragment {
    pub variant: DisplayVariant,
    pub blob: &'static [u8],
}

/// Fragments indexed by [`DisplayVariant::index`]
pub type OverlayTable = [OverlayFragment; DisplayVariant::COUNT];
