//! Hardware description tree
//!
//! Flattened device trees (version 17) are unflattened into an owned
//! [`DeviceTree`], optionally merged with an overlay and flattened again
//! for the next stage. Overlay blobs stay borrowed until they are merged.

pub mod flatten;
pub mod overlay;
pub mod tree;
pub mod unflatten;

use alloc::string::String;
use core::fmt;

pub use flatten::flatten;
pub use overlay::apply_overlay;
pub use tree::{DeviceTree, Node, Property, ReserveEntry};
pub use unflatten::unflatten;

pub(crate) const FDT_MAGIC: u32 = 0xd00d_feed;
pub(crate) const FDT_BEGIN_NODE: u32 = 1;
pub(crate) const FDT_END_NODE: u32 = 2;
pub(crate) const FDT_PROP: u32 = 3;
pub(crate) const FDT_END: u32 = 9;

pub(crate) const FDT_VERSION: u32 = 17;
pub(crate) const FDT_LAST_COMP_VERSION: u32 = 16;
pub(crate) const FDT_HEADER_SIZE: usize = 40;

/// Parse or merge failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The blob does not start with the FDT magic
    BadMagic(u32),
    /// Header version other than 17, or not backwards compatible with 16
    BadVersion(u32),
    /// An offset or length points outside the blob
    Truncated,
    /// Unexpected token in the structure block
    BadToken { offset: usize, token: u32 },
    /// Overlay fragment has neither `target` nor `target-path`
    MissingTarget(String),
    /// Overlay target could not be found in the base tree
    TargetNotFound(String),
    /// A `__fixups__` entry names a label absent from the base `__symbols__`
    UnresolvedSymbol(String),
    /// A fixup entry could not be parsed or points outside its property
    BadFixup(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::BadMagic(magic) => write!(f, "bad FDT magic {:#010x}", magic),
            TreeError::BadVersion(version) => write!(f, "unsupported FDT version {}", version),
            TreeError::Truncated => write!(f, "truncated FDT"),
            TreeError::BadToken { offset, token } => {
                write!(f, "unexpected token {:#x} at offset {:#x}", token, offset)
            }
            TreeError::MissingTarget(fragment) => write!(f, "{}: no target", fragment),
            TreeError::TargetNotFound(target) => write!(f, "overlay target {} not found", target),
            TreeError::UnresolvedSymbol(label) => write!(f, "unresolved symbol {}", label),
            TreeError::BadFixup(entry) => write!(f, "bad fixup {}", entry),
        }
    }
}

pub(crate) fn be32(bytes: &[u8], offset: usize) -> Result<u32, TreeError> {
    let end = offset.checked_add(4).ok_or(TreeError::Truncated)?;
    let raw = bytes.get(offset..end).ok_or(TreeError::Truncated)?;
    Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}
