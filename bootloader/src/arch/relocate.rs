//! Self relocation
//!
//! The image is linked at address 0 as a position independent executable.
//! Before any absolute pointer is dereferenced, every `R_AARCH64_RELATIVE`
//! entry in `.rela.dyn` is patched with the address the boot ROM actually
//! loaded the image to.

use core::fmt;

use static_assertions::{assert_eq_align, assert_eq_size};

/// Relocation type for `*where = load_base + addend`
pub const R_AARCH64_RELATIVE: u32 = 1027;

/// ELF64 relocation entry with addend
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Rela {
    pub offset: u64,
    pub info: u64,
    pub addend: i64,
}

assert_eq_size!(Elf64Rela, [u8; 24]);
assert_eq_align!(Elf64Rela, u64);

impl Elf64Rela {
    pub const fn relative(offset: u64, addend: i64) -> Self {
        Self {
            offset,
            info: R_AARCH64_RELATIVE as u64,
            addend,
        }
    }

    pub const fn kind(&self) -> u32 {
        (self.info & 0xffff_ffff) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocError {
    /// Only relative relocations may appear in the image
    UnsupportedType { index: usize, kind: u32 },
    /// The patched location lies outside the image
    OutOfBounds { index: usize, offset: u64 },
}

impl fmt::Display for RelocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocError::UnsupportedType { index, kind } => {
                write!(f, "relocation {} has unsupported type {}", index, kind)
            }
            RelocError::OutOfBounds { index, offset } => {
                write!(f, "relocation {} patches {:#x} outside the image", index, offset)
            }
        }
    }
}

/// Apply `relocs` to `image`, which was linked at 0 and runs at `load_base`
///
/// Returns the number of patched locations.
pub fn apply_relocations(image: &mut [u8], relocs: &[Elf64Rela], load_base: u64) -> Result<usize, RelocError> {
    // Validate first so a bad table leaves the image untouched.
    for (index, rela) in relocs.iter().enumerate() {
        if rela.kind() != R_AARCH64_RELATIVE {
            return Err(RelocError::UnsupportedType { index, kind: rela.kind() });
        }
        let end = rela.offset.checked_add(8);
        if end.is_none_or(|end| end > image.len() as u64) {
            return Err(RelocError::OutOfBounds { index, offset: rela.offset });
        }
    }

    for rela in relocs {
        let at = rela.offset as usize;
        let value = load_base.wrapping_add_signed(rela.addend);
        image[at..at + 8].copy_from_slice(&value.to_le_bytes());
    }

    Ok(relocs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_relocations_add_load_base() {
        let mut image = [0u8; 32];
        let relocs = [Elf64Rela::relative(0, 0x100), Elf64Rela::relative(16, 0x8)];
        let patched = apply_relocations(&mut image, &relocs, 0x91_0000).unwrap();

        assert_eq!(patched, 2);
        assert_eq!(u64::from_le_bytes(image[0..8].try_into().unwrap()), 0x91_0100);
        assert_eq!(u64::from_le_bytes(image[16..24].try_into().unwrap()), 0x91_0008);
        assert_eq!(&image[8..16], &[0u8; 8]);
    }

    #[test]
    fn test_unsupported_type_leaves_image_untouched() {
        let mut image = [0u8; 16];
        let relocs = [
            Elf64Rela::relative(0, 0x10),
            Elf64Rela { offset: 8, info: 257, addend: 0 },
        ];
        let err = apply_relocations(&mut image, &relocs, 0x1000).unwrap_err();
        assert_eq!(err, RelocError::UnsupportedType { index: 1, kind: 257 });
        assert_eq!(image, [0u8; 16]);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut image = [0u8; 16];
        let relocs = [Elf64Rela::relative(12, 0)];
        assert!(matches!(
            apply_relocations(&mut image, &relocs, 0),
            Err(RelocError::OutOfBounds { index: 0, offset: 12 })
        ));
    }
}
