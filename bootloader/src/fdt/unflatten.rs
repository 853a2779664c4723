//! Flattened device tree parser
//!
//! The header and block bounds are checked here; nodes, properties and the
//! reservation map are then walked with the `fdt` crate and copied into an
//! owned [`DeviceTree`].

use alloc::string::String;

use ::fdt::node::FdtNode;
use ::fdt::{Fdt, FdtError};

use super::tree::{DeviceTree, Node, Property, ReserveEntry};
use super::{FDT_BEGIN_NODE, FDT_END, FDT_HEADER_SIZE, FDT_LAST_COMP_VERSION, FDT_MAGIC, FDT_VERSION, TreeError, be32};

struct Header {
    total_size: usize,
    boot_cpuid: u32,
}

fn check_header(blob: &[u8]) -> Result<Header, TreeError> {
    if blob.len() < FDT_HEADER_SIZE {
        return Err(TreeError::Truncated);
    }
    let magic = be32(blob, 0)?;
    if magic != FDT_MAGIC {
        return Err(TreeError::BadMagic(magic));
    }
    let version = be32(blob, 20)?;
    let last_comp = be32(blob, 24)?;
    if version < FDT_VERSION || last_comp > FDT_VERSION || last_comp < FDT_LAST_COMP_VERSION {
        return Err(TreeError::BadVersion(version));
    }

    let total_size = be32(blob, 4)? as usize;
    if total_size > blob.len() {
        return Err(TreeError::Truncated);
    }
    let off_struct = be32(blob, 8)? as usize;
    let off_strings = be32(blob, 12)? as usize;
    let off_rsvmap = be32(blob, 16)? as usize;
    let size_strings = be32(blob, 32)? as usize;
    let size_struct = be32(blob, 36)? as usize;

    let within = |offset: usize, len: usize| offset.checked_add(len).is_some_and(|end| end <= total_size);
    if !within(off_struct, size_struct) || !within(off_strings, size_strings) || !within(off_rsvmap, 16) {
        return Err(TreeError::Truncated);
    }

    // The structure block must open with the root and close with FDT_END.
    let first = be32(blob, off_struct)?;
    if first != FDT_BEGIN_NODE {
        return Err(TreeError::BadToken { offset: off_struct, token: first });
    }
    let last_offset = (off_struct + size_struct).checked_sub(4).ok_or(TreeError::Truncated)?;
    let last = be32(blob, last_offset)?;
    if last != FDT_END {
        return Err(TreeError::BadToken { offset: last_offset, token: last });
    }

    Ok(Header {
        total_size,
        boot_cpuid: be32(blob, 28)?,
    })
}

fn copy_node(node: FdtNode<'_, '_>) -> Node {
    let mut owned = Node::new(node.name);
    owned.properties.extend(node.properties().map(|prop| Property {
        name: String::from(prop.name),
        value: prop.value.to_vec(),
    }));
    owned.children.extend(node.children().map(copy_node));
    owned
}

/// Parse a flattened blob into an owned tree
///
/// The blob is only borrowed for the duration of the call.
pub fn unflatten(blob: &[u8]) -> Result<DeviceTree, TreeError> {
    let header = check_header(blob)?;
    let fdt = Fdt::new(&blob[..header.total_size]).map_err(|err| match err {
        FdtError::BadMagic => TreeError::BadMagic(be32(blob, 0).unwrap_or_default()),
        FdtError::BadPtr | FdtError::BufferTooSmall => TreeError::Truncated,
    })?;

    let reserved = fdt
        .memory_reservations()
        .map(|entry| ReserveEntry {
            address: entry.address() as usize as u64,
            size: entry.size() as u64,
        })
        .collect();
    let root = fdt.find_node("/").ok_or(TreeError::Truncated)?;

    Ok(DeviceTree {
        root: copy_node(root),
        reserved,
        boot_cpuid: header.boot_cpuid,
    })
}
