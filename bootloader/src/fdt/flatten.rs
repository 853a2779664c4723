//! Flattened device tree writer

use alloc::vec::Vec;

use super::tree::{DeviceTree, Node};
use super::{
    FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_HEADER_SIZE, FDT_LAST_COMP_VERSION, FDT_MAGIC, FDT_PROP, FDT_VERSION,
};

/// Property names, each stored once
struct StringTable {
    bytes: Vec<u8>,
}

impl StringTable {
    fn offset_of(&mut self, name: &str) -> u32 {
        let needle = name.as_bytes();
        let mut start = 0;
        while start < self.bytes.len() {
            let len = self.bytes[start..].iter().position(|&b| b == 0).unwrap_or(0);
            if &self.bytes[start..start + len] == needle {
                return start as u32;
            }
            start += len + 1;
        }
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(needle);
        self.bytes.push(0);
        offset
    }
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn write_node(node: &Node, out: &mut Vec<u8>, strings: &mut StringTable) {
    push_u32(out, FDT_BEGIN_NODE);
    out.extend_from_slice(node.name.as_bytes());
    out.push(0);
    pad4(out);

    for prop in &node.properties {
        push_u32(out, FDT_PROP);
        push_u32(out, prop.value.len() as u32);
        push_u32(out, strings.offset_of(&prop.name));
        out.extend_from_slice(&prop.value);
        pad4(out);
    }
    for child in &node.children {
        write_node(child, out, strings);
    }

    push_u32(out, FDT_END_NODE);
}

/// Serialize `tree` as a version 17 blob
pub fn flatten(tree: &DeviceTree) -> Vec<u8> {
    let mut structure = Vec::new();
    let mut strings = StringTable { bytes: Vec::new() };
    write_node(&tree.root, &mut structure, &mut strings);
    push_u32(&mut structure, FDT_END);

    let off_rsvmap = FDT_HEADER_SIZE;
    let rsvmap_len = (tree.reserved.len() + 1) * 16;
    let off_struct = off_rsvmap + rsvmap_len;
    let off_strings = off_struct + structure.len();
    let total = off_strings + strings.bytes.len();

    let mut out = Vec::with_capacity(total);
    push_u32(&mut out, FDT_MAGIC);
    push_u32(&mut out, total as u32);
    push_u32(&mut out, off_struct as u32);
    push_u32(&mut out, off_strings as u32);
    push_u32(&mut out, off_rsvmap as u32);
    push_u32(&mut out, FDT_VERSION);
    push_u32(&mut out, FDT_LAST_COMP_VERSION);
    push_u32(&mut out, tree.boot_cpuid);
    push_u32(&mut out, strings.bytes.len() as u32);
    push_u32(&mut out, structure.len() as u32);

    for entry in &tree.reserved {
        out.extend_from_slice(&entry.address.to_be_bytes());
        out.extend_from_slice(&entry.size.to_be_bytes());
    }
    out.extend_from_slice(&[0; 16]);
    out.extend_from_slice(&structure);
    out.extend_from_slice(&strings.bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdt::{Property, ReserveEntry, unflatten};

    #[test]
    fn test_property_names_are_shared() {
        let mut tree = DeviceTree::new();
        tree.root.child_or_insert("a").set_property(Property::string("status", "okay"));
        tree.root.child_or_insert("b").set_property(Property::string("status", "disabled"));
        let blob = flatten(&tree);
        let size_strings = u32::from_be_bytes([blob[32], blob[33], blob[34], blob[35]]);
        assert_eq!(size_strings as usize, "status\0".len());
    }

    #[test]
    fn test_tree_survives_flatten_and_parse() {
        let mut tree = DeviceTree::new();
        tree.boot_cpuid = 1;
        tree.reserved.push(ReserveEntry { address: 0x4000_0000, size: 0x1000 });
        tree.root.set_property(Property::string("model", "GOcontroll Moduline Display"));
        let chosen = tree.root.child_or_insert("chosen");
        chosen.set_property(Property::new("empty", &[]));
        chosen.set_property(Property::new("odd", &[1, 2, 3]));

        assert_eq!(unflatten(&flatten(&tree)), Ok(tree));
    }
}
