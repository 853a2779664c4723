//! Overlay application
//!
//! Follows the dtc overlay conventions: `fragment@N` nodes carry a
//! `target` phandle or a `target-path` and an `__overlay__` subtree;
//! `__fixups__` lists references to labels of the base tree and
//! `__local_fixups__` lists references to phandles defined by the overlay
//! itself.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use super::TreeError;
use super::tree::{DeviceTree, Node, Property};

/// Merge `overlay` into `base`
///
/// All work happens on a copy of `base`; on error `base` is left exactly as
/// it was. The overlay is consumed and dropped on return.
pub fn apply_overlay(base: &mut DeviceTree, mut overlay: DeviceTree) -> Result<(), TreeError> {
    let mut merged = base.clone();

    let delta = merged.max_phandle();
    renumber_phandles(&mut overlay.root, delta)?;
    if let Some(local) = take_child(&mut overlay.root, "__local_fixups__") {
        apply_local_fixups(&local, &mut overlay.root, delta)?;
    }

    if let Some(fixups) = take_child(&mut overlay.root, "__fixups__") {
        resolve_fixups(&fixups, &mut overlay.root, &mut merged)?;
    }

    let symbols = take_child(&mut overlay.root, "__symbols__");
    let mut targets: Vec<(String, String)> = Vec::new();

    for fragment in &overlay.root.children {
        if fragment.name.starts_with("__") {
            continue;
        }
        let Some(content) = fragment.child("__overlay__") else {
            continue;
        };
        let target = fragment_target(fragment, &merged)?;
        let node = merged
            .find_node_mut(&target)
            .ok_or_else(|| TreeError::TargetNotFound(target.clone()))?;
        log::debug!("overlay {} -> {}", fragment.name, target);
        merge_node(node, content);
        targets.push((fragment.name.clone(), target));
    }

    if let Some(symbols) = symbols {
        merge_symbols(&symbols, &targets, &mut merged);
    }

    *base = merged;
    Ok(())
}

fn take_child(node: &mut Node, name: &str) -> Option<Node> {
    let index = node.children.iter().position(|c| c.name == name)?;
    Some(node.children.remove(index))
}

fn phandle_overflow(node: &str) -> TreeError {
    TreeError::BadFixup(format!("{}: phandle out of range", node))
}

fn renumber_phandles(node: &mut Node, delta: u32) -> Result<(), TreeError> {
    for name in ["phandle", "linux,phandle"] {
        let Some(value) = node.property(name).and_then(Property::as_u32) else {
            continue;
        };
        let renumbered = value.checked_add(delta).ok_or_else(|| phandle_overflow(&node.name))?;
        if let Some(prop) = node.property_mut(name) {
            prop.value = renumbered.to_be_bytes().to_vec();
        }
    }
    for child in &mut node.children {
        renumber_phandles(child, delta)?;
    }
    Ok(())
}

fn patch_cell(prop: &mut Property, offset: usize, f: impl FnOnce(u32) -> Option<u32>) -> Result<(), TreeError> {
    let bad_cell = || TreeError::BadFixup(format!("{}:{}", prop.name, offset));
    let end = offset.checked_add(4).ok_or_else(bad_cell)?;
    let raw = prop.value.get(offset..end).ok_or_else(bad_cell)?;
    let value = f(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])).ok_or_else(bad_cell)?;
    prop.value[offset..end].copy_from_slice(&value.to_be_bytes());
    Ok(())
}

/// `__local_fixups__` mirrors the overlay's layout; each property lists the
/// offsets of phandle cells in the same-named property of the mirrored node.
fn apply_local_fixups(fixups: &Node, target: &mut Node, delta: u32) -> Result<(), TreeError> {
    for entry in &fixups.properties {
        let prop = target
            .property_mut(&entry.name)
            .ok_or_else(|| TreeError::BadFixup(entry.name.clone()))?;
        for offset in entry.value.chunks_exact(4) {
            let offset = u32::from_be_bytes([offset[0], offset[1], offset[2], offset[3]]) as usize;
            patch_cell(prop, offset, |phandle| phandle.checked_add(delta))?;
        }
    }
    for child in &fixups.children {
        let node = target
            .child_mut(&child.name)
            .ok_or_else(|| TreeError::BadFixup(child.name.clone()))?;
        apply_local_fixups(child, node, delta)?;
    }
    Ok(())
}

/// Phandle of the base node `label` refers to, allocating one if needed
fn symbol_phandle(base: &mut DeviceTree, label: &str, next_free: &mut u32) -> Result<u32, TreeError> {
    let path = String::from(
        base.symbol(label)
            .ok_or_else(|| TreeError::UnresolvedSymbol(String::from(label)))?,
    );
    let node = base
        .find_node_mut(&path)
        .ok_or_else(|| TreeError::UnresolvedSymbol(String::from(label)))?;
    if let Some(phandle) = node.phandle() {
        return Ok(phandle);
    }
    let phandle = *next_free;
    *next_free = phandle.checked_add(1).ok_or_else(|| phandle_overflow(&path))?;
    node.set_phandle(phandle);
    Ok(phandle)
}

/// Entries have the form `path:property:offset`, paths relative to the overlay root
fn resolve_fixups(fixups: &Node, overlay: &mut Node, base: &mut DeviceTree) -> Result<(), TreeError> {
    let mut next_free = base
        .max_phandle()
        .max(overlay_max_phandle(overlay))
        .checked_add(1)
        .ok_or_else(|| phandle_overflow("/"))?;

    for label in &fixups.properties {
        let phandle = symbol_phandle(base, &label.name, &mut next_free)?;
        for entry in label.strings() {
            let mut parts = entry.rsplitn(3, ':');
            let (Some(offset), Some(prop_name), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
                return Err(TreeError::BadFixup(String::from(entry)));
            };
            let offset: usize = offset.parse().map_err(|_| TreeError::BadFixup(String::from(entry)))?;

            let mut node = &mut *overlay;
            for component in path.split('/').filter(|c| !c.is_empty()) {
                node = node
                    .child_mut(component)
                    .ok_or_else(|| TreeError::BadFixup(String::from(entry)))?;
            }
            let prop = node
                .property_mut(prop_name)
                .ok_or_else(|| TreeError::BadFixup(String::from(entry)))?;
            patch_cell(prop, offset, |_| Some(phandle))?;
        }
    }
    Ok(())
}

fn overlay_max_phandle(node: &Node) -> u32 {
    node.children
        .iter()
        .map(overlay_max_phandle)
        .fold(node.phandle().unwrap_or(0), u32::max)
}

fn fragment_target(fragment: &Node, base: &DeviceTree) -> Result<String, TreeError> {
    if let Some(path) = fragment.property("target-path").and_then(Property::as_str) {
        return base
            .resolve_path(path)
            .filter(|resolved| base.find_node(resolved).is_some())
            .ok_or_else(|| TreeError::TargetNotFound(String::from(path)));
    }
    if let Some(phandle) = fragment.property("target").and_then(Property::as_u32) {
        return base
            .path_of_phandle(phandle)
            .ok_or_else(|| TreeError::TargetNotFound(format!("<{:#x}>", phandle)));
    }
    Err(TreeError::MissingTarget(fragment.name.clone()))
}

/// Properties replace, children merge by name
fn merge_node(target: &mut Node, source: &Node) {
    for prop in &source.properties {
        target.set_property(prop.clone());
    }
    for child in &source.children {
        merge_node(target.child_or_insert(&child.name), child);
    }
}

/// Overlay symbols point into fragments; rewrite them to where the
/// fragments landed.
fn merge_symbols(symbols: &Node, targets: &[(String, String)], base: &mut DeviceTree) {
    let base_symbols = base.root.child_or_insert("__symbols__");
    for symbol in &symbols.properties {
        let Some(path) = symbol.as_str() else {
            continue;
        };
        let rewritten = targets.iter().find_map(|(fragment, target)| {
            let prefix = format!("/{}/__overlay__", fragment);
            let rest = path.strip_prefix(prefix.as_str())?;
            let mut full = String::from(target.trim_end_matches('/'));
            full.push_str(rest);
            if full.is_empty() {
                full.push('/');
            }
            Some(full)
        });
        if let Some(full) = rewritten {
            base_symbols.set_property(Property::string(&symbol.name, &full));
        }
    }
}
