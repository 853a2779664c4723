//! Owned node/property graph

use alloc::string::String;
use alloc::vec::Vec;

/// A named property with its raw big-endian value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: Vec<u8>,
}

impl Property {
    pub fn new(name: &str, value: &[u8]) -> Self {
        Self {
            name: String::from(name),
            value: value.to_vec(),
        }
    }

    /// A NUL-terminated string property
    pub fn string(name: &str, value: &str) -> Self {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        Self {
            name: String::from(name),
            value: bytes,
        }
    }

    pub fn u32(name: &str, value: u32) -> Self {
        Self::new(name, &value.to_be_bytes())
    }

    /// First cell of the value
    pub fn as_u32(&self) -> Option<u32> {
        let raw = self.value.get(..4)?;
        Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// The value as a single string, without the terminator
    pub fn as_str(&self) -> Option<&str> {
        self.strings().next()
    }

    /// Iterate over a string-list value
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        let body = self.value.strip_suffix(&[0]).unwrap_or(&self.value[..]);
        body.split(|&b| b == 0)
            .filter(|s| !s.is_empty())
            .filter_map(|s| core::str::from_utf8(s).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Replace the value of an existing property or append a new one
    pub fn set_property(&mut self, prop: Property) {
        match self.property_mut(&prop.name) {
            Some(existing) => existing.value = prop.value,
            None => self.properties.push(prop),
        }
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Property> {
        let index = self.properties.iter().position(|p| p.name == name)?;
        Some(self.properties.remove(index))
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| name_matches(&c.name, name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| name_matches(&c.name, name))
    }

    /// Child with exactly this name, created empty if missing
    pub fn child_or_insert(&mut self, name: &str) -> &mut Node {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(Node::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    pub fn phandle(&self) -> Option<u32> {
        self.property("phandle")
            .or_else(|| self.property("linux,phandle"))
            .and_then(Property::as_u32)
    }

    pub fn set_phandle(&mut self, phandle: u32) {
        self.set_property(Property::u32("phandle", phandle));
    }

    pub fn compatible(&self) -> impl Iterator<Item = &str> {
        self.property("compatible").into_iter().flat_map(|p| p.strings())
    }

    pub fn status(&self) -> Option<&str> {
        self.property("status").and_then(Property::as_str)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.status(), None | Some("okay") | Some("ok"))
    }

    fn max_phandle(&self) -> u32 {
        self.children
            .iter()
            .map(Node::max_phandle)
            .fold(self.phandle().unwrap_or(0), u32::max)
    }

    fn path_of_phandle(&self, phandle: u32, prefix: &mut String) -> bool {
        if self.phandle() == Some(phandle) {
            return true;
        }
        for child in &self.children {
            let len = prefix.len();
            if !prefix.ends_with('/') {
                prefix.push('/');
            }
            prefix.push_str(&child.name);
            if child.path_of_phandle(phandle, prefix) {
                return true;
            }
            prefix.truncate(len);
        }
        false
    }
}

/// A path component without a unit address matches any unit address
fn name_matches(node: &str, component: &str) -> bool {
    if node == component {
        return true;
    }
    !component.contains('@') && node.split('@').next() == Some(component)
}

/// Entry of the memory reservation block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveEntry {
    pub address: u64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTree {
    pub root: Node,
    pub reserved: Vec<ReserveEntry>,
    pub boot_cpuid: u32,
}

impl Default for DeviceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceTree {
    pub fn new() -> Self {
        Self {
            root: Node::new(""),
            reserved: Vec::new(),
            boot_cpuid: 0,
        }
    }

    /// Look up a node by absolute path or by `alias[/rest]`
    pub fn find_node(&self, path: &str) -> Option<&Node> {
        let resolved = self.resolve_path(path)?;
        let mut node = &self.root;
        for component in resolved.split('/').filter(|c| !c.is_empty()) {
            node = node.child(component)?;
        }
        Some(node)
    }

    pub fn find_node_mut(&mut self, path: &str) -> Option<&mut Node> {
        let resolved = self.resolve_path(path)?;
        let mut node = &mut self.root;
        for component in resolved.split('/').filter(|c| !c.is_empty()) {
            node = node.child_mut(component)?;
        }
        Some(node)
    }

    /// Expand a leading alias into an absolute path
    pub fn resolve_path(&self, path: &str) -> Option<String> {
        if path.starts_with('/') {
            return Some(String::from(path));
        }
        let (alias, rest) = match path.split_once('/') {
            Some((alias, rest)) => (alias, Some(rest)),
            None => (path, None),
        };
        let mut resolved = String::from(self.alias(alias)?);
        if let Some(rest) = rest {
            resolved.push('/');
            resolved.push_str(rest);
        }
        Some(resolved)
    }

    /// Path recorded under `/aliases`
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.root.child("aliases")?.property(name)?.as_str()
    }

    /// Path recorded under `/__symbols__`
    pub fn symbol(&self, label: &str) -> Option<&str> {
        self.root.child("__symbols__")?.property(label)?.as_str()
    }

    /// Compatible strings of the root node, most specific first
    pub fn compatible(&self) -> impl Iterator<Item = &str> {
        self.root.compatible()
    }

    pub fn model(&self) -> Option<&str> {
        self.root.property("model").and_then(Property::as_str)
    }

    pub fn max_phandle(&self) -> u32 {
        self.root.max_phandle()
    }

    pub fn path_of_phandle(&self, phandle: u32) -> Option<String> {
        let mut path = String::from("/");
        self.root.path_of_phandle(phandle, &mut path).then_some(path)
    }

    /// Set `status` of the node at `path`; false if there is no such node
    pub fn set_status(&mut self, path: &str, status: &str) -> bool {
        match self.find_node_mut(path) {
            Some(node) => {
                node.set_property(Property::string("status", status));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeviceTree {
        let mut tree = DeviceTree::new();
        tree.root.set_property(Property::string("compatible", "gocontroll,moduline-display"));
        let soc = tree.root.child_or_insert("soc@0");
        let i2c = soc.child_or_insert("i2c@30a50000");
        i2c.set_phandle(7);
        let aliases = tree.root.child_or_insert("aliases");
        aliases.set_property(Property::string("i2c3", "/soc@0/i2c@30a50000"));
        tree
    }

    #[test]
    fn test_lookup_by_path_unit_address_and_alias() {
        let tree = sample();
        assert!(tree.find_node("/soc@0/i2c@30a50000").is_some());
        assert!(tree.find_node("/soc/i2c").is_some());
        assert_eq!(tree.find_node("i2c3").and_then(Node::phandle), Some(7));
        assert!(tree.find_node("/soc/spi").is_none());
        assert!(tree.find_node("i2c9").is_none());
    }

    #[test]
    fn test_phandle_path_and_maximum() {
        let tree = sample();
        assert_eq!(tree.max_phandle(), 7);
        assert_eq!(tree.path_of_phandle(7).as_deref(), Some("/soc@0/i2c@30a50000"));
        assert_eq!(tree.path_of_phandle(8), None);
    }

    #[test]
    fn test_string_list_property() {
        let prop = Property::new("compatible", b"a,b\0c,d\0");
        assert_eq!(prop.strings().collect::<Vec<_>>(), ["a,b", "c,d"]);
        assert_eq!(prop.as_str(), Some("a,b"));
    }

    #[test]
    fn test_set_status() {
        let mut tree = sample();
        assert!(tree.set_status("/soc/i2c@30a50000", "disabled"));
        assert!(!tree.find_node("i2c3").unwrap().is_enabled());
        assert!(!tree.set_status("/chosen", "okay"));
    }
}
