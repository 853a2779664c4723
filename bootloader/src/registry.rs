//! Peripheral registry
//!
//! Bus adapters and GPIO controllers are registered under the alias names
//! the hardware description uses for them (`i2c3`, `gpio3`). A board probe
//! first makes sure the devices behind those aliases are probed, then
//! resolves a [`ProbeRole`] into the handles it drives.

use alloc::boxed::Box;
use core::fmt;

use hashbrown::{HashMap, HashSet};
use moduline_api::{BusController, Gpio};

use crate::fdt::DeviceTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSetupError {
    /// No probed bus adapter behind the alias
    NoAdapter(&'static str),
    /// No probed GPIO controller behind the alias
    NoGpioController(&'static str),
}

impl fmt::Display for ProbeSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeSetupError::NoAdapter(alias) => write!(f, "no bus adapter for {}", alias),
            ProbeSetupError::NoGpioController(alias) => write!(f, "no GPIO controller for {}", alias),
        }
    }
}

/// What a board probe needs to reach one optional peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRole {
    pub name: &'static str,
    pub bus_alias: &'static str,
    pub gpio_alias: &'static str,
}

/// Handles resolved for a [`ProbeRole`]
pub struct ProbeHandle<'a> {
    pub bus: &'a mut dyn BusController,
    pub gpio: &'a mut dyn Gpio,
}

#[derive(Default)]
pub struct PeripheralRegistry {
    buses: HashMap<&'static str, Box<dyn BusController>>,
    gpios: HashMap<&'static str, Box<dyn Gpio>>,
    probed: HashSet<&'static str>,
}

impl PeripheralRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_bus(&mut self, alias: &'static str, bus: Box<dyn BusController>) {
        self.buses.insert(alias, bus);
    }

    pub fn register_gpio(&mut self, alias: &'static str, gpio: Box<dyn Gpio>) {
        self.gpios.insert(alias, gpio);
    }

    pub fn is_probed(&self, alias: &str) -> bool {
        self.probed.contains(alias)
    }

    /// Probe the device `alias` points at, if it is described and enabled
    ///
    /// Returns whether the device is available afterwards. Probing twice is
    /// harmless.
    pub fn ensure_probed_by_alias(&mut self, tree: &DeviceTree, alias: &'static str) -> bool {
        if self.probed.contains(alias) {
            return true;
        }

        match tree.find_node(alias) {
            Some(node) if node.is_enabled() => {}
            Some(_) => {
                log::warn!("{}: device disabled", alias);
                return false;
            }
            None => {
                log::warn!("{}: no such alias", alias);
                return false;
            }
        }

        if let Some(bus) = self.buses.get_mut(alias) {
            if let Err(err) = bus.init() {
                log::error!("{}: probe failed: {}", alias, err);
                return false;
            }
        } else if !self.gpios.contains_key(alias) {
            log::warn!("{}: no driver registered", alias);
            return false;
        }

        log::debug!("{}: probed", alias);
        self.probed.insert(alias);
        true
    }

    /// Look up the bus and GPIO controller of `role`
    pub fn resolve(&mut self, role: &ProbeRole) -> Result<ProbeHandle<'_>, ProbeSetupError> {
        let bus = match self.buses.get_mut(role.bus_alias) {
            Some(bus) if self.probed.contains(role.bus_alias) => bus,
            _ => {
                log::error!("{}: could not get {} adapter", role.name, role.bus_alias);
                return Err(ProbeSetupError::NoAdapter(role.bus_alias));
            }
        };
        let gpio = match self.gpios.get_mut(role.gpio_alias) {
            Some(gpio) if self.probed.contains(role.gpio_alias) => gpio,
            _ => {
                log::error!("{}: could not get {} controller", role.name, role.gpio_alias);
                return Err(ProbeSetupError::NoGpioController(role.gpio_alias));
            }
        };
        Ok(ProbeHandle {
            bus: bus.as_mut(),
            gpio: gpio.as_mut(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdt::Property;
    use moduline_api::{BusError, GpioError, GpioPin, Level, TwoWireBus};

    struct NullBus;

    impl TwoWireBus for NullBus {
        fn read_reg(&mut self, _addr: u8, _reg: u8) -> Result<u8, BusError> {
            Ok(0)
        }

        fn write_reg(&mut self, _addr: u8, _reg: u8, _value: u8) -> Result<(), BusError> {
            Ok(())
        }
    }

    impl BusController for NullBus {
        fn init(&mut self) -> Result<(), BusError> {
            Ok(())
        }
    }

    struct NullGpio;

    impl Gpio for NullGpio {
        fn set_output(&mut self, _pin: GpioPin, _level: Level) -> Result<(), GpioError> {
            Ok(())
        }

        fn set_input(&mut self, _pin: GpioPin) -> Result<(), GpioError> {
            Ok(())
        }
    }

    const TOUCH: ProbeRole = ProbeRole {
        name: "touchscreen",
        bus_alias: "i2c3",
        gpio_alias: "gpio3",
    };

    fn tree(i2c_status: &str) -> DeviceTree {
        let mut tree = DeviceTree::new();
        let soc = tree.root.child_or_insert("soc@0");
        soc.child_or_insert("i2c@30a50000")
            .set_property(Property::string("status", i2c_status));
        soc.child_or_insert("gpio@30230000");
        let aliases = tree.root.child_or_insert("aliases");
        aliases.set_property(Property::string("i2c3", "/soc@0/i2c@30a50000"));
        aliases.set_property(Property::string("gpio3", "/soc@0/gpio@30230000"));
        tree
    }

    fn registry() -> PeripheralRegistry {
        let mut registry = PeripheralRegistry::new();
        registry.register_bus("i2c3", Box::new(NullBus));
        registry.register_gpio("gpio3", Box::new(NullGpio));
        registry
    }

    #[test]
    fn test_resolve_after_probe() {
        let tree = tree("okay");
        let mut registry = registry();
        assert!(registry.ensure_probed_by_alias(&tree, "gpio3"));
        assert!(registry.ensure_probed_by_alias(&tree, "i2c3"));
        assert!(registry.ensure_probed_by_alias(&tree, "i2c3"));
        assert!(registry.resolve(&TOUCH).is_ok());
    }

    #[test]
    fn test_unprobed_adapter_is_not_resolved() {
        let tree = tree("disabled");
        let mut registry = registry();
        assert!(registry.ensure_probed_by_alias(&tree, "gpio3"));
        assert!(!registry.ensure_probed_by_alias(&tree, "i2c3"));
        assert_eq!(registry.resolve(&TOUCH).err(), Some(ProbeSetupError::NoAdapter("i2c3")));
    }

    #[test]
    fn test_missing_gpio_controller() {
        let tree = tree("okay");
        let mut registry = PeripheralRegistry::new();
        registry.register_bus("i2c3", Box::new(NullBus));
        assert!(registry.ensure_probed_by_alias(&tree, "i2c3"));
        assert!(!registry.ensure_probed_by_alias(&tree, "gpio3"));
        assert_eq!(
            registry.resolve(&TOUCH).err(),
            Some(ProbeSetupError::NoGpioController("gpio3"))
        );
    }
}
