//! Boundary type tests

use moduline_api::{BusError, Delay, GpioPin, HandlerFlags, Level, RegisterAccess};

struct CountingDelay {
    total_us: u64,
}

impl Delay for CountingDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += us as u64;
    }
}

struct Regs {
    value: u32,
}

impl RegisterAccess for Regs {
    fn read32(&mut self, _addr: usize) -> u32 {
        self.value
    }

    fn write32(&mut self, _addr: usize, value: u32) {
        self.value = value;
    }
}

#[test]
fn test_gpio_pin_numbering() {
    let reset = GpioPin::new(4, 13);
    assert_eq!(reset.number(), 109);
    assert_eq!(format!("{}", reset), "GPIO4_IO13");
    assert_eq!(GpioPin::new(1, 0).number(), 0);
}

#[test]
fn test_level_from_bool() {
    assert_eq!(Level::from(true), Level::High);
    assert_eq!(Level::from(false), Level::Low);
}

#[test]
fn test_bus_error_codes() {
    assert_eq!(BusError::Nack.as_error_code(), -6);
    assert_eq!(BusError::Timeout.as_error_code(), -110);
    assert!(format!("{}", BusError::NotInitialized).contains("not initialized"));
}

#[test]
fn test_delay_ms_accumulates_microseconds() {
    let mut delay = CountingDelay { total_us: 0 };
    delay.delay_ms(10);
    assert_eq!(delay.total_us, 10_000);
}

#[test]
fn test_modify32_clears_then_sets() {
    let mut regs = Regs { value: 0xF0F0 };
    regs.modify32(0, 0x00F0, 0x0003);
    assert_eq!(regs.value, 0xF003);
}

#[test]
fn test_handler_flags() {
    let flags = HandlerFlags::DEFAULT;
    assert!(flags.contains(HandlerFlags::DEFAULT));
    assert!(HandlerFlags::empty().is_empty());
}
