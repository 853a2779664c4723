// Device drivers used before the bus and GPIO subsystems exist

pub mod uart;

pub use uart::ImxUart;
