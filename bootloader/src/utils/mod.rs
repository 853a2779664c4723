// Low-level helpers shared by the drivers

pub mod mmio;
pub mod sim;

pub use mmio::RawMmio;
pub use sim::SimRegisters;
