//! SoC support

pub mod imx8m;
