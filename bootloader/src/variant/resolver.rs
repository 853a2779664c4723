//! Overlay resolver

use super::{BootSession, DisplayVariant, OverlayTable, VariantProbeResult};
use crate::config;
use crate::error::BootError;
use crate::fdt::{self, DeviceTree};

pub struct OverlayResolver<'t> {
    table: &'t OverlayTable,
}

impl<'t> OverlayResolver<'t> {
    pub fn new(table: &'t OverlayTable) -> Self {
        Self { table }
    }

    /// Merge the fragment selected by `result` into `tree`
    ///
    /// On error the tree is unchanged and nothing is recorded in the
    /// session.
    pub fn resolve(
        &self,
        result: VariantProbeResult,
        tree: &mut DeviceTree,
        session: &mut BootSession,
    ) -> Result<DisplayVariant, BootError> {
        let variant = DisplayVariant::from_probe(result);
        if session.overlay().is_some() {
            log::error!("overlay already applied, refusing {}", variant.name());
            return Err(BootError::OverlayAlreadyApplied);
        }

        let fragment = &self.table[variant.index()];
        let overlay = fdt::unflatten(fragment.blob).map_err(|err| {
            log::error!("cannot unflatten {} overlay: {}", variant.name(), err);
            err
        })?;
        fdt::apply_overlay(tree, overlay).map_err(|err| {
            log::error!("cannot apply {} overlay: {}", variant.name(), err);
            err
        })?;

        session.record_overlay(variant)?;
        session.set_pattern(config::OVERLAY_PATTERN_KEY, variant.pattern());
        log::info!("display variant {}", variant.name());
        Ok(variant)
    }
}
