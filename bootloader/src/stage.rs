//! Board stage
//!
//! Runs in the normal world once TF-A has re-entered the image from DRAM.
//! The embedded hardware description is unflattened, the board whose
//! compatible matches its root is probed, and the resulting tree is
//! returned for the handoff together with the session the probe filled in.

use moduline_api::{BoardServices, Delay};

use crate::boards::{self, BoardContext, BoardDescriptor};
use crate::error::{BootError, Result};
use crate::fdt::{self, DeviceTree};
use crate::registry::PeripheralRegistry;
use crate::state::{self, BootPhase};
use crate::variant::BootSession;

/// Everything the next stage needs
pub struct StageOutput {
    pub board: &'static BoardDescriptor,
    pub tree: DeviceTree,
    pub session: BootSession,
}

pub fn run_board_stage(
    dtb: &[u8],
    services: &mut dyn BoardServices,
    registry: &mut PeripheralRegistry,
    delay: &mut dyn Delay,
) -> Result<StageOutput> {
    state::set_phase(BootPhase::BoardStage);

    let mut tree = fdt::unflatten(dtb).map_err(|err| {
        log::error!("cannot unflatten board description: {}", err);
        err
    })?;

    let board = boards::match_compatible(&tree).ok_or_else(|| {
        let compatible = tree.compatible().next().unwrap_or("<none>");
        log::error!("no board for {}", compatible);
        BootError::NoMatchingBoard
    })?;
    log::info!("board: {} ({})", board.name, tree.model().unwrap_or("no model"));

    let mut session = BootSession::new();
    let mut ctx = BoardContext {
        tree: &mut tree,
        session: &mut session,
        services,
        registry,
        delay,
    };
    (board.probe)(&mut ctx).map_err(|err| {
        log::error!("{}: probe failed: {}", board.name, err);
        err
    })?;

    if let Some(pattern) = session.pattern() {
        log::info!("{} = {}", pattern.key(), pattern.glob());
    }
    state::set_phase(BootPhase::ReadyToJump);
    Ok(StageOutput { board, tree, session })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdt::{Node, Property};
    use alloc::vec::Vec;
    use moduline_api::{BootSource, DefaultEnv, FlashHandler, HandlerFlags};

    #[derive(Default)]
    struct Services {
        handlers: Vec<FlashHandler>,
        envs: Vec<DefaultEnv>,
        source: Option<BootSource>,
    }

    impl BoardServices for Services {
        fn register_flash_handler(&mut self, handler: FlashHandler) {
            self.handlers.push(handler);
        }

        fn append_default_env(&mut self, env: DefaultEnv) {
            self.envs.push(env);
        }

        fn boot_source(&self) -> BootSource {
            self.source.unwrap_or(BootSource::Unknown)
        }
    }

    struct NoDelay;

    impl Delay for NoDelay {
        fn delay_us(&mut self, _us: u32) {}
    }

    fn karo_blob(compatible: &[u8]) -> Vec<u8> {
        let mut tree = DeviceTree::new();
        tree.root.set_property(Property::new("compatible", compatible));
        tree.root.set_property(Property::string("model", "Ka-Ro TX8M-1610"));
        let chosen = tree.root.child_or_insert("chosen");
        for name in ["environment-sd", "environment-emmc"] {
            let mut env = Node::new(name);
            env.set_property(Property::string("status", "disabled"));
            chosen.children.push(env);
        }
        fdt::flatten(&tree)
    }

    fn run(blob: &[u8], services: &mut Services) -> Result<StageOutput> {
        run_board_stage(blob, services, &mut PeripheralRegistry::new(), &mut NoDelay)
    }

    #[cfg(feature = "board-karo-tx8m-1610")]
    #[test]
    fn test_karo_sd_boot_enables_sd_environment() {
        let blob = karo_blob(b"karo,tx8m-1610\0fsl,imx8mm\0");
        let mut services = Services {
            source: Some(BootSource::Mmc { instance: 1 }),
            ..Default::default()
        };
        let out = run(&blob, &mut services).unwrap();

        assert_eq!(out.board.id, boards::BoardId::KaroTx8m1610Test);
        assert!(out.tree.find_node("/chosen/environment-sd").unwrap().is_enabled());
        assert!(!out.tree.find_node("/chosen/environment-emmc").unwrap().is_enabled());
        let sd = services.handlers.iter().find(|h| h.name == "SD").unwrap();
        let emmc = services.handlers.iter().find(|h| h.name == "eMMC").unwrap();
        assert_eq!(sd.flags, HandlerFlags::DEFAULT);
        assert_eq!(emmc.flags, HandlerFlags::empty());
        assert_eq!(sd.device, "/dev/mmc1.barebox");
        assert!(out.session.pattern().is_none());
    }

    #[cfg(feature = "board-karo-tx8m-1610")]
    #[test]
    fn test_karo_emmc_boot_is_the_default() {
        let blob = karo_blob(b"karo,tx8m-1610\0fsl,imx8mm\0");
        let mut services = Services {
            source: Some(BootSource::Mmc { instance: 0 }),
            ..Default::default()
        };
        let out = run(&blob, &mut services).unwrap();

        assert!(out.tree.find_node("/chosen/environment-emmc").unwrap().is_enabled());
        assert!(!out.tree.find_node("/chosen/environment-sd").unwrap().is_enabled());
        let emmc = services.handlers.iter().find(|h| h.name == "eMMC").unwrap();
        assert_eq!(emmc.flags, HandlerFlags::DEFAULT);
        assert_eq!(emmc.device, "/dev/mmc0");
    }

    #[cfg(feature = "board-gocontroll-headless")]
    #[test]
    fn test_headless_registers_emmc_and_environment() {
        let blob = karo_blob(b"karo,imx8mm-tx8m-1610\0fsl,imx8mm\0");
        let mut services = Services::default();
        let out = run(&blob, &mut services).unwrap();

        assert_eq!(out.board.id, boards::BoardId::GocontrollHeadless);
        assert_eq!(services.handlers.len(), 1);
        assert_eq!(services.handlers[0].name, "emmc");
        assert_eq!(services.envs, [DefaultEnv::GocontrollHeadless]);
    }

    #[cfg(feature = "board-karo-tx8m-1610")]
    #[test]
    fn test_embedded_karo_description_selects_its_board() {
        let board = boards::karo_tx8m_1610::TX8M_1610_TEST.dtb;
        let mut services = Services {
            source: Some(BootSource::Mmc { instance: 1 }),
            ..Default::default()
        };
        let out = run(board, &mut services).unwrap();

        assert_eq!(out.board.id, boards::BoardId::KaroTx8m1610Test);
        assert!(out.tree.find_node("/chosen/environment-sd").unwrap().is_enabled());
        assert_eq!(services.handlers.len(), 2);
    }

    #[cfg(feature = "board-gocontroll-headless")]
    #[test]
    fn test_embedded_headless_description_selects_its_board() {
        let mut services = Services::default();
        let out = run(boards::gocontroll_headless::HEADLESS.dtb, &mut services).unwrap();

        assert_eq!(out.board.id, boards::BoardId::GocontrollHeadless);
        assert!(out.tree.find_node("/chosen/environment-emmc").unwrap().is_enabled());
    }

    #[test]
    fn test_unknown_board_is_refused() {
        let blob = karo_blob(b"acme,board\0");
        let mut services = Services::default();
        assert!(matches!(run(&blob, &mut services), Err(BootError::NoMatchingBoard)));
        assert!(services.handlers.is_empty());
    }

    #[test]
    fn test_garbage_description_is_a_tree_error() {
        let mut services = Services::default();
        assert!(matches!(run(&[0u8; 64], &mut services), Err(BootError::Tree(_))));
    }
}
