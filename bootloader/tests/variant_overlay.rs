//! Display variant selection against the shipped hardware descriptions

#![cfg(feature = "board-gocontroll-display")]

use moduline_bootloader::BootError;
use moduline_bootloader::boards::gocontroll_display::{DISPLAY_106, DISPLAY_107, DISPLAY_OVERLAYS};
use moduline_bootloader::config::OVERLAY_PATTERN_KEY;
use moduline_bootloader::fdt::{self as devtree, DeviceTree, Node};
use moduline_bootloader::variant::{BootSession, DisplayVariant, OverlayResolver, VariantProbeResult};

const TOUCH_BUS: &str = "/soc@0/bus@30800000/i2c@30a50000";
const GPIO4: &str = "/soc@0/bus@30200000/gpio@30230000";

fn display_tree() -> DeviceTree {
    devtree::unflatten(DISPLAY_106.dtb).unwrap()
}

fn cells(node: &Node, name: &str) -> Vec<u32> {
    node.property(name)
        .unwrap()
        .value
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn resolve(result: VariantProbeResult) -> (DeviceTree, BootSession, DisplayVariant) {
    let mut tree = display_tree();
    let mut session = BootSession::new();
    let variant = OverlayResolver::new(&DISPLAY_OVERLAYS)
        .resolve(result, &mut tree, &mut session)
        .unwrap();
    (tree, session, variant)
}

#[test]
fn test_shipped_descriptions_parse() {
    let base = display_tree();
    assert_eq!(base.compatible().next(), Some("gocontroll,moduline-display-106"));
    assert_eq!(base.max_phandle(), 4);
    assert!(base.find_node("i2c3").unwrap().is_enabled());

    let other = devtree::unflatten(DISPLAY_107.dtb).unwrap();
    assert_eq!(other.compatible().next(), Some("gocontroll,moduline-display-107"));

    for fragment in &DISPLAY_OVERLAYS {
        let overlay = devtree::unflatten(fragment.blob).unwrap();
        assert!(overlay.find_node("/fragment@0/__overlay__").is_some());
    }
}

#[test]
fn test_touch_response_selects_av101() {
    let (tree, session, variant) = resolve(VariantProbeResult::Responded);

    assert_eq!(variant, DisplayVariant::Av101hdtA10);
    assert_eq!(session.get(OVERLAY_PATTERN_KEY), Some("*av101*.dtbo"));
    assert!(session.pattern().unwrap().matches("imx8mp-tx8p-ml81-moduline-display-106-av101hdt-a10.dtbo"));
    assert!(!session.pattern().unwrap().matches("imx8mp-tx8p-ml81-moduline-display-106-av123z7m-n17.dtbo"));

    let touch = tree.find_node(&format!("{}/touchscreen@24", TOUCH_BUS)).unwrap();
    assert_eq!(touch.compatible().next(), Some("ilitek,ili2130"));
    let gpio4 = tree.find_node(GPIO4).unwrap().phandle().unwrap();
    assert_eq!(cells(touch, "reset-gpios"), [gpio4, 13, 1]);

    let panel = tree.find_node("/panel").unwrap();
    assert_eq!(panel.compatible().next(), Some("avd,av101hdt-a10"));
    assert!(tree.find_node("/backlight").is_none());
}

#[test]
fn test_inconclusive_probe_selects_av123() {
    let (tree, session, variant) = resolve(VariantProbeResult::Inconclusive);

    assert_eq!(variant, DisplayVariant::Av123z7mN17);
    assert_eq!(session.get(OVERLAY_PATTERN_KEY), Some("*av123*.dtbo"));
    assert!(tree.find_node(&format!("{}/touchscreen@24", TOUCH_BUS)).is_none());

    let backlight = tree.find_node("/backlight").unwrap();
    assert_eq!(backlight.phandle(), Some(5));
    let gpio4 = tree.find_node(GPIO4).unwrap().phandle().unwrap();
    assert_eq!(cells(backlight, "gpios"), [gpio4, 5, 0]);

    let panel = tree.find_node("/panel").unwrap();
    assert_eq!(panel.compatible().next(), Some("avd,av123z7m-n17"));
    assert_eq!(cells(panel, "backlight"), [5]);
    assert_eq!(tree.symbol("panel_backlight"), Some("/backlight"));
    assert_eq!(tree.symbol("i2c4"), Some(TOUCH_BUS));
}

#[test]
fn test_second_merge_is_refused() {
    let (mut tree, mut session, _) = resolve(VariantProbeResult::Responded);
    let before = tree.clone();

    let err = OverlayResolver::new(&DISPLAY_OVERLAYS)
        .resolve(VariantProbeResult::Inconclusive, &mut tree, &mut session)
        .unwrap_err();
    assert_eq!(err, BootError::OverlayAlreadyApplied);
    assert_eq!(tree, before);
    assert_eq!(session.overlay(), Some(DisplayVariant::Av101hdtA10));
    assert_eq!(session.get(OVERLAY_PATTERN_KEY), Some("*av101*.dtbo"));
}

#[test]
fn test_merged_tree_reads_back_with_independent_parser() {
    let (merged, _, _) = resolve(VariantProbeResult::Inconclusive);
    let blob = devtree::flatten(&merged);

    let parsed = fdt::Fdt::new(&blob).unwrap();
    let panel = parsed.find_node("/panel").unwrap();
    assert_eq!(panel.property("compatible").unwrap().as_str(), Some("avd,av123z7m-n17"));
    let backlight = parsed.find_node("/backlight").unwrap();
    assert_eq!(backlight.property("phandle").unwrap().as_usize(), Some(5));
    assert_eq!(panel.property("backlight").unwrap().as_usize(), Some(5));
    assert!(parsed.find_node("/soc@0/bus@30800000/i2c@30a50000").is_some());
}

#[test]
fn test_av101_tree_reads_back_with_independent_parser() {
    let (merged, _, _) = resolve(VariantProbeResult::Responded);
    let blob = devtree::flatten(&merged);

    let parsed = fdt::Fdt::new(&blob).unwrap();
    let touch = parsed
        .find_node("/soc@0/bus@30800000/i2c@30a50000/touchscreen@24")
        .unwrap();
    assert_eq!(touch.property("reg").unwrap().as_usize(), Some(0x24));
    assert_eq!(touch.property("touchscreen-size-x").unwrap().as_usize(), Some(1280));
}
