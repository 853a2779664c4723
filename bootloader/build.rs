//! Moduline pre-bootloader build script
//!
//! Generates compile-time build information and, for the bare-metal image,
//! wires in the linker script and the trusted-firmware blob location.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=linker/");
    println!("cargo:rerun-if-changed=dts/");
    println!("cargo:rerun-if-env-changed=MODULINE_BL31");
    println!("cargo:rerun-if-env-changed=MODULINE_DDR_FW");

    let target = env::var("TARGET").unwrap_or_else(|_| "aarch64-unknown-none".to_string());

    if target.starts_with("aarch64") && target.ends_with("-none") && is_feature_enabled("board-bin") {
        setup_image_link();
    }

    stage_firmware();
    create_build_info();
}

fn is_feature_enabled(feature: &str) -> bool {
    let var = format!("CARGO_FEATURE_{}", feature.to_uppercase().replace('-', "_"));
    env::var(var).is_ok()
}

/// Image features; an image build enables exactly one
const IMAGE_FEATURES: &[&str] = &[
    "image-gocontroll-display-106",
    "image-gocontroll-display-107",
    "image-karo-tx8m-1610-test",
    "image-gocontroll-headless",
];

fn setup_image_link() {
    let selected: Vec<&str> = IMAGE_FEATURES
        .iter()
        .copied()
        .filter(|feature| is_feature_enabled(feature))
        .collect();
    if selected.len() != 1 {
        panic!(
            "an image build needs exactly one of {:?}, got {:?}; use `cargo xtask image <name>`",
            IMAGE_FEATURES, selected
        );
    }

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let script = PathBuf::from(manifest_dir).join("linker").join("imx8m-pbl.ld");

    // The image relocates itself, so link position independent.
    println!("cargo:rustc-link-arg-bins=-T{}", script.display());
    println!("cargo:rustc-link-arg-bins=-pie");
    println!("cargo:rustc-link-arg-bins=--no-dynamic-linker");
    println!("cargo:rustc-link-arg-bins=-znotext");

    if env::var("MODULINE_BL31").is_err() {
        println!(
            "cargo:warning=MODULINE_BL31 is not set; the image needs the path to a TF-A bl31.bin"
        );
    }
    if env::var("MODULINE_DDR_FW").is_err() {
        println!(
            "cargo:warning=MODULINE_DDR_FW is not set; the image needs the DDR PHY training firmware directory"
        );
    }
}

/// Firmware files the image embeds, looked up in MODULINE_DDR_FW
const DDR_FIRMWARE: &[&str] = &[
    "lpddr4_pmu_train_1d_imem.bin",
    "lpddr4_pmu_train_1d_dmem.bin",
    "lpddr4_pmu_train_2d_imem.bin",
    "lpddr4_pmu_train_2d_dmem.bin",
    "ddr3_imem_1d.bin",
    "ddr3_dmem_1d.bin",
];

/// Copy external firmware into OUT_DIR so `include_bytes!` always resolves
///
/// Missing files are staged empty; the image reports them at run time.
fn stage_firmware() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|_| ".".to_string()));

    let bl31 = env::var("MODULINE_BL31").ok().map(PathBuf::from);
    stage_file(bl31.as_deref(), &out_dir.join("bl31.bin"));

    let fw_dir = env::var("MODULINE_DDR_FW").ok().map(PathBuf::from);
    for name in DDR_FIRMWARE {
        let source = fw_dir.as_ref().map(|dir| dir.join(name));
        stage_file(source.as_deref(), &out_dir.join(name));
    }
}

fn stage_file(source: Option<&std::path::Path>, dest: &std::path::Path) {
    let data = match source {
        Some(path) => {
            println!("cargo:rerun-if-changed={}", path.display());
            fs::read(path).unwrap_or_else(|err| {
                println!("cargo:warning=cannot read {}: {}", path.display(), err);
                Vec::new()
            })
        }
        None => Vec::new(),
    };
    fs::write(dest, data).expect("Failed to stage firmware");
}

fn create_build_info() {
    let out_dir = env::var("OUT_DIR").unwrap_or_else(|_| ".".to_string());
    let build_info_file = PathBuf::from(&out_dir).join("build_info.rs");

    let build_info = format!(
        r#"
/// Build information generated at compile time
pub const BUILD_TIMESTAMP: &str = "{}";
pub const BUILD_VERSION: &str = "{}";
pub const BUILD_PROFILE: &str = "{}";
pub const BUILD_TARGET: &str = "{}";
pub const BUILD_RUSTC_VERSION: &str = "{}";
"#,
        get_current_timestamp(),
        env::var("CARGO_PKG_VERSION").unwrap_or_default(),
        env::var("PROFILE").unwrap_or_default(),
        env::var("TARGET").unwrap_or_default(),
        get_rustc_version()
    );

    fs::write(&build_info_file, build_info).expect("Failed to write build info");

    println!("cargo:rustc-env=BUILD_INFO_FILE={}", build_info_file.display());
}

fn get_current_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

fn get_rustc_version() -> String {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    Command::new(rustc)
        .arg("--version")
        .output()
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
