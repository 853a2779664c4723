use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;

const PACKAGE: &str = "moduline-bootloader";
const MANIFEST: &str = "bootloader/Cargo.toml";
const IMAGE_MAIN: &str = "bootloader/src/main.rs";

/// The parts of the bootloader manifest the image build reads
#[derive(Debug, Deserialize)]
struct Manifest {
    package: Package,
    #[serde(default)]
    features: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Package {
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    bootloader: ImageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ImageConfig {
    target: String,
    linker_script: String,
    #[serde(default)]
    images: Vec<Image>,
}

/// One `[[package.metadata.bootloader.images]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct Image {
    name: String,
    entry: String,
    #[serde(default)]
    features: Vec<String>,
    output_name: Option<String>,
}

impl Image {
    fn output_name(&self) -> String {
        self.output_name.clone().unwrap_or_else(|| format!("{}.img", self.name))
    }

    /// The single `image-*` feature that selects this image's entry
    fn image_feature(&self) -> Result<&str> {
        let mut selected = self.features.iter().filter(|f| f.starts_with("image-"));
        match (selected.next(), selected.next()) {
            (Some(feature), None) => Ok(feature.as_str()),
            (None, _) => bail!("{}: no image-* feature", self.name),
            (Some(_), Some(_)) => bail!("{}: more than one image-* feature", self.name),
        }
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let task = args.next().unwrap_or_else(|| "help".to_string());
    let rest: Vec<String> = args.collect();
    match task.as_str() {
        "image" => build_images(&rest),
        "list" => list_images(),
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_manifest() -> Result<Manifest> {
    let path = workspace_root().join(MANIFEST);
    let contents = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    parse_manifest(&contents).with_context(|| format!("in {}", path.display()))
}

fn parse_manifest(contents: &str) -> Result<Manifest> {
    let manifest: Manifest = toml::from_str(contents).context("invalid image configuration")?;
    if manifest.package.metadata.bootloader.images.is_empty() {
        bail!("no images configured in {}", MANIFEST);
    }
    Ok(manifest)
}

/// Check that the image feature exists and compiles in the image's entry
fn check_image(manifest: &Manifest, image: &Image, image_main: &str) -> Result<()> {
    let feature = image.image_feature()?;
    if !manifest.features.contains_key(feature) {
        bail!("{}: feature {} is not declared in {}", image.name, feature, MANIFEST);
    }

    let pattern = Regex::new(&format!(
        r#"(?s)#\[cfg\(feature = "{}"\)\]\s*mod \w+ \{{.*?board_entry!\((\w+)\s*=>"#,
        regex::escape(feature)
    ))?;
    let declared = pattern
        .captures(image_main)
        .map(|caps| caps[1].to_string())
        .with_context(|| format!("{}: no board_entry! under feature {} in {}", image.name, feature, IMAGE_MAIN))?;
    if declared != image.entry {
        bail!(
            "{}: feature {} compiles in {} but the image expects {}",
            image.name,
            feature,
            declared,
            image.entry
        );
    }
    Ok(())
}

fn list_images() -> Result<()> {
    let manifest = load_manifest()?;
    for image in &manifest.package.metadata.bootloader.images {
        println!("{:<24} {:<36} {}", image.name, image.entry, image.output_name());
    }
    Ok(())
}

fn build_images(args: &[String]) -> Result<()> {
    let manifest = load_manifest()?;
    let config = &manifest.package.metadata.bootloader;
    let debug = args.iter().any(|a| a == "--debug");
    let wanted: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let selected: Vec<&Image> = if wanted.is_empty() || wanted.iter().any(|w| *w == "all") {
        config.images.iter().collect()
    } else {
        wanted
            .iter()
            .map(|w| {
                config
                    .images
                    .iter()
                    .find(|image| &image.name == *w)
                    .with_context(|| format!("unknown image {}; try `cargo xtask list`", w))
            })
            .collect::<Result<_>>()?
    };

    let main_path = workspace_root().join(IMAGE_MAIN);
    let image_main = fs::read_to_string(&main_path).with_context(|| format!("reading {}", main_path.display()))?;
    for image in &selected {
        check_image(&manifest, image, &image_main)?;
    }
    for image in selected {
        build_image(config, image, debug)?;
    }
    Ok(())
}

fn build_image(config: &ImageConfig, image: &Image, debug: bool) -> Result<()> {
    let root = workspace_root();
    let profile = if debug { "debug" } else { "release" };

    let mut cmd = Command::new("cargo");
    cmd.current_dir(&root)
        .arg("rustc")
        .arg("-p")
        .arg(PACKAGE)
        .arg("--bin")
        .arg("pbl")
        .arg("--target")
        .arg(&config.target)
        .arg("--no-default-features")
        .arg("--features")
        .arg(image.features.join(","));
    if !debug {
        cmd.arg("--release");
    }
    cmd.arg("--")
        .arg("-C")
        .arg("relocation-model=pie")
        .arg("-C")
        .arg(format!("link-arg=--entry={}", image.entry));
    run(&mut cmd, &format!("{} build", image.name))?;

    let elf = root.join("target").join(&config.target).join(profile).join("pbl");
    let out_dir = root.join("target").join("images");
    fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let output = out_dir.join(image.output_name());

    let mut objcopy = Command::new("rust-objcopy");
    objcopy.arg("-O").arg("binary").arg(&elf).arg(&output);
    run(&mut objcopy, &format!("{} objcopy", image.name))?;

    println!(
        "[xtask] {} -> {} (linker script {})",
        image.name,
        output.display(),
        config.linker_script
    );
    Ok(())
}

fn run(cmd: &mut Command, name: &str) -> Result<()> {
    println!("[xtask] {}: {:?}", name, cmd);
    let status = cmd.status().with_context(|| format!("running {}", name))?;
    if !status.success() {
        bail!("{} failed with status {:?}", name, status);
    }
    Ok(())
}

fn print_help() {
    println!(
        "xtask usage:\n  cargo xtask list\n  cargo xtask image [<name>...|all] [--debug]"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_SAMPLE: &str = r#"
[package]
name = "moduline-bootloader"

[features]
image-gocontroll-display-106 = ["board-bin", "board-gocontroll-display"] # display
image-gocontroll-headless = ["board-bin", "board-gocontroll-headless"]

[package.metadata.bootloader]
linker_script = 'linker/imx8m-pbl.ld'
target = "aarch64-unknown-none"  # bare metal

[[package.metadata.bootloader.images]]
entry = "start_gocontroll_display_106"
name = "gocontroll-display-106"
features = [
    "image-gocontroll-display-106",
]
output_name = "barebox-gocontroll-display-106.img"

[[package.metadata.bootloader.images]]
name = "gocontroll-headless"
entry = "start_gocontroll_headless"
features = ["image-gocontroll-headless"]
"#;

    const MAIN_SAMPLE: &str = r#"
#[cfg(feature = "image-gocontroll-display-106")]
mod display_106 {
    pub extern "C" fn display_106_main(_r0: usize, _r1: usize, _r2: usize) -> ! {
        start(&DISPLAY_106, LPDDR4_PHY)
    }

    board_entry!(start_gocontroll_display_106 => display_106_main);
}

#[cfg(feature = "image-gocontroll-headless")]
mod headless {
    board_entry!(start_karo_tx8m_1610_test => headless_main);
}
"#;

    #[test]
    fn test_images_are_parsed_in_order() {
        let manifest = parse_manifest(MANIFEST_SAMPLE).unwrap();
        let config = &manifest.package.metadata.bootloader;
        assert_eq!(config.target, "aarch64-unknown-none");
        assert_eq!(config.linker_script, "linker/imx8m-pbl.ld");
        assert_eq!(config.images.len(), 2);
        assert_eq!(config.images[0].entry, "start_gocontroll_display_106");
        assert_eq!(config.images[0].features, ["image-gocontroll-display-106"]);
        assert_eq!(config.images[0].output_name(), "barebox-gocontroll-display-106.img");
        assert_eq!(config.images[1].output_name(), "gocontroll-headless.img");
    }

    #[test]
    fn test_missing_table_is_an_error() {
        assert!(parse_manifest("[package]\nname = \"x\"\n").is_err());
    }

    #[test]
    fn test_entry_under_image_feature_is_accepted() {
        let manifest = parse_manifest(MANIFEST_SAMPLE).unwrap();
        let image = &manifest.package.metadata.bootloader.images[0];
        check_image(&manifest, image, MAIN_SAMPLE).unwrap();
    }

    #[test]
    fn test_feature_compiling_another_entry_is_refused() {
        let manifest = parse_manifest(MANIFEST_SAMPLE).unwrap();
        let image = &manifest.package.metadata.bootloader.images[1];
        let err = check_image(&manifest, image, MAIN_SAMPLE).unwrap_err();
        assert!(err.to_string().contains("start_karo_tx8m_1610_test"));
    }

    #[test]
    fn test_image_needs_exactly_one_image_feature() {
        let mut manifest = parse_manifest(MANIFEST_SAMPLE).unwrap();
        let image = &mut manifest.package.metadata.bootloader.images[0];
        image.features = vec!["board-gocontroll-display".to_string()];
        assert!(image.image_feature().is_err());
        image.features = vec![
            "image-gocontroll-display-106".to_string(),
            "image-gocontroll-headless".to_string(),
        ];
        assert!(image.image_feature().is_err());
    }

    #[test]
    fn test_workspace_images_each_select_their_own_entry() {
        let manifest = load_manifest().unwrap();
        let image_main = fs::read_to_string(workspace_root().join(IMAGE_MAIN)).unwrap();
        let images = &manifest.package.metadata.bootloader.images;

        let names: Vec<&str> = images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "gocontroll-display-106",
                "gocontroll-display-107",
                "karo-tx8m-1610-test",
                "gocontroll-headless"
            ]
        );
        for image in images {
            check_image(&manifest, image, &image_main).unwrap();
        }

        let mut features: Vec<&str> = images.iter().map(|i| i.image_feature().unwrap()).collect();
        features.sort_unstable();
        features.dedup();
        assert_eq!(features.len(), images.len());
    }

    #[test]
    fn test_linker_script_places_entry_sections_first() {
        let script = fs::read_to_string(workspace_root().join("bootloader/linker/imx8m-pbl.ld")).unwrap();
        let entry = script.find("KEEP(*(.text.entry.*))").unwrap();
        let text = script.find("*(.text .text.*)").unwrap();
        assert!(entry < text);

        let boot = fs::read_to_string(workspace_root().join("bootloader/src/arch/aarch64/boot.rs")).unwrap();
        assert!(boot.contains(r#"link_section = concat!(".text.entry.", stringify!($entry))"#));
    }
}
