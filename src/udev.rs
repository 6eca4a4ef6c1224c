//! udev rule installation for RealSense devices.
//!
//! The SDK ships its rules under `config/` in the source tree (for example
//! `99-realsense-libusb.rules`). Installing them lets non-root users open
//! the cameras over USB.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::process::{self, Cmd};

/// Where udev rules live on Debian-family systems.
pub const RULES_DIR: &str = "/etc/udev/rules.d";

/// True if a file name looks like a RealSense udev rule.
pub fn is_realsense_rule(name: &str) -> bool {
    name.ends_with(".rules") && name.to_lowercase().contains("realsense")
}

/// Find `.rules` files in the SDK source tree's `config/` directory.
///
/// Returned sorted so installation order is stable.
pub fn find_rule_files(source: &Path) -> Result<Vec<PathBuf>> {
    let config_dir = source.join("config");
    if !config_dir.is_dir() {
        bail!(
            "No config/ directory in SDK source at {}",
            source.display()
        );
    }

    let mut rules = Vec::new();
    for entry in WalkDir::new(&config_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == "rules") {
            rules.push(entry.path().to_path_buf());
        }
    }
    rules.sort();

    if rules.is_empty() {
        bail!(
            "No .rules files found under {}",
            config_dir.display()
        );
    }

    Ok(rules)
}

/// Install the SDK's udev rules into /etc/udev/rules.d.
///
/// Returns the number of rule files installed.
pub fn install_rules(source: &Path) -> Result<usize> {
    let rules = find_rule_files(source)?;

    for rule in &rules {
        let name = rule
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Bad rule file name: {}", rule.display()))?;
        println!("  Installing {} -> {}", name, RULES_DIR);
        Cmd::new("install")
            .args(["-m", "644"])
            .arg_path(rule)
            .arg(RULES_DIR)
            .elevate()
            .error_msg("Failed to install udev rule")
            .run()?;
    }

    reload_rules();

    Ok(rules.len())
}

/// Ask udev to pick up the new rules.
///
/// Containers often run without a udev daemon, so a failure here is
/// reported but does not abort the provision. The rules still apply on
/// the next device plug or host reboot.
pub fn reload_rules() {
    if !process::exists("udevadm") {
        println!("  [WARN] udevadm not found; rules will apply after reboot");
        return;
    }

    let reload = Cmd::new("udevadm")
        .args(["control", "--reload-rules"])
        .elevate()
        .allow_fail()
        .run();
    let trigger = Cmd::new("udevadm")
        .arg("trigger")
        .elevate()
        .allow_fail()
        .run();

    let ok = matches!(&reload, Ok(r) if r.success()) && matches!(&trigger, Ok(r) if r.success());
    if !ok {
        println!("  [WARN] Could not reload udev rules (no udev daemon?); continuing");
    }
}

/// RealSense rules already present in /etc/udev/rules.d.
pub fn installed_rule_files() -> Vec<PathBuf> {
    let mut found = Vec::new();
    if let Ok(entries) = fs::read_dir(RULES_DIR) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            if let Some(name) = name.to_str() {
                if is_realsense_rule(name) {
                    found.push(entry.path());
                }
            }
        }
    }
    found.sort();
    found
}
