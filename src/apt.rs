//! APT package operations: index refresh, system upgrade, and installation
//! of the SDK's build/runtime dependencies.
//!
//! All mutating commands are elevated and non-interactive; apt output is
//! streamed so the user sees the package manager's own progress.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::config::Config;
use crate::process::Cmd;

/// Build and runtime dependencies for building librealsense from source:
/// toolchain, TLS, USB, udev headers, GTK, and GL/GLFW for the graphical
/// examples.
pub const BASE_PACKAGES: &[&str] = &[
    "git",
    "cmake",
    "build-essential",
    "pkg-config",
    "libssl-dev",
    "libusb-1.0-0-dev",
    "libudev-dev",
    "libgtk-3-dev",
    "libglfw3-dev",
    "libgl1-mesa-dev",
    "libglu1-mesa-dev",
];

/// The full package set for a run: base packages plus configured extras,
/// deduplicated, in stable order.
pub fn dependency_packages(config: &Config) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut packages = Vec::new();
    for pkg in BASE_PACKAGES
        .iter()
        .map(|s| s.to_string())
        .chain(config.extra_packages.iter().cloned())
    {
        if seen.insert(pkg.clone()) {
            packages.push(pkg);
        }
    }
    packages
}

/// Refresh the package index (`apt-get update`).
pub fn update() -> Result<()> {
    Cmd::new("apt-get")
        .args(update_args())
        .elevate()
        .error_msg("apt-get update failed")
        .run_interactive()?;
    Ok(())
}

/// Upgrade installed packages (`apt-get upgrade -y`).
pub fn upgrade() -> Result<()> {
    Cmd::new("apt-get")
        .args(upgrade_args())
        .env_var("DEBIAN_FRONTEND", "noninteractive")
        .elevate()
        .error_msg("apt-get upgrade failed")
        .run_interactive()?;
    Ok(())
}

/// Install the given packages (`apt-get install -y ...`).
pub fn install(packages: &[String]) -> Result<()> {
    Cmd::new("apt-get")
        .args(install_args(packages))
        .env_var("DEBIAN_FRONTEND", "noninteractive")
        .elevate()
        .error_msg("apt-get install failed")
        .run_interactive()?;
    Ok(())
}

/// Which of `packages` are not currently installed.
///
/// Probes dpkg in one query; packages dpkg has never heard of land in
/// stderr and count as missing.
pub fn missing_packages(packages: &[String]) -> Result<Vec<String>> {
    if packages.is_empty() {
        return Ok(Vec::new());
    }

    let result = Cmd::new("dpkg-query")
        .args(["-W", "-f", "${Package} ${Status}\n"])
        .args(packages.iter().map(|s| s.as_str()))
        .allow_fail()
        .run()
        .context("Failed to query dpkg for installed packages")?;

    let installed = parse_dpkg_status(&result.stdout);
    Ok(packages
        .iter()
        .filter(|p| !installed.contains(p.as_str()))
        .cloned()
        .collect())
}

/// Parse `dpkg-query -W -f='${Package} ${Status}\n'` output into the set of
/// fully installed package names.
pub fn parse_dpkg_status(stdout: &str) -> HashSet<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.trim().splitn(2, ' ');
            let name = parts.next()?;
            let status = parts.next()?;
            if status.trim() == "install ok installed" {
                Some(name.to_string())
            } else {
                None
            }
        })
        .collect()
}

// =============================================================================
// Argument rendering (shared with `show plan`)
// =============================================================================

pub fn update_args() -> Vec<String> {
    vec!["update".to_string()]
}

pub fn upgrade_args() -> Vec<String> {
    vec!["upgrade".to_string(), "-y".to_string()]
}

pub fn install_args(packages: &[String]) -> Vec<String> {
    let mut args = vec!["install".to_string(), "-y".to_string()];
    args.extend(packages.iter().cloned());
    args
}
