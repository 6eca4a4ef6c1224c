//! Host tool availability checks.

use crate::process;

use super::types::CheckResult;

/// Check the tools the provisioning run drives.
pub fn check_host_tools() -> Vec<CheckResult> {
    let mut results = Vec::new();

    // Without these two there is no apt-based provisioning at all.
    let required_tools = [
        ("apt-get", "apt", "Required for every package step"),
        ("dpkg-query", "dpkg", "Required to detect installed packages"),
    ];

    for (tool, package, purpose) in required_tools {
        results.push(check_tool_exists(tool, package, purpose, true));
    }

    // These are themselves part of the dependency package set, so a
    // missing one resolves itself once the install step runs.
    let bootstrapped_tools = [
        ("git", "git", "Installed by the dependency step if missing"),
        ("cmake", "cmake", "Installed by the dependency step if missing"),
        ("make", "build-essential", "Installed by the dependency step if missing"),
        ("cc", "build-essential", "Installed by the dependency step if missing"),
        ("pkg-config", "pkg-config", "Installed by the dependency step if missing"),
    ];

    for (tool, package, purpose) in bootstrapped_tools {
        results.push(check_tool_exists(tool, package, purpose, false));
    }

    results.push(check_privileges());

    match process::which("udevadm") {
        Some(path) => results.push(CheckResult::pass_with("udevadm", &path)),
        None => results.push(CheckResult::warn(
            "udevadm",
            "Not found - udev rules will only apply after reboot",
        )),
    }

    results
}

/// Root needs no helper; anyone else needs sudo on PATH.
fn check_privileges() -> CheckResult {
    if process::is_root() {
        CheckResult::pass_with("privileges", "running as root")
    } else {
        match process::which("sudo") {
            Some(path) => CheckResult::pass_with("privileges", &format!("sudo at {}", path)),
            None => CheckResult::fail(
                "privileges",
                "Not root and sudo not found - package and install steps need elevation",
            ),
        }
    }
}

/// Check if a tool exists in PATH.
fn check_tool_exists(tool: &str, package: &str, purpose: &str, required: bool) -> CheckResult {
    match process::which(tool) {
        Some(path) => CheckResult::pass_with(tool, &path),
        None => {
            let msg = format!("Not found. Install '{}' package. {}", package, purpose);
            if required {
                CheckResult::fail(tool, &msg)
            } else {
                CheckResult::warn(tool, &msg)
            }
        }
    }
}
