//! Shared test utilities for realprep tests.

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use realprep::config::Config;

/// Test environment with a mock SDK tree and install prefix.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Mock SDK source tree
    pub source: PathBuf,
    /// Mock install prefix
    pub prefix: PathBuf,
    /// Clone destination (not created; tests decide what lives there)
    pub clone_dir: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let source = base.join("librealsense");
        let prefix = base.join("prefix");
        let clone_dir = base.join("clone");

        fs::create_dir_all(&source).expect("Failed to create source dir");
        fs::create_dir_all(&prefix).expect("Failed to create prefix dir");

        Self {
            _temp_dir: temp_dir,
            source,
            prefix,
            clone_dir,
        }
    }

    /// Config with REALSENSE_SOURCE pointing at the mock tree.
    pub fn config_with_override(&self) -> Config {
        config_from(&[
            ("REALSENSE_SOURCE", self.source.to_str().unwrap()),
            ("REALSENSE_CLONE_DIR", self.clone_dir.to_str().unwrap()),
            ("REALSENSE_INSTALL_PREFIX", self.prefix.to_str().unwrap()),
        ])
    }

    /// Config that would clone into this environment (no override).
    pub fn config_with_clone_dir(&self) -> Config {
        config_from(&[
            ("REALSENSE_CLONE_DIR", self.clone_dir.to_str().unwrap()),
            ("REALSENSE_INSTALL_PREFIX", self.prefix.to_str().unwrap()),
        ])
    }
}

/// Build a Config from key/value pairs without touching the environment.
pub fn config_from(pairs: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| map.get(key).cloned())
}

/// Create a minimal mock librealsense source tree.
pub fn create_mock_sdk_tree(source: &Path) {
    fs::create_dir_all(source.join("config")).expect("Failed to create config dir");
    fs::create_dir_all(source.join("src")).expect("Failed to create src dir");

    fs::write(
        source.join("CMakeLists.txt"),
        "cmake_minimum_required(VERSION 3.8)\nproject(librealsense2)\n",
    )
    .expect("Failed to create CMakeLists.txt");

    fs::write(
        source.join("config").join("99-realsense-libusb.rules"),
        "SUBSYSTEMS==\"usb\", ATTRS{idVendor}==\"8086\", MODE:=\"0666\"\n",
    )
    .expect("Failed to create udev rule");

    fs::write(
        source.join("config").join("99-realsense-d4xx-mipi-dfu.rules"),
        "KERNEL==\"d4xx-dfu*\", MODE:=\"0666\"\n",
    )
    .expect("Failed to create second udev rule");
}

/// Populate a prefix the way a completed `make install` would.
pub fn create_mock_install(prefix: &Path) {
    let include = prefix.join("include").join("librealsense2");
    fs::create_dir_all(&include).expect("Failed to create include dir");
    fs::write(include.join("rs.hpp"), "#pragma once\n").expect("Failed to create header");

    let lib = prefix.join("lib");
    fs::create_dir_all(&lib).expect("Failed to create lib dir");
    fs::write(lib.join("librealsense2.so.2.55.1"), b"").expect("Failed to create library");

    create_executable(
        &prefix.join("bin").join("realsense-viewer"),
        "#!/bin/sh\necho viewer\n",
    );
}

/// Create an executable file (mode 0755).
pub fn create_executable(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, contents).expect("Failed to write executable");

    let mut perms = fs::metadata(path)
        .expect("Failed to get metadata")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to set permissions");
}

/// Prepends a directory to PATH and restores the old value on drop.
///
/// Tests using this must be `#[serial]`; PATH is process-global.
pub struct PathGuard {
    old: String,
}

impl PathGuard {
    pub fn prepend(dir: &Path) -> Self {
        let old = std::env::var("PATH").unwrap_or_default();
        std::env::set_var("PATH", format!("{}:{}", dir.display(), old));
        PathGuard { old }
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        std::env::set_var("PATH", &self.old);
    }
}

/// A stub `sudo` that drops VAR=value assignments and execs the rest,
/// so elevated commands resolve to the other stubs on PATH.
pub fn create_stub_sudo(dir: &Path) {
    create_executable(
        &dir.join("sudo"),
        "#!/bin/sh\nwhile [ \"$#\" -gt 0 ]; do\n  case \"$1\" in\n    *=*) shift ;;\n    *) break ;;\n  esac\ndone\nexec \"$@\"\n",
    );
}

/// A stub that records its arguments (one per line) and exits 0.
pub fn create_recording_stub(dir: &Path, name: &str, args_file: &Path) {
    create_executable(
        &dir.join(name),
        &format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > {}\nexit 0\n", args_file.display()),
    );
}

/// Assert that a file exists.
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "Expected file to exist: {}", path.display());
}

/// Assert that a directory exists.
pub fn assert_dir_exists(path: &Path) {
    assert!(path.is_dir(), "Expected directory to exist: {}", path.display());
}
