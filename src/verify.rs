//! Post-install verification.
//!
//! Confirms the artifacts a `make install` should leave under the
//! prefix before the run is declared done and the clone removed.

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::udev;

/// SDK headers installed under the prefix.
pub fn headers_present(prefix: &Path) -> bool {
    prefix.join("include").join("librealsense2").is_dir()
}

/// Shared libraries installed under the prefix.
pub fn libraries_present(prefix: &Path) -> bool {
    let lib_dir = prefix.join("lib");
    let Ok(entries) = fs::read_dir(&lib_dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with("librealsense2.so"))
    })
}

/// realsense-viewer binary under the prefix.
pub fn viewer_present(prefix: &Path) -> bool {
    prefix.join("bin").join("realsense-viewer").exists()
}

/// Any RealSense rule file under /etc/udev/rules.d.
pub fn rules_present() -> bool {
    !udev::installed_rule_files().is_empty()
}

/// Check the install left what it should. Headers and libraries are
/// required; the viewer and udev rules only warn since both depend on
/// optional pieces (graphical examples, a rules step that can be
/// re-run).
pub fn verify_install(config: &Config) -> Result<()> {
    let prefix = &config.install_prefix;
    let mut missing = Vec::new();

    if headers_present(prefix) {
        println!("  ✓ Headers: {}/include/librealsense2", prefix.display());
    } else {
        missing.push(format!("{}/include/librealsense2", prefix.display()));
    }

    if libraries_present(prefix) {
        println!("  ✓ Libraries: {}/lib/librealsense2.so*", prefix.display());
    } else {
        missing.push(format!("{}/lib/librealsense2.so*", prefix.display()));
    }

    if !missing.is_empty() {
        bail!(
            "Install verification failed; missing:\n  {}",
            missing.join("\n  ")
        );
    }

    let wants_viewer = config
        .cmake_args
        .iter()
        .any(|arg| arg == "-DBUILD_GRAPHICAL_EXAMPLES=true");
    if wants_viewer {
        if viewer_present(prefix) {
            println!("  ✓ Viewer: {}/bin/realsense-viewer", prefix.display());
        } else {
            println!("  [WARN] realsense-viewer not found under {}/bin", prefix.display());
        }
    }

    if rules_present() {
        println!("  ✓ udev rules: {}", udev::RULES_DIR);
    } else {
        println!("  [WARN] No RealSense rules under {}", udev::RULES_DIR);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_present() {
        let prefix = tempfile::tempdir().unwrap();
        assert!(!headers_present(prefix.path()));
        std::fs::create_dir_all(prefix.path().join("include").join("librealsense2")).unwrap();
        assert!(headers_present(prefix.path()));
    }

    #[test]
    fn test_libraries_present_matches_versioned_so() {
        let prefix = tempfile::tempdir().unwrap();
        let lib = prefix.path().join("lib");
        std::fs::create_dir_all(&lib).unwrap();
        assert!(!libraries_present(prefix.path()));

        std::fs::write(lib.join("libother.so"), "x").unwrap();
        assert!(!libraries_present(prefix.path()));

        std::fs::write(lib.join("librealsense2.so.2.55.1"), "x").unwrap();
        assert!(libraries_present(prefix.path()));
    }

    #[test]
    fn test_viewer_present() {
        let prefix = tempfile::tempdir().unwrap();
        assert!(!viewer_present(prefix.path()));
        std::fs::create_dir_all(prefix.path().join("bin")).unwrap();
        std::fs::write(prefix.path().join("bin").join("realsense-viewer"), "x").unwrap();
        assert!(viewer_present(prefix.path()));
    }
}
