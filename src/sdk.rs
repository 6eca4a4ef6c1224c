//! SDK build and installation via CMake and Make.
//!
//! The build runs out-of-tree in `<source>/build`, the SDK's documented
//! layout. Configure and compile run as the invoking user; only
//! `make install` (and `ldconfig` after it) are elevated.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::process::Cmd;

/// Out-of-tree build directory inside the source tree.
pub fn build_dir(source: &Path) -> PathBuf {
    source.join("build")
}

/// CMake's record of a completed `make install`.
pub fn install_manifest(source: &Path) -> PathBuf {
    build_dir(source).join("install_manifest.txt")
}

/// True if a previous `make install` left a manifest behind.
pub fn has_previous_install(source: &Path) -> bool {
    install_manifest(source).exists()
}

/// Arguments for the configure invocation, run from the build directory.
pub fn configure_args(config: &Config) -> Vec<String> {
    let mut args = config.cmake_args.clone();
    args.push(format!(
        "-DCMAKE_INSTALL_PREFIX={}",
        config.install_prefix.display()
    ));
    args.push("..".to_string());
    args
}

/// Arguments for the compile invocation.
pub fn make_args(config: &Config) -> Vec<String> {
    vec!["-j".to_string(), config.jobs().to_string()]
}

/// Run CMake configure. Returns true if an existing build directory was
/// reused (the caller then runs `make clean` before compiling).
pub fn configure(config: &Config, source: &Path) -> Result<bool> {
    let build = build_dir(source);
    let reused = build.is_dir();
    if reused {
        println!("  Reusing build directory {}", build.display());
    } else {
        fs::create_dir_all(&build).with_context(|| {
            format!("Failed to create build directory {}", build.display())
        })?;
    }

    Cmd::new("cmake")
        .args(configure_args(config))
        .dir(&build)
        .error_msg("CMake configure failed")
        .run_interactive()?;

    Ok(reused)
}

/// Uninstall a previous SDK install, if one is recorded.
///
/// Only runs when the build directory holds an install manifest; a fresh
/// tree has nothing to uninstall and `make uninstall` would fail there.
/// Returns true if an uninstall ran.
pub fn uninstall_previous(source: &Path) -> Result<bool> {
    if !has_previous_install(source) {
        return Ok(false);
    }

    println!("  Previous install detected; running make uninstall");
    let result = Cmd::new("make")
        .arg("uninstall")
        .dir(&build_dir(source))
        .elevate()
        .allow_fail()
        .run()?;
    if !result.success() {
        println!("  [WARN] make uninstall failed; the new install will overwrite");
    }
    Ok(true)
}

/// `make clean` in a reused build directory so stale objects don't leak
/// into the new build.
pub fn clean_build(source: &Path) -> Result<()> {
    Cmd::new("make")
        .arg("clean")
        .dir(&build_dir(source))
        .error_msg("make clean failed")
        .run_interactive()?;
    Ok(())
}

/// Compile the SDK.
pub fn compile(config: &Config, source: &Path) -> Result<()> {
    println!("  Building with {} jobs", config.jobs());
    Cmd::new("make")
        .args(make_args(config))
        .dir(&build_dir(source))
        .error_msg("SDK build failed")
        .run_interactive()?;
    Ok(())
}

/// Install the SDK under the configured prefix and refresh the linker
/// cache so the new libraries resolve immediately.
pub fn install(source: &Path) -> Result<()> {
    Cmd::new("make")
        .arg("install")
        .dir(&build_dir(source))
        .elevate()
        .error_msg("make install failed")
        .run_interactive()?;

    Cmd::new("ldconfig")
        .elevate()
        .error_msg("ldconfig failed after install")
        .run()?;

    Ok(())
}
