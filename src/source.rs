//! SDK source tree resolution.
//!
//! Resolution order mirrors the rest of the dependency handling:
//! 1. `REALSENSE_SOURCE` env override pointing at an existing tree
//! 2. An existing clone at the configured clone directory
//! 3. `git clone` (shallow by default, optional branch/tag pin)

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::process::Cmd;

/// Resolved SDK source tree.
#[derive(Debug, Clone)]
pub struct SdkSource {
    /// Path to the source tree.
    pub path: PathBuf,
    /// How it was resolved.
    pub origin: SourceOrigin,
}

/// How the SDK source was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// From the REALSENSE_SOURCE env var.
    EnvOverride,
    /// Existing clone at the clone directory.
    Existing,
    /// Freshly cloned this run.
    Cloned,
}

impl SourceOrigin {
    pub fn describe(self) -> &'static str {
        match self {
            SourceOrigin::EnvOverride => "from REALSENSE_SOURCE",
            SourceOrigin::Existing => "existing clone",
            SourceOrigin::Cloned => "cloned",
        }
    }
}

/// Check if a directory looks like a librealsense source tree.
pub fn is_sdk_tree(path: &Path) -> bool {
    path.join("CMakeLists.txt").exists()
}

/// Find an existing SDK source without cloning.
pub fn find_existing(config: &Config) -> Option<SdkSource> {
    if let Some(path) = &config.source_override {
        if is_sdk_tree(path) {
            return Some(SdkSource {
                path: path.clone(),
                origin: SourceOrigin::EnvOverride,
            });
        }
    }

    if is_sdk_tree(&config.clone_dir) {
        return Some(SdkSource {
            path: config.clone_dir.clone(),
            origin: SourceOrigin::Existing,
        });
    }

    None
}

/// Resolve the SDK source, cloning if necessary.
pub fn resolve(config: &Config) -> Result<SdkSource> {
    // A configured override that doesn't hold a source tree is user error,
    // not a reason to silently clone somewhere else.
    if let Some(path) = &config.source_override {
        if !is_sdk_tree(path) {
            bail!(
                "REALSENSE_SOURCE is set to {} but no CMakeLists.txt was found there",
                path.display()
            );
        }
    }

    if let Some(source) = find_existing(config) {
        println!(
            "  SDK source: {} ({})",
            source.path.display(),
            source.origin.describe()
        );
        return Ok(source);
    }

    if config.clone_dir.exists() {
        bail!(
            "{} exists but is not a librealsense tree.\n\
             Remove it with 'realprep clean source' and retry.",
            config.clone_dir.display()
        );
    }

    clone_source(config)
}

/// Clone the SDK repository via git.
pub fn clone_source(config: &Config) -> Result<SdkSource> {
    if let Some(parent) = config.clone_dir.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create clone parent directory {}", parent.display())
        })?;
    }

    println!("  Cloning SDK source...");
    println!("    URL: {}", config.git_url);
    if let Some(git_ref) = &config.git_ref {
        println!("    Ref: {}", git_ref);
    }
    println!("    Destination: {}", config.clone_dir.display());
    if !config.full_clone {
        println!("    Mode: shallow clone (set REALSENSE_FULL_CLONE=1 for full history)");
    }

    Cmd::new("git")
        .args(clone_args(config))
        .error_msg("git clone failed")
        .run_interactive()?;

    if !is_sdk_tree(&config.clone_dir) {
        bail!(
            "Clone at {} has no CMakeLists.txt; the repository layout is not the expected SDK",
            config.clone_dir.display()
        );
    }

    Ok(SdkSource {
        path: config.clone_dir.clone(),
        origin: SourceOrigin::Cloned,
    })
}

/// Arguments for the clone invocation (shared with `show plan`).
pub fn clone_args(config: &Config) -> Vec<String> {
    let mut args = vec!["clone".to_string()];
    if !config.full_clone {
        args.push("--depth".to_string());
        args.push("1".to_string());
    }
    if let Some(git_ref) = &config.git_ref {
        args.push("--branch".to_string());
        args.push(git_ref.clone());
    }
    args.push(config.git_url.clone());
    args.push(config.clone_dir.to_string_lossy().into_owned());
    args
}

/// Short HEAD commit of a source tree, if git can tell us.
pub fn head_commit(path: &Path) -> Option<String> {
    let result = Cmd::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .dir(path)
        .allow_fail()
        .run()
        .ok()?;
    if result.success() {
        Some(result.stdout_trimmed().to_string())
    } else {
        None
    }
}

/// `git describe` of a source tree (tag-relative version), if available.
pub fn describe(path: &Path) -> Option<String> {
    let result = Cmd::new("git")
        .args(["describe", "--tags", "--always"])
        .dir(path)
        .allow_fail()
        .run()
        .ok()?;
    if result.success() {
        Some(result.stdout_trimmed().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_clone_args_shallow_default() {
        let config = config_from(&[("REALSENSE_CLONE_DIR", "/tmp/rs-test")]);
        let args = clone_args(&config);
        assert_eq!(args[0], "clone");
        assert!(args.contains(&"--depth".to_string()));
        assert!(args.contains(&"1".to_string()));
        assert_eq!(args.last().map(|s| s.as_str()), Some("/tmp/rs-test"));
    }

    #[test]
    fn test_clone_args_full_clone() {
        let config = config_from(&[("REALSENSE_FULL_CLONE", "1")]);
        let args = clone_args(&config);
        assert!(!args.contains(&"--depth".to_string()));
    }

    #[test]
    fn test_clone_args_branch_pin() {
        let config = config_from(&[("REALSENSE_GIT_REF", "v2.55.1")]);
        let args = clone_args(&config);
        let pos = args.iter().position(|a| a == "--branch").unwrap();
        assert_eq!(args[pos + 1], "v2.55.1");
    }

    #[test]
    fn test_is_sdk_tree() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_sdk_tree(dir.path()));
        std::fs::write(dir.path().join("CMakeLists.txt"), "project(librealsense2)").unwrap();
        assert!(is_sdk_tree(dir.path()));
    }

    #[test]
    fn test_find_existing_prefers_override() {
        let override_dir = tempfile::tempdir().unwrap();
        let clone_dir = tempfile::tempdir().unwrap();
        std::fs::write(override_dir.path().join("CMakeLists.txt"), "x").unwrap();
        std::fs::write(clone_dir.path().join("CMakeLists.txt"), "x").unwrap();

        let config = config_from(&[
            ("REALSENSE_SOURCE", override_dir.path().to_str().unwrap()),
            ("REALSENSE_CLONE_DIR", clone_dir.path().to_str().unwrap()),
        ]);

        let source = find_existing(&config).unwrap();
        assert_eq!(source.origin, SourceOrigin::EnvOverride);
        assert_eq!(source.path, override_dir.path());
    }

    #[test]
    fn test_resolve_rejects_bad_override() {
        let empty = tempfile::tempdir().unwrap();
        let config = config_from(&[("REALSENSE_SOURCE", empty.path().to_str().unwrap())]);
        let err = resolve(&config).unwrap_err();
        assert!(err.to_string().contains("REALSENSE_SOURCE"));
    }

    #[test]
    fn test_resolve_rejects_junk_clone_dir() {
        let junk = tempfile::tempdir().unwrap();
        std::fs::write(junk.path().join("random.txt"), "junk").unwrap();
        let config = config_from(&[("REALSENSE_CLONE_DIR", junk.path().to_str().unwrap())]);
        let err = resolve(&config).unwrap_err();
        assert!(err.to_string().contains("clean source"));
    }
}
