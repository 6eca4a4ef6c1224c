//! Configuration management for realprep.
//!
//! Reads configuration from environment variables. A `.env` file in the
//! current directory is loaded at startup (see `main`); real environment
//! variables take precedence over `.env` entries.

use std::path::PathBuf;

/// Default git URL for the librealsense SDK.
pub const DEFAULT_GIT_URL: &str = "https://github.com/IntelRealSense/librealsense.git";

/// Default location of the temporary SDK clone.
pub const DEFAULT_CLONE_DIR: &str = "/tmp/librealsense";

/// Default CMake install prefix.
pub const DEFAULT_INSTALL_PREFIX: &str = "/usr/local";

/// Default CMake configure arguments.
///
/// Graphical examples pull in the GTK/GLFW dependencies the package step
/// installs, so realsense-viewer ends up available in the container.
pub const DEFAULT_CMAKE_ARGS: &[&str] = &[
    "-DCMAKE_BUILD_TYPE=Release",
    "-DBUILD_EXAMPLES=true",
    "-DBUILD_GRAPHICAL_EXAMPLES=true",
];

/// Realprep configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Git URL for the SDK repository.
    pub git_url: String,
    /// Optional branch or tag to pin the clone to (e.g. "v2.55.1").
    pub git_ref: Option<String>,
    /// Existing SDK source tree to use instead of cloning.
    pub source_override: Option<PathBuf>,
    /// Where the SDK is cloned (default: /tmp/librealsense).
    pub clone_dir: PathBuf,
    /// CMake install prefix (default: /usr/local).
    pub install_prefix: PathBuf,
    /// Override for Make's -j value.
    pub build_jobs: Option<usize>,
    /// CMake configure arguments.
    pub cmake_args: Vec<String>,
    /// Packages to install on top of the base dependency set.
    pub extra_packages: Vec<String>,
    /// Clone full history instead of --depth 1.
    pub full_clone: bool,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Exists so tests can drive configuration without mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let git_url = lookup("REALSENSE_GIT_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GIT_URL.to_string());

        let git_ref = lookup("REALSENSE_GIT_REF").filter(|v| !v.trim().is_empty());

        let source_override = lookup("REALSENSE_SOURCE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let clone_dir = lookup("REALSENSE_CLONE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLONE_DIR));

        let install_prefix = lookup("REALSENSE_INSTALL_PREFIX")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_PREFIX));

        let build_jobs = lookup("REALSENSE_BUILD_JOBS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0);

        let cmake_args = lookup("REALSENSE_CMAKE_ARGS")
            .map(|v| split_words(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CMAKE_ARGS.iter().map(|s| s.to_string()).collect());

        let extra_packages = lookup("REALPREP_EXTRA_PACKAGES")
            .map(|v| split_packages(&v))
            .unwrap_or_default();

        let full_clone = lookup("REALSENSE_FULL_CLONE")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        Self {
            git_url,
            git_ref,
            source_override,
            clone_dir,
            install_prefix,
            build_jobs,
            cmake_args,
            extra_packages,
            full_clone,
        }
    }

    /// The directory a provisioning run reads SDK sources from.
    pub fn source_dir(&self) -> &PathBuf {
        self.source_override.as_ref().unwrap_or(&self.clone_dir)
    }

    /// Check if an SDK source tree is already present.
    pub fn has_source_tree(&self) -> bool {
        self.source_dir().join("CMakeLists.txt").exists()
    }

    /// Resolve the Make -j value: configured override, else cores minus one.
    pub fn jobs(&self) -> usize {
        self.build_jobs.unwrap_or_else(default_jobs)
    }

    /// Print configuration for `show config`.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  REALSENSE_GIT_URL: {}", self.git_url);
        println!(
            "  REALSENSE_GIT_REF: {}",
            self.git_ref.as_deref().unwrap_or("(default branch)")
        );
        match &self.source_override {
            Some(path) => println!("  REALSENSE_SOURCE: {}", path.display()),
            None => println!("  REALSENSE_SOURCE: (unset, will clone)"),
        }
        println!("  REALSENSE_CLONE_DIR: {}", self.clone_dir.display());
        println!(
            "  REALSENSE_INSTALL_PREFIX: {}",
            self.install_prefix.display()
        );
        println!("  REALSENSE_BUILD_JOBS: {} (-j)", self.jobs());
        println!("  REALSENSE_CMAKE_ARGS: {}", self.cmake_args.join(" "));
        if self.extra_packages.is_empty() {
            println!("  REALPREP_EXTRA_PACKAGES: (none)");
        } else {
            println!(
                "  REALPREP_EXTRA_PACKAGES: {}",
                self.extra_packages.join(" ")
            );
        }
        println!(
            "  REALSENSE_FULL_CLONE: {}",
            if self.full_clone { "yes" } else { "no (shallow)" }
        );
        if self.has_source_tree() {
            println!("  SDK source: FOUND at {}", self.source_dir().display());
        } else {
            println!("  SDK source: NOT FOUND (will be cloned during provision)");
        }
    }
}

/// Default Make parallelism: available cores minus one, minimum 1.
pub fn default_jobs() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores.saturating_sub(1).max(1)
}

/// True for "1", "true", "yes" (case-insensitive).
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

/// Split a value on whitespace (CMake argument lists).
fn split_words(value: &str) -> Vec<String> {
    value.split_whitespace().map(|s| s.to_string()).collect()
}

/// Split a package list on commas and whitespace.
fn split_packages(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
