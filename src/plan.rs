//! Provision plan: the ordered steps a run will execute, plus a
//! fingerprint of the inputs that shape them.
//!
//! The step details render from the same argument builders the executors
//! use, so `show plan` cannot drift from what actually runs.

use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::{apt, sdk, source, udev};

/// One provisioning step, for display.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: &'static str,
    pub detail: String,
}

/// The full ordered plan for a provisioning run.
#[derive(Debug, Clone)]
pub struct Plan {
    pub steps: Vec<Step>,
    pub fingerprint: String,
}

fn render(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

impl Plan {
    /// Build the plan for a run with the given toggles.
    pub fn for_run(config: &Config, upgrade: bool, keep_source: bool) -> Self {
        let mut steps = Vec::new();

        steps.push(Step {
            name: "Refresh apt indexes",
            detail: render("apt-get", &apt::update_args()),
        });

        if upgrade {
            steps.push(Step {
                name: "Upgrade system packages",
                detail: render("apt-get", &apt::upgrade_args()),
            });
        }

        let packages = apt::dependency_packages(config);
        steps.push(Step {
            name: "Install dependency packages",
            detail: render("apt-get", &apt::install_args(&packages)),
        });

        if config.source_override.is_some() {
            steps.push(Step {
                name: "Resolve SDK source",
                detail: format!("use {}", config.source_dir().display()),
            });
        } else {
            steps.push(Step {
                name: "Resolve SDK source",
                detail: render("git", &source::clone_args(config)),
            });
        }

        steps.push(Step {
            name: "Install udev rules",
            detail: format!(
                "install -m 644 {}/config/*.rules {}",
                config.source_dir().display(),
                udev::RULES_DIR
            ),
        });

        steps.push(Step {
            name: "Configure",
            detail: render("cmake", &sdk::configure_args(config)),
        });

        steps.push(Step {
            name: "Build",
            detail: render("make", &sdk::make_args(config)),
        });

        steps.push(Step {
            name: "Install",
            detail: "make install; ldconfig".to_string(),
        });

        if config.source_override.is_none() && !keep_source {
            steps.push(Step {
                name: "Remove SDK clone",
                detail: format!("rm -rf {}", config.clone_dir.display()),
            });
        }

        Plan {
            steps,
            fingerprint: fingerprint(config),
        }
    }

    pub fn print(&self) {
        println!("=== Provision plan ===");
        for (index, step) in self.steps.iter().enumerate() {
            println!("{:>2}. {}", index + 1, step.name);
            println!("      {}", step.detail);
        }
        println!();
        println!("Fingerprint: {}", self.fingerprint);
    }
}

/// Hash of the inputs that shape an install: source selection, package
/// set, CMake flags, and install prefix. Stored in the provision record
/// so `show status` can tell whether the config changed since.
pub fn fingerprint(config: &Config) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.git_url.as_bytes());
    hasher.update(b"|");
    hasher.update(config.git_ref.as_deref().unwrap_or("").as_bytes());
    hasher.update(b"|");
    for package in apt::dependency_packages(config) {
        hasher.update(package.as_bytes());
        hasher.update(b",");
    }
    hasher.update(b"|");
    for arg in &config.cmake_args {
        hasher.update(arg.as_bytes());
        hasher.update(b",");
    }
    hasher.update(b"|");
    hasher.update(config.install_prefix.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}
