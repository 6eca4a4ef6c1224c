//! Preflight checks for SDK provisioning.
//!
//! Validates host tools and environment before any step mutates the
//! system. Run with `realprep preflight` to check everything is ready.

mod environment;
mod host_tools;
mod types;

use anyhow::{bail, Result};

use crate::config::Config;

pub use environment::{git_host, is_debian_family, parse_os_release};
pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking host tools...");
    checks.extend(host_tools::check_host_tools());

    println!("Checking environment...");
    checks.extend(environment::check_environment(config));

    println!();

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(config: &Config) -> Result<()> {
    let report = run_preflight(config);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before provisioning.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
