//! Preflight command - runs preflight checks.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::preflight;

/// Execute the preflight command.
///
/// Failed checks always fail the command so it works as a gate in
/// scripts; `--strict` additionally promotes warnings to failures.
pub fn cmd_preflight(config: &Config, strict: bool) -> Result<()> {
    let report = preflight::run_preflight(config);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before provisioning.",
            report.fail_count()
        );
    }
    if strict && report.warn_count() > 0 {
        bail!(
            "Preflight --strict: {} warning(s) treated as failures.",
            report.warn_count()
        );
    }

    println!("All preflight checks passed!");
    Ok(())
}
