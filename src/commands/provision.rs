//! Provision command - runs the SDK install sequence end to end.

use anyhow::Result;
use std::time::Instant;

use crate::config::Config;
use crate::plan;
use crate::preflight;
use crate::source::SourceOrigin;
use crate::timing::{format_duration, Timer};
use crate::{apt, clean, sdk, source, state, udev, verify};

/// Toggles for the provision command.
pub struct ProvisionOptions {
    pub no_upgrade: bool,
    pub keep_source: bool,
    pub skip_preflight: bool,
}

/// Execute the provision command.
///
/// Steps run in order and the first failure aborts the run; a partial
/// run is safe to re-execute since every step either skips or redoes
/// its work.
pub fn cmd_provision(config: &Config, options: &ProvisionOptions) -> Result<()> {
    println!("=== RealSense SDK Provisioning ===\n");
    let run_start = Instant::now();

    // 0. Preflight gate
    if options.skip_preflight {
        println!("[SKIP] Preflight checks (--skip-preflight)\n");
    } else {
        preflight::run_preflight_or_fail(config)?;
    }

    // 1. Refresh apt indexes
    println!("Refreshing apt indexes...");
    let t = Timer::start("apt update");
    apt::update()?;
    t.finish();

    // 2. System upgrade
    if options.no_upgrade {
        println!("\n[SKIP] System upgrade (--no-upgrade)");
    } else {
        println!("\nUpgrading system packages...");
        let t = Timer::start("apt upgrade");
        apt::upgrade()?;
        t.finish();
    }

    // 3. Dependency packages - skip what dpkg already has
    let packages = apt::dependency_packages(config);
    let missing = apt::missing_packages(&packages)?;
    if missing.is_empty() {
        println!(
            "\n[SKIP] All {} dependency packages already installed",
            packages.len()
        );
    } else {
        println!(
            "\nInstalling {} of {} dependency packages...",
            missing.len(),
            packages.len()
        );
        let t = Timer::start("apt install");
        apt::install(&missing)?;
        t.finish();
    }

    // 4. SDK source
    println!("\nResolving SDK source...");
    let t = Timer::start("Source");
    let sdk_source = source::resolve(config)?;
    t.finish();

    // Captured now; the tree may be removed at the end of the run.
    let sdk_commit = source::head_commit(&sdk_source.path);
    let sdk_describe = source::describe(&sdk_source.path);
    if let Some(version) = sdk_describe.as_deref().or(sdk_commit.as_deref()) {
        println!("  SDK version: {}", version);
    }

    // 5. udev rules
    println!("\nInstalling udev rules...");
    let rule_count = udev::install_rules(&sdk_source.path)?;
    println!("  {} rule file(s) installed", rule_count);

    // 6. Configure
    println!("\nConfiguring SDK build...");
    let t = Timer::start("Configure");
    let reused_build = sdk::configure(config, &sdk_source.path)?;
    t.finish();

    // 7. Stale install and build cleanup when reusing a tree
    sdk::uninstall_previous(&sdk_source.path)?;
    if reused_build {
        sdk::clean_build(&sdk_source.path)?;
    }

    // 8. Compile
    println!("\nBuilding SDK...");
    let t = Timer::start("Build");
    sdk::compile(config, &sdk_source.path)?;
    t.finish();

    // 9. Install
    println!("\nInstalling SDK...");
    let t = Timer::start("Install");
    sdk::install(&sdk_source.path)?;
    t.finish();

    // 10. Verify what landed under the prefix
    println!("\n=== Install Verification ===");
    verify::verify_install(config)?;

    // 11. Remove the clone unless the user wants it kept
    match sdk_source.origin {
        SourceOrigin::EnvOverride => {
            println!("\n[SKIP] Source removal (REALSENSE_SOURCE override)");
        }
        _ if options.keep_source => {
            println!("\n[SKIP] Source removal (--keep-source)");
            println!("  Source kept at {}", sdk_source.path.display());
        }
        _ => {
            println!("\nRemoving SDK clone...");
            if clean::remove_tree(&config.clone_dir)? {
                println!("  Removed {}", config.clone_dir.display());
            }
        }
    }

    // 12. Record the run for `show status`
    let record = state::ProvisionRecord::new(
        plan::fingerprint(config),
        sdk_commit,
        sdk_describe,
        config.install_prefix.clone(),
    );
    if let Err(e) = state::save(&record) {
        eprintln!("[WARN] Could not write provision record: {:#}", e);
    }

    let total = run_start.elapsed().as_secs_f64();
    println!(
        "\n=== Provisioning Complete ({}) ===",
        format_duration(total)
    );
    println!("  Prefix: {}", config.install_prefix.display());
    println!("\nNext: connect a RealSense camera and run 'rs-enumerate-devices'");

    Ok(())
}
